//! # 操作接口层
//!
//! 公开操作的实现。每个操作都先经路径解析定位目标，
//! 校验全部通过后才落到目录编码层与位图上做改动，
//! 失败的操作不留下可见的中间状态。

use alloc::vec;
use alloc::vec::Vec;

use log::debug;
use vfs::{DirEntry, Error, InodeKind, Stat};

use crate::fs::FileHandle;
use crate::{RamFileSystem, MAX_SYMLINK_DEPTH, NAME_MAX_LEN};

/// 名字必须放得进目录项的28字节
fn check_name(name: &str) -> Result<(), Error> {
    if name.len() > NAME_MAX_LEN {
        return Err(Error::NameTooLong);
    }
    Ok(())
}

impl RamFileSystem {
    /// 创建目录
    pub fn mkdir(&mut self, path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("mkdir {path}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(path, &mut depth)?;
        check_name(&name)?;
        if self.find_entry(parent, &name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let child = self.find_free_inode()?;
        // 链接数：父目录里的项，加上自己的`.`
        self.inode_mut(child).init(InodeKind::Directory, 2);
        // 先把`.`/`..`写进子目录，最后才挂到父目录；
        // 挂接失败时整个子目录回滚
        let linked = self.add_entry(child, ".", child).and_then(|()| {
            self.add_entry(child, "..", parent)?;
            self.add_entry(parent, &name, child)
        });
        if let Err(e) = linked {
            self.release_inode(child);
            return Err(e);
        }
        // 子目录的`..`给父目录记一个链接
        self.inode_mut(parent).nlink += 1;
        Ok(())
    }

    /// 删除空目录；只含`.`/`..`视为空
    pub fn rmdir(&mut self, path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("rmdir {path}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(path, &mut depth)?;
        if name == "." || name == ".." {
            return Err(Error::NotEmpty);
        }

        let target = self.find_entry(parent, &name)?.ok_or(Error::NotFound)?;
        if !self.inode(target).is_dir() {
            return Err(Error::NotADirectory);
        }
        if self.list_entries(target)?.len() > 2 {
            return Err(Error::NotEmpty);
        }

        self.remove_entry(parent, &name)?;
        self.inode_mut(parent).nlink -= 1;
        self.release_inode(target);
        Ok(())
    }

    /// 创建空的普通文件
    pub fn create(&mut self, path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("create {path}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(path, &mut depth)?;
        check_name(&name)?;
        if self.find_entry(parent, &name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let inode = self.find_free_inode()?;
        self.inode_mut(inode).init(InodeKind::Regular, 1);
        if let Err(e) = self.add_entry(parent, &name, inode) {
            self.inode_mut(inode).reset();
            return Err(e);
        }
        Ok(())
    }

    /// 硬链接：用新名字指向既有 inode
    pub fn link(&mut self, src: &str, dest: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("link {src} -> {dest}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let (src_parent, src_name) = self.resolve_parent(src, &mut depth)?;
        let inode = self
            .find_entry(src_parent, &src_name)?
            .ok_or(Error::NotFound)?;
        // 目录禁止硬链接，否则树形与链接计数都保不住
        if self.inode(inode).is_dir() {
            return Err(Error::IsADirectory);
        }

        let mut depth = MAX_SYMLINK_DEPTH;
        let (dest_parent, dest_name) = self.resolve_parent(dest, &mut depth)?;
        check_name(&dest_name)?;
        if self.find_entry(dest_parent, &dest_name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        self.add_entry(dest_parent, &dest_name, inode)?;
        self.inode_mut(inode).nlink += 1;
        Ok(())
    }

    /// 解除链接；计数归零且没有描述符引用时立即回收
    pub fn unlink(&mut self, path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("unlink {path}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(path, &mut depth)?;
        if name == "." || name == ".." {
            return Err(Error::IsADirectory);
        }
        let inode = self.find_entry(parent, &name)?.ok_or(Error::NotFound)?;
        if self.inode(inode).is_dir() {
            return Err(Error::IsADirectory);
        }

        self.remove_entry(parent, &name)?;
        let links = {
            let record = self.inode_mut(inode);
            record.nlink -= 1;
            record.nlink
        };
        debug!("inode {inode} nlink={links}");

        if links == 0 {
            if self.is_open(inode) {
                // 还有打开的描述符：推迟到最后一次 close 回收
                debug!("inode {inode} still open, release deferred");
            } else {
                self.release_inode(inode);
            }
        }
        Ok(())
    }

    /// 创建符号链接；目标文本原样存进链接自己的数据块，
    /// 创建时从不校验目标是否存在
    pub fn symlink(&mut self, target: &str, link_path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("symlink {target} -> {link_path}");

        if target.len() > self.block_size {
            return Err(Error::NameTooLong);
        }

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(link_path, &mut depth)?;
        check_name(&name)?;
        if self.find_entry(parent, &name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let inode = self.find_free_inode()?;
        let record = self.inode_mut(inode);
        record.init(InodeKind::Symlink, 1);
        record.size = target.len();

        let linked = self.alloc_block().and_then(|block| {
            self.inode_mut(inode).block_map.push(Some(block));
            self.block_device
                .write_block(block as usize, target.as_bytes())?;
            self.add_entry(parent, &name, inode)
        });
        if let Err(e) = linked {
            self.release_inode(inode);
            return Err(e);
        }
        Ok(())
    }

    /// 调整当前目录下文件的逻辑长度。
    /// 缩短会释放多余的尾部块；增长不分配块，空洞读出为零。
    pub fn truncate(&mut self, name: &str, new_size: usize) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("truncate {name} -> {new_size}");

        let inode = self.find_entry(self.cwd, name)?.ok_or(Error::NotFound)?;
        let old_size = self.inode(inode).size;
        if new_size == old_size {
            return Ok(());
        }

        self.inode_mut(inode).size = new_size;
        if new_size < old_size {
            let keep = new_size.div_ceil(self.block_size);
            while self.inode(inode).block_map.len() > keep {
                if let Some(block) = self.inode_mut(inode).block_map.pop().flatten() {
                    self.free_block(block);
                }
            }
        }
        Ok(())
    }

    /// 打开普通文件，返回描述符编号。
    /// 终项符号链接在此展开；目录不可打开。
    pub fn open(&mut self, path: &str) -> Result<usize, Error> {
        self.ensure_mounted()?;

        let mut depth = MAX_SYMLINK_DEPTH;
        let inode = self.resolve_inode(path, &mut depth)?;

        match self.inode(inode).kind {
            InodeKind::Regular => (),
            InodeKind::Directory => return Err(Error::CannotOpenDirectory),
            // resolve_inode 已把符号链接展开到底
            InodeKind::Symlink | InodeKind::Free => return Err(Error::NotFound),
        }

        let handle = FileHandle { inode, cursor: 0 };
        let fd = match self.open_files.iter().position(Option::is_none) {
            Some(fd) => {
                self.open_files[fd] = Some(handle);
                fd
            }
            None => {
                self.open_files.push(Some(handle));
                self.open_files.len() - 1
            }
        };
        debug!("open {path} -> fd={fd}");
        Ok(fd)
    }

    /// 关闭描述符；被删文件的最后一次关闭触发回收
    pub fn close(&mut self, fd: usize) -> Result<(), Error> {
        self.ensure_mounted()?;
        let inode = self.handle(fd)?.inode;
        self.open_files[fd] = None;
        debug!("close fd={fd}");

        if self.inode(inode).nlink == 0 && !self.is_open(inode) {
            self.release_inode(inode);
        }
        Ok(())
    }

    /// 游标可以落在任意非负偏移，越过文件末尾也允许
    pub fn seek(&mut self, fd: usize, offset: usize) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("seek fd={fd} offset={offset}");
        self.handle_mut(fd)?.cursor = offset;
        Ok(())
    }

    /// 从游标处写入；首次触到的逻辑块就地分配，
    /// 游标越过文件末尾时增长逻辑长度
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, Error> {
        self.ensure_mounted()?;
        let handle = self.handle(fd)?;
        let (inode, mut cursor) = (handle.inode, handle.cursor);
        let block_size = self.block_size;
        debug!("write fd={fd} bytes={}", buf.len());

        let mut written = 0;
        while written < buf.len() {
            let block_index = cursor / block_size;
            let in_block = cursor % block_size;
            let chunk = (buf.len() - written).min(block_size - in_block);

            let block = match self.physical_block(inode, block_index) {
                Some(block) => block,
                None => {
                    let block = self.alloc_block()?;
                    let block_map = &mut self.inode_mut(inode).block_map;
                    if block_map.len() <= block_index {
                        block_map.resize(block_index + 1, None);
                    }
                    block_map[block_index] = Some(block);
                    block
                }
            };

            let mut data = self.read_whole_block(block)?;
            data[in_block..in_block + chunk].copy_from_slice(&buf[written..written + chunk]);
            self.block_device.write_block(block as usize, &data)?;

            written += chunk;
            cursor += chunk;
        }

        self.handle_mut(fd)?.cursor = cursor;
        if cursor > self.inode(inode).size {
            self.inode_mut(inode).size = cursor;
        }
        Ok(written)
    }

    /// 从游标处读出至多`len`字节；未分配的空洞读出为零，
    /// 游标到达末尾之后读出为空
    pub fn read(&mut self, fd: usize, len: usize) -> Result<Vec<u8>, Error> {
        self.ensure_mounted()?;
        let handle = self.handle(fd)?;
        let (inode, mut cursor) = (handle.inode, handle.cursor);
        let block_size = self.block_size;

        let total = len.min(self.inode(inode).size.saturating_sub(cursor));
        debug!("read fd={fd} request={len} actual={total}");

        let mut data = vec![0; total];
        let mut done = 0;
        while done < total {
            let block_index = cursor / block_size;
            let in_block = cursor % block_size;
            let chunk = (total - done).min(block_size - in_block);

            if let Some(block) = self.physical_block(inode, block_index) {
                let src = self.read_whole_block(block)?;
                data[done..done + chunk].copy_from_slice(&src[in_block..in_block + chunk]);
            }

            done += chunk;
            cursor += chunk;
        }

        self.handle_mut(fd)?.cursor = cursor;
        Ok(data)
    }

    /// 目标 inode 的元信息；终项符号链接不展开，报告链接自身
    pub fn stat(&self, path: &str) -> Result<Stat, Error> {
        self.ensure_mounted()?;

        let mut depth = MAX_SYMLINK_DEPTH;
        let (parent, name) = self.resolve_parent(path, &mut depth)?;
        let id = self.find_entry(parent, &name)?.ok_or(Error::NotFound)?;
        let inode = self.inode(id);

        Ok(Stat {
            inode: id,
            kind: inode.kind,
            nlink: inode.nlink,
            size: inode.size as u64,
            blocks: inode.allocated_blocks() as u64,
        })
    }

    /// 当前目录的全部记录，按块序、槽序
    pub fn list(&self) -> Result<Vec<DirEntry>, Error> {
        self.ensure_mounted()?;

        let entries = self.list_entries(self.cwd)?;
        Ok(entries
            .into_iter()
            .map(|(name, id)| DirEntry {
                inode: id,
                kind: self.inode(id).kind,
                name,
            })
            .collect())
    }

    /// 切换当前目录；终项符号链接照`open`的方式展开
    pub fn change_dir(&mut self, path: &str) -> Result<(), Error> {
        self.ensure_mounted()?;
        debug!("cd {path}");

        let mut depth = MAX_SYMLINK_DEPTH;
        let inode = self.resolve_inode(path, &mut depth)?;
        if !self.inode(inode).is_dir() {
            return Err(Error::NotADirectory);
        }
        self.cwd = inode;
        Ok(())
    }
}
