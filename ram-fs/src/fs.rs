//! # 状态聚合层
//!
//! [`RamFileSystem`] 持有全部可变状态：inode 表、分配位图、
//! 打开文件表与当前目录。所有公开操作都以`&mut self`进入，
//! 同一时刻只存在一个逻辑调用者。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use block_dev::BlockDevice;
use log::debug;
use vfs::{Error, InodeKind};

use crate::layout::{Bitmap, Inode};
use crate::ROOT_INODE;

/// 打开文件描述符：一个 inode 加一个读写游标
#[derive(Debug, Clone)]
pub(crate) struct FileHandle {
    pub inode: u32,
    /// 文件逻辑内容中的绝对字节偏移
    pub cursor: usize,
}

#[derive(Debug)]
pub struct RamFileSystem {
    pub(crate) block_device: Arc<dyn BlockDevice>,
    /// 缓存的设备几何参数
    pub(crate) block_size: usize,
    pub(crate) inodes: Vec<Inode>,
    pub(crate) block_bitmap: Bitmap,
    pub(crate) open_files: Vec<Option<FileHandle>>,
    pub(crate) cwd: u32,
    mounted: bool,
}

impl RamFileSystem {
    /// 绑定设备；格式化之前所有操作都会被拒绝
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        let block_size = block_device.block_size();
        Self {
            block_device,
            block_size,
            inodes: Vec::new(),
            block_bitmap: Bitmap::default(),
            open_files: Vec::new(),
            cwd: ROOT_INODE,
            mounted: false,
        }
    }

    /// 摧毁性地重建文件系统：重置位图与 inode 表，
    /// 0 号 inode 成为根目录，`.`与`..`都指向自身。
    pub fn format(&mut self, inode_count: usize) -> Result<(), Error> {
        assert!(inode_count >= 1, "at least the root inode is required");

        self.block_bitmap = Bitmap::new(self.block_device.block_count());
        self.inodes = vec![Inode::default(); inode_count];
        self.open_files.clear();
        self.cwd = ROOT_INODE;
        self.mounted = true;

        self.inodes[ROOT_INODE as usize].init(InodeKind::Directory, 1);
        self.add_entry(ROOT_INODE, ".", ROOT_INODE)?;
        self.add_entry(ROOT_INODE, "..", ROOT_INODE)?;
        // 自引用之外，`.`与`..`各记一个链接
        self.inodes[ROOT_INODE as usize].nlink += 2;

        debug!(
            "format: {inode_count} inodes, {} blocks",
            self.block_bitmap.capacity()
        );
        Ok(())
    }

    /// 当前目录的 inode 编号
    #[inline]
    pub fn current_dir(&self) -> u32 {
        self.cwd
    }
}

impl RamFileSystem {
    #[inline]
    pub(crate) fn ensure_mounted(&self) -> Result<(), Error> {
        if self.mounted {
            Ok(())
        } else {
            Err(Error::NotMounted)
        }
    }

    #[inline]
    pub(crate) fn inode(&self, id: u32) -> &Inode {
        &self.inodes[id as usize]
    }

    #[inline]
    pub(crate) fn inode_mut(&mut self, id: u32) -> &mut Inode {
        &mut self.inodes[id as usize]
    }

    /// 编号最低优先地选取空闲 inode；0 号永久保留
    pub(crate) fn find_free_inode(&self) -> Result<u32, Error> {
        self.inodes
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, inode)| inode.is_free())
            .map(|(id, _)| id as u32)
            .ok_or(Error::NoFreeInodes)
    }

    /// 分配编号最低的空闲块并清零，保证新块不暴露旧内容
    pub(crate) fn alloc_block(&mut self) -> Result<u32, Error> {
        let block = self.block_bitmap.alloc().ok_or(Error::NoFreeBlocks)?;
        // 空负载写入即整块清零
        self.block_device.write_block(block as usize, &[])?;
        Ok(block)
    }

    #[inline]
    pub(crate) fn free_block(&mut self, block: u32) {
        self.block_bitmap.dealloc(block);
    }

    /// 释放 inode 的全部数据块并把记录退回空闲状态
    pub(crate) fn release_inode(&mut self, id: u32) {
        let block_map = mem::take(&mut self.inode_mut(id).block_map);
        for block in block_map.into_iter().flatten() {
            self.free_block(block);
        }
        self.inode_mut(id).reset();
        debug!("inode {id} released");
    }

    /// 逻辑块编号到物理块的映射；空洞与越界都算未分配
    #[inline]
    pub(crate) fn physical_block(&self, id: u32, index: usize) -> Option<u32> {
        self.inode(id).block_map.get(index).copied().flatten()
    }

    /// 读出整块的副本
    pub(crate) fn read_whole_block(&self, block: u32) -> Result<Vec<u8>, Error> {
        let mut data = vec![0; self.block_size];
        self.block_device.read_block(block as usize, &mut data)?;
        Ok(data)
    }

    pub(crate) fn handle(&self, fd: usize) -> Result<&FileHandle, Error> {
        self.open_files
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(Error::InvalidDescriptor)
    }

    pub(crate) fn handle_mut(&mut self, fd: usize) -> Result<&mut FileHandle, Error> {
        self.open_files
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Error::InvalidDescriptor)
    }

    /// 是否还有描述符引用此 inode
    pub(crate) fn is_open(&self, id: u32) -> bool {
        self.open_files
            .iter()
            .flatten()
            .any(|handle| handle.inode == id)
    }

    /// 符号链接存储的目标文本
    pub(crate) fn read_symlink(&self, id: u32) -> Result<String, Error> {
        let inode = self.inode(id);
        debug_assert_eq!(inode.kind, InodeKind::Symlink);

        let data = match inode.block_map.first().copied().flatten() {
            Some(block) => self.read_whole_block(block)?,
            None => return Ok(String::new()),
        };
        Ok(String::from_utf8_lossy(&data[..inode.size]).into_owned())
    }
}
