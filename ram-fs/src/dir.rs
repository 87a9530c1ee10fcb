//! # 目录编码层
//!
//! 目录就是数据块里的定长记录序列（见 [`DirEntry`]），
//! 这里实现记录的增、删、查、列。
//! 删除只原地清零槽位，目录的块从不回收。

use alloc::string::String;
use alloc::vec::Vec;

use vfs::Error;

use crate::layout::DirEntry;
use crate::RamFileSystem;

/// 一块内所有完整槽位的起始偏移
fn slot_offsets(block_size: usize) -> impl Iterator<Item = usize> {
    (0..block_size / DirEntry::SIZE).map(|slot| slot * DirEntry::SIZE)
}

impl RamFileSystem {
    /// 把`name -> child`写进目录的首个空槽；
    /// 没有空槽时目录增长一块，记录写在新块块首。
    pub(crate) fn add_entry(&mut self, dir: u32, name: &str, child: u32) -> Result<(), Error> {
        let entry = DirEntry::new(name, child);

        for block in self.dir_blocks(dir) {
            let mut data = self.read_whole_block(block)?;
            for offset in slot_offsets(self.block_size) {
                if data[offset] == 0 {
                    data[offset..offset + DirEntry::SIZE].copy_from_slice(&entry.to_bytes());
                    self.block_device.write_block(block as usize, &data)?;
                    return Ok(());
                }
            }
        }

        let block = self.alloc_block()?;
        let block_size = self.block_size;
        let dir_inode = self.inode_mut(dir);
        dir_inode.block_map.push(Some(block));
        dir_inode.size += block_size;
        self.block_device.write_block(block as usize, &entry.to_bytes())?;
        Ok(())
    }

    /// 按名字查找目录项，返回其指向的 inode 编号
    pub(crate) fn find_entry(&self, dir: u32, name: &str) -> Result<Option<u32>, Error> {
        if !self.inode(dir).is_dir() {
            return Err(Error::NotADirectory);
        }

        for block in self.dir_blocks(dir) {
            let data = self.read_whole_block(block)?;
            for offset in slot_offsets(self.block_size) {
                let entry = DirEntry::from_bytes(&data[offset..offset + DirEntry::SIZE]);
                if !entry.is_free() && entry.name() == name {
                    return Ok(Some(entry.inode_id()));
                }
            }
        }

        Ok(None)
    }

    /// 原地清零匹配的槽位
    pub(crate) fn remove_entry(&mut self, dir: u32, name: &str) -> Result<(), Error> {
        for block in self.dir_blocks(dir) {
            let mut data = self.read_whole_block(block)?;
            for offset in slot_offsets(self.block_size) {
                let entry = DirEntry::from_bytes(&data[offset..offset + DirEntry::SIZE]);
                if !entry.is_free() && entry.name() == name {
                    data[offset..offset + DirEntry::SIZE].fill(0);
                    self.block_device.write_block(block as usize, &data)?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// 按块序、槽序列出全部有效记录。
    /// 删除留下的空槽会被后来者填上，列出顺序因此不等于插入顺序。
    pub(crate) fn list_entries(&self, dir: u32) -> Result<Vec<(String, u32)>, Error> {
        if !self.inode(dir).is_dir() {
            return Err(Error::NotADirectory);
        }

        let mut entries = Vec::new();
        for block in self.dir_blocks(dir) {
            let data = self.read_whole_block(block)?;
            for offset in slot_offsets(self.block_size) {
                let entry = DirEntry::from_bytes(&data[offset..offset + DirEntry::SIZE]);
                if !entry.is_free() {
                    entries.push((String::from(entry.name()), entry.inode_id()));
                }
            }
        }
        Ok(entries)
    }

    /// 目录数据块的物理编号；目录的块映射不含空洞
    fn dir_blocks(&self, dir: u32) -> Vec<u32> {
        self.inode(dir).block_map.iter().flatten().copied().collect()
    }
}
