//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备；[`BlockDevice`] 就是对
//! 整块读写的抽象，文件系统引擎只通过它接触原始字节。
//!
//! [`MemDisk`] 是本仓库自带的块设备驱动：一块固定大小的内存区域，
//! 没有任何持久化。

#![no_std]

extern crate alloc;

mod mem_disk;

pub use self::mem_disk::MemDisk;

use core::fmt::Debug;

use vfs::Error;

/// 块设备驱动特质
pub trait BlockDevice: Debug + Send + Sync {
    /// 每块的字节数
    fn block_size(&self) -> usize;

    /// 总块数
    fn block_count(&self) -> usize;

    /// 把第`block_id`块的副本读进`buf`
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), Error>;

    /// 用`data`替换第`block_id`块的内容，不足一块的部分补零
    fn write_block(&self, block_id: usize, data: &[u8]) -> Result<(), Error>;
}
