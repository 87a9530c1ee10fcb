use alloc::boxed::Box;
use alloc::vec;
use core::fmt;

use spin::Mutex;
use vfs::Error;

use crate::BlockDevice;

/// 内存里的虚拟磁盘：`block_size * block_count` 字节的连续区域。
///
/// 特质方法只拿`&self`，区域因此包在锁里；
/// 设备本身不理解块的内容，也不知道哪些块在使用中。
pub struct MemDisk {
    block_size: usize,
    block_count: usize,
    area: Mutex<Box<[u8]>>,
}

impl MemDisk {
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            area: Mutex::new(vec![0; block_size * block_count].into_boxed_slice()),
        }
    }

    /// 校验块编号并换算出区域内偏移
    #[inline]
    fn area_offset(&self, block_id: usize) -> Result<usize, Error> {
        if block_id >= self.block_count {
            return Err(Error::OutOfRange);
        }
        Ok(block_id * self.block_size)
    }
}

impl BlockDevice for MemDisk {
    #[inline]
    fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    fn block_count(&self) -> usize {
        self.block_count
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), Error> {
        let offset = self.area_offset(block_id)?;
        let area = self.area.lock();

        let len = buf.len().min(self.block_size);
        buf[..len].copy_from_slice(&area[offset..offset + len]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, data: &[u8]) -> Result<(), Error> {
        let offset = self.area_offset(block_id)?;
        if data.len() > self.block_size {
            return Err(Error::OversizedPayload);
        }

        let mut area = self.area.lock();
        let block = &mut area[offset..offset + self.block_size];
        block.fill(0);
        block[..data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl fmt::Debug for MemDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemDisk")
            .field("block_size", &self.block_size)
            .field("block_count", &self.block_count)
            .finish_non_exhaustive()
    }
}
