use alloc::vec;
use alloc::vec::Vec;

/// 一组64位
type BitGroup = u64;

/// 分配位图：每块一位，0 为空闲。
/// 只存在于引擎内存中，设备上没有对应区域。
#[derive(Debug, Default)]
pub struct Bitmap {
    groups: Vec<BitGroup>,
    /// 可分配的位数
    bits: usize,
}

impl Bitmap {
    pub fn new(bits: usize) -> Self {
        Self {
            groups: vec![0; bits.div_ceil(64)],
            bits,
        }
    }

    /// 位图指示的总块数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits
    }

    /// 分配编号最低的空闲位并返回其编号。
    /// 若空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<u32> {
        // 寻找还有剩余空间的bit组(即还有0)
        let (group_index, group) = self
            .groups
            .iter_mut()
            .enumerate()
            .find(|(_, group)| **group != BitGroup::MAX)?;

        let ingroup_index = group.trailing_ones() as usize;
        let bit = group_index * 64 + ingroup_index;
        // 最后一组的尾部可能超出实际块数
        if bit >= self.bits {
            return None;
        }

        *group |= 1 << ingroup_index;
        Some(bit as u32)
    }

    /// 释放编号对应的位；内容不清零，重新分配时才会清
    pub fn dealloc(&mut self, bit: u32) {
        let (group_index, ingroup_index) = (bit as usize / 64, bit as usize % 64);

        // 编号一定得有对应的位
        assert_ne!(self.groups[group_index] & (1 << ingroup_index), 0);

        self.groups[group_index] &= !(1 << ingroup_index);
    }
}
