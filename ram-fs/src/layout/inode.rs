use alloc::vec::Vec;

use vfs::InodeKind;

/// inode 记录：文件系统对象的元信息。
/// 表中按编号索引，0 号恒为根目录。
#[derive(Debug, Default, Clone)]
pub struct Inode {
    /// 类型
    pub kind: InodeKind,
    /// 指向本 inode 的目录项个数
    pub nlink: u32,
    /// 逻辑字节长度：文件内容长、链接目标长或目录已计块字节数
    pub size: usize,
    /// 逻辑块到物理块的映射，`None` 是未分配的空洞
    pub block_map: Vec<Option<u32>>,
}

impl Inode {
    /// 占用一条空闲记录
    #[inline]
    pub fn init(&mut self, kind: InodeKind, nlink: u32) {
        *self = Self {
            kind,
            nlink,
            ..Self::default()
        };
    }

    /// 退回空闲状态，等待复用
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.kind == InodeKind::Free
    }

    /// 实际分配的物理块数
    #[inline]
    pub fn allocated_blocks(&self) -> usize {
        self.block_map.iter().flatten().count()
    }
}
