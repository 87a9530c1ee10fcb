use alloc::string::String;

#[derive(Debug)]
pub struct DirEntry {
    /// Inode number
    pub inode: u32,
    pub kind: InodeKind,
    pub name: String,
}

/// 文件系统对象的类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InodeKind {
    #[default]
    Free,
    Regular,
    Directory,
    Symlink,
}
