#![no_std]

extern crate alloc;

/* ram-fs 的整体架构，自上而下 */

// 操作接口层：格式化、增删链接、读写与导航的公开操作
mod ops;

// 路径解析层：路径文本到 (父目录, 末项名字) 的翻译
mod path;

// 目录编码层：目录数据块内定长记录的增删查列
mod dir;

// 状态聚合层：inode 表、位图、描述符表的持有与分配
mod fs;

// 数据结构层：inode 记录、目录项、位图
mod layout;

pub use self::{fs::RamFileSystem, layout::DirEntry};

/// 根目录恒为 0 号 inode
pub const ROOT_INODE: u32 = 0;
/// 目录项中名字的最大字节数
pub const NAME_MAX_LEN: usize = 28;
/// 一次公开操作允许的符号链接展开次数
pub const MAX_SYMLINK_DEPTH: usize = 8;
