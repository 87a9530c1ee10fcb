//! # 数据结构层
//!
//! 引擎内部的数据结构：分配位图、inode 记录、定长目录项。
//! 其中只有目录项会落到设备的块上。

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::Inode;

mod dir_entry;
pub use dir_entry::DirEntry;
