//! # 路径解析层
//!
//! 把路径文本翻译成`(父目录 inode, 末项名字)`。
//! 中途遇到的符号链接把目标的各项拼回待解析队列的前端；
//! 每次展开消耗一次额度，额度用尽即判定成环。

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use vfs::{Error, InodeKind};

use crate::{RamFileSystem, ROOT_INODE};

/// 滤掉空项后的路径组件
fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|cmp| !cmp.is_empty())
}

/// 终项展开时重建路径：把末项替换成链接目标。
/// 绝对目标原样返回；根下的相对目标回到根。
pub(crate) fn retarget(path: &str, target: &str) -> String {
    if target.starts_with('/') {
        return String::from(target);
    }
    match path.rsplit_once('/') {
        Some(("", _)) => format!("/{target}"),
        Some((dir, _)) => format!("{dir}/{target}"),
        None => String::from(target),
    }
}

impl RamFileSystem {
    /// 解析出末项所在的目录；末项本身不解析。
    ///
    /// `depth`是剩余的符号链接展开额度，
    /// 与终项展开（[`Self::resolve_inode`]）共用同一份。
    pub(crate) fn resolve_parent(
        &self,
        path: &str,
        depth: &mut usize,
    ) -> Result<(u32, String), Error> {
        let mut dir = if path.starts_with('/') {
            ROOT_INODE
        } else {
            self.cwd
        };

        let mut parts: VecDeque<String> = components(path).map(String::from).collect();
        let Some(final_name) = parts.pop_back() else {
            // 空路径或纯分隔符：落在起点目录自身
            return Ok((dir, String::from(".")));
        };

        while let Some(part) = parts.pop_front() {
            let next = self.find_entry(dir, &part)?.ok_or(Error::NotFound)?;

            match self.inode(next).kind {
                InodeKind::Directory => dir = next,
                InodeKind::Symlink => {
                    if *depth == 0 {
                        return Err(Error::TooManySymlinks);
                    }
                    *depth -= 1;

                    let target = self.read_symlink(next)?;
                    if target.starts_with('/') {
                        dir = ROOT_INODE;
                    }
                    // 目标的组件顶替刚消耗的组件，接到队列前端
                    let spliced: Vec<String> = components(&target).map(String::from).collect();
                    for cmp in spliced.into_iter().rev() {
                        parts.push_front(cmp);
                    }
                }
                InodeKind::Regular | InodeKind::Free => return Err(Error::NotADirectory),
            }
        }

        Ok((dir, final_name))
    }

    /// 完整解析到目标 inode：在 [`Self::resolve_parent`] 之上，
    /// 对终项继续做同额度的符号链接展开。
    pub(crate) fn resolve_inode(&self, path: &str, depth: &mut usize) -> Result<u32, Error> {
        let mut path = String::from(path);
        loop {
            let (parent, name) = self.resolve_parent(&path, depth)?;
            let id = self.find_entry(parent, &name)?.ok_or(Error::NotFound)?;

            if self.inode(id).kind != InodeKind::Symlink {
                return Ok(id);
            }
            if *depth == 0 {
                return Err(Error::TooManySymlinks);
            }
            *depth -= 1;
            path = retarget(&path, &self.read_symlink(id)?);
        }
    }
}
