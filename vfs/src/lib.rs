#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod stat;

pub use self::{
    dirent::{DirEntry, InodeKind},
    error::Error,
    stat::Stat,
};
