use std::sync::Arc;

use block_dev::{BlockDevice, MemDisk};
use ram_fs::{RamFileSystem, ROOT_INODE};
use vfs::{Error, InodeKind};

const BLOCK_SIZE: usize = 64;

fn mount() -> RamFileSystem {
    let disk: Arc<dyn BlockDevice> = Arc::new(MemDisk::new(BLOCK_SIZE, 100));
    let mut fs = RamFileSystem::new(disk);
    fs.format(10).unwrap();
    fs
}

#[test]
fn operations_require_format() {
    let disk: Arc<dyn BlockDevice> = Arc::new(MemDisk::new(BLOCK_SIZE, 100));
    let mut fs = RamFileSystem::new(disk);

    assert_eq!(fs.mkdir("d"), Err(Error::NotMounted));
    assert_eq!(fs.create("f"), Err(Error::NotMounted));
    assert_eq!(fs.open("f").unwrap_err(), Error::NotMounted);
    assert_eq!(fs.list().unwrap_err(), Error::NotMounted);
    assert_eq!(fs.change_dir("/"), Err(Error::NotMounted));

    fs.format(10).unwrap();
    fs.mkdir("d").unwrap();
}

#[test]
fn format_discards_everything() {
    let mut fs = mount();
    fs.mkdir("d").unwrap();
    fs.create("/d/f").unwrap();
    fs.change_dir("d").unwrap();

    fs.format(10).unwrap();
    assert_eq!(fs.current_dir(), ROOT_INODE);
    assert_eq!(fs.stat("d").unwrap_err(), Error::NotFound);

    let names: Vec<String> = fs.list().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, [".", ".."]);
}

#[test]
fn root_stat() {
    let fs = mount();
    let stat = fs.stat("/").unwrap();
    assert_eq!(stat.inode, ROOT_INODE);
    assert_eq!(stat.kind, InodeKind::Directory);
    assert_eq!(stat.nlink, 3);
}

#[test]
fn relative_and_absolute() {
    let mut fs = mount();
    fs.mkdir("a").unwrap();
    fs.change_dir("a").unwrap();
    fs.create("f").unwrap();
    assert_eq!(fs.stat("/a/f").unwrap().inode, fs.stat("f").unwrap().inode);

    fs.create("../top").unwrap();
    fs.change_dir("/").unwrap();
    fs.stat("top").unwrap();
    fs.stat("./a/./f").unwrap();
}

#[test]
fn dot_entries_resolve() {
    let mut fs = mount();
    fs.mkdir("a").unwrap();
    fs.change_dir("a").unwrap();
    assert_eq!(fs.stat(".").unwrap().inode, fs.current_dir());
    assert_eq!(fs.stat("..").unwrap().inode, ROOT_INODE);

    fs.change_dir("..").unwrap();
    assert_eq!(fs.current_dir(), ROOT_INODE);
    // 根的`..`指向自己
    fs.change_dir("..").unwrap();
    assert_eq!(fs.current_dir(), ROOT_INODE);
}

#[test]
fn missing_and_wrong_kind() {
    let mut fs = mount();
    assert_eq!(fs.stat("/no/such").unwrap_err(), Error::NotFound);
    assert_eq!(fs.stat("missing").unwrap_err(), Error::NotFound);

    fs.create("f").unwrap();
    // 中途撞上非目录
    assert_eq!(fs.stat("f/x").unwrap_err(), Error::NotADirectory);
    assert_eq!(fs.change_dir("f").unwrap_err(), Error::NotADirectory);
}

#[test]
fn trailing_and_repeated_separators() {
    let mut fs = mount();
    fs.mkdir("d").unwrap();
    fs.stat("d/").unwrap();
    fs.stat("//d").unwrap();
    fs.change_dir("d//").unwrap();
    assert_eq!(fs.stat(".").unwrap().inode, fs.stat("/d").unwrap().inode);
}

#[test]
fn list_reuses_freed_slots() {
    let mut fs = mount();
    fs.create("a").unwrap();
    fs.create("b").unwrap();
    fs.unlink("a").unwrap();
    fs.create("c").unwrap();

    let names: Vec<String> = fs.list().unwrap().into_iter().map(|e| e.name).collect();
    // c 填回了 a 留下的槽位：列出按块序、槽序
    assert_eq!(names, [".", "..", "c", "b"]);
}

#[test]
fn list_reports_kinds() {
    let mut fs = mount();
    fs.mkdir("d").unwrap();
    fs.create("f").unwrap();
    fs.symlink("f", "l").unwrap();

    let entries = fs.list().unwrap();
    let kind_of = |name: &str| {
        entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.kind)
            .unwrap()
    };
    assert_eq!(kind_of("d"), InodeKind::Directory);
    assert_eq!(kind_of("f"), InodeKind::Regular);
    assert_eq!(kind_of("l"), InodeKind::Symlink);
    assert_eq!(kind_of("."), InodeKind::Directory);
}
