use std::sync::Arc;

use block_dev::{BlockDevice, MemDisk};
use ram_fs::RamFileSystem;
use vfs::Error;

const BLOCK_SIZE: usize = 64;

fn mount() -> RamFileSystem {
    let disk: Arc<dyn BlockDevice> = Arc::new(MemDisk::new(BLOCK_SIZE, 100));
    let mut fs = RamFileSystem::new(disk);
    fs.format(10).unwrap();
    fs
}

#[test]
fn round_trip() {
    let mut fs = mount();
    // 覆盖 0、1、块边界前后与跨多块的长度
    for (i, len) in [0, 1, 63, 64, 65, 200].into_iter().enumerate() {
        let name = format!("file{i}");
        fs.create(&name).unwrap();

        let payload: Vec<u8> = (0..len).map(|b| b as u8).collect();
        let fd = fs.open(&name).unwrap();
        assert_eq!(fs.write(fd, &payload), Ok(len));
        fs.seek(fd, 0).unwrap();
        assert_eq!(fs.read(fd, len).unwrap(), payload);
        // 游标已到末尾，继续读为空
        assert_eq!(fs.read(fd, 16).unwrap(), Vec::<u8>::new());
        fs.close(fd).unwrap();

        assert_eq!(fs.stat(&name).unwrap().size, len as u64);
    }
}

#[test]
fn sparse_gap_reads_zero() {
    let mut fs = mount();
    fs.create("sparse").unwrap();

    let fd = fs.open("sparse").unwrap();
    fs.seek(fd, 100).unwrap();
    fs.write(fd, b"tail").unwrap();

    let stat = fs.stat("sparse").unwrap();
    assert_eq!(stat.size, 104);
    // 空洞不占块
    assert_eq!(stat.blocks, 1);

    fs.seek(fd, 0).unwrap();
    let gap = fs.read(fd, 100).unwrap();
    assert_eq!(gap.len(), 100);
    assert!(gap.iter().all(|&b| b == 0));
    assert_eq!(fs.read(fd, 4).unwrap(), b"tail");
    fs.close(fd).unwrap();
}

#[test]
fn truncate_grow_keeps_content() {
    let mut fs = mount();
    fs.create("grow").unwrap();
    let fd = fs.open("grow").unwrap();
    fs.write(fd, b"hello").unwrap();

    // 增长不分配块，新暴露的字节读出为零
    fs.truncate("grow", 100).unwrap();
    let stat = fs.stat("grow").unwrap();
    assert_eq!(stat.size, 100);
    assert_eq!(stat.blocks, 1);

    fs.seek(fd, 0).unwrap();
    let data = fs.read(fd, 100).unwrap();
    assert_eq!(&data[..5], b"hello");
    assert!(data[5..].iter().all(|&b| b == 0));
    fs.close(fd).unwrap();
}

#[test]
fn truncate_shrink_releases_blocks() {
    let mut fs = mount();
    fs.create("shrink").unwrap();
    let fd = fs.open("shrink").unwrap();
    fs.write(fd, &[0x5a; 200]).unwrap();
    fs.close(fd).unwrap();
    assert_eq!(fs.stat("shrink").unwrap().blocks, 4);

    fs.truncate("shrink", 10).unwrap();
    let stat = fs.stat("shrink").unwrap();
    assert_eq!(stat.size, 10);
    assert_eq!(stat.blocks, 1);

    let fd = fs.open("shrink").unwrap();
    assert_eq!(fs.read(fd, 100).unwrap(), vec![0x5a; 10]);
    fs.close(fd).unwrap();
}

#[test]
fn truncate_same_size_is_noop() {
    let mut fs = mount();
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    fs.write(fd, b"abc").unwrap();
    fs.close(fd).unwrap();

    fs.truncate("f", 3).unwrap();
    let stat = fs.stat("f").unwrap();
    assert_eq!((stat.size, stat.blocks), (3, 1));

    assert_eq!(fs.truncate("missing", 0), Err(Error::NotFound));
}

#[test]
fn seek_past_end_reads_nothing() {
    let mut fs = mount();
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    fs.write(fd, b"abc").unwrap();
    fs.seek(fd, 1000).unwrap();
    assert_eq!(fs.read(fd, 10).unwrap(), Vec::<u8>::new());
    fs.close(fd).unwrap();
}

#[test]
fn invalid_descriptors() {
    let mut fs = mount();
    assert_eq!(fs.close(0), Err(Error::InvalidDescriptor));

    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    fs.close(fd).unwrap();
    assert_eq!(fs.close(fd), Err(Error::InvalidDescriptor));
    assert_eq!(fs.seek(fd, 0), Err(Error::InvalidDescriptor));
    assert_eq!(fs.write(fd, b"x"), Err(Error::InvalidDescriptor));
    assert_eq!(fs.read(fd, 1), Err(Error::InvalidDescriptor));
}

#[test]
fn descriptor_slots_are_reused() {
    let mut fs = mount();
    fs.create("a").unwrap();
    fs.create("b").unwrap();
    let fd_a = fs.open("a").unwrap();
    let fd_b = fs.open("b").unwrap();
    assert_eq!((fd_a, fd_b), (0, 1));

    fs.close(fd_a).unwrap();
    // 最低的空槽优先复用
    assert_eq!(fs.open("b").unwrap(), 0);
    assert_eq!(fs.open("a").unwrap(), 2);
}

#[test]
fn open_directory_fails() {
    let mut fs = mount();
    fs.mkdir("d").unwrap();
    assert_eq!(fs.open("d").unwrap_err(), Error::CannotOpenDirectory);
    assert_eq!(fs.open(".").unwrap_err(), Error::CannotOpenDirectory);
}

#[test]
fn device_exhaustion() {
    let mut fs = mount();
    fs.create("big").unwrap();
    let fd = fs.open("big").unwrap();
    // 设备一共 100 块，根目录还占着若干
    assert_eq!(
        fs.write(fd, &[1; 100 * BLOCK_SIZE]).unwrap_err(),
        Error::NoFreeBlocks
    );
    fs.close(fd).unwrap();
}
