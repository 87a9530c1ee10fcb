mod cli;

use std::sync::Arc;

use block_dev::{BlockDevice, MemDisk};
use clap::Parser;
use ram_fs::RamFileSystem;
use vfs::{Error, InodeKind};

use crate::cli::Cli;

fn main() -> Result<(), Error> {
    env_logger::init();
    let cli = Cli::parse();

    let disk: Arc<dyn BlockDevice> = Arc::new(MemDisk::new(cli.block_size, cli.block_count));
    let mut fs = RamFileSystem::new(disk);

    println!(">>> Creating files and folders");
    fs.format(cli.inode_count)?;

    fs.mkdir("documents")?;
    fs.create("/documents/secret.txt")?;

    let fd = fs.open("/documents/secret.txt")?;
    fs.write(fd, b"TOP SECRET DATA")?;
    fs.close(fd)?;

    println!("\n>>> Simple symlink");
    fs.symlink("/documents/secret.txt", "my_link")?;
    print_dir(&fs)?;
    print_stat(&fs, "my_link")?;

    let fd = fs.open("my_link")?;
    let data = fs.read(fd, 100)?;
    println!("Output: {:?}", String::from_utf8_lossy(&data));
    fs.close(fd)?;

    println!("\n>>> Directory symlink and navigation");
    fs.symlink("/documents", "goto_docs")?;
    fs.change_dir("goto_docs")?;
    print_dir(&fs)?;
    fs.change_dir("..")?;

    println!("\n>>> Chained symlinks");
    fs.symlink("my_link", "link_to_link")?;
    let fd = fs.open("link_to_link")?;
    let data = fs.read(fd, 100)?;
    println!("Output: {:?}", String::from_utf8_lossy(&data));
    fs.close(fd)?;

    println!("\n>>> Hard links");
    fs.link("/documents/secret.txt", "secret_alias")?;
    print_stat(&fs, "secret_alias")?;
    fs.unlink("secret_alias")?;
    print_stat(&fs, "/documents/secret.txt")?;

    println!("\n>>> Truncate");
    fs.change_dir("/documents")?;
    fs.truncate("secret.txt", 3)?;
    print_stat(&fs, "secret.txt")?;
    fs.change_dir("/")?;

    println!("\n>>> Broken link");
    fs.symlink("/nowhere/ghost.txt", "broken_link")?;
    println!(" -> Created link to non-existent file");
    match fs.open("broken_link") {
        Err(e) => println!("Expected error: {e:?}"),
        Ok(_) => eprintln!("Error: Should have failed!"),
    }

    println!("\n>>> Infinite recursion");
    fs.mkdir("loops")?;
    fs.change_dir("loops")?;
    fs.symlink("link_B", "link_A")?;
    fs.symlink("link_A", "link_B")?;
    println!(" -> Created infinite loop: link_A <-> link_B");
    match fs.open("link_A") {
        Err(Error::TooManySymlinks) => println!("Expected error: TooManySymlinks"),
        other => eprintln!("Error: Loop not detected: {other:?}"),
    }

    Ok(())
}

fn print_dir(fs: &RamFileSystem) -> Result<(), Error> {
    println!("ls (cwd={})", fs.current_dir());
    for entry in fs.list()? {
        let kind = match entry.kind {
            InodeKind::Regular => "REG",
            InodeKind::Directory => "DIR",
            InodeKind::Symlink => "SYM",
            InodeKind::Free => "FREE",
        };
        let stat = fs.stat(&entry.name)?;
        println!(
            "{:<10} [inode: {}, type: {kind}, nlink: {}]",
            entry.name, entry.inode, stat.nlink
        );
    }
    Ok(())
}

fn print_stat(fs: &RamFileSystem, path: &str) -> Result<(), Error> {
    let stat = fs.stat(path)?;
    println!(
        "[STAT] '{path}': inode={}, kind={:?}, nlink={}, size={}, blocks={}",
        stat.inode, stat.kind, stat.nlink, stat.size, stat.blocks
    );
    Ok(())
}
