use clap::Parser;

/// Exercise ram-fs on an in-memory block device
#[derive(Parser)]
pub struct Cli {
    /// Bytes per block
    #[arg(long, default_value_t = 64)]
    pub block_size: usize,

    /// Total blocks on the device
    #[arg(long, default_value_t = 100)]
    pub block_count: usize,

    /// Inode table capacity
    #[arg(long, default_value_t = 10)]
    pub inode_count: usize,
}
