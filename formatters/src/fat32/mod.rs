// FAT32 module - formatter and reader

pub mod formatter_native;
pub mod reader;

pub use formatter_native::{Fat32Formatter, Fat32Layout, WriteStep};
pub use reader::{
    inspect_volume, is_fat32_boot_sector, Fat32BootInfo, Fat32VolumeInfo, FsInfoSummary,
};
