pub mod fat_common;
pub mod fat32;

// Re-export formatters
pub use fat32::{inspect_volume, Fat32Formatter, Fat32Layout, Fat32VolumeInfo};
