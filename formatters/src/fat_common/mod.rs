// Shared FAT32 building blocks: on-disk constants, sector templates,
// sizing and label encoding

pub mod boot_sector;
pub mod cluster_calc;
pub mod constants;
pub mod fsinfo;
pub mod label;

pub use boot_sector::{build_fat32_boot_sector, Fat32BootSectorParams, BOOT_SECTOR_TEMPLATE};
pub use cluster_calc::{calculate_fat32_params, fat_size_sectors, Fat32Params};
pub use constants::*;
pub use fsinfo::{FAT_SEED, FSINFO_TEMPLATE};
pub use label::{decode_volume_label, encode_volume_label};
