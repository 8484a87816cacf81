// FAT32 on-disk constants: boot sector field offsets, FSInfo offsets,
// fixed geometry and the volume layout

// Boot sector offsets
pub const BS_JMP_BOOT: usize = 0x00;
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_SEC_PER_TRK: usize = 0x18;
pub const BPB_NUM_HEADS: usize = 0x1A;
pub const BPB_HIDD_SEC: usize = 0x1C;
pub const BPB_TOT_SEC32: usize = 0x20;

// FAT32 extended BPB (starts at 36)
pub const BPB_FAT_SZ32: usize = 0x24;
pub const BPB_EXT_FLAGS: usize = 0x28;
pub const BPB_FS_VER: usize = 0x2A;
pub const BPB_ROOT_CLUS: usize = 0x2C;
pub const BPB_FS_INFO: usize = 0x30;
pub const BPB_BK_BOOT_SEC: usize = 0x32;
pub const BPB_RESERVED: usize = 0x34;
pub const BS32_DRV_NUM: usize = 0x40;
pub const BS32_RESERVED1: usize = 0x41;
pub const BS32_BOOT_SIG: usize = 0x42;
pub const BS32_VOL_ID: usize = 0x43;
pub const BS32_VOL_LAB: usize = 0x47;
pub const BS32_FIL_SYS_TYPE: usize = 0x52;
pub const BS32_BOOT_CODE: usize = 0x5A;

// Boot sector signature
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;

// FSInfo offsets
pub const FSI_LEAD_SIG: usize = 0;
pub const FSI_STRUC_SIG: usize = 484;
pub const FSI_FREE_COUNT: usize = 488;
pub const FSI_NXT_FREE: usize = 492;
pub const FSI_TRAIL_SIG: usize = 508;

pub const FSI_LEAD_SIGNATURE: [u8; 4] = *b"RRaA";
pub const FSI_STRUC_SIGNATURE: [u8; 4] = *b"rrAa";
pub const FSI_TRAIL_SIGNATURE: [u8; 4] = [0x00, 0x00, 0x55, 0xAA];
pub const FSI_UNKNOWN: u32 = 0xFFFFFFFF;

// Field widths
pub const VOLUME_LABEL_LEN: usize = 11;
pub const FS_TYPE_LEN: usize = 8;

// Fixed geometry
pub const SECTOR_SIZE: usize = 512;
pub const RESERVED_SECTORS: u32 = 32;
pub const NUM_FATS: u32 = 2;
pub const FAT32_ROOT_CLUSTER: u32 = 2;  // Standard root directory cluster for FAT32
pub const FAT32_FS_INFO_SECTOR: u16 = 1;  // FSInfo sector location
pub const FAT32_BACKUP_BOOT_SECTOR: u16 = 6;  // Backup boot sector location
pub const FAT32_BACKUP_FS_INFO_SECTOR: u16 = 7;  // Follows the backup boot sector

// Media descriptors
pub const MEDIA_FIXED: u8 = 0xF8;  // Fixed disk

// FAT entry values
pub const FAT32_EOC: u32 = 0x0FFFFFFF;  // End of chain marker (28 bits)
pub const FAT32_ENTRY_SIZE: usize = 4;
pub const FAT_SEED_ENTRIES: usize = 3;  // media marker, reserved EOC, root EOC

// Cluster count thresholds
pub const FAT32_MIN_CLUSTERS: u32 = 65525;
pub const FAT32_MAX_CLUSTERS: u32 = 0x0FFF_FFF5;  // Highest usable 28-bit entry is 0x0FFFFFF6

// Size limits, in 512-byte sectors
pub const MIN_AUTO_SECTORS: u64 = 66_600;
pub const MAX_TOTAL_SECTORS: u64 = 0xFFFF_FFFE;  // u32::MAX - 1
