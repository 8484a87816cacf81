// Boot sector builder for FAT32
// Every constant field lives in BOOT_SECTOR_TEMPLATE; a volume only patches
// the handful of size-dependent fields on a copy of it.

use super::constants::*;
use static_assertions::const_assert_eq;

pub const JMP_BOOT: [u8; 3] = [0xEB, 0x00, 0x90];
pub const OEM_NAME: [u8; 8] = *b"RUFUSL\0\0";
// CHS geometry, unused on LBA media
pub const SECTORS_PER_TRACK: u16 = 0xFFFF;
pub const NUM_HEADS: u16 = 0xFFFF;
pub const DEFAULT_VOLUME_ID: u32 = 0xCAFEBABE;
pub const DEFAULT_VOLUME_LABEL: [u8; VOLUME_LABEL_LEN] = *b"NO NAME    ";
pub const FS_TYPE: [u8; FS_TYPE_LEN] = *b"FAT32   ";

// Fields must tile the extended BPB without gaps or overlap
const_assert_eq!(BS32_VOL_ID + 4, BS32_VOL_LAB);
const_assert_eq!(BS32_VOL_LAB + VOLUME_LABEL_LEN, BS32_FIL_SYS_TYPE);
const_assert_eq!(BS32_FIL_SYS_TYPE + FS_TYPE_LEN, BS32_BOOT_CODE);
const_assert_eq!(BOOT_SIGNATURE_OFFSET + 2, SECTOR_SIZE);

pub(crate) const fn put(
    mut sector: [u8; SECTOR_SIZE],
    offset: usize,
    bytes: &[u8],
) -> [u8; SECTOR_SIZE] {
    let mut i = 0;
    while i < bytes.len() {
        sector[offset + i] = bytes[i];
        i += 1;
    }
    sector
}

/// The constant part of every boot sector this crate writes. Sectors per
/// cluster, total sectors and FAT size are zero here.
pub const BOOT_SECTOR_TEMPLATE: [u8; SECTOR_SIZE] = {
    let s = [0u8; SECTOR_SIZE];
    let s = put(s, BS_JMP_BOOT, &JMP_BOOT);
    let s = put(s, BS_OEM_NAME, &OEM_NAME);
    let s = put(s, BPB_BYTES_PER_SEC, &(SECTOR_SIZE as u16).to_le_bytes());
    let s = put(s, BPB_RSVD_SEC_CNT, &(RESERVED_SECTORS as u16).to_le_bytes());
    let s = put(s, BPB_NUM_FATS, &[NUM_FATS as u8]);
    let s = put(s, BPB_ROOT_ENT_CNT, &0u16.to_le_bytes());  // Always 0 for FAT32
    let s = put(s, BPB_TOT_SEC16, &0u16.to_le_bytes());
    let s = put(s, BPB_MEDIA, &[MEDIA_FIXED]);
    let s = put(s, BPB_FAT_SZ16, &0u16.to_le_bytes());  // Always 0 for FAT32
    let s = put(s, BPB_SEC_PER_TRK, &SECTORS_PER_TRACK.to_le_bytes());
    let s = put(s, BPB_NUM_HEADS, &NUM_HEADS.to_le_bytes());
    let s = put(s, BPB_HIDD_SEC, &0u32.to_le_bytes());
    let s = put(s, BPB_EXT_FLAGS, &0u16.to_le_bytes());  // Mirroring enabled
    let s = put(s, BPB_FS_VER, &0u16.to_le_bytes());  // Version 0.0
    let s = put(s, BPB_ROOT_CLUS, &FAT32_ROOT_CLUSTER.to_le_bytes());
    let s = put(s, BPB_FS_INFO, &FAT32_FS_INFO_SECTOR.to_le_bytes());
    let s = put(s, BPB_BK_BOOT_SEC, &FAT32_BACKUP_BOOT_SECTOR.to_le_bytes());
    let s = put(s, BS32_DRV_NUM, &[0x80]);  // Hard disk
    let s = put(s, BS32_BOOT_SIG, &[0x29]);  // Extended boot signature
    let s = put(s, BS32_VOL_ID, &DEFAULT_VOLUME_ID.to_le_bytes());
    let s = put(s, BS32_VOL_LAB, &DEFAULT_VOLUME_LABEL);
    let s = put(s, BS32_FIL_SYS_TYPE, &FS_TYPE);
    put(s, BOOT_SIGNATURE_OFFSET, &BOOT_SIGNATURE)
};

/// Per-volume boot sector fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat32BootSectorParams {
    pub sectors_per_cluster: u8,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    pub volume_id: u32,
    pub volume_label: [u8; VOLUME_LABEL_LEN],
}

impl Default for Fat32BootSectorParams {
    fn default() -> Self {
        Self {
            sectors_per_cluster: 0,  // Must be set
            total_sectors: 0,  // Must be set
            sectors_per_fat: 0,  // Must be set
            volume_id: DEFAULT_VOLUME_ID,
            volume_label: DEFAULT_VOLUME_LABEL,
        }
    }
}

/// Build a FAT32 boot sector
pub fn build_fat32_boot_sector(params: &Fat32BootSectorParams) -> [u8; SECTOR_SIZE] {
    let mut boot_sector = BOOT_SECTOR_TEMPLATE;

    boot_sector[BPB_SEC_PER_CLUS] = params.sectors_per_cluster;
    boot_sector[BPB_TOT_SEC32..BPB_TOT_SEC32 + 4]
        .copy_from_slice(&params.total_sectors.to_le_bytes());
    boot_sector[BPB_FAT_SZ32..BPB_FAT_SZ32 + 4]
        .copy_from_slice(&params.sectors_per_fat.to_le_bytes());
    boot_sector[BS32_VOL_ID..BS32_VOL_ID + 4]
        .copy_from_slice(&params.volume_id.to_le_bytes());
    boot_sector[BS32_VOL_LAB..BS32_VOL_LAB + VOLUME_LABEL_LEN]
        .copy_from_slice(&params.volume_label);

    boot_sector
}
