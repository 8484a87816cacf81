// FAT32 volume inspection - decode what a format left on disk

use byteorder::{ByteOrder, LittleEndian};
use fat32fmt_core::{BlockDevice, FormatError};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom};
use crate::fat_common::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fat32BootInfo {
    pub oem_name: String,
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub media: u8,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    pub root_cluster: u32,
    pub fs_info_sector: u16,
    pub backup_boot_sector: u16,
    pub volume_id: u32,
    pub label: Option<String>,
    pub fs_type: String,
}

impl Fat32BootInfo {
    pub fn parse(sector: &[u8]) -> Result<Self, FormatError> {
        if !is_fat32_boot_sector(sector) {
            return Err(FormatError::NotFat32(
                "missing FAT32 signature in boot sector".to_string(),
            ));
        }

        let bytes_per_sector = LittleEndian::read_u16(&sector[BPB_BYTES_PER_SEC..]);
        if !matches!(bytes_per_sector, 512 | 1024 | 2048 | 4096) {
            return Err(FormatError::NotFat32(format!(
                "invalid bytes per sector: {}",
                bytes_per_sector
            )));
        }

        let sectors_per_cluster = sector[BPB_SEC_PER_CLUS];
        if !sectors_per_cluster.is_power_of_two() {
            return Err(FormatError::NotFat32(format!(
                "invalid sectors per cluster: {}",
                sectors_per_cluster
            )));
        }

        Ok(Self {
            oem_name: String::from_utf8_lossy(&sector[BS_OEM_NAME..BS_OEM_NAME + 8])
                .trim_end_matches(|c: char| c == '\0' || c == ' ')
                .to_string(),
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors: LittleEndian::read_u16(&sector[BPB_RSVD_SEC_CNT..]),
            num_fats: sector[BPB_NUM_FATS],
            media: sector[BPB_MEDIA],
            total_sectors: LittleEndian::read_u32(&sector[BPB_TOT_SEC32..]),
            sectors_per_fat: LittleEndian::read_u32(&sector[BPB_FAT_SZ32..]),
            root_cluster: LittleEndian::read_u32(&sector[BPB_ROOT_CLUS..]),
            fs_info_sector: LittleEndian::read_u16(&sector[BPB_FS_INFO..]),
            backup_boot_sector: LittleEndian::read_u16(&sector[BPB_BK_BOOT_SEC..]),
            volume_id: LittleEndian::read_u32(&sector[BS32_VOL_ID..]),
            label: decode_volume_label(&sector[BS32_VOL_LAB..BS32_VOL_LAB + VOLUME_LABEL_LEN]),
            fs_type: String::from_utf8_lossy(
                &sector[BS32_FIL_SYS_TYPE..BS32_FIL_SYS_TYPE + FS_TYPE_LEN],
            )
            .trim_end()
            .to_string(),
        })
    }

    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }
}

/// FAT32 signature is at offset 82: "FAT32", plus the 0x55AA trailer
pub fn is_fat32_boot_sector(sector: &[u8]) -> bool {
    sector.len() >= SECTOR_SIZE
        && &sector[BS32_FIL_SYS_TYPE..BS32_FIL_SYS_TYPE + 5] == b"FAT32"
        && sector[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2] == BOOT_SIGNATURE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsInfoSummary {
    /// `None` when the sector says "unknown"
    pub free_clusters: Option<u32>,
    pub next_free_cluster: Option<u32>,
}

impl FsInfoSummary {
    pub fn parse(sector: &[u8]) -> Result<Self, FormatError> {
        if sector.len() < SECTOR_SIZE
            || sector[FSI_LEAD_SIG..FSI_LEAD_SIG + 4] != FSI_LEAD_SIGNATURE
            || sector[FSI_STRUC_SIG..FSI_STRUC_SIG + 4] != FSI_STRUC_SIGNATURE
        {
            return Err(FormatError::NotFat32("invalid FSInfo signatures".to_string()));
        }

        let known = |value: u32| (value != FSI_UNKNOWN).then_some(value);
        Ok(Self {
            free_clusters: known(LittleEndian::read_u32(&sector[FSI_FREE_COUNT..])),
            next_free_cluster: known(LittleEndian::read_u32(&sector[FSI_NXT_FREE..])),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fat32VolumeInfo {
    pub boot: Fat32BootInfo,
    pub fs_info: FsInfoSummary,
    pub backup_boot_matches: bool,
    pub media_entry_matches: bool,
}

fn read_at(device: &mut dyn BlockDevice, offset: u64, len: usize) -> Result<Vec<u8>, FormatError> {
    let failed = |source| FormatError::ReadFailed { offset, source };
    let mut buffer = vec![0u8; len];
    device.seek(SeekFrom::Start(offset)).map_err(failed)?;
    device.read_exact(&mut buffer).map_err(failed)?;
    Ok(buffer)
}

/// Read the boot sector, FSInfo, backup boot sector and first FAT entry
pub fn inspect_volume(device: &mut dyn BlockDevice) -> Result<Fat32VolumeInfo, FormatError> {
    let primary = read_at(device, 0, SECTOR_SIZE)?;
    let boot = Fat32BootInfo::parse(&primary)?;
    let bps = boot.bytes_per_sector as u64;

    let fs_info_sector = read_at(device, boot.fs_info_sector as u64 * bps, SECTOR_SIZE)?;
    let fs_info = FsInfoSummary::parse(&fs_info_sector)?;

    let backup = read_at(device, boot.backup_boot_sector as u64 * bps, SECTOR_SIZE)?;
    let first_entry = read_at(device, boot.reserved_sectors as u64 * bps, FAT32_ENTRY_SIZE)?;

    Ok(Fat32VolumeInfo {
        backup_boot_matches: backup == primary,
        media_entry_matches: first_entry[0] == boot.media,
        boot,
        fs_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sector() -> [u8; SECTOR_SIZE] {
        build_fat32_boot_sector(&Fat32BootSectorParams {
            sectors_per_cluster: 8,
            total_sectors: 1_000_000,
            sectors_per_fat: 976,
            volume_label: *b"DATA\0\0\0\0\0\0\0",
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_boot_sector() {
        let info = Fat32BootInfo::parse(&sample_sector()).unwrap();
        assert_eq!(info.oem_name, "RUFUSL");
        assert_eq!(info.bytes_per_sector, 512);
        assert_eq!(info.sectors_per_cluster, 8);
        assert_eq!(info.reserved_sectors, 32);
        assert_eq!(info.num_fats, 2);
        assert_eq!(info.media, 0xF8);
        assert_eq!(info.total_sectors, 1_000_000);
        assert_eq!(info.sectors_per_fat, 976);
        assert_eq!(info.root_cluster, 2);
        assert_eq!(info.fs_info_sector, 1);
        assert_eq!(info.backup_boot_sector, 6);
        assert_eq!(info.volume_id, 0xCAFEBABE);
        assert_eq!(info.label.as_deref(), Some("DATA"));
        assert_eq!(info.fs_type, "FAT32");
        assert_eq!(info.cluster_size(), 4096);
    }

    #[test]
    fn test_rejects_non_fat32() {
        let mut sector = sample_sector();
        sector[BS32_FIL_SYS_TYPE..BS32_FIL_SYS_TYPE + 8].copy_from_slice(b"FAT16   ");
        assert!(matches!(Fat32BootInfo::parse(&sector), Err(FormatError::NotFat32(_))));

        let mut sector = sample_sector();
        sector[511] = 0;
        assert!(!is_fat32_boot_sector(&sector));

        assert!(!is_fat32_boot_sector(&[0u8; 100]));
    }

    #[test]
    fn test_rejects_zero_sectors_per_cluster() {
        assert!(Fat32BootInfo::parse(&BOOT_SECTOR_TEMPLATE).is_err());
    }

    #[test]
    fn test_fsinfo_unknown_counts() {
        let summary = FsInfoSummary::parse(&FSINFO_TEMPLATE).unwrap();
        assert_eq!(summary.free_clusters, None);
        assert_eq!(summary.next_free_cluster, None);

        let mut sector = FSINFO_TEMPLATE;
        sector[FSI_FREE_COUNT..FSI_FREE_COUNT + 4].copy_from_slice(&1234u32.to_le_bytes());
        assert_eq!(FsInfoSummary::parse(&sector).unwrap().free_clusters, Some(1234));

        assert!(FsInfoSummary::parse(&[0u8; SECTOR_SIZE]).is_err());
    }
}
