// Cluster size and FAT size calculation for FAT32

use fat32fmt_core::{ClusterSize, FormatError};
use super::constants::*;

/// Parameters calculated for a FAT32 volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat32Params {
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub sectors_per_fat: u32,
    pub cluster_count: u32,
}

impl Fat32Params {
    /// First sector of FAT number `index` (0 or 1).
    pub fn fat_start_sector(&self, index: u32) -> u64 {
        RESERVED_SECTORS as u64 + index as u64 * self.sectors_per_fat as u64
    }

    pub fn data_start_sector(&self) -> u64 {
        self.fat_start_sector(NUM_FATS)
    }
}

/// Fixed mapping from an explicit cluster size to sectors per cluster
pub fn sectors_per_cluster_for(cluster_size: ClusterSize) -> Option<u8> {
    match cluster_size {
        ClusterSize::Auto => None,
        ClusterSize::B512 => Some(1),
        ClusterSize::B1024 => Some(2),
        ClusterSize::B2048 => Some(4),
        ClusterSize::B4096 => Some(8),
        ClusterSize::B8192 => Some(16),
        ClusterSize::B16384 => Some(32),
        ClusterSize::B32768 => Some(64),
    }
}

/// Pick sectors per cluster from the volume size, smallest bucket first.
/// Every count the 32-bit total-sectors field accepts lands in a bucket.
pub fn auto_sectors_per_cluster(total_sectors: u64) -> Result<u8, FormatError> {
    match total_sectors {
        0..=66_599 => Err(FormatError::VolumeTooSmall {
            sectors: total_sectors,
            min: MIN_AUTO_SECTORS,
        }),
        66_600..=532_479 => Ok(1),                  // < 260MB
        532_480..=16_777_215 => Ok(8),              // < 8GB
        16_777_216..=33_554_431 => Ok(16),          // < 16GB
        33_554_432..=67_108_863 => Ok(32),          // < 32GB
        67_108_864..=MAX_TOTAL_SECTORS => Ok(64),   // < 2TB
        _ => Err(FormatError::VolumeTooLarge {
            sectors: total_sectors,
            max: MAX_TOTAL_SECTORS,
        }),
    }
}

/// FAT size in sectors, using the Microsoft FAT32 formula:
/// ceil((total - reserved) / floor((256 * spc + NumFATs) / 2))
pub fn fat_size_sectors(total_sectors: u32, sectors_per_cluster: u8) -> u32 {
    let usable = (total_sectors as u64).saturating_sub(RESERVED_SECTORS as u64);
    let divisor = (256 * sectors_per_cluster as u64 + NUM_FATS as u64) / 2;
    // usable < 2^32 and divisor >= 129, so the quotient fits
    ((usable + divisor - 1) / divisor) as u32
}

/// Calculate FAT32 parameters for a device of `device_sectors` sectors
pub fn calculate_fat32_params(
    device_sectors: u64,
    cluster_size: ClusterSize,
) -> Result<Fat32Params, FormatError> {
    if device_sectors > MAX_TOTAL_SECTORS {
        return Err(FormatError::VolumeTooLarge {
            sectors: device_sectors,
            max: MAX_TOTAL_SECTORS,
        });
    }

    let sectors_per_cluster = match sectors_per_cluster_for(cluster_size) {
        Some(spc) => spc,
        None => auto_sectors_per_cluster(device_sectors)?,
    };

    let total_sectors = device_sectors as u32;
    let sectors_per_fat = fat_size_sectors(total_sectors, sectors_per_cluster);

    // Reserved region, both FATs and the root cluster must fit
    let required = RESERVED_SECTORS as u64
        + NUM_FATS as u64 * sectors_per_fat as u64
        + sectors_per_cluster as u64;
    if device_sectors < required {
        return Err(FormatError::VolumeTooSmall {
            sectors: device_sectors,
            min: required,
        });
    }

    let data_sectors = device_sectors - (required - sectors_per_cluster as u64);
    let cluster_count = (data_sectors / sectors_per_cluster as u64) as u32;

    Ok(Fat32Params {
        total_sectors,
        sectors_per_cluster,
        sectors_per_fat,
        cluster_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_cluster_size_table() {
        let expected = [1u8, 2, 4, 8, 16, 32, 64];
        for (size, spc) in ClusterSize::EXPLICIT.into_iter().zip(expected) {
            assert_eq!(sectors_per_cluster_for(size), Some(spc), "{}", size);
            let params = calculate_fat32_params(1_000_000, size).unwrap();
            assert_eq!(params.sectors_per_cluster, spc);
        }
        assert_eq!(sectors_per_cluster_for(ClusterSize::Auto), None);
    }

    #[test]
    fn test_auto_lower_boundary() {
        assert!(matches!(
            calculate_fat32_params(66_599, ClusterSize::Auto),
            Err(FormatError::VolumeTooSmall { sectors: 66_599, min: 66_600 })
        ));
        assert!(matches!(
            calculate_fat32_params(0, ClusterSize::Auto),
            Err(FormatError::VolumeTooSmall { .. })
        ));

        let params = calculate_fat32_params(66_600, ClusterSize::Auto).unwrap();
        assert_eq!(params.sectors_per_cluster, 1);
        assert!(params.cluster_count >= FAT32_MIN_CLUSTERS);
    }

    #[test]
    fn test_auto_bucket_boundaries() {
        let cases = [
            (532_479, 1),
            (532_480, 8),
            (16_777_215, 8),
            (16_777_216, 16),
            (33_554_431, 16),
            (33_554_432, 32),
            (67_108_863, 32),
            (67_108_864, 64),
        ];
        for (sectors, spc) in cases {
            assert_eq!(auto_sectors_per_cluster(sectors).unwrap(), spc, "{} sectors", sectors);
        }
    }

    #[test]
    fn test_largest_volume_uses_64_sectors_per_cluster() {
        let params = calculate_fat32_params(0xFFFF_FFFE, ClusterSize::Auto).unwrap();
        assert_eq!(params.sectors_per_cluster, 64);
        assert_eq!(params.total_sectors, 0xFFFF_FFFE);
        assert_eq!(params.sectors_per_fat, fat_size_sectors(0xFFFF_FFFE, 64));
    }

    #[test]
    fn test_too_large_rejected_before_cluster_selection() {
        for sectors in [0xFFFF_FFFF, 1u64 << 33] {
            assert!(matches!(
                calculate_fat32_params(sectors, ClusterSize::Auto),
                Err(FormatError::VolumeTooLarge { max: 0xFFFF_FFFE, .. })
            ));
            assert!(matches!(
                calculate_fat32_params(sectors, ClusterSize::B4096),
                Err(FormatError::VolumeTooLarge { .. })
            ));
        }
    }

    #[test]
    fn test_fat_size_formula() {
        // usable = 999968, divisor = (2048 + 2) / 2 = 1025
        assert_eq!(fat_size_sectors(1_000_000, 8), 976);
        // usable = 66568, divisor = 129
        assert_eq!(fat_size_sectors(66_600, 1), 517);
        // Exact multiple does not round up
        assert_eq!(fat_size_sectors(32 + 1025 * 4, 8), 4);
    }

    #[test]
    fn test_fat_size_does_not_overflow_at_upper_bound() {
        // (2^32 - 2 - 32) / 8193, rounded up
        assert_eq!(fat_size_sectors(u32::MAX - 1, 64), 524_225);
        assert_eq!(fat_size_sectors(u32::MAX - 1, 1), 33_294_320);
    }

    #[test]
    fn test_explicit_size_on_tiny_device() {
        // 32 reserved + 2 FATs of 1 sector + 1 root cluster
        let params = calculate_fat32_params(35, ClusterSize::B512).unwrap();
        assert_eq!(params.sectors_per_fat, 1);
        assert_eq!(params.cluster_count, 1);

        assert!(matches!(
            calculate_fat32_params(34, ClusterSize::B512),
            Err(FormatError::VolumeTooSmall { sectors: 34, min: 35 })
        ));
        assert!(matches!(
            calculate_fat32_params(10, ClusterSize::B32768),
            Err(FormatError::VolumeTooSmall { .. })
        ));
    }

    #[test]
    fn test_layout_positions() {
        let params = calculate_fat32_params(1_000_000, ClusterSize::B4096).unwrap();
        assert_eq!(params.fat_start_sector(0), 32);
        assert_eq!(params.fat_start_sector(1), 32 + 976);
        assert_eq!(params.data_start_sector(), 32 + 2 * 976);
        assert_eq!(params.cluster_count, (1_000_000 - 32 - 2 * 976) / 8);
    }
}
