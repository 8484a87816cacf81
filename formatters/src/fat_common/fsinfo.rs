// FSInfo sector and the FAT seed entries

use super::boot_sector::put;
use super::constants::*;
use static_assertions::const_assert_eq;

const_assert_eq!(FSI_TRAIL_SIG + 4, SECTOR_SIZE);

/// FSInfo sector with free count and next-free left as "unknown". The
/// first mount repairs them.
pub const FSINFO_TEMPLATE: [u8; SECTOR_SIZE] = {
    let s = [0u8; SECTOR_SIZE];
    let s = put(s, FSI_LEAD_SIG, &FSI_LEAD_SIGNATURE);
    let s = put(s, FSI_STRUC_SIG, &FSI_STRUC_SIGNATURE);
    let s = put(s, FSI_FREE_COUNT, &FSI_UNKNOWN.to_le_bytes());
    let s = put(s, FSI_NXT_FREE, &FSI_UNKNOWN.to_le_bytes());
    put(s, FSI_TRAIL_SIG, &FSI_TRAIL_SIGNATURE)
};

pub const FAT_SEED_LEN: usize = FAT_SEED_ENTRIES * FAT32_ENTRY_SIZE;

/// First three FAT entries: media marker, reserved EOC, and the EOC that
/// terminates the (empty) root directory chain.
pub const FAT_SEED: [u8; FAT_SEED_LEN] = {
    let media = (0x0FFFFF00 | MEDIA_FIXED as u32).to_le_bytes();
    let eoc = FAT32_EOC.to_le_bytes();
    [
        media[0], media[1], media[2], media[3],
        eoc[0], eoc[1], eoc[2], eoc[3],
        eoc[0], eoc[1], eoc[2], eoc[3],
    ]
};
