use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to open device {path}: {source}")]
    DeviceOpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to query device size: {0}")]
    DeviceQueryFailed(#[source] std::io::Error),

    #[error("Volume too large for FAT32: {sectors} sectors (max {max})")]
    VolumeTooLarge { sectors: u64, max: u64 },

    #[error("Volume too small for FAT32: {sectors} sectors (need at least {min})")]
    VolumeTooSmall { sectors: u64, min: u64 },

    #[error("Write of {step} at offset {offset} failed: {source}")]
    WriteFailed {
        step: &'static str,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flush device: {0}")]
    FlushFailed(#[source] std::io::Error),

    #[error("Read at offset {offset} failed: {source}")]
    ReadFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Verification of {step} at offset {offset} failed: on-disk bytes differ")]
    VerificationFailed { step: &'static str, offset: u64 },

    #[error("Not a FAT32 volume: {0}")]
    NotFat32(String),

    #[error("Invalid cluster size: {0}")]
    InvalidClusterSize(String),
}

impl FormatError {
    /// True when the device was left untouched by the failed call.
    pub fn is_side_effect_free(&self) -> bool {
        !matches!(
            self,
            FormatError::WriteFailed { .. }
                | FormatError::FlushFailed(_)
                | FormatError::VerificationFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_validation_errors_are_side_effect_free() {
        assert!(FormatError::VolumeTooSmall { sectors: 10, min: 66_600 }.is_side_effect_free());
        assert!(FormatError::VolumeTooLarge {
            sectors: u64::MAX,
            max: 0xFFFF_FFFE
        }
        .is_side_effect_free());
        let query = io::Error::new(io::ErrorKind::Other, "ioctl");
        assert!(FormatError::DeviceQueryFailed(query).is_side_effect_free());
    }

    #[test]
    fn test_io_errors_are_not_side_effect_free() {
        let err = FormatError::WriteFailed {
            step: "FAT #1",
            offset: 16384,
            source: io::Error::from(io::ErrorKind::WriteZero),
        };
        assert!(!err.is_side_effect_free());
        assert!(err.to_string().contains("offset 16384"));
        let flush = io::Error::from(io::ErrorKind::Other);
        assert!(!FormatError::FlushFailed(flush).is_side_effect_free());
    }
}
