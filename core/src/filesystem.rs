use crate::{BlockDevice, FormatError, LogSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested bytes per cluster, or `Auto` to size by volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterSize {
    #[default]
    Auto,
    #[serde(rename = "512")]
    B512,
    #[serde(rename = "1024")]
    B1024,
    #[serde(rename = "2048")]
    B2048,
    #[serde(rename = "4096")]
    B4096,
    #[serde(rename = "8192")]
    B8192,
    #[serde(rename = "16384")]
    B16384,
    #[serde(rename = "32768")]
    B32768,
}

impl ClusterSize {
    pub const EXPLICIT: [ClusterSize; 7] = [
        ClusterSize::B512,
        ClusterSize::B1024,
        ClusterSize::B2048,
        ClusterSize::B4096,
        ClusterSize::B8192,
        ClusterSize::B16384,
        ClusterSize::B32768,
    ];

    /// Bytes per cluster, `None` for `Auto`.
    pub fn bytes(self) -> Option<u32> {
        match self {
            ClusterSize::Auto => None,
            ClusterSize::B512 => Some(512),
            ClusterSize::B1024 => Some(1024),
            ClusterSize::B2048 => Some(2048),
            ClusterSize::B4096 => Some(4096),
            ClusterSize::B8192 => Some(8192),
            ClusterSize::B16384 => Some(16384),
            ClusterSize::B32768 => Some(32768),
        }
    }

    pub fn from_bytes(bytes: u32) -> Option<Self> {
        Self::EXPLICIT.into_iter().find(|size| size.bytes() == Some(bytes))
    }
}

impl fmt::Display for ClusterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes() {
            Some(bytes) => write!(f, "{}", bytes),
            None => write!(f, "auto"),
        }
    }
}

impl FromStr for ClusterSize {
    type Err = FormatError;

    /// Accepts `auto`, a byte count (`4096`) or a K-suffixed count (`4K`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ClusterSize::Auto);
        }

        let (digits, multiplier) = match s.strip_suffix(|c: char| c == 'K' || c == 'k') {
            Some(rest) => (rest, 1024),
            None => (s, 1),
        };

        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .and_then(Self::from_bytes)
            .ok_or_else(|| FormatError::InvalidClusterSize(format!(
                "'{}' (expected auto, 512, 1K, 2K, 4K, 8K, 16K or 32K)",
                s
            )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub label: Option<String>,
    pub cluster_size: ClusterSize,
    pub volume_id: Option<u32>,
    pub verify_after_format: bool,
}

/// One planned seek+write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedWrite {
    pub step: String,
    pub offset: u64,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub filesystem: String,
    pub options: FormatOptions,
    pub total_sectors: u64,
    pub sectors_per_cluster: u8,
    pub fat_size_sectors: u32,
    pub cluster_count: u32,
    pub writes: Vec<PlannedWrite>,
    pub warnings: Vec<String>,
    pub will_erase_data: bool,
    pub space_after_format: u64,
}

pub trait FilesystemFormatter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compute everything `format` would write, without writing.
    fn dry_run(
        &self,
        device: &mut dyn BlockDevice,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<SimulationReport, FormatError>;

    fn format(
        &self,
        device: &mut dyn BlockDevice,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<(), FormatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_size_parsing() {
        assert_eq!("auto".parse::<ClusterSize>().unwrap(), ClusterSize::Auto);
        assert_eq!("AUTO".parse::<ClusterSize>().unwrap(), ClusterSize::Auto);
        assert_eq!("4096".parse::<ClusterSize>().unwrap(), ClusterSize::B4096);
        assert_eq!("32K".parse::<ClusterSize>().unwrap(), ClusterSize::B32768);
        assert_eq!("1k".parse::<ClusterSize>().unwrap(), ClusterSize::B1024);
    }

    #[test]
    fn test_cluster_size_rejects_unsupported() {
        for bad in ["0", "3000", "64K", "65536", "big", ""] {
            assert!(
                matches!(bad.parse::<ClusterSize>(), Err(FormatError::InvalidClusterSize(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_cluster_size_display_round_trips() {
        for size in ClusterSize::EXPLICIT {
            assert_eq!(size.to_string().parse::<ClusterSize>().unwrap(), size);
        }
        assert_eq!(ClusterSize::Auto.to_string(), "auto");
    }

    #[test]
    fn test_format_options_from_partial_json() {
        let options: FormatOptions =
            serde_json::from_str(r#"{"label": "DATA", "cluster_size": "4096"}"#).unwrap();
        assert_eq!(options.label.as_deref(), Some("DATA"));
        assert_eq!(options.cluster_size, ClusterSize::B4096);
        assert_eq!(options.volume_id, None);
        assert!(!options.verify_after_format);

        let defaults: FormatOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, FormatOptions::default());
    }
}
