// Native FAT32 formatter implementation
// Builds the boot sector, FSInfo and FAT seed from fixed templates and
// writes them with a fixed, strictly sequential seek+write plan

use fat32fmt_core::{
    BlockDevice, ClusterSize, FilesystemFormatter, FormatError, FormatOptions, LogSink,
    PlannedWrite, SimulationReport,
};
use log::Level;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Mutex;
use crate::fat_common::{
    build_fat32_boot_sector, calculate_fat32_params, encode_volume_label,
    Fat32BootSectorParams, Fat32Params,
    boot_sector::{DEFAULT_VOLUME_ID, DEFAULT_VOLUME_LABEL},
    fsinfo::FAT_SEED_LEN,
    FAT_SEED, FSINFO_TEMPLATE, FAT32_BACKUP_BOOT_SECTOR, FAT32_BACKUP_FS_INFO_SECTOR,
    FAT32_FS_INFO_SECTOR, FAT32_MAX_CLUSTERS, FAT32_MIN_CLUSTERS, SECTOR_SIZE,
};

/// The three structures of a fresh volume plus the values baked into them
#[derive(Debug, Clone)]
pub struct Fat32Layout {
    pub params: Fat32Params,
    pub boot_sector: [u8; SECTOR_SIZE],
    pub fsinfo: [u8; SECTOR_SIZE],
    pub fat_seed: [u8; FAT_SEED_LEN],
}

/// One seek+write of the format sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStep<'a> {
    pub name: &'static str,
    pub offset: u64,
    pub data: &'a [u8],
}

impl Fat32Layout {
    /// Compute sizes and patch the templates for a device of
    /// `device_sectors` sectors. Pure apart from diagnostics on `sink`.
    pub fn build(
        device_sectors: u64,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<Self, FormatError> {
        if options.cluster_size == ClusterSize::Auto {
            sink.info("Autosetting cluster size");
        }

        let params = calculate_fat32_params(device_sectors, options.cluster_size)?;

        sink.info(&format!("Sectors per cluster: {}", params.sectors_per_cluster));
        sink.info(&format!("Total sectors: {}", params.total_sectors));
        sink.info(&format!("FAT32 FAT size: {} sectors", params.sectors_per_fat));
        sink.debug(&format!("Data clusters: {}", params.cluster_count));

        if params.cluster_count < FAT32_MIN_CLUSTERS {
            sink.warn(&format!(
                "Only {} clusters (FAT32 expects at least {}); some drivers may not mount it",
                params.cluster_count, FAT32_MIN_CLUSTERS
            ));
        } else if params.cluster_count > FAT32_MAX_CLUSTERS {
            sink.warn(&format!(
                "{} clusters exceeds the FAT32 maximum of {}; use a larger cluster size",
                params.cluster_count, FAT32_MAX_CLUSTERS
            ));
        }

        let volume_label = match options.label.as_deref() {
            Some(label) => {
                sink.info(&format!("Label: {}", label));
                encode_volume_label(label, sink)
            }
            None => DEFAULT_VOLUME_LABEL,
        };

        let boot_sector = build_fat32_boot_sector(&Fat32BootSectorParams {
            sectors_per_cluster: params.sectors_per_cluster,
            total_sectors: params.total_sectors,
            sectors_per_fat: params.sectors_per_fat,
            volume_id: options.volume_id.unwrap_or(DEFAULT_VOLUME_ID),
            volume_label,
        });

        Ok(Self {
            params,
            boot_sector,
            fsinfo: FSINFO_TEMPLATE,
            fat_seed: FAT_SEED,
        })
    }

    /// The fixed write plan, in the order it must be executed
    pub fn write_steps(&self) -> [WriteStep<'_>; 6] {
        let sector = SECTOR_SIZE as u64;
        [
            WriteStep { name: "primary boot sector", offset: 0, data: &self.boot_sector },
            WriteStep {
                name: "primary FSInfo",
                offset: FAT32_FS_INFO_SECTOR as u64 * sector,
                data: &self.fsinfo,
            },
            WriteStep {
                name: "backup boot sector",
                offset: FAT32_BACKUP_BOOT_SECTOR as u64 * sector,
                data: &self.boot_sector,
            },
            WriteStep {
                name: "backup FSInfo",
                offset: FAT32_BACKUP_FS_INFO_SECTOR as u64 * sector,
                data: &self.fsinfo,
            },
            WriteStep {
                name: "FAT #1",
                offset: self.params.fat_start_sector(0) * sector,
                data: &self.fat_seed,
            },
            WriteStep {
                name: "FAT #2",
                offset: self.params.fat_start_sector(1) * sector,
                data: &self.fat_seed,
            },
        ]
    }

    pub fn planned_writes(&self) -> Vec<PlannedWrite> {
        self.write_steps()
            .iter()
            .map(|step| PlannedWrite {
                step: step.name.to_string(),
                offset: step.offset,
                length: step.data.len(),
            })
            .collect()
    }
}

/// Forwards to another sink and keeps a copy of every warning
struct WarningCollector<'a> {
    inner: &'a dyn LogSink,
    warnings: Mutex<Vec<String>>,
}

impl<'a> WarningCollector<'a> {
    fn new(inner: &'a dyn LogSink) -> Self {
        Self { inner, warnings: Mutex::new(Vec::new()) }
    }

    fn into_warnings(self) -> Vec<String> {
        self.warnings.into_inner().unwrap_or_default()
    }
}

impl LogSink for WarningCollector<'_> {
    fn emit(&self, level: Level, message: &str) {
        if level == Level::Warn {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(message.to_string());
            }
        }
        self.inner.emit(level, message);
    }
}

pub struct Fat32Formatter;

impl Fat32Formatter {
    fn prepare(
        device: &mut dyn BlockDevice,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<Fat32Layout, FormatError> {
        let device_sectors = device.size_in_sectors().map_err(FormatError::DeviceQueryFailed)?;
        sink.info(&format!("Device size: {} sectors", device_sectors));
        Fat32Layout::build(device_sectors, options, sink)
    }

    /// Execute the write plan. Stops at the first failed step; nothing
    /// already written is rolled back.
    pub fn write_layout(
        device: &mut dyn BlockDevice,
        layout: &Fat32Layout,
        sink: &dyn LogSink,
    ) -> Result<(), FormatError> {
        for step in layout.write_steps() {
            let failed = |source| FormatError::WriteFailed {
                step: step.name,
                offset: step.offset,
                source,
            };

            let position = device.seek(SeekFrom::Start(step.offset)).map_err(failed)?;
            if position != step.offset {
                return Err(failed(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("seek landed at {}", position),
                )));
            }
            device.write_all(step.data).map_err(failed)?;

            sink.debug(&format!(
                "Wrote {} at offset {} ({} bytes)",
                step.name,
                step.offset,
                step.data.len()
            ));
        }
        Ok(())
    }

    /// Read every written region back and compare it with the layout
    pub fn verify(device: &mut dyn BlockDevice, layout: &Fat32Layout) -> Result<(), FormatError> {
        for step in layout.write_steps() {
            let failed = |source| FormatError::ReadFailed { offset: step.offset, source };

            let mut on_disk = vec![0u8; step.data.len()];
            device.seek(SeekFrom::Start(step.offset)).map_err(failed)?;
            device.read_exact(&mut on_disk).map_err(failed)?;

            if on_disk != step.data {
                return Err(FormatError::VerificationFailed {
                    step: step.name,
                    offset: step.offset,
                });
            }
        }
        Ok(())
    }
}

impl FilesystemFormatter for Fat32Formatter {
    fn name(&self) -> &'static str {
        "fat32"
    }

    fn dry_run(
        &self,
        device: &mut dyn BlockDevice,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<SimulationReport, FormatError> {
        let collector = WarningCollector::new(sink);
        let layout = Self::prepare(device, options, &collector)?;
        let params = &layout.params;

        Ok(SimulationReport {
            filesystem: self.name().to_string(),
            options: options.clone(),
            total_sectors: params.total_sectors as u64,
            sectors_per_cluster: params.sectors_per_cluster,
            fat_size_sectors: params.sectors_per_fat,
            cluster_count: params.cluster_count,
            writes: layout.planned_writes(),
            warnings: collector.into_warnings(),
            will_erase_data: true,
            space_after_format: params.cluster_count as u64
                * params.sectors_per_cluster as u64
                * SECTOR_SIZE as u64,
        })
    }

    fn format(
        &self,
        device: &mut dyn BlockDevice,
        options: &FormatOptions,
        sink: &dyn LogSink,
    ) -> Result<(), FormatError> {
        let layout = Self::prepare(device, options, sink)?;

        Self::write_layout(device, &layout, sink)?;

        // Not complete until the data is on stable storage
        device.sync().map_err(FormatError::FlushFailed)?;
        sink.debug("Flushed all pending writes");

        if options.verify_after_format {
            Self::verify(device, &layout)?;
            sink.info("Verified all written structures");
        }

        sink.info("FAT32 format completed successfully");
        Ok(())
    }
}
