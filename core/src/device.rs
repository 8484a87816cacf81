// Block device access used by the formatters
// The formatter only needs seek + write-exact + sync, plus a size query

use crate::FormatError;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Logical sector size assumed for every size query and on-disk offset.
pub const SECTOR_SIZE: u64 = 512;

/// An already-open, writable block device (or image file).
pub trait BlockDevice: Read + Write + Seek {
    /// Total size of the device in 512-byte sectors.
    fn size_in_sectors(&mut self) -> io::Result<u64>;

    /// Force every pending write to stable storage.
    fn sync(&mut self) -> io::Result<()>;
}

#[cfg(target_os = "linux")]
mod linux {
    // BLKGETSIZE64 = _IOR(0x12, 114, size_t), returns the size in bytes
    nix::ioctl_read!(blk_get_size64, 0x12, 114, u64);
}

/// A raw device or disk image opened through the filesystem.
#[derive(Debug)]
pub struct RawDevice {
    file: File,
    path: PathBuf,
}

impl RawDevice {
    /// Open a device for writing (formatting)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        log::info!("Opening device for writing: {}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                log::error!(
                    "Failed to open device {}: {} (OS error code: {:?})",
                    path.display(),
                    e,
                    e.raw_os_error()
                );
                FormatError::DeviceOpenFailed {
                    path: path.display().to_string(),
                    source: e,
                }
            })?;

        Ok(Self::from_file(file, path))
    }

    /// Open a device read-only, for inspection
    pub fn open_read(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        log::info!("Opening device for reading: {}", path.display());

        let file = File::open(path).map_err(|e| FormatError::DeviceOpenFailed {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self::from_file(file, path))
    }

    pub fn from_file(file: File, path: impl Into<PathBuf>) -> Self {
        Self { file, path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn size_in_bytes(&mut self) -> io::Result<u64> {
        let metadata = self.file.metadata()?;
        if metadata.is_file() {
            return Ok(metadata.len());
        }

        #[cfg(target_os = "linux")]
        {
            use std::os::unix::fs::FileTypeExt;
            use std::os::unix::io::AsRawFd;

            if metadata.file_type().is_block_device() {
                let mut bytes: u64 = 0;
                // SAFETY: the fd is open for the lifetime of `self.file` and
                // `bytes` is a valid, writable u64.
                unsafe { linux::blk_get_size64(self.file.as_raw_fd(), &mut bytes) }
                    .map_err(io::Error::from)?;
                return Ok(bytes);
            }
        }

        // Character devices and other platforms: size is the end offset
        let end = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(end)
    }
}

impl BlockDevice for RawDevice {
    fn size_in_sectors(&mut self) -> io::Result<u64> {
        let bytes = self.size_in_bytes()?;
        log::debug!("Device {} reports {} bytes", self.path.display(), bytes);
        Ok(bytes / SECTOR_SIZE)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

impl Read for RawDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for RawDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for RawDevice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_image_size_is_reported_in_sectors() {
        let temp_file = NamedTempFile::new().unwrap();
        temp_file.as_file().set_len(100 * SECTOR_SIZE + 17).unwrap();

        let mut device = RawDevice::open(temp_file.path()).unwrap();
        assert_eq!(device.size_in_sectors().unwrap(), 100);
    }

    #[test]
    fn test_open_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-device");

        match RawDevice::open(&missing) {
            Err(FormatError::DeviceOpenFailed { path, .. }) => {
                assert!(path.ends_with("no-such-device"));
            }
            other => panic!("expected DeviceOpenFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_writes_land_at_seek_offset() {
        let temp_file = NamedTempFile::new().unwrap();
        temp_file.as_file().set_len(4 * SECTOR_SIZE).unwrap();

        let mut device = RawDevice::open(temp_file.path()).unwrap();
        device.seek(SeekFrom::Start(SECTOR_SIZE)).unwrap();
        device.write_all(&[0xAB; 4]).unwrap();
        device.sync().unwrap();

        let contents = std::fs::read(temp_file.path()).unwrap();
        assert_eq!(&contents[512..516], &[0xAB; 4]);
        assert_eq!(contents[511], 0);
    }
}
