/// Test utilities and mock implementations for safe testing
use crate::BlockDevice;
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// In-memory block device for testing - NEVER touches real hardware.
///
/// Storage is sparse: only written bytes are kept, everything else reads
/// back as zero, so multi-terabyte sizes cost nothing.
#[derive(Debug, Default)]
pub struct MockDevice {
    size_sectors: u64,
    fail_size_query: bool,
    short_write_at: Option<usize>,
    lose_write_at: Option<usize>,
    fail_sync: bool,
    position: u64,
    data: HashMap<u64, u8>,
    writes: Vec<(u64, Vec<u8>)>,
    write_calls: usize,
    sync_count: usize,
}

impl MockDevice {
    pub fn new(size_sectors: u64) -> Self {
        Self {
            size_sectors,
            ..Default::default()
        }
    }

    /// Size queries fail, like an ioctl on a vanished device.
    pub fn with_failing_size_query() -> Self {
        Self {
            fail_size_query: true,
            ..Default::default()
        }
    }

    /// The write call with this zero-based index writes nothing.
    pub fn with_short_write_at(mut self, call: usize) -> Self {
        self.short_write_at = Some(call);
        self
    }

    /// The write call with this zero-based index reports success but its
    /// bytes never reach the medium.
    pub fn with_lost_write_at(mut self, call: usize) -> Self {
        self.lose_write_at = Some(call);
        self
    }

    pub fn with_failing_sync(mut self) -> Self {
        self.fail_sync = true;
        self
    }

    /// Every successful write as (offset, bytes), in order.
    pub fn writes(&self) -> &[(u64, Vec<u8>)] {
        &self.writes
    }

    pub fn write_offsets(&self) -> Vec<u64> {
        self.writes.iter().map(|(offset, _)| *offset).collect()
    }

    pub fn sync_count(&self) -> usize {
        self.sync_count
    }

    pub fn was_synced(&self) -> bool {
        self.sync_count > 0
    }

    /// Current contents of `len` bytes at `offset`.
    pub fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|i| self.data.get(&(offset + i)).copied().unwrap_or(0))
            .collect()
    }
}

impl BlockDevice for MockDevice {
    fn size_in_sectors(&mut self) -> io::Result<u64> {
        if self.fail_size_query {
            return Err(io::Error::new(io::ErrorKind::Other, "mock size query failure"));
        }
        Ok(self.size_sectors)
    }

    fn sync(&mut self) -> io::Result<()> {
        if self.fail_sync {
            return Err(io::Error::new(io::ErrorKind::Other, "mock sync failure"));
        }
        self.sync_count += 1;
        Ok(())
    }
}

impl Write for MockDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let call = self.write_calls;
        self.write_calls += 1;

        if self.short_write_at == Some(call) {
            return Ok(0);
        }

        if self.lose_write_at != Some(call) {
            for (i, byte) in buf.iter().enumerate() {
                self.data.insert(self.position + i as u64, *byte);
            }
        }
        self.writes.push((self.position, buf.to_vec()));
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for MockDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.read_at(self.position, buf.len());
        buf.copy_from_slice(&bytes);
        self.position += buf.len() as u64;
        Ok(buf.len())
    }
}

impl Seek for MockDevice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let end = self.size_sectors * crate::SECTOR_SIZE;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => end.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };

        match target {
            Some(offset) => {
                self.position = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of device")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_is_sparse() {
        let mut device = MockDevice::new(u32::MAX as u64);
        device.seek(SeekFrom::Start(1 << 40)).unwrap();
        device.write_all(b"FAT32").unwrap();

        assert_eq!(device.read_at(1 << 40, 5), b"FAT32");
        assert_eq!(device.read_at(0, 4), vec![0; 4]);
        assert_eq!(device.write_offsets(), vec![1 << 40]);
    }

    #[test]
    fn test_short_write_surfaces_as_write_zero() {
        let mut device = MockDevice::new(100).with_short_write_at(1);
        device.write_all(&[1; 8]).unwrap();

        let err = device.write_all(&[2; 8]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(device.writes().len(), 1);
    }

    #[test]
    fn test_lost_write_is_recorded_but_not_stored() {
        let mut device = MockDevice::new(100).with_lost_write_at(0);
        device.write_all(&[7; 4]).unwrap();

        assert_eq!(device.writes().len(), 1);
        assert_eq!(device.read_at(0, 4), vec![0; 4]);
    }

    #[test]
    fn test_size_query_and_sync_failures() {
        let mut device = MockDevice::with_failing_size_query();
        assert!(device.size_in_sectors().is_err());

        let mut device = MockDevice::new(8).with_failing_sync();
        assert!(device.sync().is_err());
        assert!(!device.was_synced());
    }
}
