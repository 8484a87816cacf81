pub mod device;
pub mod error;
pub mod filesystem;
pub mod log_sink;
pub mod test_utils;

pub use device::{BlockDevice, RawDevice, SECTOR_SIZE};
pub use error::FormatError;
pub use filesystem::{
    ClusterSize, FilesystemFormatter, FormatOptions, PlannedWrite, SimulationReport,
};
pub use log_sink::{ChannelSink, LogFacadeSink, LogLine, LogSink, MemorySink};
