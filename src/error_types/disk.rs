// Error types pertaining to the block device itself.

use thiserror::Error;

/// Faults raised by the block device layer.
///
/// Anything above the device sees these wrapped inside `FsError`.
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("block {0} is outside the volume")]
    OutOfRange(u32),
    #[error("disk image I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
