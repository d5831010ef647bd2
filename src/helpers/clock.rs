// One clock to rule them all.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, truncated to the 32 bits the on-disk
/// records can hold. A clock set before 1970 reads as zero.
pub(crate) fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}
