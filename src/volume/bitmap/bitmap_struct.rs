// One block's worth of allocation bits.

use crate::layout::BLOCK_SIZE;

/// A packed bit array covering one block.
///
/// Bit `k` records whether block/inode `k` is allocated. Bits are
/// LSB-first: bit `k` sits in byte `k / 8` at position `k % 8`. Bits
/// past the tracked range stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub(super) bits: [u8; BLOCK_SIZE],
}
