// Logical-to-physical block mapping: 12 direct slots plus one
// single-indirect block.

use log::debug;

use crate::error_types::filesystem::FsError;
use crate::inode::inode_struct::Inode;
use crate::layout::{BLOCK_SIZE, INDIRECT_SLOT, MAX_FILE_BLOCKS};
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Where logical block `index` of this inode lives. Zero means a
    /// hole: nothing is mapped there.
    pub fn map_block(&mut self, inode: &Inode, index: u32) -> Result<u32, FsError> {
        go_map_block(self, inode, index)
    }

    /// Point logical block `index` at `block_no`, materialising the
    /// indirect block if this is the first pointer to need it.
    ///
    /// Mutates the in-memory record only; the caller persists the
    /// inode once its whole operation is done. If the indirect block
    /// cannot be allocated the set fails and no state changes.
    ///
    /// Writing zero tombstones the slot but never frees the indirect
    /// block; truncation is the only place that reclaims it.
    pub fn set_map_block(
        &mut self,
        inode: &mut Inode,
        index: u32,
        block_no: u32,
    ) -> Result<(), FsError> {
        go_set_map_block(self, inode, index, block_no)
    }
}

fn go_map_block(volume: &mut Volume, inode: &Inode, index: u32) -> Result<u32, FsError> {
    if index < INDIRECT_SLOT as u32 {
        return Ok(inode.block[index as usize]);
    }

    if index >= MAX_FILE_BLOCKS {
        return Err(FsError::FileTooBig);
    }

    let indirect = inode.block[INDIRECT_SLOT];
    if indirect == 0 {
        // No indirect block yet, so everything it would map is a hole.
        return Ok(0);
    }

    let block = volume.image.read_block(indirect)?;
    let slot = (index as usize - INDIRECT_SLOT) * 4;
    Ok(u32::from_le_bytes(
        block[slot..slot + 4].try_into().expect("4 = 4"),
    ))
}

fn go_set_map_block(
    volume: &mut Volume,
    inode: &mut Inode,
    index: u32,
    block_no: u32,
) -> Result<(), FsError> {
    if index < INDIRECT_SLOT as u32 {
        inode.block[index as usize] = block_no;
        return Ok(());
    }

    if index >= MAX_FILE_BLOCKS {
        return Err(FsError::FileTooBig);
    }

    let mut fresh_indirect = false;
    if inode.block[INDIRECT_SLOT] == 0 {
        let indirect = volume.allocate_block()?;
        // The allocator hands out dirty blocks; an indirect block
        // must start as all holes.
        if let Err(error) = volume.image.write_block(indirect, &[0u8; BLOCK_SIZE]) {
            let _ = volume.free_block(indirect);
            return Err(error.into());
        }
        inode.block[INDIRECT_SLOT] = indirect;
        fresh_indirect = true;
        debug!("Materialised indirect block {indirect}.");
    }

    let indirect = inode.block[INDIRECT_SLOT];
    let patch = |volume: &mut Volume| -> Result<(), FsError> {
        let mut block = volume.image.read_block(indirect)?;
        let slot = (index as usize - INDIRECT_SLOT) * 4;
        block[slot..slot + 4].copy_from_slice(&block_no.to_le_bytes());
        volume.image.write_block(indirect, &block)?;
        Ok(())
    };

    if let Err(error) = patch(volume) {
        // Unwind a just-born indirect block so the failed set leaves
        // nothing behind.
        if fresh_indirect {
            let _ = volume.free_block(indirect);
            inode.block[INDIRECT_SLOT] = 0;
        }
        return Err(error);
    }

    Ok(())
}
