// Find, reserve, or even free blocks! And inodes.

// Both allocators are first-fit, lowest index first. Test suites
// depend on this determinism, so don't get clever.

use log::debug;

use crate::error_types::filesystem::FsError;
use crate::layout::{FIRST_DATA_BLOCK, MAX_BLOCKS, MAX_INODES};
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Claim the lowest free data block.
    ///
    /// The block is NOT zeroed. Callers that need a clean block must
    /// write one themselves.
    pub fn allocate_block(&mut self) -> Result<u32, FsError> {
        go_allocate_block(self)
    }

    /// Release a data block. Freeing a block that is already free is
    /// a successful no-op, so an unwind path can free without
    /// checking what already happened.
    pub fn free_block(&mut self, block_no: u32) -> Result<(), FsError> {
        go_free_block(self, block_no)
    }

    /// Claim the lowest free inode number, scanning from inode 1.
    /// Inode 0 is the reserved null inode and is never returned.
    pub fn allocate_inode(&mut self) -> Result<u32, FsError> {
        go_allocate_inode(self)
    }

    /// Release an inode number. Idempotent, like `free_block`.
    pub fn free_inode(&mut self, inode_no: u32) -> Result<(), FsError> {
        go_free_inode(self, inode_no)
    }
}

fn go_allocate_block(volume: &mut Volume) -> Result<u32, FsError> {
    let block_no = volume
        .block_bitmap
        .first_zero(FIRST_DATA_BLOCK, MAX_BLOCKS)
        .ok_or(FsError::NoSpace)?;

    volume.block_bitmap.set(block_no);
    volume.superblock.free_blocks_count -= 1;
    volume.persist_block_bitmap()?;
    volume.persist_superblock()?;
    debug!("Allocated block {block_no}.");
    Ok(block_no)
}

fn go_free_block(volume: &mut Volume, block_no: u32) -> Result<(), FsError> {
    // The metadata region is never up for grabs.
    if !(FIRST_DATA_BLOCK..MAX_BLOCKS).contains(&block_no) {
        return Err(FsError::InvalidArgument);
    }

    if !volume.block_bitmap.is_set(block_no) {
        debug!("Block {block_no} is already free, nothing to do.");
        return Ok(());
    }

    volume.block_bitmap.clear(block_no);
    volume.superblock.free_blocks_count += 1;
    volume.persist_block_bitmap()?;
    volume.persist_superblock()?;
    debug!("Freed block {block_no}.");
    Ok(())
}

fn go_allocate_inode(volume: &mut Volume) -> Result<u32, FsError> {
    let inode_no = volume
        .inode_bitmap
        .first_zero(1, MAX_INODES)
        .ok_or(FsError::NoSpace)?;

    volume.inode_bitmap.set(inode_no);
    volume.superblock.free_inodes_count -= 1;
    volume.persist_inode_bitmap()?;
    volume.persist_superblock()?;
    debug!("Allocated inode {inode_no}.");
    Ok(inode_no)
}

fn go_free_inode(volume: &mut Volume, inode_no: u32) -> Result<(), FsError> {
    if !(1..MAX_INODES).contains(&inode_no) {
        return Err(FsError::InvalidArgument);
    }

    if !volume.inode_bitmap.is_set(inode_no) {
        debug!("Inode {inode_no} is already free, nothing to do.");
        return Ok(());
    }

    volume.inode_bitmap.clear(inode_no);
    volume.superblock.free_inodes_count += 1;
    volume.persist_inode_bitmap()?;
    volume.persist_superblock()?;
    debug!("Freed inode {inode_no}.");
    Ok(())
}
