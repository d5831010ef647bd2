// Reading and writing inode records, and their birth and death.

use log::{debug, warn};

use crate::error_types::filesystem::FsError;
use crate::inode::inode_struct::Inode;
use crate::layout::{
    BLOCK_SIZE, BLOCK_SLOTS, INDIRECT_SLOT, INODE_SIZE, INODE_TABLE_START, MAX_INODES,
    POINTERS_PER_BLOCK,
};
use crate::volume::volume_struct::Volume;

impl Inode {
    /// Serialize at the classic ext2 record offsets, little-endian.
    /// The unused tail of the 128 bytes stays zero.
    pub fn to_bytes(&self) -> [u8; INODE_SIZE] {
        let mut buffer: [u8; INODE_SIZE] = [0u8; INODE_SIZE];

        buffer[0..2].copy_from_slice(&self.mode.to_le_bytes());
        buffer[2..4].copy_from_slice(&self.uid.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.size.to_le_bytes());
        buffer[8..12].copy_from_slice(&self.atime.to_le_bytes());
        buffer[12..16].copy_from_slice(&self.ctime.to_le_bytes());
        buffer[16..20].copy_from_slice(&self.mtime.to_le_bytes());
        // 20..24 is the deletion time, which we do not track.
        buffer[24..26].copy_from_slice(&self.gid.to_le_bytes());
        buffer[26..28].copy_from_slice(&self.links_count.to_le_bytes());
        buffer[28..32].copy_from_slice(&self.blocks.to_le_bytes());

        // The pointer array, slots 13 and 14 included (always zero).
        for (slot, pointer) in self.block.iter().enumerate() {
            let at = 40 + slot * 4;
            buffer[at..at + 4].copy_from_slice(&pointer.to_le_bytes());
        }

        buffer
    }

    pub fn from_bytes(bytes: &[u8; INODE_SIZE]) -> Inode {
        let u32_at = |offset: usize| -> u32 {
            u32::from_le_bytes(bytes[offset..offset + 4].try_into().expect("4 = 4"))
        };
        let u16_at = |offset: usize| -> u16 {
            u16::from_le_bytes(bytes[offset..offset + 2].try_into().expect("2 = 2"))
        };

        let mut block: [u32; BLOCK_SLOTS] = [0u32; BLOCK_SLOTS];
        for (slot, pointer) in block.iter_mut().enumerate() {
            *pointer = u32_at(40 + slot * 4);
        }

        Inode {
            mode: u16_at(0),
            uid: u16_at(2),
            size: u32_at(4),
            atime: u32_at(8),
            ctime: u32_at(12),
            mtime: u32_at(16),
            gid: u16_at(24),
            links_count: u16_at(26),
            blocks: u32_at(28),
            block,
        }
    }
}

impl Volume {
    /// Read inode `inode_no` from the table. An unallocated slot reads
    /// back as the zeroed record; that is not an error.
    pub fn read_inode(&mut self, inode_no: u32) -> Result<Inode, FsError> {
        let (block_no, offset) = table_location(inode_no)?;
        let block = self.image.read_block(block_no)?;
        let record: &[u8; INODE_SIZE] = block[offset..offset + INODE_SIZE]
            .try_into()
            .expect("record fits in its block");
        Ok(Inode::from_bytes(record))
    }

    /// Write the full record for inode `inode_no`.
    pub fn write_inode(&mut self, inode_no: u32, inode: &Inode) -> Result<(), FsError> {
        let (block_no, offset) = table_location(inode_no)?;
        let mut block = self.image.read_block(block_no)?;
        block[offset..offset + INODE_SIZE].copy_from_slice(&inode.to_bytes());
        self.image.write_block(block_no, &block)?;
        Ok(())
    }

    /// Allocate an inode number and write a fresh record into it.
    pub fn create_inode(&mut self, mode: u16, uid: u16, gid: u16) -> Result<u32, FsError> {
        let inode_no = self.allocate_inode()?;
        let inode = Inode::new(mode, uid, gid);
        if let Err(error) = self.write_inode(inode_no, &inode) {
            // Give the number back before bailing.
            let _ = self.free_inode(inode_no);
            return Err(error);
        }
        debug!("Created inode {inode_no} with mode {mode:#o}.");
        Ok(inode_no)
    }

    /// Tear an inode down: free every data block it references, the
    /// indirect block if present, zero the record, and return the
    /// number to the allocator.
    pub fn delete_inode(&mut self, inode_no: u32) -> Result<(), FsError> {
        go_delete_inode(self, inode_no)
    }
}

/// Where inode `inode_no` lives: (block number, byte offset inside it).
/// Inode numbers are 1-based; record `n` sits at byte `(n-1) * SI` of
/// the table region.
fn table_location(inode_no: u32) -> Result<(u32, usize), FsError> {
    if inode_no == 0 || inode_no > MAX_INODES {
        return Err(FsError::InvalidArgument);
    }
    let byte_offset = (inode_no as usize - 1) * INODE_SIZE;
    let block_no = INODE_TABLE_START + (byte_offset / BLOCK_SIZE) as u32;
    Ok((block_no, byte_offset % BLOCK_SIZE))
}

fn go_delete_inode(volume: &mut Volume, inode_no: u32) -> Result<(), FsError> {
    let inode = volume.read_inode(inode_no)?;
    debug!("Deleting inode {inode_no}.");

    // Direct blocks first.
    for pointer in inode.block.iter().take(INDIRECT_SLOT) {
        if *pointer != 0 {
            volume.free_block(*pointer)?;
        }
    }

    // Then whatever the indirect block reaches, then the indirect
    // block itself.
    let indirect = inode.block[INDIRECT_SLOT];
    if indirect != 0 {
        match volume.image.read_block(indirect) {
            Ok(block) => {
                for slot in 0..POINTERS_PER_BLOCK {
                    let at = slot * 4;
                    let pointer =
                        u32::from_le_bytes(block[at..at + 4].try_into().expect("4 = 4"));
                    if pointer != 0 {
                        volume.free_block(pointer)?;
                    }
                }
            }
            Err(error) => {
                // Free what we can anyway.
                warn!("Could not read indirect block {indirect} of inode {inode_no}: {error}");
            }
        }
        volume.free_block(indirect)?;
    }

    volume.write_inode(inode_no, &Inode::zeroed())?;
    volume.free_inode(inode_no)?;
    Ok(())
}
