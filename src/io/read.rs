// Byte-addressed reads over the block mapping.

use log::warn;

use crate::error_types::filesystem::FsError;
use crate::helpers::clock::unix_now;
use crate::layout::BLOCK_SIZE;
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Read up to `size` bytes starting at `offset`, clamped to the
    /// file size. Holes read as zero. Returns the bytes actually
    /// produced; reading at or past the end produces nothing.
    pub fn read_inode_data(
        &mut self,
        inode_no: u32,
        size: usize,
        offset: u32,
    ) -> Result<Vec<u8>, FsError> {
        go_read_inode_data(self, inode_no, size, offset)
    }
}

fn go_read_inode_data(
    volume: &mut Volume,
    inode_no: u32,
    size: usize,
    offset: u32,
) -> Result<Vec<u8>, FsError> {
    let inode = volume.read_inode(inode_no)?;

    if offset >= inode.size {
        return Ok(Vec::new());
    }

    let available = (inode.size - offset) as usize;
    let wanted = size.min(available);
    let mut out: Vec<u8> = Vec::with_capacity(wanted);
    let mut position = offset;

    while out.len() < wanted {
        let block_index = position / BLOCK_SIZE as u32;
        let block_offset = (position % BLOCK_SIZE as u32) as usize;
        let chunk = (BLOCK_SIZE - block_offset).min(wanted - out.len());

        let physical = volume.map_block(&inode, block_index)?;
        if physical == 0 {
            // A hole. It reads as zeroes.
            out.resize(out.len() + chunk, 0u8);
        } else {
            let block = volume.image.read_block(physical)?;
            out.extend_from_slice(&block[block_offset..block_offset + chunk]);
        }

        position += chunk as u32;
    }

    if !out.is_empty() {
        // Touch the access time. The read itself already succeeded,
        // so a failure here is logged and swallowed.
        let mut touched = inode;
        touched.atime = unix_now();
        if let Err(error) = volume.write_inode(inode_no, &touched) {
            warn!("Could not update atime on inode {inode_no}: {error}");
        }
    }

    Ok(out)
}
