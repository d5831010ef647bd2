// Raw block I/O against the image file.

use std::io::{Read, Seek, SeekFrom, Write};

use log::trace;

use crate::disk::disk_struct::DiskImage;
use crate::error_types::disk::DiskError;
use crate::layout::{BLOCK_SIZE, MAX_BLOCKS};

impl DiskImage {
    /// Read block `block_no` into a fresh buffer.
    pub fn read_block(&mut self, block_no: u32) -> Result<[u8; BLOCK_SIZE], DiskError> {
        go_read_block(self, block_no)
    }

    /// Write one full block. The data hits the file before this
    /// returns success.
    pub fn write_block(&mut self, block_no: u32, data: &[u8; BLOCK_SIZE]) -> Result<(), DiskError> {
        go_write_block(self, block_no, data)
    }
}

fn go_read_block(image: &mut DiskImage, block_no: u32) -> Result<[u8; BLOCK_SIZE], DiskError> {
    if block_no >= MAX_BLOCKS {
        return Err(DiskError::OutOfRange(block_no));
    }

    trace!("Reading block {block_no}.");
    let _ = image
        .file
        .seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;

    let mut buffer: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];
    image.file.read_exact(&mut buffer)?;
    Ok(buffer)
}

fn go_write_block(
    image: &mut DiskImage,
    block_no: u32,
    data: &[u8; BLOCK_SIZE],
) -> Result<(), DiskError> {
    if block_no >= MAX_BLOCKS {
        return Err(DiskError::OutOfRange(block_no));
    }

    trace!("Writing block {block_no}.");
    let _ = image
        .file
        .seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;

    image.file.write_all(data)?;
    image.file.flush()?;
    Ok(())
}
