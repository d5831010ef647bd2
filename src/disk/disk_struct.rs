// Information about the disk image backing a volume.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error_types::disk::DiskError;
use crate::layout::{BLOCK_SIZE, MAX_BLOCKS};

/// The block device. One flat file of exactly `MAX_BLOCKS` blocks.
///
/// No caching happens at this level beyond what the host OS provides.
pub struct DiskImage {
    path: PathBuf,
    pub(super) file: File,
}

impl DiskImage {
    /// Create a brand new image at `path`, overwriting whatever was
    /// there, and fill it with zeroed blocks.
    pub fn create(path: &Path) -> Result<DiskImage, DiskError> {
        create(path)
    }

    /// Open an existing image read/write.
    ///
    /// No structural validation happens here. Mounting checks the magic.
    pub fn open(path: &Path) -> Result<DiskImage, DiskError> {
        info!("Opening disk image at `{}`...", path.display());
        let file: File = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(DiskImage {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn create(path: &Path) -> Result<DiskImage, DiskError> {
    info!("Creating a fresh disk image at `{}`...", path.display());
    let mut file: File = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    // Lay down every block as zeroes so the image has its full size
    // from the start.
    let zero_block: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];
    for _ in 0..MAX_BLOCKS {
        file.write_all(&zero_block)?;
    }
    file.flush()?;
    debug!("Image filled with {MAX_BLOCKS} zeroed blocks.");

    Ok(DiskImage {
        path: path.to_path_buf(),
        file,
    })
}
