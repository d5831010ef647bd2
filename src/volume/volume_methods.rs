// Volume lifecycle: format, mount, unmount, status.

use std::path::Path;

use log::{debug, info};

use crate::directory::directory_struct::FILE_TYPE_DIR;
use crate::disk::disk_struct::DiskImage;
use crate::error_types::filesystem::FsError;
use crate::helpers::clock::unix_now;
use crate::inode::inode_struct::{Inode, S_IFDIR};
use crate::layout::{
    BLOCK_BITMAP_BLOCK, FIRST_DATA_BLOCK, INODE_BITMAP_BLOCK, ROOT_INODE, SUPERBLOCK_BLOCK,
    SUPERBLOCK_MAGIC,
};
use crate::users::user_struct::Identity;
use crate::volume::bitmap::bitmap_struct::Bitmap;
use crate::volume::open_files::OpenFileTable;
use crate::volume::superblock::Superblock;
use crate::volume::volume_struct::{Volume, VolumeStatus};

impl Volume {
    /// Lay a fresh filesystem down on `path`, clobbering whatever was
    /// there. The result is an unmounted image with an empty root
    /// directory at inode 2.
    pub fn format(path: &Path) -> Result<(), FsError> {
        go_format(path)
    }

    /// Attach an existing image. The only validation is the magic.
    pub fn mount(path: &Path) -> Result<Volume, FsError> {
        go_mount(path)
    }

    /// Detach. Every mutation was already written through, so this
    /// just stamps the write time and drops the image handle. Open
    /// files do not survive; close them first if you care.
    pub fn unmount(mut self) -> Result<(), FsError> {
        self.superblock.write_time = unix_now();
        self.persist_superblock()?;
        self.open_files.invalidate_all();
        info!("Unmounted `{}`.", self.image.path().display());
        Ok(())
    }

    pub fn status(&self) -> VolumeStatus {
        VolumeStatus {
            image_path: self.image.path().to_path_buf(),
            total_blocks: self.superblock.blocks_count,
            free_blocks: self.superblock.free_blocks_count,
            total_inodes: self.superblock.inodes_count,
            free_inodes: self.superblock.free_inodes_count,
            current_user: self.identity.username().map(str::to_string),
            open_files: self.open_files.open_count(),
        }
    }

    pub(crate) fn persist_superblock(&mut self) -> Result<(), FsError> {
        let block = self.superblock.to_block();
        self.image.write_block(SUPERBLOCK_BLOCK, &block)?;
        Ok(())
    }

    pub(crate) fn persist_block_bitmap(&mut self) -> Result<(), FsError> {
        let block = self.block_bitmap.to_block();
        self.image.write_block(BLOCK_BITMAP_BLOCK, &block)?;
        Ok(())
    }

    pub(crate) fn persist_inode_bitmap(&mut self) -> Result<(), FsError> {
        let block = self.inode_bitmap.to_block();
        self.image.write_block(INODE_BITMAP_BLOCK, &block)?;
        Ok(())
    }
}

fn go_format(path: &Path) -> Result<(), FsError> {
    info!("Formatting `{}`...", path.display());
    let image = DiskImage::create(path)?;

    // Fresh metadata. The image is all zeroes, so the inode table is
    // already in its formatted state.
    let mut block_bitmap = Bitmap::new();
    for block_no in 0..FIRST_DATA_BLOCK {
        block_bitmap.set(block_no);
    }

    let mut volume = Volume {
        image,
        superblock: Superblock::new_formatted(),
        block_bitmap,
        inode_bitmap: Bitmap::new(),
        open_files: OpenFileTable::new(),
        identity: Identity::new(),
    };

    // The root directory is born here: inode 2, two self-referential
    // entries, link count 2.
    volume.inode_bitmap.set(ROOT_INODE);
    volume.superblock.free_inodes_count -= 1;

    let root = Inode::new(S_IFDIR | 0o755, 0, 0);
    volume.write_inode(ROOT_INODE, &root)?;
    volume.dir_insert(ROOT_INODE, ".", ROOT_INODE, FILE_TYPE_DIR)?;
    volume.dir_insert(ROOT_INODE, "..", ROOT_INODE, FILE_TYPE_DIR)?;

    let mut root = volume.read_inode(ROOT_INODE)?;
    root.links_count = 2;
    volume.write_inode(ROOT_INODE, &root)?;

    volume.persist_superblock()?;
    volume.persist_block_bitmap()?;
    volume.persist_inode_bitmap()?;

    debug!(
        "Formatted: {} free blocks, {} free inodes.",
        volume.superblock.free_blocks_count, volume.superblock.free_inodes_count
    );
    Ok(())
}

fn go_mount(path: &Path) -> Result<Volume, FsError> {
    let mut image = DiskImage::open(path)?;

    let superblock = Superblock::from_block(&image.read_block(SUPERBLOCK_BLOCK)?);
    if superblock.magic != SUPERBLOCK_MAGIC {
        // Not ours. The image handle drops right here.
        return Err(FsError::BadFormat);
    }

    let block_bitmap = Bitmap::from_block(image.read_block(BLOCK_BITMAP_BLOCK)?);
    let inode_bitmap = Bitmap::from_block(image.read_block(INODE_BITMAP_BLOCK)?);

    let mut volume = Volume {
        image,
        superblock,
        block_bitmap,
        inode_bitmap,
        open_files: OpenFileTable::new(),
        identity: Identity::new(),
    };

    volume.superblock.mount_time = unix_now();
    volume.persist_superblock()?;

    info!("Mounted `{}`.", path.display());
    Ok(volume)
}
