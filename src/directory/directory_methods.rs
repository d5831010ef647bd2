// Walking, growing and shrinking directories.

use log::{debug, error};

use crate::directory::directory_struct::{DIR_ENTRY_HEADER, DirListing, min_rec_len};
use crate::error_types::filesystem::FsError;
use crate::helpers::clock::unix_now;
use crate::inode::inode_struct::Inode;
use crate::layout::{BLOCK_SIZE, MAX_NAME_LEN, blocks_for};
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Find `name` in the directory. `Ok(None)` just means it is not
    /// there, which callers turn into whatever error fits them.
    pub fn dir_lookup(
        &mut self,
        dir_inode_no: u32,
        name: &str,
    ) -> Result<Option<u32>, FsError> {
        go_dir_lookup(self, dir_inode_no, name)
    }

    /// Add a record for `name` pointing at `child_inode`.
    ///
    /// Reuses a tombstone when one is wide enough, otherwise splits
    /// the slack off a live record, otherwise appends a whole new
    /// block to the directory. A live record with the same name fails
    /// with `Exists`.
    pub fn dir_insert(
        &mut self,
        dir_inode_no: u32,
        name: &str,
        child_inode: u32,
        file_type: u8,
    ) -> Result<(), FsError> {
        go_dir_insert(self, dir_inode_no, name, child_inode, file_type)
    }

    /// Tombstone the record for `name`. The span stays where it is
    /// and is not coalesced with its neighbours. If the removed child
    /// is itself a directory, the caller owns the link bookkeeping.
    pub fn dir_remove(&mut self, dir_inode_no: u32, name: &str) -> Result<(), FsError> {
        go_dir_remove(self, dir_inode_no, name)
    }

    /// Every live record in traversal order, with the child metadata
    /// a `dir` command wants to print.
    pub fn dir_list(&mut self, dir_inode_no: u32) -> Result<Vec<DirListing>, FsError> {
        go_dir_list(self, dir_inode_no)
    }
}

// A record header picked out of a block, name not yet decoded.
struct RawEntry {
    inode: u32,
    rec_len: usize,
    name_len: usize,
    file_type: u8,
}

/// Decode the record header at `offset`, validating the geometry. A
/// record that lies about its length means the block is corrupt.
fn parse_entry(block: &[u8; BLOCK_SIZE], offset: usize) -> Result<RawEntry, FsError> {
    if offset + DIR_ENTRY_HEADER > BLOCK_SIZE {
        error!("Directory record header at offset {offset} runs off the block.");
        return Err(FsError::BadFormat);
    }

    let inode = u32::from_le_bytes(block[offset..offset + 4].try_into().expect("4 = 4"));
    let rec_len =
        u16::from_le_bytes(block[offset + 4..offset + 6].try_into().expect("2 = 2")) as usize;
    let name_len = block[offset + 6] as usize;
    let file_type = block[offset + 7];

    if rec_len < DIR_ENTRY_HEADER
        || rec_len % 4 != 0
        || offset + rec_len > BLOCK_SIZE
        || DIR_ENTRY_HEADER + name_len > rec_len
    {
        error!("Malformed directory record at offset {offset} (rec_len {rec_len}).");
        return Err(FsError::BadFormat);
    }

    Ok(RawEntry {
        inode,
        rec_len,
        name_len,
        file_type,
    })
}

fn entry_name<'block>(
    block: &'block [u8; BLOCK_SIZE],
    offset: usize,
    entry: &RawEntry,
) -> &'block [u8] {
    &block[offset + DIR_ENTRY_HEADER..offset + DIR_ENTRY_HEADER + entry.name_len]
}

/// Stamp a full record at `offset`. The caller guarantees it fits.
fn write_entry(
    block: &mut [u8; BLOCK_SIZE],
    offset: usize,
    inode: u32,
    rec_len: usize,
    name: &str,
    file_type: u8,
) {
    block[offset..offset + 4].copy_from_slice(&inode.to_le_bytes());
    block[offset + 4..offset + 6].copy_from_slice(&(rec_len as u16).to_le_bytes());
    block[offset + 6] = name.len() as u8;
    block[offset + 7] = file_type;
    block[offset + DIR_ENTRY_HEADER..offset + DIR_ENTRY_HEADER + name.len()]
        .copy_from_slice(name.as_bytes());
}

fn set_rec_len(block: &mut [u8; BLOCK_SIZE], offset: usize, rec_len: usize) {
    block[offset + 4..offset + 6].copy_from_slice(&(rec_len as u16).to_le_bytes());
}

fn go_dir_lookup(
    volume: &mut Volume,
    dir_inode_no: u32,
    name: &str,
) -> Result<Option<u32>, FsError> {
    let dir = volume.read_inode(dir_inode_no)?;

    for block_index in 0..blocks_for(dir.size) {
        let physical = volume.map_block(&dir, block_index)?;
        if physical == 0 {
            continue;
        }
        let block = volume.image.read_block(physical)?;

        let mut offset = 0;
        while offset < BLOCK_SIZE {
            let entry = parse_entry(&block, offset)?;
            if entry.inode != 0 && entry_name(&block, offset, &entry) == name.as_bytes() {
                return Ok(Some(entry.inode));
            }
            offset += entry.rec_len;
        }
    }

    Ok(None)
}

/// Fit a record for `name` into this block if any span allows it.
/// Returns whether the block was changed.
fn try_insert_in_block(
    block: &mut [u8; BLOCK_SIZE],
    name: &str,
    child_inode: u32,
    file_type: u8,
) -> Result<bool, FsError> {
    let needed = min_rec_len(name.len());

    let mut offset = 0;
    while offset < BLOCK_SIZE {
        let entry = parse_entry(block, offset)?;

        // A wide enough tombstone is simply overwritten, keeping its
        // span.
        if entry.inode == 0 && entry.rec_len >= needed {
            write_entry(block, offset, child_inode, entry.rec_len, name, file_type);
            return Ok(true);
        }

        // A live record hoarding slack gets shrunk to its minimum,
        // and the new record takes over the freed tail.
        if entry.inode != 0 {
            let used = min_rec_len(entry.name_len);
            let slack = entry.rec_len - used;
            if slack >= needed {
                set_rec_len(block, offset, used);
                write_entry(block, offset + used, child_inode, slack, name, file_type);
                return Ok(true);
            }
        }

        offset += entry.rec_len;
    }

    Ok(false)
}

fn go_dir_insert(
    volume: &mut Volume,
    dir_inode_no: u32,
    name: &str,
    child_inode: u32,
    file_type: u8,
) -> Result<(), FsError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains('/') {
        return Err(FsError::InvalidArgument);
    }
    if volume.dir_lookup(dir_inode_no, name)?.is_some() {
        return Err(FsError::Exists);
    }

    let mut dir = volume.read_inode(dir_inode_no)?;

    // First try every block the directory already has.
    for block_index in 0..blocks_for(dir.size) {
        let physical = volume.map_block(&dir, block_index)?;
        if physical == 0 {
            continue;
        }
        let mut block = volume.image.read_block(physical)?;
        if try_insert_in_block(&mut block, name, child_inode, file_type)? {
            volume.image.write_block(physical, &block)?;
            touch_directory(volume, dir_inode_no, &mut dir)?;
            debug!("Inserted `{name}` into directory inode {dir_inode_no}.");
            return Ok(());
        }
    }

    // No block had room. Grow the directory by one block holding a
    // single spanning tombstone, and put the record in that.
    let physical = volume.allocate_block()?;
    let mut block: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];
    write_entry(&mut block, 0, 0, BLOCK_SIZE, "", 0);
    let fitted = try_insert_in_block(&mut block, name, child_inode, file_type)?;
    debug_assert!(fitted, "a fresh block always fits one record");

    let new_index = blocks_for(dir.size);
    if let Err(error) = volume.set_map_block(&mut dir, new_index, physical) {
        let _ = volume.free_block(physical);
        return Err(error);
    }
    if let Err(error) = volume.image.write_block(physical, &block) {
        let _ = volume.free_block(physical);
        return Err(error.into());
    }

    dir.size += BLOCK_SIZE as u32;
    dir.blocks = blocks_for(dir.size);
    touch_directory(volume, dir_inode_no, &mut dir)?;
    debug!("Grew directory inode {dir_inode_no} to insert `{name}`.");
    Ok(())
}

fn go_dir_remove(volume: &mut Volume, dir_inode_no: u32, name: &str) -> Result<(), FsError> {
    let mut dir = volume.read_inode(dir_inode_no)?;

    for block_index in 0..blocks_for(dir.size) {
        let physical = volume.map_block(&dir, block_index)?;
        if physical == 0 {
            continue;
        }
        let mut block = volume.image.read_block(physical)?;

        let mut offset = 0;
        while offset < BLOCK_SIZE {
            let entry = parse_entry(&block, offset)?;
            if entry.inode != 0 && entry_name(&block, offset, &entry) == name.as_bytes() {
                // Tombstone it. The span stays for a later insert.
                block[offset..offset + 4].copy_from_slice(&0u32.to_le_bytes());
                volume.image.write_block(physical, &block)?;
                touch_directory(volume, dir_inode_no, &mut dir)?;
                debug!("Removed `{name}` from directory inode {dir_inode_no}.");
                return Ok(());
            }
            offset += entry.rec_len;
        }
    }

    Err(FsError::NotFound)
}

fn go_dir_list(volume: &mut Volume, dir_inode_no: u32) -> Result<Vec<DirListing>, FsError> {
    let dir = volume.read_inode(dir_inode_no)?;
    let mut listing: Vec<DirListing> = Vec::new();

    for block_index in 0..blocks_for(dir.size) {
        let physical = volume.map_block(&dir, block_index)?;
        if physical == 0 {
            continue;
        }
        let block = volume.image.read_block(physical)?;

        let mut offset = 0;
        while offset < BLOCK_SIZE {
            let entry = parse_entry(&block, offset)?;
            if entry.inode != 0 {
                let name = String::from_utf8_lossy(entry_name(&block, offset, &entry)).to_string();
                let child = volume.read_inode(entry.inode)?;
                listing.push(DirListing {
                    name,
                    inode: entry.inode,
                    file_type: entry.file_type,
                    size: child.size,
                    mode: child.mode,
                    uid: child.uid,
                    gid: child.gid,
                    mtime: child.mtime,
                });
            }
            offset += entry.rec_len;
        }
    }

    Ok(listing)
}

/// A mutated directory gets fresh mtime/ctime and its record written
/// back, all in one go.
fn touch_directory(
    volume: &mut Volume,
    dir_inode_no: u32,
    dir: &mut Inode,
) -> Result<(), FsError> {
    let now = unix_now();
    dir.mtime = now;
    dir.ctime = now;
    volume.write_inode(dir_inode_no, dir)
}
