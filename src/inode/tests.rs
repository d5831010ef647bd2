// Inode record and mapping tests.
// Unwrapping is okay here, since we want unexpected outcomes to fail tests.
#![allow(clippy::unwrap_used)]

use rand::Rng;
use test_log::test; // We want to see logs while testing.

use crate::error_types::filesystem::FsError;
use crate::inode::inode_struct::{Inode, S_IFDIR, S_IFREG};
use crate::layout::{
    BLOCK_SLOTS, DIRECT_SLOTS, INDIRECT_SLOT, MAX_FILE_BLOCKS, MAX_INODES, ROOT_INODE,
};
use crate::volume::test_support::{assert_counters_match_bitmaps, scratch_volume};

#[test]
fn inode_consistent_serialization() {
    for _ in 0..1000 {
        let inode: Inode = Inode::get_random();
        let serial = inode.to_bytes();
        let deserial = Inode::from_bytes(&serial);
        let re_serial = deserial.to_bytes();
        let re_deserial = Inode::from_bytes(&re_serial);

        // Original Inode survived
        assert_eq!(inode, re_deserial, "record must survive two round trips");

        // byte versions are the same
        assert_eq!(serial, re_serial, "serialization must be stable");
    }
}

#[test]
fn mode_helpers_read_the_type_nibble() {
    let file = Inode::new(S_IFREG | 0o644, 1, 1);
    assert!(file.is_regular_file(), "0x8000 is a regular file");
    assert!(!file.is_directory(), "a file is not a directory");

    let dir = Inode::new(S_IFDIR | 0o755, 1, 1);
    assert!(dir.is_directory(), "0x4000 is a directory");
    assert!(!dir.is_regular_file(), "a directory is not a file");
}

#[test]
fn unallocated_slots_read_back_zeroed() {
    let (mut volume, _dir) = scratch_volume();
    // Inode 100 was never allocated; the read still succeeds.
    let inode = volume.read_inode(100).unwrap();
    assert_eq!(inode, Inode::zeroed(), "an unallocated slot is all zeroes");
}

#[test]
fn inode_zero_and_out_of_range_are_rejected() {
    let (mut volume, _dir) = scratch_volume();
    assert!(
        matches!(volume.read_inode(0), Err(FsError::InvalidArgument)),
        "inode 0 is the reserved null inode"
    );
    assert!(
        matches!(volume.read_inode(MAX_INODES + 1), Err(FsError::InvalidArgument)),
        "past the table"
    );
}

#[test]
fn records_land_in_distinct_table_slots() {
    let (mut volume, _dir) = scratch_volume();

    // Two records with very different content, adjacent numbers.
    let a = Inode::new(S_IFREG | 0o600, 10, 20);
    let mut b = Inode::new(S_IFREG | 0o640, 30, 40);
    b.size = 4096;
    volume.write_inode(9, &a).unwrap();
    volume.write_inode(10, &b).unwrap();

    assert_eq!(volume.read_inode(9).unwrap(), a, "record 9 intact");
    assert_eq!(volume.read_inode(10).unwrap(), b, "record 10 intact");
}

#[test]
fn create_inode_hands_out_first_fit_numbers() {
    let (mut volume, _dir) = scratch_volume();

    let first = volume.create_inode(S_IFREG | 0o644, 0, 0).unwrap();
    let second = volume.create_inode(S_IFREG | 0o644, 0, 0).unwrap();
    assert_eq!(first, 1, "inode 1 is the lowest free number");
    assert_eq!(second, 3, "inode 2 is the root, so 3 comes next");

    let record = volume.read_inode(first).unwrap();
    assert_eq!(record.links_count, 1, "newborns have one link");
    assert_eq!(record.size, 0, "newborns are empty");
    assert_counters_match_bitmaps(&volume);
}

//
// Mapping
//

#[test]
fn direct_slots_map_straight_through() {
    let (mut volume, _dir) = scratch_volume();
    let mut inode = Inode::new(S_IFREG | 0o644, 0, 0);

    volume.set_map_block(&mut inode, 0, 500).unwrap();
    volume.set_map_block(&mut inode, 11, 501).unwrap();
    assert_eq!(inode.block[0], 500, "slot 0 holds the pointer");
    assert_eq!(inode.block[11], 501, "slot 11 holds the pointer");

    assert_eq!(volume.map_block(&inode, 0).unwrap(), 500, "mapping reads it back");
    assert_eq!(volume.map_block(&inode, 5).unwrap(), 0, "untouched slots are holes");
}

#[test]
fn indirect_mapping_materialises_on_first_use() {
    let (mut volume, _dir) = scratch_volume();
    let mut inode = Inode::new(S_IFREG | 0o644, 0, 0);

    // Nothing mapped yet: the whole indirect range reads as holes.
    assert_eq!(
        volume.map_block(&inode, DIRECT_SLOTS as u32).unwrap(),
        0,
        "no indirect block means a hole"
    );

    let free_before = volume.superblock.free_blocks_count;
    volume
        .set_map_block(&mut inode, DIRECT_SLOTS as u32, 600)
        .unwrap();

    assert_ne!(inode.block[INDIRECT_SLOT], 0, "the indirect block appeared");
    assert_eq!(
        volume.superblock.free_blocks_count,
        free_before - 1,
        "exactly one block paid for the indirection"
    );
    assert_eq!(
        volume.map_block(&inode, DIRECT_SLOTS as u32).unwrap(),
        600,
        "the far pointer reads back"
    );

    // A second far pointer reuses the same indirect block.
    volume.set_map_block(&mut inode, 100, 601).unwrap();
    assert_eq!(
        volume.superblock.free_blocks_count,
        free_before - 1,
        "no second indirect block"
    );
    assert_eq!(volume.map_block(&inode, 100).unwrap(), 601, "reads back too");
    assert_eq!(
        volume.map_block(&inode, 99).unwrap(),
        0,
        "its neighbours stay holes"
    );
}

#[test]
fn mapping_past_single_indirect_reach_fails() {
    let (mut volume, _dir) = scratch_volume();
    let mut inode = Inode::new(S_IFREG | 0o644, 0, 0);

    assert!(
        matches!(volume.map_block(&inode, MAX_FILE_BLOCKS), Err(FsError::FileTooBig)),
        "index 268 is out of reach"
    );
    assert!(
        matches!(
            volume.set_map_block(&mut inode, MAX_FILE_BLOCKS, 700),
            Err(FsError::FileTooBig)
        ),
        "set refuses it too"
    );
}

#[test]
fn delete_inode_returns_every_block_and_the_number() {
    let (mut volume, _dir) = scratch_volume();
    let free_blocks_before = volume.superblock.free_blocks_count;
    let free_inodes_before = volume.superblock.free_inodes_count;

    let inode_no = volume.create_inode(S_IFREG | 0o644, 0, 0).unwrap();
    // Far enough past the direct slots to force the indirect block.
    let data = vec![0x5Au8; 14 * 1024];
    let written = volume.write_inode_data(inode_no, &data, 0).unwrap();
    assert_eq!(written, data.len(), "the write fits comfortably");

    let record = volume.read_inode(inode_no).unwrap();
    assert_ne!(record.block[INDIRECT_SLOT], 0, "the file grew an indirect block");

    volume.delete_inode(inode_no).unwrap();

    assert_eq!(
        volume.superblock.free_blocks_count, free_blocks_before,
        "every data block and the indirect block came back"
    );
    assert_eq!(
        volume.superblock.free_inodes_count, free_inodes_before,
        "the inode number came back"
    );
    assert!(
        !volume.inode_bitmap.is_set(inode_no),
        "the bitmap bit is clear again"
    );
    assert_eq!(
        volume.read_inode(inode_no).unwrap(),
        Inode::zeroed(),
        "the record is zeroed, spare slots included"
    );
    assert_counters_match_bitmaps(&volume);
}

#[test]
fn root_survives_unrelated_churn() {
    let (mut volume, _dir) = scratch_volume();

    let inode_no = volume.create_inode(S_IFREG | 0o644, 7, 7).unwrap();
    let _ = volume.write_inode_data(inode_no, b"churn", 0).unwrap();
    volume.delete_inode(inode_no).unwrap();

    let root = volume.read_inode(ROOT_INODE).unwrap();
    assert!(root.is_directory(), "the root is still a directory");
    assert_eq!(root.links_count, 2, "its links are untouched");
}

// Impl to make randoms

#[cfg(test)]
impl Inode {
    pub(crate) fn get_random() -> Self {
        let mut random = rand::rng();
        let mut block: [u32; BLOCK_SLOTS] = [0u32; BLOCK_SLOTS];
        for pointer in block.iter_mut() {
            *pointer = random.random();
        }
        Inode {
            mode: random.random(),
            uid: random.random(),
            size: random.random(),
            atime: random.random(),
            ctime: random.random(),
            mtime: random.random(),
            gid: random.random(),
            links_count: random.random(),
            blocks: random.random(),
            block,
        }
    }
}
