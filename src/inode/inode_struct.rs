// Inode layout.

use bitflags::bitflags;

use crate::helpers::clock::unix_now;
use crate::layout::BLOCK_SLOTS;

/// Type nibble for a regular file.
pub const S_IFREG: u16 = 0x8000;
/// Type nibble for a directory.
pub const S_IFDIR: u16 = 0x4000;
/// Mask selecting the type nibble of a mode.
pub const TYPE_MASK: u16 = 0xF000;
/// Mask selecting the permission bits (rwxrwxrwx + setuid/setgid/sticky).
pub const PERM_MASK: u16 = 0x0FFF;

bitflags! {
    /// The rwx bits of one permission triplet, as required by an
    /// access check.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessMode: u16 {
        const READ = 0b100;
        const WRITE = 0b010;
        const EXEC = 0b001;
    }
}

/// One inode record. 128 bytes on disk.
///
/// Pointer slots 0 through 11 are direct, slot 12 is single-indirect,
/// slots 13 and 14 exist in the record but are unused and stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub mode: u16,
    pub uid: u16,
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub gid: u16,
    pub links_count: u16,
    /// Data blocks this file occupies, `⌈size / B⌉`.
    pub blocks: u32,
    pub block: [u32; BLOCK_SLOTS],
}

impl Inode {
    /// A newborn inode: empty, one link, all timestamps now.
    pub fn new(mode: u16, uid: u16, gid: u16) -> Inode {
        let now = unix_now();
        Inode {
            mode,
            uid,
            size: 0,
            atime: now,
            ctime: now,
            mtime: now,
            gid,
            links_count: 1,
            blocks: 0,
            block: [0u32; BLOCK_SLOTS],
        }
    }

    /// The all-zero record an unallocated table slot reads as.
    pub fn zeroed() -> Inode {
        Inode {
            mode: 0,
            uid: 0,
            size: 0,
            atime: 0,
            ctime: 0,
            mtime: 0,
            gid: 0,
            links_count: 0,
            blocks: 0,
            block: [0u32; BLOCK_SLOTS],
        }
    }

    pub fn is_directory(&self) -> bool {
        self.mode & TYPE_MASK == S_IFDIR
    }

    pub fn is_regular_file(&self) -> bool {
        self.mode & TYPE_MASK == S_IFREG
    }

    /// Pick the rwx triplet that applies to `(uid, gid)`: owner if the
    /// uid matches, else group if the gid matches, else other. Nobody
    /// gets special treatment, uid 0 included.
    pub fn permission_triplet(&self, uid: u16, gid: u16) -> u16 {
        if uid == self.uid {
            (self.mode >> 6) & 0o7
        } else if gid == self.gid {
            (self.mode >> 3) & 0o7
        } else {
            self.mode & 0o7
        }
    }
}
