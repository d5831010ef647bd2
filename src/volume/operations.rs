// The operations the shell invokes, one per command. Every one of
// these resolves a path, authorises it, then leans on the layers
// below. Callers must be logged in.

use log::{debug, info};

use crate::directory::directory_struct::{DirListing, FILE_TYPE_DIR, FILE_TYPE_REG};
use crate::error_types::filesystem::FsError;
use crate::helpers::clock::unix_now;
use crate::inode::inode_struct::{AccessMode, PERM_MASK, S_IFDIR, S_IFREG, TYPE_MASK};
use crate::layout::ROOT_INODE;
use crate::volume::open_files::OpenMode;
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Create an empty regular file (mode 0644, owned by the caller).
    pub fn create_file(&mut self, path: &str) -> Result<(), FsError> {
        go_create_file(self, path)
    }

    /// Delete a regular file. Directories go through
    /// `remove_directory`.
    pub fn delete_file(&mut self, path: &str) -> Result<(), FsError> {
        go_delete_file(self, path)
    }

    /// Create a directory (mode 0755) with its `.` and `..` entries.
    pub fn make_directory(&mut self, path: &str) -> Result<(), FsError> {
        go_make_directory(self, path)
    }

    /// Remove a directory that holds nothing but `.` and `..`.
    pub fn remove_directory(&mut self, path: &str) -> Result<(), FsError> {
        go_remove_directory(self, path)
    }

    /// Move the identity's working directory.
    pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
        go_change_directory(self, path)
    }

    /// List a directory's live entries.
    pub fn list_directory(&mut self, path: &str) -> Result<Vec<DirListing>, FsError> {
        go_list_directory(self, path)
    }

    /// Open a regular file under one of the three access modes and
    /// hand back a descriptor.
    pub fn open_file(&mut self, path: &str, raw_flags: u32) -> Result<u32, FsError> {
        go_open_file(self, path, raw_flags)
    }

    pub fn close_file(&mut self, fd: u32) -> Result<(), FsError> {
        let _ = self.current_user()?;
        self.open_files.close(fd)
    }

    /// Read up to `size` bytes at the descriptor's offset, advancing
    /// it by what actually came back.
    pub fn read_file(&mut self, fd: u32, size: usize) -> Result<Vec<u8>, FsError> {
        go_read_file(self, fd, size)
    }

    /// Write at the descriptor's offset, advancing it by the bytes
    /// persisted. A short count means the volume filled up.
    pub fn write_file(&mut self, fd: u32, data: &[u8]) -> Result<usize, FsError> {
        go_write_file(self, fd, data)
    }

    /// Replace the low permission bits, keeping the type nibble.
    pub fn change_mode(&mut self, path: &str, mode: u16) -> Result<(), FsError> {
        go_change_mode(self, path, mode)
    }

    /// Reassign owner and group. No authorisation beyond login.
    pub fn change_owner(&mut self, path: &str, uid: u16, gid: u16) -> Result<(), FsError> {
        go_change_owner(self, path, uid, gid)
    }
}

/// Resolve and vet the parent a new child will land in, returning its
/// inode number. The caller needs write permission on it.
fn writable_parent(volume: &mut Volume, path: &str) -> Result<(u32, String), FsError> {
    let (parent, name) = volume.split_parent(path)?;
    if parent == 0 {
        return Err(FsError::NotFound);
    }
    let parent_inode = volume.read_inode(parent)?;
    if !parent_inode.is_directory() {
        return Err(FsError::NotADirectory);
    }
    volume.check_permission(&parent_inode, AccessMode::WRITE)?;
    Ok((parent, name))
}

fn go_create_file(volume: &mut Volume, path: &str) -> Result<(), FsError> {
    let user = volume.current_user()?;
    let (uid, gid) = (user.uid, user.gid);

    let (parent, name) = writable_parent(volume, path)?;
    if volume.dir_lookup(parent, &name)?.is_some() {
        return Err(FsError::Exists);
    }

    let child = volume.create_inode(S_IFREG | 0o644, uid, gid)?;
    if let Err(error) = volume.dir_insert(parent, &name, child, FILE_TYPE_REG) {
        // The entry never landed, so the inode goes back too.
        let _ = volume.delete_inode(child);
        return Err(error);
    }

    info!("Created file `{path}` as inode {child}.");
    Ok(())
}

fn go_delete_file(volume: &mut Volume, path: &str) -> Result<(), FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    let inode = volume.read_inode(inode_no)?;
    if inode.is_directory() {
        return Err(FsError::IsADirectory);
    }
    volume.check_permission(&inode, AccessMode::WRITE)?;

    let (parent, name) = volume.split_parent(path)?;
    if parent == 0 {
        return Err(FsError::NotFound);
    }
    volume.dir_remove(parent, &name)?;

    // The name is gone; reclaim the inode once nothing links to it.
    let mut inode = volume.read_inode(inode_no)?;
    inode.links_count = inode.links_count.saturating_sub(1);
    if inode.links_count == 0 {
        volume.delete_inode(inode_no)?;
    } else {
        inode.ctime = unix_now();
        volume.write_inode(inode_no, &inode)?;
    }

    info!("Deleted file `{path}`.");
    Ok(())
}

fn go_make_directory(volume: &mut Volume, path: &str) -> Result<(), FsError> {
    let user = volume.current_user()?;
    let (uid, gid) = (user.uid, user.gid);

    let (parent, name) = writable_parent(volume, path)?;
    if volume.dir_lookup(parent, &name)?.is_some() {
        return Err(FsError::Exists);
    }

    let child = volume.create_inode(S_IFDIR | 0o755, uid, gid)?;

    let populate = |volume: &mut Volume| -> Result<(), FsError> {
        volume.dir_insert(child, ".", child, FILE_TYPE_DIR)?;
        volume.dir_insert(child, "..", parent, FILE_TYPE_DIR)?;
        volume.dir_insert(parent, &name, child, FILE_TYPE_DIR)
    };
    if let Err(error) = populate(volume) {
        let _ = volume.delete_inode(child);
        return Err(error);
    }

    // "." plus the parent's entry link the child twice; the child's
    // ".." is the parent's extra link.
    let mut child_inode = volume.read_inode(child)?;
    child_inode.links_count = 2;
    volume.write_inode(child, &child_inode)?;

    let mut parent_inode = volume.read_inode(parent)?;
    parent_inode.links_count += 1;
    parent_inode.ctime = unix_now();
    volume.write_inode(parent, &parent_inode)?;

    info!("Created directory `{path}` as inode {child}.");
    Ok(())
}

fn go_remove_directory(volume: &mut Volume, path: &str) -> Result<(), FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    if inode_no == ROOT_INODE {
        return Err(FsError::InvalidArgument);
    }
    let inode = volume.read_inode(inode_no)?;
    if !inode.is_directory() {
        return Err(FsError::NotADirectory);
    }

    let occupied = volume
        .dir_list(inode_no)?
        .iter()
        .any(|entry| entry.name != "." && entry.name != "..");
    if occupied {
        return Err(FsError::NotEmpty);
    }

    let (parent, name) = writable_parent(volume, path)?;
    volume.dir_remove(parent, &name)?;

    let mut parent_inode = volume.read_inode(parent)?;
    parent_inode.links_count = parent_inode.links_count.saturating_sub(1);
    parent_inode.ctime = unix_now();
    volume.write_inode(parent, &parent_inode)?;

    // Takes its `.`/`..` block with it.
    volume.delete_inode(inode_no)?;

    info!("Removed directory `{path}`.");
    Ok(())
}

fn go_change_directory(volume: &mut Volume, path: &str) -> Result<(), FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    let inode = volume.read_inode(inode_no)?;
    if !inode.is_directory() {
        return Err(FsError::NotADirectory);
    }
    volume.check_permission(&inode, AccessMode::EXEC)?;

    volume.identity.cwd = inode_no;
    debug!("Working directory is now inode {inode_no}.");
    Ok(())
}

fn go_list_directory(volume: &mut Volume, path: &str) -> Result<Vec<DirListing>, FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    let inode = volume.read_inode(inode_no)?;
    if !inode.is_directory() {
        return Err(FsError::NotADirectory);
    }
    volume.check_permission(&inode, AccessMode::READ)?;

    volume.dir_list(inode_no)
}

fn go_open_file(volume: &mut Volume, path: &str, raw_flags: u32) -> Result<u32, FsError> {
    let _ = volume.current_user()?;

    let mode = OpenMode::from_raw(raw_flags)?;
    let inode_no = volume.resolve_path(path)?;
    let inode = volume.read_inode(inode_no)?;
    if !inode.is_regular_file() {
        return Err(FsError::NotARegularFile);
    }

    let mut required = AccessMode::empty();
    if mode.allows_read() {
        required |= AccessMode::READ;
    }
    if mode.allows_write() {
        required |= AccessMode::WRITE;
    }
    volume.check_permission(&inode, required)?;

    volume.open_files.open(inode_no, mode)
}

fn go_read_file(volume: &mut Volume, fd: u32, size: usize) -> Result<Vec<u8>, FsError> {
    let _ = volume.current_user()?;

    let file = volume.open_files.get_mut(fd)?;
    if !file.mode.allows_read() {
        return Err(FsError::BadFd);
    }
    let (inode_no, offset) = (file.inode_no, file.offset);

    let data = volume.read_inode_data(inode_no, size, offset)?;

    let file = volume.open_files.get_mut(fd)?;
    file.offset += data.len() as u32;
    Ok(data)
}

fn go_write_file(volume: &mut Volume, fd: u32, data: &[u8]) -> Result<usize, FsError> {
    let _ = volume.current_user()?;

    let file = volume.open_files.get_mut(fd)?;
    if !file.mode.allows_write() {
        return Err(FsError::BadFd);
    }
    let (inode_no, offset) = (file.inode_no, file.offset);

    let written = volume.write_inode_data(inode_no, data, offset)?;

    let file = volume.open_files.get_mut(fd)?;
    file.offset += written as u32;
    Ok(written)
}

fn go_change_mode(volume: &mut Volume, path: &str, mode: u16) -> Result<(), FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    let mut inode = volume.read_inode(inode_no)?;
    inode.mode = (inode.mode & TYPE_MASK) | (mode & PERM_MASK);
    inode.ctime = unix_now();
    volume.write_inode(inode_no, &inode)?;

    info!("Mode of `{path}` is now {:#o}.", inode.mode & PERM_MASK);
    Ok(())
}

fn go_change_owner(volume: &mut Volume, path: &str, uid: u16, gid: u16) -> Result<(), FsError> {
    let _ = volume.current_user()?;

    let inode_no = volume.resolve_path(path)?;
    let mut inode = volume.read_inode(inode_no)?;
    inode.uid = uid;
    inode.gid = gid;
    inode.ctime = unix_now();
    volume.write_inode(inode_no, &inode)?;

    info!("Owner of `{path}` is now {uid}:{gid}.");
    Ok(())
}
