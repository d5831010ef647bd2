// Turning slash-separated paths into inode numbers.

use crate::error_types::filesystem::FsError;
use crate::layout::ROOT_INODE;
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Walk `path` down to an inode. Absolute paths start at the
    /// root; relative paths start at the identity's working
    /// directory. Empty components (from `//` or a trailing slash)
    /// are skipped.
    pub fn resolve_path(&mut self, path: &str) -> Result<u32, FsError> {
        go_resolve_path(self, path)
    }

    /// Like `resolve_path`, but stop one component short: yields the
    /// parent directory's inode and the final name. A missing
    /// intermediate component yields parent inode 0 rather than an
    /// error, so callers can tell "no such parent" from "no such
    /// child".
    pub fn split_parent(&mut self, path: &str) -> Result<(u32, String), FsError> {
        go_split_parent(self, path)
    }
}

fn starting_inode(volume: &Volume, path: &str) -> u32 {
    if path.starts_with('/') {
        ROOT_INODE
    } else {
        volume.identity.cwd()
    }
}

/// One step of the walk: `component` inside directory `current`.
fn step(volume: &mut Volume, current: u32, component: &str) -> Result<Option<u32>, FsError> {
    let inode = volume.read_inode(current)?;
    if !inode.is_directory() {
        return Err(FsError::NotADirectory);
    }

    if component == "." {
        return Ok(Some(current));
    }

    // ".." is an ordinary record; the root's points back at the root.
    volume.dir_lookup(current, component)
}

fn go_resolve_path(volume: &mut Volume, path: &str) -> Result<u32, FsError> {
    if path.is_empty() {
        return Err(FsError::InvalidArgument);
    }

    let mut current = starting_inode(volume, path);
    for component in path.split('/').filter(|component| !component.is_empty()) {
        current = step(volume, current, component)?.ok_or(FsError::NotFound)?;
    }
    Ok(current)
}

fn go_split_parent(volume: &mut Volume, path: &str) -> Result<(u32, String), FsError> {
    if path.is_empty() {
        return Err(FsError::InvalidArgument);
    }

    let components: Vec<&str> = path
        .split('/')
        .filter(|component| !component.is_empty())
        .collect();

    // "/" and "" have no final component to split off.
    let Some((last, intermediate)) = components.split_last() else {
        return Err(FsError::InvalidArgument);
    };

    let mut current = starting_inode(volume, path);
    for component in intermediate {
        match step(volume, current, component)? {
            Some(next) => current = next,
            // A missing intermediate: report parent 0, not an error.
            None => return Ok((0, (*last).to_string())),
        }
    }

    // The parent must actually be a directory for the split to mean
    // anything.
    let parent = volume.read_inode(current)?;
    if !parent.is_directory() {
        return Err(FsError::NotADirectory);
    }

    Ok((current, (*last).to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use test_log::test; // We want to see logs while testing.

    use crate::directory::directory_struct::FILE_TYPE_DIR;
    use crate::error_types::filesystem::FsError;
    use crate::inode::inode_struct::S_IFDIR;
    use crate::layout::ROOT_INODE;
    use crate::volume::test_support::scratch_volume;

    #[test]
    fn root_resolves_to_inode_2() {
        let (mut volume, _dir) = scratch_volume();
        assert_eq!(volume.resolve_path("/").unwrap(), ROOT_INODE, "slash is the root");
        assert_eq!(volume.resolve_path("/.").unwrap(), ROOT_INODE, "dot of root is root");
        assert_eq!(
            volume.resolve_path("/..").unwrap(),
            ROOT_INODE,
            "dot-dot at the root stays at the root"
        );
    }

    #[test]
    fn nested_walk_and_doubled_slashes() {
        let (mut volume, _dir) = scratch_volume();

        let a = volume.create_inode(S_IFDIR | 0o755, 0, 0).unwrap();
        volume.dir_insert(a, ".", a, FILE_TYPE_DIR).unwrap();
        volume
            .dir_insert(a, "..", ROOT_INODE, FILE_TYPE_DIR)
            .unwrap();
        volume.dir_insert(ROOT_INODE, "a", a, FILE_TYPE_DIR).unwrap();

        let b = volume.create_inode(S_IFDIR | 0o755, 0, 0).unwrap();
        volume.dir_insert(b, ".", b, FILE_TYPE_DIR).unwrap();
        volume.dir_insert(b, "..", a, FILE_TYPE_DIR).unwrap();
        volume.dir_insert(a, "b", b, FILE_TYPE_DIR).unwrap();

        assert_eq!(volume.resolve_path("/a/b").unwrap(), b, "plain walk");
        assert_eq!(volume.resolve_path("//a//b/").unwrap(), b, "empty components skipped");
        assert_eq!(volume.resolve_path("/a/b/..").unwrap(), a, "dot-dot climbs");
        assert_eq!(volume.resolve_path("/a/b/../..").unwrap(), ROOT_INODE, "all the way up");
    }

    #[test]
    fn split_parent_reports_missing_intermediates_as_zero() {
        let (mut volume, _dir) = scratch_volume();

        let (parent, name) = volume.split_parent("/missing/child").unwrap();
        assert_eq!(parent, 0, "missing intermediate means parent 0");
        assert_eq!(name, "child", "the final component still comes back");

        let (parent, name) = volume.split_parent("/direct").unwrap();
        assert_eq!(parent, ROOT_INODE, "the root is a fine parent");
        assert_eq!(name, "direct", "final component");
    }

    #[test]
    fn empty_and_bare_slash_are_rejected_by_split() {
        let (mut volume, _dir) = scratch_volume();
        assert!(
            matches!(volume.split_parent("/"), Err(FsError::InvalidArgument)),
            "the root has no final component"
        );
        assert!(
            matches!(volume.resolve_path(""), Err(FsError::InvalidArgument)),
            "the empty path is nothing"
        );
    }
}
