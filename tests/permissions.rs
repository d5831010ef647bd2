// Identity and mode checks, end to end.

use ext2fs::error_types::filesystem::FsError;
use ext2fs::users::user_struct::UserStore;
use test_log::test; // We want to see logs while testing.


/// Switch the logged-in account mid-test. Stock passwords equal the
/// usernames.
fn relogin(volume: &mut ext2fs::volume::volume_struct::Volume, username: &str) {
    let store = UserStore::with_default_accounts();
    volume
        .login(&store, username, username)
        .expect("switching stock accounts");
}

#[test]
fn a_private_file_stays_private() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");

    volume.create_file("/secret").expect("alice creates her file");
    volume.change_mode("/secret", 0o400).expect("chmod 0400");

    relogin(&mut volume, "bob");
    assert!(
        matches!(volume.open_file("/secret", 1), Err(FsError::PermissionDenied)),
        "bob may not open it for writing"
    );
    assert!(
        matches!(volume.open_file("/secret", 0), Err(FsError::PermissionDenied)),
        "bob may not even read it"
    );

    relogin(&mut volume, "alice");
    let fd = volume.open_file("/secret", 0).expect("the owner still reads it");
    volume.close_file(fd).expect("close");
    assert!(
        matches!(volume.open_file("/secret", 1), Err(FsError::PermissionDenied)),
        "0400 denies writing even to the owner"
    );
}

#[test]
fn group_members_get_the_group_triplet() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");

    // World-writable staging area so bob can create his own file.
    volume.make_directory("/shared").expect("mkdir /shared");
    volume.change_mode("/shared", 0o777).expect("open it up");

    relogin(&mut volume, "bob");
    volume.create_file("/shared/notes").expect("bob creates a file");
    volume.change_mode("/shared/notes", 0o640).expect("chmod 0640");

    // carol shares bob's group: the group triplet applies.
    relogin(&mut volume, "carol");
    let fd = volume.open_file("/shared/notes", 0).expect("group read works");
    volume.close_file(fd).expect("close");
    assert!(
        matches!(volume.open_file("/shared/notes", 1), Err(FsError::PermissionDenied)),
        "group write is not in 0640"
    );

    // alice matches neither owner nor group; the other triplet of
    // 0640 is empty. Uid 0 buys no override.
    relogin(&mut volume, "alice");
    assert!(
        matches!(volume.open_file("/shared/notes", 0), Err(FsError::PermissionDenied)),
        "uid 0 is not special"
    );
}

#[test]
fn parent_write_permission_gates_creation() {
    let (mut volume, _path, _dir) = test_common::mounted_as("bob");

    // The root belongs to alice (uid 0) and is 0755: bob can look,
    // not touch.
    assert!(
        matches!(volume.create_file("/intruder"), Err(FsError::PermissionDenied)),
        "bob may not create in the root"
    );
    assert!(
        matches!(volume.make_directory("/lair"), Err(FsError::PermissionDenied)),
        "nor mkdir there"
    );

    let listing = volume.list_directory("/").expect("but listing is fine, 0755 has r-x");
    assert!(!listing.is_empty(), "the dots are there");
}

#[test]
fn delete_needs_write_on_the_file() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");

    volume.make_directory("/drop").expect("mkdir /drop");
    volume.change_mode("/drop", 0o777).expect("world-writable");
    volume.create_file("/drop/mine").expect("alice's file");
    volume.change_mode("/drop/mine", 0o444).expect("read-only for everyone");

    relogin(&mut volume, "bob");
    assert!(
        matches!(volume.delete_file("/drop/mine"), Err(FsError::PermissionDenied)),
        "no write bit, no delete"
    );

    relogin(&mut volume, "alice");
    volume.change_mode("/drop/mine", 0o644).expect("give the owner write back");
    volume.delete_file("/drop/mine").expect("now it goes");
}

#[test]
fn chmod_and_chown_check_nothing_but_the_login() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");
    volume.create_file("/loose").expect("alice's file");

    // bob is neither owner nor group, yet both calls go through.
    relogin(&mut volume, "bob");
    volume.change_mode("/loose", 0o600).expect("chmod by a stranger");
    volume.change_owner("/loose", 1, 1).expect("chown by a stranger");

    let inode_no = volume.resolve_path("/loose").expect("resolve");
    let inode = volume.read_inode(inode_no).expect("inspect");
    assert_eq!(inode.mode & 0o777, 0o600, "the mode changed");
    assert_eq!((inode.uid, inode.gid), (1, 1), "the owner changed");

    // Having chowned it to himself, bob can now open it.
    let fd = volume.open_file("/loose", 2).expect("bob owns it now");
    volume.close_file(fd).expect("close");
}

#[test]
fn chmod_keeps_the_type_nibble() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");
    volume.make_directory("/d").expect("mkdir");

    volume.change_mode("/d", 0o700).expect("chmod the directory");
    let inode_no = volume.resolve_path("/d").expect("resolve");
    let inode = volume.read_inode(inode_no).expect("inspect");
    assert!(inode.is_directory(), "still a directory after chmod");
    assert_eq!(inode.mode & 0o777, 0o700, "with the new bits");
}

#[test]
fn execute_gates_cd() {
    let (mut volume, _path, _dir) = test_common::mounted_as("alice");

    volume.make_directory("/vault").expect("mkdir /vault");
    volume.change_mode("/vault", 0o700).expect("owner-only");

    relogin(&mut volume, "bob");
    assert!(
        matches!(volume.change_directory("/vault"), Err(FsError::PermissionDenied)),
        "no execute bit, no entry"
    );
    assert!(
        matches!(volume.list_directory("/vault"), Err(FsError::PermissionDenied)),
        "no read bit, no listing"
    );

    relogin(&mut volume, "alice");
    volume.change_directory("/vault").expect("the owner walks in");
}

#[test]
fn bad_credentials_never_install_an_identity() {
    let (mut volume, _path, _dir) = test_common::mounted();
    let store = UserStore::with_default_accounts();

    assert!(
        matches!(
            volume.login(&store, "alice", "not-her-password"),
            Err(FsError::PermissionDenied)
        ),
        "wrong password"
    );
    assert!(
        matches!(volume.create_file("/f"), Err(FsError::NotAuthenticated)),
        "and the gate stayed shut"
    );
}
