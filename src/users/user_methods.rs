// Login, logout, and the mode check everything funnels through.

use log::{debug, info};

use crate::error_types::filesystem::FsError;
use crate::inode::inode_struct::{AccessMode, Inode};
use crate::layout::ROOT_INODE;
use crate::users::user_struct::{CurrentUser, UserStore};
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Validate `(username, password)` against the store and install
    /// the identity. Logging in also drops you back at the root.
    pub fn login(
        &mut self,
        store: &UserStore,
        username: &str,
        password: &str,
    ) -> Result<(), FsError> {
        let account = store
            .authenticate(username, password)
            .ok_or(FsError::PermissionDenied)?;

        self.identity.user = Some(CurrentUser {
            uid: account.uid,
            gid: account.gid,
            username: account.username.clone(),
        });
        self.identity.cwd = ROOT_INODE;
        info!("Logged in as `{}` (uid {}).", account.username, account.uid);
        Ok(())
    }

    /// Drop the identity. Harmless when nobody is logged in.
    pub fn logout(&mut self) {
        if let Some(user) = self.identity.user.take() {
            info!("Logged out `{}`.", user.username);
        }
        self.identity.cwd = ROOT_INODE;
    }

    /// The logged-in user, or `NotAuthenticated`. Every command the
    /// shell runs against volume contents goes through this gate.
    pub fn current_user(&self) -> Result<&CurrentUser, FsError> {
        self.identity.user.as_ref().ok_or(FsError::NotAuthenticated)
    }

    /// May the current user exercise `access` on this inode?
    ///
    /// Triplet selection: owner if the uid matches, else group if the
    /// gid matches, else other. All requested bits must be present.
    /// Uid 0 gets no override.
    pub fn check_permission(&self, inode: &Inode, access: AccessMode) -> Result<(), FsError> {
        let user = self.current_user()?;
        let triplet = inode.permission_triplet(user.uid, user.gid);
        if triplet & access.bits() == access.bits() {
            Ok(())
        } else {
            debug!(
                "Denied {access:?} for uid {} on mode {:#o}.",
                user.uid, inode.mode
            );
            Err(FsError::PermissionDenied)
        }
    }
}
