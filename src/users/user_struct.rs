// Who is allowed to touch the volume, and who is touching it now.

use crate::layout::ROOT_INODE;

/// One account in the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub uid: u16,
    pub gid: u16,
}

/// The external identity service: a fixed table of accounts checked
/// at login. The shell owns one and lends it to the volume.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    accounts: Vec<UserAccount>,
}

impl UserStore {
    /// The stock accounts. `alice` administers the volume (uid 0,
    /// which buys her nothing beyond owning what format created);
    /// `bob` and `carol` are plain users sharing group 1.
    pub fn with_default_accounts() -> UserStore {
        let account = |username: &str, password: &str, uid: u16, gid: u16| UserAccount {
            username: username.to_string(),
            password: password.to_string(),
            uid,
            gid,
        };
        UserStore {
            accounts: vec![
                account("alice", "alice", 0, 0),
                account("bob", "bob", 1, 1),
                account("carol", "carol", 2, 1),
            ],
        }
    }

    pub fn add_account(&mut self, account: UserAccount) {
        self.accounts.push(account);
    }

    /// The account matching both name and password, if any.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&UserAccount> {
        self.accounts
            .iter()
            .find(|account| account.username == username && account.password == password)
    }

    pub fn accounts(&self) -> &[UserAccount] {
        &self.accounts
    }
}

/// The user currently holding the volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: u16,
    pub gid: u16,
    pub username: String,
}

/// Identity state: who is logged in (if anyone) and where they are
/// standing. Lives inside the volume handle and dies with it.
#[derive(Debug, Clone)]
pub struct Identity {
    pub(crate) user: Option<CurrentUser>,
    pub(crate) cwd: u32,
}

impl Identity {
    pub fn new() -> Identity {
        Identity {
            user: None,
            cwd: ROOT_INODE,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.username.as_str())
    }

    pub fn cwd(&self) -> u32 {
        self.cwd
    }
}

impl Default for Identity {
    fn default() -> Identity {
        Identity::new()
    }
}
