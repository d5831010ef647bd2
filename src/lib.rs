// The library/filesystem cannot use unwraps.
#![deny(clippy::unwrap_used)]

// Asserts need to have a reason.
#![deny(clippy::missing_assert_message)]

// Gotta use all the results.
#![deny(unused_results)]

pub mod directory;
pub mod disk;
pub mod error_types;
mod helpers;
pub mod inode;
pub mod io;
pub mod layout;
pub mod path;
pub mod shell;
pub mod users;
pub mod volume;
