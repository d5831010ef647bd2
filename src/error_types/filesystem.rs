// Super-error for every operation the shell can invoke.

use thiserror::Error;

use crate::error_types::disk::DiskError;

/// Everything that can go wrong between a command and the image.
///
/// Partial writes are NOT an error. A write that runs out of space
/// returns the count of bytes it managed to persist.
#[derive(Debug, Error)]
pub enum FsError {
    #[error(transparent)]
    Disk(#[from] DiskError),
    #[error("bad magic number, this is not one of our images")]
    BadFormat,
    #[error("no volume is mounted")]
    NotMounted,
    #[error("a volume is already mounted")]
    AlreadyMounted,
    #[error("not logged in")]
    NotAuthenticated,
    #[error("permission denied")]
    PermissionDenied,
    #[error("no such file or directory")]
    NotFound,
    #[error("file exists")]
    Exists,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("not a regular file")]
    NotARegularFile,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no space left on volume")]
    NoSpace,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("bad file descriptor")]
    BadFd,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("file offset beyond the single-indirect reach")]
    FileTooBig,
}
