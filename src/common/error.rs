use std::path::PathBuf;

use thiserror::Error;

use super::types::{DataType, PageNum, Rid};

/// Engine error types. Every layer reports failures through these; no
/// layer retries or hides them.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("write failed")]
    WriteFailed,

    #[error("page {0} does not exist")]
    ReadNonExistingPage(PageNum),

    #[error("failed to close page file")]
    FileCloseFailed,

    #[error("pinned pages in buffer")]
    PinnedPagesInBuffer,

    #[error("page {0} is not resident in the buffer pool")]
    PageNotResident(PageNum),

    #[error("page {0} is already unpinned")]
    UnpinUnderflow(PageNum),

    #[error("no evictable frame: every frame is pinned")]
    NoEvictableFrame,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("no tuple with given RID {0}")]
    NoTupleWithGivenRid(Rid),

    #[error("no more tuples")]
    NoMoreTuples,

    #[error("cannot compare values of different data types ({left} and {right})")]
    TypeMismatch { left: DataType, right: DataType },

    #[error("index keys of type {0} are not supported")]
    UnknownKeyType(DataType),

    #[error("key {0} not found")]
    KeyNotFound(i32),

    #[error("no more entries")]
    NoMoreEntries,
}

pub type Result<T> = std::result::Result<T, DbError>;
