/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Sentinel reported by frame-contents introspection for an empty frame
pub const NO_PAGE: i32 = -1;

/// Number of frames in the buffer pool a table handle attaches
pub const TABLE_POOL_CAPACITY: usize = 100;

/// Number of frames in the buffer pool an index handle attaches
pub const INDEX_POOL_CAPACITY: usize = 10;

/// Maximum length of an attribute name in the table header (bytes)
pub const ATTR_NAME_LEN: usize = 15;
