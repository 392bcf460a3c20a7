//! minirel - a page-based storage engine for an instructional
//! relational database.
//!
//! The engine stores fixed-schema tuples in paged files on disk and
//! caches hot pages in a bounded buffer pool.
//!
//! # Architecture
//!
//! The system is organized into layers, leaves first:
//!
//! - **Storage** (`storage`): maps a host file to an array of
//!   fixed-size pages
//!   - `PageFile`: page-granular read/write, append, capacity growth
//!
//! - **Buffer** (`buffer`): caches a bounded number of pages in memory
//!   - `BufferPool`: pin/unpin protocol, dirty tracking, write-back
//!   - `ReplacementPolicy`: FIFO, LRU, CLOCK, and LFU eviction
//!
//! - **Record** (`record`): interprets pages as slotted tuple
//!   containers
//!   - `Schema`/`Attribute`: fixed tuple layout and the page-0 header
//!   - `Table`: insert, delete, update, get by RID
//!   - `TableScan`/`Expr`: predicate-driven scans
//!
//! - **Index** (`index`): ordered integer-key to RID map
//!   - `BTree`: insert, find, remove; at most two keys per node page
//!   - `TreeScan`: ascending traversal of the stored keys
//!
//! # Example
//!
//! ```rust,no_run
//! use minirel::record::{Attribute, Expr, Record, Schema, Table, Value};
//! use minirel::DataType;
//!
//! let schema = Schema::new(
//!     vec![
//!         Attribute::new("id", DataType::Int, 0).unwrap(),
//!         Attribute::new("name", DataType::String, 8).unwrap(),
//!     ],
//!     vec![0],
//! )
//! .unwrap();
//!
//! Table::create("people.tbl", &schema).unwrap();
//! let table = Table::open("people.tbl").unwrap();
//!
//! let mut record = Record::new(table.schema());
//! record.set_attr(table.schema(), 0, &Value::Int(1)).unwrap();
//! record
//!     .set_attr(table.schema(), 1, &Value::String("ada".into()))
//!     .unwrap();
//! let rid = table.insert(&mut record).unwrap();
//!
//! assert_eq!(table.get(rid).unwrap(), record);
//! table.close().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod record;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{DataType, DbError, PageNum, Result, Rid, PAGE_SIZE};
