use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{BufferPool, ReplacementPolicy};
use crate::common::{DbError, PageNum, Result, Rid, PAGE_SIZE, TABLE_POOL_CAPACITY};
use crate::storage::PageFile;

use super::{Expr, Record, Schema, TableScan, SLOT_EMPTY, SLOT_OCCUPIED};

pub(crate) struct TableState {
    pub(crate) pool: BufferPool,
    pub(crate) tuple_count: i32,
    pub(crate) free_page_hint: PageNum,
}

/// An open table: the decoded schema plus a buffer pool over the
/// table's page file. Data pages are slotted containers of fixed-size
/// records; page 0 holds the header.
pub struct Table {
    path: PathBuf,
    schema: Schema,
    pub(crate) state: Mutex<TableState>,
}

impl Table {
    /// Creates the table's page file and writes the schema header to
    /// page 0. Data pages are allocated lazily on insert.
    pub fn create<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<()> {
        PageFile::create(&path)?;
        let mut file = PageFile::open(&path)?;

        let mut page = vec![0u8; PAGE_SIZE];
        schema.encode_header(0, 1, &mut page);
        file.write_page(0, &page)?;
        file.close()?;

        debug!("created table at {:?}", path.as_ref());
        Ok(())
    }

    /// Opens a table, decoding the schema from page 0 through a fresh
    /// LRU buffer pool.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Table> {
        let mut pool = BufferPool::new(&path, TABLE_POOL_CAPACITY, ReplacementPolicy::Lru)?;

        let header = pool.pin_page(0)?;
        let decoded = Schema::decode_header(pool.data(&header));
        pool.unpin_page(&header)?;
        let (schema, tuple_count, free_page_hint) = decoded?;

        Ok(Table {
            path: path.as_ref().to_path_buf(),
            schema,
            state: Mutex::new(TableState {
                pool,
                tuple_count,
                free_page_hint: free_page_hint.max(1) as PageNum,
            }),
        })
    }

    /// Writes the refreshed header back to page 0, flushes every cached
    /// page, and releases the pool.
    pub fn close(self) -> Result<()> {
        let mut state = self.state.into_inner();

        let header = state.pool.pin_page(0)?;
        self.schema.encode_header(
            state.tuple_count,
            state.free_page_hint as i32,
            state.pool.data_mut(&header),
        );
        state.pool.mark_dirty(&header)?;
        state.pool.unpin_page(&header)?;
        state.pool.shutdown()?;

        debug!("closed table at {:?}", self.path);
        Ok(())
    }

    /// Removes the table's page file.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        PageFile::destroy(path)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_tuples(&self) -> i32 {
        self.state.lock().tuple_count
    }

    /// Inserts a record into the first unused slot at or after the
    /// free-page hint, growing the file page by page as needed. The
    /// record's id is set to the assigned RID.
    pub fn insert(&self, record: &mut Record) -> Result<Rid> {
        let record_size = self.schema.record_size();
        if record.data().len() != record_size {
            return Err(DbError::InvalidParameter(
                "record size does not match the schema",
            ));
        }

        let slots_per_page = self.schema.slots_per_page();
        let mut state = self.state.lock();
        let mut page_num = state.free_page_hint;

        loop {
            let handle = state.pool.pin_page(page_num)?;
            let slot = find_unused_slot(state.pool.data(&handle), record_size, slots_per_page);

            match slot {
                Some(slot) => {
                    let off = slot * record_size;
                    let page = state.pool.data_mut(&handle);
                    page[off] = SLOT_OCCUPIED;
                    page[off + 1..off + record_size].copy_from_slice(&record.data()[1..]);

                    state.pool.mark_dirty(&handle)?;
                    state.pool.unpin_page(&handle)?;
                    state.tuple_count += 1;

                    let rid = Rid::new(page_num as i32, slot as i32);
                    record.id = rid;
                    return Ok(rid);
                }
                None => {
                    state.pool.unpin_page(&handle)?;
                    page_num += 1;
                }
            }
        }
    }

    /// Marks the slot at `rid` empty and biases future inserts toward
    /// the freed page.
    pub fn delete(&self, rid: Rid) -> Result<()> {
        let (page_num, slot) = self.checked_rid(rid)?;
        let mut state = self.state.lock();

        let handle = state.pool.pin_page(page_num)?;
        let off = slot * self.schema.record_size();
        state.pool.data_mut(&handle)[off] = SLOT_EMPTY;
        state.pool.mark_dirty(&handle)?;
        state.pool.unpin_page(&handle)?;

        state.free_page_hint = page_num;
        state.tuple_count -= 1;
        Ok(())
    }

    /// Overwrites the slot at `record.id` with the record's bytes. The
    /// tuple count is unchanged.
    pub fn update(&self, record: &Record) -> Result<()> {
        let record_size = self.schema.record_size();
        if record.data().len() != record_size {
            return Err(DbError::InvalidParameter(
                "record size does not match the schema",
            ));
        }

        let (page_num, slot) = self.checked_rid(record.id)?;
        let mut state = self.state.lock();

        let handle = state.pool.pin_page(page_num)?;
        let off = slot * record_size;
        let page = state.pool.data_mut(&handle);
        page[off] = SLOT_OCCUPIED;
        page[off + 1..off + record_size].copy_from_slice(&record.data()[1..]);

        state.pool.mark_dirty(&handle)?;
        state.pool.unpin_page(&handle)?;
        Ok(())
    }

    /// Reads the record stored at `rid`. An empty slot fails with
    /// `NoTupleWithGivenRid`.
    pub fn get(&self, rid: Rid) -> Result<Record> {
        let (page_num, slot) = self.checked_rid(rid)?;
        let record_size = self.schema.record_size();
        let mut state = self.state.lock();

        let handle = state.pool.pin_page(page_num)?;
        let off = slot * record_size;
        let page = state.pool.data(&handle);

        if page[off] != SLOT_OCCUPIED {
            state.pool.unpin_page(&handle)?;
            return Err(DbError::NoTupleWithGivenRid(rid));
        }

        let mut data = vec![0u8; record_size];
        data[0] = SLOT_OCCUPIED;
        data[1..].copy_from_slice(&page[off + 1..off + record_size]);
        state.pool.unpin_page(&handle)?;

        Ok(Record::from_raw(rid, data))
    }

    /// Starts a predicate scan positioned before the first data slot.
    pub fn scan(&self, predicate: Expr) -> TableScan<'_> {
        TableScan::new(self, predicate)
    }

    fn checked_rid(&self, rid: Rid) -> Result<(PageNum, usize)> {
        if rid.page < 1 || rid.slot < 0 || rid.slot as usize >= self.schema.slots_per_page() {
            return Err(DbError::InvalidParameter("record id out of range"));
        }
        Ok((rid.page as PageNum, rid.slot as usize))
    }
}

/// First slot whose tombstone is not `'+'`, including never-written
/// slots on freshly zeroed pages.
fn find_unused_slot(page: &[u8], record_size: usize, slots_per_page: usize) -> Option<usize> {
    (0..slots_per_page).find(|&slot| page[slot * record_size] != SLOT_OCCUPIED)
}
