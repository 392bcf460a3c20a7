use crate::common::{DbError, PageNum, Result, Rid};

use super::{Expr, Record, Table};

/// Cursor-based predicate scan over a table. Slots are visited in
/// (page, slot) order and their raw bytes (tombstone included) are
/// evaluated against the predicate; only the predicate decides which
/// records surface, so a deleted slot whose stale bytes still match
/// can be returned.
pub struct TableScan<'a> {
    table: &'a Table,
    predicate: Expr,
    page: PageNum,
    slot: usize,
}

impl<'a> TableScan<'a> {
    pub(crate) fn new(table: &'a Table, predicate: Expr) -> TableScan<'a> {
        TableScan {
            table,
            predicate,
            page: 1,
            slot: 0,
        }
    }

    /// Returns the next record satisfying the predicate. Once the
    /// cursor exits the last allocated page the scan fails with
    /// `NoMoreTuples` and the cursor resets to the first data slot.
    pub fn next(&mut self) -> Result<Record> {
        let schema = self.table.schema();
        let record_size = schema.record_size();
        let slots_per_page = schema.slots_per_page();

        let mut state = self.table.state.lock();
        loop {
            if self.page >= state.pool.total_pages() {
                self.page = 1;
                self.slot = 0;
                return Err(DbError::NoMoreTuples);
            }

            let handle = state.pool.pin_page(self.page)?;
            let off = self.slot * record_size;
            let raw = state.pool.data(&handle)[off..off + record_size].to_vec();
            state.pool.unpin_page(&handle)?;

            let rid = Rid::new(self.page as i32, self.slot as i32);
            self.slot += 1;
            if self.slot >= slots_per_page {
                self.slot = 0;
                self.page += 1;
            }

            let record = Record::from_raw(rid, raw);
            if self.predicate.eval_bool(&record, schema)? {
                return Ok(record);
            }
        }
    }

    /// Rewinds the cursor to the first data slot.
    pub fn reset(&mut self) {
        self.page = 1;
        self.slot = 0;
    }
}
