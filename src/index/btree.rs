use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{BufferPool, ReplacementPolicy};
use crate::common::{DataType, DbError, PageNum, Result, Rid, INDEX_POOL_CAPACITY, PAGE_SIZE};
use crate::storage::PageFile;

use super::node::{self, Node};
use super::TreeScan;

pub(crate) struct TreeState {
    pub(crate) pool: BufferPool,
    pub(crate) root: PageNum,
    pub(crate) entry_count: i32,
    /// Highest occupied node page; 0 while the tree is empty.
    pub(crate) last_page: PageNum,
}

/// An open integer-key index over a paged file. Page 0 stores the tree
/// order; every later page holds exactly one node of at most two keys.
/// Once the tail node fills up, the next insert opens a fresh page, so
/// the structure grows as a chain of key pairs rather than by
/// splitting.
pub struct BTree {
    path: PathBuf,
    order: i32,
    pub(crate) state: Mutex<TreeState>,
}

impl BTree {
    /// Creates the index file and stores the tree order in page 0.
    /// Only `Int` keys are supported.
    pub fn create<P: AsRef<Path>>(path: P, key_type: DataType, order: i32) -> Result<()> {
        if key_type != DataType::Int {
            return Err(DbError::UnknownKeyType(key_type));
        }
        if order <= 0 {
            return Err(DbError::InvalidParameter("tree order must be positive"));
        }

        PageFile::create(&path)?;
        let mut file = PageFile::open(&path)?;

        let mut page = vec![0u8; PAGE_SIZE];
        page[..4].copy_from_slice(&order.to_ne_bytes());
        file.write_page(0, &page)?;
        file.close()?;

        debug!("created index at {:?}", path.as_ref());
        Ok(())
    }

    /// Opens an index, reading the tree order from page 0 through a
    /// fresh FIFO buffer pool.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<BTree> {
        let mut pool = BufferPool::new(&path, INDEX_POOL_CAPACITY, ReplacementPolicy::Fifo)?;

        let header = pool.pin_page(0)?;
        let order = i32::from_ne_bytes(pool.data(&header)[..4].try_into().unwrap());
        pool.unpin_page(&header)?;

        if order <= 0 {
            return Err(DbError::InvalidParameter(
                "index file carries no tree order",
            ));
        }

        Ok(BTree {
            path: path.as_ref().to_path_buf(),
            order,
            state: Mutex::new(TreeState {
                pool,
                root: 0,
                entry_count: 0,
                last_page: 0,
            }),
        })
    }

    /// Flushes every cached node page and releases the pool.
    pub fn close(self) -> Result<()> {
        let mut state = self.state.into_inner();
        state.pool.shutdown()?;
        debug!("closed index at {:?}", self.path);
        Ok(())
    }

    /// Removes the index's page file.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        PageFile::destroy(path)
    }

    /// Tree order as declared at creation time.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Key type of the index; always `Int`.
    pub fn key_type(&self) -> DataType {
        DataType::Int
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of keys currently stored.
    pub fn num_entries(&self) -> i32 {
        self.state.lock().entry_count
    }

    /// Page of the root node, or 0 while the tree is empty.
    pub fn root_page(&self) -> PageNum {
        self.state.lock().root
    }

    /// Number of node pages plus the header page.
    pub fn num_nodes(&self) -> i32 {
        self.state.lock().last_page as i32 + 1
    }

    /// Inserts a key/RID pair. A non-full tail node takes the pair into
    /// its second slot; otherwise a fresh page opens with the pair in
    /// its first slot.
    pub fn insert(&self, key: i32, rid: Rid) -> Result<()> {
        let mut state = self.state.lock();

        if state.last_page == 0 {
            // first entry: page 1 becomes the root leaf
            state.last_page = 1;
            state.root = 1;

            let handle = state.pool.pin_page(1)?;
            let page = state.pool.data_mut(&handle);
            node::set_full(page, false);
            Node::leaf(rid, key).write(page);
            state.pool.mark_dirty(&handle)?;
            state.pool.unpin_page(&handle)?;
        } else {
            let tail = state.last_page;
            let handle = state.pool.pin_page(tail)?;

            if node::is_full(state.pool.data(&handle)) {
                state.pool.unpin_page(&handle)?;
                state.last_page += 1;
                let tail = state.last_page;

                let handle = state.pool.pin_page(tail)?;
                let page = state.pool.data_mut(&handle);
                node::set_full(page, false);
                Node::leaf(rid, key).write(page);
                state.pool.mark_dirty(&handle)?;
                state.pool.unpin_page(&handle)?;
            } else {
                let page = state.pool.data_mut(&handle);
                let mut n = Node::read(page);
                n.mid = rid;
                n.value2 = key;
                n.write(page);
                node::set_full(page, true);
                state.pool.mark_dirty(&handle)?;
                state.pool.unpin_page(&handle)?;
            }
        }

        state.entry_count += 1;
        Ok(())
    }

    /// Looks up the RID most recently inserted for `key`.
    pub fn find(&self, key: i32) -> Result<Rid> {
        let mut state = self.state.lock();
        Self::locate(&mut state, key).map(|(rid, _, _)| rid)
    }

    /// Removes `key`, relocating the tail node's last entry into the
    /// vacated slot so occupied pages stay contiguous.
    pub fn remove(&self, key: i32) -> Result<()> {
        let mut state = self.state.lock();
        let (_, found_page, position) = Self::locate(&mut state, key)?;
        let tail = state.last_page;

        if found_page == tail {
            let handle = state.pool.pin_page(tail)?;
            let page = state.pool.data_mut(&handle);
            let was_full = node::is_full(page);
            let mut n = Node::read(page);

            if position == 2 {
                n.mid = Rid::INVALID;
                n.value2 = -1;
                n.write(page);
                node::set_full(page, false);
            } else if was_full {
                // shift the second entry into the first slot
                n.left = n.mid;
                n.value1 = n.value2;
                n.mid = Rid::INVALID;
                n.value2 = -1;
                n.write(page);
                node::set_full(page, false);
            } else {
                n.left = Rid::INVALID;
                n.value1 = -1;
                n.write(page);
                state.last_page -= 1;
            }

            state.pool.mark_dirty(&handle)?;
            state.pool.unpin_page(&handle)?;
        } else {
            // take the tail's last entry...
            let handle = state.pool.pin_page(tail)?;
            let page = state.pool.data_mut(&handle);
            let tail_full = node::is_full(page);
            let mut n = Node::read(page);

            let (moved_rid, moved_key);
            if tail_full {
                moved_rid = n.mid;
                moved_key = n.value2;
                n.mid = Rid::INVALID;
                n.value2 = -1;
                n.write(page);
                node::set_full(page, false);
            } else {
                moved_rid = n.left;
                moved_key = n.value1;
                n.left = Rid::INVALID;
                n.value1 = -1;
                n.write(page);
                state.last_page -= 1;
            }
            state.pool.mark_dirty(&handle)?;
            state.pool.unpin_page(&handle)?;

            // ...and put it into the vacated slot
            let handle = state.pool.pin_page(found_page)?;
            let page = state.pool.data_mut(&handle);
            let mut n = Node::read(page);
            if position == 1 {
                n.left = moved_rid;
                n.value1 = moved_key;
            } else {
                n.mid = moved_rid;
                n.value2 = moved_key;
            }
            n.write(page);
            state.pool.mark_dirty(&handle)?;
            state.pool.unpin_page(&handle)?;
        }

        state.entry_count -= 1;
        Ok(())
    }

    /// Opens an ordered scan over the stored keys.
    pub fn scan(&self) -> Result<TreeScan<'_>> {
        TreeScan::open(self)
    }

    /// Linear scan across the node pages; returns the RID, the page it
    /// was found on, and the key slot (1 or 2).
    pub(crate) fn locate(state: &mut TreeState, key: i32) -> Result<(Rid, PageNum, u8)> {
        for page_num in 1..=state.last_page {
            let handle = state.pool.pin_page(page_num)?;
            let n = Node::read(state.pool.data(&handle));
            state.pool.unpin_page(&handle)?;

            if n.value1 == key {
                return Ok((n.left, page_num, 1));
            }
            if n.value2 == key {
                return Ok((n.mid, page_num, 2));
            }
        }
        Err(DbError::KeyNotFound(key))
    }
}
