use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace};

use crate::common::{DbError, PageNum, Result, NO_PAGE};
use crate::storage::PageFile;

use super::frame::Frame;
use super::ReplacementPolicy;

/// Handle to a pinned page. The frame's buffer stays valid until the
/// matching `unpin_page`; access it through `BufferPool::data` and
/// `BufferPool::data_mut`.
#[derive(Debug, Clone, Copy)]
pub struct PageHandle {
    page_num: PageNum,
    frame: usize,
}

impl PageHandle {
    pub fn page_num(&self) -> PageNum {
        self.page_num
    }
}

/// BufferPool caches a bounded number of pages of one page file in
/// memory. Clients pin a page to hold its frame in place, mutate the
/// bytes, mark the page dirty, and unpin it; unpinned pages are evicted
/// on demand according to the pool's replacement policy, with dirty
/// pages written back first.
pub struct BufferPool {
    file: PageFile,
    frames: Vec<Frame>,
    /// Identity map: at most one frame per resident page.
    resident: HashMap<PageNum, usize>,
    policy: ReplacementPolicy,
    /// Monotonic tick stamping every pin.
    tick: u64,
    clock_hand: usize,
    read_io: u64,
    write_io: u64,
}

impl BufferPool {
    /// Opens the page file at `path` and attaches `capacity` empty
    /// frames to it.
    pub fn new<P: AsRef<Path>>(path: P, capacity: usize, policy: ReplacementPolicy) -> Result<Self> {
        if capacity == 0 {
            return Err(DbError::InvalidParameter(
                "buffer pool capacity must be positive",
            ));
        }

        let file = PageFile::open(path)?;
        let frames = (0..capacity).map(|_| Frame::new()).collect();

        Ok(Self {
            file,
            frames,
            resident: HashMap::new(),
            policy,
            tick: 0,
            clock_hand: 0,
            read_io: 0,
            write_io: 0,
        })
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Page count of the underlying file, including pages the pool has
    /// grown it by.
    pub fn total_pages(&self) -> PageNum {
        self.file.total_pages()
    }

    /// Pins page `page_num`, loading it from disk on a miss. The file
    /// grows to cover the page index if needed; freshly grown pages are
    /// zero-filled.
    pub fn pin_page(&mut self, page_num: PageNum) -> Result<PageHandle> {
        self.tick += 1;

        if let Some(&idx) = self.resident.get(&page_num) {
            let frame = &mut self.frames[idx];
            frame.pin_count += 1;
            frame.access_count += 1;
            frame.last_accessed = self.tick;
            frame.referenced = true;
            return Ok(PageHandle {
                page_num,
                frame: idx,
            });
        }

        let idx = match self.frames.iter().position(Frame::is_empty) {
            Some(idx) => idx,
            None => self.evict_victim()?,
        };

        self.file.ensure_capacity(page_num + 1)?;
        self.file
            .read_page(page_num, &mut self.frames[idx].data[..])?;

        let frame = &mut self.frames[idx];
        frame.page_num = Some(page_num);
        frame.dirty = false;
        frame.pin_count = 1;
        frame.access_count = 1;
        frame.last_accessed = self.tick;
        frame.referenced = true;
        frame.inserted_at = self.tick;

        self.resident.insert(page_num, idx);
        self.read_io += 1;

        Ok(PageHandle {
            page_num,
            frame: idx,
        })
    }

    /// Releases one pin on the page.
    pub fn unpin_page(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        let frame = &mut self.frames[idx];

        if frame.pin_count == 0 {
            return Err(DbError::UnpinUnderflow(handle.page_num));
        }
        frame.pin_count -= 1;
        Ok(())
    }

    /// Marks the page as modified so eviction and flushing write it back.
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        self.frames[idx].dirty = true;
        Ok(())
    }

    /// Writes the page to disk immediately, whether dirty or not, and
    /// clears its dirty flag.
    pub fn force_page(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        self.file
            .write_page(handle.page_num, &self.frames[idx].data[..])?;
        self.frames[idx].dirty = false;
        self.write_io += 1;
        Ok(())
    }

    /// Writes every dirty unpinned page to disk. Dirty pages that are
    /// still pinned are skipped.
    pub fn force_flush(&mut self) -> Result<()> {
        for idx in 0..self.frames.len() {
            let page_num = match self.frames[idx].page_num {
                Some(p) if self.frames[idx].dirty && self.frames[idx].pin_count == 0 => p,
                _ => continue,
            };
            self.file.write_page(page_num, &self.frames[idx].data[..])?;
            self.frames[idx].dirty = false;
            self.write_io += 1;
        }
        Ok(())
    }

    /// Flushes and releases every frame. Fails with
    /// `PinnedPagesInBuffer` if any page is still pinned; the pool is
    /// left intact in that case.
    pub fn shutdown(&mut self) -> Result<()> {
        self.force_flush()?;

        if self.frames.iter().any(|f| f.pin_count > 0) {
            return Err(DbError::PinnedPagesInBuffer);
        }

        for frame in &mut self.frames {
            frame.reset();
        }
        self.resident.clear();
        debug!("buffer pool over {:?} shut down", self.file.path());
        Ok(())
    }

    /// Page bytes of a pinned page.
    pub fn data(&self, handle: &PageHandle) -> &[u8] {
        debug_assert_eq!(
            self.frames[handle.frame].page_num,
            Some(handle.page_num),
            "stale page handle"
        );
        &self.frames[handle.frame].data[..]
    }

    /// Mutable page bytes of a pinned page. Callers must still
    /// `mark_dirty` for the change to reach disk.
    pub fn data_mut(&mut self, handle: &PageHandle) -> &mut [u8] {
        debug_assert_eq!(
            self.frames[handle.frame].page_num,
            Some(handle.page_num),
            "stale page handle"
        );
        &mut self.frames[handle.frame].data[..]
    }

    /// Page number held by each frame, in frame order; `NO_PAGE` for
    /// empty frames.
    pub fn frame_contents(&self) -> Vec<i32> {
        self.frames
            .iter()
            .map(|f| f.page_num.map_or(NO_PAGE, |p| p as i32))
            .collect()
    }

    /// Dirty flag of each frame, in frame order.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    /// Pin count of each frame, in frame order.
    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.pin_count).collect()
    }

    /// Number of pages read from disk since the pool was created.
    pub fn num_read_io(&self) -> u64 {
        self.read_io
    }

    /// Number of pages written to disk since the pool was created.
    pub fn num_write_io(&self) -> u64 {
        self.write_io
    }

    fn resident_frame(&self, page_num: PageNum) -> Result<usize> {
        self.resident
            .get(&page_num)
            .copied()
            .ok_or(DbError::PageNotResident(page_num))
    }

    /// Picks a victim per the replacement policy, writes it back if
    /// dirty, and hands its frame back empty.
    fn evict_victim(&mut self) -> Result<usize> {
        let idx = self
            .policy
            .pick_victim(&mut self.frames, &mut self.clock_hand)
            .ok_or(DbError::NoEvictableFrame)?;

        let old = self.frames[idx]
            .page_num
            .expect("victim frame holds a page");

        if self.frames[idx].dirty {
            self.file.write_page(old, &self.frames[idx].data[..])?;
            self.write_io += 1;
            trace!("wrote back dirty page {old} before eviction");
        }

        debug!("evicting page {old} from frame {idx}");
        self.resident.remove(&old);
        self.frames[idx].reset();
        Ok(idx)
    }
}

impl Drop for BufferPool {
    /// Best-effort flush of unpinned dirty pages.
    fn drop(&mut self) {
        let _ = self.force_flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_over(pages: PageNum, capacity: usize, policy: ReplacementPolicy) -> (tempfile::TempDir, BufferPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.bin");
        PageFile::create(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();
        pf.ensure_capacity(pages).unwrap();
        pf.close().unwrap();
        let pool = BufferPool::new(&path, capacity, policy).unwrap();
        (dir, pool)
    }

    #[test]
    fn test_pin_hit_does_not_reread() {
        let (_dir, mut pool) = pool_over(4, 3, ReplacementPolicy::Lru);

        let first = pool.pin_page(1).unwrap();
        let second = pool.pin_page(1).unwrap();
        assert_eq!(pool.num_read_io(), 1);
        assert_eq!(pool.fix_counts()[0], 2);

        pool.unpin_page(&first).unwrap();
        pool.unpin_page(&second).unwrap();
        assert_eq!(pool.fix_counts()[0], 0);
    }

    #[test]
    fn test_unpin_underflow() {
        let (_dir, mut pool) = pool_over(4, 3, ReplacementPolicy::Lru);

        let handle = pool.pin_page(1).unwrap();
        pool.unpin_page(&handle).unwrap();
        assert!(matches!(
            pool.unpin_page(&handle),
            Err(DbError::UnpinUnderflow(1))
        ));
    }

    #[test]
    fn test_operations_on_non_resident_page_fail() {
        let (_dir, mut pool) = pool_over(4, 2, ReplacementPolicy::Lru);

        let handle = pool.pin_page(1).unwrap();
        pool.unpin_page(&handle).unwrap();
        pool.pin_page(2).unwrap();
        let evicting = pool.pin_page(3).unwrap(); // evicts page 1

        assert!(matches!(
            pool.mark_dirty(&handle),
            Err(DbError::PageNotResident(1))
        ));
        assert!(matches!(
            pool.force_page(&handle),
            Err(DbError::PageNotResident(1))
        ));

        pool.unpin_page(&evicting).unwrap();
    }

    #[test]
    fn test_dirty_page_written_back_on_eviction() {
        let (_dir, mut pool) = pool_over(4, 1, ReplacementPolicy::Lru);

        let handle = pool.pin_page(1).unwrap();
        pool.data_mut(&handle)[0] = 0x77;
        pool.mark_dirty(&handle).unwrap();
        pool.unpin_page(&handle).unwrap();

        let other = pool.pin_page(2).unwrap();
        assert_eq!(pool.num_write_io(), 1);
        pool.unpin_page(&other).unwrap();

        let back = pool.pin_page(1).unwrap();
        assert_eq!(pool.data(&back)[0], 0x77);
        pool.unpin_page(&back).unwrap();
    }

    #[test]
    fn test_pin_grows_file_past_eof() {
        let (_dir, mut pool) = pool_over(1, 2, ReplacementPolicy::Lru);

        let handle = pool.pin_page(5).unwrap();
        assert_eq!(pool.total_pages(), 6);
        assert!(pool.data(&handle).iter().all(|&b| b == 0));
        pool.unpin_page(&handle).unwrap();
    }

    #[test]
    fn test_shutdown_refuses_pinned_pages() {
        let (_dir, mut pool) = pool_over(4, 2, ReplacementPolicy::Lru);

        let handle = pool.pin_page(1).unwrap();
        assert!(matches!(
            pool.shutdown(),
            Err(DbError::PinnedPagesInBuffer)
        ));

        pool.unpin_page(&handle).unwrap();
        pool.shutdown().unwrap();
        assert_eq!(pool.frame_contents(), vec![NO_PAGE, NO_PAGE]);
    }
}
