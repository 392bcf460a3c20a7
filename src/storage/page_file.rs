use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::common::{DbError, PageNum, Result, PAGE_SIZE};

/// PageFile maps a host file to an ordered sequence of fixed-size pages
/// addressed by a zero-based index. All I/O happens a whole page at a
/// time. The cursor (`page_pos`) only serves the positional read
/// helpers; random access never consults it.
pub struct PageFile {
    path: PathBuf,
    file: File,
    total_pages: PageNum,
    page_pos: PageNum,
}

impl PageFile {
    /// Creates a page file containing a single zero-filled page. An
    /// existing file at the same path is truncated.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        file.write_all(&[0u8; PAGE_SIZE])
            .map_err(|_| DbError::WriteFailed)?;
        debug!("created page file {:?}", path.as_ref());
        Ok(())
    }

    /// Opens an existing page file. The page count is computed from the
    /// file length, rounding a trailing partial page up; well-formed
    /// files are always a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PageFile> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|_| DbError::FileNotFound(path.clone()))?;

        let len = file.metadata()?.len();
        let total_pages = len.div_ceil(PAGE_SIZE as u64) as PageNum;

        Ok(PageFile {
            path,
            file,
            total_pages,
            page_pos: 0,
        })
    }

    /// Flushes and closes the file.
    pub fn close(self) -> Result<()> {
        self.file.sync_all().map_err(|_| DbError::FileCloseFailed)
    }

    /// Removes a page file from disk.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        std::fs::remove_file(path.as_ref())
            .map_err(|_| DbError::FileNotFound(path.as_ref().to_path_buf()))?;
        debug!("destroyed page file {:?}", path.as_ref());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_pages(&self) -> PageNum {
        self.total_pages
    }

    /// Current cursor position of the positional read helpers.
    pub fn page_pos(&self) -> PageNum {
        self.page_pos
    }

    /// Reads page `page_num` into the provided buffer and moves the
    /// cursor there.
    pub fn read_page(&mut self, page_num: PageNum, buf: &mut [u8]) -> Result<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "buffer must be PAGE_SIZE bytes");

        if page_num >= self.total_pages {
            return Err(DbError::ReadNonExistingPage(page_num));
        }

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file
            .read_exact(buf)
            .map_err(|_| DbError::ReadNonExistingPage(page_num))?;

        self.page_pos = page_num;
        Ok(())
    }

    /// Writes the buffer to page `page_num` and moves the cursor there.
    /// The page must already exist.
    pub fn write_page(&mut self, page_num: PageNum, buf: &[u8]) -> Result<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "buffer must be PAGE_SIZE bytes");

        if page_num >= self.total_pages {
            return Err(DbError::ReadNonExistingPage(page_num));
        }

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file
            .write_all(buf)
            .map_err(|_| DbError::WriteFailed)?;

        self.page_pos = page_num;
        Ok(())
    }

    /// Appends one zero-filled page at the end of the file.
    pub fn append_empty_page(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&[0u8; PAGE_SIZE])
            .map_err(|_| DbError::WriteFailed)?;
        self.total_pages += 1;
        Ok(())
    }

    /// Grows the file to at least `num_pages` pages, appending all the
    /// needed zero pages in a single write. A file that is already large
    /// enough is left untouched.
    pub fn ensure_capacity(&mut self, num_pages: PageNum) -> Result<()> {
        if self.total_pages >= num_pages {
            return Ok(());
        }

        let needed = (num_pages - self.total_pages) as usize;
        let zeros = vec![0u8; needed * PAGE_SIZE];
        self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&zeros)
            .map_err(|_| DbError::WriteFailed)?;

        self.total_pages = num_pages;
        Ok(())
    }

    /// Reads page 0.
    pub fn read_first_page(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_page(0, buf)
    }

    /// Reads the page before the cursor.
    pub fn read_previous_page(&mut self, buf: &mut [u8]) -> Result<()> {
        let prev = self
            .page_pos
            .checked_sub(1)
            .ok_or(DbError::ReadNonExistingPage(0))?;
        self.read_page(prev, buf)
    }

    /// Reads the page at the cursor.
    pub fn read_current_page(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_page(self.page_pos, buf)
    }

    /// Reads the page after the cursor.
    pub fn read_next_page(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_page(self.page_pos + 1, buf)
    }

    /// Reads the last page of the file.
    pub fn read_last_page(&mut self, buf: &mut [u8]) -> Result<()> {
        let last = self
            .total_pages
            .checked_sub(1)
            .ok_or(DbError::ReadNonExistingPage(0))?;
        self.read_page(last, buf)
    }
}
