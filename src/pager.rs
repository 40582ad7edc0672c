use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use bytes::BytesMut;
use tracing::debug;

use super::error::{DbError, Result};

pub const PAGE_SIZE: usize = 4096;
pub const TABLE_MAX_PAGES: usize = 100;

pub type Page = BytesMut;

/// Fixed array of page slots over a single backing file.
///
/// A slot is either unmaterialized (`None`) or resident. Slots are never
/// evicted; a resident buffer lives until it is released by the table's
/// close pass or the pager is dropped.
pub struct Pager {
    file_handle: File,
    file_length: u64,
    pages: [Option<Page>; TABLE_MAX_PAGES],
}

impl Pager {
    /// Opens the file for read/write, creating it if it does not exist.
    pub fn open<P>(fname: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file_handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(fname)?;
        Self::with_file(file_handle)
    }

    /// Opens the file for read/write, discarding any existing content.
    pub fn create<P>(fname: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file_handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(fname)?;
        Self::with_file(file_handle)
    }

    fn with_file(file_handle: File) -> Result<Self> {
        let file_length = file_handle.metadata()?.len();
        const INIT_PAGE: Option<Page> = None;
        Ok(Self {
            file_handle,
            file_length,
            pages: [INIT_PAGE; TABLE_MAX_PAGES],
        })
    }

    /// Byte length of the backing file when it was opened.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Number of pages, full or partial, present in the file at open time.
    pub fn num_file_pages(&self) -> usize {
        let page_size = PAGE_SIZE as u64;
        ((self.file_length + page_size - 1) / page_size) as usize
    }

    pub fn is_resident(&self, page_num: usize) -> bool {
        self.pages.get(page_num).map_or(false, Option::is_some)
    }

    pub fn get_page(&mut self, page_num: usize) -> Result<&mut [u8]> {
        if page_num >= TABLE_MAX_PAGES {
            return Err(DbError::PageOutOfBounds {
                page_num,
                max_pages: TABLE_MAX_PAGES,
            });
        }
        let num_file_pages = self.num_file_pages();
        let page = match &mut self.pages[page_num] {
            Some(page) => page,
            slot => slot.insert(load_page(
                &mut self.file_handle,
                page_num,
                num_file_pages,
            )?),
        };
        Ok(&mut page[..])
    }

    /// Writes the first `page_size` bytes of a resident page to its slot in the file.
    pub fn flush(&mut self, page_num: usize, page_size: usize) -> Result<()> {
        let page = self
            .pages
            .get(page_num)
            .and_then(Option::as_ref)
            .ok_or(DbError::PageNotResident(page_num))?;
        let len = page_size.min(PAGE_SIZE);
        self.file_handle
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file_handle.write_all(&page[..len])?;
        debug!(page_num, bytes = len, "flushed page");
        Ok(())
    }

    /// Drops the in-memory buffer of a page without writing it.
    pub fn release(&mut self, page_num: usize) {
        if let Some(slot) = self.pages.get_mut(page_num) {
            *slot = None;
        }
    }

    /// Releases the file handle and every resident buffer. Nothing is flushed.
    pub fn close(mut self) -> Result<()> {
        self.file_handle.flush()?;
        let resident = self.pages.iter().filter(|p| p.is_some()).count();
        debug!(resident, "closing pager");
        Ok(())
    }
}

fn load_page(file: &mut File, page_num: usize, num_file_pages: usize) -> Result<Page> {
    let mut page = BytesMut::zeroed(PAGE_SIZE);
    // the final page of the file may be partial, so short reads are expected
    if page_num < num_file_pages {
        file.seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        let read = read_up_to(file, &mut page[..])?;
        debug!(page_num, bytes = read, "loaded page from disk");
    } else {
        debug!(page_num, "allocated empty page");
    }
    Ok(page)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
