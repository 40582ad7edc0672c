use std::path::Path;

use tracing::{info, warn};

use super::cursor::Cursor;
use super::error::{DbError, Result};
use super::pager::{Pager, PAGE_SIZE};
use super::row::{Row, ROW_SIZE};
use super::{ROWS_PER_PAGE, TABLE_MAX_ROWS};

/// Location of a row inside the page space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSlot {
    pub page_num: usize,
    pub byte_offset: usize,
}

impl RowSlot {
    pub fn of(row_num: usize) -> Self {
        Self {
            page_num: row_num / ROWS_PER_PAGE,
            byte_offset: (row_num % ROWS_PER_PAGE) * ROW_SIZE,
        }
    }
}

pub struct Table {
    num_rows: usize,
    pager: Pager,
}

impl Table {
    /// Starts an empty table, discarding whatever the file held.
    pub fn create<P>(fname: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let pager = Pager::create(fname.as_ref())?;
        info!(path = %fname.as_ref().display(), "created empty table");
        Ok(Table { num_rows: 0, pager })
    }

    pub fn open_db<P>(fname: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let pager = Pager::open(fname.as_ref())?;
        let num_rows = rows_in_file(pager.file_length())?;
        info!(path = %fname.as_ref().display(), num_rows, "opened table");
        Ok(Table { num_rows, pager })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// The `ROW_SIZE` bytes holding row `row_num`, materializing its page if needed.
    pub fn row_slot(&mut self, row_num: usize) -> Result<&mut [u8]> {
        let RowSlot {
            page_num,
            byte_offset,
        } = RowSlot::of(row_num);
        let page = self.pager.get_page(page_num)?;
        Ok(&mut page[byte_offset..byte_offset + ROW_SIZE])
    }

    pub fn insert(&mut self, row: &Row) -> Result<()> {
        if self.num_rows >= TABLE_MAX_ROWS {
            warn!(id = row.id(), num_rows = self.num_rows, "table full, insert rejected");
            return Err(DbError::TableFull);
        }
        let mut cursor = Cursor::table_end(self);
        row.serialize(cursor.value()?);
        self.num_rows += 1;
        Ok(())
    }

    /// Iterates every row in insertion order.
    pub fn scan(&mut self) -> Cursor<'_> {
        Cursor::table_start(self)
    }

    /// Flushes every page holding valid rows, then closes the pager.
    pub fn close_db(self) -> Result<()> {
        let Table {
            num_rows,
            mut pager,
        } = self;
        let num_full_pages = num_rows / ROWS_PER_PAGE;
        for i in 0..num_full_pages {
            if pager.is_resident(i) {
                pager.flush(i, PAGE_SIZE)?;
                pager.release(i);
            }
        }

        let num_additional_rows = num_rows % ROWS_PER_PAGE;
        if num_additional_rows > 0 {
            let page_num = num_full_pages;
            if pager.is_resident(page_num) {
                pager.flush(page_num, num_additional_rows * ROW_SIZE)?;
                pager.release(page_num);
            }
        }

        pager.close()?;
        info!(num_rows, "closed table");
        Ok(())
    }
}

// Full pages are written with their trailing slack, so the row count is
// recovered page by page rather than as `file_length / ROW_SIZE`.
fn rows_in_file(file_length: u64) -> Result<usize> {
    let page_size = PAGE_SIZE as u64;
    let row_size = ROW_SIZE as u64;
    let tail = file_length % page_size;
    if tail % row_size != 0 {
        return Err(DbError::CorruptFile {
            file_length,
            reason: format!("trailing {} bytes do not form a whole row", tail % row_size),
        });
    }
    let num_rows = (file_length / page_size) as usize * ROWS_PER_PAGE + (tail / row_size) as usize;
    if num_rows > TABLE_MAX_ROWS {
        return Err(DbError::CorruptFile {
            file_length,
            reason: format!("{} rows exceed the table limit of {}", num_rows, TABLE_MAX_ROWS),
        });
    }
    Ok(num_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::TABLE_MAX_PAGES;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.db");
        (dir, path)
    }

    fn user(i: usize) -> Row {
        Row::new(
            i as u32,
            &format!("user{}", i),
            &format!("person{}@example.com", i),
        )
        .unwrap()
    }

    fn scan_all(table: &mut Table) -> Vec<Row> {
        table.scan().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn layout_constants() {
        assert_eq!(ROWS_PER_PAGE, 14);
        assert_eq!(TABLE_MAX_ROWS, 1400);
    }

    #[test]
    fn fresh_table_scans_empty() {
        let (_dir, path) = setup();
        let mut table = Table::create(&path).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert!(scan_all(&mut table).is_empty());
    }

    #[test]
    fn insert_then_scan_in_insertion_order() {
        let (_dir, path) = setup();
        let mut table = Table::create(&path).unwrap();
        let alice = Row::new(1, "alice", "alice@x.com").unwrap();
        let bob = Row::new(2, "bob", "bob@x.com").unwrap();
        table.insert(&alice).unwrap();
        table.insert(&bob).unwrap();
        assert_eq!(scan_all(&mut table), vec![alice, bob]);
        // a scan can be repeated
        assert_eq!(scan_all(&mut table).len(), 2);
    }

    #[test]
    fn insert_past_capacity_is_rejected() {
        let (_dir, path) = setup();
        let mut table = Table::create(&path).unwrap();
        for i in 0..TABLE_MAX_ROWS {
            table.insert(&user(i)).unwrap();
        }
        assert!(matches!(
            table.insert(&user(TABLE_MAX_ROWS)),
            Err(DbError::TableFull)
        ));
        assert_eq!(table.num_rows(), TABLE_MAX_ROWS);
        let rows = scan_all(&mut table);
        assert_eq!(rows.len(), TABLE_MAX_ROWS);
        assert_eq!(rows[TABLE_MAX_ROWS - 1], user(TABLE_MAX_ROWS - 1));
    }

    #[test]
    fn slots_do_not_overlap() {
        let mut seen = HashSet::new();
        for i in 0..TABLE_MAX_ROWS {
            let slot = RowSlot::of(i);
            assert!(slot.page_num < TABLE_MAX_PAGES);
            assert!(slot.byte_offset + ROW_SIZE <= PAGE_SIZE);
            assert!(seen.insert((slot.page_num, slot.byte_offset)));
            if i + ROWS_PER_PAGE < TABLE_MAX_ROWS {
                let next = RowSlot::of(i + ROWS_PER_PAGE);
                assert_eq!(next.page_num, slot.page_num + 1);
                assert_eq!(next.byte_offset, slot.byte_offset);
            }
        }
    }

    #[test]
    fn rows_survive_close_and_reopen() {
        let (_dir, path) = setup();
        for count in [1, ROWS_PER_PAGE, ROWS_PER_PAGE + 1, TABLE_MAX_ROWS] {
            let mut table = Table::create(&path).unwrap();
            let rows: Vec<Row> = (0..count).map(user).collect();
            for row in &rows {
                table.insert(row).unwrap();
            }
            table.close_db().unwrap();

            let mut table = Table::open_db(&path).unwrap();
            assert_eq!(table.num_rows(), count);
            assert_eq!(scan_all(&mut table), rows);
            table.close_db().unwrap();
        }
    }

    #[test]
    fn file_length_follows_page_layout() {
        let (_dir, path) = setup();
        let mut table = Table::create(&path).unwrap();
        for i in 0..ROWS_PER_PAGE + 1 {
            table.insert(&user(i)).unwrap();
        }
        table.close_db().unwrap();
        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, PAGE_SIZE + ROW_SIZE);
    }

    #[test]
    fn appends_after_reopen() {
        let (_dir, path) = setup();
        let mut table = Table::open_db(&path).unwrap();
        table.insert(&user(0)).unwrap();
        table.close_db().unwrap();

        let mut table = Table::open_db(&path).unwrap();
        table.insert(&user(1)).unwrap();
        table.close_db().unwrap();

        let mut table = Table::open_db(&path).unwrap();
        assert_eq!(scan_all(&mut table), vec![user(0), user(1)]);
    }

    #[test]
    fn unflushed_inserts_are_lost_without_close() {
        let (_dir, path) = setup();
        {
            let mut table = Table::create(&path).unwrap();
            table.insert(&user(0)).unwrap();
        }
        let table = Table::open_db(&path).unwrap();
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn partial_trailing_row_is_rejected() {
        let (_dir, path) = setup();
        std::fs::write(&path, vec![0u8; ROW_SIZE + 5]).unwrap();
        assert!(matches!(
            Table::open_db(&path),
            Err(DbError::CorruptFile { .. })
        ));
    }

    #[test]
    fn rows_in_file_accounts_for_page_slack() {
        assert_eq!(rows_in_file(0).unwrap(), 0);
        assert_eq!(rows_in_file(ROW_SIZE as u64 * 3).unwrap(), 3);
        assert_eq!(rows_in_file(PAGE_SIZE as u64).unwrap(), ROWS_PER_PAGE);
        assert_eq!(
            rows_in_file((PAGE_SIZE * TABLE_MAX_PAGES) as u64).unwrap(),
            TABLE_MAX_ROWS
        );
        assert!(rows_in_file((PAGE_SIZE * TABLE_MAX_PAGES + ROW_SIZE) as u64).is_err());
    }
}
