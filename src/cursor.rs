use super::error::Result;
use super::row::Row;
use super::table::Table;

/// A position in the table, walking rows by number.
pub struct Cursor<'a> {
    table: &'a mut Table,
    pub row_num: usize,
    pub end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub fn table_start(table: &'a mut Table) -> Self {
        let end_of_table = table.num_rows() == 0;
        Self {
            table,
            row_num: 0,
            end_of_table,
        }
    }

    pub fn table_end(table: &'a mut Table) -> Self {
        let row_num = table.num_rows();
        Self {
            table,
            row_num,
            end_of_table: true,
        }
    }

    pub fn value(&mut self) -> Result<&mut [u8]> {
        self.table.row_slot(self.row_num)
    }

    pub fn advance(&mut self) {
        self.row_num += 1;
        if self.row_num >= self.table.num_rows() {
            self.end_of_table = true;
        }
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_of_table {
            return None;
        }
        let row = self.value().map(|buf| Row::deserialize(buf));
        if row.is_err() {
            self.end_of_table = true;
        } else {
            self.advance();
        }
        Some(row)
    }
}
