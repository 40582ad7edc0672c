//! A single-table record store over fixed-size pages in one file.

pub mod compiler;
pub mod config;
mod cursor;
pub mod error;
pub mod pager;
pub mod row;
pub mod table;
pub mod vm;

use pager::{PAGE_SIZE, TABLE_MAX_PAGES};
use row::ROW_SIZE;

pub use config::Config;
pub use cursor::Cursor;
pub use error::{DbError, Result};
pub use row::Row;
pub use table::Table;

pub const ROWS_PER_PAGE: usize = PAGE_SIZE / ROW_SIZE;
pub const TABLE_MAX_ROWS: usize = ROWS_PER_PAGE * TABLE_MAX_PAGES;
