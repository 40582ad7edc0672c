//! Error types for the storage engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tried to fetch page number out of bounds. {page_num} >= {max_pages}")]
    PageOutOfBounds { page_num: usize, max_pages: usize },

    #[error("Tried to flush null page {0}")]
    PageNotResident(usize),

    #[error("Error: Table full.")]
    TableFull,

    #[error("Corrupt database file ({file_length} bytes): {reason}")]
    CorruptFile { file_length: u64, reason: String },
}
