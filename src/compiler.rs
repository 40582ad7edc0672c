use thiserror::Error;

use super::row::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Rejections raised before a statement reaches the table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    UsernameTooLong,
    #[error("String is too long.")]
    EmailTooLong,
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,
    #[error("Unrecognized command '{0}'")]
    UnrecognizedStatement(String),
}

/// Validates the typed fields of an insert and builds the row to store.
pub fn prepare_insert(id: i64, username: &str, email: &str) -> Result<Row, PrepareError> {
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;
    Row::new(id, username, email)
}

fn parse_insert(args: &[&str]) -> Result<Statement, PrepareError> {
    let [_, id, username, email] = args else {
        return Err(PrepareError::SyntaxError);
    };
    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    prepare_insert(id, username, email).map(Statement::Insert)
}

pub fn prepare_statement(command: &str) -> Result<Statement, PrepareError> {
    let args: Vec<_> = command.split_whitespace().collect();
    match args.first() {
        Some(&"insert") => parse_insert(&args),
        Some(&"select") => Ok(Statement::Select),
        _ => Err(PrepareError::UnrecognizedStatement(command.to_owned())),
    }
}
