use std::io::Write;

use super::compiler::Statement;
use super::error::Result;
use super::row::Row;
use super::table::Table;

#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Unrecognized(String),
}

pub fn is_meta_command(line: &str) -> bool {
    line.starts_with('.')
}

pub fn do_meta_command(command: &str) -> MetaCommand {
    match command {
        ".exit" => MetaCommand::Exit,
        _ => MetaCommand::Unrecognized(command.to_owned()),
    }
}

/// Runs a prepared statement, writing any result rows to `out`.
pub fn execute_statement<W: Write>(stmt: Statement, table: &mut Table, out: &mut W) -> Result<()> {
    match stmt {
        Statement::Insert(row) => execute_insert(&row, table),
        Statement::Select => execute_select(table, out),
    }
}

fn execute_insert(row: &Row, table: &mut Table) -> Result<()> {
    table.insert(row)
}

fn execute_select<W: Write>(table: &mut Table, out: &mut W) -> Result<()> {
    for row in table.scan() {
        writeln!(out, "{}", row?)?;
    }
    Ok(())
}
