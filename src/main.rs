use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use litedb::compiler::prepare_statement;
use litedb::config::{DEFAULT_LOG_FILTER, DEFAULT_PROMPT};
use litedb::vm::{do_meta_command, execute_statement, is_meta_command, MetaCommand};
use litedb::{Config, DbError, Result, Table};
use tracing_subscriber::{fmt, EnvFilter};

/// Interactive shell over a single-table paged record store
#[derive(Parser, Debug)]
#[command(name = "litedb")]
#[command(version)]
struct Args {
    /// Database file, created if missing
    filename: PathBuf,

    /// Prompt printed before each input line
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::builder()
        .db_path(args.filename)
        .prompt(args.prompt)
        .log_filter(args.log_level)
        .build();

    // logs go to stderr so stdout stays a clean transcript
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    let mut table = Table::open_db(&config.db_path)?;
    let session = repl(config, &mut table);
    // rows acknowledged before a failure are still written out
    let closed = table.close_db();
    session.and(closed)
}

fn repl(config: &Config, table: &mut Table) -> Result<()> {
    let mut input = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut buffer = Vec::new();

    loop {
        write!(stdout, "{}", config.prompt)?;
        stdout.flush()?;

        buffer.clear();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buffer);
        let command = line.trim_end_matches(&['\r', '\n'][..]);

        if is_meta_command(command) {
            match do_meta_command(command) {
                MetaCommand::Exit => return Ok(()),
                MetaCommand::Unrecognized(command) => {
                    writeln!(stdout, "Unrecognized command '{}'", command)?;
                    continue;
                }
            }
        }

        let stmt = match prepare_statement(command) {
            Ok(stmt) => stmt,
            Err(e) => {
                writeln!(stdout, "{}", e)?;
                continue;
            }
        };

        match execute_statement(stmt, table, &mut stdout) {
            Ok(()) => writeln!(stdout, "Executed.")?,
            Err(DbError::TableFull) => writeln!(stdout, "{}", DbError::TableFull)?,
            Err(e) => return Err(e),
        }
    }
}
