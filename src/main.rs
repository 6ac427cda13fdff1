//! symdb: inspect and maintain stored symbol indexes
//!
//! Usage:
//!   symdb inspect <index>                 Summarize an index
//!   symdb symbol <index> <usr>            Show one symbol
//!   symdb dump <index>                    Print the whole index as JSON
//!   symdb check <index>                   Verify the index decodes
//!   symdb stale <index> <header>...       Compare header mtimes
//!   symdb completions <response>          Print a completion response
//!   symdb normalize <index> <out>         Re-encode an index

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use symdb::cli::{
    check_command, completions_command, dump_command, inspect_command, normalize_command,
    stale_command, symbol_command, HeaderStatus,
};
use symdb::Config;

fn main() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env();
    setup_logging(&config);

    if args.len() < 2 {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }

    match args[1].as_str() {
        "inspect" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: symdb inspect <index>");
                return Ok(ExitCode::FAILURE);
            };
            inspect_command(path, &config)?;
        }
        "symbol" => {
            if args.len() < 4 {
                eprintln!("Usage: symdb symbol <index> <usr>");
                return Ok(ExitCode::FAILURE);
            }
            if symbol_command(&args[2], &args[3], &config)?.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        "dump" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: symdb dump <index>");
                return Ok(ExitCode::FAILURE);
            };
            dump_command(path)?;
        }
        "check" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: symdb check <index>");
                return Ok(ExitCode::FAILURE);
            };
            if !check_command(path)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        "stale" => {
            if args.len() < 4 {
                eprintln!("Usage: symdb stale <index> <header>...");
                return Ok(ExitCode::FAILURE);
            }
            let report = stale_command(&args[2], &args[3..], &config)?;
            if report.iter().any(|(_, status)| *status != HeaderStatus::Fresh) {
                return Ok(ExitCode::FAILURE);
            }
        }
        "completions" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: symdb completions <response>");
                return Ok(ExitCode::FAILURE);
            };
            completions_command(path, &config)?;
        }
        "normalize" => {
            if args.len() < 4 {
                eprintln!("Usage: symdb normalize <index> <out>");
                return Ok(ExitCode::FAILURE);
            }
            normalize_command(&args[2], &args[3], &config)?;
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "--version" | "-V" | "version" => {
            print_version();
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_usage() {
    println!(
        r#"symdb: inspect and maintain stored symbol indexes

USAGE:
    symdb <COMMAND> [ARGS]

COMMANDS:
    inspect <index>              Summarize an index
    symbol <index> <usr>         Show declarations, definition and callers of a symbol
    dump <index>                 Print the whole index as JSON
    check <index>                Verify the index decodes (exit 1 if it needs a re-index)
    stale <index> <header>...    Compare recorded header mtimes with the filesystem
    completions <response>       Print the items of a completion response
    normalize <index> <out>      Decode an index and write it back in ID order
    help                         Show this help message

ENVIRONMENT:
    SYMDB_LOG=debug              Log at DEBUG level
    SYMDB_JSON=1                 Print inspect, symbol, stale and completions as JSON
    SYMDB_BUILDER_CAPACITY=<n>   Initial encoding buffer size in bytes

EXAMPLES:
    symdb inspect build/main.c.idx
    symdb symbol build/main.c.idx "c:@F@main"
    symdb stale build/main.c.idx include/util.h
"#
    );
}

fn print_version() {
    println!("symdb {}", env!("CARGO_PKG_VERSION"));
}

fn setup_logging(config: &Config) {
    let level = if config.debug_logging {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
