//! recscan CLI - NCSA access log tokenizer
//!
//! Reads an access log, tokenizes it field by field, and reprints each
//! record in canonical form. Malformed lines are reported on stderr and
//! skipped; tokenization resumes at the next line.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{info, Level};

mod config;
mod logging;
mod ncsa;

use crate::config::{parse_log_level, read_project_config, LogConfig, ProjectConfig};
use crate::logging::LogFormat;
use recscan_core::{spawn, Lexer, TokenKind};

const TARGET: &str = "recscan::cli";

#[derive(Parser)]
#[command(
    name = "recscan",
    about = "Tokenize NCSA access logs and reprint them in canonical form",
    version = "0.1.0"
)]
struct Cli {
    /// Access log file to tokenize
    #[arg(value_name = "LOG")]
    input: PathBuf,

    /// Optional JSON config file overriding the defaults below
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Buffer size hint in bytes
    #[arg(long, default_value_t = 8192)]
    buflen: usize,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Dump the raw token stream as JSON instead of reformatting
    #[arg(long)]
    dump_tokens: bool,
}

fn main() {
    let cli = Cli::parse();

    let project = match &cli.config {
        Some(path) => match read_project_config(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => ProjectConfig::default(),
    };

    let level = resolve_log_level(&cli, &project);
    let log_config = LogConfig {
        global: level,
        ..LogConfig::default()
    };
    logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_ref());

    let buflen = project.buflen.unwrap_or(cli.buflen);
    let dump_tokens = cli.dump_tokens || project.dump_tokens.unwrap_or(false);

    let file = match File::open(&cli.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: cannot open '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let name = cli.input.display().to_string();
    let lexer = match Lexer::new(&name, BufReader::new(file), ncsa::record(buflen)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    info!(target: TARGET, input = %name, buflen, "tokenizing");

    let had_errors = if dump_tokens {
        dump_token_stream(lexer)
    } else {
        reformat(lexer, &name)
    };
    if had_errors {
        process::exit(1);
    }
}

/// Pick the log level: project config wins over the command line flag.
fn resolve_log_level(cli: &Cli, project: &ProjectConfig) -> Level {
    if let Some(s) = &project.log_level {
        if let Some(level) = parse_log_level(s) {
            return level;
        }
        eprintln!("Warning: unknown log level '{}', using '{}'", s, cli.log_level);
    }
    parse_log_level(&cli.log_level).unwrap_or(Level::WARN)
}

/// Reprint each record as a canonical NCSA line on stdout.
fn reformat(lexer: Lexer<ncsa::NcsaField>, name: &str) -> bool {
    let mut stream = spawn(lexer);
    let mut formatter = ncsa::LineFormatter::new();
    let mut had_errors = false;

    while let Some(token) = stream.next_token() {
        match &token.kind {
            TokenKind::EndOfInput => break,
            TokenKind::Error => {
                eprintln!("{} at {}:{}", token.text, name, token.pos);
                formatter.clear();
                had_errors = true;
            }
            _ => {
                if let Some(line) = formatter.push(&token) {
                    println!("{}", line);
                }
            }
        }
    }
    info!(target: TARGET, last_pos = stream.last_pos(), "done");
    had_errors
}

/// Print the raw token stream as pretty JSON.
fn dump_token_stream(lexer: Lexer<ncsa::NcsaField>) -> bool {
    let tokens: Vec<_> = spawn(lexer).collect();
    let had_errors = tokens.iter().any(|t| t.kind.is_error());
    println!("{}", serde_json::to_string_pretty(&tokens).unwrap());
    had_errors
}
