//! Purpose: `seqfold` CLI entry point: fold delimited text files into JSON records.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Every input file is read through a `LineSequence`, so handles close on all paths.
//! Invariants: Errors are emitted as JSON on stderr; exit code comes from `api::to_exit_code`.
//! Invariants: Diagnostics go through `tracing` on stderr; stdout carries only records.
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser as ClapParser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use seqfold::api::{Error, ErrorKind, Line, Sequence, lines, to_exit_code};
use seqfold::parsers::{DelimitedParser, Parser};

#[derive(ClapParser)]
#[command(
    name = "seqfold",
    version,
    about = "Fold delimited text files into JSON records",
    after_help = r#"EXAMPLES
  $ seqfold parse --header events.tsv
  $ seqfold parse --field-names ts,user,tags --list-delimiter , events.tsv
  $ seqfold count events.tsv"#
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse each line into a JSON object (one per line on stdout)
    Parse(ParseArgs),
    /// Count lines
    Count {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
}

#[derive(Args)]
struct ParseArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    path: PathBuf,
    #[arg(short, long, help = "Field delimiter (default: tab)")]
    delimiter: Option<String>,
    #[arg(long, help = "List delimiter inside a field (default: Ctrl-A)")]
    list_delimiter: Option<String>,
    #[arg(
        long,
        conflicts_with = "field_names",
        help = "Treat the first line as a header"
    )]
    header: bool,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated field names"
    )]
    field_names: Option<Vec<String>>,
    #[arg(long, help = "Stop after N records (header excluded)")]
    limit: Option<usize>,
}

/// Resolved settings for one `parse` run.
#[derive(Clone, Debug)]
struct ParseConfig {
    path: PathBuf,
    delimiter: Option<String>,
    list_delimiter: Option<String>,
    header: bool,
    field_names: Option<Vec<String>>,
    limit: Option<usize>,
}

impl From<ParseArgs> for ParseConfig {
    fn from(args: ParseArgs) -> Self {
        Self {
            path: args.path,
            delimiter: args.delimiter,
            list_delimiter: args.list_delimiter,
            header: args.header,
            field_names: args.field_names,
            limit: args.limit,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run(std::env::args_os()) {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run<I>(args: I) -> Result<RunOutcome, Error>
where
    I: IntoIterator<Item = OsString>,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `seqfold --help` for usage."));
            }
        },
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.command {
        Command::Parse(args) => {
            run_parse(ParseConfig::from(args), &mut out)?;
        }
        Command::Count { path } => {
            let count = run_count(&path, &mut out)?;
            tracing::debug!(lines = count, path = %path.display(), "count complete");
        }
    }
    out.flush().map_err(stdout_error)?;
    Ok(RunOutcome::ok())
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

fn stdout_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write stdout")
        .with_source(err)
}

/// Parses every line of the input and writes one JSON object per record.
///
/// Returns the number of records written.
fn run_parse<W: Write>(config: ParseConfig, out: &mut W) -> Result<u64, Error> {
    let mut parser = DelimitedParser::new(
        config.delimiter.as_deref(),
        config.list_delimiter.as_deref(),
    )?;
    if let Some(names) = config.field_names.clone() {
        parser.set_field_names(names)?;
    }

    let input = lines(&config.path);
    let mut header_pending = config.header;
    let path = config.path.clone();
    let mut write_record = |written: u64, line: Line| -> Result<u64, Error> {
        if header_pending {
            header_pending = false;
            parser
                .set_header_bytes(line.as_bytes())
                .map_err(|err| err.with_path(&path).with_line(line.number))?;
            return Ok(written);
        }
        let record = parser
            .parse_bytes(line.as_bytes())
            .map_err(|err| err.with_path(&path).with_line(line.number))?;
        serde_json::to_writer(&mut *out, &record).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode record")
                .with_source(err)
        })?;
        out.write_all(b"\n").map_err(stdout_error)?;
        Ok(written + 1)
    };

    // The header line is input but not a record.
    let written = match config.limit {
        Some(limit) => {
            let lines_needed = limit.saturating_add(usize::from(config.header));
            input.limit(lines_needed).accumulate(0, &mut write_record)?
        }
        None => input.accumulate(0, &mut write_record)?,
    };
    tracing::debug!(records = written, path = %config.path.display(), "parse complete");
    Ok(written)
}

/// Writes `{"lines":N}` for the file at `path` and returns `N`.
fn run_count<W: Write>(path: &Path, out: &mut W) -> Result<u64, Error> {
    let count_line = |count: u64, _line: Line| -> Result<u64, Error> { Ok(count + 1) };
    let count = lines(path).accumulate(0, count_line)?;
    serde_json::to_writer(&mut *out, &json!({ "lines": count })).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode count")
            .with_source(err)
    })?;
    out.write_all(b"\n").map_err(stdout_error)?;
    Ok(count)
}

fn emit_error(err: &Error) {
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("unexpected error")),
    );
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}
