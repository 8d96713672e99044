mod debug_report;

use clap::{Parser as _, ValueEnum};
use linefsm::{Emitter, Options, Record, Template, parse_verbose_with, split_field};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse semi-structured text into records with a state-machine template.
#[derive(Debug, clap::Parser)]
#[command(name = "linefsm", version, about)]
struct Cli {
    /// Template file.
    #[arg(short, long)]
    template: PathBuf,

    /// Input file. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Split FIELD into a list on DELIM (default ','). Repeatable.
    #[arg(long, value_name = "FIELD[=DELIM]")]
    split: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,

    /// Do not commit the implicit record at end of input.
    #[arg(long)]
    no_eof: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Pretty-printed JSON array of records.
    Json,
    /// Aligned columns, one row per record.
    Table,
    /// Run report with per-line trace and timings.
    Report,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] linefsm::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Engine(linefsm::Error::Template(_) | linefsm::Error::Parse(_)) => 1,
            CliError::Json(_) => 1,
            CliError::Engine(linefsm::Error::Io { .. }) | CliError::Stdin(_) | CliError::Usage(_) => 2,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let template = Template::from_file(&cli.template)?;
    let input = read_input(cli.input.as_deref())?;
    let emitter = build_emitter(&cli.split)?;

    let options = Options { eof: !cli.no_eof, trace: cli.format == Format::Report };
    let res = parse_verbose_with(&template, &input, &options, &emitter).map_err(linefsm::Error::from)?;

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&res.records)?),
        Format::Table => print_table(&res.header, &res.records),
        Format::Report => {
            let color = if cli.color {
                true
            } else if cli.no_color {
                false
            } else {
                io::stdout().is_terminal()
            };
            debug_report::print_run(&cli.template, &template, &res, color);
        }
    }
    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|source| linefsm::Error::Io { path: path.to_path_buf(), source }.into()),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Stdin)?;
            Ok(buffer)
        }
    }
}

fn build_emitter(specs: &[String]) -> Result<Emitter, CliError> {
    let mut emitter = Emitter::new();
    for spec in specs {
        let (field, delimiter) = spec.split_once('=').unwrap_or((spec.as_str(), ","));
        if field.is_empty() || delimiter.is_empty() {
            return Err(CliError::Usage(format!("invalid --split '{spec}' (expected FIELD[=DELIM])")));
        }
        emitter.push(split_field(field, delimiter));
    }
    Ok(emitter)
}

fn print_table(header: &[String], records: &[Record]) {
    let rows: Vec<Vec<String>> =
        records.iter().map(|r| r.to_row().into_iter().map(|v| v.to_string()).collect()).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells.iter().zip(&widths).map(|(c, &w)| format!("{c:<w$}")).collect();
        println!("{}", padded.join("  ").trim_end());
    };
    line(header);
    line(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>());
    for row in &rows {
        line(row);
    }
}
