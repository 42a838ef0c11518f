// tally CLI - reconcile two CSV tables by key

mod exit_codes;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tally_recon::config::{
    delimiter_byte, ColumnMapping, ComparisonSettings, ReconConfig, TableSource,
};
use tally_recon::engine::{load_csv_table, run, ReconInput};
use tally_recon::model::{ReconResult, RowKind, Side, Table};
use tally_recon::ReconError;

use exit_codes::{
    EXIT_DIFFERENCES, EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_OUTPUT, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Reconcile two CSV tables by key")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only: no summary line, no warnings
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation described by a TOML config file
    #[command(after_help = "\
Examples:
  tally run invoices.recon.toml
  tally run invoices.recon.toml --json | jq .summary
  tally run invoices.recon.toml -f csv -o report.csv
  tally run invoices.recon.toml --json --only different,missing_in_source

Exit codes: 0 clean, 1 differences, 2 usage, 3 invalid config, 4 input, 5 output")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reconcile two CSV files directly, without a config file
    #[command(after_help = "\
Examples:
  tally compare invoices.csv ledger.csv --key invoice_id=ref --map amount=total
  tally compare a.csv b.csv --key id --map amount --map status --ignore-case
  tally compare a.csv b.csv --map id --map amt --precision 0 -f csv
  tally compare a.tsv b.tsv --delimiter $'\\t' --key id --map total")]
    Compare {
        /// Source table (CSV with a header row)
        source: PathBuf,

        /// Compare table (CSV with a header row)
        compare: PathBuf,

        /// Join-key column pair. Repeatable; order defines the key layout.
        #[arg(long, value_name = "SRC=CMP")]
        key: Vec<String>,

        /// Compared column pair. Repeatable. NAME alone maps a shared column name.
        /// With no --key, every --map pair is part of the key.
        #[arg(long, value_name = "SRC=CMP")]
        map: Vec<String>,

        /// Decimal places numbers are rounded to; tolerance is 10^-N
        #[arg(long, default_value_t = 2, env = "TALLY_PRECISION")]
        precision: u32,

        /// Compare text case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Keep leading/trailing whitespace significant
        #[arg(long)]
        no_trim: bool,

        /// Field delimiter for both files
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Name recorded in the report metadata
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check a config file and the headers of the files it names
    #[command(after_help = "\
Examples:
  tally validate invoices.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Print the JSON report to stdout (same as --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Report format; printed to stdout unless --output is given
    #[arg(long, short = 'f')]
    format: Option<ReportFormat>,

    /// Write the report to a file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Keep only rows of these kinds. Repeatable; comma-separated accepted.
    /// Without --format or --output, prints the JSON report to stdout.
    #[arg(long, value_name = "KIND", value_delimiter = ',')]
    only: Vec<RowKind>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Json,
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run { config, output } => cmd_run(config, output, cli.quiet),
        Commands::Compare {
            source,
            compare,
            key,
            map,
            precision,
            ignore_case,
            no_trim,
            delimiter,
            name,
            output,
        } => {
            let settings = ComparisonSettings {
                numeric_precision: precision,
                ignore_case,
                trim_whitespace: !no_trim,
            };
            cmd_compare(source, compare, key, map, settings, delimiter, name, output, cli.quiet)
        }
        Commands::Validate { config } => cmd_validate(config, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    /// Reconciliation finished but was not clean. The summary already said why.
    pub fn differences() -> Self {
        Self { code: EXIT_DIFFERENCES, message: String::new(), hint: None }
    }

    /// Map an engine error. Mapping problems exit with `mapping_code`, since
    /// they are config errors under `run` and usage errors under `compare`.
    pub fn recon(err: ReconError, mapping_code: u8) -> Self {
        let code = match &err {
            ReconError::Csv(_) | ReconError::Io(_) => EXIT_INPUT,
            ReconError::EmptyMapping | ReconError::UnknownColumn { .. } => mapping_code,
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        };
        Self { code, message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(config_path: PathBuf, output: OutputArgs, quiet: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let (source, compare) = load_config_tables(&config_path, &config)?;
    check_columns(&config.mapping, &source, &compare, EXIT_INVALID_CONFIG)?;

    let input = ReconInput {
        name: config.name.clone(),
        source,
        compare,
    };
    let result = run(&input, &config.mapping, &config.settings);
    finish(&result, &output, quiet)
}

// ============================================================================
// compare
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    source_path: PathBuf,
    compare_path: PathBuf,
    keys: Vec<String>,
    maps: Vec<String>,
    settings: ComparisonSettings,
    delimiter: char,
    name: Option<String>,
    output: OutputArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let mapping = build_mapping(&keys, &maps)?;
    let delimiter = delimiter_byte(delimiter).map_err(|e| CliError::usage(e.to_string()))?;

    let source = load_table(&source_path, delimiter)?;
    let compare = load_table(&compare_path, delimiter)?;
    check_columns(&mapping, &source, &compare, EXIT_USAGE)?;

    let name = name.unwrap_or_else(|| {
        format!("{} vs {}", file_label(&source_path), file_label(&compare_path))
    });
    let input = ReconInput { name, source, compare };
    let result = run(&input, &mapping, &settings);
    finish(&result, &output, quiet)
}

/// `--key` pairs first, then `--map` pairs, each in command-line order.
fn build_mapping(keys: &[String], maps: &[String]) -> Result<ColumnMapping, CliError> {
    if keys.is_empty() && maps.is_empty() {
        return Err(CliError::usage("no columns to compare")
            .with_hint("pass at least one --key SRC=CMP or --map SRC=CMP"));
    }

    let mut mapping = ColumnMapping::new();
    for arg in keys {
        let (src, cmp) = parse_pair(arg)?;
        mapping.insert_key(src, cmp);
    }
    for arg in maps {
        let (src, cmp) = parse_pair(arg)?;
        if mapping.iter().any(|p| p.key && p.source_column == src) {
            return Err(CliError::usage(format!("column '{src}' given as both --key and --map"))
                .with_hint("key columns are compared too; drop the --map entry"));
        }
        mapping.insert(src, cmp);
    }
    Ok(mapping)
}

/// `SRC=CMP`, or `NAME` for a column named the same in both tables.
fn parse_pair(arg: &str) -> Result<(String, String), CliError> {
    let (src, cmp) = match arg.split_once('=') {
        Some((src, cmp)) => (src.trim(), cmp.trim()),
        None => (arg.trim(), arg.trim()),
    };
    if src.is_empty() || cmp.is_empty() {
        return Err(CliError::usage(format!("invalid column pair '{arg}'"))
            .with_hint("use SRC=CMP, or NAME when both tables share the column name"));
    }
    Ok((src.to_string(), cmp.to_string()))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: PathBuf, quiet: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let (source, compare) = load_config_tables(&config_path, &config)?;
    check_columns(&config.mapping, &source, &compare, EXIT_INVALID_CONFIG)?;

    if !quiet {
        eprintln!(
            "{}: ok ({} mapped columns, {} key columns, {} source rows, {} compare rows)",
            config.name,
            config.mapping.len(),
            config.mapping.key_pairs().count(),
            source.row_count(),
            compare.row_count(),
        );
    }
    Ok(())
}

// ============================================================================
// shared
// ============================================================================

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::input(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&text).map_err(|e| {
        let err = CliError::config(format!("{}: {e}", path.display()));
        match e {
            ReconError::EmptyMapping => {
                err.with_hint("add [[mapping]] entries with source and compare columns")
            }
            _ => err,
        }
    })
}

/// Load both tables named by `config`; paths resolve against the config file's directory.
fn load_config_tables(
    config_path: &Path,
    config: &ReconConfig,
) -> Result<(Table, Table), CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let load = |table_source: &TableSource| -> Result<Table, CliError> {
        let delimiter = table_source
            .delimiter_byte()
            .map_err(|e| CliError::recon(e, EXIT_INVALID_CONFIG))?;
        load_table(&base_dir.join(&table_source.file), delimiter)
    };
    Ok((load(&config.source)?, load(&config.compare)?))
}

fn load_table(path: &Path, delimiter: u8) -> Result<Table, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::input(format!("cannot read {}: {e}", path.display())))?;
    let table = load_csv_table(&data, delimiter)
        .map_err(|e| CliError::input(format!("{}: {e}", path.display())))?;
    log::info!("{}: {} columns, {} rows", path.display(), table.headers.len(), table.row_count());
    Ok(table)
}

fn check_columns(
    mapping: &ColumnMapping,
    source: &Table,
    compare: &Table,
    code: u8,
) -> Result<(), CliError> {
    mapping.validate_against(source, compare).map_err(|e| {
        let hint = match &e {
            ReconError::UnknownColumn { side, .. } => {
                let table = match side {
                    Side::Source => source,
                    Side::Compare => compare,
                };
                Some(format!("{side} columns: {}", table.headers.join(", ")))
            }
            _ => None,
        };
        let err = CliError::recon(e, code);
        match hint {
            Some(hint) => err.with_hint(hint),
            None => err,
        }
    })
}

/// Write the report, print the summary, and turn an unclean result into exit 1.
fn finish(result: &ReconResult, args: &OutputArgs, quiet: bool) -> Result<(), CliError> {
    let format = if args.json {
        ReportFormat::Json
    } else {
        args.format.unwrap_or(ReportFormat::Json)
    };
    let to_stdout = args.json
        || (args.output.is_none() && (args.format.is_some() || !args.only.is_empty()));

    if args.output.is_some() || to_stdout {
        let text = match format {
            ReportFormat::Json => report::format_json(result, &args.only),
            ReportFormat::Csv => report::format_csv(result, &args.only),
        }
        .map_err(CliError::output)?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &text)
                .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
            if !quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if to_stdout {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
    }

    if !quiet {
        eprintln!("{}", report::human_summary(result));
        if !result.duplicates.is_empty() {
            let dropped: usize = result.duplicates.iter().map(|d| d.rows - 1).sum();
            eprintln!(
                "note: {} duplicate keys, {} rows superseded (last row per key kept)",
                result.duplicates.len(),
                dropped,
            );
        }
    }

    if result.summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::differences())
    }
}
