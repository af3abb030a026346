//! linkpath: chain the path fragments of an SVG document.
//!
//! Reads an SVG file, merges every pair of path fragments whose endpoints
//! lie within the tolerance, and writes the rewritten document. A
//! diagnostics report goes to stderr.
//!
//! # Usage
//!
//! ```text
//! linkpath [OPTIONS] <INPUT>
//! linkpath drawing.svg -e 0.05 -u mm -o chained.svg
//! linkpath drawing.svg --id path12 --id path14
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use linkpath_engine::{ChainConfig, ChainDiagnostics, Unit};
use tracing::Level;

/// Merge disjoint path fragments of an SVG document into continuous paths.
///
/// Fragments from different `<path>` elements are linked whenever their
/// endpoints lie within the tolerance. Paths whose fragments were all
/// absorbed elsewhere are removed from the document.
#[derive(Parser)]
#[command(name = "linkpath", version)]
struct Cli {
    /// Path to the input SVG document.
    input: PathBuf,

    /// Write the chained document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Endpoint tolerance, in `--units`. Values below the minimum are raised.
    #[arg(short, long, default_value_t = ChainConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Unit of the tolerance.
    #[arg(short, long, value_enum, default_value_t = Units::Mm)]
    units: Units,

    /// Chain only the path with this id. Repeat to select several; other
    /// paths are left untouched. Without it every path is chained.
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<String>,

    /// Keep both endpoint triples at each join instead of merging them.
    #[arg(long)]
    no_snap: bool,

    /// Output diagnostics as JSON instead of the human-readable report.
    #[arg(long)]
    json: bool,

    /// Full chaining config as a JSON string.
    ///
    /// When provided, `--epsilon`, `--units` and `--no-snap` are ignored.
    /// The JSON must be a valid `ChainConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Tolerance unit selection.
#[derive(Clone, Copy, ValueEnum)]
enum Units {
    /// CSS pixels (user units).
    Px,
    /// Millimetres.
    Mm,
    /// Centimetres.
    Cm,
    /// Inches.
    In,
    /// Points.
    Pt,
    /// Picas.
    Pc,
}

impl From<Units> for Unit {
    fn from(units: Units) -> Self {
        match units {
            Units::Px => Self::Px,
            Units::Mm => Self::Mm,
            Units::Cm => Self::Cm,
            Units::In => Self::In,
            Units::Pt => Self::Pt,
            Units::Pc => Self::Pc,
        }
    }
}

/// Build a [`ChainConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored. Missing JSON fields take their defaults.
fn config_from_cli(cli: &Cli) -> Result<ChainConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ChainConfig {
        snap_ends: !cli.no_snap,
        ..ChainConfig::with_unit(cli.epsilon, cli.units.into())
    })
}

const fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbose: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print the diagnostics, keeping stdout free when it carries the document.
fn print_diagnostics(diagnostics: &ChainDiagnostics, json: bool, to_stdout: bool) -> ExitCode {
    let text = if json {
        match serde_json::to_string_pretty(diagnostics) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        diagnostics.report()
    };

    if to_stdout {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let content = match std::fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(input = %cli.input.display(), bytes = content.len(), ?config, "loaded document");

    let started = Instant::now();
    let (svg, diagnostics) = match linkpath_svg::chain_svg(&content, &config, &cli.ids) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Error chaining {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(elapsed_ms = started.elapsed().as_secs_f64() * 1000.0, "chained");

    match cli.output {
        Some(ref path) => {
            if let Err(e) = std::fs::write(path, &svg) {
                eprintln!("Error writing {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
            eprintln!("SVG written to {} ({} bytes)", path.display(), svg.len());
        }
        None => print!("{svg}"),
    }

    print_diagnostics(&diagnostics, cli.json, cli.json && cli.output.is_some())
}
