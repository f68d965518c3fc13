#![allow(clippy::doc_markdown)]
//! `SimGram` CLI - build and query approximate string databases
//!
//! Usage:
//!   `simgram build ./names.db --input names.txt`
//!   `simgram query ./names.db "Barack Obama" -s cosine -t 0.6`
//!   `simgram info ./names.db`

mod import;
mod query;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use simgram_core::{Database, LoggingConfig, Measure, SimgramConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "simgram")]
#[command(
    author,
    version,
    about = "SimGram CLI - approximate string retrieval over n-gram indexes"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./simgram.toml when present)
    #[arg(long, global = true, env = "SIMGRAM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// CLI measure option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeasureArg {
    Exact,
    Dice,
    Cosine,
    Jaccard,
    Overlap,
}

impl From<MeasureArg> for Measure {
    fn from(m: MeasureArg) -> Self {
        match m {
            MeasureArg::Exact => Measure::Exact,
            MeasureArg::Dice => Measure::Dice,
            MeasureArg::Cosine => Measure::Cosine,
            MeasureArg::Jaccard => Measure::Jaccard,
            MeasureArg::Overlap => Measure::Overlap,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or extend a database from strings, one per line
    Build {
        /// Path to database directory
        path: PathBuf,

        /// Input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Characters per n-gram
        #[arg(short = 'n', long)]
        ngram_size: Option<usize>,

        /// Do not pad strings with boundary markers
        #[arg(long)]
        no_pad: bool,

        /// Fold case before extracting n-grams
        #[arg(long)]
        case_insensitive: bool,

        /// Suppress the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Retrieve similar strings for each query
    Query {
        /// Path to database directory
        path: PathBuf,

        /// Queries (reads stdin, one per line, when omitted)
        queries: Vec<String>,

        /// Similarity measure
        #[arg(short = 's', long, value_enum)]
        measure: Option<MeasureArg>,

        /// Similarity threshold in (0, 1]
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Print each query before its matches
        #[arg(short, long)]
        echo: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print only match counts and timings
        #[arg(short = 'p', long)]
        benchmark: bool,
    },

    /// Show database statistics
    Info {
        /// Path to database directory
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Build {
            path,
            input,
            ngram_size,
            no_pad,
            case_insensitive,
            quiet,
        } => {
            let mut options = config.index_options();
            if let Some(n) = ngram_size {
                options.ngram_size = n;
            }
            if no_pad {
                options.pad = false;
            }
            if case_insensitive {
                options.case_insensitive = true;
            }

            let reader: Box<dyn BufRead> = match input {
                Some(file) => Box::new(BufReader::new(
                    File::open(&file).with_context(|| format!("cannot read {}", file.display()))?,
                )),
                None => Box::new(io::stdin().lock()),
            };
            let mut db = Database::open_writer(&path, &options)
                .with_context(|| format!("cannot open {} for writing", path.display()))?;

            // Lines before a failing one are committed either way
            let imported = import::insert_lines(&mut db, reader);
            db.close()?;
            let stats = imported?;

            if !quiet {
                writeln!(
                    out,
                    "Inserted {} strings into {} ({:.1} ms, {:.0} strings/sec)",
                    stats.inserted,
                    path.display(),
                    stats.duration_ms(),
                    stats.strings_per_sec()
                )?;
            }
        }
        Commands::Query {
            path,
            queries,
            measure,
            threshold,
            echo,
            format,
            benchmark,
        } => {
            let measure = measure.map_or(config.search.measure, Measure::from);
            let threshold = threshold.unwrap_or(config.search.threshold);
            let db = open_reader(&path)?;
            let style = query::Style {
                echo,
                json: format == OutputFormat::Json,
                benchmark,
            };

            if queries.is_empty() {
                for line in io::stdin().lock().lines() {
                    let line = line?;
                    query::run(&db, &line, measure, threshold, style, &mut out)?;
                }
            } else {
                for q in &queries {
                    query::run(&db, q, measure, threshold, style, &mut out)?;
                }
            }
        }
        Commands::Info { path, format } => {
            let db = open_reader(&path)?;
            let stats = db.stats()?;
            match format {
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &stats)?;
                    writeln!(out)?;
                }
                OutputFormat::Text => {
                    writeln!(out, "SimGram Database: {}", path.display())?;
                    writeln!(out, "  Strings:          {}", stats.string_count)?;
                    writeln!(out, "  Length buckets:   {}", stats.bucket_count)?;
                    match stats.max_bucket {
                        Some(max) => writeln!(out, "  Largest bucket:   {max}")?,
                        None => writeln!(out, "  Largest bucket:   -")?,
                    }
                    writeln!(out, "  N-gram size:      {}", stats.ngram_size)?;
                    writeln!(out, "  Padding:          {}", stats.pad)?;
                    writeln!(out, "  Case-insensitive: {}", stats.case_insensitive)?;
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimgramConfig> {
    let config = match path {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            SimgramConfig::load_from_path(path)?
        }
        None => SimgramConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn open_reader(path: &Path) -> anyhow::Result<Database> {
    Database::open_reader(path).with_context(|| format!("cannot open {}", path.display()))
}
