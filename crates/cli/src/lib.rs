//! `ecu-ident` command line: build a corpus index and identify firmware
//! uploads against it.

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{AppConfig, ConfigOverrides};
use ecu_ident_indexer::{CorpusBuilder, CorpusIndex};
use ecu_ident_protocol::{serialize_json, serialize_json_pretty, ErrorEnvelope};
use ecu_ident_search::{IdentificationEngine, SearchError};
use report::{BinarySummary, HashLookup, IndexSummary};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod report;

const EXIT_USER_ERROR: u8 = 2;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_output<T: Serialize>(value: &T, json: bool, render: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        print_stdout(&serialize_json_pretty(value)?)
    } else {
        print_stdout(&render(value))
    }
}

#[derive(Parser)]
#[command(name = "ecu-ident")]
#[command(about = "Identify ECU firmware images against a corpus of calibration descriptions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Corpus root (overrides ECU_IDENT_DATA_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Fixed chunk size in bytes
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Rolling k-gram window in bytes
    #[arg(long, global = true)]
    kgram_k: Option<usize>,

    /// Rolling k-gram stride in bytes
    #[arg(long, global = true)]
    kgram_step: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root: self.root.clone(),
            chunk_size: self.chunk_size,
            kgram_k: self.kgram_k,
            kgram_step: self.kgram_step,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the corpus and print index statistics
    Index(JsonArgs),

    /// Rank candidate descriptions for a firmware image
    Identify(IdentifyArgs),

    /// List indexed description files and their signals
    Descriptions(JsonArgs),

    /// List indexed binaries with their associated descriptions
    Binaries(JsonArgs),

    /// Look up descriptions linked to a binary content hash
    #[command(name = "find-hash")]
    FindHash(FindHashArgs),
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Index(args) | Commands::Descriptions(args) | Commands::Binaries(args) => {
                args.json
            }
            Commands::Identify(args) => args.json,
            Commands::FindHash(args) => args.json,
        }
    }
}

#[derive(Args)]
struct JsonArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IdentifyArgs {
    /// Firmware image to identify
    file: PathBuf,

    /// Upload filename used for name matching (defaults to the file name)
    #[arg(long)]
    name: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindHashArgs {
    /// Hex SHA-1 of a binary image
    hash: String,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn init_logger(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || cli.command.json() {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

pub async fn main_entry() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(&cli);

    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())?;
    log::debug!("Effective configuration: {}", serialize_json(&config)?);

    let corpus = Arc::new(build_corpus(&config).await);

    match cli.command {
        Commands::Index(args) => {
            let summary = IndexSummary::from_corpus(&corpus);
            print_output(&summary, args.json, report::render_index)?;
        }
        Commands::Identify(args) => return run_identify(args, corpus, &config).await,
        Commands::Descriptions(args) => {
            print_output(&corpus.descriptions(), args.json, |entries| {
                report::render_descriptions(entries)
            })?;
        }
        Commands::Binaries(args) => {
            let rows: Vec<BinarySummary> = corpus.binaries().iter().map(Into::into).collect();
            print_output(&rows, args.json, |rows| report::render_binaries(rows))?;
        }
        Commands::FindHash(args) => {
            let content_hash = args.hash.trim().to_ascii_lowercase();
            let descriptions = corpus
                .find_by_content_hash(&content_hash)
                .iter()
                .map(|p| report::display_path(p))
                .collect();
            let lookup = HashLookup {
                content_hash,
                descriptions,
            };
            print_output(&lookup, args.json, report::render_hash_lookup)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn build_corpus(config: &AppConfig) -> CorpusIndex {
    CorpusBuilder::unconfigured()
        .root(config.data_root.clone())
        .fingerprint_config(config.fingerprint)
        .scan_options(config.scan.clone())
        .build()
        .await
}

async fn run_identify(
    args: IdentifyArgs,
    corpus: Arc<CorpusIndex>,
    config: &AppConfig,
) -> Result<ExitCode> {
    let buf = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let filename = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let engine = IdentificationEngine::with_options(corpus, config.engine);
    let outcome = tokio::task::spawn_blocking(move || engine.identify(&buf, &filename))
        .await
        .context("Identification task failed")?;

    match outcome {
        Ok(identified) => {
            print_output(&identified, args.json, report::render_identify)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let envelope = match &err {
                SearchError::EmptyUpload => ErrorEnvelope::new("empty_upload", err.to_string())
                    .with_hint("Provide a non-empty firmware image"),
                SearchError::Other(_) => ErrorEnvelope::new("internal", err.to_string()),
            };
            if args.json {
                print_stdout(&serialize_json_pretty(&envelope)?)?;
            } else {
                log::error!("{}", envelope.message);
            }
            Ok(ExitCode::from(EXIT_USER_ERROR))
        }
    }
}
