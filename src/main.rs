use anyhow::{Context, Result};
use clap::Parser;
use mailing_list_ingest::{FsObjectStore, IngestConfig, JsonLinesSink, Pipeline, RunRequest};
use std::path::PathBuf;
use tracing::debug;

/// Normalize mailing-list archives into structured message records
#[derive(Debug, Parser)]
#[command(name = "mailing-list-ingest", version)]
struct Args {
    /// Directory holding one sub-directory per container
    #[arg(long, value_name = "PATH")]
    root: PathBuf,

    /// Container (archive directory) to ingest
    #[arg(long)]
    container: String,

    /// Only ingest objects whose name starts with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Explicit object names, space separated; overrides --prefix
    #[arg(long, value_delimiter = ' ', num_args = 1..)]
    filename: Vec<String>,

    /// Directory receiving the JSON-lines destination files
    #[arg(short, long, value_name = "PATH", default_value = "output")]
    output: PathBuf,

    /// Destination (table) name
    #[arg(long, default_value = "messages")]
    destination: String,

    /// Records per store write
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Reject store writes larger than this many bytes
    #[arg(long)]
    max_batch_bytes: Option<usize>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Parse only, write nothing
    #[arg(long)]
    no_ingest: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    quiet: bool,
}

impl Args {
    const fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailing_list_ingest={}", args.log_level())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    let mut config = match &args.config {
        Some(path) => IngestConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IngestConfig::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    debug!(config = ?pipeline.config(), "Effective configuration");
    let store = FsObjectStore::new(&args.root);
    let mut sink = JsonLinesSink::new(&args.output);
    if let Some(limit) = args.max_batch_bytes {
        sink = sink.with_max_batch_bytes(limit);
    }

    let request = RunRequest {
        container: args.container.clone(),
        prefix: args.prefix.clone(),
        filenames: args.filename.clone(),
        destination: args.destination.clone(),
    };
    let sink = (!args.no_ingest).then_some(&sink);
    let summary = pipeline
        .run(&store, sink, &request)
        .with_context(|| format!("Ingestion of {} failed", request.container))?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
