//! Tokenmatch - Main Entry Point
//!
//! Compares two strings and prints their contingency table as JSON.
//!
//! Usage:
//!     tokenmatch cat hat
//!     tokenmatch --intersection fuzzy --threshold 0.5 night nacht
//!     tokenmatch --config comparator.json --log-level debug "foo bar" "foo baz"

mod report;

use clap::Parser;
use report::Report;
use std::path::PathBuf;
use tokenmatch_core::{
    ComparatorConfig, IntersectionKind, MetricKind, Normalizer, Population, QGrams,
    TokenizerConfig,
};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "tokenmatch")]
#[command(about = "Token-based contingency tables for string comparison")]
#[command(version)]
struct Args {
    /// Source string
    src: String,

    /// Target string
    tar: String,

    /// JSON comparator configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Intersection strategy (crisp, fuzzy, soft, linkage)
    #[arg(short, long)]
    intersection: Option<IntersectionKind>,

    /// Token metric (levenshtein, jaro-winkler)
    #[arg(short, long)]
    metric: Option<MetricKind>,

    /// Similarity threshold (fuzzy) or distance threshold (linkage)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// q-gram length
    #[arg(short, long, conflicts_with = "words")]
    qval: Option<usize>,

    /// Do not pad q-grams with start/stop markers
    #[arg(long, conflicts_with = "words")]
    no_markers: bool,

    /// Split on whitespace instead of q-grams
    #[arg(short, long)]
    words: bool,

    /// Normalizer applied to every cardinality
    #[arg(short, long)]
    normalizer: Option<Normalizer>,

    /// Population of this many distinct tokens
    #[arg(long)]
    alphabet_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    /// Start from the config file, if any, and apply flag overrides
    fn comparator_config(&self) -> Result<ComparatorConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ComparatorConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => ComparatorConfig::default(),
        };

        if self.words {
            config.tokenizer = TokenizerConfig::Whitespace;
        } else if self.qval.is_some() || self.no_markers {
            let (qval, start_stop) = match &config.tokenizer {
                TokenizerConfig::Qgrams { qval, start_stop } => (*qval, *start_stop),
                _ => (2, Some((QGrams::DEFAULT_START, QGrams::DEFAULT_STOP))),
            };
            config.tokenizer = TokenizerConfig::Qgrams {
                qval: self.qval.unwrap_or(qval),
                start_stop: if self.no_markers { None } else { start_stop },
            };
        }

        if let Some(kind) = self.intersection {
            config.intersection = kind;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if self.threshold.is_some() {
            config.threshold = self.threshold;
        }
        if let Some(normalizer) = self.normalizer {
            config.normalizer = normalizer;
        }
        if let Some(size) = self.alphabet_size {
            config.population = Population::Cardinality(size);
        }

        Ok(config)
    }
}

fn level_filter(name: &str) -> LevelFilter {
    match name {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::WARN,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON; RUST_LOG wins over the flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(level_filter(&args.log_level).into())
    });

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args.comparator_config()?;
    debug!(?config, "resolved configuration");

    let comparator = config.build()?;
    let ctx = comparator.prepare(&args.src, &args.tar)?;
    let report = Report::new(comparator.intersection_kind(), comparator.normalizer(), &ctx);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
