// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use once_cell::sync::Lazy;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::Config;
use crate::pipeline::TranslationPipeline;

mod app_config;
mod errors;
mod extractor;
mod language_utils;
mod merge;
mod pipeline;
mod providers;
mod resolver;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// pagelingo - HTML page translation with multi-provider reconciliation
///
/// Extracts the translatable text of an HTML document, queries multiple
/// translation backends per fragment, reconciles their outputs, and writes
/// the translated document next to the input.
#[derive(Parser, Debug)]
#[command(name = "pagelingo")]
#[command(version)]
#[command(about = "Translate HTML documents using multiple reconciled providers")]
struct CommandLineOptions {
    /// Input HTML file to translate
    #[arg(value_name = "INPUT_FILE")]
    input_path: PathBuf,

    /// Target language code (e.g., 'fr', 'es', 'de')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output file path; defaults to {input stem}-{lang}.html next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Program start, used for relative log timestamps
static START: Lazy<Instant> = Lazy::new(Instant::now);

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger { level });
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let elapsed = START.elapsed().as_secs_f64();
            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => writeln!(
                    stderr,
                    "\x1B[1;31m{:9.3}s ERROR {}\x1B[0m",
                    elapsed,
                    record.args()
                ),
                Level::Warn => writeln!(
                    stderr,
                    "\x1B[1;33m{:9.3}s WARN  {}\x1B[0m",
                    elapsed,
                    record.args()
                ),
                Level::Info => writeln!(stderr, "{:9.3}s INFO  {}", elapsed, record.args()),
                Level::Debug => writeln!(
                    stderr,
                    "\x1B[0;36m{:9.3}s DEBUG {}\x1B[0m",
                    elapsed,
                    record.args()
                ),
                Level::Trace => writeln!(
                    stderr,
                    "\x1B[0;90m{:9.3}s TRACE {}\x1B[0m",
                    elapsed,
                    record.args()
                ),
            };
        }
    }

    fn flush(&self) {}
}

/// Derive the default output path: {stem}-{lang}{extension} next to the input
fn default_output_path(input: &Path, target_language: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".html".to_string());
    input.with_file_name(format!("{}-{}{}", stem, target_language, extension))
}

#[tokio::main]
async fn main() -> Result<()> {
    Lazy::force(&START);
    let options = CommandLineOptions::parse();

    let mut config = if Path::new(&options.config_path).exists() {
        Config::from_file(&options.config_path)?
    } else {
        Config::default_config()
    };

    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }
    CustomLogger::init(config.log_level.to_level_filter())
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    if let Some(lang) = &options.target_language {
        config.target_language = lang.clone();
    }
    let target_language = language_utils::normalize_target_language(&config.target_language)?;
    if let Some(name) = language_utils::get_language_name(&target_language) {
        info!("Target language: {} ({})", name, target_language);
    }

    let html = std::fs::read_to_string(&options.input_path).with_context(|| {
        format!("Failed to read input file {}", options.input_path.display())
    })?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} units {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    let progress_for_callback = progress.clone();

    let pipeline = TranslationPipeline::new(&config);
    let merged = pipeline
        .process_with_progress(&html, &target_language, move |done, total| {
            progress_for_callback.set_length(total as u64);
            progress_for_callback.set_position(done as u64);
        })
        .await?;
    progress.finish_and_clear();

    let output_path = options
        .output
        .unwrap_or_else(|| default_output_path(&options.input_path, &target_language));
    std::fs::write(&output_path, merged)
        .with_context(|| format!("Failed to write output file {}", output_path.display()))?;
    info!("Saved translated document to {}", output_path.display());

    Ok(())
}
