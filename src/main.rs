// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chapterwise::app_config::{Config, LogLevel};
use chapterwise::document::{DocumentSource, InMemoryDocument};
use chapterwise::errors::RunError;
use chapterwise::pipeline::{provider_chain, ChapterOrchestrator};
use chapterwise::memory::store::MemoryStore;
use chapterwise::translation::call_layer::ResilientCaller;
use chapterwise::translation::chunker::TokenBudgetChunker;
use chapterwise::translation::editor::Editor;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a chaptered document (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Write an example configuration file with defaults
    ExampleConfig {
        /// Where to write the example config
        #[arg(value_name = "PATH", default_value = "conf.json")]
        path: PathBuf,
    },

    /// Generate shell completions for chapterwise
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input document: a JSON file holding an array of chapters, each an
    /// array of text blocks
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output path for the translated document (defaults to the input
    /// path with a .translated.json extension)
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// 0-based index of the first narrative chapter; everything before
    /// it is treated as front matter
    #[arg(short = 'n', long, default_value_t = 0)]
    first_narrative_index: usize,

    /// 0-based index of the last chapter to process (defaults to the
    /// last chapter of the document)
    #[arg(short = 'e', long)]
    last_chapter_index: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Override the persistent state directory
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Chapterwise - chapter-atomic document translation
///
/// Translates chaptered documents with AI providers while keeping
/// terminology, character pronouns, and story context consistent.
#[derive(Parser, Debug)]
#[command(name = "chapterwise")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered chaptered document translation")]
#[command(long_about = "Chapterwise translates chaptered documents chapter by chapter, carrying
a glossary, locked character pronouns, and a rolling story summary across
the whole document.

EXAMPLES:
    chapterwise book.json                        # Translate using default config
    chapterwise -n 3 book.json                   # Chapters 0-2 are front matter
    chapterwise -e 10 book.json                  # Stop after chapter 10
    chapterwise --log-level debug book.json      # Verbose logging
    chapterwise example-config conf.json         # Write a default config
    chapterwise completions bash > cw.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.

RESUMING:
    Interrupted runs resume where they left off: committed chapters are
    replayed from the state directory's cache without any provider calls.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document (when no subcommand is given)
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output path for the translated document
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// 0-based index of the first narrative chapter
    #[arg(short = 'n', long, default_value_t = 0)]
    first_narrative_index: usize,

    /// 0-based index of the last chapter to process
    #[arg(short = 'e', long)]
    last_chapter_index: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Override the persistent state directory
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default.
    // The level is updated after loading the config if needed.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chapterwise", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::ExampleConfig { path }) => {
            Config::write_example(&path)?;
            info!("Example config written to {}", path.display());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_path,
                output_path: cli.output_path,
                first_narrative_index: cli.first_narrative_index,
                last_chapter_index: cli.last_chapter_index,
                config_path: cli.config_path,
                state_dir: cli.state_dir,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(state_dir) = &options.state_dir {
        config.state_dir = Some(state_dir.clone());
    }
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    // Load the input document
    let file = File::open(&options.input_path)
        .with_context(|| format!("Failed to open input file: {}", options.input_path.display()))?;
    let chapters: Vec<Vec<String>> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse input file: {}", options.input_path.display()))?;
    let mut doc = InMemoryDocument::new(chapters);
    let chapter_count = doc.chapter_count();
    if chapter_count == 0 {
        return Err(anyhow!("Input document has no chapters"));
    }

    let state_dir = config.resolve_state_dir();
    info!("State directory: {}", state_dir.display());
    let store = MemoryStore::new(&state_dir)?;

    // Wire the provider chain and the pipeline collaborators
    let candidates = provider_chain(&config)?;
    let primary_provider = candidates
        .first()
        .map(|c| c.provider.clone())
        .ok_or_else(|| anyhow!("Provider chain is empty"))?;
    let caller = Arc::new(ResilientCaller::new(candidates, config.retry.clone()));
    let chunker = TokenBudgetChunker::new(primary_provider, config.chunking.clone());
    let editor = Editor::new(
        caller.clone(),
        config.editor.clone(),
        config.target_language.clone(),
    );
    let orchestrator = ChapterOrchestrator::new(config, store, caller, chunker, editor);

    let last_chapter_index = options
        .last_chapter_index
        .unwrap_or(chapter_count.saturating_sub(1));

    let report = match orchestrator
        .run(&mut doc, options.first_narrative_index, last_chapter_index)
        .await
    {
        Ok(report) => report,
        Err(RunError::Chapter(failure)) => {
            error!(
                "Run stopped at chapter {} during {}: {}",
                failure.chapter, failure.stage, failure.source
            );
            error!("Re-run the same command to resume from the last committed chapter.");
            return Err(failure.into());
        }
        Err(error) => {
            error!("Run stopped before reaching a chapter: {}", error);
            return Err(error.into());
        }
    };

    // Assemble the output document: rendered chapters where available,
    // source text for anything past the requested range
    let output: Vec<Vec<String>> = (0..chapter_count)
        .map(|chapter| {
            doc.rendered_chapter(chapter)
                .cloned()
                .unwrap_or_else(|| doc.chapter_blocks(chapter))
        })
        .collect();

    let output_path = options
        .output_path
        .unwrap_or_else(|| options.input_path.with_extension("translated.json"));
    let output_json =
        serde_json::to_string_pretty(&output).context("Failed to serialize translated document")?;
    std::fs::write(&output_path, output_json)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

    info!(
        "Done: {} translated, {} replayed from cache, {} empty -> {}",
        report.processed.len(),
        report.skipped.len(),
        report.empty.len(),
        output_path.display()
    );
    Ok(())
}
