//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use sceneweaver_analysis::{AnalysisClient, ExtractorOptions, SceneExtractor};
use sceneweaver_core::{IngestOptions, Ingestor};
use sceneweaver_shared::{
    AppConfig, Manifest, RawDocument, config_file_path, init_config, load_config, resolve_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Sceneweaver — turn books into scene manifests.
#[derive(Parser)]
#[command(
    name = "sceneweaver",
    version,
    about = "Turn a book file into a scene manifest with generation prompts and a derived vibe.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ingest a book file and write its scene manifest.
    Ingest {
        /// Path to the book text file.
        file: PathBuf,

        /// Output path for the manifest JSON (defaults to `<stem>.manifest.json`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Append continuation scenes to an existing manifest.
    Extend {
        /// Path to a manifest JSON produced by `ingest`.
        manifest: PathBuf,

        /// Story context for the continuation (defaults to a sentence built
        /// from the manifest's title, author, and description).
        #[arg(long)]
        context: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!(
        "sceneweaver_cli={level},sceneweaver_core={level},sceneweaver_analysis={level},sceneweaver_shared={level}"
    );

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest { file, out } => cmd_ingest(&file, out.as_deref()).await,
        Command::Extend { manifest, context } => {
            cmd_extend(&manifest, context.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Ingestor construction
// ---------------------------------------------------------------------------

/// Build the ingestor from config. A missing API key is not an error: the
/// pipeline runs fully offline on the chunk path.
fn build_ingestor(config: &AppConfig) -> Result<Ingestor> {
    let extractor = match resolve_api_key(config) {
        Some(api_key) => {
            let api_base = Url::parse(&config.gemini.api_base)
                .map_err(|e| eyre!("invalid api_base '{}': {e}", config.gemini.api_base))?;
            let client = AnalysisClient::with_base(api_key, api_base)?;
            Some(SceneExtractor::with_options(
                client,
                ExtractorOptions::from(config),
            ))
        }
        None => {
            warn!(
                env = %config.gemini.api_key_env,
                "API key not set, manifests will use the offline chunk path"
            );
            None
        }
    };

    let options = IngestOptions {
        fallback_chunk_size: config.defaults.fallback_chunk_size,
        vibe_sample_chars: config.defaults.vibe_sample_chars,
    };

    Ok(Ingestor::with_options(extractor, options))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest(file: &Path, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let ingestor = build_ingestor(&config)?;

    // Lossy decode: uploaded books are not reliably UTF-8.
    let bytes = std::fs::read(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| eyre!("'{}' has no file name", file.display()))?;

    let doc = RawDocument::new(filename, content);
    info!(filename = %doc.filename, chars = doc.content.chars().count(), "ingesting book");

    let spinner = spinner("Analyzing and synthesizing manifest");
    let start = Instant::now();
    let manifest = ingestor.ingest(&doc).await;
    spinner.finish_and_clear();

    let out_path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| file.with_extension("manifest.json"));
    write_manifest(&manifest, &out_path)?;

    println!();
    println!("  Manifest created!");
    println!("  ID:     {}", manifest.id);
    println!("  Title:  {}", manifest.title);
    println!("  Scenes: {}", manifest.scenes.len());
    println!("  Tags:   {}", manifest.tags.join(", "));
    println!("  Path:   {}", out_path.display());
    println!("  Time:   {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_extend(manifest_path: &Path, context: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let ingestor = build_ingestor(&config)?;

    let json = std::fs::read_to_string(manifest_path)
        .map_err(|e| eyre!("cannot read '{}': {e}", manifest_path.display()))?;
    let mut manifest: Manifest = serde_json::from_str(&json)
        .map_err(|e| eyre!("'{}' is not a valid manifest: {e}", manifest_path.display()))?;

    let last_scene_id = manifest
        .scenes
        .last()
        .map(|s| s.id)
        .ok_or_else(|| eyre!("manifest has no scenes to continue from"))?;

    let context = context.map(String::from).unwrap_or_else(|| {
        format!(
            "The book is \"{}\" by {}. Description: {}.",
            manifest.title, manifest.author, manifest.description
        )
    });

    let spinner = spinner("Generating continuation scenes");
    let scenes = ingestor
        .generate_more_scenes(&manifest.id, last_scene_id, &context)
        .await;
    spinner.finish_and_clear();

    if scenes.is_empty() {
        println!("  No scenes generated (analysis unavailable or failed).");
        return Ok(());
    }

    let added = scenes.len();
    manifest.scenes.extend(scenes);
    write_manifest(&manifest, manifest_path)?;

    println!();
    println!("  Added {added} scenes to {}", manifest_path.display());
    println!("  Total: {}", manifest.scenes.len());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("# {}", config_file_path()?.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)
        .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}
