//! Sceneweaver CLI — turn a book file into a scene manifest.
//!
//! Segments uploaded text into narrative scenes with generation prompts and
//! a derived visual/audio vibe, degrading to chunk-based synthesis when the
//! analysis service is unavailable.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
