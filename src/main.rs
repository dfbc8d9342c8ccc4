//! StickClip CLI
//!
//! Trim, crop and re-encode a short clip through an iterative selection
//! pipeline, then squeeze the final artifact under the 256 KiB
//! sticker-size ceiling with an escalating compression ladder.
//!
//! # Usage
//!
//! ```bash
//! stickclip inspect --input clip.mp4
//! stickclip preview --input clip.mp4 --start 1.0 --duration 2.0 --output preview.jpg
//! stickclip clip --input clip.mp4 --start 1.0 --duration 2.5 --output sticker.webm
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use stickclip::cli::{commands, Cli, Commands};

/// Main entry point for the StickClip CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting StickClip");

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute the requested command
    match cli.command {
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            commands::inspect(args, cli.config).await?;
        }
        Commands::Preview(args) => {
            info!("Executing preview command");
            commands::preview(args, cli.config).await?;
        }
        Commands::Clip(args) => {
            info!("Executing clip command");
            commands::clip(args, cli.config).await?;
        }
    }

    info!("StickClip completed successfully");
    Ok(())
}
