//! CLI module for StickClip
//!
//! This module handles command-line argument parsing and command
//! execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// StickClip CLI
///
/// Trim, crop and re-encode a short clip, then squeeze the result under
/// the 256 KiB sticker-size ceiling.
#[derive(Parser)]
#[command(name = "stickclip")]
#[command(about = "StickClip - trim, crop and squeeze short clips under a size ceiling")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect media file information
    Inspect(args::InspectArgs),
    /// Render an annotated preview of a selection
    Preview(args::PreviewArgs),
    /// Encode a selection under the size ceiling
    Clip(args::ClipArgs),
}
