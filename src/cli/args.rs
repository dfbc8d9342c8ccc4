//! Command-line argument definitions

use clap::Args;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Selection start time in seconds
    #[arg(long, default_value = "0")]
    pub start: f64,

    /// Selection duration in seconds (max 3.0)
    #[arg(long, default_value = "3")]
    pub duration: f64,

    /// Crop rectangle left edge in pixels (default: centered)
    #[arg(long)]
    pub crop_x: Option<u32>,

    /// Crop rectangle top edge in pixels (default: centered)
    #[arg(long)]
    pub crop_y: Option<u32>,

    /// Crop rectangle width in pixels
    #[arg(long)]
    pub crop_width: Option<u32>,

    /// Crop rectangle height in pixels
    #[arg(long)]
    pub crop_height: Option<u32>,

    /// Render a short motion preview clip instead of a still
    #[arg(long)]
    pub motion: bool,

    /// Output file path (.jpg for stills, .mp4 for motion)
    #[arg(short, long)]
    pub output: String,
}

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Selection start time in seconds
    #[arg(long, default_value = "0")]
    pub start: f64,

    /// Selection duration in seconds (max 3.0)
    #[arg(long, default_value = "3")]
    pub duration: f64,

    /// Crop rectangle left edge in pixels (default: centered)
    #[arg(long)]
    pub crop_x: Option<u32>,

    /// Crop rectangle top edge in pixels (default: centered)
    #[arg(long)]
    pub crop_y: Option<u32>,

    /// Crop rectangle width in pixels
    #[arg(long)]
    pub crop_width: Option<u32>,

    /// Crop rectangle height in pixels
    #[arg(long)]
    pub crop_height: Option<u32>,

    /// Output width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Keep the audio track (Opus)
    #[arg(long)]
    pub audio: bool,

    /// Fail instead of walking the compression ladder when the first
    /// encode overshoots the size ceiling
    #[arg(long)]
    pub no_shrink: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: String,
}
