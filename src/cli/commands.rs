//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::exec_ffmpeg::FfmpegBinary;
use crate::adapters::probe_ffprobe::FfprobeAdapter;
use crate::adapters::toml_config::AppConfig;
use crate::app::session::{EditSession, EncodeOutcome};
use crate::cli::args::{ClipArgs, InspectArgs, PreviewArgs};
use crate::domain::model::{EncodingProfile, MediaInfo, SIZE_CEILING_BYTES};
use crate::ports::MediaProbePort;
use crate::utils::time::format_seconds;

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    AppConfig::load(config_path.map(Path::new)).context("Failed to load configuration")
}

fn resolve_ffmpeg(config: &AppConfig) -> Result<FfmpegBinary> {
    FfmpegBinary::resolve("ffmpeg", config.ffmpeg_path.as_deref(), "FFMPEG_PATH")
        .context("Failed to locate the encoder binary")
}

fn require_input(input: &str) -> Result<()> {
    if !Path::new(input).exists() {
        anyhow::bail!("Input file does not exist: {}", input);
    }
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config_path: Option<String>) -> Result<()> {
    info!("Starting inspect operation");
    require_input(&args.input)?;

    let config = load_config(config_path.as_deref())?;
    let probe = FfprobeAdapter::new(config.ffprobe_path.as_deref())?;
    let media = probe
        .probe(Path::new(&args.input))
        .await
        .context("Failed to probe input file")?;

    if args.json {
        let json = serde_json::to_string_pretty(&media)
            .context("Failed to serialize media info to JSON")?;
        println!("{}", json);
    } else {
        display_media_info(&args.input, &media);
    }

    info!("Inspect operation completed successfully");
    Ok(())
}

/// Execute the preview command
pub async fn preview(args: PreviewArgs, config_path: Option<String>) -> Result<()> {
    info!("Starting preview operation");
    require_input(&args.input)?;
    check_crop_args(args.crop_x, args.crop_y, args.crop_width, args.crop_height)?;

    let config = load_config(config_path.as_deref())?;
    let ffmpeg = resolve_ffmpeg(&config)?;
    let probe = FfprobeAdapter::new(config.ffprobe_path.as_deref())?;

    let mut session =
        EditSession::open(ffmpeg, &probe, &args.input, config.profile()).await?;
    session.set_window(args.start, args.duration)?;
    session.begin_crop_editing()?;
    apply_crop_selection(
        &mut session,
        args.crop_x,
        args.crop_y,
        args.crop_width,
        args.crop_height,
    )?;
    session.enter_preview()?;

    if args.motion {
        let artifact = session.render_motion_preview().await?;
        tokio::fs::copy(&artifact.path, &args.output)
            .await
            .context("Failed to write motion preview")?;
        println!(
            "Motion preview written to {} ({} KiB)",
            args.output,
            artifact.size_bytes / 1024
        );
    } else {
        let Some(bytes) = session.render_time_preview().await? else {
            anyhow::bail!("Frame extraction failed; the stream may be corrupt");
        };
        tokio::fs::write(&args.output, &bytes)
            .await
            .context("Failed to write preview image")?;
        println!("Preview written to {} ({} KiB)", args.output, bytes.len() / 1024);
    }

    info!("Preview operation completed successfully");
    Ok(())
}

/// Execute the clip command
pub async fn clip(args: ClipArgs, config_path: Option<String>) -> Result<()> {
    info!("Starting clip operation");
    info!("Input: {}", args.input);
    info!("Selection: {:.1}s + {:.1}s", args.start, args.duration);
    require_input(&args.input)?;
    check_crop_args(args.crop_x, args.crop_y, args.crop_width, args.crop_height)?;

    let config = load_config(config_path.as_deref())?;
    let ffmpeg = resolve_ffmpeg(&config)?;
    let probe = FfprobeAdapter::new(config.ffprobe_path.as_deref())?;

    let mut profile = config.profile();
    apply_profile_overrides(&mut profile, &args);

    let mut session = EditSession::open(ffmpeg, &probe, &args.input, profile).await?;
    let window = session.set_window(args.start, args.duration)?;
    info!(
        "Window after clamping: {} + {}",
        format_seconds(window.start),
        format_seconds(window.duration)
    );

    session.begin_crop_editing()?;
    apply_crop_selection(
        &mut session,
        args.crop_x,
        args.crop_y,
        args.crop_width,
        args.crop_height,
    )?;
    session.enter_preview()?;

    let artifact = match session.encode().await? {
        EncodeOutcome::Complete(artifact) => artifact,
        EncodeOutcome::Oversized { size_bytes } => {
            if args.no_shrink {
                anyhow::bail!(
                    "Output is {} KiB, over the {} KiB ceiling (re-run without --no-shrink to compress)",
                    size_bytes / 1024,
                    SIZE_CEILING_BYTES / 1024
                );
            }
            info!(
                "Output is {} KiB; walking the compression ladder",
                size_bytes / 1024
            );
            session.compress().await.context(
                "Could not shrink the clip; try a shorter duration, a smaller \
                 output size, or disabling audio",
            )?
        }
    };

    session.deliver_to(&artifact, Path::new(&args.output)).await?;
    println!(
        "Wrote {} ({} KiB)",
        args.output,
        artifact.size_bytes / 1024
    );

    info!("Clip operation completed successfully");
    Ok(())
}

/// Validate the crop argument combination before touching any binary
/// or probing the input. Width and height must come together;
/// coordinates additionally require them.
fn check_crop_args(
    x: Option<u32>,
    y: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    match (width, height) {
        (Some(_), Some(_)) => Ok(()),
        (None, None) if x.is_none() && y.is_none() => Ok(()),
        (None, None) => anyhow::bail!("--crop-x/--crop-y require --crop-width and --crop-height"),
        _ => anyhow::bail!("--crop-width and --crop-height must be given together"),
    }
}

/// Apply the optional absolute crop arguments to a session in the
/// crop-editing phase. Coordinates default to a centered placement.
fn apply_crop_selection(
    session: &mut EditSession,
    x: Option<u32>,
    y: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    if let (Some(width), Some(height)) = (width, height) {
        if let (Some(x), Some(y)) = (x, y) {
            session.set_crop(x, y, width, height)?;
        } else {
            session.resize_crop(width, height)?;
        }
    }
    Ok(())
}

fn apply_profile_overrides(profile: &mut EncodingProfile, args: &ClipArgs) {
    if let Some(width) = args.width {
        profile.target_width = width;
    }
    if let Some(height) = args.height {
        profile.target_height = height;
    }
    if let Some(fps) = args.fps {
        profile.frame_rate = fps;
    }
    if args.audio {
        profile.audio_enabled = true;
    }
}

/// Display media information in human-readable format
fn display_media_info(path: &str, media: &MediaInfo) {
    println!("Media Information");
    println!("=================");
    println!("File: {}", path);
    println!("Dimensions: {}x{}", media.width, media.height);
    println!("Frame Rate: {:.3} fps", media.frame_rate);
    println!("Frames: {}", media.frame_count);
    println!("Duration: {}", format_seconds(media.duration()));
}
