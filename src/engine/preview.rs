//! Preview rendering
//!
//! Produces the images that drive the editing loop: an annotated still
//! showing the current crop against the full frame, and a short motion
//! preview clip of the current selection. Stills are extracted with one
//! encoder invocation per frame and composited on the blocking pool.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use tracing::{debug, info};

use crate::adapters::exec_ffmpeg::{FfmpegBinary, FfmpegInvocation};
use crate::domain::model::{
    CropRegion, MediaInfo, OutputArtifact, TimeWindow, PREVIEW_CLIP_CAP_SECONDS,
    PREVIEW_FRAME_RATE, PREVIEW_QUALITY, STILL_JPEG_QUALITY,
};
use crate::error::{StickClipError, StickClipResult};
use crate::utils::time::{clamped_midpoint, frame_index_for_timestamp, timestamp_for_frame};

/// Width of the crop outline in pixels
const OUTLINE_WIDTH: u32 = 3;

/// Solid outline color (red)
const OUTLINE_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Renders preview stills and motion previews for a single source file.
///
/// Rendering never mutates editing state; callers re-render after every
/// adjustment to keep the preview authoritative.
pub struct PreviewRenderer {
    ffmpeg: FfmpegBinary,
}

impl PreviewRenderer {
    pub fn new(ffmpeg: FfmpegBinary) -> Self {
        Self { ffmpeg }
    }

    /// Annotated still at `timestamp`: the full frame with a 50% dark
    /// overlay outside `region` and a solid outline on its boundary,
    /// encoded as JPEG. Returns `None` when the frame cannot be
    /// extracted (corrupt stream, decoder end-of-file).
    pub async fn render_crop_preview(
        &self,
        media: &MediaInfo,
        source: &Path,
        timestamp: f64,
        region: CropRegion,
        workdir: &Path,
    ) -> StickClipResult<Option<Vec<u8>>> {
        let Some(frame_path) = self.extract_frame(media, source, timestamp, workdir).await? else {
            return Ok(None);
        };

        let bytes = tokio::task::spawn_blocking(move || -> StickClipResult<Vec<u8>> {
            let frame = image::open(&frame_path)?.to_rgba8();
            composite_overlay(frame, region)
        })
        .await
        .map_err(|e| StickClipError::Io(std::io::Error::other(e)))??;

        Ok(Some(bytes))
    }

    /// Annotated still at the temporal midpoint of `window`, clamped
    /// away from the end of the stream.
    pub async fn render_time_preview(
        &self,
        media: &MediaInfo,
        source: &Path,
        window: TimeWindow,
        region: CropRegion,
        workdir: &Path,
    ) -> StickClipResult<Option<Vec<u8>>> {
        let midpoint = clamped_midpoint(&window, media.duration());
        self.render_crop_preview(media, source, midpoint, region, workdir)
            .await
    }

    /// Short motion preview of the current selection: crop applied, no
    /// scaling, capped duration, low frame rate and quality, no audio.
    pub async fn render_motion_preview(
        &self,
        source: &Path,
        window: TimeWindow,
        region: CropRegion,
        output: &Path,
    ) -> StickClipResult<OutputArtifact> {
        let args = motion_preview_args(source, window, region, output);
        info!("rendering motion preview to {}", output.display());

        let invocation = FfmpegInvocation::spawn(&self.ffmpeg, &args)?;
        let outcome = invocation.run_to_completion().await?;
        if !outcome.success {
            return Err(StickClipError::Encoding {
                diagnostic: outcome.stderr.trim().to_string(),
            });
        }

        let size_bytes = tokio::fs::metadata(output)
            .await
            .map_err(|_| StickClipError::Encoding {
                diagnostic: "motion preview produced no output".to_string(),
            })?
            .len();
        Ok(OutputArtifact {
            path: output.to_path_buf(),
            size_bytes,
        })
    }

    /// Extract the nearest frame at `timestamp` into the working
    /// directory. `None` means extraction failed; probing and encoding
    /// remain usable.
    async fn extract_frame(
        &self,
        media: &MediaInfo,
        source: &Path,
        timestamp: f64,
        workdir: &Path,
    ) -> StickClipResult<Option<std::path::PathBuf>> {
        let index = frame_index_for_timestamp(timestamp, media.frame_rate, media.frame_count);
        let aligned = timestamp_for_frame(index, media.frame_rate);
        let frame_path = workdir.join("preview_frame.png");

        let args = still_extract_args(source, aligned, &frame_path);
        let invocation = FfmpegInvocation::spawn(&self.ffmpeg, &args)?;
        let outcome = invocation.run_to_completion().await?;

        if !outcome.success || !frame_path.exists() {
            debug!(
                "frame extraction at {:.3}s failed: {}",
                aligned,
                outcome.stderr.trim()
            );
            return Ok(None);
        }
        Ok(Some(frame_path))
    }
}

/// Argument vector for extracting a single frame as PNG
fn still_extract_args(source: &Path, timestamp: f64, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-ss".into(),
        format!("{:.3}", timestamp),
        "-i".into(),
        source.display().to_string(),
        "-frames:v".into(),
        "1".into(),
        output.display().to_string(),
    ]
}

/// Argument vector for the motion preview clip
fn motion_preview_args(
    source: &Path,
    window: TimeWindow,
    region: CropRegion,
    output: &Path,
) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-ss".into(),
        format!("{:.3}", window.start),
        "-t".into(),
        format!("{:.3}", window.duration.min(PREVIEW_CLIP_CAP_SECONDS)),
        "-i".into(),
        source.display().to_string(),
        "-vf".into(),
        format!(
            "crop={}:{}:{}:{}",
            region.width, region.height, region.x, region.y
        ),
        "-r".into(),
        PREVIEW_FRAME_RATE.to_string(),
        "-crf".into(),
        PREVIEW_QUALITY.to_string(),
        "-an".into(),
        output.display().to_string(),
    ]
}

/// Darken everything outside the region, outline its boundary, and
/// encode the result as JPEG. The crop is illustrated, not applied: the
/// output keeps the full frame dimensions.
fn composite_overlay(mut frame: RgbaImage, region: CropRegion) -> StickClipResult<Vec<u8>> {
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        if !region.contains(x, y) {
            pixel.0[0] /= 2;
            pixel.0[1] /= 2;
            pixel.0[2] /= 2;
        }
    }
    draw_outline(&mut frame, region);

    let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, STILL_JPEG_QUALITY);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buffer.into_inner())
}

/// Solid outline just inside the region boundary
fn draw_outline(frame: &mut RgbaImage, region: CropRegion) {
    let color = image::Rgba(OUTLINE_COLOR);
    let right = region.x + region.width;
    let bottom = region.y + region.height;

    let mut put = |x: u32, y: u32| {
        if x < frame.width() && y < frame.height() {
            frame.put_pixel(x, y, color);
        }
    };

    for band in 0..OUTLINE_WIDTH.min(region.height) {
        for x in region.x..right {
            put(x, region.y + band);
            put(x, bottom - 1 - band);
        }
    }
    for band in 0..OUTLINE_WIDTH.min(region.width) {
        for y in region.y..bottom {
            put(region.x + band, y);
            put(right - 1 - band, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_still_extract_args() {
        let args = still_extract_args(
            Path::new("in.mp4"),
            1.2344,
            Path::new("/tmp/work/preview_frame.png"),
        );
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-ss",
                "1.234",
                "-i",
                "in.mp4",
                "-frames:v",
                "1",
                "/tmp/work/preview_frame.png",
            ]
        );
    }

    #[test]
    fn test_motion_preview_caps_duration() {
        let window = TimeWindow {
            start: 0.5,
            duration: 3.0,
        };
        let region = CropRegion {
            x: 10,
            y: 20,
            width: 100,
            height: 200,
        };
        let args = motion_preview_args(
            Path::new("in.mp4"),
            window,
            region,
            Path::new("preview.mp4"),
        );
        let t_at = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t_at + 1], "2.000");
        assert!(args.contains(&"crop=100:200:10:20".to_string()));
        assert!(args.contains(&"-an".to_string()));
        let r_at = args.iter().position(|a| a == "-r").unwrap();
        assert_eq!(args[r_at + 1], "15");
        let crf_at = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf_at + 1], "35");
    }

    #[test]
    fn test_composite_darkens_outside_and_outlines_region() {
        let frame = RgbaImage::from_pixel(64, 64, image::Rgba([200, 200, 200, 255]));
        let region = CropRegion {
            x: 16,
            y: 16,
            width: 32,
            height: 32,
        };
        let jpeg = composite_overlay(frame, region).unwrap();

        // JPEG magic bytes
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));

        // Outside the region the gray is halved (JPEG wiggle allowed);
        // the region interior keeps its brightness; the boundary is red.
        let outside = decoded.get_pixel(2, 2);
        assert!(outside.0[0] < 140);
        let inside = decoded.get_pixel(32, 32);
        assert!(inside.0[0] > 160);
        let border = decoded.get_pixel(17, 32);
        assert!(border.0[0] > 150);
        assert!(border.0[1] < 120);
    }

    #[test]
    fn test_outline_survives_frame_edge_region() {
        // Region flush against the frame boundary must not panic or
        // write out of bounds.
        let frame = RgbaImage::from_pixel(32, 32, image::Rgba([100, 100, 100, 255]));
        let region = CropRegion {
            x: 0,
            y: 0,
            width: 32,
            height: 32,
        };
        let jpeg = composite_overlay(frame, region).unwrap();
        assert!(!jpeg.is_empty());
    }

    #[test]
    fn test_time_preview_uses_clamped_midpoint() {
        // Pure check through the shared helper: the renderer derives its
        // timestamp from the same function.
        let window = TimeWindow {
            start: 2.8,
            duration: 0.4,
        };
        let midpoint = clamped_midpoint(&window, 3.0);
        assert!((midpoint - 2.9).abs() < 1e-9);
    }
}
