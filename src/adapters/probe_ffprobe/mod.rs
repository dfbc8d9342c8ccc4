//! FFprobe adapter for media file probing
//!
//! Runs the `ffprobe` binary with JSON output and maps the result onto
//! the domain's `MediaInfo`.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::adapters::exec_ffmpeg::FfmpegBinary;
use crate::domain::model::MediaInfo;
use crate::error::{StickClipError, StickClipResult};
use crate::ports::MediaProbePort;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    binary: FfmpegBinary,
}

impl FfprobeAdapter {
    /// Resolve the ffprobe binary (configuration, then `FFPROBE_PATH`,
    /// then PATH)
    pub fn new(configured: Option<&str>) -> StickClipResult<Self> {
        let binary = FfmpegBinary::resolve("ffprobe", configured, "FFPROBE_PATH")?;
        Ok(Self { binary })
    }

    /// Wrap an already-resolved binary
    pub fn with_binary(binary: FfmpegBinary) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl MediaProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> StickClipResult<MediaInfo> {
        debug!("probing {}", path.display());
        let output = Command::new(self.binary.path())
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_streams",
                "-show_format",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StickClipError::Configuration {
                        message: format!("failed to launch {}: {}", self.binary.path().display(), e),
                    }
                } else {
                    StickClipError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(StickClipError::UnreadableMedia {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Map ffprobe's JSON onto `MediaInfo`.
///
/// Frame rate prefers `avg_frame_rate` over `r_frame_rate`; a missing
/// `nb_frames` (common for webm/mkv) is reconstructed from the duration
/// and rate.
fn parse_probe_output(stdout: &[u8]) -> StickClipResult<MediaInfo> {
    let parsed: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| StickClipError::UnreadableMedia {
            message: format!("unparseable probe output: {}", e),
        })?;

    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| StickClipError::UnreadableMedia {
            message: "no video stream found".to_string(),
        })?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .filter(|rate| *rate > 0.0)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rational))
        .unwrap_or(0.0);

    let duration = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if frame_rate > 0.0 && duration > 0.0 {
                (duration * frame_rate).round() as u64
            } else {
                0
            }
        });

    MediaInfo::new(width, height, frame_rate, frame_count)
}

/// Parse an ffprobe rational like "30000/1001" (or a bare number)
fn parse_rational(text: &str) -> Option<f64> {
    match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational_forms() {
        assert_eq!(parse_rational("30/1"), Some(30.0));
        let ntsc = parse_rational("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_rational("25"), Some(25.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("garbage"), None);
    }

    #[test]
    fn test_parse_probe_output_with_frame_count() {
        let json = br#"{
            "streams": [{
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30/1",
                "r_frame_rate": "30/1",
                "nb_frames": "45",
                "duration": "1.500000"
            }],
            "format": {"duration": "1.500000"}
        }"#;
        let media = parse_probe_output(json).unwrap();
        assert_eq!(media.width, 1920);
        assert_eq!(media.height, 1080);
        assert_eq!(media.frame_rate, 30.0);
        assert_eq!(media.frame_count, 45);
        assert!((media.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_output_reconstructs_missing_frames() {
        // webm streams often report no nb_frames and only a container
        // duration.
        let json = br#"{
            "streams": [{
                "width": 512,
                "height": 512,
                "avg_frame_rate": "0/0",
                "r_frame_rate": "30/1"
            }],
            "format": {"duration": "2.0"}
        }"#;
        let media = parse_probe_output(json).unwrap();
        assert_eq!(media.frame_rate, 30.0);
        assert_eq!(media.frame_count, 60);
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = br#"{"streams": [], "format": {"duration": "2.0"}}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(StickClipError::UnreadableMedia { .. })
        ));
    }
}
