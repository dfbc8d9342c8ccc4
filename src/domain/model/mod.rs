// Domain models - Core types and data structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StickClipError, StickClipResult};

/// Maximum selectable clip duration in seconds
pub const MAX_CLIP_SECONDS: f64 = 3.0;

/// Minimum selectable clip duration in seconds
pub const MIN_CLIP_SECONDS: f64 = 0.1;

/// Fine timeline adjustment step in seconds
pub const FINE_STEP_SECONDS: f64 = 0.1;

/// Coarse timeline adjustment step in seconds
pub const COARSE_STEP_SECONDS: f64 = 1.0;

/// Crop move step in pixels
pub const CROP_MOVE_STEP_PIXELS: u32 = 20;

/// Hard ceiling on the final artifact size (256 KiB)
pub const SIZE_CEILING_BYTES: u64 = 262_144;

/// Motion preview duration cap in seconds
pub const PREVIEW_CLIP_CAP_SECONDS: f64 = 2.0;

/// Motion preview frame rate
pub const PREVIEW_FRAME_RATE: u32 = 15;

/// Motion preview quality level (CRF)
pub const PREVIEW_QUALITY: u8 = 35;

/// JPEG quality for annotated preview stills
pub const STILL_JPEG_QUALITY: u8 = 85;

/// Intrinsic properties of a probed media file.
///
/// Immutable once probed; duration is derived from frame count and rate
/// rather than stored, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_count: u64,
}

impl MediaInfo {
    /// Create media info with validation
    pub fn new(width: u32, height: u32, frame_rate: f64, frame_count: u64) -> StickClipResult<Self> {
        if width == 0 || height == 0 {
            return Err(StickClipError::UnreadableMedia {
                message: format!("video dimensions cannot be zero ({}x{})", width, height),
            });
        }
        Ok(Self {
            width,
            height,
            frame_rate,
            frame_count,
        })
    }

    /// Duration in seconds; 0.0 for degenerate inputs with a non-positive rate
    pub fn duration(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// Rectangular sub-area of the source frame retained in the output.
///
/// Always fully inside the frame: `x + width <= frame width` and
/// `y + height <= frame height`. Constructed and mutated only through
/// the planning rules, which clamp rather than reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Whether a pixel coordinate falls inside the region
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Center point of the region
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// The [start, start+duration) sub-interval of source time retained in
/// the output, both in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub duration: f64,
}

impl TimeWindow {
    /// Exclusive end of the window in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Directions for crop movement and timeline nudging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Timeline adjustment granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 0.1 second
    Fine,
    /// 1.0 second
    Coarse,
}

impl Step {
    pub fn seconds(&self) -> f64 {
        match self {
            Step::Fine => FINE_STEP_SECONDS,
            Step::Coarse => COARSE_STEP_SECONDS,
        }
    }
}

/// Output encoding parameters, immutable per encode invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingProfile {
    pub target_width: u32,
    pub target_height: u32,
    pub frame_rate: u32,
    pub audio_enabled: bool,
    pub video_codec: String,
    /// CRF quality level
    pub quality: u8,
    /// Encoder speed/deadline preset
    pub speed_preset: String,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            target_width: 512,
            target_height: 512,
            frame_rate: 30,
            audio_enabled: false,
            video_codec: "libvpx-vp9".to_string(),
            quality: 32,
            speed_preset: "good".to_string(),
        }
    }
}

/// One rung of the compression ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionStep {
    /// CRF quality level for this rung
    pub quality: u8,
    /// Target video bitrate in kbps
    pub video_bitrate_kbps: u32,
}

/// The ordered compression ladder, most-quality-first. Each rung is
/// strictly more aggressive than the last; the retry loop walks it in
/// order and stops at the first artifact under the size ceiling.
pub const COMPRESSION_LADDER: [CompressionStep; 4] = [
    CompressionStep {
        quality: 35,
        video_bitrate_kbps: 500,
    },
    CompressionStep {
        quality: 40,
        video_bitrate_kbps: 300,
    },
    CompressionStep {
        quality: 45,
        video_bitrate_kbps: 200,
    },
    CompressionStep {
        quality: 50,
        video_bitrate_kbps: 150,
    },
];

/// An encoded output file and its measured size.
///
/// Ephemeral: owned by whichever stage produced it until delivered to
/// the caller or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl OutputArtifact {
    /// Whether the artifact fits under the size ceiling
    pub fn fits_ceiling(&self) -> bool {
        self.size_bytes <= SIZE_CEILING_BYTES
    }
}
