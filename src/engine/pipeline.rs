//! Encoding pipeline
//!
//! Derives a deterministic encoder argument set from the trim window,
//! crop region and profile, then drives one cancellable subprocess per
//! encode. A pipeline is single-flight: a second encode while one is
//! outstanding is rejected, and cancellation always yields a definite
//! outcome.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::adapters::exec_ffmpeg::{CancelHandle, FfmpegBinary, FfmpegInvocation};
use crate::domain::model::{
    CompressionStep, CropRegion, EncodingProfile, OutputArtifact, TimeWindow,
};
use crate::engine::encode_slots;
use crate::error::{StickClipError, StickClipResult};

/// One fully-specified encode invocation
#[derive(Debug)]
pub struct EncodeRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub window: TimeWindow,
    pub crop: CropRegion,
    pub profile: &'a EncodingProfile,
    /// Compression-ladder override; None for the primary encode
    pub tuning: Option<CompressionStep>,
}

/// Build the encoder argument vector for a request.
///
/// The primary path encodes at the profile's quality with an
/// unconstrained bitrate; the compression path pins the codec to VP9,
/// caps the video bitrate and squeezes audio down to 64 kbps.
pub fn encode_args(request: &EncodeRequest<'_>) -> Vec<String> {
    let window = request.window;
    let crop = request.crop;
    let profile = request.profile;

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-ss".into(),
        format!("{:.3}", window.start),
        "-t".into(),
        format!("{:.3}", window.duration),
        "-i".into(),
        request.source.display().to_string(),
        "-vf".into(),
        format!(
            "crop={}:{}:{}:{},scale={}:{}:flags=lanczos",
            crop.width,
            crop.height,
            crop.x,
            crop.y,
            profile.target_width,
            profile.target_height
        ),
        "-r".into(),
        profile.frame_rate.to_string(),
    ];

    match request.tuning {
        None => {
            if profile.audio_enabled {
                args.extend(["-c:a".into(), "libopus".into(), "-b:a".into(), "96k".into()]);
            } else {
                args.push("-an".into());
            }
            args.extend([
                "-c:v".into(),
                profile.video_codec.clone(),
                "-crf".into(),
                profile.quality.to_string(),
                "-b:v".into(),
                "0".into(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                "-deadline".into(),
                profile.speed_preset.clone(),
            ]);
        }
        Some(step) => {
            args.extend([
                "-c:v".into(),
                "libvpx-vp9".into(),
                "-crf".into(),
                step.quality.to_string(),
                "-b:v".into(),
                format!("{}k", step.video_bitrate_kbps),
            ]);
            if profile.audio_enabled {
                args.extend(["-c:a".into(), "libopus".into(), "-b:a".into(), "64k".into()]);
            } else {
                args.push("-an".into());
            }
        }
    }

    args.push(request.output.display().to_string());
    args
}

struct PipelineShared {
    ffmpeg: FfmpegBinary,
    in_flight: Mutex<Option<CancelHandle>>,
}

/// Cancellable, single-flight encoder front-end.
///
/// Cheap to clone; clones share the in-flight slot, so a clone held by
/// another task can cancel the encode this one is awaiting.
#[derive(Clone)]
pub struct EncodingPipeline {
    inner: Arc<PipelineShared>,
}

impl EncodingPipeline {
    pub fn new(ffmpeg: FfmpegBinary) -> Self {
        Self {
            inner: Arc::new(PipelineShared {
                ffmpeg,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Run one encode to completion, cancellation, or failure.
    ///
    /// Rejects with `EncoderBusy` when an encode is already in flight.
    /// On cancellation no partial output file is left behind.
    pub async fn encode(&self, request: &EncodeRequest<'_>) -> StickClipResult<OutputArtifact> {
        let cancel = CancelHandle::new();
        {
            let mut slot = self.inner.in_flight.lock().unwrap();
            if slot.is_some() {
                return Err(StickClipError::EncoderBusy);
            }
            *slot = Some(cancel.clone());
        }

        let result = self.run_encode(request, &cancel).await;
        self.inner.in_flight.lock().unwrap().take();

        if matches!(result, Err(StickClipError::Cancelled)) {
            // Best-effort removal of whatever the encoder got around to
            // writing before it died.
            let _ = tokio::fs::remove_file(request.output).await;
        }
        result
    }

    /// Signal the in-flight encode, if any, to terminate. Returns
    /// whether there was one.
    pub fn cancel(&self) -> bool {
        match self.inner.in_flight.lock().unwrap().as_ref() {
            Some(handle) => {
                info!("cancelling in-flight encode");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    async fn run_encode(
        &self,
        request: &EncodeRequest<'_>,
        cancel: &CancelHandle,
    ) -> StickClipResult<OutputArtifact> {
        let _permit = encode_slots()
            .acquire()
            .await
            .expect("encode slot pool is never closed");

        let args = encode_args(request);
        info!(
            "encoding {} -> {} ({:.1}s at {:.1}s)",
            request.source.display(),
            request.output.display(),
            request.window.duration,
            request.window.start
        );

        let invocation = FfmpegInvocation::spawn(&self.inner.ffmpeg, &args)?;
        let outcome = invocation.run(cancel).await?;

        if !outcome.success {
            warn!("encoder exited non-zero");
            return Err(StickClipError::Encoding {
                diagnostic: outcome.stderr.trim().to_string(),
            });
        }

        let size_bytes = match tokio::fs::metadata(request.output).await {
            Ok(metadata) => metadata.len(),
            Err(_) => {
                return Err(StickClipError::Encoding {
                    diagnostic: format!(
                        "encoder reported success but produced no output: {}",
                        outcome.stderr.trim()
                    ),
                });
            }
        };

        debug!("encode finished, {} bytes", size_bytes);
        Ok(OutputArtifact {
            path: request.output.to_path_buf(),
            size_bytes,
        })
    }
}
