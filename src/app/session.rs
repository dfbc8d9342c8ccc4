//! Edit session state machine
//!
//! One session is one user's end-to-end editing interaction: probe,
//! iterative time/crop adjustment with previews, encode, optional
//! compression, delivery. The session is the sole owner of its
//! temporary working directory; whatever is not delivered is removed
//! when the directory drops, on every exit path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::adapters::exec_ffmpeg::FfmpegBinary;
use crate::domain::model::{
    CropRegion, Direction, EncodingProfile, MediaInfo, OutputArtifact, Step, TimeWindow,
    CROP_MOVE_STEP_PIXELS,
};
use crate::domain::rules::{CropPlanner, TimelineSelector};
use crate::engine::compress::CompressionRetryLoop;
use crate::engine::pipeline::{EncodeRequest, EncodingPipeline};
use crate::engine::preview::PreviewRenderer;
use crate::error::{StickClipError, StickClipResult};
use crate::ports::MediaProbePort;

/// Editing phases of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Acquiring,
    TimeEditing,
    CropEditing,
    Preview,
    Processing,
    AwaitingCompressionChoice,
    Delivered,
    Failed,
    Cancelled,
}

impl EditPhase {
    pub fn name(&self) -> &'static str {
        match self {
            EditPhase::Acquiring => "acquiring",
            EditPhase::TimeEditing => "time editing",
            EditPhase::CropEditing => "crop editing",
            EditPhase::Preview => "previewing",
            EditPhase::Processing => "processing",
            EditPhase::AwaitingCompressionChoice => "awaiting a compression choice",
            EditPhase::Delivered => "delivered",
            EditPhase::Failed => "failed",
            EditPhase::Cancelled => "cancelled",
        }
    }
}

/// Result of the primary encode
#[derive(Debug)]
pub enum EncodeOutcome {
    /// The artifact already fits the size ceiling
    Complete(OutputArtifact),
    /// Artifact exceeds the ceiling; the session now waits for a
    /// compress-or-cancel decision
    Oversized { size_bytes: u64 },
}

/// One user's editing session, from acquisition to delivery.
pub struct EditSession {
    source: PathBuf,
    media: MediaInfo,
    crop: CropRegion,
    window: TimeWindow,
    profile: EncodingProfile,
    phase: EditPhase,
    workdir: TempDir,
    pipeline: EncodingPipeline,
    renderer: PreviewRenderer,
    /// Primary artifact parked while the user decides on compression.
    /// Deleting it (on every path out of that decision) is this
    /// session's responsibility alongside the compressed file.
    oversized: Option<OutputArtifact>,
}

impl EditSession {
    /// Acquire the source: probe it, derive the initial centered crop
    /// and time window, and land in the time-editing phase.
    pub async fn open(
        ffmpeg: FfmpegBinary,
        probe: &dyn MediaProbePort,
        source: impl Into<PathBuf>,
        profile: EncodingProfile,
    ) -> StickClipResult<Self> {
        let source = source.into();
        let workdir = tempfile::Builder::new().prefix("stickclip_").tempdir()?;

        let media = probe.probe(&source).await?;
        info!(
            "opened {}: {}x{} @ {:.2} fps, {:.2}s",
            source.display(),
            media.width,
            media.height,
            media.frame_rate,
            media.duration()
        );

        let crop = CropPlanner::initial_crop(&media, profile.target_width, profile.target_height)?;
        let window = TimelineSelector::initial_window(&media);

        Ok(Self {
            source,
            media,
            crop,
            window,
            profile,
            phase: EditPhase::TimeEditing,
            workdir,
            pipeline: EncodingPipeline::new(ffmpeg.clone()),
            renderer: PreviewRenderer::new(ffmpeg),
            oversized: None,
        })
    }

    pub fn media(&self) -> &MediaInfo {
        &self.media
    }

    pub fn crop(&self) -> CropRegion {
        self.crop
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// Clone of the pipeline handle, for cancelling an in-flight encode
    /// from another task.
    pub fn pipeline_handle(&self) -> EncodingPipeline {
        self.pipeline.clone()
    }

    fn expect_phase(&self, allowed: &[EditPhase], action: &'static str) -> StickClipResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(StickClipError::InvalidPhase {
                phase: self.phase.name(),
                action,
            })
        }
    }

    // --- time editing ---

    /// Nudge the window start
    pub fn adjust_start(&mut self, direction: Direction, step: Step) -> StickClipResult<TimeWindow> {
        self.expect_phase(&[EditPhase::TimeEditing], "adjust the start time")?;
        self.window = TimelineSelector::adjust_start(self.window, &self.media, direction, step);
        Ok(self.window)
    }

    /// Shrink or grow the window duration
    pub fn adjust_duration(
        &mut self,
        direction: Direction,
        step: Step,
    ) -> StickClipResult<TimeWindow> {
        self.expect_phase(&[EditPhase::TimeEditing], "adjust the duration")?;
        self.window = TimelineSelector::adjust_duration(self.window, &self.media, direction, step);
        Ok(self.window)
    }

    /// Replace the window with an absolute selection, sanitized against
    /// the source bounds
    pub fn set_window(&mut self, start: f64, duration: f64) -> StickClipResult<TimeWindow> {
        self.expect_phase(&[EditPhase::TimeEditing], "select a time window")?;
        self.window = TimelineSelector::clamp_window(&self.media, start, duration);
        Ok(self.window)
    }

    /// Move on to crop editing
    pub fn begin_crop_editing(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::TimeEditing], "begin crop editing")?;
        self.phase = EditPhase::CropEditing;
        Ok(())
    }

    // --- crop editing ---

    /// Step the crop region in a direction
    pub fn move_crop(&mut self, direction: Direction) -> StickClipResult<CropRegion> {
        self.expect_phase(&[EditPhase::CropEditing], "move the crop")?;
        self.crop = CropPlanner::move_crop(&self.media, self.crop, direction, CROP_MOVE_STEP_PIXELS);
        Ok(self.crop)
    }

    /// Resize the crop around its current center
    pub fn resize_crop(&mut self, width: u32, height: u32) -> StickClipResult<CropRegion> {
        self.expect_phase(&[EditPhase::CropEditing], "resize the crop")?;
        self.crop = CropPlanner::resize_crop(&self.media, self.crop, width, height)?;
        Ok(self.crop)
    }

    /// Replace the crop with an absolute rectangle, clamped to frame
    /// bounds
    pub fn set_crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> StickClipResult<CropRegion> {
        self.expect_phase(&[EditPhase::CropEditing], "set the crop")?;
        self.crop = CropPlanner::clamp_region(&self.media, x, y, width, height)?;
        Ok(self.crop)
    }

    /// Go back from crop editing to time editing
    pub fn back_to_time_editing(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::CropEditing], "return to time editing")?;
        self.phase = EditPhase::TimeEditing;
        Ok(())
    }

    /// Move on to the preview phase
    pub fn enter_preview(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::CropEditing], "enter preview")?;
        self.phase = EditPhase::Preview;
        Ok(())
    }

    /// Return from preview to crop editing
    pub fn edit_crop_again(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::Preview], "return to crop editing")?;
        self.phase = EditPhase::CropEditing;
        Ok(())
    }

    /// Return from preview to time editing
    pub fn edit_time_again(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::Preview], "return to time editing")?;
        self.phase = EditPhase::TimeEditing;
        Ok(())
    }

    // --- previews ---

    /// Annotated still of the current crop at the start of the window
    pub async fn render_crop_preview(&self) -> StickClipResult<Option<Vec<u8>>> {
        self.expect_phase(
            &[EditPhase::CropEditing, EditPhase::Preview],
            "render a crop preview",
        )?;
        self.renderer
            .render_crop_preview(
                &self.media,
                &self.source,
                self.window.start,
                self.crop,
                self.workdir.path(),
            )
            .await
    }

    /// Annotated still at the midpoint of the current window
    pub async fn render_time_preview(&self) -> StickClipResult<Option<Vec<u8>>> {
        self.expect_phase(
            &[EditPhase::TimeEditing, EditPhase::Preview],
            "render a time preview",
        )?;
        self.renderer
            .render_time_preview(
                &self.media,
                &self.source,
                self.window,
                self.crop,
                self.workdir.path(),
            )
            .await
    }

    /// Short motion preview of the current selection
    pub async fn render_motion_preview(&self) -> StickClipResult<OutputArtifact> {
        self.expect_phase(&[EditPhase::Preview], "render a motion preview")?;
        let output = self.workdir.path().join("preview.mp4");
        self.renderer
            .render_motion_preview(&self.source, self.window, self.crop, &output)
            .await
    }

    // --- encoding ---

    /// Run the primary encode of the current selection.
    ///
    /// Returns `Complete` when the artifact fits the size ceiling, or
    /// `Oversized` after parking the artifact and entering the
    /// compression-choice phase. Cancellation and encoder failure both
    /// return the session to the preview phase for another try.
    pub async fn encode(&mut self) -> StickClipResult<EncodeOutcome> {
        self.expect_phase(&[EditPhase::Preview], "encode")?;
        self.phase = EditPhase::Processing;

        let output = self.workdir.path().join("result.webm");
        let request = EncodeRequest {
            source: &self.source,
            output: &output,
            window: self.window,
            crop: self.crop,
            profile: &self.profile,
            tuning: None,
        };

        match self.pipeline.encode(&request).await {
            Ok(artifact) if artifact.fits_ceiling() => Ok(EncodeOutcome::Complete(artifact)),
            Ok(artifact) => {
                let size_bytes = artifact.size_bytes;
                warn!(
                    "artifact is {} KiB, over the {} KiB ceiling",
                    size_bytes / 1024,
                    crate::domain::model::SIZE_CEILING_BYTES / 1024
                );
                self.oversized = Some(artifact);
                self.phase = EditPhase::AwaitingCompressionChoice;
                Ok(EncodeOutcome::Oversized { size_bytes })
            }
            Err(
                err @ (StickClipError::Cancelled
                | StickClipError::Encoding { .. }
                | StickClipError::EncoderBusy),
            ) => {
                // Source and selection remain valid; let the user retry.
                self.phase = EditPhase::Preview;
                Err(err)
            }
            Err(err) => {
                self.phase = EditPhase::Failed;
                Err(err)
            }
        }
    }

    /// Drive the compression ladder over the current selection.
    ///
    /// On success the parked oversized artifact is deleted and the
    /// shrunken one returned. Ladder exhaustion deletes the parked
    /// artifact too and fails the session; the caller is expected to
    /// surface remediation choices (shorter window, smaller target,
    /// no audio) rather than retry automatically.
    pub async fn compress(&mut self) -> StickClipResult<OutputArtifact> {
        self.expect_phase(&[EditPhase::AwaitingCompressionChoice], "compress")?;
        self.phase = EditPhase::Processing;

        let retry = CompressionRetryLoop::new(&self.pipeline);
        let result = retry
            .shrink(
                &self.source,
                self.window,
                self.crop,
                &self.profile,
                self.workdir.path(),
            )
            .await;

        match result {
            Ok(artifact) => {
                self.discard_oversized().await;
                Ok(artifact)
            }
            Err(err @ StickClipError::Cancelled) => {
                // Back to the decision point; the oversized artifact
                // stays parked.
                self.phase = EditPhase::AwaitingCompressionChoice;
                Err(err)
            }
            Err(err) => {
                self.discard_oversized().await;
                self.phase = EditPhase::Failed;
                Err(err)
            }
        }
    }

    /// Decline compression: drop the oversized artifact and end the
    /// session.
    pub async fn decline_compression(&mut self) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::AwaitingCompressionChoice], "decline compression")?;
        self.discard_oversized().await;
        self.phase = EditPhase::Cancelled;
        Ok(())
    }

    /// Cancel the in-flight encode, if any
    pub fn cancel_encode(&self) -> bool {
        self.pipeline.cancel()
    }

    /// Move the finished artifact out of the session workspace and
    /// finish the session.
    pub async fn deliver_to(
        &mut self,
        artifact: &OutputArtifact,
        destination: &Path,
    ) -> StickClipResult<()> {
        self.expect_phase(&[EditPhase::Processing], "deliver")?;
        tokio::fs::copy(&artifact.path, destination).await?;
        let _ = tokio::fs::remove_file(&artifact.path).await;
        self.phase = EditPhase::Delivered;
        info!(
            "delivered {} ({} KiB)",
            destination.display(),
            artifact.size_bytes / 1024
        );
        Ok(())
    }

    /// Abandon the session. Everything still inside the workspace is
    /// removed with it.
    pub fn abandon(mut self) {
        self.phase = EditPhase::Cancelled;
        info!("session abandoned");
    }

    async fn discard_oversized(&mut self) {
        if let Some(artifact) = self.oversized.take() {
            let _ = tokio::fs::remove_file(&artifact.path).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubProbe(MediaInfo);

    #[async_trait]
    impl MediaProbePort for StubProbe {
        async fn probe(&self, _path: &Path) -> StickClipResult<MediaInfo> {
            Ok(self.0.clone())
        }
    }

    fn stub_probe() -> StubProbe {
        StubProbe(MediaInfo::new(1920, 1080, 30.0, 90).unwrap())
    }

    async fn open_session() -> EditSession {
        EditSession::open(
            FfmpegBinary::at("ffmpeg"),
            &stub_probe(),
            "source.mp4",
            EncodingProfile::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_initializes_centered_state() {
        let session = open_session().await;
        assert_eq!(session.phase(), EditPhase::TimeEditing);
        assert_eq!(
            session.crop(),
            CropRegion {
                x: 704,
                y: 284,
                width: 512,
                height: 512
            }
        );
        assert_eq!(session.window().start, 0.0);
        assert_eq!(session.window().duration, 3.0);
    }

    #[tokio::test]
    async fn test_editing_phases_flow_both_ways() {
        let mut session = open_session().await;
        session.adjust_start(Direction::Right, Step::Fine).unwrap();
        session.begin_crop_editing().unwrap();
        assert_eq!(session.phase(), EditPhase::CropEditing);

        session.move_crop(Direction::Left).unwrap();
        session.back_to_time_editing().unwrap();
        assert_eq!(session.phase(), EditPhase::TimeEditing);

        session.begin_crop_editing().unwrap();
        session.enter_preview().unwrap();
        assert_eq!(session.phase(), EditPhase::Preview);

        session.edit_time_again().unwrap();
        assert_eq!(session.phase(), EditPhase::TimeEditing);
    }

    #[tokio::test]
    async fn test_out_of_phase_operations_are_rejected() {
        let mut session = open_session().await;

        // Crop operations require the crop-editing phase.
        let err = session.move_crop(Direction::Up).unwrap_err();
        assert!(matches!(err, StickClipError::InvalidPhase { .. }));
        let crop_before = session.crop();

        // Time operations are rejected once crop editing begins.
        session.begin_crop_editing().unwrap();
        assert!(session.adjust_start(Direction::Left, Step::Fine).is_err());
        assert!(session.set_window(0.0, 1.0).is_err());

        // Encoding requires the preview phase.
        assert!(matches!(
            session.encode().await.unwrap_err(),
            StickClipError::InvalidPhase { .. }
        ));

        // Rejected operations never mutate state.
        assert_eq!(session.crop(), crop_before);
        assert_eq!(session.phase(), EditPhase::CropEditing);
    }

    #[tokio::test]
    async fn test_absolute_selection_is_sanitized() {
        let mut session = open_session().await;
        let window = session.set_window(10.0, 10.0).unwrap();
        assert_eq!(window.duration, 3.0);
        assert_eq!(window.start, 0.0);

        session.begin_crop_editing().unwrap();
        let crop = session.set_crop(5000, 5000, 512, 512).unwrap();
        assert_eq!(crop.x, 1408);
        assert_eq!(crop.y, 568);
        assert!(session.set_crop(0, 0, 0, 512).is_err());
    }

    #[tokio::test]
    async fn test_move_crop_uses_fixed_step() {
        let mut session = open_session().await;
        session.begin_crop_editing().unwrap();
        let before = session.crop();
        let after = session.move_crop(Direction::Down).unwrap();
        assert_eq!(after.y, before.y + CROP_MOVE_STEP_PIXELS);
    }

    #[tokio::test]
    async fn test_decline_compression_discards_parked_artifact() {
        let mut session = open_session().await;

        // Park an oversized artifact the way a too-big encode would.
        let parked = session.workdir.path().join("result.webm");
        std::fs::write(&parked, vec![0u8; 1024]).unwrap();
        session.oversized = Some(OutputArtifact {
            path: parked.clone(),
            size_bytes: 300 * 1024,
        });
        session.phase = EditPhase::AwaitingCompressionChoice;

        session.decline_compression().await.unwrap();
        assert_eq!(session.phase(), EditPhase::Cancelled);
        assert!(!parked.exists());
    }

    #[tokio::test]
    async fn test_workspace_is_removed_on_drop() {
        let session = open_session().await;
        let workdir = session.workdir.path().to_path_buf();
        std::fs::write(workdir.join("leftover.webm"), b"junk").unwrap();
        assert!(workdir.exists());
        session.abandon();
        assert!(!workdir.exists());
    }

    #[tokio::test]
    async fn test_cancel_with_no_encode_in_flight() {
        let session = open_session().await;
        assert!(!session.cancel_encode());
    }
}
