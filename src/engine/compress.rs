//! Size-constrained compression retry loop
//!
//! Walks the ordered compression ladder, re-encoding the same selection
//! with increasingly aggressive parameters until an artifact fits the
//! size ceiling. The ladder itself is data; the traversal is a generic
//! first-acceptable combinator so the stopping logic is testable
//! without an encoder.

use std::future::Future;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::model::{
    CropRegion, EncodingProfile, OutputArtifact, TimeWindow, COMPRESSION_LADDER,
    SIZE_CEILING_BYTES,
};
use crate::engine::pipeline::{EncodeRequest, EncodingPipeline};
use crate::error::{StickClipError, StickClipResult};

/// Try each step in order and return the first artifact whose size fits
/// the ceiling.
///
/// An oversized artifact's file is deleted before the next attempt; an
/// attempt error aborts the walk (no rung failure is swallowed). When
/// every step produced an oversized artifact the loop fails with
/// `CompressionExhausted` carrying the attempt count.
pub async fn first_under_ceiling<S, A, Fut>(
    steps: &[S],
    ceiling: u64,
    mut attempt: A,
) -> StickClipResult<OutputArtifact>
where
    S: Copy,
    A: FnMut(usize, S) -> Fut,
    Fut: Future<Output = StickClipResult<OutputArtifact>>,
{
    for (index, step) in steps.iter().enumerate() {
        let artifact = attempt(index, *step).await?;
        if artifact.size_bytes <= ceiling {
            return Ok(artifact);
        }
        warn!(
            "attempt {}/{} still oversized ({} bytes > {} bytes)",
            index + 1,
            steps.len(),
            artifact.size_bytes,
            ceiling
        );
        let _ = tokio::fs::remove_file(&artifact.path).await;
    }
    Err(StickClipError::CompressionExhausted {
        attempts: steps.len(),
    })
}

/// Drives the encoding pipeline down the compression ladder
pub struct CompressionRetryLoop<'a> {
    pipeline: &'a EncodingPipeline,
}

impl<'a> CompressionRetryLoop<'a> {
    pub fn new(pipeline: &'a EncodingPipeline) -> Self {
        Self { pipeline }
    }

    /// Re-encode the selection through the ladder until the output fits
    /// the 256 KiB ceiling. First success wins; each rejected rung's
    /// file is deleted before the next rung runs.
    pub async fn shrink(
        &self,
        source: &Path,
        window: TimeWindow,
        crop: CropRegion,
        profile: &EncodingProfile,
        workdir: &Path,
    ) -> StickClipResult<OutputArtifact> {
        first_under_ceiling(&COMPRESSION_LADDER, SIZE_CEILING_BYTES, |index, step| {
            let output = workdir.join(format!("compressed_{}.webm", index + 1));
            async move {
                info!(
                    "compression attempt {}/{}: crf {} at {}k",
                    index + 1,
                    COMPRESSION_LADDER.len(),
                    step.quality,
                    step.video_bitrate_kbps
                );
                self.pipeline
                    .encode(&EncodeRequest {
                        source,
                        output: &output,
                        window,
                        crop,
                        profile,
                        tuning: Some(step),
                    })
                    .await
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn write_artifact(dir: &Path, name: &str, size: usize) -> OutputArtifact {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        OutputArtifact {
            path,
            size_bytes: size as u64,
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = [300_000u64, 180_000, 120_000, 90_000];
        let visited = RefCell::new(Vec::new());

        let artifact = first_under_ceiling(&[0usize, 1, 2, 3], 262_144, |index, step| {
            visited.borrow_mut().push(step);
            let artifact = write_artifact(
                dir.path(),
                &format!("attempt_{}.webm", index),
                sizes[index] as usize,
            );
            async move { Ok(artifact) }
        })
        .await
        .unwrap();

        // Rung 2 fits, so rungs 3 and 4 are never attempted.
        assert_eq!(*visited.borrow(), vec![0, 1]);
        assert_eq!(artifact.size_bytes, 180_000);
        assert!(artifact.path.exists());
        // The rejected first attempt was deleted.
        assert!(!dir.path().join("attempt_0.webm").exists());
    }

    #[tokio::test]
    async fn test_exhaustion_after_every_rung() {
        let dir = tempfile::tempdir().unwrap();
        let attempts = RefCell::new(0usize);

        let err = first_under_ceiling(&[10u8, 20, 30, 40], 1_000, |index, _step| {
            *attempts.borrow_mut() += 1;
            let artifact = write_artifact(dir.path(), &format!("fat_{}.webm", index), 2_000);
            async move { Ok(artifact) }
        })
        .await
        .unwrap_err();

        assert_eq!(*attempts.borrow(), 4);
        assert!(matches!(
            err,
            StickClipError::CompressionExhausted { attempts: 4 }
        ));
        // Every oversized attempt was cleaned up.
        for index in 0..4 {
            assert!(!dir.path().join(format!("fat_{}.webm", index)).exists());
        }
    }

    #[tokio::test]
    async fn test_rung_error_aborts_the_walk() {
        let attempts = RefCell::new(0usize);

        let err = first_under_ceiling(&[1u8, 2, 3, 4], 1_000, |_index, _step| {
            *attempts.borrow_mut() += 1;
            async move {
                Err::<OutputArtifact, _>(StickClipError::Encoding {
                    diagnostic: "boom".to_string(),
                })
            }
        })
        .await
        .unwrap_err();

        assert_eq!(*attempts.borrow(), 1);
        assert!(matches!(err, StickClipError::Encoding { .. }));
    }

    #[tokio::test]
    async fn test_exact_ceiling_is_accepted() {
        let artifact = first_under_ceiling(&[0u8], 262_144, |_, _| async move {
            Ok(OutputArtifact {
                path: PathBuf::from("exact.webm"),
                size_bytes: 262_144,
            })
        })
        .await
        .unwrap();
        assert_eq!(artifact.size_bytes, 262_144);
    }
}
