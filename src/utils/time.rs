//! Frame/timestamp conversion and formatting utilities
//!
//! Both preview paths (still frames and time-window midpoints) convert
//! timestamps to frame indices through the same functions, so clamping
//! behaves identically everywhere.

use crate::domain::model::TimeWindow;

/// Guard subtracted from the source end when clamping preview
/// timestamps, to avoid end-of-stream read failures.
const END_GUARD_SECONDS: f64 = 0.1;

/// Nearest frame index for a timestamp, clamped to `[0, frame_count - 1]`.
///
/// Returns 0 for degenerate inputs (no frames or non-positive rate).
pub fn frame_index_for_timestamp(timestamp: f64, frame_rate: f64, frame_count: u64) -> u64 {
    if frame_count == 0 || frame_rate <= 0.0 {
        return 0;
    }
    let index = (timestamp * frame_rate).round();
    if index <= 0.0 {
        0
    } else {
        (index as u64).min(frame_count - 1)
    }
}

/// Timestamp of a frame index in seconds
pub fn timestamp_for_frame(index: u64, frame_rate: f64) -> f64 {
    if frame_rate <= 0.0 {
        return 0.0;
    }
    index as f64 / frame_rate
}

/// Temporal midpoint of a window, clamped into the readable span of the
/// source.
pub fn clamped_midpoint(window: &TimeWindow, media_duration: f64) -> f64 {
    let mid = window.start + window.duration / 2.0;
    mid.clamp(0.0, (media_duration - END_GUARD_SECONDS).max(0.0))
}

/// Format seconds for display, e.g. "2.40s"
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TimeWindow;

    #[test]
    fn test_frame_index_rounds_to_nearest() {
        assert_eq!(frame_index_for_timestamp(0.0, 30.0, 90), 0);
        assert_eq!(frame_index_for_timestamp(1.0, 30.0, 90), 30);
        // 0.51s at 30fps is frame 15.3, rounded down to 15
        assert_eq!(frame_index_for_timestamp(0.51, 30.0, 90), 15);
        // 0.52s is frame 15.6, rounded up to 16
        assert_eq!(frame_index_for_timestamp(0.52, 30.0, 90), 16);
    }

    #[test]
    fn test_frame_index_clamps_to_stream() {
        assert_eq!(frame_index_for_timestamp(100.0, 30.0, 90), 89);
        assert_eq!(frame_index_for_timestamp(-1.0, 30.0, 90), 0);
        assert_eq!(frame_index_for_timestamp(1.0, 0.0, 90), 0);
        assert_eq!(frame_index_for_timestamp(1.0, 30.0, 0), 0);
    }

    #[test]
    fn test_timestamp_for_frame_inverts() {
        assert_eq!(timestamp_for_frame(30, 30.0), 1.0);
        assert_eq!(timestamp_for_frame(0, 30.0), 0.0);
        assert_eq!(timestamp_for_frame(10, 0.0), 0.0);
    }

    #[test]
    fn test_midpoint_clamped_away_from_end() {
        let window = TimeWindow {
            start: 1.0,
            duration: 1.0,
        };
        assert_eq!(clamped_midpoint(&window, 3.0), 1.5);

        // Window reaching the source end: midpoint must back off the end
        let tail = TimeWindow {
            start: 2.8,
            duration: 0.2,
        };
        let mid = clamped_midpoint(&tail, 2.95);
        assert!((mid - 2.85).abs() < 1e-9);

        // Degenerate source
        let zero = TimeWindow {
            start: 0.0,
            duration: 0.0,
        };
        assert_eq!(clamped_midpoint(&zero, 0.0), 0.0);
    }
}
