// Domain rules - Crop planning and timeline selection policies

use crate::domain::model::*;
use crate::error::{StickClipError, StickClipResult};

/// Business rules for placing and moving the crop rectangle.
///
/// All functions are pure: they take the current state and return the
/// next one, clamped so the region never leaves the frame.
pub struct CropPlanner;

impl CropPlanner {
    /// Center a target rectangle on the frame center.
    ///
    /// A rectangle that would cross a frame edge is shifted inward, not
    /// shrunk. A requested dimension larger than the frame is clamped to
    /// the frame dimension, so the result may be smaller than requested.
    pub fn initial_crop(
        media: &MediaInfo,
        target_width: u32,
        target_height: u32,
    ) -> StickClipResult<CropRegion> {
        if target_width == 0 || target_height == 0 {
            return Err(StickClipError::InvalidGeometry {
                width: target_width,
                height: target_height,
            });
        }
        Ok(Self::crop_around_center(
            media,
            media.width / 2,
            media.height / 2,
            target_width,
            target_height,
        ))
    }

    /// Shift the region by `step` pixels in the requested direction,
    /// clamped to the frame bounds.
    pub fn move_crop(
        media: &MediaInfo,
        region: CropRegion,
        direction: Direction,
        step: u32,
    ) -> CropRegion {
        let mut next = region;
        match direction {
            Direction::Up => next.y = region.y.saturating_sub(step),
            Direction::Down => next.y = (region.y + step).min(media.height - region.height),
            Direction::Left => next.x = region.x.saturating_sub(step),
            Direction::Right => next.x = (region.x + step).min(media.width - region.width),
        }
        next
    }

    /// Resize the region, preserving its current center.
    pub fn resize_crop(
        media: &MediaInfo,
        region: CropRegion,
        new_width: u32,
        new_height: u32,
    ) -> StickClipResult<CropRegion> {
        if new_width == 0 || new_height == 0 {
            return Err(StickClipError::InvalidGeometry {
                width: new_width,
                height: new_height,
            });
        }
        let (cx, cy) = region.center();
        Ok(Self::crop_around_center(media, cx, cy, new_width, new_height))
    }

    /// Sanitize an absolute caller-supplied rectangle: dimensions are
    /// clamped to the frame and the position shifted inward.
    pub fn clamp_region(
        media: &MediaInfo,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> StickClipResult<CropRegion> {
        if width == 0 || height == 0 {
            return Err(StickClipError::InvalidGeometry { width, height });
        }
        let width = width.min(media.width);
        let height = height.min(media.height);
        let x = x.min(media.width - width);
        let y = y.min(media.height - height);
        Ok(CropRegion {
            x,
            y,
            width,
            height,
        })
    }

    fn crop_around_center(
        media: &MediaInfo,
        center_x: u32,
        center_y: u32,
        width: u32,
        height: u32,
    ) -> CropRegion {
        let width = width.min(media.width);
        let height = height.min(media.height);
        let mut x = center_x.saturating_sub(width / 2);
        let mut y = center_y.saturating_sub(height / 2);
        if x + width > media.width {
            x = media.width - width;
        }
        if y + height > media.height {
            y = media.height - height;
        }
        CropRegion {
            x,
            y,
            width,
            height,
        }
    }
}

/// Business rules for the bounded time window.
///
/// Start adjustments clamp; duration growth that would run past the end
/// of the source is rejected as a no-op rather than clamped.
pub struct TimelineSelector;

impl TimelineSelector {
    /// Initial window: starts at zero, capped at the shorter of the
    /// maximum clip length and the source duration.
    pub fn initial_window(media: &MediaInfo) -> TimeWindow {
        TimeWindow {
            start: 0.0,
            duration: MAX_CLIP_SECONDS.min(media.duration()),
        }
    }

    /// Nudge the window start left or right, keeping the duration fixed
    /// and the whole window inside the source.
    pub fn adjust_start(
        window: TimeWindow,
        media: &MediaInfo,
        direction: Direction,
        step: Step,
    ) -> TimeWindow {
        let step = step.seconds();
        let start = match direction {
            Direction::Left => (window.start - step).max(0.0),
            Direction::Right => (window.start + step)
                .min(media.duration() - window.duration)
                .max(0.0),
            Direction::Up | Direction::Down => window.start,
        };
        TimeWindow {
            start,
            duration: window.duration,
        }
    }

    /// Shrink or grow the window duration.
    ///
    /// Shrinking floors at the minimum clip length. Growth is capped at
    /// the maximum clip length and rejected outright (window unchanged)
    /// when it would push the window end past the source duration.
    pub fn adjust_duration(
        window: TimeWindow,
        media: &MediaInfo,
        direction: Direction,
        step: Step,
    ) -> TimeWindow {
        let step = step.seconds();
        let duration = match direction {
            Direction::Left => {
                let shrunk = (window.duration - step).max(MIN_CLIP_SECONDS);
                if window.start + shrunk <= media.duration() {
                    shrunk
                } else {
                    window.duration
                }
            }
            Direction::Right => {
                let cap = MAX_CLIP_SECONDS.min(media.duration());
                let grown = (window.duration + step).min(cap);
                if window.start + grown <= media.duration() {
                    grown
                } else {
                    window.duration
                }
            }
            Direction::Up | Direction::Down => window.duration,
        };
        TimeWindow {
            start: window.start,
            duration,
        }
    }

    /// Sanitize an absolute caller-supplied window against the source
    /// duration and the clip-length bounds.
    pub fn clamp_window(media: &MediaInfo, start: f64, duration: f64) -> TimeWindow {
        let media_duration = media.duration();
        let duration = duration
            .max(MIN_CLIP_SECONDS)
            .min(MAX_CLIP_SECONDS)
            .min(media_duration);
        let start = start.max(0.0).min((media_duration - duration).max(0.0));
        TimeWindow { start, duration }
    }
}
