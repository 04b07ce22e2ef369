use serde::{Deserialize, Serialize};

/// Frame rate assumed when a result carries no `fps`.
pub const FALLBACK_FPS: f32 = 30.0;

/// Frames moved by one skip-forward/backward press.
pub const FRAME_SKIP_STEP: u32 = 10;

/// Frame-index state for the results video player.
///
/// The controller never touches the playback engine itself; the orchestrator
/// turns its outputs into `player` capability operations and feeds engine
/// callbacks (play/pause/ended/timeupdate) back in. `is_playing` therefore
/// reflects actual engine state, not the user's intention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackController {
    current_frame: u32,
    total_frames: u32,
    is_playing: bool,
    fps: f32,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(FALLBACK_FPS)
    }
}

impl PlaybackController {
    #[must_use]
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { FALLBACK_FPS };
        Self {
            current_frame: 0,
            total_frames: 0,
            is_playing: false,
            fps,
        }
    }

    /// Resets with an optional fps, for runs without frame metadata.
    #[must_use]
    pub fn for_result_fps(fps: Option<f32>) -> Self {
        Self::new(fps.unwrap_or(FALLBACK_FPS))
    }

    /// Arms the controller for a completed video run. The result's frame
    /// count seeds `total_frames`; engine metadata may refine it later.
    #[must_use]
    pub fn for_result(fps: Option<f32>, frame_count: Option<u32>) -> Self {
        let mut controller = Self::new(fps.unwrap_or(FALLBACK_FPS));
        controller.total_frames = frame_count.unwrap_or(0);
        controller
    }

    /// Engine metadata arrived; derive the total frame count.
    pub fn on_metadata(&mut self, duration_seconds: f64) {
        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        self.total_frames = (duration * f64::from(self.fps)).floor() as u32;
    }

    /// Jumps to `frame` and returns the engine position in seconds.
    ///
    /// The caller supplies a frame in `[0, total_frames - 1]`; no clamping
    /// happens here.
    pub fn seek(&mut self, frame: u32) -> f64 {
        self.current_frame = frame;
        f64::from(frame) / f64::from(self.fps)
    }

    /// Skips ahead by the fixed step, clamped to the last frame.
    pub fn skip_forward(&mut self) -> f64 {
        let last = self.total_frames.saturating_sub(1);
        let target = self.current_frame.saturating_add(FRAME_SKIP_STEP).min(last);
        self.seek(target)
    }

    /// Skips back by the fixed step, clamped to frame zero.
    pub fn skip_backward(&mut self) -> f64 {
        let target = self.current_frame.saturating_sub(FRAME_SKIP_STEP);
        self.seek(target)
    }

    /// Play/pause/ended callback from the engine.
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Continuous position callback while playing.
    pub fn on_time_update(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.current_frame = (seconds * f64::from(self.fps)).floor() as u32;
        }
    }

    #[must_use]
    pub const fn current_frame(&self) -> u32 {
        self.current_frame
    }

    #[must_use]
    pub const fn total_frames(&self) -> u32 {
        self.total_frames
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn controller(total_frames: u32) -> PlaybackController {
        let mut c = PlaybackController::new(30.0);
        c.on_metadata(f64::from(total_frames) / 30.0);
        c
    }

    #[test]
    fn metadata_derives_total_frames() {
        let mut c = PlaybackController::new(30.0);
        c.on_metadata(5.0);
        assert_eq!(c.total_frames(), 150);

        c.on_metadata(4.97);
        assert_eq!(c.total_frames(), 149);
    }

    #[test]
    fn fps_falls_back_when_result_omits_it() {
        let c = PlaybackController::for_result_fps(None);
        assert_eq!(c.fps(), FALLBACK_FPS);

        let c = PlaybackController::for_result_fps(Some(24.0));
        assert_eq!(c.fps(), 24.0);
    }

    #[test]
    fn result_metadata_arms_totals_immediately() {
        let c = PlaybackController::for_result(Some(30.0), Some(150));
        assert_eq!(c.total_frames(), 150);
        assert_eq!(c.current_frame(), 0);
        assert!(!c.is_playing());
    }

    #[test]
    fn invalid_fps_is_replaced_by_fallback() {
        assert_eq!(PlaybackController::new(0.0).fps(), FALLBACK_FPS);
        assert_eq!(PlaybackController::new(-10.0).fps(), FALLBACK_FPS);
        assert_eq!(PlaybackController::new(f32::NAN).fps(), FALLBACK_FPS);
    }

    #[test]
    fn seek_sets_frame_and_returns_seconds() {
        let mut c = controller(150);
        let seconds = c.seek(60);
        assert_eq!(c.current_frame(), 60);
        assert!((seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn skip_forward_clamps_near_end() {
        let mut c = controller(150);
        c.seek(147);
        c.skip_forward();
        assert_eq!(c.current_frame(), 149);
    }

    #[test]
    fn skip_forward_moves_full_step_mid_stream() {
        let mut c = controller(150);
        c.seek(50);
        c.skip_forward();
        assert_eq!(c.current_frame(), 60);
    }

    #[test]
    fn skip_backward_clamps_at_zero() {
        let mut c = controller(150);
        c.seek(4);
        c.skip_backward();
        assert_eq!(c.current_frame(), 0);
    }

    #[test]
    fn skip_on_empty_video_stays_at_zero() {
        let mut c = controller(0);
        c.skip_forward();
        assert_eq!(c.current_frame(), 0);
        c.skip_backward();
        assert_eq!(c.current_frame(), 0);
    }

    #[test]
    fn playing_reflects_engine_callbacks_only() {
        let mut c = controller(150);
        assert!(!c.is_playing());
        c.set_playing(true);
        assert!(c.is_playing());
        c.set_playing(false);
        assert!(!c.is_playing());
    }

    #[test]
    fn time_updates_recompute_current_frame() {
        let mut c = controller(150);
        c.on_time_update(2.5);
        assert_eq!(c.current_frame(), 75);

        c.on_time_update(0.0333);
        assert_eq!(c.current_frame(), 0);

        // Garbage positions are ignored.
        c.on_time_update(f64::NAN);
        assert_eq!(c.current_frame(), 0);
    }

    proptest! {
        #[test]
        fn seek_round_trips_any_valid_frame(total in 1u32..100_000, frame_seed in 0u32..100_000) {
            let mut c = controller(total);
            let frame = frame_seed % c.total_frames().max(1);
            c.seek(frame);
            prop_assert_eq!(c.current_frame(), frame);
        }

        #[test]
        fn skips_stay_in_bounds(total in 0u32..10_000, frame_seed in 0u32..10_000, forward in proptest::bool::ANY) {
            let mut c = controller(total);
            let frame = frame_seed % c.total_frames().max(1);
            c.seek(frame);

            if forward {
                c.skip_forward();
            } else {
                c.skip_backward();
            }

            prop_assert!(c.current_frame() <= c.total_frames().saturating_sub(1));
        }
    }
}
