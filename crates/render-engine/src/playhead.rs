//! Playhead: the single owner of "current time".
//!
//! The playhead never reads a clock itself. Every operation takes the
//! caller's monotonic `now` (seconds), which keeps playback deterministic
//! under a virtual clock.
//!
//! While playing, time is `anchor_time + (now - anchor_wall)`. With looping
//! enabled this wraps modulo the duration (a sawtooth where `d` maps to
//! `0`); otherwise playback stops at `d`. Scrubbing re-anchors both values,
//! so playback continues from the scrubbed position.

use karo_template_model::template::FALLBACK_DURATION_SECS;
use serde::Serialize;

/// Playback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    Stopped,
    Playing,
    /// A scrub gesture is in progress. Frame ticks do not move time.
    Scrubbing,
}

/// Snapshot of playback for hosts and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration_secs: f64,
    pub is_playing: bool,
    pub mode: PlaybackMode,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
}

#[derive(Debug, Clone)]
pub struct Playhead {
    duration_secs: f64,
    current_time: f64,
    mode: PlaybackMode,
    loop_playback: bool,
    /// Whether `end_scrub` should resume playing.
    resume_after_scrub: bool,
    anchor_wall: f64,
    anchor_time: f64,
}

impl Playhead {
    /// A stopped, looping playhead at `0.0`.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs: sanitize_duration(duration_secs),
            current_time: 0.0,
            mode: PlaybackMode::Stopped,
            loop_playback: true,
            resume_after_scrub: false,
            anchor_wall: 0.0,
            anchor_time: 0.0,
        }
    }

    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }

    pub fn is_looping(&self) -> bool {
        self.loop_playback
    }

    pub fn set_loop(&mut self, loop_playback: bool) {
        self.loop_playback = loop_playback;
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.current_time,
            duration_secs: self.duration_secs,
            is_playing: self.is_playing(),
            mode: self.mode,
            loop_playback: self.loop_playback,
        }
    }

    /// Start (or keep) playing from the current time.
    pub fn play(&mut self, now: f64) {
        match self.mode {
            PlaybackMode::Playing => {}
            PlaybackMode::Scrubbing => self.resume_after_scrub = true,
            PlaybackMode::Stopped => {
                // A finished one-shot run restarts from the top.
                if !self.loop_playback && self.current_time >= self.duration_secs {
                    self.current_time = 0.0;
                }
                self.anchor(now);
                self.mode = PlaybackMode::Playing;
                tracing::debug!(at = self.current_time, "Playback started");
            }
        }
    }

    /// Stop at the time reached by `now`.
    pub fn pause(&mut self, now: f64) {
        match self.mode {
            PlaybackMode::Playing => {
                self.advance(now);
                self.mode = PlaybackMode::Stopped;
                tracing::debug!(at = self.current_time, "Playback paused");
            }
            PlaybackMode::Scrubbing => self.resume_after_scrub = false,
            PlaybackMode::Stopped => {}
        }
    }

    pub fn toggle(&mut self, now: f64) {
        if self.is_playing() {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    /// Jump to `t`, clamped to `[0, d]`. Non-finite targets are ignored.
    /// Returns the new current time.
    pub fn scrub_to(&mut self, t: f64, now: f64) -> f64 {
        if !t.is_finite() {
            tracing::warn!(target_time = t, "Ignoring non-finite scrub target");
            return self.current_time;
        }
        self.current_time = t.clamp(0.0, self.duration_secs);
        self.anchor(now);
        self.current_time
    }

    /// Enter the scrubbing state. Time stays put until `end_scrub`.
    pub fn begin_scrub(&mut self, now: f64) {
        if self.mode == PlaybackMode::Scrubbing {
            return;
        }
        if self.is_playing() {
            self.advance(now);
        }
        self.resume_after_scrub = self.is_playing();
        self.mode = PlaybackMode::Scrubbing;
    }

    /// Leave the scrubbing state, resuming playback if it was playing.
    pub fn end_scrub(&mut self, now: f64) {
        if self.mode != PlaybackMode::Scrubbing {
            return;
        }
        self.mode = if self.resume_after_scrub {
            PlaybackMode::Playing
        } else {
            PlaybackMode::Stopped
        };
        self.resume_after_scrub = false;
        self.anchor(now);
    }

    /// Frame tick: move time forward to `now` while playing.
    pub fn advance(&mut self, now: f64) -> f64 {
        if self.mode != PlaybackMode::Playing || !now.is_finite() {
            return self.current_time;
        }
        let elapsed = (now - self.anchor_wall).max(0.0);
        let raw = self.anchor_time + elapsed;

        if self.loop_playback {
            self.current_time = raw.rem_euclid(self.duration_secs);
        } else if raw >= self.duration_secs {
            self.current_time = self.duration_secs;
            self.mode = PlaybackMode::Stopped;
            tracing::debug!("Playback reached the end");
        } else {
            self.current_time = raw;
        }
        self.current_time
    }

    /// Change the duration. The current time is clamped into the new range.
    /// Invalid durations are ignored.
    pub fn set_duration(&mut self, duration_secs: f64, now: f64) {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            tracing::warn!(duration_secs, "Ignoring invalid playhead duration");
            return;
        }
        if self.is_playing() {
            self.advance(now);
        }
        self.duration_secs = duration_secs;
        self.current_time = self.current_time.clamp(0.0, duration_secs);
        self.anchor(now);
    }

    fn anchor(&mut self, now: f64) {
        self.anchor_wall = if now.is_finite() { now } else { self.anchor_wall };
        self.anchor_time = self.current_time;
    }
}

fn sanitize_duration(duration_secs: f64) -> f64 {
    if duration_secs.is_finite() && duration_secs > 0.0 {
        duration_secs
    } else {
        tracing::warn!(duration_secs, "Invalid duration, using fallback");
        FALLBACK_DURATION_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_starts_stopped_and_looping() {
        let playhead = Playhead::new(15.0);
        assert_eq!(playhead.mode(), PlaybackMode::Stopped);
        assert!(playhead.is_looping());
        assert_eq!(playhead.current_time(), 0.0);
    }

    #[test]
    fn test_loop_wraps_past_the_end() {
        let mut playhead = Playhead::new(15.0);
        playhead.scrub_to(14.9, 100.0);
        playhead.play(100.0);
        let t = playhead.advance(100.2);
        assert!((t - 0.1).abs() < 1e-6, "got {t}");
    }

    #[test]
    fn test_duration_maps_to_zero() {
        let mut playhead = Playhead::new(15.0);
        playhead.play(0.0);
        assert!(close(playhead.advance(15.0), 0.0));
        assert!(close(playhead.advance(30.0), 0.0));
    }

    #[test]
    fn test_one_shot_stops_at_end() {
        let mut playhead = Playhead::new(5.0).with_loop(false);
        playhead.play(0.0);
        assert_eq!(playhead.advance(7.0), 5.0);
        assert_eq!(playhead.mode(), PlaybackMode::Stopped);
        playhead.play(8.0);
        assert_eq!(playhead.current_time(), 0.0);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut playhead = Playhead::new(15.0);
        playhead.play(1.0);
        playhead.pause(3.5);
        assert!(close(playhead.current_time(), 2.5));
        assert!(close(playhead.advance(10.0), 2.5));
        playhead.play(10.0);
        assert!(close(playhead.advance(11.0), 3.5));
    }

    #[test]
    fn test_scrub_clamps_and_ignores_nan() {
        let mut playhead = Playhead::new(15.0);
        assert_eq!(playhead.scrub_to(-4.0, 0.0), 0.0);
        assert_eq!(playhead.scrub_to(99.0, 0.0), 15.0);
        assert_eq!(playhead.scrub_to(f64::NAN, 0.0), 15.0);
    }

    #[test]
    fn test_scrub_is_idempotent() {
        let mut playhead = Playhead::new(15.0);
        playhead.play(0.0);
        let a = playhead.scrub_to(7.25, 2.0);
        let b = playhead.scrub_to(7.25, 2.0);
        assert_eq!(a, b);
        assert_eq!(playhead.state(), {
            let mut other = Playhead::new(15.0);
            other.play(0.0);
            other.scrub_to(7.25, 2.0);
            other.state()
        });
    }

    #[test]
    fn test_playback_continues_from_scrub_target() {
        let mut playhead = Playhead::new(15.0);
        playhead.play(0.0);
        playhead.advance(3.0);
        playhead.scrub_to(10.0, 3.0);
        assert!(close(playhead.advance(3.5), 10.5));
    }

    #[test]
    fn test_scrub_gesture_holds_time_and_resumes() {
        let mut playhead = Playhead::new(15.0);
        playhead.play(0.0);
        playhead.begin_scrub(1.0);
        assert_eq!(playhead.mode(), PlaybackMode::Scrubbing);
        playhead.scrub_to(6.0, 1.5);
        assert!(close(playhead.advance(4.0), 6.0));
        playhead.end_scrub(4.0);
        assert!(playhead.is_playing());
        assert!(close(playhead.advance(5.0), 7.0));
    }

    #[test]
    fn test_scrub_gesture_from_stopped_stays_stopped() {
        let mut playhead = Playhead::new(15.0);
        playhead.begin_scrub(0.0);
        playhead.scrub_to(3.0, 0.0);
        playhead.end_scrub(1.0);
        assert_eq!(playhead.mode(), PlaybackMode::Stopped);
        assert_eq!(playhead.current_time(), 3.0);
    }

    #[test]
    fn test_set_duration_clamps_current_time() {
        let mut playhead = Playhead::new(30.0);
        playhead.scrub_to(20.0, 0.0);
        playhead.set_duration(15.0, 0.0);
        assert_eq!(playhead.current_time(), 15.0);
        playhead.set_duration(-1.0, 0.0);
        assert_eq!(playhead.duration_secs(), 15.0);
    }

    #[test]
    fn test_invalid_initial_duration_falls_back() {
        assert_eq!(Playhead::new(f64::NAN).duration_secs(), FALLBACK_DURATION_SECS);
    }

    proptest! {
        #[test]
        fn looping_time_stays_in_range(
            start in 0.0f64..15.0,
            elapsed in 0.0f64..1000.0,
        ) {
            let mut playhead = Playhead::new(15.0);
            playhead.scrub_to(start, 0.0);
            playhead.play(0.0);
            let t = playhead.advance(elapsed);
            prop_assert!((0.0..15.0).contains(&t));
            let expected = (start + elapsed).rem_euclid(15.0);
            prop_assert!((t - expected).abs() < 1e-6);
        }

        #[test]
        fn scrub_then_advance_is_continuous(
            target in 0.0f64..15.0,
            delta in 0.0f64..0.5,
        ) {
            let mut playhead = Playhead::new(15.0);
            playhead.play(0.0);
            playhead.scrub_to(target, 10.0);
            let t = playhead.advance(10.0 + delta);
            prop_assert!((t - (target + delta).rem_euclid(15.0)).abs() < 1e-6);
        }
    }
}
