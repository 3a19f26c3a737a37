//! Animation state selection.
//!
//! Each animation kind maps to three states: `initial` (just before the
//! layer appears), `animate` (at rest) and `exit` (just after it leaves).
//! Given the layer's local elapsed time, the selector interpolates between
//! them with an ease-out cubic curve.
//!
//! Only a layer's first declared animation is considered.

use karo_common::config::PreviewDefaults;
use karo_template_model::layer::{AnimationKind, AnimationSpec};
use serde::Serialize;

/// Vertical travel of slide animations, in logical pixels.
pub const SLIDE_DISTANCE: f64 = 80.0;

/// Starting scale of the pop animation.
pub const POP_INITIAL_SCALE: f64 = 0.8;

pub const MIN_ANIMATION_SECS: f64 = 0.05;
pub const MAX_ANIMATION_SECS: f64 = 2.0;

/// Visual deltas applied on top of a layer's resolved transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationState {
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f64,
    /// Vertical offset in logical pixels; positive moves down.
    pub translate_y: f64,
    /// Uniform scale about the layer center.
    pub scale: f64,
    /// Revealed fraction of the layer width, left to right.
    pub clip: f64,
}

impl AnimationState {
    /// Fully visible, untransformed.
    pub const REST: AnimationState = AnimationState {
        opacity: 1.0,
        translate_y: 0.0,
        scale: 1.0,
        clip: 1.0,
    };

    const fn with(opacity: f64, translate_y: f64, scale: f64, clip: f64) -> Self {
        Self {
            opacity,
            translate_y,
            scale,
            clip,
        }
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(a: &AnimationState, b: &AnimationState, t: f64) -> AnimationState {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: f64, y: f64| x + (y - x) * t;
        AnimationState {
            opacity: mix(a.opacity, b.opacity),
            translate_y: mix(a.translate_y, b.translate_y),
            scale: mix(a.scale, b.scale),
            clip: mix(a.clip, b.clip),
        }
    }

    /// CSS-like transform string, with `translate_y` already in display pixels.
    pub fn css_transform(&self, display_scale: f64) -> String {
        format!(
            "translateY({:.3}px) scale({:.4})",
            self.translate_y * display_scale,
            self.scale
        )
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::REST
    }
}

/// The three named states of one animation kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPreset {
    pub initial: AnimationState,
    pub animate: AnimationState,
    pub exit: AnimationState,
}

impl AnimationPreset {
    /// The preset table.
    pub fn for_kind(kind: AnimationKind) -> AnimationPreset {
        let rest = AnimationState::REST;
        match kind {
            AnimationKind::Fade => AnimationPreset {
                initial: AnimationState::with(0.0, 0.0, 1.0, 1.0),
                animate: rest,
                exit: AnimationState::with(0.0, 0.0, 1.0, 1.0),
            },
            AnimationKind::SlideUp => AnimationPreset {
                initial: AnimationState::with(0.0, SLIDE_DISTANCE, 1.0, 1.0),
                animate: rest,
                exit: AnimationState::with(0.0, -SLIDE_DISTANCE, 1.0, 1.0),
            },
            AnimationKind::SlideDown => AnimationPreset {
                initial: AnimationState::with(0.0, -SLIDE_DISTANCE, 1.0, 1.0),
                animate: rest,
                exit: AnimationState::with(0.0, SLIDE_DISTANCE, 1.0, 1.0),
            },
            AnimationKind::Pop => AnimationPreset {
                initial: AnimationState::with(0.0, 0.0, POP_INITIAL_SCALE, 1.0),
                animate: rest,
                exit: AnimationState::with(0.0, 0.0, POP_INITIAL_SCALE, 1.0),
            },
            AnimationKind::Wipe => AnimationPreset {
                initial: AnimationState::with(0.0, 0.0, 1.0, 0.0),
                animate: rest,
                exit: AnimationState::with(0.0, 0.0, 1.0, 0.0),
            },
            AnimationKind::None => AnimationPreset {
                initial: rest,
                animate: rest,
                exit: rest,
            },
        }
    }
}

/// Where a layer is in its enter/exit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum AnimationPhase {
    /// Moving from `initial` to `animate`; `progress` in `[0, 1)`.
    Entering { progress: f64 },
    /// Resting at `animate`.
    Steady,
    /// Moving from `animate` to `exit`; `progress` in `[0, 1]`.
    Exiting { progress: f64 },
}

/// Selected phase and the interpolated state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub kind: AnimationKind,
    pub phase: AnimationPhase,
    pub state: AnimationState,
}

/// Ease-out cubic: fast start, gentle landing.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Maps animation specs and elapsed time to concrete states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSelector {
    min_secs: f64,
    max_secs: f64,
}

impl Default for AnimationSelector {
    fn default() -> Self {
        Self {
            min_secs: MIN_ANIMATION_SECS,
            max_secs: MAX_ANIMATION_SECS,
        }
    }
}

impl From<&PreviewDefaults> for AnimationSelector {
    fn from(defaults: &PreviewDefaults) -> Self {
        Self::new(defaults.min_animation_secs, defaults.max_animation_secs)
    }
}

impl AnimationSelector {
    /// Create a selector with a custom clamp range. A reversed or
    /// non-finite range falls back to the defaults.
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        if min_secs.is_finite() && max_secs.is_finite() && 0.0 < min_secs && min_secs <= max_secs
        {
            Self { min_secs, max_secs }
        } else {
            tracing::warn!(min_secs, max_secs, "Invalid animation clamp range, using defaults");
            Self::default()
        }
    }

    /// Clamp an animation duration. NaN maps to the minimum and infinities
    /// to the nearest bound, so the result is always finite and positive.
    pub fn clamp_duration(&self, secs: f64) -> f64 {
        if secs.is_nan() {
            return self.min_secs;
        }
        secs.clamp(self.min_secs, self.max_secs)
    }

    /// State for a visible layer.
    ///
    /// `elapsed` is the layer's local elapsed time. `exit_remaining` is the
    /// visible time left when the layer leaves before the composition ends,
    /// `None` otherwise.
    pub fn select(
        &self,
        spec: Option<&AnimationSpec>,
        elapsed: f64,
        exit_remaining: Option<f64>,
    ) -> AnimationFrame {
        let Some(spec) = spec.filter(|s| s.kind != AnimationKind::None) else {
            return AnimationFrame {
                kind: AnimationKind::None,
                phase: AnimationPhase::Steady,
                state: AnimationState::REST,
            };
        };

        let preset = AnimationPreset::for_kind(spec.kind);
        let duration = self.clamp_duration(spec.duration);
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };

        let (phase, state) = if elapsed < duration {
            let progress = elapsed / duration;
            (
                AnimationPhase::Entering { progress },
                AnimationState::lerp(&preset.initial, &preset.animate, ease_out_cubic(progress)),
            )
        } else {
            match exit_remaining.filter(|r| r.is_finite() && *r < duration) {
                Some(remaining) => {
                    let progress = (1.0 - remaining.max(0.0) / duration).clamp(0.0, 1.0);
                    (
                        AnimationPhase::Exiting { progress },
                        AnimationState::lerp(
                            &preset.animate,
                            &preset.exit,
                            ease_out_cubic(progress),
                        ),
                    )
                }
                None => (AnimationPhase::Steady, preset.animate),
            }
        };

        AnimationFrame {
            kind: spec.kind,
            phase,
            state,
        }
    }
}
