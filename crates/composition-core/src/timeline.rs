//! Layer visibility on the composition timeline.
//!
//! A layer is visible exactly when `start <= t <= end` (closed interval),
//! where `end` is the composition duration for full-duration layers. There
//! is no hysteresis: the answer depends only on `t`.

use std::collections::HashMap;

use crate::resolve::{LayerEnd, ResolvedLayer};

/// Whether `layer` is visible at `t` in a composition of `duration_secs`.
pub fn is_visible(layer: &ResolvedLayer, t: f64, duration_secs: f64) -> bool {
    if !t.is_finite() {
        return false;
    }
    t >= layer.start && t <= layer.end_secs(duration_secs)
}

/// Seconds since the layer became visible. `None` while hidden.
pub fn local_elapsed(layer: &ResolvedLayer, t: f64, duration_secs: f64) -> Option<f64> {
    is_visible(layer, t, duration_secs).then(|| t - layer.start)
}

/// Seconds of visibility left. `None` while hidden.
pub fn remaining(layer: &ResolvedLayer, t: f64, duration_secs: f64) -> Option<f64> {
    is_visible(layer, t, duration_secs).then(|| layer.end_secs(duration_secs) - t)
}

/// Seconds left before the layer leaves while the composition keeps going.
///
/// `None` for layers that stay until the composition ends; those never
/// play an exit transition.
pub fn exit_remaining(layer: &ResolvedLayer, t: f64, duration_secs: f64) -> Option<f64> {
    match layer.end {
        LayerEnd::At(end) if end < duration_secs => remaining(layer, t, duration_secs),
        _ => None,
    }
}

/// How a layer's visibility changed between two observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    /// Hidden before, visible now. Enter animations restart here.
    Entered,
    /// Visible before and now.
    Steady,
    /// Visible before, hidden now.
    Exited,
    /// Hidden before and now.
    Hidden,
}

impl VisibilityChange {
    pub fn is_visible(self) -> bool {
        matches!(self, VisibilityChange::Entered | VisibilityChange::Steady)
    }
}

/// Remembers per-layer visibility across frames.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    visible: HashMap<String, bool>,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the visibility of `layer` at `t` and report the transition.
    pub fn observe(
        &mut self,
        layer: &ResolvedLayer,
        t: f64,
        duration_secs: f64,
    ) -> VisibilityChange {
        let now = is_visible(layer, t, duration_secs);
        let before = self
            .visible
            .insert(layer.id.clone(), now)
            .unwrap_or(false);
        match (before, now) {
            (false, true) => VisibilityChange::Entered,
            (true, true) => VisibilityChange::Steady,
            (true, false) => VisibilityChange::Exited,
            (false, false) => VisibilityChange::Hidden,
        }
    }

    /// Forget all layers, e.g. after a fresh resolve pass.
    pub fn reset(&mut self) {
        self.visible.clear();
    }

    /// Number of layers currently marked visible.
    pub fn visible_count(&self) -> usize {
        self.visible.values().filter(|v| **v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karo_template_model::layer::LayerKind;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn layer(start: f64, end: LayerEnd) -> ResolvedLayer {
        ResolvedLayer {
            id: "l".into(),
            kind: LayerKind::Text,
            start,
            end,
            z: 0,
            source: None,
            text: None,
            style: BTreeMap::new(),
            transform: BTreeMap::new(),
            animation: None,
            effects: vec![],
        }
    }

    #[test]
    fn test_closed_interval_boundaries() {
        let l = layer(2.0, LayerEnd::At(5.0));
        assert!(!is_visible(&l, 1.999, 15.0));
        assert!(is_visible(&l, 2.0, 15.0));
        assert!(is_visible(&l, 5.0, 15.0));
        assert!(!is_visible(&l, 5.001, 15.0));
        assert!(!is_visible(&l, f64::NAN, 15.0));
    }

    #[test]
    fn test_full_duration_sentinel_tracks_duration() {
        let l = layer(0.0, LayerEnd::FullDuration);
        assert!(is_visible(&l, 15.0, 15.0));
        assert!(!is_visible(&l, 15.5, 15.0));
        assert!(is_visible(&l, 15.5, 30.0));
        assert_eq!(exit_remaining(&l, 10.0, 15.0), None);
    }

    #[test]
    fn test_backwards_window_is_never_visible() {
        let l = layer(6.0, LayerEnd::At(3.0));
        for t in [0.0, 3.0, 4.5, 6.0, 10.0] {
            assert!(!is_visible(&l, t, 15.0));
        }
    }

    #[test]
    fn test_elapsed_and_remaining() {
        let l = layer(2.0, LayerEnd::At(5.0));
        assert_eq!(local_elapsed(&l, 3.5, 15.0), Some(1.5));
        assert_eq!(remaining(&l, 3.5, 15.0), Some(1.5));
        assert_eq!(exit_remaining(&l, 4.0, 15.0), Some(1.0));
        assert_eq!(local_elapsed(&l, 6.0, 15.0), None);
    }

    #[test]
    fn test_tracker_reports_transitions() {
        let l = layer(2.0, LayerEnd::At(5.0));
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.observe(&l, 1.0, 15.0), VisibilityChange::Hidden);
        assert_eq!(tracker.observe(&l, 2.0, 15.0), VisibilityChange::Entered);
        assert_eq!(tracker.observe(&l, 3.0, 15.0), VisibilityChange::Steady);
        assert_eq!(tracker.visible_count(), 1);
        assert_eq!(tracker.observe(&l, 6.0, 15.0), VisibilityChange::Exited);
        // Scrubbing back in counts as a fresh entry.
        assert_eq!(tracker.observe(&l, 4.0, 15.0), VisibilityChange::Entered);
        tracker.reset();
        assert_eq!(tracker.visible_count(), 0);
    }

    proptest! {
        #[test]
        fn visibility_matches_closed_interval(
            start in 0.0f64..30.0,
            len in 0.0f64..30.0,
            t in -5.0f64..65.0,
        ) {
            let end = start + len;
            let l = layer(start, LayerEnd::At(end));
            prop_assert_eq!(is_visible(&l, t, 60.0), start <= t && t <= end);
            prop_assert!(is_visible(&l, start, 60.0));
            prop_assert!(is_visible(&l, end, 60.0));
        }

        #[test]
        fn elapsed_is_defined_only_while_visible(
            start in 0.0f64..10.0,
            t in 0.0f64..20.0,
        ) {
            let l = layer(start, LayerEnd::FullDuration);
            match local_elapsed(&l, t, 15.0) {
                Some(elapsed) => prop_assert!(elapsed >= 0.0 && (elapsed - (t - start)).abs() < 1e-12),
                None => prop_assert!(t < start || t > 15.0),
            }
        }
    }
}
