//! Frame compositor: resolved layers + time + display scale → frame.
//!
//! A frame lists the layers visible at `t` in ascending `z`, each with its
//! style and transform already scaled to display pixels and its animation
//! state selected from local elapsed time.

use std::collections::BTreeMap;

use karo_composition_core::animation::{AnimationFrame, AnimationSelector};
use karo_composition_core::resolve::{ResolvedComposition, ResolvedLayer};
use karo_composition_core::scale::scale_map;
use karo_composition_core::timeline;
use karo_template_model::geometry::{Rect, Size};
use karo_template_model::layer::LayerKind;
use serde::Serialize;
use serde_json::Value;

/// One composed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Composition time in seconds.
    pub time_secs: f64,
    /// Display scale the frame was composed at.
    pub scale: f64,
    /// Display size of the container.
    pub container: Size,
    /// Visible layers, bottom to top.
    pub layers: Vec<FrameLayer>,
}

impl Frame {
    pub fn layer(&self, id: &str) -> Option<&FrameLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }
}

/// A visible layer in display space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameLayer {
    pub id: String,
    pub kind: LayerKind,
    pub z: i64,
    /// Seconds since the layer became visible.
    pub elapsed: f64,
    /// Display-space box. Zero width/height means "intrinsic size".
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub style: BTreeMap<String, Value>,
    pub transform: BTreeMap<String, Value>,
    pub animation: AnimationFrame,
    /// Animation offset converted to display pixels.
    pub translate_y_px: f64,
}

/// Compose the frame at `t`.
pub fn compose_frame(
    composition: &ResolvedComposition,
    t: f64,
    scale: f64,
    selector: &AnimationSelector,
) -> Frame {
    let duration = composition.duration_secs;
    let layers = composition
        .layers
        .iter()
        .filter_map(|layer| {
            let elapsed = timeline::local_elapsed(layer, t, duration)?;
            let exit_remaining = timeline::exit_remaining(layer, t, duration);
            let animation = selector.select(layer.animation.as_ref(), elapsed, exit_remaining);
            Some(FrameLayer {
                id: layer.id.clone(),
                kind: layer.kind,
                z: layer.z,
                elapsed,
                rect: layer_rect(layer, composition.canvas).scaled(scale),
                source: layer.source_str().map(str::to_string),
                text: layer.text_str().map(str::to_string),
                style: scale_map(&layer.style, scale),
                transform: scale_map(&layer.transform, scale),
                translate_y_px: animation.state.translate_y * scale,
                animation,
            })
        })
        .collect();

    Frame {
        time_secs: t,
        scale,
        container: composition.canvas.scaled(scale),
        layers,
    }
}

/// Compose every frame of the composition at its own frame rate.
pub fn compose_timeline(
    composition: &ResolvedComposition,
    scale: f64,
    selector: &AnimationSelector,
) -> Vec<Frame> {
    let fps = composition.fps.max(1) as f64;
    let total_frames = (composition.duration_secs * fps).ceil() as u64;
    (0..total_frames)
        .map(|frame| compose_frame(composition, frame as f64 / fps, scale, selector))
        .collect()
}

/// Logical box of a layer.
///
/// Solid and video layers default to the full canvas; images and text
/// default to their intrinsic size.
pub fn layer_rect(layer: &ResolvedLayer, canvas: Size) -> Rect {
    let x = layer.transform_f64("x").unwrap_or(0.0);
    let y = layer.transform_f64("y").unwrap_or(0.0);
    let full_bleed = matches!(layer.kind, LayerKind::Solid | LayerKind::Video);
    let w = layer
        .transform_f64("w")
        .or_else(|| layer.transform_f64("width"))
        .unwrap_or(if full_bleed { canvas.width } else { 0.0 });
    let h = layer
        .transform_f64("h")
        .or_else(|| layer.transform_f64("height"))
        .unwrap_or(if full_bleed { canvas.height } else { 0.0 });
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use karo_composition_core::animation::AnimationPhase;
    use karo_composition_core::resolve::resolve_composition;
    use karo_template_model::customization::{Customization, DurationBounds};
    use karo_template_model::layer::{AnimationKind, Layer};
    use karo_template_model::template::TemplateDefinition;

    fn composition() -> ResolvedComposition {
        resolve_composition(
            &TemplateDefinition::starter("starter", "Starter"),
            &Customization::new().with_value("headline", "Hello"),
            &DurationBounds::default(),
        )
    }

    #[test]
    fn test_frame_lists_visible_layers_in_z_order() {
        let composition = composition();
        let selector = AnimationSelector::default();

        let frame = compose_frame(&composition, 0.2, 1.0, &selector);
        assert_eq!(frame.layer_ids(), vec!["bg", "logo"]);

        let frame = compose_frame(&composition, 1.0, 1.0, &selector);
        assert_eq!(frame.layer_ids(), vec!["bg", "logo", "headline"]);
        assert_eq!(frame.layer("headline").unwrap().text.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_geometry_is_scaled_to_display() {
        let composition = composition();
        let frame = compose_frame(&composition, 5.0, 0.5, &AnimationSelector::default());

        assert_eq!(frame.container, Size::new(540.0, 960.0));
        let logo = frame.layer("logo").unwrap();
        assert_eq!(logo.rect, Rect::new(220.0, 80.0, 100.0, 100.0));
        let headline = frame.layer("headline").unwrap();
        assert_eq!(headline.style["fontSize"], serde_json::json!(36.0));
        assert_eq!(frame.layer("bg").unwrap().rect, Rect::new(0.0, 0.0, 540.0, 960.0));
    }

    #[test]
    fn test_entering_layer_carries_offset() {
        let composition = composition();
        let frame = compose_frame(&composition, 0.5, 0.5, &AnimationSelector::default());
        let headline = frame.layer("headline").unwrap();
        assert_eq!(headline.elapsed, 0.0);
        assert_eq!(headline.animation.phase, AnimationPhase::Entering { progress: 0.0 });
        assert_eq!(headline.translate_y_px, 40.0);
    }

    #[test]
    fn test_reentry_restarts_enter_animation() {
        let mut definition = TemplateDefinition::new("reentry", "Re-entry", 1080, 1920, 30);
        definition.layers = vec![
            Layer::new("first", LayerKind::Text)
                .with_window(2.0, Some(5.0))
                .with_animation(AnimationKind::Fade, 0.5),
            Layer::new("second", LayerKind::Text)
                .with_window(8.0, Some(10.0))
                .with_animation(AnimationKind::Fade, 0.5),
        ];
        let composition =
            resolve_composition(&definition, &Customization::new(), &DurationBounds::default());
        let selector = AnimationSelector::default();

        let at_five = compose_frame(&composition, 5.0, 1.0, &selector);
        assert_eq!(at_five.layer_ids(), vec!["first"]);

        let gap = compose_frame(&composition, 6.5, 1.0, &selector);
        assert!(gap.layers.is_empty());

        let at_eight = compose_frame(&composition, 8.0, 1.0, &selector);
        let second = at_eight.layer("second").unwrap();
        assert_eq!(second.elapsed, 0.0);
        assert_eq!(second.animation.state.opacity, 0.0);
        assert_eq!(second.animation.phase, AnimationPhase::Entering { progress: 0.0 });
    }

    #[test]
    fn test_timeline_has_one_frame_per_tick() {
        let composition = composition();
        let frames = compose_timeline(&composition, 1.0, &AnimationSelector::default());
        assert_eq!(frames.len(), 15 * 30);
        assert_eq!(frames[30].time_secs, 1.0);
    }
}
