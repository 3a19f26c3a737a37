//! Render plan: how the out-of-process renderer interprets a composition.
//!
//! The renderer paints a solid background for the whole duration and
//! stacks one overlay per media or text layer, each enabled on the same
//! closed `[start, end]` window the previewer uses. The plan is data only;
//! encoding happens elsewhere.

use karo_composition_core::resolve::{value_f64, ResolvedComposition, ResolvedLayer};
use karo_template_model::layer::LayerKind;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_BACKGROUND: &str = "black";
pub const DEFAULT_TEXT_COLOR: &str = "white";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_FONT_SIZE: f64 = 48.0;

/// How media fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// Scale up and crop to fill.
    Cover,
    /// Scale down and letterbox.
    Contain,
}

impl Fit {
    fn parse(value: Option<&str>) -> Fit {
        match value {
            Some("contain") => Fit::Contain,
            _ => Fit::Cover,
        }
    }
}

/// What an overlay draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayContent {
    Video {
        source: String,
        fit: Fit,
    },
    Image {
        source: String,
        /// Target box; `None` keeps the intrinsic size.
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<(f64, f64)>,
    },
    Text {
        text: String,
        font_family: String,
        font_size: f64,
        color: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        box_color: Option<String>,
        box_border: f64,
    },
}

/// One timed overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub layer_id: String,
    pub z: i64,
    pub start: f64,
    pub end: f64,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub content: OverlayContent,
}

impl Overlay {
    /// Renderer enable expression for the overlay's window.
    pub fn enable_expression(&self) -> String {
        format!("between(t,{},{})", self.start, self.end)
    }

    /// Whether the overlay is enabled at `t` (closed interval).
    pub fn is_enabled(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Complete renderer input for one composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub template_id: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_secs: f64,
    pub background: String,
    /// Overlays bottom to top.
    pub overlays: Vec<Overlay>,
}

impl RenderPlan {
    pub fn from_composition(composition: &ResolvedComposition) -> Self {
        let background = composition
            .layers
            .iter()
            .find(|layer| layer.kind == LayerKind::Solid)
            .and_then(|layer| layer.style_str("color"))
            .filter(|color| !color.is_empty())
            .unwrap_or(DEFAULT_BACKGROUND)
            .to_string();

        let overlays: Vec<Overlay> = composition
            .layers
            .iter()
            .filter_map(|layer| overlay_for(layer, composition.duration_secs))
            .collect();

        tracing::debug!(
            template = %composition.template_id,
            overlays = overlays.len(),
            %background,
            "Built render plan"
        );

        Self {
            template_id: composition.template_id.clone(),
            width: composition.canvas.width as u32,
            height: composition.canvas.height as u32,
            fps: composition.fps,
            duration_secs: composition.duration_secs,
            background,
            overlays,
        }
    }

    pub fn total_frames(&self) -> u64 {
        (self.duration_secs * self.fps as f64).ceil() as u64
    }

    /// Overlays enabled at `t`, bottom to top.
    pub fn enabled_at(&self, t: f64) -> Vec<&Overlay> {
        self.overlays.iter().filter(|o| o.is_enabled(t)).collect()
    }
}

fn overlay_for(layer: &ResolvedLayer, duration_secs: f64) -> Option<Overlay> {
    let content = match layer.kind {
        LayerKind::Solid => return None,
        LayerKind::Video => OverlayContent::Video {
            source: non_empty(layer.source_str())?,
            fit: Fit::parse(layer.transform_str("fit")),
        },
        LayerKind::Image => {
            let w = layer.transform_f64("w").unwrap_or(0.0);
            let h = layer.transform_f64("h").unwrap_or(0.0);
            OverlayContent::Image {
                source: non_empty(layer.source_str())?,
                size: (w > 0.0 && h > 0.0).then_some((w, h)),
            }
        }
        LayerKind::Text => {
            let background = layer.style.get("background").and_then(Value::as_object);
            let box_color = background
                .and_then(|bg| bg.get("color"))
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            let box_border = background
                .and_then(|bg| bg.get("paddingX"))
                .and_then(value_f64)
                .unwrap_or(0.0)
                / 2.0;
            OverlayContent::Text {
                text: non_empty(layer.text_str())?,
                font_family: layer
                    .style_str("fontFamily")
                    .filter(|f| !f.is_empty())
                    .unwrap_or(DEFAULT_FONT_FAMILY)
                    .to_string(),
                font_size: layer.style_f64("fontSize").unwrap_or(DEFAULT_FONT_SIZE),
                color: layer
                    .style_str("color")
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_TEXT_COLOR)
                    .to_string(),
                box_color,
                box_border,
            }
        }
    };

    Some(Overlay {
        layer_id: layer.id.clone(),
        z: layer.z,
        start: layer.start,
        end: layer.end_secs(duration_secs),
        x: layer.transform_f64("x").unwrap_or(0.0),
        y: layer.transform_f64("y").unwrap_or(0.0),
        opacity: layer
            .transform_f64("opacity")
            .unwrap_or(1.0)
            .clamp(0.0, 1.0),
        content,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
