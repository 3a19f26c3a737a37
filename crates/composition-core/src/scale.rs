//! Logical canvas → display pixel mapping.
//!
//! `scale = container_width / definition_width`. The scale changes only
//! when the container width changes; every geometric style or transform
//! value is multiplied by it.

use std::collections::BTreeMap;

use karo_common::KaroError;
use karo_template_model::geometry::{Rect, Size};
use serde_json::Value;

use crate::resolve::value_f64;

/// Keys whose numeric values are lengths in logical pixels.
pub const SCALED_KEYS: &[&str] = &[
    "x",
    "y",
    "w",
    "h",
    "width",
    "height",
    "left",
    "top",
    "right",
    "bottom",
    "fontSize",
    "strokeWidth",
    "padding",
    "paddingX",
    "paddingY",
    "borderRadius",
    "letterSpacing",
    "shadowBlur",
    "blur",
];

/// Errors from the scale mapper.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("Invalid container width: {0}")]
    InvalidWidth(f64),

    #[error("Invalid canvas: {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },
}

impl From<ScaleError> for KaroError {
    fn from(err: ScaleError) -> Self {
        KaroError::preview(err.to_string())
    }
}

/// Maps logical canvas coordinates to container pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleMapper {
    canvas: Size,
    container_width: f64,
    scale: f64,
}

impl ScaleMapper {
    /// Mapper for `canvas`, initially at 1:1.
    pub fn new(canvas: Size) -> Result<Self, ScaleError> {
        if !(canvas.width.is_finite() && canvas.height.is_finite())
            || canvas.width <= 0.0
            || canvas.height <= 0.0
        {
            return Err(ScaleError::InvalidCanvas {
                width: canvas.width,
                height: canvas.height,
            });
        }
        Ok(Self {
            canvas,
            container_width: canvas.width,
            scale: 1.0,
        })
    }

    /// Apply a new container width. An invalid width leaves the previous
    /// scale in place. Returns whether the scale changed.
    pub fn resize(&mut self, container_width: f64) -> Result<bool, ScaleError> {
        if !container_width.is_finite() || container_width <= 0.0 {
            tracing::warn!(
                container_width,
                previous_scale = self.scale,
                "Ignoring invalid container width"
            );
            return Err(ScaleError::InvalidWidth(container_width));
        }
        if container_width == self.container_width {
            return Ok(false);
        }
        self.container_width = container_width;
        self.scale = container_width / self.canvas.width;
        tracing::debug!(container_width, scale = self.scale, "Recomputed display scale");
        Ok(true)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Container size at the current width, aspect-locked to the canvas.
    pub fn container(&self) -> Size {
        Size::new(
            self.container_width,
            self.canvas.height_for_width(self.container_width),
        )
    }

    /// Height of a container of `width` that keeps the canvas aspect ratio.
    pub fn container_height(&self, width: f64) -> f64 {
        self.canvas.height_for_width(width)
    }

    pub fn to_display(&self, logical: f64) -> f64 {
        logical * self.scale
    }

    pub fn to_logical(&self, display: f64) -> f64 {
        display / self.scale
    }

    pub fn rect_to_display(&self, rect: &Rect) -> Rect {
        rect.scaled(self.scale)
    }

    /// Scale every length-valued entry of a style or transform map.
    pub fn scale_map(&self, map: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        scale_map(map, self.scale)
    }
}

/// Scale every length-valued entry of `map` by `factor`, recursing into
/// nested objects (e.g. a text background box).
pub fn scale_map(map: &BTreeMap<String, Value>, factor: f64) -> BTreeMap<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), scale_entry(key, value, factor)))
        .collect()
}

fn scale_entry(key: &str, value: &Value, factor: f64) -> Value {
    match value {
        Value::Object(inner) => Value::Object(
            inner
                .iter()
                .map(|(k, v)| (k.clone(), scale_entry(k, v, factor)))
                .collect(),
        ),
        _ if SCALED_KEYS.contains(&key) => match value_f64(value) {
            Some(n) => serde_json::Number::from_f64(n * factor)
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}
