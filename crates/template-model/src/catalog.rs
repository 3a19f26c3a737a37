//! Catalog summary of a definition: what a caller may customize.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::template::{PlaceholderKind, TemplateDefinition};

/// Editor field type for one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Image,
    Video,
}

impl From<PlaceholderKind> for FieldType {
    fn from(kind: PlaceholderKind) -> Self {
        match kind {
            PlaceholderKind::Video => FieldType::Video,
            PlaceholderKind::Image | PlaceholderKind::Logo => FieldType::Image,
            PlaceholderKind::Text | PlaceholderKind::AudioMarker => FieldType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizableField {
    pub field_id: String,
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_hindi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Flattened palette of one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub theme_id: String,
    pub name: String,
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Everything a template picker needs without loading layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_hindi: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_seconds: f64,
    pub duration_presets: Vec<f64>,
    pub layer_count: usize,
    pub tags: Vec<String>,
    pub customizable_fields: Vec<CustomizableField>,
    pub color_schemes: Vec<ColorScheme>,
    /// Deduplicated font families across all themes, sorted.
    pub font_options: Vec<String>,
}

impl TemplateSummary {
    pub fn from_definition(definition: &TemplateDefinition) -> Self {
        let customizable_fields = definition
            .placeholders
            .iter()
            .map(|(id, placeholder)| CustomizableField {
                field_id: id.clone(),
                field_type: placeholder.kind.into(),
                label: placeholder.label.clone().unwrap_or_else(|| id.clone()),
                label_hindi: placeholder.label_hi.clone(),
                default_value: placeholder.default.clone(),
                required: placeholder.required,
                max_length: placeholder.max_length,
            })
            .collect();

        let color_schemes = definition
            .themes
            .iter()
            .map(|(id, theme)| {
                let color = |name: &str, fallback: &str| {
                    theme.color(name).unwrap_or(fallback).to_string()
                };
                ColorScheme {
                    theme_id: id.clone(),
                    name: theme.name.clone().unwrap_or_else(|| id.clone()),
                    primary: color("primary", "#000000"),
                    secondary: color("secondary", "#666666"),
                    background: color("background", "#FFFFFF"),
                    text: color("text", "#000000"),
                    accent: theme.color("accent").map(str::to_string),
                }
            })
            .collect();

        let font_options: BTreeSet<&str> = definition
            .themes
            .values()
            .flat_map(|theme| theme.fonts.values().map(String::as_str))
            .collect();

        Self {
            id: definition.id.clone(),
            name: definition.name.en().to_string(),
            name_hindi: definition.name.hi().map(str::to_string),
            category: definition.category.clone(),
            aspect_ratio: definition.aspect_ratio.map(|ar| ar.label().to_string()),
            width: definition.width,
            height: definition.height,
            fps: definition.fps,
            duration_seconds: definition.default_duration(),
            duration_presets: definition.duration_presets.clone(),
            layer_count: definition.layers.len(),
            tags: definition.tags.clone(),
            customizable_fields,
            color_schemes,
            font_options: font_options.into_iter().map(str::to_string).collect(),
        }
    }
}
