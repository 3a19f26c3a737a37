//! Template definition, themes, and placeholders.
//!
//! A template definition is the versioned, declarative description of one
//! composition. It is consumed read-only: both the previewer and the
//! out-of-process renderer start from the same definition.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use karo_common::KaroError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::Size;
use crate::layer::{AnimationKind, Layer, LayerKind};
use crate::token::{Token, TokenValue};

/// Schema version written by this crate.
pub const SCHEMA_VERSION: &str = "1.0";

/// Duration used when a definition declares no presets (seconds).
pub const FALLBACK_DURATION_SECS: f64 = 15.0;

/// A complete template definition (`template.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    /// Schema version. Accepts a number or a string on input.
    #[serde(
        default = "default_schema_version",
        deserialize_with = "deserialize_version"
    )]
    pub schema_version: String,

    /// Template identifier.
    pub id: String,

    /// Display name, optionally localized.
    pub name: TemplateName,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,

    /// Logical canvas width.
    pub width: u32,

    /// Logical canvas height.
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Durations (seconds) offered to the caller. The first is the default.
    #[serde(default = "default_presets")]
    pub duration_presets: Vec<f64>,

    #[serde(default)]
    pub themes: BTreeMap<String, Theme>,

    #[serde(default)]
    pub placeholders: BTreeMap<String, Placeholder>,

    /// Layers in declaration order.
    #[serde(default)]
    pub layers: Vec<Layer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_presets() -> Vec<f64> {
    vec![FALLBACK_DURATION_SECS]
}

fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Version::deserialize(deserializer)? {
        Version::Text(s) => s,
        Version::Number(n) => n.to_string(),
    })
}

/// Template display name: a bare string or `{en, hi?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateName {
    Localized {
        en: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hi: Option<String>,
    },
    Plain(String),
}

impl TemplateName {
    /// English (or only) name.
    pub fn en(&self) -> &str {
        match self {
            TemplateName::Localized { en, .. } => en,
            TemplateName::Plain(name) => name,
        }
    }

    /// Hindi name, when provided.
    pub fn hi(&self) -> Option<&str> {
        match self {
            TemplateName::Localized { hi, .. } => hi.as_deref(),
            TemplateName::Plain(_) => None,
        }
    }
}

/// Canvas aspect ratio label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "1:1")]
    Square1x1,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "4:3")]
    Landscape4x3,
}

impl AspectRatio {
    /// Width divided by height.
    pub fn ratio(self) -> f64 {
        match self {
            AspectRatio::Portrait9x16 => 9.0 / 16.0,
            AspectRatio::Square1x1 => 1.0,
            AspectRatio::Landscape16x9 => 16.0 / 9.0,
            AspectRatio::Landscape4x3 => 4.0 / 3.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Square1x1 => "1:1",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Landscape4x3 => "4:3",
        }
    }
}

/// Named palette and typography bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Color name → CSS color value.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,

    /// Font role → font family.
    #[serde(default)]
    pub fonts: BTreeMap<String, String>,
}

impl Theme {
    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    pub fn font(&self, name: &str) -> Option<&str> {
        self.fonts.get(name).map(String::as_str)
    }
}

/// Kind of value a placeholder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Video,
    Image,
    Logo,
    Text,
    AudioMarker,
}

impl PlaceholderKind {
    /// Whether the declared `default` applies when no value is supplied.
    pub fn uses_default(self) -> bool {
        matches!(self, PlaceholderKind::Text)
    }
}

/// A caller-fillable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub kind: PlaceholderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_hi: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Default text (text placeholders only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Maximum length in characters (text placeholders only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Placeholder {
    pub fn text(default: impl Into<String>) -> Self {
        Self {
            kind: PlaceholderKind::Text,
            label: None,
            label_hi: None,
            required: false,
            default: Some(default.into()),
            max_length: None,
        }
    }

    pub fn media(kind: PlaceholderKind) -> Self {
        Self {
            kind,
            label: None,
            label_hi: None,
            required: false,
            default: None,
            max_length: None,
        }
    }
}

impl TemplateDefinition {
    /// Create an empty definition with one preset duration.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            id: id.into(),
            name: TemplateName::Plain(name.into()),
            category: String::new(),
            aspect_ratio: None,
            width,
            height,
            fps,
            duration_presets: default_presets(),
            themes: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            layers: vec![],
            tags: vec![],
        }
    }

    /// A small but complete vertical template, used by `karo init`.
    pub fn starter(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut definition = Self::new(id, name, 1080, 1920, 30);
        definition.aspect_ratio = Some(AspectRatio::Portrait9x16);
        definition.category = "business".to_string();
        definition.duration_presets = vec![15.0, 30.0];

        definition.themes.insert(
            "classic".to_string(),
            Theme {
                name: Some("Classic".to_string()),
                colors: BTreeMap::from([
                    ("background".to_string(), "#111111".to_string()),
                    ("primary".to_string(), "#FFFFFF".to_string()),
                    ("accent".to_string(), "#FF5A36".to_string()),
                ]),
                fonts: BTreeMap::from([
                    ("heading".to_string(), "Poppins".to_string()),
                    ("body".to_string(), "Inter".to_string()),
                ]),
            },
        );
        definition.themes.insert(
            "gold".to_string(),
            Theme {
                name: Some("Gold".to_string()),
                colors: BTreeMap::from([
                    ("background".to_string(), "#1B1200".to_string()),
                    ("primary".to_string(), "#FFD700".to_string()),
                    ("accent".to_string(), "#FFFFFF".to_string()),
                ]),
                fonts: BTreeMap::from([
                    ("heading".to_string(), "Playfair Display".to_string()),
                    ("body".to_string(), "Inter".to_string()),
                ]),
            },
        );

        let mut headline = Placeholder::text("Your headline here");
        headline.required = true;
        headline.max_length = Some(40);
        headline.label = Some("Headline".to_string());
        definition
            .placeholders
            .insert("headline".to_string(), headline);
        let mut logo = Placeholder::media(PlaceholderKind::Logo);
        logo.label = Some("Logo".to_string());
        definition.placeholders.insert("logo".to_string(), logo);

        definition.layers = vec![
            Layer::new("bg", LayerKind::Solid).with_style("color", "$theme.colors.background"),
            Layer::new("logo", LayerKind::Image)
                .with_z(2)
                .with_source("$placeholder.logo")
                .with_transform("x", 440.0)
                .with_transform("y", 160.0)
                .with_transform("w", 200.0)
                .with_transform("h", 200.0)
                .with_animation(AnimationKind::Pop, 0.4),
            Layer::new("headline", LayerKind::Text)
                .with_window(0.5, None)
                .with_z(3)
                .with_text("$placeholder.headline")
                .with_style("color", "$theme.colors.primary")
                .with_style("fontFamily", "$theme.fonts.heading")
                .with_style("fontSize", 72.0)
                .with_transform("x", 80.0)
                .with_transform("y", 860.0)
                .with_animation(AnimationKind::SlideUp, 0.6),
        ];
        definition
    }

    /// Parse and validate a definition from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        let definition: TemplateDefinition =
            serde_json::from_str(json).map_err(|e| TemplateError::ParseError {
                origin: "<inline>".to_string(),
                source: e,
            })?;
        definition.validate()?;
        Ok(definition)
    }

    /// Load and validate a definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TemplateError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let definition: TemplateDefinition =
            serde_json::from_str(&json).map_err(|e| TemplateError::ParseError {
                origin: path.display().to_string(),
                source: e,
            })?;
        definition.validate()?;
        Ok(definition)
    }

    /// Write the definition as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TemplateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TemplateError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| TemplateError::ParseError {
            origin: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| TemplateError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.width == 0 || self.height == 0 {
            return Err(TemplateError::invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(TemplateError::invalid("fps must be > 0"));
        }
        if self.duration_presets.is_empty() {
            return Err(TemplateError::invalid("durationPresets must not be empty"));
        }
        if let Some(bad) = self
            .duration_presets
            .iter()
            .find(|d| !d.is_finite() || **d <= 0.0)
        {
            return Err(TemplateError::invalid(format!(
                "duration preset {bad} must be a positive number"
            )));
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if layer.id.is_empty() {
                return Err(TemplateError::invalid("layer id must not be empty"));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(TemplateError::invalid(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            for (label, value) in [("start", &layer.start), ("end", &layer.end)] {
                if let TokenValue::Literal(serde_json::Value::Number(n)) = value {
                    if n.as_f64().map_or(true, |secs| !secs.is_finite()) {
                        return Err(TemplateError::invalid(format!(
                            "layer '{}' has a non-finite {label}",
                            layer.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Describe every token that cannot resolve against this definition.
    ///
    /// These are warnings: the resolver substitutes fallbacks for them.
    pub fn reference_issues(&self) -> Vec<String> {
        let mut issues = vec![];
        for layer in &self.layers {
            for token in layer.tokens() {
                let missing = match token {
                    Token::CurrentDuration => None,
                    Token::ThemeColor(_) | Token::ThemeFont(_) if self.themes.is_empty() => {
                        Some("no themes are declared".to_string())
                    }
                    Token::ThemeColor(name) => self
                        .themes
                        .iter()
                        .find(|(_, theme)| theme.color(name).is_none())
                        .map(|(id, _)| format!("theme '{id}' has no color '{name}'")),
                    Token::ThemeFont(name) => self
                        .themes
                        .iter()
                        .find(|(_, theme)| theme.font(name).is_none())
                        .map(|(id, _)| format!("theme '{id}' has no font '{name}'")),
                    Token::Placeholder(id) => (!self.placeholders.contains_key(id))
                        .then(|| format!("placeholder '{id}' is not declared")),
                };
                if let Some(detail) = missing {
                    issues.push(format!("layer '{}': {token}: {detail}", layer.id));
                }
            }
        }
        issues
    }

    /// Logical canvas size.
    pub fn canvas(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// The first preset, or the fallback duration.
    pub fn default_duration(&self) -> f64 {
        self.duration_presets
            .first()
            .copied()
            .unwrap_or(FALLBACK_DURATION_SECS)
    }

    /// The first theme id in key order.
    pub fn default_theme_id(&self) -> Option<&str> {
        self.themes.keys().next().map(String::as_str)
    }

    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.get(id)
    }

    pub fn placeholder(&self, id: &str) -> Option<&Placeholder> {
        self.placeholders.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Whether `secs` matches one of the presets.
    pub fn is_preset(&self, secs: f64) -> bool {
        self.duration_presets
            .iter()
            .any(|preset| (preset - secs).abs() < 1e-9)
    }
}

/// Errors that can occur when loading or validating a definition.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {origin}: {source}")]
    ParseError {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Invalid template: {message}")]
    ValidationError { message: String },
}

impl TemplateError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

impl From<TemplateError> for KaroError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::IoError { path, source }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                KaroError::FileNotFound { path }
            }
            other => KaroError::template(other.to_string()),
        }
    }
}
