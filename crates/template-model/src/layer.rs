//! Layer and animation declarations.
//!
//! Layers are drawn in ascending `z` order; ties keep declaration order.
//! Times are in seconds on the composition timeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenValue};

/// Default length of an animation when the definition omits it (seconds).
pub const DEFAULT_ANIMATION_SECS: f64 = 0.5;

/// Visual element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Flat color fill.
    Solid,
    /// Video clip, usually from a media placeholder.
    Video,
    /// Still image or logo.
    Image,
    /// Text block.
    Text,
}

/// A timed visual element as declared in the definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Stable identifier, unique within the definition.
    pub id: String,

    #[serde(rename = "type")]
    pub kind: LayerKind,

    /// Start time in seconds (may be a token).
    #[serde(default = "default_start")]
    pub start: TokenValue,

    /// End time in seconds; `$duration` means "until the composition ends".
    #[serde(default = "default_end")]
    pub end: TokenValue,

    /// Stacking order, ascending.
    #[serde(default)]
    pub z: i64,

    /// Media source (URL or placeholder token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TokenValue>,

    /// Text content for text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TokenValue>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, TokenValue>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transform: BTreeMap<String, TokenValue>,

    /// Declared animations. Only the first one drives the preview.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<AnimationSpec>,

    /// Opaque effect descriptors, resolved but not interpreted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<TokenValue>,
}

fn default_start() -> TokenValue {
    TokenValue::number(0.0)
}

fn default_end() -> TokenValue {
    TokenValue::Token(Token::CurrentDuration)
}

impl Layer {
    /// Create a layer spanning the whole composition.
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            start: default_start(),
            end: default_end(),
            z: 0,
            source: None,
            text: None,
            style: BTreeMap::new(),
            transform: BTreeMap::new(),
            animations: vec![],
            effects: vec![],
        }
    }

    /// Set the visible window. Pass `None` as `end` for "full duration".
    pub fn with_window(mut self, start: f64, end: Option<f64>) -> Self {
        self.start = TokenValue::number(start);
        self.end = match end {
            Some(end) => TokenValue::number(end),
            None => default_end(),
        };
        self
    }

    pub fn with_z(mut self, z: i64) -> Self {
        self.z = z;
        self
    }

    pub fn with_text(mut self, text: impl Into<TokenValue>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<TokenValue>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<TokenValue>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn with_transform(mut self, key: impl Into<String>, value: impl Into<TokenValue>) -> Self {
        self.transform.insert(key.into(), value.into());
        self
    }

    pub fn with_animation(mut self, kind: AnimationKind, duration: f64) -> Self {
        self.animations.push(AnimationSpec { kind, duration });
        self
    }

    /// The animation that drives preview state.
    pub fn primary_animation(&self) -> Option<&AnimationSpec> {
        self.animations.first()
    }

    /// Every token referenced anywhere in this layer.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        out.extend(self.start.tokens());
        out.extend(self.end.tokens());
        for value in self.source.iter().chain(self.text.iter()) {
            out.extend(value.tokens());
        }
        for value in self.style.values().chain(self.transform.values()) {
            out.extend(value.tokens());
        }
        for effect in &self.effects {
            out.extend(effect.tokens());
        }
        out
    }
}

/// Animation preset name.
///
/// Unknown names deserialize to [`AnimationKind::None`] so a newer
/// definition still previews, just without motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimationKind {
    Fade,
    SlideUp,
    SlideDown,
    Pop,
    Wipe,
    #[default]
    None,
}

impl AnimationKind {
    /// All kinds, in table order.
    pub const ALL: [AnimationKind; 6] = [
        AnimationKind::Fade,
        AnimationKind::SlideUp,
        AnimationKind::SlideDown,
        AnimationKind::Pop,
        AnimationKind::Wipe,
        AnimationKind::None,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "fade" => Self::Fade,
            "slideUp" => Self::SlideUp,
            "slideDown" => Self::SlideDown,
            "pop" => Self::Pop,
            "wipe" => Self::Wipe,
            _ => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::SlideUp => "slideUp",
            Self::SlideDown => "slideDown",
            Self::Pop => "pop",
            Self::Wipe => "wipe",
            Self::None => "none",
        }
    }
}

impl From<String> for AnimationKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<AnimationKind> for String {
    fn from(kind: AnimationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    #[serde(rename = "type")]
    pub kind: AnimationKind,

    /// Transition length in seconds. Clamped by the animation selector.
    #[serde(default = "default_animation_secs")]
    pub duration: f64,
}

fn default_animation_secs() -> f64 {
    DEFAULT_ANIMATION_SECS
}
