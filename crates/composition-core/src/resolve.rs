//! Token resolution: definition + theme + customization + duration → literals.
//!
//! Resolution is a pure function of its inputs. The same inputs always
//! produce deep-equal output, and a resolved composition is never patched:
//! any change to theme, placeholders or duration produces a fresh one.
//!
//! Token precedence: current duration, theme color, theme font, placeholder.
//! Unresolvable references fall back to a literal and are logged once per
//! pass; they never fail the pass.

use std::collections::{BTreeMap, BTreeSet};

use karo_common::config::PreviewDefaults;
use karo_template_model::customization::{Customization, DurationBounds};
use karo_template_model::geometry::Size;
use karo_template_model::layer::{AnimationSpec, Layer, LayerKind};
use karo_template_model::template::{Placeholder, TemplateDefinition, Theme};
use karo_template_model::token::{Token, TokenValue};
use serde::Serialize;
use serde_json::Value;

/// Color used for a theme color the active theme does not define.
pub const FALLBACK_COLOR: &str = "#000000";

/// Font family used for a theme font the active theme does not define.
pub const FALLBACK_FONT: &str = "Inter";

/// Duration bounds configured for previews.
pub fn duration_bounds(defaults: &PreviewDefaults) -> DurationBounds {
    DurationBounds::new(defaults.max_duration_secs)
}

/// Everything a token may be resolved against.
#[derive(Debug, Clone, Copy)]
pub struct ResolveScope<'a> {
    pub theme: Option<&'a Theme>,
    pub placeholders: &'a BTreeMap<String, Placeholder>,
    pub customization: &'a Customization,
    pub duration_secs: f64,
}

impl<'a> ResolveScope<'a> {
    /// Scope for a definition with the customization's effective theme.
    pub fn for_definition(
        definition: &'a TemplateDefinition,
        customization: &'a Customization,
        duration_secs: f64,
    ) -> Self {
        let theme = customization
            .effective_theme_id(definition)
            .and_then(|id| definition.theme(id));
        Self {
            theme,
            placeholders: &definition.placeholders,
            customization,
            duration_secs,
        }
    }

    /// Resolve one token. Returns the literal and whether the reference
    /// actually resolved (`false` means a fallback was used).
    pub fn resolve_token(&self, token: &Token) -> (Value, bool) {
        match token {
            Token::CurrentDuration => (number(self.duration_secs), true),
            Token::ThemeColor(name) => {
                match self.theme.and_then(|theme| theme.color(name)) {
                    Some(color) => (Value::String(color.to_string()), true),
                    None => (Value::String(FALLBACK_COLOR.to_string()), false),
                }
            }
            Token::ThemeFont(name) => match self.theme.and_then(|theme| theme.font(name)) {
                Some(font) => (Value::String(font.to_string()), true),
                None => (Value::String(FALLBACK_FONT.to_string()), false),
            },
            Token::Placeholder(id) => {
                let supplied = self.customization.value(id).filter(|v| !v.is_empty());
                if let Some(value) = supplied {
                    return (Value::String(value.to_string()), true);
                }
                match self.placeholders.get(id) {
                    Some(placeholder) => {
                        let default = placeholder
                            .default
                            .as_deref()
                            .filter(|_| placeholder.kind.uses_default())
                            .unwrap_or_default();
                        (Value::String(default.to_string()), true)
                    }
                    None => (Value::String(String::new()), false),
                }
            }
        }
    }

    /// Resolve a value tree to plain JSON.
    pub fn resolve(&self, value: &TokenValue) -> Value {
        self.resolve_tracked(value, &mut BTreeSet::new())
    }

    fn resolve_tracked(&self, value: &TokenValue, misses: &mut BTreeSet<Token>) -> Value {
        match value {
            TokenValue::Token(token) => {
                let (literal, resolved) = self.resolve_token(token);
                if !resolved {
                    misses.insert(token.clone());
                }
                literal
            }
            TokenValue::Literal(literal) => literal.clone(),
            TokenValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_tracked(item, misses))
                    .collect(),
            ),
            TokenValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_tracked(v, misses)))
                    .collect(),
            ),
        }
    }

    fn resolve_map(
        &self,
        map: &BTreeMap<String, TokenValue>,
        misses: &mut BTreeSet<Token>,
    ) -> BTreeMap<String, Value> {
        map.iter()
            .map(|(k, v)| (k.clone(), self.resolve_tracked(v, misses)))
            .collect()
    }
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Resolve a single value. See [`ResolveScope::resolve`].
pub fn resolve(
    value: &TokenValue,
    theme: Option<&Theme>,
    placeholders: &BTreeMap<String, Placeholder>,
    customization: &Customization,
    duration_secs: f64,
) -> Value {
    ResolveScope {
        theme,
        placeholders,
        customization,
        duration_secs,
    }
    .resolve(value)
}

/// End of a layer's visible window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "secs")]
pub enum LayerEnd {
    /// A fixed time in seconds.
    At(f64),
    /// Whatever the composition's duration currently is.
    FullDuration,
}

impl LayerEnd {
    /// Concrete end time for a composition of `duration_secs`.
    pub fn secs(self, duration_secs: f64) -> f64 {
        match self {
            LayerEnd::At(secs) => secs,
            LayerEnd::FullDuration => duration_secs,
        }
    }
}

/// A layer with every token replaced by a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLayer {
    pub id: String,
    pub kind: LayerKind,
    pub start: f64,
    pub end: LayerEnd,
    pub z: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    pub style: BTreeMap<String, Value>,
    pub transform: BTreeMap<String, Value>,
    /// The animation that drives preview state (first declared).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationSpec>,
    pub effects: Vec<Value>,
}

impl ResolvedLayer {
    /// Concrete end time for a composition of `duration_secs`.
    pub fn end_secs(&self, duration_secs: f64) -> f64 {
        self.end.secs(duration_secs)
    }

    /// Whether the window is empty (`end < start`).
    pub fn is_degenerate(&self, duration_secs: f64) -> bool {
        self.end_secs(duration_secs) < self.start
    }

    /// Resolved text content, if it is a string.
    pub fn text_str(&self) -> Option<&str> {
        self.text.as_ref().and_then(Value::as_str)
    }

    /// Resolved media source, if it is a string.
    pub fn source_str(&self) -> Option<&str> {
        self.source.as_ref().and_then(Value::as_str)
    }

    pub fn style_str(&self, key: &str) -> Option<&str> {
        self.style.get(key).and_then(Value::as_str)
    }

    pub fn style_f64(&self, key: &str) -> Option<f64> {
        self.style.get(key).and_then(value_f64)
    }

    pub fn transform_str(&self, key: &str) -> Option<&str> {
        self.transform.get(key).and_then(Value::as_str)
    }

    pub fn transform_f64(&self, key: &str) -> Option<f64> {
        self.transform.get(key).and_then(value_f64)
    }
}

/// Numeric value of a literal, accepting numeric strings.
pub fn value_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// A fully resolved composition: the unit both the previewer and the
/// renderer consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComposition {
    pub template_id: String,
    pub canvas: Size,
    pub fps: u32,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// Layers in ascending `z`, ties in declaration order.
    pub layers: Vec<ResolvedLayer>,
}

impl ResolvedComposition {
    pub fn layer(&self, id: &str) -> Option<&ResolvedLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}

/// Resolve every layer of `definition` for `customization`.
///
/// The theme and duration come from the customization when they are
/// usable, otherwise from the definition's defaults.
pub fn resolve_composition(
    definition: &TemplateDefinition,
    customization: &Customization,
    bounds: &DurationBounds,
) -> ResolvedComposition {
    let duration_secs = customization.effective_duration(definition, bounds);
    let theme_id = customization.effective_theme_id(definition);
    let scope = ResolveScope::for_definition(definition, customization, duration_secs);

    if let Some(requested) = customization.requested_theme_id() {
        if theme_id.is_none() {
            tracing::warn!(
                template = %definition.id,
                requested,
                "Unknown theme requested, theme tokens use fallbacks"
            );
        }
    }

    let mut misses = BTreeSet::new();
    let mut layers: Vec<ResolvedLayer> = definition
        .layers
        .iter()
        .map(|layer| resolve_layer(layer, &scope, &mut misses))
        .collect();

    // `sort_by_key` is stable: equal z keeps declaration order.
    layers.sort_by_key(|layer| layer.z);

    for token in &misses {
        tracing::warn!(
            template = %definition.id,
            token = %token,
            "Unresolved reference, substituting fallback"
        );
    }
    for layer in layers.iter().filter(|l| l.is_degenerate(duration_secs)) {
        tracing::warn!(
            template = %definition.id,
            layer = %layer.id,
            start = layer.start,
            end = layer.end_secs(duration_secs),
            "Layer ends before it starts and will never be visible"
        );
    }

    tracing::debug!(
        template = %definition.id,
        theme = ?theme_id,
        duration_secs,
        layers = layers.len(),
        "Resolved composition"
    );

    ResolvedComposition {
        template_id: definition.id.clone(),
        canvas: definition.canvas(),
        fps: definition.fps,
        duration_secs,
        theme_id: theme_id.map(str::to_string),
        layers,
    }
}

fn resolve_layer(
    layer: &Layer,
    scope: &ResolveScope<'_>,
    misses: &mut BTreeSet<Token>,
) -> ResolvedLayer {
    let start = match value_f64(&scope.resolve_tracked(&layer.start, misses)) {
        Some(secs) => secs,
        None => {
            tracing::warn!(layer = %layer.id, "Non-numeric start, using 0");
            0.0
        }
    };

    let end = if layer.end.as_token() == Some(&Token::CurrentDuration) {
        LayerEnd::FullDuration
    } else {
        match value_f64(&scope.resolve_tracked(&layer.end, misses)) {
            Some(secs) => LayerEnd::At(secs),
            None => {
                tracing::warn!(layer = %layer.id, "Non-numeric end, using full duration");
                LayerEnd::FullDuration
            }
        }
    };

    ResolvedLayer {
        id: layer.id.clone(),
        kind: layer.kind,
        start,
        end,
        z: layer.z,
        source: layer
            .source
            .as_ref()
            .map(|v| scope.resolve_tracked(v, misses)),
        text: layer.text.as_ref().map(|v| scope.resolve_tracked(v, misses)),
        style: scope.resolve_map(&layer.style, misses),
        transform: scope.resolve_map(&layer.transform, misses),
        animation: layer.primary_animation().copied(),
        effects: layer
            .effects
            .iter()
            .map(|v| scope.resolve_tracked(v, misses))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karo_template_model::layer::AnimationKind;
    use serde_json::json;

    fn definition() -> TemplateDefinition {
        TemplateDefinition::starter("starter", "Starter")
    }

    #[test]
    fn test_precedence_and_literals() {
        let definition = definition();
        let customization = Customization::new().with_theme("gold");
        let scope = ResolveScope::for_definition(&definition, &customization, 30.0);

        assert_eq!(scope.resolve(&TokenValue::from("$duration")), json!(30.0));
        assert_eq!(
            scope.resolve(&TokenValue::from("$theme.colors.primary")),
            json!("#FFD700")
        );
        assert_eq!(
            scope.resolve(&TokenValue::from("$theme.fonts.heading")),
            json!("Playfair Display")
        );
        assert_eq!(
            scope.resolve(&TokenValue::from("$placeholder.headline")),
            json!("Your headline here")
        );
        assert_eq!(scope.resolve(&TokenValue::from("#123456")), json!("#123456"));
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let definition = definition();
        let customization = Customization::new();
        let scope = ResolveScope::for_definition(&definition, &customization, 15.0);

        assert_eq!(
            scope.resolve(&TokenValue::from("$theme.colors.nope")),
            json!(FALLBACK_COLOR)
        );
        assert_eq!(
            scope.resolve(&TokenValue::from("$theme.fonts.nope")),
            json!(FALLBACK_FONT)
        );
        // Declared media placeholder without a value, and an undeclared one.
        assert_eq!(scope.resolve(&TokenValue::from("$placeholder.logo")), json!(""));
        assert_eq!(scope.resolve(&TokenValue::from("$placeholder.ghost")), json!(""));
    }

    #[test]
    fn test_unknown_theme_resolves_theme_tokens_to_fallbacks() {
        let definition = definition();
        let customization = Customization::new().with_theme("neon");
        let composition =
            resolve_composition(&definition, &customization, &DurationBounds::default());

        assert_eq!(composition.theme_id, None);
        let headline = composition.layer("headline").unwrap();
        assert_eq!(headline.style["color"], json!(FALLBACK_COLOR));
        assert_eq!(headline.style["fontFamily"], json!(FALLBACK_FONT));
        let bg = composition.layer("bg").unwrap();
        assert_eq!(bg.style["color"], json!(FALLBACK_COLOR));
    }

    #[test]
    fn test_empty_caller_value_uses_text_default() {
        let definition = definition();
        let customization = Customization::new().with_value("headline", "");
        let scope = ResolveScope::for_definition(&definition, &customization, 15.0);
        assert_eq!(
            scope.resolve(&TokenValue::from("$placeholder.headline")),
            json!("Your headline here")
        );
    }

    #[test]
    fn test_recurses_into_nested_structures() {
        let definition = definition();
        let customization = Customization::new().with_theme("classic");
        let value = TokenValue::from(json!({
            "background": { "color": "$theme.colors.accent", "paddingX": 24 },
            "stops": ["$theme.colors.primary", "#000"]
        }));
        let resolved = resolve(
            &value,
            definition.theme("classic"),
            &definition.placeholders,
            &customization,
            15.0,
        );
        assert_eq!(
            resolved,
            json!({
                "background": { "color": "#FF5A36", "paddingX": 24 },
                "stops": ["#FFFFFF", "#000"]
            })
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let definition = definition();
        let customization = Customization::new()
            .with_theme("gold")
            .with_value("headline", "Sale!");
        let bounds = DurationBounds::default();
        let a = resolve_composition(&definition, &customization, &bounds);
        let b = resolve_composition(&definition, &customization, &bounds);
        assert_eq!(a, b);
    }

    #[test]
    fn test_layers_are_stably_sorted_by_z() {
        let mut definition = TemplateDefinition::new("z", "Z", 100, 100, 30);
        definition.layers = vec![
            Layer::new("top", LayerKind::Solid).with_z(5),
            Layer::new("first-zero", LayerKind::Solid),
            Layer::new("neg", LayerKind::Solid).with_z(-1),
            Layer::new("second-zero", LayerKind::Solid),
        ];
        let composition =
            resolve_composition(&definition, &Customization::new(), &DurationBounds::default());
        let ids: Vec<&str> = composition.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["neg", "first-zero", "second-zero", "top"]);
    }

    #[test]
    fn test_window_resolution() {
        let mut definition = TemplateDefinition::new("w", "W", 100, 100, 30);
        definition.layers = vec![
            Layer::new("full", LayerKind::Solid),
            Layer::new("fixed", LayerKind::Text).with_window(2.0, Some(5.0)),
            Layer::new("backwards", LayerKind::Text).with_window(6.0, Some(3.0)),
            Layer::new("bad", LayerKind::Text)
                .with_animation(AnimationKind::Fade, 0.3)
                .with_window(0.0, None),
        ];
        definition.layers[3].start = TokenValue::text("soon");

        let composition = resolve_composition(
            &definition,
            &Customization::new().with_duration(20.0),
            &DurationBounds::default(),
        );
        assert_eq!(composition.duration_secs, 20.0);

        let full = composition.layer("full").unwrap();
        assert_eq!(full.end, LayerEnd::FullDuration);
        assert_eq!(full.end_secs(composition.duration_secs), 20.0);

        let fixed = composition.layer("fixed").unwrap();
        assert_eq!((fixed.start, fixed.end), (2.0, LayerEnd::At(5.0)));

        assert!(composition
            .layer("backwards")
            .unwrap()
            .is_degenerate(composition.duration_secs));

        let bad = composition.layer("bad").unwrap();
        assert_eq!(bad.start, 0.0);
        assert_eq!(bad.animation.map(|a| a.kind), Some(AnimationKind::Fade));
    }

    #[test]
    fn test_theme_switch_changes_only_theme_values() {
        let definition = definition();
        let bounds = DurationBounds::default();
        let classic =
            resolve_composition(&definition, &Customization::new().with_theme("classic"), &bounds);
        let gold = resolve_composition(&definition, &Customization::new().with_theme("gold"), &bounds);

        let a = classic.layer("headline").unwrap();
        let b = gold.layer("headline").unwrap();
        assert_eq!(a.style_str("color"), Some("#FFFFFF"));
        assert_eq!(b.style_str("color"), Some("#FFD700"));
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.text, b.text);
        assert_eq!((a.start, a.end), (b.start, b.end));
    }

    #[test]
    fn test_value_f64_accepts_numeric_strings() {
        assert_eq!(value_f64(&json!(4)), Some(4.0));
        assert_eq!(value_f64(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(value_f64(&json!("abc")), None);
        assert_eq!(value_f64(&json!(null)), None);
    }
}
