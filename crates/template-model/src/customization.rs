//! Caller-supplied customization of a template.
//!
//! The wire form is a flat object, matching what the render service
//! receives:
//!
//! ```json
//! { "theme_id": "gold", "duration_seconds": 15, "headline": "Happy Diwali", "logo": "https://…" }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::{PlaceholderKind, TemplateDefinition};

/// Bounds for durations that are not one of the template's presets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBounds {
    /// Longest accepted duration (seconds). Durations must also be > 0.
    pub max_secs: f64,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self { max_secs: 180.0 }
    }
}

impl DurationBounds {
    pub fn new(max_secs: f64) -> Self {
        Self { max_secs }
    }

    /// Whether `secs` is a positive, finite duration within bounds.
    pub fn contains(&self, secs: f64) -> bool {
        secs.is_finite() && secs > 0.0 && secs <= self.max_secs
    }
}

/// Active theme, chosen duration, and placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    /// Placeholder id → literal value (text, or uploaded asset URL).
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl Customization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme_id: impl Into<String>) -> Self {
        self.theme_id = Some(theme_id.into());
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_seconds = Some(secs);
        self
    }

    pub fn with_value(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(id, value);
        self
    }

    /// Set a placeholder value, replacing any previous one.
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
    }

    /// Remove a placeholder value.
    pub fn clear(&mut self, id: &str) {
        self.values.remove(id);
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    /// The theme to apply. An absent or empty `theme_id` selects the
    /// definition's default theme. An id the definition does not declare
    /// selects no theme, so every theme token takes its fallback literal,
    /// exactly as the render service does.
    pub fn effective_theme_id<'a>(&'a self, definition: &'a TemplateDefinition) -> Option<&'a str> {
        match self.requested_theme_id() {
            Some(id) => definition.themes.contains_key(id).then_some(id),
            None => definition.default_theme_id(),
        }
    }

    /// The explicitly requested theme id, ignoring an empty string.
    pub fn requested_theme_id(&self) -> Option<&str> {
        self.theme_id.as_deref().filter(|id| !id.is_empty())
    }

    /// The duration to apply: the requested one if it is a preset or within
    /// bounds, otherwise the definition's default duration.
    pub fn effective_duration(
        &self,
        definition: &TemplateDefinition,
        bounds: &DurationBounds,
    ) -> f64 {
        match self.duration_seconds {
            Some(secs) if definition.is_preset(secs) || bounds.contains(secs) => secs,
            _ => definition.default_duration(),
        }
    }

    /// Everything that would make this customization unusable or lossy.
    pub fn issues(
        &self,
        definition: &TemplateDefinition,
        bounds: &DurationBounds,
    ) -> Vec<CustomizationIssue> {
        let mut issues = vec![];

        if let Some(id) = self.requested_theme_id() {
            if !definition.themes.contains_key(id) {
                issues.push(CustomizationIssue::UnknownTheme { id: id.to_string() });
            }
        }

        if let Some(secs) = self.duration_seconds {
            if !definition.is_preset(secs) && !bounds.contains(secs) {
                issues.push(CustomizationIssue::DurationOutOfRange {
                    secs,
                    max_secs: bounds.max_secs,
                });
            }
        }

        for (id, placeholder) in &definition.placeholders {
            let value = self.value(id).filter(|v| !v.trim().is_empty());
            match value {
                None if placeholder.required => {
                    let has_default = placeholder.kind.uses_default()
                        && placeholder.default.as_deref().is_some_and(|d| !d.is_empty());
                    if !has_default {
                        issues.push(CustomizationIssue::MissingRequired { id: id.clone() });
                    }
                }
                Some(text) if placeholder.kind == PlaceholderKind::Text => {
                    if let Some(max) = placeholder.max_length {
                        let len = text.chars().count();
                        if len > max {
                            issues.push(CustomizationIssue::TooLong {
                                id: id.clone(),
                                len,
                                max,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        for id in self.values.keys() {
            if !definition.placeholders.contains_key(id) {
                issues.push(CustomizationIssue::UnknownPlaceholder { id: id.clone() });
            }
        }

        issues
    }
}

/// A problem found while checking a customization against a definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CustomizationIssue {
    #[error("theme '{id}' is not defined by the template")]
    UnknownTheme { id: String },

    #[error("duration {secs}s is not a preset and exceeds the {max_secs}s limit or is not positive")]
    DurationOutOfRange { secs: f64, max_secs: f64 },

    #[error("required placeholder '{id}' has no value")]
    MissingRequired { id: String },

    #[error("placeholder '{id}' is {len} characters long (max {max})")]
    TooLong { id: String, len: usize, max: usize },

    #[error("placeholder '{id}' is not declared by the template")]
    UnknownPlaceholder { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Placeholder;
    use proptest::prelude::*;
    use serde_json::json;

    fn definition() -> TemplateDefinition {
        let mut definition = TemplateDefinition::starter("starter", "Starter");
        let mut video = Placeholder::media(PlaceholderKind::Video);
        video.required = true;
        definition.placeholders.insert("clip".to_string(), video);
        definition
    }

    #[test]
    fn test_wire_form_is_flat() {
        let customization = Customization::new()
            .with_theme("gold")
            .with_duration(15.0)
            .with_value("headline", "Happy Diwali");

        let value = serde_json::to_value(&customization).unwrap();
        assert_eq!(
            value,
            json!({ "theme_id": "gold", "duration_seconds": 15.0, "headline": "Happy Diwali" })
        );

        let parsed: Customization = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, customization);
    }

    #[test]
    fn test_effective_theme_defaults_only_when_none_requested() {
        let definition = definition();
        assert_eq!(Customization::new().effective_theme_id(&definition), Some("classic"));
        let empty = Customization::new().with_theme("");
        assert_eq!(empty.effective_theme_id(&definition), Some("classic"));
        assert!(empty.issues(&definition, &DurationBounds::default()).iter().all(|i| {
            !matches!(i, CustomizationIssue::UnknownTheme { .. })
        }));

        let gold = Customization::new().with_theme("gold");
        assert_eq!(gold.effective_theme_id(&definition), Some("gold"));
    }

    #[test]
    fn test_unknown_theme_selects_no_theme() {
        let definition = definition();
        let unknown = Customization::new().with_theme("neon");
        assert_eq!(unknown.effective_theme_id(&definition), None);
    }

    #[test]
    fn test_effective_duration_accepts_presets_and_bounded_values() {
        let definition = definition();
        let bounds = DurationBounds::default();

        assert_eq!(Customization::new().effective_duration(&definition, &bounds), 15.0);
        assert_eq!(
            Customization::new()
                .with_duration(30.0)
                .effective_duration(&definition, &bounds),
            30.0
        );
        assert_eq!(
            Customization::new()
                .with_duration(22.5)
                .effective_duration(&definition, &bounds),
            22.5
        );
        assert_eq!(
            Customization::new()
                .with_duration(-4.0)
                .effective_duration(&definition, &bounds),
            15.0
        );
        assert_eq!(
            Customization::new()
                .with_duration(900.0)
                .effective_duration(&definition, &bounds),
            15.0
        );
    }

    #[test]
    fn test_issues_cover_required_length_and_unknowns() {
        let definition = definition();
        let customization = Customization::new()
            .with_theme("neon")
            .with_duration(0.0)
            .with_value("headline", "This headline is far too long for the slot!")
            .with_value("mystery", "x");

        let issues = customization.issues(&definition, &DurationBounds::default());
        assert!(issues.contains(&CustomizationIssue::UnknownTheme { id: "neon".into() }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, CustomizationIssue::DurationOutOfRange { .. })));
        assert!(issues.contains(&CustomizationIssue::MissingRequired { id: "clip".into() }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, CustomizationIssue::TooLong { max: 40, .. })));
        assert!(issues.contains(&CustomizationIssue::UnknownPlaceholder {
            id: "mystery".into()
        }));
    }

    #[test]
    fn test_required_text_with_default_is_satisfied() {
        let definition = definition();
        let customization = Customization::new().with_value("clip", "https://cdn/clip.mp4");
        assert!(customization
            .issues(&definition, &DurationBounds::default())
            .is_empty());
    }

    proptest! {
        #[test]
        fn prop_effective_duration_is_always_usable(secs in any::<f64>()) {
            let definition = definition();
            let bounds = DurationBounds::default();
            let chosen = Customization::new()
                .with_duration(secs)
                .effective_duration(&definition, &bounds);
            prop_assert!(definition.is_preset(chosen) || bounds.contains(chosen));
        }
    }
}
