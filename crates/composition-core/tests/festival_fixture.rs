use std::path::PathBuf;

use karo_common::config::PreviewDefaults;
use karo_composition_core::animation::{AnimationPhase, AnimationSelector};
use karo_composition_core::resolve::{duration_bounds, resolve_composition, LayerEnd};
use karo_composition_core::timeline::{exit_remaining, is_visible, local_elapsed};
use karo_template_model::customization::Customization;
use karo_template_model::template::TemplateDefinition;
use serde_json::json;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("templates")
        .join("festival-greeting.json")
}

fn load_fixture() -> TemplateDefinition {
    TemplateDefinition::load(fixture_path()).expect("fixture template should load")
}

#[test]
fn fixture_loads_and_reports_dangling_references() {
    let definition = load_fixture();
    assert_eq!(definition.id, "festival-greeting");
    assert_eq!(definition.schema_version, "1");
    assert_eq!(definition.duration_presets, vec![15.0, 30.0]);

    let issues = definition.reference_issues();
    assert_eq!(issues.len(), 2, "{issues:?}");
    assert!(issues.iter().any(|i| i.contains("$placeholder.signoff")));
    assert!(issues.iter().any(|i| i.contains("$theme.colors.highlight")));
}

#[test]
fn default_resolution_uses_first_theme_and_first_preset() {
    let definition = load_fixture();
    let composition = resolve_composition(
        &definition,
        &Customization::new(),
        &duration_bounds(&PreviewDefaults::default()),
    );

    assert_eq!(composition.theme_id.as_deref(), Some("gold"));
    assert_eq!(composition.duration_secs, 15.0);

    let headline = composition.layer("headline").unwrap();
    assert_eq!(headline.text_str(), Some("Happy Diwali"));
    assert_eq!(headline.style["color"], json!("#FFD700"));
    assert_eq!(headline.style["fontFamily"], json!("Playfair Display"));

    // Unresolved references fall back instead of failing.
    let signature = composition.layer("signature").unwrap();
    assert_eq!(signature.text_str(), Some(""));
    assert_eq!(signature.style["color"], json!("#000000"));
    assert_eq!(signature.end, LayerEnd::FullDuration);

    let message = composition.layer("message").unwrap();
    assert_eq!(message.style["background"]["color"], json!("#FFFFFF"));
}

#[test]
fn layers_are_sorted_by_z_keeping_declaration_order() {
    let definition = load_fixture();
    let composition = resolve_composition(
        &definition,
        &Customization::new(),
        &duration_bounds(&PreviewDefaults::default()),
    );
    let ids: Vec<&str> = composition.layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["bg", "clip", "signature", "headline", "message", "logo"]);
}

#[test]
fn resolution_is_deterministic() {
    let definition = load_fixture();
    let customization = Customization::new()
        .with_theme("saffron")
        .with_duration(30.0)
        .with_value("headline", "Shubh Deepavali");
    let bounds = duration_bounds(&PreviewDefaults::default());

    let first = resolve_composition(&definition, &customization, &bounds);
    let second = resolve_composition(&definition, &customization, &bounds);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn theme_switch_changes_only_theme_values() {
    let definition = load_fixture();
    let bounds = duration_bounds(&PreviewDefaults::default());
    let gold = resolve_composition(&definition, &Customization::new().with_theme("gold"), &bounds);
    let saffron =
        resolve_composition(&definition, &Customization::new().with_theme("saffron"), &bounds);

    let gold_message = gold.layer("message").unwrap();
    let saffron_message = saffron.layer("message").unwrap();
    assert_eq!(gold_message.style["color"], json!("#FFF4C2"));
    assert_eq!(saffron_message.style["color"], json!("#FFE0B2"));

    let mut gold_style = gold_message.style.clone();
    let mut saffron_style = saffron_message.style.clone();
    gold_style.remove("color");
    saffron_style.remove("color");
    assert_eq!(gold_style, saffron_style);
    assert_eq!(gold_message.text, saffron_message.text);
    assert_eq!(gold_message.transform, saffron_message.transform);
    assert_eq!(gold_message.start, saffron_message.start);
}

#[test]
fn full_duration_layers_follow_the_chosen_duration() {
    let definition = load_fixture();
    let composition = resolve_composition(
        &definition,
        &Customization::new().with_duration(30.0),
        &duration_bounds(&PreviewDefaults::default()),
    );
    let signature = composition.layer("signature").unwrap();
    assert!(is_visible(signature, 29.9, composition.duration_secs));
    assert!(is_visible(signature, 30.0, composition.duration_secs));
    assert!(exit_remaining(signature, 29.9, composition.duration_secs).is_none());
}

#[test]
fn windows_are_closed_and_reentry_restarts_animation() {
    let definition = load_fixture();
    let composition = resolve_composition(
        &definition,
        &Customization::new(),
        &duration_bounds(&PreviewDefaults::default()),
    );
    let d = composition.duration_secs;
    let headline = composition.layer("headline").unwrap();
    let message = composition.layer("message").unwrap();

    assert!(is_visible(headline, 2.0, d));
    assert!(is_visible(headline, 5.0, d));
    assert!(!is_visible(headline, 5.01, d));
    assert!(!is_visible(message, 7.99, d));

    let selector = AnimationSelector::default();
    let elapsed = local_elapsed(message, 8.0, d).unwrap();
    assert_eq!(elapsed, 0.0);
    let frame = selector.select(
        message.animation.as_ref(),
        elapsed,
        exit_remaining(message, 8.0, d),
    );
    assert_eq!(frame.phase, AnimationPhase::Entering { progress: 0.0 });
    assert_eq!(frame.state.opacity, 0.0);
}
