//! Validate a template definition, its token references, and optionally a
//! customization against it.

use karo_common::config::AppConfig;
use karo_composition_core::resolve::duration_bounds;

use super::{load_template, CustomizationArgs};

pub fn run(
    config: &AppConfig,
    template: String,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    println!("Validating template: {template}");

    let definition = load_template(config, &template)?;
    let canvas = definition.canvas();

    println!("  ID: {}", definition.id);
    println!("  Name: {}", definition.name.en());
    println!("  Canvas: {}x{} @ {}fps", canvas.width, canvas.height, definition.fps);
    println!("  Layers: {}", definition.layers.len());

    let mut issues = definition.reference_issues();

    let customization = customization.build()?;
    let bounds = duration_bounds(&config.preview);
    issues.extend(
        customization
            .issues(&definition, &bounds)
            .into_iter()
            .map(|issue| issue.to_string()),
    );

    if issues.is_empty() {
        println!("\nTemplate is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Unresolved values will use fallbacks.",
            issues.len()
        );
    }

    Ok(())
}
