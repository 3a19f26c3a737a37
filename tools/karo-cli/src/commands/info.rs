//! Show the catalog summary of a template.

use karo_common::config::AppConfig;
use karo_template_model::catalog::TemplateSummary;

use super::load_template;

pub fn run(config: &AppConfig, template: String, json: bool) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let summary = TemplateSummary::from_definition(&definition);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Template: {}", summary.name);
    println!("  ID: {}", summary.id);
    if let Some(hindi) = &summary.name_hindi {
        println!("  Name (hi): {hindi}");
    }
    println!("  Category: {}", summary.category);
    println!(
        "  Canvas: {}x{} @ {}fps ({})",
        summary.width,
        summary.height,
        summary.fps,
        summary.aspect_ratio.as_deref().unwrap_or("custom")
    );
    println!(
        "  Duration: {}s (presets: {:?})",
        summary.duration_seconds, summary.duration_presets
    );
    println!("  Layers: {}", summary.layer_count);
    if !summary.tags.is_empty() {
        println!("  Tags: {}", summary.tags.join(", "));
    }
    println!();

    println!("Customizable fields:");
    for field in &summary.customizable_fields {
        let required = if field.required { " (required)" } else { "" };
        println!(
            "  {}: {:?} \"{}\"{}",
            field.field_id, field.field_type, field.label, required
        );
        if let Some(max) = field.max_length {
            println!("    max length: {max}");
        }
        if let Some(default) = &field.default_value {
            println!("    default: {default}");
        }
    }
    println!();

    println!("Color schemes:");
    for scheme in &summary.color_schemes {
        println!(
            "  {} ({}): primary {}, secondary {}, background {}, text {}",
            scheme.theme_id,
            scheme.name,
            scheme.primary,
            scheme.secondary,
            scheme.background,
            scheme.text
        );
    }
    println!();

    println!("Fonts: {}", summary.font_options.join(", "));

    Ok(())
}
