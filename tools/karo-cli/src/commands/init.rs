//! Write a starter template definition.

use std::path::PathBuf;

use karo_template_model::template::TemplateDefinition;

pub fn run(id: String, name: Option<String>, output: PathBuf) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(|| id.clone());
    let path = output.join(format!("{id}.json"));
    if path.exists() {
        return Err(anyhow::anyhow!("{} already exists", path.display()));
    }

    println!("Creating template '{}' at {}", id, path.display());

    std::fs::create_dir_all(&output)?;
    let definition = TemplateDefinition::starter(&id, &name);
    definition
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write template: {e}"))?;

    let canvas = definition.canvas();
    println!("Template created successfully:");
    println!("  Canvas: {}x{} @ {}fps", canvas.width, canvas.height, definition.fps);
    println!("  Durations: {:?}", definition.duration_presets);
    println!("  Themes: {}", definition.themes.keys().cloned().collect::<Vec<_>>().join(", "));
    println!(
        "  Placeholders: {}",
        definition.placeholders.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    println!("  Layers: {}", definition.layers.len());
    println!();
    println!("Try: karo preview {} --set headline=\"Hello\"", path.display());

    Ok(())
}
