//! Print the render plan for a customized template.

use karo_common::config::AppConfig;
use karo_composition_core::resolve::{duration_bounds, resolve_composition};
use karo_render_engine::plan::{OverlayContent, RenderPlan};

use super::{load_template, CustomizationArgs};

pub fn run(
    config: &AppConfig,
    template: String,
    at: Option<f64>,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let customization = customization.build()?;
    let composition =
        resolve_composition(&definition, &customization, &duration_bounds(&config.preview));
    let plan = RenderPlan::from_composition(&composition);

    println!("Render plan: {}", plan.template_id);
    println!(
        "  Output: {}x{} @ {}fps, {}s ({} frames)",
        plan.width,
        plan.height,
        plan.fps,
        plan.duration_secs,
        plan.total_frames()
    );
    println!("  Background: {}", plan.background);
    println!();

    let overlays = match at {
        Some(t) => {
            println!("Overlays enabled at {t}s:");
            plan.enabled_at(t)
        }
        None => {
            println!("Overlays:");
            plan.overlays.iter().collect()
        }
    };

    for overlay in overlays {
        let what = match &overlay.content {
            OverlayContent::Video { source, fit } => format!("video {source} ({fit:?})"),
            OverlayContent::Image { source, .. } => format!("image {source}"),
            OverlayContent::Text {
                text,
                font_family,
                font_size,
                ..
            } => format!("text \"{text}\" ({font_family} {font_size})"),
        };
        println!(
            "  [{}] z={} at ({}, {}) enable='{}': {}",
            overlay.layer_id,
            overlay.z,
            overlay.x,
            overlay.y,
            overlay.enable_expression(),
            what
        );
    }

    Ok(())
}
