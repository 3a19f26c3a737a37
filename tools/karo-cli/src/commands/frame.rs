//! Compose one frame at a given time.

use karo_common::config::AppConfig;
use karo_composition_core::animation::AnimationSelector;
use karo_composition_core::resolve::{duration_bounds, resolve_composition};
use karo_composition_core::scale::ScaleMapper;
use karo_render_engine::compositor::compose_frame;

use super::{load_template, CustomizationArgs};

pub fn run(
    config: &AppConfig,
    template: String,
    time: f64,
    width: Option<f64>,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let customization = customization.build()?;
    let composition =
        resolve_composition(&definition, &customization, &duration_bounds(&config.preview));

    let mut scale = ScaleMapper::new(definition.canvas())?;
    if let Some(width) = width {
        scale.resize(width)?;
    }

    let t = time.clamp(0.0, composition.duration_secs);
    let selector = AnimationSelector::from(&config.preview);
    let frame = compose_frame(&composition, t, scale.scale(), &selector);

    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}
