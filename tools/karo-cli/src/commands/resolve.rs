//! Resolve a template against a customization and print the composition.

use karo_common::config::AppConfig;
use karo_composition_core::resolve::{duration_bounds, resolve_composition};

use super::{load_template, CustomizationArgs};

pub fn run(
    config: &AppConfig,
    template: String,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let customization = customization.build()?;
    let composition =
        resolve_composition(&definition, &customization, &duration_bounds(&config.preview));

    println!("{}", serde_json::to_string_pretty(&composition)?);
    Ok(())
}
