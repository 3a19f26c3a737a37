//! Subcommand implementations and the helpers they share.

pub mod frame;
pub mod info;
pub mod init;
pub mod plan;
pub mod preview;
pub mod render;
pub mod resolve;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::Args;
use karo_common::config::AppConfig;
use karo_common::KaroResult;
use karo_template_model::customization::Customization;
use karo_template_model::template::TemplateDefinition;

/// Customization flags shared by every command that resolves a template.
#[derive(Args, Debug, Default)]
pub struct CustomizationArgs {
    /// JSON file with a flat customization object
    #[arg(long, value_name = "FILE")]
    pub customization: Option<PathBuf>,

    /// Theme id
    #[arg(long)]
    pub theme: Option<String>,

    /// Duration in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Placeholder value, repeatable
    #[arg(long = "set", value_name = "ID=VALUE")]
    pub values: Vec<String>,
}

impl CustomizationArgs {
    /// Build a customization: the file first, then flags on top.
    pub fn build(&self) -> anyhow::Result<Customization> {
        let mut customization = match &self.customization {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read customization {}: {e}", path.display())
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    anyhow::anyhow!("Invalid customization {}: {e}", path.display())
                })?
            }
            None => Customization::new(),
        };

        if let Some(theme) = &self.theme {
            customization.theme_id = Some(theme.clone());
        }
        if let Some(secs) = self.duration {
            customization.duration_seconds = Some(secs);
        }
        for pair in &self.values {
            let (id, value) = parse_pair(pair)?;
            customization.set(id, value);
        }
        Ok(customization)
    }
}

fn parse_pair(pair: &str) -> anyhow::Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim(), value)),
        _ => Err(anyhow::anyhow!("Expected ID=VALUE, got '{pair}'")),
    }
}

/// Find a definition by path, or by id under the configured templates
/// directory.
pub fn template_path(config: &AppConfig, template: &str) -> PathBuf {
    let direct = Path::new(template);
    if direct.exists() {
        return direct.to_path_buf();
    }
    let by_id = config.templates_dir.join(format!("{template}.json"));
    if by_id.exists() {
        tracing::debug!(path = %by_id.display(), "Resolved template id");
        return by_id;
    }
    direct.to_path_buf()
}

pub fn load_template(config: &AppConfig, template: &str) -> KaroResult<TemplateDefinition> {
    let path = template_path(config, template);
    let definition = TemplateDefinition::load(&path)?;
    tracing::debug!(template = %definition.id, path = %path.display(), "Loaded template");
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use karo_common::KaroError;

    #[test]
    fn test_flags_override_file_values() {
        let args = CustomizationArgs {
            theme: Some("gold".to_string()),
            duration: Some(30.0),
            values: vec!["headline=Happy Diwali".to_string(), "cta=a=b".to_string()],
            ..Default::default()
        };
        let customization = args.build().unwrap();
        assert_eq!(customization.theme_id.as_deref(), Some("gold"));
        assert_eq!(customization.duration_seconds, Some(30.0));
        assert_eq!(customization.value("headline"), Some("Happy Diwali"));
        assert_eq!(customization.value("cta"), Some("a=b"));
    }

    #[test]
    fn test_malformed_pair_is_rejected() {
        assert!(parse_pair("headline").is_err());
        assert!(parse_pair("=value").is_err());
    }

    #[test]
    fn test_missing_template_is_file_not_found() {
        let config = AppConfig {
            templates_dir: PathBuf::from("/nonexistent/karo"),
            ..AppConfig::default()
        };
        let err = load_template(&config, "/nonexistent/karo/missing.json").unwrap_err();
        assert!(matches!(err, KaroError::FileNotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_unknown_template_keeps_given_path() {
        let config = AppConfig {
            templates_dir: PathBuf::from("/nonexistent/karo"),
            ..AppConfig::default()
        };
        assert_eq!(
            template_path(&config, "missing.json"),
            PathBuf::from("missing.json")
        );
    }
}
