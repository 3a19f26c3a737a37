//! Error types shared across Karo crates.

use std::path::PathBuf;

/// Top-level error type for Karo operations.
#[derive(Debug, thiserror::Error)]
pub enum KaroError {
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Preview error: {message}")]
    Preview { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using KaroError.
pub type KaroResult<T> = Result<T, KaroError>;

impl KaroError {
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    pub fn preview(msg: impl Into<String>) -> Self {
        Self::Preview {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_render_messages() {
        let err = KaroError::render("job vanished");
        assert_eq!(err.to_string(), "Render error: job vanished");

        let err = KaroError::template("width must be > 0");
        assert_eq!(err.to_string(), "Template error: width must be > 0");
    }

    #[test]
    fn test_json_error_is_transparent() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let expected = parse_err.to_string();
        let err: KaroError = parse_err.into();
        assert_eq!(err.to_string(), expected);
    }
}
