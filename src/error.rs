//! Structured error types for legend layout.
//!
//! Icon failures are the only recoverable class: depending on the
//! `failOnBrokenUrl` policy they either abort the legend or drop the
//! offending item. Everything else aborts the render.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum LegendError {
    /// A legend record is missing a required field.
    #[error("Missing required field '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    /// An icon reference could not be resolved or decoded.
    #[error("Broken icon '{src}': {reason}")]
    BrokenIcon { src: String, reason: String },

    /// A swatch color could not be parsed.
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    /// A configuration value is out of range.
    #[error("Invalid value for '{option}': {value}")]
    InvalidConfig { option: &'static str, value: String },

    /// The measurement surface could not be created or released.
    #[error("Measurement surface error: {0}")]
    Surface(String),

    /// The column width negotiation did not reach a fixed point.
    #[error("Column layout did not converge after {attempts} attempts")]
    NotConverged { attempts: usize },

    /// JSON input failed to parse.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

impl LegendError {
    /// Whether the `failOnBrokenUrl = false` policy may skip this error.
    pub fn is_icon_failure(&self) -> bool {
        matches!(
            self,
            LegendError::BrokenIcon { .. } | LegendError::InvalidColor(_)
        )
    }

    pub(crate) fn broken_icon(src: &str, reason: impl Into<String>) -> Self {
        LegendError::BrokenIcon {
            src: abbreviate(src),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(option: &'static str, value: impl ToString) -> Self {
        LegendError::InvalidConfig {
            option,
            value: value.to_string(),
        }
    }
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

/// Data URIs can be huge; keep error messages readable.
fn abbreviate(src: &str) -> String {
    const MAX: usize = 64;
    if src.chars().count() <= MAX {
        src.to_string()
    } else {
        let head: String = src.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

impl From<serde_json::Error> for LegendError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the legend schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LegendError::Parse { source: e, hint }
    }
}
