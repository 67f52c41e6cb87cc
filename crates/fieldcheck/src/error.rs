//! Error types for the field validation engine.

use std::time::Duration;
use thiserror::Error;

/// Diagnostic produced when a rule cannot be evaluated as configured.
///
/// Diagnostics never escape an event handler. They are logged and the rule
/// reports invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Invalid regex pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Custom rule has no validator function")]
    MissingValidator,
}

/// Failure of a remote uniqueness lookup.
///
/// Every variant maps to the `undetermined` outcome: the engine could not tell
/// whether the value is taken.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Lookup endpoint answered with status {0}")]
    Status(u16),

    #[error("Lookup response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Lookup response must be a JSON array, got {0}")]
    MalformedResponse(&'static str),

    #[error("Lookup timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("No async runtime available to run the lookup")]
    NoRuntime,

    #[error("Lookup failed: {0}")]
    Other(String),
}

/// Failure to load engine settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings error: {0}")]
    Env(#[from] envy::Error),

    #[error("Failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_error_names_the_pattern() {
        let error = RuleError::InvalidPattern {
            pattern: "[a-".into(),
            reason: "unclosed class".into(),
        };
        assert_eq!(error.to_string(), "Invalid regex pattern [a-: unclosed class");
    }

    #[test]
    fn lookup_error_messages() {
        assert_eq!(
            LookupError::Timeout(Duration::from_millis(250)).to_string(),
            "Lookup timed out after 250ms"
        );
        assert_eq!(
            LookupError::MalformedResponse("object").to_string(),
            "Lookup response must be a JSON array, got object"
        );
        assert_eq!(
            LookupError::Status(503).to_string(),
            "Lookup endpoint answered with status 503"
        );
    }
}
