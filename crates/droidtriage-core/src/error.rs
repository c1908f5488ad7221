//! Error taxonomy for droidtriage.
//!
//! Only construction can fail: compiling rule patterns, validating rule sets,
//! and loading configuration or knowledge tables. Classification itself is
//! total and reports "no match" as `None`.

/// Errors produced while building classifiers or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("rule {rule} has an invalid pattern: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rule set: {0}")]
    InvalidRuleSet(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for droidtriage construction and loading.
pub type Result<T> = std::result::Result<T, TriageError>;
