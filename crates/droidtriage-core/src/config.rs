//! Dispatcher configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnosis::Domain;
use crate::error::{Result, TriageError};

/// Hard upper bound on characters examined per input.
pub const MAX_INPUT_CHARS: usize = 100_000;

/// Settings for building a [`crate::Dispatcher`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TriageConfig {
    /// Input is truncated to this many characters before matching.
    pub max_input_chars: usize,

    /// Domains the dispatcher skips entirely.
    pub disabled_domains: Vec<Domain>,

    /// Whether the generic exception/keyword fallback runs last.
    pub generic_fallback: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_input_chars: MAX_INPUT_CHARS,
            disabled_domains: Vec::new(),
            generic_fallback: true,
        }
    }
}

impl TriageConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_input_chars == 0 || self.max_input_chars > MAX_INPUT_CHARS {
            return Err(TriageError::InvalidConfig(format!(
                "max_input_chars must be between 1 and {MAX_INPUT_CHARS}, got {}",
                self.max_input_chars
            )));
        }
        Ok(())
    }

    /// Whether the dispatcher should consult `domain`.
    pub fn is_enabled(&self, domain: Domain) -> bool {
        if domain == Domain::Generic && !self.generic_fallback {
            return false;
        }
        !self.disabled_domains.contains(&domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.max_input_chars, 100_000);
        assert!(config.validate().is_ok());
        assert!(Domain::ALL.iter().all(|d| config.is_enabled(*d)));
    }

    #[test]
    fn test_toml_disables_domains() {
        let config = TriageConfig::from_toml_str(
            r#"
disabled_domains = ["compose"]
generic_fallback = false
"#,
        )
        .expect("parse");
        assert_eq!(config.max_input_chars, MAX_INPUT_CHARS);
        assert!(!config.is_enabled(Domain::Compose));
        assert!(!config.is_enabled(Domain::Generic));
        assert!(config.is_enabled(Domain::Manifest));
    }

    #[test]
    fn test_out_of_range_bound_rejected() {
        let err = TriageConfig::from_toml_str("max_input_chars = 0").unwrap_err();
        assert!(matches!(err, TriageError::InvalidConfig(_)));

        let err = TriageConfig::from_toml_str("max_input_chars = 100001").unwrap_err();
        assert!(err.to_string().contains("between 1 and 100000"));
    }

    #[test]
    fn test_unknown_domain_is_a_toml_error() {
        let err = TriageConfig::from_toml_str(r#"disabled_domains = ["kotlin"]"#).unwrap_err();
        assert!(matches!(err, TriageError::Toml(_)));
    }
}
