//! Cross-domain classification entry point.
//!
//! The [`Dispatcher`] owns one parser per domain, ordered by
//! [`Domain::priority`], and returns the first diagnosis any of them produces.
//! It is immutable after construction and can be shared across threads.

use std::sync::Arc;

use serde_json::Value;

use crate::config::TriageConfig;
use crate::diagnosis::{Diagnosis, Domain};
use crate::domains;
use crate::error::Result;
use crate::extract::Locator;
use crate::knowledge::KnowledgeTables;
use crate::obs;
use crate::parser::{truncate_chars, DiagnosisParser, DomainParser};

pub struct Dispatcher {
    parsers: Vec<Arc<dyn DiagnosisParser>>,
    max_input_chars: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("domains", &self.domains())
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl Dispatcher {
    /// Build parsers for every enabled domain from the built-in rule tables.
    pub fn from_config(config: &TriageConfig, knowledge: Arc<KnowledgeTables>) -> Result<Self> {
        config.validate()?;
        let locator = Arc::new(Locator::new()?);
        let mut parsers: Vec<Arc<dyn DiagnosisParser>> = Vec::new();
        for domain in Domain::ALL {
            if !config.is_enabled(domain) {
                obs::emit_domain_skipped(domain, "disabled by configuration");
                continue;
            }
            parsers.push(Arc::new(DomainParser::new(
                domains::rule_set(domain)?,
                Arc::clone(&knowledge),
                Arc::clone(&locator),
                config.max_input_chars,
            )));
        }
        Ok(Self::with_parsers(parsers, config.max_input_chars))
    }

    /// Dispatcher over the default configuration and knowledge tables.
    pub fn with_defaults() -> Result<Self> {
        Self::from_config(
            &TriageConfig::default(),
            Arc::new(KnowledgeTables::default()),
        )
    }

    /// Use caller-supplied parsers. They are consulted in domain priority
    /// order regardless of the order given here.
    pub fn with_parsers(mut parsers: Vec<Arc<dyn DiagnosisParser>>, max_input_chars: usize) -> Self {
        parsers.sort_by_key(|p| p.domain().priority());
        Self {
            parsers,
            max_input_chars: max_input_chars.clamp(1, crate::config::MAX_INPUT_CHARS),
        }
    }

    /// Domains consulted, in order.
    pub fn domains(&self) -> Vec<Domain> {
        self.parsers.iter().map(|p| p.domain()).collect()
    }

    /// Classify free-form diagnostic text.
    pub fn classify_any(&self, text: &str) -> Option<Diagnosis> {
        if text.trim().is_empty() {
            return None;
        }
        let total_chars = text.chars().count();
        if total_chars > self.max_input_chars {
            obs::emit_input_truncated(total_chars, self.max_input_chars);
        }
        let bounded = truncate_chars(text, self.max_input_chars);
        let input_chars = total_chars.min(self.max_input_chars);

        for parser in &self.parsers {
            if let Some(diagnosis) = parser.classify(bounded) {
                obs::emit_classified(parser.domain(), diagnosis.kind, input_chars);
                return Some(diagnosis);
            }
        }
        obs::emit_unclassified(input_chars);
        None
    }

    /// Classify a JSON value; anything other than a string yields `None`.
    pub fn classify_value(&self, value: &Value) -> Option<Diagnosis> {
        value.as_str().and_then(|text| self.classify_any(text))
    }
}
