//! Per-domain classifiers.

use std::sync::Arc;

use crate::config::MAX_INPUT_CHARS;
use crate::diagnosis::{Diagnosis, Domain};
use crate::domains;
use crate::error::Result;
use crate::extract::Locator;
use crate::knowledge::KnowledgeTables;
use crate::obs;
use crate::rules::{DomainRuleSet, RuleHit};

/// Classifies raw text for one domain.
///
/// `None` means "no applicable rule"; callers must treat an unimplemented
/// domain the same way.
pub trait DiagnosisParser: Send + Sync {
    fn domain(&self) -> Domain;

    fn classify(&self, text: &str) -> Option<Diagnosis>;
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Runs one [`DomainRuleSet`] cascade.
#[derive(Debug)]
pub struct DomainParser {
    rules: DomainRuleSet,
    knowledge: Arc<KnowledgeTables>,
    locator: Arc<Locator>,
    max_input_chars: usize,
}

impl DomainParser {
    pub fn new(
        rules: DomainRuleSet,
        knowledge: Arc<KnowledgeTables>,
        locator: Arc<Locator>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            rules,
            knowledge,
            locator,
            max_input_chars: max_input_chars.clamp(1, MAX_INPUT_CHARS),
        }
    }

    /// Parser over the built-in rules for `domain`.
    pub fn builtin(domain: Domain, knowledge: Arc<KnowledgeTables>) -> Result<Self> {
        Ok(Self::new(
            domains::rule_set(domain)?,
            knowledge,
            Arc::new(Locator::new()?),
            MAX_INPUT_CHARS,
        ))
    }

    pub fn rule_set(&self) -> &DomainRuleSet {
        &self.rules
    }

    /// Every rule that fires on `text`, in evaluation order.
    ///
    /// More than one hit with different kinds marks an input whose outcome
    /// depends on rule priority alone.
    pub fn hits(&self, text: &str) -> Vec<RuleHit> {
        self.rules.hits(
            truncate_chars(text, self.max_input_chars),
            &self.knowledge,
            &self.locator,
        )
    }
}

impl DiagnosisParser for DomainParser {
    fn domain(&self) -> Domain {
        self.rules.domain()
    }

    fn classify(&self, text: &str) -> Option<Diagnosis> {
        if text.trim().is_empty() {
            return None;
        }
        let bounded = truncate_chars(text, self.max_input_chars);
        let (diagnosis, rule_id) = self.rules.evaluate(bounded, &self.knowledge, &self.locator)?;
        obs::emit_rule_matched(self.domain(), rule_id, diagnosis.kind);
        Some(diagnosis)
    }
}

/// Stand-in for a domain with no rules; never classifies anything.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableParser {
    domain: Domain,
}

impl UnavailableParser {
    pub fn new(domain: Domain) -> Self {
        Self { domain }
    }
}

impl DiagnosisParser for UnavailableParser {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn classify(&self, _text: &str) -> Option<Diagnosis> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::DiagnosisType;

    fn parser(domain: Domain) -> DomainParser {
        DomainParser::builtin(domain, Arc::new(KnowledgeTables::default())).expect("parser")
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_blank_input_is_none_for_every_domain() {
        for domain in Domain::ALL {
            let p = parser(domain);
            assert!(p.classify("").is_none());
            assert!(p.classify("   \n\t").is_none());
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let p = parser(Domain::Layout);
        let text = "Binary XML file line #42: Error inflating class Foo";
        assert_eq!(p.classify(text), p.classify(text));
    }

    #[test]
    fn test_signature_past_the_bound_is_ignored() {
        let p = DomainParser::new(
            domains::rule_set(Domain::Manifest).expect("rules"),
            Arc::new(KnowledgeTables::default()),
            Arc::new(Locator::new().expect("locator")),
            64,
        );
        let text = format!("{}requires android.permission.CAMERA", "x".repeat(64));
        assert!(p.classify(&text).is_none());
        assert!(p.hits(&text).is_empty());

        let diag = p
            .classify("requires android.permission.CAMERA")
            .expect("match");
        assert_eq!(diag.kind, DiagnosisType::PermissionMissing);
    }

    #[test]
    fn test_unavailable_parser_never_matches() {
        let p = UnavailableParser::new(Domain::Compose);
        assert_eq!(p.domain(), Domain::Compose);
        assert!(p
            .classify("Modifier.clickable must come after Modifier.padding")
            .is_none());
    }
}
