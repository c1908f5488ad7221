//! Last-resort rules for text no specific domain recognises.

use crate::diagnosis::{DiagnosisType, Domain, Language};
use crate::error::Result;
use crate::extract::MetadataBuilder;
use crate::rules::{DomainRuleSet, Extraction, MatchRule, RuleMatch};

pub fn rule_set() -> Result<DomainRuleSet> {
    let rules = vec![
        MatchRule::new(
            "generic.exception_class",
            10,
            DiagnosisType::Unknown,
            r"(?-i:\b(?P<cls>(?:[a-z_$][\w$]*\.)*[A-Z][\w$]*(?:Exception|Error))\b)",
            exception_class,
        )?,
        MatchRule::new(
            "generic.error_keyword",
            20,
            DiagnosisType::Unknown,
            r"\b(?:error|failed|failure|fatal)\b",
            keyword_only,
        )?,
    ];
    DomainRuleSet::new(Domain::Generic, Language::Unknown, None, rules)
}

fn exception_class(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("exceptionClass", m.named("cls"))
            .build(),
    )
}

fn keyword_only(_: &RuleMatch<'_>) -> Extraction {
    Extraction::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::Diagnosis;
    use crate::extract::Locator;
    use crate::knowledge::KnowledgeTables;

    fn classify(text: &str) -> Option<Diagnosis> {
        let set = rule_set().expect("generic rules compile");
        let locator = Locator::new().expect("locator");
        set.evaluate(text, &KnowledgeTables::default(), &locator)
            .map(|(d, _)| d)
    }

    #[test]
    fn test_exception_class_and_user_frame() {
        let trace = "FATAL EXCEPTION: main\n\
            java.lang.NullPointerException: Attempt to invoke virtual method on a null object reference\n\
            \tat com.example.app.ProfileFragment.onViewCreated(ProfileFragment.java:57)\n\
            \tat androidx.fragment.app.Fragment.performViewCreated(Fragment.java:3128)";
        let diag = classify(trace).expect("match");
        assert_eq!(diag.kind, DiagnosisType::Unknown);
        assert_eq!(
            diag.metadata_str("exceptionClass"),
            Some("java.lang.NullPointerException")
        );
        assert_eq!(diag.file_path, "ProfileFragment.java");
        assert_eq!(diag.line, 57);
        assert_eq!(diag.language, Language::Java);
        assert_eq!(diag.framework, None);
    }

    #[test]
    fn test_error_keyword_without_class() {
        let diag = classify("BUILD FAILED in 3s").expect("match");
        assert_eq!(diag.kind, DiagnosisType::Unknown);
        assert!(diag.metadata.is_empty());
        assert_eq!(diag.file_path, "unknown");
        assert_eq!(diag.language, Language::Unknown);
        assert_eq!(diag.message, "BUILD FAILED in 3s");
    }

    #[test]
    fn test_plain_text_is_not_classified() {
        assert!(classify("Everything compiled fine").is_none());
        assert!(classify("errors are summarised below").is_none());
    }
}
