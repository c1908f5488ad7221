//! Structured observability hooks for classification and remediation.
//!
//! Every hook emits a `debug!` or `trace!` event with an `event` field naming
//! what happened. Results never depend on whether a subscriber is installed.
//! Raw diagnostic text is never logged, only its length.

use tracing::{debug, trace};

use crate::diagnosis::{DiagnosisType, Domain};

/// Emit event: input exceeded the configured bound and was cut.
pub fn emit_input_truncated(original_chars: usize, max_chars: usize) {
    debug!(
        event = "input.truncated",
        original_chars = original_chars,
        max_chars = max_chars,
    );
}

/// Emit event: a rule's trigger won the cascade in one domain.
pub fn emit_rule_matched(domain: Domain, rule_id: &str, kind: DiagnosisType) {
    trace!(
        event = "rule.matched",
        domain = domain.as_str(),
        rule_id = %rule_id,
        kind = kind.as_str(),
    );
}

/// Emit event: a domain was skipped by the dispatcher.
pub fn emit_domain_skipped(domain: Domain, reason: &str) {
    debug!(event = "domain.skipped", domain = domain.as_str(), reason = %reason);
}

/// Emit event: the dispatcher produced a diagnosis.
pub fn emit_classified(domain: Domain, kind: DiagnosisType, input_chars: usize) {
    debug!(
        event = "diagnosis.classified",
        domain = domain.as_str(),
        kind = kind.as_str(),
        input_chars = input_chars,
    );
}

/// Emit event: no domain recognised the input.
pub fn emit_unclassified(input_chars: usize) {
    debug!(event = "diagnosis.unclassified", input_chars = input_chars);
}

/// Emit event: a remediation operation declined to generate an artifact.
pub fn emit_remediation_skipped(operation: &str, kind: DiagnosisType, reason: &str) {
    debug!(
        event = "remediation.skipped",
        operation = %operation,
        kind = kind.as_str(),
        reason = %reason,
    );
}
