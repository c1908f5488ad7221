//! Observability tests for classification tracing.
//!
//! Events are emitted at debug/trace level; `#[traced_test]` captures them so
//! the log contents can be asserted.

use droidtriage_core::{
    emit_classified, emit_domain_skipped, emit_input_truncated, emit_remediation_skipped,
    emit_rule_matched, emit_unclassified, DiagnosisType, Dispatcher, Domain,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_helpers_do_not_panic() {
    emit_input_truncated(250_000, 100_000);
    emit_rule_matched(Domain::Layout, "layout.must_supply", DiagnosisType::AttributeMissing);
    emit_domain_skipped(Domain::Compose, "disabled by configuration");
    emit_classified(Domain::Manifest, DiagnosisType::PermissionMissing, 42);
    emit_unclassified(7);
    emit_remediation_skipped("permission_fix", DiagnosisType::ModifierOrder, "wrong type");
}

#[traced_test]
#[test]
fn test_classification_logs_domain_and_kind() {
    let dispatcher = Dispatcher::with_defaults().expect("dispatcher");
    dispatcher.classify_any("requires android.permission.CAMERA");

    assert!(logs_contain("diagnosis.classified"));
    assert!(logs_contain("permission-missing"));
}

#[traced_test]
#[test]
fn test_unclassified_input_is_logged() {
    let dispatcher = Dispatcher::with_defaults().expect("dispatcher");
    assert!(dispatcher.classify_any("all good here").is_none());
    assert!(logs_contain("diagnosis.unclassified"));
}

#[traced_test]
#[test]
fn test_truncation_is_logged_without_raw_text() {
    let dispatcher = Dispatcher::with_defaults().expect("dispatcher");
    let text = "secret-token ".repeat(10_000);
    dispatcher.classify_any(&text);
    assert!(logs_contain("input.truncated"));
    assert!(!logs_contain("secret-token"));
}
