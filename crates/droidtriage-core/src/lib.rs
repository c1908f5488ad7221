//! droidtriage core library
//!
//! Deterministic classification of Android toolchain output (compiler errors,
//! stack traces, Gradle logs) into typed [`Diagnosis`] values.

pub mod config;
pub mod diagnosis;
pub mod dispatcher;
pub mod domains;
pub mod error;
pub mod extract;
pub mod knowledge;
pub mod obs;
pub mod parser;
pub mod rules;
pub mod telemetry;

pub use config::{TriageConfig, MAX_INPUT_CHARS};
pub use diagnosis::{
    is_sentinel_path, Diagnosis, DiagnosisType, Domain, FieldKind, Language, Metadata,
    MetadataField, UNKNOWN_FILE, UNKNOWN_GRADLE_FILE, UNKNOWN_XML_FILE,
};
pub use dispatcher::Dispatcher;
pub use error::{Result, TriageError};
pub use extract::{Locator, SourceLocation, StackFrame};
pub use knowledge::{
    ComponentTemplates, ConflictTemplates, KnowledgeTables, ModifierConvention,
    PermissionTemplates,
};
pub use obs::{
    emit_classified, emit_domain_skipped, emit_input_truncated, emit_remediation_skipped,
    emit_rule_matched, emit_unclassified,
};
pub use parser::{truncate_chars, DiagnosisParser, DomainParser, UnavailableParser};
pub use rules::{DomainRuleSet, Extraction, Extractor, Guard, MatchRule, RuleHit, RuleMatch};
pub use telemetry::{default_directives, init_tracing, LOG_ENV};

/// droidtriage version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
