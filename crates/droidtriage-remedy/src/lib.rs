//! droidtriage remediation
//!
//! Turns classified [`droidtriage_core::Diagnosis`] values into advice text and
//! manifest or Kotlin snippets, driven entirely by the shared
//! [`droidtriage_core::KnowledgeTables`].

pub mod artifact;
pub mod generator;
pub mod template;

pub use artifact::{PermissionFix, RemediationArtifact, RemediationCategory};
pub use generator::{ConflictStrategy, RemediationGenerator};
pub use template::Interpolator;
