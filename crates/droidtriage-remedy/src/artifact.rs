//! Remediation output types.

use serde::{Deserialize, Serialize};

/// What kind of fix an artifact describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RemediationCategory {
    Permission,
    Conflict,
    Declaration,
    Advice,
}

/// Advice text plus an optional code or markup snippet.
///
/// Built fresh per call and never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemediationArtifact {
    pub category: RemediationCategory,
    pub human_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl RemediationArtifact {
    pub fn new(category: RemediationCategory, human_text: impl Into<String>) -> Self {
        Self {
            category,
            human_text: human_text.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Whether the human text or the snippet contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.human_text.contains(needle)
            || self.snippet.as_deref().is_some_and(|s| s.contains(needle))
    }
}

/// Manifest declaration for a permission plus, for runtime-granted
/// permissions only, the request flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFix {
    pub declaration: RemediationArtifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_check: Option<RemediationArtifact>,
}
