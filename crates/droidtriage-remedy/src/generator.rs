//! Table-driven remediation for classified diagnoses.
//!
//! Every operation is total: a diagnosis of the wrong type, or one missing the
//! metadata a template needs, yields `None` rather than a partial artifact.

use std::sync::Arc;

use droidtriage_core::{
    emit_remediation_skipped, Diagnosis, DiagnosisType, KnowledgeTables, ModifierConvention, Result,
};

use crate::artifact::{PermissionFix, RemediationArtifact, RemediationCategory};
use crate::template::Interpolator;

/// Which manifest merger fix applies to a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// `tools:replace` on the conflicting attribute.
    AttributeOverride,
    /// `tools:node="remove"` on the duplicated element.
    ElementRemoval,
    /// `tools:overrideLibrary` for a library that needs a higher minSdk.
    LibraryOverride,
    /// Declare the tools namespace so merge markers can be used at all.
    NamespaceSetup,
}

impl ConflictStrategy {
    /// Pick a strategy from the diagnosis's `conflictType`. A minSdk
    /// conflict is always a library override.
    pub fn for_diagnosis(diagnosis: &Diagnosis) -> Self {
        if diagnosis.kind == DiagnosisType::SdkVersionConflict {
            return ConflictStrategy::LibraryOverride;
        }
        match diagnosis.metadata_str("conflictType") {
            Some("attribute") => ConflictStrategy::AttributeOverride,
            Some("element") => ConflictStrategy::ElementRemoval,
            Some("min-sdk") => ConflictStrategy::LibraryOverride,
            _ => ConflictStrategy::NamespaceSetup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemediationGenerator {
    knowledge: Arc<KnowledgeTables>,
    interpolator: Interpolator,
}

impl RemediationGenerator {
    pub fn new(knowledge: Arc<KnowledgeTables>) -> Result<Self> {
        Ok(Self {
            knowledge,
            interpolator: Interpolator::new()?,
        })
    }

    fn render(&self, template: &str, diagnosis: &Diagnosis) -> Option<String> {
        self.interpolator.render(template, &diagnosis.metadata)
    }

    /// Manifest declaration for a missing permission, plus a runtime request
    /// flow when the permission needs an explicit grant.
    pub fn permission_fix(&self, diagnosis: &Diagnosis) -> Option<PermissionFix> {
        if diagnosis.kind != DiagnosisType::PermissionMissing {
            emit_remediation_skipped("permission_fix", diagnosis.kind, "not a permission diagnosis");
            return None;
        }
        let Some(full) = diagnosis.metadata_str("fullPermission") else {
            emit_remediation_skipped("permission_fix", diagnosis.kind, "missing fullPermission");
            return None;
        };
        let templates = &self.knowledge.permission_templates;
        let declaration = RemediationArtifact::new(
            RemediationCategory::Permission,
            format!("Declare {full} in AndroidManifest.xml, directly inside <manifest>."),
        )
        .with_snippet(self.render(&templates.declaration, diagnosis)?);

        let runtime_check = if diagnosis.metadata_bool("sensitive") == Some(true) {
            let snippet = self.render(&templates.runtime_check, diagnosis)?;
            Some(
                RemediationArtifact::new(
                    RemediationCategory::Permission,
                    format!(
                        "{full} is granted at run time; check it and request it before use."
                    ),
                )
                .with_snippet(snippet),
            )
        } else {
            None
        };
        Some(PermissionFix {
            declaration,
            runtime_check,
        })
    }

    /// Manifest merger fix chosen by the conflict's sub-kind.
    pub fn conflict_resolution(&self, diagnosis: &Diagnosis) -> Option<RemediationArtifact> {
        if !matches!(
            diagnosis.kind,
            DiagnosisType::MergeConflict | DiagnosisType::SdkVersionConflict
        ) {
            emit_remediation_skipped(
                "conflict_resolution",
                diagnosis.kind,
                "not a manifest merger diagnosis",
            );
            return None;
        }
        let templates = &self.knowledge.conflict_templates;
        let (human_text, template) = match ConflictStrategy::for_diagnosis(diagnosis) {
            ConflictStrategy::AttributeOverride => {
                let attribute = diagnosis.metadata_str("conflictAttribute")?;
                let element = diagnosis
                    .metadata_str("conflictElement")
                    .unwrap_or("conflicting");
                (
                    format!(
                        "Keep the app's android:{attribute} by adding tools:replace=\"android:{attribute}\" to its <{element}> element."
                    ),
                    &templates.attribute_override,
                )
            }
            ConflictStrategy::ElementRemoval => {
                let element = diagnosis.metadata_str("conflictElement")?;
                match diagnosis.metadata_str("elementName") {
                    Some(name) => (
                        format!(
                            "Drop the duplicated <{element}> {name} with tools:node=\"remove\" in the app manifest."
                        ),
                        &templates.element_removal,
                    ),
                    None => (
                        format!(
                            "Drop the duplicated <{element}> with tools:node=\"remove\" in the app manifest."
                        ),
                        &templates.element_removal_unnamed,
                    ),
                }
            }
            ConflictStrategy::LibraryOverride => {
                let library = diagnosis
                    .metadata_str("library")
                    .unwrap_or("the library");
                let human_text = match diagnosis.metadata_u64("libraryMinSdk") {
                    Some(min) => format!(
                        "Raise minSdk to {min}, or force {library} in with tools:overrideLibrary and guard its calls with Build.VERSION.SDK_INT >= {min}."
                    ),
                    None => format!(
                        "Raise minSdk to the library's level, or force {library} in with tools:overrideLibrary and guard its calls."
                    ),
                };
                (human_text, &templates.library_override)
            }
            ConflictStrategy::NamespaceSetup => (
                "Declare the tools namespace on <manifest> so merge rules such as tools:replace and tools:node can resolve the conflict.".to_string(),
                &templates.namespace_setup,
            ),
        };
        let Some(snippet) = self.render(template, diagnosis) else {
            emit_remediation_skipped("conflict_resolution", diagnosis.kind, "template metadata missing");
            return None;
        };
        Some(RemediationArtifact::new(RemediationCategory::Conflict, human_text).with_snippet(snippet))
    }

    /// Manifest entry for an undeclared activity, service or receiver.
    pub fn declaration_stub(&self, diagnosis: &Diagnosis) -> Option<RemediationArtifact> {
        if diagnosis.kind != DiagnosisType::ComponentUndeclared {
            emit_remediation_skipped("declaration_stub", diagnosis.kind, "not an undeclared component");
            return None;
        }
        let kind = diagnosis.metadata_str("componentKind")?;
        let Some(template) = self.knowledge.component_template(kind) else {
            emit_remediation_skipped("declaration_stub", diagnosis.kind, "no template for component kind");
            return None;
        };
        let snippet = self.render(template, diagnosis)?;
        let name = diagnosis.metadata_str("componentName")?;
        Some(
            RemediationArtifact::new(
                RemediationCategory::Declaration,
                format!("Add this <{kind}> entry for {name} inside <application>."),
            )
            .with_snippet(snippet),
        )
    }

    /// General advice for any classified type.
    ///
    /// Modifier ordering advice also cites the known convention for the
    /// reported pair, when there is one.
    pub fn recommend(&self, diagnosis: &Diagnosis) -> Option<RemediationArtifact> {
        let template = self.knowledge.advice_for(diagnosis.kind)?;
        let Some(mut text) = self.render(template, diagnosis) else {
            emit_remediation_skipped("recommend", diagnosis.kind, "template metadata missing");
            return None;
        };
        if let Some(convention) = self.modifier_convention(diagnosis) {
            text.push_str(&format!(
                " Modifier.{} goes before Modifier.{}: {}.",
                convention.first, convention.then, convention.reason
            ));
        }
        Some(RemediationArtifact::new(RemediationCategory::Advice, text))
    }

    fn modifier_convention(&self, diagnosis: &Diagnosis) -> Option<&ModifierConvention> {
        if diagnosis.kind != DiagnosisType::ModifierOrder {
            return None;
        }
        self.knowledge.modifier_convention(
            diagnosis.metadata_str("modifier")?,
            diagnosis.metadata_str("anchor")?,
        )
    }

    /// Every artifact that applies to `diagnosis`, most specific first.
    pub fn remediate(&self, diagnosis: &Diagnosis) -> Vec<RemediationArtifact> {
        let mut artifacts = Vec::new();
        match diagnosis.kind {
            DiagnosisType::PermissionMissing => {
                if let Some(fix) = self.permission_fix(diagnosis) {
                    artifacts.push(fix.declaration);
                    artifacts.extend(fix.runtime_check);
                }
            }
            DiagnosisType::MergeConflict | DiagnosisType::SdkVersionConflict => {
                artifacts.extend(self.conflict_resolution(diagnosis));
            }
            DiagnosisType::ComponentUndeclared => {
                artifacts.extend(self.declaration_stub(diagnosis));
            }
            _ => {}
        }
        artifacts.extend(self.recommend(diagnosis));
        artifacts
    }
}
