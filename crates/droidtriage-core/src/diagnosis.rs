//! Diagnosis model: the typed output of classifying raw diagnostic text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel file path when no file reference is found.
pub const UNKNOWN_FILE: &str = "unknown";
/// Sentinel file path for layout diagnoses without an explicit XML path.
pub const UNKNOWN_XML_FILE: &str = "unknown.xml";
/// Sentinel file path for build diagnoses without a script reference.
pub const UNKNOWN_GRADLE_FILE: &str = "unknown.gradle";

/// Whether `path` is one of the sentinel placeholders rather than a real path.
pub fn is_sentinel_path(path: &str) -> bool {
    matches!(path, UNKNOWN_FILE | UNKNOWN_XML_FILE | UNKNOWN_GRADLE_FILE)
}

/// Open metadata map attached to a diagnosis. Keys are camelCase.
pub type Metadata = BTreeMap<String, Value>;

/// Error family a diagnosis belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Manifest,
    Layout,
    Compose,
    Gradle,
    Generic,
}

impl Domain {
    /// All domains in dispatch order.
    pub const ALL: [Domain; 5] = [
        Domain::Manifest,
        Domain::Layout,
        Domain::Compose,
        Domain::Gradle,
        Domain::Generic,
    ];

    /// Dispatch priority; lower runs first.
    pub fn priority(self) -> u16 {
        match self {
            Domain::Manifest => 10,
            Domain::Layout => 20,
            Domain::Compose => 30,
            Domain::Gradle => 40,
            Domain::Generic => 1000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Manifest => "manifest",
            Domain::Gradle => "gradle",
            Domain::Layout => "layout",
            Domain::Compose => "compose",
            Domain::Generic => "generic",
        }
    }

    /// File path used when the text names no file.
    pub fn sentinel_file(self) -> &'static str {
        match self {
            Domain::Layout => UNKNOWN_XML_FILE,
            Domain::Gradle => UNKNOWN_GRADLE_FILE,
            Domain::Manifest | Domain::Compose | Domain::Generic => UNKNOWN_FILE,
        }
    }
}

/// Source language of the file a diagnosis points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Kotlin,
    Java,
    Xml,
    Gradle,
    Unknown,
}

impl Language {
    /// Infer the language from a file extension. Sentinels yield `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        if is_sentinel_path(path) {
            return None;
        }
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".gradle") || lower.ends_with(".gradle.kts") {
            Some(Language::Gradle)
        } else if lower.ends_with(".kt") || lower.ends_with(".kts") {
            Some(Language::Kotlin)
        } else if lower.ends_with(".java") {
            Some(Language::Java)
        } else if lower.ends_with(".xml") {
            Some(Language::Xml)
        } else {
            None
        }
    }
}

/// Kind of value a metadata field holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    String,
    Integer,
    Bool,
    StringList,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// One entry of a type's metadata schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataField {
    pub name: &'static str,
    pub kind: FieldKind,
}

use FieldKind::{Bool, Integer, String as Str, StringList};

/// Closed set of classified diagnosis types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosisType {
    // manifest
    PermissionMissing,
    ComponentUndeclared,
    MergeConflict,
    SdkVersionConflict,
    ExportedMissing,
    // gradle
    DependencyConflict,
    VersionConflict,
    CompileSdkTooLow,
    JvmTargetMismatch,
    PluginNotFound,
    DependencyUnresolved,
    BuildScriptError,
    BuildTaskFailed,
    // layout
    AttributeMissing,
    ResourceNotFound,
    ViewClassNotFound,
    DuplicateViewId,
    LayoutInflationFailed,
    // compose
    ModifierOrder,
    StateNotRemembered,
    StateNotRetained,
    StateNotSaveable,
    EffectKeyMissing,
    SideEffectInComposition,
    CompositionLocalMissing,
    ComposableContextRequired,
    RecompositionExcessive,
    // generic
    Unknown,
}

impl DiagnosisType {
    pub fn domain(self) -> Domain {
        use DiagnosisType::*;
        match self {
            PermissionMissing | ComponentUndeclared | MergeConflict | SdkVersionConflict
            | ExportedMissing => Domain::Manifest,
            DependencyConflict | VersionConflict | CompileSdkTooLow | JvmTargetMismatch
            | PluginNotFound | DependencyUnresolved | BuildScriptError | BuildTaskFailed => {
                Domain::Gradle
            }
            AttributeMissing | ResourceNotFound | ViewClassNotFound | DuplicateViewId
            | LayoutInflationFailed => Domain::Layout,
            ModifierOrder
            | StateNotRemembered
            | StateNotRetained
            | StateNotSaveable
            | EffectKeyMissing
            | SideEffectInComposition
            | CompositionLocalMissing
            | ComposableContextRequired
            | RecompositionExcessive => Domain::Compose,
            Unknown => Domain::Generic,
        }
    }

    pub fn as_str(self) -> &'static str {
        use DiagnosisType::*;
        match self {
            PermissionMissing => "permission-missing",
            ComponentUndeclared => "component-undeclared",
            MergeConflict => "merge-conflict",
            SdkVersionConflict => "sdk-version-conflict",
            ExportedMissing => "exported-missing",
            DependencyConflict => "dependency-conflict",
            VersionConflict => "version-conflict",
            CompileSdkTooLow => "compile-sdk-too-low",
            JvmTargetMismatch => "jvm-target-mismatch",
            PluginNotFound => "plugin-not-found",
            DependencyUnresolved => "dependency-unresolved",
            BuildScriptError => "build-script-error",
            BuildTaskFailed => "build-task-failed",
            AttributeMissing => "attribute-missing",
            ResourceNotFound => "resource-not-found",
            ViewClassNotFound => "view-class-not-found",
            DuplicateViewId => "duplicate-view-id",
            LayoutInflationFailed => "layout-inflation-failed",
            ModifierOrder => "modifier-order",
            StateNotRemembered => "state-not-remembered",
            StateNotRetained => "state-not-retained",
            StateNotSaveable => "state-not-saveable",
            EffectKeyMissing => "effect-key-missing",
            SideEffectInComposition => "side-effect-in-composition",
            CompositionLocalMissing => "composition-local-missing",
            ComposableContextRequired => "composable-context-required",
            RecompositionExcessive => "recomposition-excessive",
            Unknown => "unknown",
        }
    }

    /// Metadata fields a diagnosis of this type may carry.
    ///
    /// Every field is optional; extractors omit what the text does not hold.
    pub fn metadata_schema(self) -> &'static [MetadataField] {
        use DiagnosisType::*;
        match self {
            PermissionMissing => &[
                MetadataField { name: "permission", kind: Str },
                MetadataField { name: "fullPermission", kind: Str },
                MetadataField { name: "sensitive", kind: Bool },
            ],
            ComponentUndeclared => &[
                MetadataField { name: "componentKind", kind: Str },
                MetadataField { name: "componentName", kind: Str },
                MetadataField { name: "packageName", kind: Str },
                MetadataField { name: "simpleName", kind: Str },
            ],
            MergeConflict => &[
                MetadataField { name: "conflictType", kind: Str },
                MetadataField { name: "conflictElement", kind: Str },
                MetadataField { name: "conflictAttribute", kind: Str },
                MetadataField { name: "elementName", kind: Str },
                MetadataField { name: "localValue", kind: Str },
                MetadataField { name: "libraryValue", kind: Str },
                MetadataField { name: "library", kind: Str },
            ],
            SdkVersionConflict => &[
                MetadataField { name: "appMinSdk", kind: Integer },
                MetadataField { name: "libraryMinSdk", kind: Integer },
                MetadataField { name: "library", kind: Str },
                MetadataField { name: "libraryPackage", kind: Str },
                MetadataField { name: "conflictType", kind: Str },
            ],
            ExportedMissing => &[
                MetadataField { name: "componentKind", kind: Str },
                MetadataField { name: "componentName", kind: Str },
            ],
            DependencyConflict => &[
                MetadataField { name: "className", kind: Str },
                MetadataField { name: "modules", kind: StringList },
            ],
            VersionConflict => &[
                MetadataField { name: "dependency", kind: Str },
                MetadataField { name: "project", kind: Str },
                MetadataField { name: "versions", kind: StringList },
            ],
            CompileSdkTooLow => &[
                MetadataField { name: "dependency", kind: Str },
                MetadataField { name: "requiredCompileSdk", kind: Integer },
                MetadataField { name: "currentCompileSdk", kind: Integer },
            ],
            JvmTargetMismatch => &[
                MetadataField { name: "tasks", kind: StringList },
                MetadataField { name: "targets", kind: StringList },
            ],
            PluginNotFound => &[
                MetadataField { name: "pluginId", kind: Str },
                MetadataField { name: "pluginVersion", kind: Str },
            ],
            DependencyUnresolved => &[
                MetadataField { name: "dependency", kind: Str },
                MetadataField { name: "group", kind: Str },
                MetadataField { name: "artifact", kind: Str },
                MetadataField { name: "version", kind: Str },
                MetadataField { name: "configuration", kind: Str },
            ],
            BuildScriptError => &[
                MetadataField { name: "method", kind: Str },
                MetadataField { name: "detail", kind: Str },
            ],
            BuildTaskFailed => &[
                MetadataField { name: "task", kind: Str },
                MetadataField { name: "module", kind: Str },
            ],
            AttributeMissing => &[
                MetadataField { name: "attribute", kind: Str },
                MetadataField { name: "namespace", kind: Str },
                MetadataField { name: "phrasing", kind: Str },
            ],
            ResourceNotFound => &[
                MetadataField { name: "resourceId", kind: Str },
                MetadataField { name: "resourceType", kind: Str },
                MetadataField { name: "resourceName", kind: Str },
            ],
            ViewClassNotFound => &[
                MetadataField { name: "className", kind: Str },
                MetadataField { name: "simpleName", kind: Str },
            ],
            DuplicateViewId => &[
                MetadataField { name: "viewId", kind: Str },
            ],
            LayoutInflationFailed => &[
                MetadataField { name: "className", kind: Str },
                MetadataField { name: "simpleName", kind: Str },
                MetadataField { name: "layoutResource", kind: Str },
            ],
            ModifierOrder => &[
                MetadataField { name: "modifier", kind: Str },
                MetadataField { name: "anchor", kind: Str },
                MetadataField { name: "relation", kind: Str },
                MetadataField { name: "modifiers", kind: StringList },
            ],
            StateNotRemembered => &[
                MetadataField { name: "stateFactory", kind: Str },
            ],
            StateNotRetained => &[
                MetadataField { name: "trigger", kind: Str },
            ],
            StateNotSaveable => &[
                MetadataField { name: "valueType", kind: Str },
            ],
            EffectKeyMissing => &[
                MetadataField { name: "effect", kind: Str },
            ],
            SideEffectInComposition => &[
                MetadataField { name: "call", kind: Str },
            ],
            CompositionLocalMissing => &[
                MetadataField { name: "localName", kind: Str },
            ],
            ComposableContextRequired => &[],
            RecompositionExcessive => &[
                MetadataField { name: "composable", kind: Str },
                MetadataField { name: "recompositionCount", kind: Integer },
                MetadataField { name: "overThreshold", kind: Bool },
            ],
            Unknown => &[
                MetadataField { name: "exceptionClass", kind: Str },
            ],
        }
    }
}

impl std::fmt::Display for DiagnosisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Classified type.
    #[serde(rename = "type")]
    pub kind: DiagnosisType,

    /// Human-readable message (the matched signature, or a normalized form).
    pub message: String,

    /// File the diagnosis points at, or a sentinel.
    pub file_path: String,

    /// 1-indexed line, `0` when unknown.
    pub line: u32,

    /// Language of `file_path`.
    pub language: Language,

    /// Framework the error came from (e.g. "jetpack-compose").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Type-specific fields; see [`DiagnosisType::metadata_schema`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Diagnosis {
    pub fn domain(&self) -> Domain {
        self.kind.domain()
    }

    /// Whether `file_path` is a real path rather than a sentinel.
    pub fn has_known_file(&self) -> bool {
        !is_sentinel_path(&self.file_path)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn metadata_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    pub fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }

    pub fn metadata_list(&self, key: &str) -> Option<Vec<&str>> {
        self.metadata
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// Check every metadata entry against the type's schema.
    pub fn conforms_to_schema(&self) -> bool {
        let schema = self.kind.metadata_schema();
        self.metadata.iter().all(|(key, value)| {
            schema
                .iter()
                .any(|f| f.name == key.as_str() && f.kind.accepts(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Diagnosis {
        let mut metadata = Metadata::new();
        metadata.insert("permission".to_string(), json!("CAMERA"));
        metadata.insert("sensitive".to_string(), json!(true));
        Diagnosis {
            kind: DiagnosisType::PermissionMissing,
            message: "requires android.permission.CAMERA".to_string(),
            file_path: UNKNOWN_FILE.to_string(),
            line: 0,
            language: Language::Kotlin,
            framework: Some("android".to_string()),
            metadata,
        }
    }

    #[test]
    fn test_diagnosis_wire_shape() {
        let value = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(value["type"], "permission-missing");
        assert_eq!(value["filePath"], "unknown");
        assert_eq!(value["language"], "kotlin");
        assert_eq!(value["metadata"]["sensitive"], true);
    }

    #[test]
    fn test_empty_metadata_is_omitted() {
        let mut diag = sample();
        diag.metadata.clear();
        diag.framework = None;
        let value = serde_json::to_value(&diag).expect("serialize");
        assert!(value.get("metadata").is_none());
        assert!(value.get("framework").is_none());
    }

    #[test]
    fn test_every_type_maps_to_its_domain_and_name() {
        let kinds = [
            DiagnosisType::PermissionMissing,
            DiagnosisType::DependencyConflict,
            DiagnosisType::AttributeMissing,
            DiagnosisType::ModifierOrder,
            DiagnosisType::Unknown,
        ];
        let domains = [
            Domain::Manifest,
            Domain::Gradle,
            Domain::Layout,
            Domain::Compose,
            Domain::Generic,
        ];
        for (kind, domain) in kinds.iter().zip(domains) {
            assert_eq!(kind.domain(), domain);
            let json = serde_json::to_string(kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_schema_conformance() {
        let mut diag = sample();
        assert!(diag.conforms_to_schema());

        diag.metadata.insert("sensitive".to_string(), json!("yes"));
        assert!(!diag.conforms_to_schema());

        let mut diag = sample();
        diag.metadata.insert("bogus".to_string(), json!(1));
        assert!(!diag.conforms_to_schema());
    }

    #[test]
    fn test_sentinels_are_not_known_files() {
        let mut diag = sample();
        assert!(!diag.has_known_file());
        diag.file_path = UNKNOWN_XML_FILE.to_string();
        assert!(!diag.has_known_file());
        diag.file_path = "app/src/main/res/layout/main.xml".to_string();
        assert!(diag.has_known_file());
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path("MainActivity.kt"), Some(Language::Kotlin));
        assert_eq!(Language::from_path("Foo.java"), Some(Language::Java));
        assert_eq!(Language::from_path("res/layout/a.xml"), Some(Language::Xml));
        assert_eq!(Language::from_path("app/build.gradle.kts"), Some(Language::Gradle));
        assert_eq!(Language::from_path("build.gradle"), Some(Language::Gradle));
        assert_eq!(Language::from_path(UNKNOWN_XML_FILE), None);
        assert_eq!(Language::from_path("notes.txt"), None);
    }

    #[test]
    fn test_schemas_are_static_and_unique() {
        let kinds = [
            DiagnosisType::PermissionMissing,
            DiagnosisType::MergeConflict,
            DiagnosisType::DependencyUnresolved,
            DiagnosisType::ResourceNotFound,
            DiagnosisType::ModifierOrder,
            DiagnosisType::RecompositionExcessive,
            DiagnosisType::Unknown,
        ];
        for kind in kinds {
            let schema: &'static [MetadataField] = kind.metadata_schema();
            assert!(!schema.is_empty(), "{kind}");
            let mut names: Vec<&str> = schema.iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), schema.len(), "{kind}");
        }
        assert!(DiagnosisType::ComposableContextRequired
            .metadata_schema()
            .is_empty());
        assert_eq!(
            DiagnosisType::SdkVersionConflict.metadata_schema()[0],
            MetadataField { name: "appMinSdk", kind: FieldKind::Integer }
        );
    }

    #[test]
    fn test_domain_priority_order() {
        let mut sorted = Domain::ALL;
        sorted.sort_by_key(|d| d.priority());
        assert_eq!(sorted, Domain::ALL);
    }
}
