//! Static domain vocabularies and remediation templates.
//!
//! [`KnowledgeTables`] is built once (from the defaults or a TOML file) and
//! shared read-only by parsers and the remediation generator. Templates use
//! `{{name}}` placeholders filled from diagnosis metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnosis::DiagnosisType;
use crate::error::Result;

/// Permissions that need an explicit runtime grant (short names).
const SENSITIVE_PERMISSIONS: &[&str] = &[
    "ACCEPT_HANDOVER",
    "ACCESS_BACKGROUND_LOCATION",
    "ACCESS_COARSE_LOCATION",
    "ACCESS_FINE_LOCATION",
    "ACCESS_MEDIA_LOCATION",
    "ACTIVITY_RECOGNITION",
    "ADD_VOICEMAIL",
    "ANSWER_PHONE_CALLS",
    "BLUETOOTH_ADVERTISE",
    "BLUETOOTH_CONNECT",
    "BLUETOOTH_SCAN",
    "BODY_SENSORS",
    "BODY_SENSORS_BACKGROUND",
    "CALL_PHONE",
    "CAMERA",
    "GET_ACCOUNTS",
    "NEARBY_WIFI_DEVICES",
    "POST_NOTIFICATIONS",
    "PROCESS_OUTGOING_CALLS",
    "READ_CALENDAR",
    "READ_CALL_LOG",
    "READ_CONTACTS",
    "READ_EXTERNAL_STORAGE",
    "READ_MEDIA_AUDIO",
    "READ_MEDIA_IMAGES",
    "READ_MEDIA_VIDEO",
    "READ_MEDIA_VISUAL_USER_SELECTED",
    "READ_PHONE_NUMBERS",
    "READ_PHONE_STATE",
    "READ_SMS",
    "RECEIVE_MMS",
    "RECEIVE_SMS",
    "RECEIVE_WAP_PUSH",
    "RECORD_AUDIO",
    "SEND_SMS",
    "USE_SIP",
    "UWB_RANGING",
    "WRITE_CALENDAR",
    "WRITE_CALL_LOG",
    "WRITE_CONTACTS",
    "WRITE_EXTERNAL_STORAGE",
];

/// Install-time platform permissions (short names). Together with
/// [`SENSITIVE_PERMISSIONS`] this is the vocabulary a bare permission name in
/// a message must come from.
const NORMAL_PERMISSIONS: &[&str] = &[
    "ACCESS_LOCATION_EXTRA_COMMANDS",
    "ACCESS_NETWORK_STATE",
    "ACCESS_NOTIFICATION_POLICY",
    "ACCESS_WIFI_STATE",
    "BLUETOOTH",
    "BLUETOOTH_ADMIN",
    "BROADCAST_STICKY",
    "CALL_COMPANION_APP",
    "CHANGE_NETWORK_STATE",
    "CHANGE_WIFI_MULTICAST_STATE",
    "CHANGE_WIFI_STATE",
    "CREDENTIAL_MANAGER_QUERY_CANDIDATE_CREDENTIALS",
    "CREDENTIAL_MANAGER_SET_ORIGIN",
    "DETECT_SCREEN_CAPTURE",
    "DISABLE_KEYGUARD",
    "EXPAND_STATUS_BAR",
    "FOREGROUND_SERVICE",
    "FOREGROUND_SERVICE_CAMERA",
    "FOREGROUND_SERVICE_CONNECTED_DEVICE",
    "FOREGROUND_SERVICE_DATA_SYNC",
    "FOREGROUND_SERVICE_HEALTH",
    "FOREGROUND_SERVICE_LOCATION",
    "FOREGROUND_SERVICE_MEDIA_PLAYBACK",
    "FOREGROUND_SERVICE_MEDIA_PROJECTION",
    "FOREGROUND_SERVICE_MICROPHONE",
    "FOREGROUND_SERVICE_PHONE_CALL",
    "FOREGROUND_SERVICE_REMOTE_MESSAGING",
    "FOREGROUND_SERVICE_SPECIAL_USE",
    "FOREGROUND_SERVICE_SYSTEM_EXEMPTED",
    "GET_PACKAGE_SIZE",
    "HIDE_OVERLAY_WINDOWS",
    "HIGH_SAMPLING_RATE_SENSORS",
    "INSTALL_SHORTCUT",
    "INTERNET",
    "KILL_BACKGROUND_PROCESSES",
    "MANAGE_OWN_CALLS",
    "MODIFY_AUDIO_SETTINGS",
    "NFC",
    "NFC_PREFERRED_PAYMENT_INFO",
    "NFC_TRANSACTION_EVENT",
    "QUERY_ALL_PACKAGES",
    "READ_BASIC_PHONE_STATE",
    "READ_SYNC_SETTINGS",
    "READ_SYNC_STATS",
    "RECEIVE_BOOT_COMPLETED",
    "REORDER_TASKS",
    "REQUEST_COMPANION_PROFILE_GLASSES",
    "REQUEST_COMPANION_PROFILE_WATCH",
    "REQUEST_COMPANION_RUN_IN_BACKGROUND",
    "REQUEST_COMPANION_USE_DATA_IN_BACKGROUND",
    "REQUEST_DELETE_PACKAGES",
    "REQUEST_IGNORE_BATTERY_OPTIMIZATIONS",
    "REQUEST_INSTALL_PACKAGES",
    "REQUEST_PASSWORD_COMPLEXITY",
    "RUN_USER_INITIATED_JOBS",
    "SCHEDULE_EXACT_ALARM",
    "SET_ALARM",
    "SET_WALLPAPER",
    "SET_WALLPAPER_HINTS",
    "TRANSMIT_IR",
    "UPDATE_PACKAGES_WITHOUT_USER_ACTION",
    "USE_BIOMETRIC",
    "USE_EXACT_ALARM",
    "USE_FINGERPRINT",
    "USE_FULL_SCREEN_INTENT",
    "VIBRATE",
    "WAKE_LOCK",
    "WRITE_SYNC_SETTINGS",
];

/// Namespaces whose stack frames are never user code.
const PLATFORM_PREFIXES: &[&str] = &[
    "android.",
    "androidx.",
    "com.android.",
    "com.google.android.",
    "dalvik.",
    "java.",
    "javax.",
    "jdk.",
    "kotlin.",
    "kotlinx.",
    "libcore.",
    "sun.",
];

const COMPOSE_MODIFIERS: &[&str] = &[
    "align",
    "alpha",
    "animateContentSize",
    "aspectRatio",
    "background",
    "border",
    "clickable",
    "clip",
    "combinedClickable",
    "defaultMinSize",
    "drawBehind",
    "fillMaxHeight",
    "fillMaxSize",
    "fillMaxWidth",
    "focusable",
    "graphicsLayer",
    "height",
    "horizontalScroll",
    "imePadding",
    "navigationBarsPadding",
    "offset",
    "padding",
    "pointerInput",
    "requiredSize",
    "selectable",
    "semantics",
    "shadow",
    "size",
    "statusBarsPadding",
    "systemBarsPadding",
    "testTag",
    "toggleable",
    "verticalScroll",
    "weight",
    "width",
    "wrapContentSize",
    "zIndex",
];

/// A known ordering convention between two Compose modifiers.
///
/// Modifiers wrap everything to their right, so `first` must appear earlier
/// in the chain than `then`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModifierConvention {
    pub first: String,
    pub then: String,
    pub reason: String,
}

fn convention(first: &str, then: &str, reason: &str) -> ModifierConvention {
    ModifierConvention {
        first: first.to_string(),
        then: then.to_string(),
        reason: reason.to_string(),
    }
}

fn default_conventions() -> Vec<ModifierConvention> {
    vec![
        convention(
            "clip",
            "background",
            "clip first so the background is drawn inside the clipped shape",
        ),
        convention(
            "shadow",
            "clip",
            "a shadow applied after clip is clipped away",
        ),
        convention(
            "clickable",
            "padding",
            "the ripple and touch target only cover what follows the click modifier",
        ),
        convention(
            "border",
            "padding",
            "padding after the border keeps content from touching the border",
        ),
        convention(
            "size",
            "padding",
            "padding after size shrinks the content instead of growing the bounds",
        ),
        convention(
            "verticalScroll",
            "padding",
            "padding after the scroll modifier scrolls with the content",
        ),
    ]
}

/// Manifest declaration templates for the three component kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComponentTemplates {
    pub activity: String,
    pub service: String,
    pub receiver: String,
}

impl Default for ComponentTemplates {
    fn default() -> Self {
        Self {
            activity: concat!(
                "<activity\n",
                "    android:name=\"{{componentName}}\"\n",
                "    android:exported=\"false\" />"
            )
            .to_string(),
            service: concat!(
                "<service\n",
                "    android:name=\"{{componentName}}\"\n",
                "    android:exported=\"false\" />"
            )
            .to_string(),
            receiver: concat!(
                "<receiver\n",
                "    android:name=\"{{componentName}}\"\n",
                "    android:exported=\"false\" />"
            )
            .to_string(),
        }
    }
}

/// Manifest merger conflict resolution templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConflictTemplates {
    pub attribute_override: String,
    /// Removal of a duplicated element the merger named.
    pub element_removal: String,
    /// Removal when the merger report carries no element name.
    pub element_removal_unnamed: String,
    /// `tools:overrideLibrary` for a library whose minSdk is higher.
    pub library_override: String,
    pub namespace_setup: String,
}

impl Default for ConflictTemplates {
    fn default() -> Self {
        Self {
            attribute_override: concat!(
                "<!-- on the element that declares android:{{conflictAttribute}} -->\n",
                "tools:replace=\"android:{{conflictAttribute}}\""
            )
            .to_string(),
            element_removal: concat!(
                "<{{conflictElement}}\n",
                "    android:name=\"{{elementName}}\"\n",
                "    tools:node=\"remove\" />"
            )
            .to_string(),
            element_removal_unnamed: concat!(
                "<{{conflictElement}}\n",
                "    android:name=\"<name of the duplicated {{conflictElement}}>\"\n",
                "    tools:node=\"remove\" />"
            )
            .to_string(),
            library_override: concat!(
                "<manifest xmlns:tools=\"http://schemas.android.com/tools\">\n",
                "    <uses-sdk tools:overrideLibrary=\"{{libraryPackage}}\" />"
            )
            .to_string(),
            namespace_setup: concat!(
                "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n",
                "    xmlns:tools=\"http://schemas.android.com/tools\">"
            )
            .to_string(),
        }
    }
}

/// Permission declaration and runtime-request templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PermissionTemplates {
    pub declaration: String,
    pub runtime_check: String,
}

impl Default for PermissionTemplates {
    fn default() -> Self {
        Self {
            declaration: "<uses-permission android:name=\"{{fullPermission}}\" />".to_string(),
            runtime_check: concat!(
                "private val requestPermission =\n",
                "    registerForActivityResult(ActivityResultContracts.RequestPermission()) { granted ->\n",
                "        if (granted) {\n",
                "            // continue with the feature that needs {{permission}}\n",
                "        }\n",
                "    }\n",
                "\n",
                "when {\n",
                "    ContextCompat.checkSelfPermission(this, Manifest.permission.{{permission}}) ==\n",
                "        PackageManager.PERMISSION_GRANTED -> {\n",
                "        // already granted\n",
                "    }\n",
                "    shouldShowRequestPermissionRationale(Manifest.permission.{{permission}}) -> {\n",
                "        // explain why {{permission}} is needed, then request it\n",
                "    }\n",
                "    else -> requestPermission.launch(Manifest.permission.{{permission}})\n",
                "}"
            )
            .to_string(),
        }
    }
}

fn default_advice() -> BTreeMap<String, String> {
    use DiagnosisType::*;
    let entries: &[(DiagnosisType, &str)] = &[
        (
            PermissionMissing,
            "Declare {{fullPermission}} in AndroidManifest.xml before calling the API that needs it.",
        ),
        (
            ComponentUndeclared,
            "Register {{componentName}} inside the <application> element of AndroidManifest.xml.",
        ),
        (
            MergeConflict,
            "The manifest merger found conflicting declarations; mark the app-level value with a tools: merge rule.",
        ),
        (
            SdkVersionConflict,
            "Raise minSdk to at least {{libraryMinSdk}} or add tools:overrideLibrary for {{library}} and guard its calls.",
        ),
        (
            ExportedMissing,
            "Apps targeting Android 12+ must set android:exported on {{componentName}} because it has an intent filter.",
        ),
        (
            DependencyConflict,
            "Two dependencies ship {{className}}; exclude one module or align versions with a BOM.",
        ),
        (
            VersionConflict,
            "Align {{dependency}} to a single version with a platform BOM or a resolutionStrategy force.",
        ),
        (
            CompileSdkTooLow,
            "Raise compileSdk to {{requiredCompileSdk}} in the module build file.",
        ),
        (
            JvmTargetMismatch,
            "Use the same JVM target for Java and Kotlin, e.g. kotlin { jvmToolchain(17) }.",
        ),
        (
            PluginNotFound,
            "Add the repository that hosts {{pluginId}} to pluginManagement and check the plugin version.",
        ),
        (
            DependencyUnresolved,
            "Check the coordinates of {{dependency}} and that its repository is declared in settings.gradle.",
        ),
        (
            BuildScriptError,
            "Fix the build script at the reported line; check plugin application order and DSL syntax.",
        ),
        (
            BuildTaskFailed,
            "Task {{task}} failed; the first error above the task summary is usually the root cause.",
        ),
        (
            AttributeMissing,
            "Add the required {{attribute}} attribute to the view element in the layout file.",
        ),
        (
            ResourceNotFound,
            "The referenced resource is missing for this configuration; add it to the default res/ directory.",
        ),
        (
            ViewClassNotFound,
            "Use the fully qualified class name of {{simpleName}} in the layout and keep it in R8 rules.",
        ),
        (
            DuplicateViewId,
            "Give each view a unique id; {{viewId}} is declared twice in this layout.",
        ),
        (
            LayoutInflationFailed,
            "Inflation failed; check the element at the reported line and its required attributes.",
        ),
        (
            ModifierOrder,
            "Apply Modifier.{{modifier}} {{relation}} Modifier.{{anchor}} in the modifier chain.",
        ),
        (
            StateNotRemembered,
            "Wrap the state in remember { } so it survives recomposition.",
        ),
        (
            StateNotRetained,
            "Use rememberSaveable or a ViewModel so the state survives {{trigger}}.",
        ),
        (
            StateNotSaveable,
            "{{valueType}} cannot be put in a Bundle; make it Parcelable or pass a custom Saver.",
        ),
        (
            EffectKeyMissing,
            "Pass the values the {{effect}} depends on as keys, or Unit to run it once.",
        ),
        (
            SideEffectInComposition,
            "Move the {{call}} call into LaunchedEffect or rememberCoroutineScope().",
        ),
        (
            CompositionLocalMissing,
            "Provide {{localName}} with CompositionLocalProvider above this composable.",
        ),
        (
            ComposableContextRequired,
            "Call composable functions only from other @Composable functions.",
        ),
        (
            RecompositionExcessive,
            "Hoist frequently changing state, use stable parameters and derivedStateOf to cut recompositions.",
        ),
    ];
    entries
        .iter()
        .map(|(kind, text)| (kind.as_str().to_string(), (*text).to_string()))
        .collect()
}

/// Immutable domain data shared by parsers and remediation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnowledgeTables {
    /// Short permission names that need a runtime grant.
    pub sensitive_permissions: BTreeSet<String>,
    /// Other platform permissions recognised by short name.
    pub normal_permissions: BTreeSet<String>,
    /// Stack frame namespaces skipped when looking for user code.
    pub platform_prefixes: Vec<String>,
    /// Canonical Compose modifier names.
    pub compose_modifiers: Vec<String>,
    pub modifier_conventions: Vec<ModifierConvention>,
    /// Recomposition count above which a composable is flagged.
    pub recomposition_threshold: u64,
    pub component_templates: ComponentTemplates,
    pub conflict_templates: ConflictTemplates,
    pub permission_templates: PermissionTemplates,
    /// Advice text keyed by diagnosis type name.
    pub advice: BTreeMap<String, String>,
}

impl Default for KnowledgeTables {
    fn default() -> Self {
        Self {
            sensitive_permissions: SENSITIVE_PERMISSIONS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            normal_permissions: NORMAL_PERMISSIONS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            platform_prefixes: PLATFORM_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            compose_modifiers: COMPOSE_MODIFIERS.iter().map(|m| (*m).to_string()).collect(),
            modifier_conventions: default_conventions(),
            recomposition_threshold: 10,
            component_templates: ComponentTemplates::default(),
            conflict_templates: ConflictTemplates::default(),
            permission_templates: PermissionTemplates::default(),
            advice: default_advice(),
        }
    }
}

impl KnowledgeTables {
    /// Parse tables from TOML. Missing sections keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load tables from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Whether a short permission name (e.g. `CAMERA`) needs a runtime grant.
    pub fn is_sensitive_permission(&self, short_name: &str) -> bool {
        self.sensitive_permissions
            .contains(&short_name.to_ascii_uppercase())
    }

    /// Whether a short name is a platform permission at all, in any case.
    pub fn is_known_permission(&self, short_name: &str) -> bool {
        let upper = short_name.to_ascii_uppercase();
        self.sensitive_permissions.contains(&upper) || self.normal_permissions.contains(&upper)
    }

    /// Whether a fully qualified frame symbol belongs to the platform.
    pub fn is_platform_symbol(&self, symbol: &str) -> bool {
        self.platform_prefixes
            .iter()
            .any(|prefix| symbol.starts_with(prefix.as_str()))
    }

    /// Canonical spelling of a modifier name, matched case-insensitively.
    /// Unknown modifiers are lowercased.
    pub fn canonical_modifier(&self, name: &str) -> String {
        self.compose_modifiers
            .iter()
            .find(|m| m.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_ascii_lowercase())
    }

    /// Convention covering both modifiers, in either order.
    pub fn modifier_convention(&self, a: &str, b: &str) -> Option<&ModifierConvention> {
        self.modifier_conventions.iter().find(|c| {
            (c.first == a && c.then == b) || (c.first == b && c.then == a)
        })
    }

    /// Declaration template for a component kind (`activity`, `service`, `receiver`).
    pub fn component_template(&self, kind: &str) -> Option<&str> {
        match kind {
            "activity" => Some(&self.component_templates.activity),
            "service" => Some(&self.component_templates.service),
            "receiver" => Some(&self.component_templates.receiver),
            _ => None,
        }
    }

    pub fn advice_for(&self, kind: DiagnosisType) -> Option<&str> {
        self.advice.get(kind.as_str()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_permission_lookup() {
        let tables = KnowledgeTables::default();
        assert!(tables.is_sensitive_permission("CAMERA"));
        assert!(tables.is_sensitive_permission("camera"));
        assert!(!tables.is_sensitive_permission("INTERNET"));
        assert!(!tables.is_sensitive_permission("ACCESS_NETWORK_STATE"));
    }

    #[test]
    fn test_known_permission_vocabulary() {
        let tables = KnowledgeTables::default();
        assert!(tables.is_known_permission("INTERNET"));
        assert!(tables.is_known_permission("internet"));
        assert!(tables.is_known_permission("Camera"));
        assert!(!tables.is_known_permission("JAVA_HOME"));
        assert!(!tables.is_known_permission("ANDROID_HOME"));
        assert!(tables.sensitive_permissions.is_disjoint(&tables.normal_permissions));
    }

    #[test]
    fn test_platform_symbols() {
        let tables = KnowledgeTables::default();
        assert!(tables.is_platform_symbol("android.app.Activity.performCreate"));
        assert!(tables.is_platform_symbol("androidx.compose.runtime.Recomposer.run"));
        assert!(!tables.is_platform_symbol("com.example.app.MainActivity.onCreate"));
        // prefix match is namespace based, not substring based
        assert!(!tables.is_platform_symbol("com.example.android.Foo.bar"));
    }

    #[test]
    fn test_canonical_modifier_restores_case() {
        let tables = KnowledgeTables::default();
        assert_eq!(tables.canonical_modifier("FILLMAXWIDTH"), "fillMaxWidth");
        assert_eq!(tables.canonical_modifier("padding"), "padding");
        assert_eq!(tables.canonical_modifier("MyCustom"), "mycustom");
    }

    #[test]
    fn test_modifier_convention_is_symmetric() {
        let tables = KnowledgeTables::default();
        let a = tables.modifier_convention("clickable", "padding");
        let b = tables.modifier_convention("padding", "clickable");
        assert!(a.is_some());
        assert_eq!(a, b);
        assert!(tables.modifier_convention("alpha", "zIndex").is_none());
    }

    #[test]
    fn test_component_templates_cover_three_kinds() {
        let tables = KnowledgeTables::default();
        for kind in ["activity", "service", "receiver"] {
            let template = tables.component_template(kind).expect("template");
            assert!(template.contains("{{componentName}}"));
            assert!(template.starts_with(&format!("<{kind}")));
        }
        assert!(tables.component_template("provider").is_none());
    }

    #[test]
    fn test_every_non_generic_type_has_advice() {
        let tables = KnowledgeTables::default();
        assert!(tables.advice_for(DiagnosisType::ModifierOrder).is_some());
        assert!(tables.advice_for(DiagnosisType::BuildTaskFailed).is_some());
        assert!(tables.advice_for(DiagnosisType::Unknown).is_none());
        assert_eq!(tables.advice.len(), 27);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let tables = KnowledgeTables::from_toml_str(
            r#"
sensitive_permissions = ["INTERNET"]

[conflict_templates]
namespace_setup = "<manifest xmlns:tools=\"http://schemas.android.com/tools\">"
"#,
        )
        .expect("parse");
        assert!(tables.is_sensitive_permission("INTERNET"));
        assert!(!tables.is_sensitive_permission("CAMERA"));
        assert!(tables
            .conflict_templates
            .attribute_override
            .contains("tools:replace"));
        assert_eq!(tables.recomposition_threshold, 10);
        assert_eq!(tables.platform_prefixes, KnowledgeTables::default().platform_prefixes);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(KnowledgeTables::from_toml_str("recomposition_threshold = \"many\"").is_err());
    }
}
