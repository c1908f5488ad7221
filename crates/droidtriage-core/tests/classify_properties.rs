//! Behavioural properties of `Dispatcher::classify_any`.

use droidtriage_core::{Diagnosis, DiagnosisType, Dispatcher, Domain, Language};
use serde_json::{json, Value};

fn classify(text: &str) -> Option<Diagnosis> {
    Dispatcher::with_defaults()
        .expect("dispatcher")
        .classify_any(text)
}

const SAMPLES: &[&str] = &[
    "java.lang.SecurityException: Permission Denial: requires android.permission.CAMERA",
    "Binary XML file line #42: Error inflating class Foo",
    "You must supply a layout_width attribute.\nBinary XML file line #45",
    "Modifier.clickable must come after Modifier.padding",
    "Execution failed for task ':app:compileDebugKotlin'.",
    "Plugin [id: 'org.jetbrains.kotlin.android', version: '9.9'] was not found",
    "java.lang.NullPointerException\n\tat com.example.Main.run(Main.kt:3)",
];

#[test]
fn classify_is_idempotent() {
    let dispatcher = Dispatcher::with_defaults().expect("dispatcher");
    for text in SAMPLES {
        let first = dispatcher.classify_any(text);
        let second = dispatcher.classify_any(text);
        assert!(first.is_some(), "{text}");
        assert_eq!(first, second, "{text}");
    }
}

#[test]
fn attribute_missing_beats_inflation_failure() {
    let diag = classify("You must supply a layout_width attribute\nBinary XML file line #45")
        .expect("match");
    assert_eq!(diag.kind, DiagnosisType::AttributeMissing);
    assert_ne!(diag.kind, DiagnosisType::LayoutInflationFailed);
    assert_eq!(diag.line, 45);
}

#[test]
fn binary_xml_line_without_path_uses_xml_sentinel() {
    let diag = classify("Binary XML file line #42: Error inflating class Foo").expect("match");
    assert_eq!(diag.kind, DiagnosisType::LayoutInflationFailed);
    assert_eq!(diag.file_path, "unknown.xml");
    assert_eq!(diag.line, 42);
    assert!(!diag.has_known_file());
}

#[test]
fn sensitive_permission_flag() {
    let camera = classify("requires android.permission.CAMERA").expect("match");
    assert_eq!(camera.kind, DiagnosisType::PermissionMissing);
    assert_eq!(camera.metadata_bool("sensitive"), Some(true));

    let internet = classify("requires INTERNET").expect("match");
    assert_eq!(internet.kind, DiagnosisType::PermissionMissing);
    assert_eq!(internet.metadata_bool("sensitive"), Some(false));
    assert_eq!(
        internet.metadata_str("fullPermission"),
        Some("android.permission.INTERNET")
    );
}

#[test]
fn blank_and_non_string_input_yield_none() {
    let dispatcher = Dispatcher::with_defaults().expect("dispatcher");
    assert!(dispatcher.classify_any("").is_none());
    assert!(dispatcher.classify_any(" \n ").is_none());
    assert!(dispatcher.classify_value(&Value::Null).is_none());
    assert!(dispatcher.classify_value(&json!(["requires CAMERA"])).is_none());
    assert!(dispatcher.classify_value(&json!(true)).is_none());
}

#[test]
fn permission_names_match_in_any_case() {
    let upper = classify("REQUIRES INTERNET").expect("match");
    let lower = classify("requires internet").expect("match");
    assert_eq!(upper, lower);
    assert_eq!(lower.kind, DiagnosisType::PermissionMissing);
    assert_eq!(lower.metadata_str("permission"), Some("INTERNET"));
}

#[test]
fn build_environment_names_are_not_permissions() {
    let diag = classify(
        "Execution failed for task ':app:compileDebugKotlin'.\n> This build requires JAVA_HOME to point at JDK 17",
    )
    .expect("match");
    assert_eq!(diag.kind, DiagnosisType::BuildTaskFailed);
    assert_eq!(diag.domain(), Domain::Gradle);
    assert_eq!(diag.metadata_str("task"), Some(":app:compileDebugKotlin"));
    assert!(diag.metadata_str("fullPermission").is_none());
}

#[test]
fn modifier_order_is_case_insensitive() {
    let upper = classify("MODIFIER.CLICKABLE must come after MODIFIER.PADDING").expect("match");
    let lower = classify("modifier.clickable must come after modifier.padding").expect("match");
    assert_eq!(upper, lower);
    assert_eq!(upper.kind, DiagnosisType::ModifierOrder);
    assert_eq!(upper.domain(), Domain::Compose);
}

#[test]
fn oversized_input_is_bounded_not_rejected() {
    let mut text = "requires android.permission.RECORD_AUDIO\n".to_string();
    text.push_str(&"noise ".repeat(40_000));
    let diag = classify(&text).expect("match");
    assert_eq!(diag.metadata_str("permission"), Some("RECORD_AUDIO"));

    let mut hidden = "noise ".repeat(20_000);
    hidden.push_str("requires android.permission.RECORD_AUDIO");
    assert!(classify(&hidden).is_none());
}

#[test]
fn every_diagnosis_conforms_to_its_schema() {
    for text in SAMPLES {
        let diag = classify(text).expect("match");
        assert!(diag.conforms_to_schema(), "{text}: {:?}", diag.metadata);
        assert!(!diag.file_path.is_empty());
    }
}

#[test]
fn wire_shape_uses_camel_case_and_type_tag() {
    let diag = classify("java.lang.NullPointerException\n\tat com.example.Main.run(Main.kt:3)")
        .expect("match");
    let value = serde_json::to_value(&diag).expect("serialize");
    assert_eq!(value["type"], "unknown");
    assert_eq!(value["filePath"], "Main.kt");
    assert_eq!(value["line"], 3);
    assert_eq!(value["language"], "kotlin");
    assert_eq!(diag.language, Language::Kotlin);

    let back: Diagnosis = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, diag);
}
