//! Permission, component declaration and manifest merger rules.

use crate::diagnosis::{DiagnosisType, Domain, Language};
use crate::error::Result;
use crate::extract::{find_group, normalize_permission, simple_name, MetadataBuilder};
use crate::rules::{DomainRuleSet, Extraction, MatchRule, RuleMatch};

/// A qualified `*.permission.NAME`, or a bare name that [`known_permission`]
/// checks against the platform vocabulary.
const PERMISSION: &str = r"(?P<perm>(?:\w+\.)+permission\.[a-z_][a-z0-9_]*|[a-z][a-z0-9_]{3,})";

pub fn rule_set() -> Result<DomainRuleSet> {
    let rules = vec![
        MatchRule::new(
            "manifest.attribute_conflict",
            10,
            DiagnosisType::MergeConflict,
            r"Attribute\s+(?P<element>[^\s@]+)@(?P<attr>[\w:.-]+)\s+value=\((?P<local>[^)]*)\)",
            attribute_conflict,
        )?
        .with_secondary(
            r"is also present at\s+\[(?P<lib>[^\]]+)\][^\n]*?value=\((?P<value>[^)]*)\)",
        )?,
        MatchRule::new(
            "manifest.element_conflict",
            20,
            DiagnosisType::MergeConflict,
            r"Element\s+(?P<element>[\w-]+)(?:#(?P<name>[\w.$]+))?\s+at\s+\S+\s+duplicated with element declared at",
            element_conflict,
        )?,
        MatchRule::new(
            "manifest.min_sdk",
            30,
            DiagnosisType::SdkVersionConflict,
            r"uses-sdk:minSdkVersion\s+(?P<app>\d+)\s+cannot be smaller than version\s+(?P<lib>\d+)\s+declared in library\s+\[?(?P<library>[^\]\s]+)",
            min_sdk,
        )?
        .with_secondary(r#"tools:overrideLibrary="([\w.]+)""#)?,
        MatchRule::new(
            "manifest.merger_failed",
            40,
            DiagnosisType::MergeConflict,
            r"Manifest merger failed",
            unclassified_conflict,
        )?,
        MatchRule::new(
            "manifest.exported_required",
            50,
            DiagnosisType::ExportedMissing,
            r"android:exported\s+needs to be explicitly specified for element\s+<(?P<kind>[\w-]+)#(?P<name>[\w.$]+)>",
            exported_required,
        )?,
        MatchRule::new(
            "manifest.activity_not_found",
            60,
            DiagnosisType::ComponentUndeclared,
            r"Unable to find explicit activity class\s+\{(?P<pkg>[\w.]+)/(?P<cls>[\w.$]+)\}",
            activity_not_found,
        )?,
        MatchRule::new(
            "manifest.service_not_found",
            61,
            DiagnosisType::ComponentUndeclared,
            r"Unable to start service Intent\s+\{[^}]*?cmp=(?P<pkg>[\w.]+)/(?P<cls>[\w.$]+)[^}]*\}[^\n]*?not found",
            service_not_found,
        )?,
        MatchRule::new(
            "manifest.not_registered",
            62,
            DiagnosisType::ComponentUndeclared,
            r"The\s+`?<?(?P<kind>activity|service|receiver|provider)>?`?\s+`?(?P<cls>[\w.$]+)`?\s+is not registered in the manifest",
            not_registered,
        )?,
        MatchRule::new(
            "manifest.permission_required",
            70,
            DiagnosisType::PermissionMissing,
            &format!(
                r"(?:requires|required by\s+[\w.$]+:?|has not been granted|nor current process has)\s+{PERMISSION}"
            ),
            permission,
        )?
        .with_guard(known_permission),
        MatchRule::new(
            "manifest.security_exception",
            80,
            DiagnosisType::PermissionMissing,
            r"SecurityException\b[^\n]*?(?P<perm>(?:\w+\.)+permission\.[a-z_][a-z0-9_]*)",
            permission,
        )?,
    ];
    DomainRuleSet::new(Domain::Manifest, Language::Xml, Some("android"), rules)
}

fn attribute_conflict(m: &RuleMatch<'_>) -> Extraction {
    let element = m.named("element").unwrap_or_default();
    let (element, element_name) = match element.split_once('#') {
        Some((tag, name)) => (tag, Some(name)),
        None => (element, None),
    };
    let attribute = m
        .named("attr")
        .map(|a| a.trim_start_matches("android:"));
    let library = m.secondary(0).and_then(|re| re.captures(m.text));
    let library_name = library
        .as_ref()
        .and_then(|c| c.name("lib"))
        .map(|g| g.as_str());
    let library_value = library
        .as_ref()
        .and_then(|c| c.name("value"))
        .map(|g| g.as_str());
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("conflictType", "attribute")
            .str("conflictElement", element)
            .opt_str("elementName", element_name)
            .opt_str("conflictAttribute", attribute)
            .opt_str("localValue", m.named("local"))
            .opt_str("library", library_name)
            .opt_str("libraryValue", library_value)
            .build(),
    )
}

fn element_conflict(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("conflictType", "element")
            .opt_str("conflictElement", m.named("element"))
            .opt_str("elementName", m.named("name"))
            .build(),
    )
}

fn min_sdk(m: &RuleMatch<'_>) -> Extraction {
    let package = m.secondary(0).and_then(|re| find_group(re, m.text, 1));
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("conflictType", "min-sdk")
            .opt_int("appMinSdk", m.named("app").and_then(|v| v.parse().ok()))
            .opt_int("libraryMinSdk", m.named("lib").and_then(|v| v.parse().ok()))
            .opt_str("library", m.named("library"))
            .opt_str("libraryPackage", package)
            .build(),
    )
}

fn unclassified_conflict(_: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("conflictType", "unclassified")
            .build(),
    )
}

fn exported_required(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("componentKind", m.named("kind").map(str::to_ascii_lowercase).as_deref())
            .opt_str("componentName", m.named("name"))
            .build(),
    )
}

/// `pkg/.Foo` names a class relative to the package.
fn qualify(pkg: Option<&str>, cls: &str) -> String {
    match (pkg, cls.strip_prefix('.')) {
        (Some(pkg), Some(rest)) => format!("{pkg}.{rest}"),
        _ => cls.to_string(),
    }
}

fn component(kind: &str, pkg: Option<&str>, cls: Option<&str>) -> Extraction {
    let name = cls.map(|c| qualify(pkg, c));
    let package = pkg.or_else(|| {
        name.as_deref()
            .and_then(|n| n.rsplit_once('.'))
            .map(|(p, _)| p)
    });
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("componentKind", kind)
            .opt_str("componentName", name.as_deref())
            .opt_str("packageName", package)
            .opt_str("simpleName", name.as_deref().map(simple_name))
            .build(),
    )
}

fn activity_not_found(m: &RuleMatch<'_>) -> Extraction {
    component("activity", m.named("pkg"), m.named("cls"))
}

fn service_not_found(m: &RuleMatch<'_>) -> Extraction {
    component("service", m.named("pkg"), m.named("cls"))
}

fn not_registered(m: &RuleMatch<'_>) -> Extraction {
    let kind = m
        .named("kind")
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    component(&kind, None, m.named("cls"))
}

/// Bare names such as `JAVA_HOME` in "requires JAVA_HOME" are not permissions.
fn known_permission(m: &RuleMatch<'_>) -> bool {
    match m.named("perm") {
        Some(raw) if raw.contains('.') => true,
        Some(raw) => m.knowledge.is_known_permission(raw),
        None => false,
    }
}

fn permission(m: &RuleMatch<'_>) -> Extraction {
    let Some(raw) = m.named("perm") else {
        return Extraction::default();
    };
    let (short, full) = normalize_permission(raw);
    let sensitive = m.knowledge.is_sensitive_permission(&short);
    Extraction::with_metadata(
        MetadataBuilder::new()
            .str("permission", short)
            .str("fullPermission", full)
            .bool("sensitive", sensitive)
            .build(),
    )
}
