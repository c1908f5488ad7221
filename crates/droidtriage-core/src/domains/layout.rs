//! View inflation, layout attribute and resource rules.
//!
//! Every rule carries the same three secondary patterns so extractors can
//! recover the inflater's `Binary XML file line #N`, an explicit layout path
//! and the `pkg:layout/name` resource reference.

use crate::diagnosis::{DiagnosisType, Domain, Language, UNKNOWN_XML_FILE};
use crate::error::Result;
use crate::extract::{find_group, parse_line, simple_name, MetadataBuilder, SourceLocation};
use crate::rules::{DomainRuleSet, Extraction, Extractor, MatchRule, RuleMatch};

const BINARY_XML_LINE: usize = 0;
const XML_FILE: usize = 1;
const LAYOUT_RESOURCE: usize = 2;

fn layout_rule(
    id: &'static str,
    priority: u16,
    kind: DiagnosisType,
    trigger: &str,
    extract: Extractor,
) -> Result<MatchRule> {
    MatchRule::new(id, priority, kind, trigger, extract)?
        .with_secondary(r"Binary XML file line #(\d+)")?
        .with_secondary(r"([\w./\\-]*\w\.xml)(?::(\d+))?")?
        .with_secondary(r"\b[\w.]+:layout/(\w+)")
}

pub fn rule_set() -> Result<DomainRuleSet> {
    let rules = vec![
        layout_rule(
            "layout.must_supply",
            10,
            DiagnosisType::AttributeMissing,
            r"You must supply (?:a|an)\s+(?P<attr>[\w:]+)\s+attribute",
            must_supply,
        )?,
        layout_rule(
            "layout.attribute_not_specified",
            20,
            DiagnosisType::AttributeMissing,
            r#"attribute\s+['"]?(?P<attr>[\w:]+)['"]?\s+(?:is\s+)?not specified|required\s+['"]?(?P<required>[\w:]+)['"]?\s+attribute\s+is\s+missing"#,
            not_specified,
        )?,
        layout_rule(
            "layout.resource_id_not_found",
            30,
            DiagnosisType::ResourceNotFound,
            r"Resources\$NotFoundException:[^\n]*?resource ID #(?P<id>0x[0-9a-f]+)",
            resource_by_id,
        )?,
        layout_rule(
            "layout.resource_name_not_found",
            31,
            DiagnosisType::ResourceNotFound,
            r"resource\s+@?(?:[\w.]+:)?(?P<type>[\w-]+)/(?P<name>\w+)\s+(?:\(aka [^)]*\)\s+)?not found",
            resource_by_name,
        )?,
        layout_rule(
            "layout.view_class_not_found",
            40,
            DiagnosisType::ViewClassNotFound,
            r#"ClassNotFoundException:\s*Didn't find class\s+"(?P<cls>[\w.$]+)""#,
            view_class_not_found,
        )?,
        layout_rule(
            "layout.duplicate_id",
            45,
            DiagnosisType::DuplicateViewId,
            r"Duplicate id\s+@\+?id/(?P<id>\w+)",
            duplicate_id,
        )?,
        layout_rule(
            "layout.inflation_failed",
            50,
            DiagnosisType::LayoutInflationFailed,
            r"Error inflating class\s+(?P<cls>[\w.$]+)|InflateException",
            inflation_failed,
        )?,
    ];
    DomainRuleSet::new(Domain::Layout, Language::Xml, Some("android-view"), rules)
}

/// Location from the inflater's own line report and any explicit layout path.
///
/// `None` when the text carries neither, so the engine can still fall back to
/// a user stack frame.
fn layout_location(m: &RuleMatch<'_>) -> Option<SourceLocation> {
    let binary_line = m
        .secondary(BINARY_XML_LINE)
        .and_then(|re| find_group(re, m.text, 1));
    let file = m.secondary(XML_FILE).and_then(|re| re.captures(m.text));
    if binary_line.is_none() && file.is_none() {
        return None;
    }
    let file_line = file.as_ref().and_then(|c| c.get(2)).map(|g| g.as_str());
    let file_path = file
        .as_ref()
        .and_then(|c| c.get(1))
        .map_or(UNKNOWN_XML_FILE, |g| g.as_str());
    Some(SourceLocation {
        file_path: file_path.to_string(),
        line: parse_line(binary_line.or(file_line)),
    })
}

fn layout_resource<'a>(m: &RuleMatch<'a>) -> Option<&'a str> {
    m.secondary(LAYOUT_RESOURCE)
        .and_then(|re| find_group(re, m.text, 1))
}

fn located(m: &RuleMatch<'_>, builder: MetadataBuilder) -> Extraction {
    Extraction::with_metadata(builder.build()).location(layout_location(m))
}

/// `android:layout_width` splits into namespace and name; bare names are
/// assumed to live in the `android` namespace.
fn attribute(raw: &str) -> (&str, &str) {
    raw.split_once(':').unwrap_or(("android", raw))
}

fn must_supply(m: &RuleMatch<'_>) -> Extraction {
    attribute_missing(m, m.named("attr"), "must-supply")
}

fn not_specified(m: &RuleMatch<'_>) -> Extraction {
    attribute_missing(
        m,
        m.named("attr").or_else(|| m.named("required")),
        "not-specified",
    )
}

fn attribute_missing(m: &RuleMatch<'_>, raw: Option<&str>, phrasing: &str) -> Extraction {
    let parts = raw.map(attribute);
    located(
        m,
        MetadataBuilder::new()
            .opt_str("attribute", parts.map(|(_, name)| name))
            .opt_str("namespace", parts.map(|(ns, _)| ns))
            .str("phrasing", phrasing),
    )
}

fn resource_by_id(m: &RuleMatch<'_>) -> Extraction {
    located(
        m,
        MetadataBuilder::new().opt_str("resourceId", m.named("id").map(str::to_ascii_lowercase).as_deref()),
    )
}

fn resource_by_name(m: &RuleMatch<'_>) -> Extraction {
    located(
        m,
        MetadataBuilder::new()
            .opt_str("resourceType", m.named("type"))
            .opt_str("resourceName", m.named("name")),
    )
}

fn view_class_not_found(m: &RuleMatch<'_>) -> Extraction {
    let class = m.named("cls");
    located(
        m,
        MetadataBuilder::new()
            .opt_str("className", class)
            .opt_str("simpleName", class.map(simple_name)),
    )
}

fn duplicate_id(m: &RuleMatch<'_>) -> Extraction {
    located(m, MetadataBuilder::new().opt_str("viewId", m.named("id")))
}

fn inflation_failed(m: &RuleMatch<'_>) -> Extraction {
    let class = m.named("cls");
    located(
        m,
        MetadataBuilder::new()
            .opt_str("className", class)
            .opt_str("simpleName", class.map(simple_name))
            .opt_str("layoutResource", layout_resource(m)),
    )
}
