//! Build dependency, version, plugin and script rules.
//!
//! `Execution failed for task` wraps almost every build failure, so it is the
//! lowest rule here and the whole domain is dispatched after layout and compose.

use crate::diagnosis::{DiagnosisType, Domain, Language};
use crate::error::Result;
use crate::extract::{
    collect_unique, find_group, parse_count, parse_line, split_coordinate, MetadataBuilder,
    SourceLocation,
};
use crate::rules::{DomainRuleSet, Extraction, MatchRule, RuleMatch};

pub fn rule_set() -> Result<DomainRuleSet> {
    let rules = vec![
        MatchRule::new(
            "gradle.duplicate_class",
            10,
            DiagnosisType::DependencyConflict,
            r"Duplicate class\s+(?P<cls>[\w.$]+)\s+found in modules?",
            duplicate_class,
        )?
        .with_secondary(r"\(([\w.-]+:[\w.-]+:[\w.+-]+)\)")?,
        MatchRule::new(
            "gradle.conflict_with_dependency",
            20,
            DiagnosisType::VersionConflict,
            r"Conflict with dependency\s+'(?P<dep>[^']+)'(?:\s+in project\s+'(?P<project>[^']+)')?",
            version_conflict,
        )?
        .with_secondary(r"\(([\d][\w.+-]*)\)")?,
        MatchRule::new(
            "gradle.no_satisfying_version",
            21,
            DiagnosisType::VersionConflict,
            r"Cannot find a version of\s+'(?P<dep>[^']+)'\s+that satisfies the version constraints",
            version_conflict,
        )?
        .with_secondary(r"-->\s+'[^':\s]+:[^':\s]+:(?:\{strictly\s+)?([^'}\s]+)\}?'")?,
        MatchRule::new(
            "gradle.compile_sdk",
            30,
            DiagnosisType::CompileSdkTooLow,
            r"depend on it to compile against version\s+(?P<required>\d+)\s+or later|requires\s+compileSdk(?:Version)?\s+(?P<sdk>\d+)",
            compile_sdk,
        )?
        .with_secondary(r"Dependency\s+'([^']+)'\s+requires")?
        .with_secondary(r"currently compiled against\s+android-(\d+)")?,
        MatchRule::new(
            "gradle.jvm_target",
            40,
            DiagnosisType::JvmTargetMismatch,
            r"Inconsistent JVM-target compatibility detected for tasks\s+'(?P<task_a>[^']+)'\s+\((?P<target_a>[\w.]+)\)\s+and\s+'(?P<task_b>[^']+)'\s+\((?P<target_b>[\w.]+)\)|Cannot inline bytecode built with JVM target\s+(?P<inline_a>[\d.]+)\s+into bytecode that is being built with JVM target\s+(?P<inline_b>[\d.]+)|JVM target compatibility should be set to the same Java version",
            jvm_target,
        )?,
        MatchRule::new(
            "gradle.plugin_not_found",
            50,
            DiagnosisType::PluginNotFound,
            r"Plugin\s+\[id:\s*'(?P<id>[^']+)'(?:,\s*version:\s*'(?P<version>[^']+)')?[^\]]*\]\s+was not found",
            plugin_not_found,
        )?,
        MatchRule::new(
            "gradle.unresolved_dependency",
            60,
            DiagnosisType::DependencyUnresolved,
            r"Could not (?:resolve|find)\s+(?P<dep>[\w.-]+:[\w.-]+(?::[\w.+-]+)?)",
            unresolved_dependency,
        )?
        .with_secondary(r"for configuration\s+'([^']+)'")?,
        MatchRule::new(
            "gradle.build_script",
            70,
            DiagnosisType::BuildScriptError,
            r"Build file\s+'(?P<file>[^']+)'\s+line:\s*(?P<line>\d+)|Could not compile (?:build|settings) file\s+'(?P<compiled>[^']+)'|Could not find method\s+(?P<method>\w+)\(\)\s+for arguments|\.gradle(?:\.kts)?:\d+:\d+:?\s+(?:Unresolved reference|Expecting|Unexpected)",
            build_script,
        )?
        .with_secondary(r"\* What went wrong:[ \t]*\r?\n[ \t]*(.+)")?
        .with_secondary(r"(Unresolved reference:\s*\w+)")?
        .with_secondary(r"Could not find method\s+(\w+)\(\)")?,
        MatchRule::new(
            "gradle.task_failed",
            80,
            DiagnosisType::BuildTaskFailed,
            r"Execution failed for task\s+'(?P<task>[^']+)'",
            task_failed,
        )?,
    ];
    DomainRuleSet::new(Domain::Gradle, Language::Gradle, Some("gradle"), rules)
}

fn secondary_group<'a>(m: &RuleMatch<'a>, index: usize) -> Option<&'a str> {
    m.secondary(index).and_then(|re| find_group(re, m.text, 1))
}

fn secondary_all(m: &RuleMatch<'_>, index: usize) -> Vec<String> {
    m.secondary(index)
        .map(|re| collect_unique(re, m.text, 1))
        .unwrap_or_default()
}

fn duplicate_class(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("className", m.named("cls"))
            .list("modules", secondary_all(m, 0))
            .build(),
    )
}

fn version_conflict(m: &RuleMatch<'_>) -> Extraction {
    let project = m.named("project").map(|p| p.trim_start_matches(':'));
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("dependency", m.named("dep"))
            .opt_str("project", project)
            .list("versions", secondary_all(m, 0))
            .build(),
    )
}

fn compile_sdk(m: &RuleMatch<'_>) -> Extraction {
    let required = parse_count(m.named("required").or_else(|| m.named("sdk")));
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("dependency", secondary_group(m, 0))
            .opt_int("requiredCompileSdk", required)
            .opt_int("currentCompileSdk", parse_count(secondary_group(m, 1)))
            .build(),
    )
}

fn jvm_target(m: &RuleMatch<'_>) -> Extraction {
    let tasks: Vec<String> = [m.named("task_a"), m.named("task_b")]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    let targets: Vec<String> = [
        m.named("target_a"),
        m.named("target_b"),
        m.named("inline_a"),
        m.named("inline_b"),
    ]
    .into_iter()
    .flatten()
    .map(str::to_string)
    .collect();
    Extraction::with_metadata(
        MetadataBuilder::new()
            .list("tasks", tasks)
            .list("targets", targets)
            .build(),
    )
}

fn plugin_not_found(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("pluginId", m.named("id"))
            .opt_str("pluginVersion", m.named("version"))
            .build(),
    )
}

fn unresolved_dependency(m: &RuleMatch<'_>) -> Extraction {
    let dependency = m
        .named("dep")
        .map(|d| d.trim_end_matches('.'));
    let coordinate = dependency.and_then(split_coordinate);
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("dependency", dependency)
            .opt_str("group", coordinate.as_ref().map(|c| c.group))
            .opt_str("artifact", coordinate.as_ref().map(|c| c.artifact))
            .opt_str("version", coordinate.as_ref().and_then(|c| c.version))
            .opt_str("configuration", secondary_group(m, 0))
            .build(),
    )
}

fn build_script(m: &RuleMatch<'_>) -> Extraction {
    let file = m.named("file").or_else(|| m.named("compiled"));
    let location = file.map(|f| SourceLocation {
        file_path: f.to_string(),
        line: parse_line(m.named("line")),
    });
    let detail = secondary_group(m, 0).or_else(|| secondary_group(m, 1));
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str(
                "method",
                m.named("method").or_else(|| secondary_group(m, 2)),
            )
            .opt_str("detail", detail)
            .build(),
    )
    .location(location)
}

/// `:feature:login:compileDebugKotlin` belongs to module `:feature:login`.
fn task_module(task: &str) -> Option<String> {
    let parts: Vec<&str> = task.split(':').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }
    Some(format!(":{}", parts[..parts.len() - 1].join(":")))
}

fn task_failed(m: &RuleMatch<'_>) -> Extraction {
    let task = m.named("task");
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("task", task)
            .opt_str("module", task.and_then(task_module).as_deref())
            .build(),
    )
}
