//! Metadata extraction helpers shared by every rule set.
//!
//! All helpers are total: missing secondary data yields `None` or an empty
//! collection, never an error.

use regex::Regex;
use serde_json::Value;

use crate::diagnosis::Metadata;
use crate::error::{Result, TriageError};
use crate::knowledge::KnowledgeTables;

/// A resolved file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: u32,
}

/// One `at symbol(source)` frame of a JVM stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    fn location(&self) -> Option<SourceLocation> {
        let file = self.file.as_ref()?;
        Some(SourceLocation {
            file_path: file.clone(),
            line: self.line.unwrap_or(0),
        })
    }
}

const SOURCE_FILE: &str = r"[\w./\\$-]+\.(?:kts|kt|java|xml|gradle)";

fn compile(name: &'static str, pattern: &str) -> Result<Regex> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| TriageError::InvalidPattern { rule: name, source })
}

/// Compiled file/line conventions, tried in a fixed order.
#[derive(Debug)]
pub struct Locator {
    conventions: Vec<Regex>,
    frame: Regex,
    frame_source: Regex,
}

impl Locator {
    pub fn new() -> Result<Self> {
        let conventions = vec![
            compile(
                "locator.file_line_col",
                &format!(r"(?P<file>{SOURCE_FILE}):(?P<line>\d+):\d+"),
            )?,
            compile(
                "locator.file_line",
                &format!(r"(?P<file>{SOURCE_FILE}):(?P<line>\d+)"),
            )?,
            compile(
                "locator.at_symbol",
                r"at\s+[\w$.<>]+\((?P<file>[\w.$-]+\.(?:kt|java)):(?P<line>\d+)\)",
            )?,
            compile(
                "locator.parenthesized",
                &format!(r"\((?P<file>{SOURCE_FILE}):(?P<line>\d+)\)"),
            )?,
        ];
        Ok(Self {
            conventions,
            frame: compile("locator.frame", r"\bat\s+(?P<symbol>[\w$.<>-]+)\((?P<src>[^)\n]*)\)")?,
            frame_source: compile(
                "locator.frame_source",
                r"^(?P<file>[\w.$-]+\.(?:kt|java)):(?P<line>\d+)$",
            )?,
        })
    }

    /// Resolve the first file reference using the fixed convention order:
    /// `file:line:col`, `file:line`, `at symbol(file:line)`, `(file:line)`.
    pub fn resolve(&self, text: &str) -> Option<SourceLocation> {
        self.conventions.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let file = normalize_path(caps.name("file")?.as_str());
            let line = parse_line(caps.name("line").map(|m| m.as_str()));
            Some(SourceLocation {
                file_path: file,
                line,
            })
        })
    }

    /// All stack frames in text order.
    pub fn frames(&self, text: &str) -> Vec<StackFrame> {
        self.frame
            .captures_iter(text)
            .filter_map(|caps| {
                let symbol = caps.name("symbol")?.as_str().to_string();
                let src = caps.name("src").map(|m| m.as_str()).unwrap_or_default();
                let (file, line) = match self.frame_source.captures(src) {
                    Some(s) => (
                        s.name("file").map(|m| m.as_str().to_string()),
                        s.name("line").and_then(|m| m.as_str().parse().ok()),
                    ),
                    None => (None, None),
                };
                Some(StackFrame { symbol, file, line })
            })
            .collect()
    }

    /// First frame outside the platform namespaces that names a source file.
    pub fn first_user_frame(
        &self,
        text: &str,
        knowledge: &KnowledgeTables,
    ) -> Option<StackFrame> {
        self.frames(text)
            .into_iter()
            .find(|f| !knowledge.is_platform_symbol(&f.symbol) && f.file.is_some())
    }

    /// Best location for user code.
    ///
    /// Stack traces resolve to the first user frame only; a trace made of
    /// platform frames resolves to `None`. Text without frames falls back to
    /// [`Locator::resolve`].
    pub fn locate(&self, text: &str, knowledge: &KnowledgeTables) -> Option<SourceLocation> {
        if self.frame.is_match(text) {
            self.first_user_frame(text, knowledge)
                .and_then(|f| f.location())
        } else {
            self.resolve(text)
        }
    }
}

fn normalize_path(raw: &str) -> String {
    let mut path = raw;
    while path.starts_with("//") {
        path = &path[1..];
    }
    path.to_string()
}

/// Parse a line number; anything unparseable is `0` (unknown).
pub fn parse_line(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Parse a non-negative count.
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.parse().ok())
}

/// Text of the first capture group of `re` in `text`.
pub fn find_group<'t>(re: &Regex, text: &'t str, index: usize) -> Option<&'t str> {
    re.captures(text).and_then(|caps| {
        caps.get(index)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    })
}

/// Every value of `index` across all matches, de-duplicated, first-seen order.
pub fn collect_unique(re: &Regex, text: &str, index: usize) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in re.captures_iter(text) {
        if let Some(m) = caps.get(index) {
            let value = m.as_str().trim().to_string();
            if !value.is_empty() && !seen.contains(&value) {
                seen.push(value);
            }
        }
    }
    seen
}

/// Last segment of a qualified JVM name (`com.a.Outer$Inner` -> `Inner`).
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rsplit(['.', '$'])
        .find(|s| !s.is_empty())
        .unwrap_or(qualified)
}

/// Split a permission into `(short, full)` names.
///
/// `android.permission.CAMERA` and `CAMERA` both give
/// `("CAMERA", "android.permission.CAMERA")`; custom permissions keep their
/// own namespace.
pub fn normalize_permission(raw: &str) -> (String, String) {
    let trimmed = raw.trim().trim_end_matches(['.', ',', ';']);
    match trimmed.rsplit_once('.') {
        Some((namespace, short)) => {
            let short = short.to_ascii_uppercase();
            let full = if namespace.eq_ignore_ascii_case("android.permission") {
                format!("android.permission.{short}")
            } else {
                format!("{namespace}.{short}")
            };
            (short, full)
        }
        None => {
            let short = trimmed.to_ascii_uppercase();
            let full = format!("android.permission.{short}");
            (short, full)
        }
    }
}

/// Maven coordinate parts of `group:artifact[:version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate<'a> {
    pub group: &'a str,
    pub artifact: &'a str,
    pub version: Option<&'a str>,
}

pub fn split_coordinate(raw: &str) -> Option<Coordinate<'_>> {
    let mut parts = raw.split(':');
    let group = parts.next().filter(|s| !s.is_empty())?;
    let artifact = parts.next().filter(|s| !s.is_empty())?;
    let version = parts.next().filter(|s| !s.is_empty());
    Some(Coordinate {
        group,
        artifact,
        version,
    })
}

/// Builder for metadata maps; absent values are skipped.
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    map: Metadata,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(mut self, key: &str, value: impl Into<String>) -> Self {
        self.map.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn opt_str(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.str(key, v),
            None => self,
        }
    }

    pub fn int(mut self, key: &str, value: u64) -> Self {
        self.map.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn opt_int(self, key: &str, value: Option<u64>) -> Self {
        match value {
            Some(v) => self.int(key, v),
            None => self,
        }
    }

    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.map.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Insert a list; empty lists are skipped.
    pub fn list(mut self, key: &str, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.map.insert(
                key.to_string(),
                Value::Array(values.into_iter().map(Value::String).collect()),
            );
        }
        self
    }

    pub fn build(self) -> Metadata {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> Locator {
        Locator::new().expect("locator patterns compile")
    }

    #[test]
    fn test_resolve_prefers_file_line_col() {
        let loc = locator()
            .resolve("e: /src/app/Main.kt:12:5 Unresolved reference: foo")
            .expect("location");
        assert_eq!(loc.file_path, "/src/app/Main.kt");
        assert_eq!(loc.line, 12);
    }

    #[test]
    fn test_resolve_file_line() {
        let loc = locator()
            .resolve("error in build.gradle.kts:7 near plugins")
            .expect("location");
        assert_eq!(loc.file_path, "build.gradle.kts");
        assert_eq!(loc.line, 7);
    }

    #[test]
    fn test_resolve_strips_file_uri_slashes() {
        let loc = locator()
            .resolve("e: file:///home/dev/app/Main.kt:3:1 Expecting ')'")
            .expect("location");
        assert_eq!(loc.file_path, "/home/dev/app/Main.kt");
        assert_eq!(loc.line, 3);
    }

    #[test]
    fn test_resolve_none_without_reference() {
        assert!(locator().resolve("something went wrong").is_none());
    }

    #[test]
    fn test_first_user_frame_skips_platform() {
        let trace = "java.lang.SecurityException: denied\n\
            \tat android.os.Parcel.createException(Parcel.java:2071)\n\
            \tat androidx.core.content.ContextCompat.startActivity(ContextCompat.java:10)\n\
            \tat com.example.cam.CameraScreen.open(CameraScreen.kt:88)\n\
            \tat com.example.cam.MainActivity.onCreate(MainActivity.kt:20)";
        let frame = locator()
            .first_user_frame(trace, &KnowledgeTables::default())
            .expect("user frame");
        assert_eq!(frame.symbol, "com.example.cam.CameraScreen.open");
        assert_eq!(frame.file.as_deref(), Some("CameraScreen.kt"));
        assert_eq!(frame.line, Some(88));
    }

    #[test]
    fn test_locate_all_platform_frames_is_none() {
        let trace = "java.lang.IllegalStateException: boom\n\
            \tat android.app.ActivityThread.main(ActivityThread.java:8177)\n\
            \tat java.lang.reflect.Method.invoke(Native Method)";
        assert!(locator()
            .locate(trace, &KnowledgeTables::default())
            .is_none());
    }

    #[test]
    fn test_locate_without_frames_uses_conventions() {
        let loc = locator()
            .locate("MainActivity.java:41: error: cannot find symbol", &KnowledgeTables::default())
            .expect("location");
        assert_eq!(loc.file_path, "MainActivity.java");
        assert_eq!(loc.line, 41);
    }

    #[test]
    fn test_user_frame_without_source_is_skipped() {
        let trace = "\tat com.example.Gen.run(Unknown Source)\n\
            \tat com.example.Real.run(Real.kt:5)";
        let frame = locator()
            .first_user_frame(trace, &KnowledgeTables::default())
            .expect("frame");
        assert_eq!(frame.symbol, "com.example.Real.run");
    }

    #[test]
    fn test_collect_unique_preserves_first_seen_order() {
        let re = Regex::new(r"Modifier\.(\w+)").unwrap();
        let found = collect_unique(
            &re,
            "Modifier.padding(4.dp).clickable { }.padding(2.dp) Modifier.background(Red)",
            1,
        );
        assert_eq!(found, vec!["padding", "background"]);

        let found = collect_unique(&re, "Modifier.padding Modifier.clickable Modifier.padding", 1);
        assert_eq!(found, vec!["padding", "clickable"]);
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("com.example.ui.FancyView"), "FancyView");
        assert_eq!(simple_name("com.example.Outer$Inner"), "Inner");
        assert_eq!(simple_name("Plain"), "Plain");
    }

    #[test]
    fn test_normalize_permission() {
        assert_eq!(
            normalize_permission("android.permission.CAMERA"),
            ("CAMERA".to_string(), "android.permission.CAMERA".to_string())
        );
        assert_eq!(
            normalize_permission("INTERNET."),
            ("INTERNET".to_string(), "android.permission.INTERNET".to_string())
        );
        assert_eq!(
            normalize_permission("com.example.permission.SYNC"),
            ("SYNC".to_string(), "com.example.permission.SYNC".to_string())
        );
    }

    #[test]
    fn test_split_coordinate() {
        let c = split_coordinate("androidx.core:core-ktx:1.12.0").expect("coordinate");
        assert_eq!(c.group, "androidx.core");
        assert_eq!(c.artifact, "core-ktx");
        assert_eq!(c.version, Some("1.12.0"));

        let c = split_coordinate("com.squareup:okhttp").expect("coordinate");
        assert_eq!(c.version, None);
        assert!(split_coordinate("no-colon").is_none());
    }

    #[test]
    fn test_parse_line_defaults_to_zero() {
        assert_eq!(parse_line(Some("42")), 42);
        assert_eq!(parse_line(Some("99999999999")), 0);
        assert_eq!(parse_line(None), 0);
    }

    #[test]
    fn test_metadata_builder_skips_absent_values() {
        let meta = MetadataBuilder::new()
            .str("a", "x")
            .opt_str("b", None)
            .opt_int("c", Some(3))
            .list("d", vec![])
            .bool("e", false)
            .build();
        assert_eq!(meta.len(), 3);
        assert_eq!(meta["c"], 3);
        assert!(!meta.contains_key("b"));
        assert!(!meta.contains_key("d"));
    }
}
