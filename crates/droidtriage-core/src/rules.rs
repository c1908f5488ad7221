//! Declarative rule engine shared by every domain.
//!
//! A [`DomainRuleSet`] is an immutable list of [`MatchRule`]s ordered by an
//! explicit priority. Evaluation walks the rules in that order and the first
//! trigger that matches wins; later rules are never consulted.

use std::collections::HashSet;

use regex::{Captures, Regex, RegexBuilder};

use crate::diagnosis::{Diagnosis, DiagnosisType, Domain, Language, Metadata};
use crate::error::{Result, TriageError};
use crate::extract::{Locator, SourceLocation};
use crate::knowledge::KnowledgeTables;

/// Longest message kept from the matched line.
const MAX_MESSAGE_CHARS: usize = 500;

/// Everything an extractor can see about one successful trigger match.
pub struct RuleMatch<'a> {
    pub text: &'a str,
    pub captures: Captures<'a>,
    pub secondary: &'a [Regex],
    pub knowledge: &'a KnowledgeTables,
    pub locator: &'a Locator,
}

impl<'a> RuleMatch<'a> {
    /// Trigger capture group by name.
    pub fn named(&self, name: &str) -> Option<&'a str> {
        self.captures
            .name(name)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    }

    /// Secondary pattern by index, as declared on the rule.
    pub fn secondary(&self, index: usize) -> Option<&'a Regex> {
        self.secondary.get(index)
    }

    /// Byte offset where the trigger matched.
    pub fn start(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.start())
    }

    /// The full line of `text` containing the trigger match.
    pub fn matched_line(&self) -> &'a str {
        line_at(self.text, self.start())
    }
}

fn line_at(text: &str, offset: usize) -> &str {
    let begin = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..]
        .find('\n')
        .map_or(text.len(), |i| offset + i);
    text[begin..end].trim()
}

fn clip_message(line: &str) -> String {
    match line.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => line[..idx].to_string(),
        None => line.to_string(),
    }
}

/// Fields an extractor derives from a match.
///
/// `None` fields fall back to the engine defaults: the matched line for the
/// message, [`Locator::locate`] for the location, and the file extension or
/// rule set default for the language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub message: Option<String>,
    pub location: Option<SourceLocation>,
    pub language: Option<Language>,
    pub metadata: Metadata,
}

impl Extraction {
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// Turns a trigger match into structured fields.
pub type Extractor = fn(&RuleMatch<'_>) -> Extraction;

/// Accepts or rejects a trigger match before extraction.
pub type Guard = fn(&RuleMatch<'_>) -> bool;

/// One entry in a domain's rule table.
#[derive(Debug)]
pub struct MatchRule {
    id: &'static str,
    priority: u16,
    kind: DiagnosisType,
    trigger: Regex,
    secondary: Vec<Regex>,
    guard: Option<Guard>,
    extract: Extractor,
}

fn compile(id: &'static str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| TriageError::InvalidPattern { rule: id, source })
}

impl MatchRule {
    /// Create a rule; `trigger` is compiled case-insensitively.
    pub fn new(
        id: &'static str,
        priority: u16,
        kind: DiagnosisType,
        trigger: &str,
        extract: Extractor,
    ) -> Result<Self> {
        Ok(Self {
            id,
            priority,
            kind,
            trigger: compile(id, trigger)?,
            secondary: Vec::new(),
            guard: None,
            extract,
        })
    }

    /// Add a secondary capture pattern, visible to the extractor by index.
    pub fn with_secondary(mut self, pattern: &str) -> Result<Self> {
        self.secondary.push(compile(self.id, pattern)?);
        Ok(self)
    }

    /// Only fire on trigger matches `guard` accepts. Later matches in the
    /// same text are still tried when an earlier one is rejected.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn kind(&self) -> DiagnosisType {
        self.kind
    }

    /// First trigger match in `text` that passes the guard.
    pub fn first_match<'a>(
        &'a self,
        text: &'a str,
        knowledge: &'a KnowledgeTables,
        locator: &'a Locator,
    ) -> Option<RuleMatch<'a>> {
        self.trigger
            .captures_iter(text)
            .map(|captures| RuleMatch {
                text,
                captures,
                secondary: &self.secondary,
                knowledge,
                locator,
            })
            .find(|m| self.guard.map_or(true, |accepts| accepts(m)))
    }

    fn hit(&self) -> RuleHit {
        RuleHit {
            rule_id: self.id,
            priority: self.priority,
            kind: self.kind,
        }
    }
}

/// A rule that fired, as reported by [`DomainRuleSet::hits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleHit {
    pub rule_id: &'static str,
    pub priority: u16,
    pub kind: DiagnosisType,
}

/// Ordered rules for one error family.
#[derive(Debug)]
pub struct DomainRuleSet {
    domain: Domain,
    language: Language,
    framework: Option<&'static str>,
    rules: Vec<MatchRule>,
}

impl DomainRuleSet {
    /// Validate and order a rule table.
    ///
    /// Every rule must classify into `domain`, and ids and priorities must be
    /// unique. Rules are sorted by ascending priority.
    pub fn new(
        domain: Domain,
        language: Language,
        framework: Option<&'static str>,
        mut rules: Vec<MatchRule>,
    ) -> Result<Self> {
        let mut ids = HashSet::new();
        let mut priorities = HashSet::new();
        for rule in &rules {
            if rule.kind.domain() != domain {
                return Err(TriageError::InvalidRuleSet(format!(
                    "rule {} classifies as {} which is outside the {} domain",
                    rule.id,
                    rule.kind,
                    domain.as_str()
                )));
            }
            if !ids.insert(rule.id) {
                return Err(TriageError::InvalidRuleSet(format!(
                    "duplicate rule id {} in {}",
                    rule.id,
                    domain.as_str()
                )));
            }
            if !priorities.insert(rule.priority) {
                return Err(TriageError::InvalidRuleSet(format!(
                    "duplicate priority {} in {}",
                    rule.priority,
                    domain.as_str()
                )));
            }
        }
        rules.sort_by_key(|r| r.priority);
        Ok(Self {
            domain,
            language,
            framework,
            rules,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// The precedence table in evaluation order.
    pub fn precedence(&self) -> Vec<RuleHit> {
        self.rules.iter().map(MatchRule::hit).collect()
    }

    /// Every rule that would fire on `text`, in evaluation order.
    pub fn hits(
        &self,
        text: &str,
        knowledge: &KnowledgeTables,
        locator: &Locator,
    ) -> Vec<RuleHit> {
        self.rules
            .iter()
            .filter(|r| r.first_match(text, knowledge, locator).is_some())
            .map(MatchRule::hit)
            .collect()
    }

    /// Run the cascade; returns the diagnosis and the id of the winning rule.
    pub fn evaluate(
        &self,
        text: &str,
        knowledge: &KnowledgeTables,
        locator: &Locator,
    ) -> Option<(Diagnosis, &'static str)> {
        self.rules.iter().find_map(|rule| {
            let matched = rule.first_match(text, knowledge, locator)?;
            let extraction = (rule.extract)(&matched);
            let message = extraction
                .message
                .unwrap_or_else(|| clip_message(matched.matched_line()));
            let location = extraction
                .location
                .or_else(|| locator.locate(text, knowledge));
            let (file_path, line) = match location {
                Some(loc) => (loc.file_path, loc.line),
                None => (self.domain.sentinel_file().to_string(), 0),
            };
            let language = extraction
                .language
                .or_else(|| Language::from_path(&file_path))
                .unwrap_or(self.language);
            Some((
                Diagnosis {
                    kind: rule.kind,
                    message,
                    file_path,
                    line,
                    language,
                    framework: self.framework.map(str::to_string),
                    metadata: extraction.metadata,
                },
                rule.id,
            ))
        })
    }
}
