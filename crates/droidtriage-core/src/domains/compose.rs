//! Jetpack Compose state, effect, modifier and recomposition rules.

use crate::diagnosis::{DiagnosisType, Domain, Language};
use crate::error::Result;
use crate::extract::{find_group, parse_count, simple_name, MetadataBuilder};
use crate::rules::{DomainRuleSet, Extraction, MatchRule, RuleMatch};

const EFFECTS: &[&str] = &["LaunchedEffect", "DisposableEffect", "produceState"];

pub fn rule_set() -> Result<DomainRuleSet> {
    let rules = vec![
        MatchRule::new(
            "compose.modifier_order",
            10,
            DiagnosisType::ModifierOrder,
            r"modifier\.(?P<modifier>\w+)\s+(?:must|should)\s+(?:come|be applied|be placed)\s+(?P<relation>after|before)\s+modifier\.(?P<anchor>\w+)",
            modifier_order,
        )?
        .with_secondary(r"\bmodifier\s*\.\s*(\w+)")?,
        MatchRule::new(
            "compose.state_not_remembered",
            20,
            DiagnosisType::StateNotRemembered,
            r"Creating a state object during composition without using\s+`?remember",
            state_not_remembered,
        )?
        .with_secondary(
            r"\b(mutableStateOf|mutableIntStateOf|mutableLongStateOf|mutableFloatStateOf|mutableDoubleStateOf|mutableStateListOf|mutableStateMapOf|derivedStateOf)\b",
        )?,
        MatchRule::new(
            "compose.state_not_retained",
            30,
            DiagnosisType::StateNotRetained,
            r"state\s+(?:is\s+|was\s+|gets\s+)?(?:lost|reset)\s+(?:on|after|during)\s+(?P<trigger>configuration changes?|(?:screen\s+)?rotation|activity recreation|recreation|process death)",
            state_not_retained,
        )?,
        MatchRule::new(
            "compose.state_not_saveable",
            35,
            DiagnosisType::StateNotSaveable,
            r"(?:containing\s+)?(?P<value>[\w.$]+)(?:@[0-9a-f]+|\([^)\n]*\))?\s+cannot be saved using the current SaveableStateRegistry",
            state_not_saveable,
        )?,
        MatchRule::new(
            "compose.effect_key_missing",
            40,
            DiagnosisType::EffectKeyMissing,
            r"(?P<effect>LaunchedEffect|DisposableEffect|produceState)\s+must provide (?:one or more|at least one)\s+'?key",
            effect_key_missing,
        )?,
        MatchRule::new(
            "compose.launch_in_composition",
            45,
            DiagnosisType::SideEffectInComposition,
            r"Calls to\s+(?P<call>launch|async)\s+should happen inside (?:of )?a\s+LaunchedEffect and not composition",
            launch_in_composition,
        )?,
        MatchRule::new(
            "compose.local_missing",
            50,
            DiagnosisType::CompositionLocalMissing,
            r"CompositionLocal\s+(?P<local>\w+)\s+not present",
            local_missing,
        )?,
        MatchRule::new(
            "compose.composable_context",
            60,
            DiagnosisType::ComposableContextRequired,
            r"@Composable invocations can only happen from the context of a @Composable function",
            no_metadata,
        )?,
        MatchRule::new(
            "compose.recomposition_excessive",
            70,
            DiagnosisType::RecompositionExcessive,
            r"(?P<name>\w+)\s+recomposed\s+(?P<count>\d+)\s+times|recomposition count(?:\s+for\s+(?P<for>\w+))?\s*[:=]\s*(?P<total>\d+)|excessive recompositions?",
            recomposition_excessive,
        )?,
    ];
    DomainRuleSet::new(
        Domain::Compose,
        Language::Kotlin,
        Some("jetpack-compose"),
        rules,
    )
}

/// Modifier names are normalised through the known vocabulary and the
/// message is rebuilt from them, so differently cased reports of the same
/// finding produce identical diagnoses.
fn modifier_order(m: &RuleMatch<'_>) -> Extraction {
    let tables = m.knowledge;
    let modifier = m.named("modifier").map(|n| tables.canonical_modifier(n));
    let anchor = m.named("anchor").map(|n| tables.canonical_modifier(n));
    let relation = m.named("relation").map(str::to_ascii_lowercase);

    let mut chain: Vec<String> = Vec::new();
    if let Some(re) = m.secondary(0) {
        for caps in re.captures_iter(m.text) {
            let Some(first) = caps.get(1) else {
                continue;
            };
            let links = std::iter::once(first.as_str()).chain(chained_links(m.text, first.end()));
            for link in links {
                let name = tables.canonical_modifier(link);
                if !chain.contains(&name) {
                    chain.push(name);
                }
            }
        }
    }

    let mut extraction = Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("modifier", modifier.as_deref())
            .opt_str("anchor", anchor.as_deref())
            .opt_str("relation", relation.as_deref())
            .list("modifiers", chain)
            .build(),
    );
    if let (Some(modifier), Some(relation), Some(anchor)) = (&modifier, &relation, &anchor) {
        extraction = extraction.message(format!(
            "Modifier.{modifier} must come {relation} Modifier.{anchor}"
        ));
    }
    extraction
}

/// Calls chained after the modifier that ends at byte `from`: `background`
/// and `clickable` in `Modifier.padding(8.dp).background(c).clickable { }`.
/// Argument lists and trailing lambdas are skipped whole; a link only counts
/// when it is called.
fn chained_links(text: &str, mut from: usize) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut links = Vec::new();
    loop {
        from = skip_whitespace(bytes, from);
        while matches!(bytes.get(from), Some(b'(' | b'{')) {
            let Some(close) = closing_bracket(bytes, from) else {
                return links;
            };
            from = skip_whitespace(bytes, close + 1);
        }
        if bytes.get(from) != Some(&b'.') {
            return links;
        }
        let start = skip_whitespace(bytes, from + 1);
        let end = start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count();
        let after = skip_whitespace(bytes, end);
        if end == start || !matches!(bytes.get(after), Some(b'(' | b'{')) {
            return links;
        }
        links.push(&text[start..end]);
        from = after;
    }
}

fn skip_whitespace(bytes: &[u8], from: usize) -> usize {
    from + bytes
        .get(from..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_whitespace()).count())
}

/// Index of the bracket closing the one at `open`, nesting `()` and `{}`.
fn closing_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' | b'{' => depth += 1,
            b')' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn no_metadata(_: &RuleMatch<'_>) -> Extraction {
    Extraction::default()
}

fn state_not_remembered(m: &RuleMatch<'_>) -> Extraction {
    let factory = m.secondary(0).and_then(|re| find_group(re, m.text, 1));
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("stateFactory", factory)
            .build(),
    )
}

fn state_not_retained(m: &RuleMatch<'_>) -> Extraction {
    let trigger = m.named("trigger").map(|t| {
        let t = t.to_ascii_lowercase();
        if t.starts_with("configuration change") {
            "configuration change".to_string()
        } else {
            t
        }
    });
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("trigger", trigger.as_deref())
            .build(),
    )
}

fn state_not_saveable(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("valueType", m.named("value").map(simple_name))
            .build(),
    )
}

fn effect_key_missing(m: &RuleMatch<'_>) -> Extraction {
    let effect = m.named("effect").and_then(|raw| {
        EFFECTS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(raw))
            .copied()
    });
    Extraction::with_metadata(MetadataBuilder::new().opt_str("effect", effect).build())
}

fn launch_in_composition(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("call", m.named("call").map(str::to_ascii_lowercase).as_deref())
            .build(),
    )
}

fn local_missing(m: &RuleMatch<'_>) -> Extraction {
    Extraction::with_metadata(
        MetadataBuilder::new()
            .opt_str("localName", m.named("local"))
            .build(),
    )
}

fn recomposition_excessive(m: &RuleMatch<'_>) -> Extraction {
    let composable = m.named("name").or_else(|| m.named("for"));
    let count = parse_count(m.named("count").or_else(|| m.named("total")));
    let mut builder = MetadataBuilder::new().opt_str("composable", composable);
    if let Some(count) = count {
        builder = builder
            .int("recompositionCount", count)
            .bool("overThreshold", count > m.knowledge.recomposition_threshold);
    }
    Extraction::with_metadata(builder.build())
}
