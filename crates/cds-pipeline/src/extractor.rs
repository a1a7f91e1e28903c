//! Decision extractor.
//!
//! Scans normalized guideline section text and emits candidate decision
//! statements (condition-action pairs) using the ordered pattern rules of a
//! [`RuleSet`]. Extraction is a pure function of its input: identical text
//! always yields identical output order and content. It never fails on
//! malformed text; at worst a section yields an empty list.

use std::collections::BTreeSet;

use cds_types::{DecisionStatement, GuidelineSection, SourceSpan};

use crate::rules::{contains_action_verb, RuleSet};
use crate::types::{ExtractionStats, ExtractorConfig};

/// The statements and diagnostics produced by extracting one section.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Extracted decision statements, in sentence order.
    pub statements: Vec<DecisionStatement>,
    /// Extraction diagnostics for the section.
    pub stats: ExtractionStats,
}

/// A sentence with its byte span within the section body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sentence<'a> {
    text: &'a str,
    span: SourceSpan,
}

/// Extracts decision statements from one guideline section.
///
/// Rules are tried in priority order per sentence; the first matching rule of
/// each family produces one statement, so a sentence matching several
/// non-overlapping families yields several statements. Sentences below the
/// minimum token count, without a recognized action verb, or matching no rule
/// are counted as unparsed, not treated as errors.
pub fn extract(
    section: &GuidelineSection,
    rules: &RuleSet,
    config: &ExtractorConfig,
) -> ExtractionOutcome {
    let mut outcome = ExtractionOutcome::default();
    let mut ordinal = 0usize;

    for sentence in segment_sentences(&section.body_text) {
        outcome.stats.sentences_total += 1;

        if sentence.text.split_whitespace().count() < config.min_sentence_tokens
            || !contains_action_verb(sentence.text)
        {
            outcome.stats.unparsed_sentences += 1;
            continue;
        }

        let mut matched_families: BTreeSet<&str> = BTreeSet::new();
        for rule in rules.extraction_rules() {
            if matched_families.contains(rule.family.as_str()) {
                continue;
            }

            let Some(captures) = rule.pattern.captures(sentence.text) else {
                continue;
            };

            // A named group made optional by an external table may not
            // participate in the match; treat that as no match.
            let (Some(cond), Some(action)) = (captures.name("cond"), captures.name("action"))
            else {
                continue;
            };
            let condition_text = normalize_capture(cond.as_str());
            let action_text = normalize_capture(action.as_str());

            // A match whose action side carries no recognizable verb is not a
            // decision; let a lower-priority rule of the same family try.
            if condition_text.is_empty()
                || action_text.is_empty()
                || !contains_action_verb(&action_text)
            {
                continue;
            }

            matched_families.insert(rule.family.as_str());
            outcome.statements.push(DecisionStatement {
                id: DecisionStatement::make_id(&section.id, ordinal),
                section_id: section.id.clone(),
                condition_text,
                action_text,
                source_span: sentence.span,
            });
            ordinal += 1;
        }

        if matched_families.is_empty() {
            outcome.stats.unparsed_sentences += 1;
        } else {
            outcome.stats.statements_extracted += matched_families.len();
        }
    }

    outcome
}

/// Splits text into sentences, tracking byte spans.
///
/// A sentence ends at `.`, `!`, `?`, or `;` followed by whitespace or end of
/// text, or at a newline. Terminal punctuation followed by a non-space (as in
/// "140.5") does not split.
fn segment_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let is_terminal = matches!(c, '.' | '!' | '?' | ';');
        let followed_by_space = chars.peek().map_or(true, |(_, next)| next.is_whitespace());

        if c == '\n' {
            push_trimmed(text, start, i, &mut sentences);
            start = i + 1;
        } else if is_terminal && followed_by_space {
            let end = i + c.len_utf8();
            push_trimmed(text, start, end, &mut sentences);
            start = end;
        }
    }

    push_trimmed(text, start, text.len(), &mut sentences);
    sentences
}

fn push_trimmed<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<Sentence<'a>>) {
    if start >= end {
        return;
    }
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - raw.trim_start().len());
    out.push(Sentence {
        text: trimmed,
        span: SourceSpan::new(offset, offset + trimmed.len()),
    });
}

/// Normalizes a captured condition or action: trims whitespace and trailing
/// punctuation.
fn normalize_capture(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', ',', ';', ':'])
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn make_section(body: &str) -> GuidelineSection {
        GuidelineSection {
            id: "s1".to_string(),
            title: "Test".to_string(),
            body_text: body.to_string(),
            source_document_id: "doc1".to_string(),
        }
    }

    fn extract_default(body: &str) -> ExtractionOutcome {
        let rules = RuleSet::builtin().unwrap();
        extract(&make_section(body), &rules, &ExtractorConfig::default())
    }

    #[test]
    fn test_segment_sentences_tracks_spans() {
        let text = "First sentence. Second one! Third?";
        let sentences = segment_sentences(text);
        assert_eq!(sentences.len(), 3);
        for sentence in &sentences {
            assert_eq!(sentence.span.slice(text), Some(sentence.text));
        }
        assert_eq!(sentences[0].text, "First sentence.");
        assert_eq!(sentences[1].text, "Second one!");
    }

    #[test]
    fn test_segment_does_not_split_decimals() {
        let sentences = segment_sentences("Give 2.5 mg daily. Then reassess.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "Give 2.5 mg daily.");
    }

    #[test]
    fn test_extract_condition_action_pair() {
        let outcome = extract_default(
            "For patients with systolic BP \u{2265} 140 mmHg, initiate ACE inhibitor therapy.",
        );
        assert_eq!(outcome.statements.len(), 1);

        let statement = &outcome.statements[0];
        assert_eq!(statement.condition_text, "systolic BP \u{2265} 140 mmHg");
        assert_eq!(statement.action_text, "initiate ACE inhibitor therapy");
        assert_eq!(statement.id, "s1:0");
        assert_eq!(statement.section_id, "s1");
    }

    #[test]
    fn test_spans_fall_within_section() {
        let body = "Intro text without any decision. For patients with diabetes, order an annual \
                    HbA1c laboratory panel. If LDL exceeds 190 mg/dL, initiate statin therapy.";
        let section = make_section(body);
        let rules = RuleSet::builtin().unwrap();
        let outcome = extract(&section, &rules, &ExtractorConfig::default());

        assert!(!outcome.statements.is_empty());
        for statement in &outcome.statements {
            assert!(section.contains_span(&statement.source_span));
            let evidence = statement.source_span.slice(body).unwrap();
            assert!(evidence.contains(&statement.action_text));
        }
    }

    #[test]
    fn test_multiple_families_yield_multiple_statements() {
        let outcome = extract_default(
            "If chest pain persists after rest, consider an alternative diagnosis such as \
             pulmonary embolism.",
        );
        // Both the conditional family and the differential family fire.
        assert_eq!(outcome.statements.len(), 2);
        let families_distinct = outcome.statements[0].id != outcome.statements[1].id;
        assert!(families_distinct);
        assert_eq!(outcome.statements[0].condition_text, outcome.statements[1].condition_text);
    }

    #[test]
    fn test_short_and_verbless_sentences_are_unparsed() {
        let outcome = extract_default(
            "Stop now. Hypertension is a common chronic condition in older adults. If symptoms \
             worsen, refer the patient to cardiology.",
        );
        assert_eq!(outcome.stats.sentences_total, 3);
        assert_eq!(outcome.statements.len(), 1);
        // "Stop now." is under the token minimum; the second sentence has no
        // action verb.
        assert_eq!(outcome.stats.unparsed_sentences, 2);
    }

    #[test]
    fn test_nonparticipating_named_group_is_not_a_match() {
        // External tables may wrap a named group in an optional prefix; a
        // match where the group did not participate yields no statement.
        let extraction = "id\tpriority\tfamily\tpattern\n\
            opt\t10\tconditional\t(?i)^(?:for\\s+(?P<cond>[^,]+),\\s*)?(?P<action>initiate .+)$\n";
        let classification = "id\tcategory\tside\tphrase\nc1\tscreening\tany\tscreen\n";
        let rules =
            RuleSet::from_readers(extraction.as_bytes(), classification.as_bytes()).unwrap();

        let outcome = extract(
            &make_section("Initiate ACE inhibitor therapy without delay today."),
            &rules,
            &ExtractorConfig::default(),
        );
        assert!(outcome.statements.is_empty());
        assert_eq!(outcome.stats.unparsed_sentences, 1);

        // The same rule still extracts when the group does participate.
        let outcome = extract(
            &make_section("For asthma, initiate inhaled corticosteroid therapy."),
            &rules,
            &ExtractorConfig::default(),
        );
        assert_eq!(outcome.statements.len(), 1);
        assert_eq!(outcome.statements[0].condition_text, "asthma");
    }

    #[test]
    fn test_malformed_text_never_errors() {
        for body in ["", "....", "\n\n\n", "?!;.", "a b c d e f g"] {
            let outcome = extract_default(body);
            assert!(outcome.statements.is_empty());
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let body = "For patients with atrial fibrillation, initiate anticoagulation therapy. \
                    If INR exceeds 4.0, reduce the warfarin dose. Patients with diabetes should \
                    be screened for retinopathy annually.";
        let first = extract_default(body);
        let second = extract_default(body);
        assert_eq!(first.statements, second.statements);
        assert_eq!(first.stats, second.stats);
    }
}
