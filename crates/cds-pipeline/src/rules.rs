//! Rule tables for extraction and classification.
//!
//! Categories and keyword lists are versioned data, not code: both the
//! extraction pattern table and the classification keyword table are
//! tab-delimited files with a header row. Adding a category or a pattern is a
//! data change; the dispatch logic never changes.
//!
//! Built-in versioned defaults ship embedded in the crate; external tables
//! can be loaded from disk to replace them.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use regex::Regex;

use cds_types::{CdsCategory, RuleId};

use crate::types::RuleTableError;

/// Embedded default extraction pattern table (versioned).
const EXTRACTION_RULES_V1: &str = include_str!("../data/extraction_rules_v1.tsv");

/// Embedded default classification keyword table (versioned).
const CLASSIFICATION_RULES_V1: &str = include_str!("../data/classification_rules_v1.tsv");

/// Verb stems that mark a sentence as carrying an imperative or
/// recommendation. A statement without one of these is never given the
/// default category, and a sentence without one is skipped as unparsed.
const ACTION_VERB_STEMS: &[&str] = &[
    "administer",
    "adjust",
    "assess",
    "avoid",
    "begin",
    "check",
    "consider",
    "consult",
    "continu",
    "counsel",
    "discontinu",
    "discuss",
    "document",
    "educat",
    "evaluat",
    "immuniz",
    "initiat",
    "measur",
    "monitor",
    "obtain",
    "offer",
    "order",
    "perform",
    "prescrib",
    "recommend",
    "recheck",
    "reduc",
    "refer",
    "repeat",
    "review",
    "schedul",
    "screen",
    "start",
    "stop",
    "test",
    "titrat",
    "undergo",
    "vaccinat",
];

/// Returns true if any token of `text` starts with a recognized action verb
/// stem.
pub fn contains_action_verb(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .any(|token| {
            let token = token.to_lowercase();
            ACTION_VERB_STEMS.iter().any(|stem| token.starts_with(stem))
        })
}

/// Trait for record types parsed from a rule table.
pub trait RuleRecord: Sized {
    /// Expected column names for this table.
    const EXPECTED_COLUMNS: &'static [&'static str];

    /// Parse a record from a CSV StringRecord.
    fn from_record(record: &StringRecord) -> Result<Self, RuleTableError>;
}

/// A header-validating parser for tab-delimited rule tables.
pub struct RuleTableParser<R: Read, T: RuleRecord> {
    reader: Reader<R>,
    _marker: PhantomData<T>,
}

impl<R: Read, T: RuleRecord> std::fmt::Debug for RuleTableParser<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTableParser").finish_non_exhaustive()
    }
}

impl<R: Read, T: RuleRecord> RuleTableParser<R, T> {
    /// Creates a parser from a reader, validating the header row.
    pub fn from_reader(reader: R) -> Result<Self, RuleTableError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::None)
            .from_reader(reader);

        Self::validate_headers(&mut csv_reader)?;

        Ok(Self {
            reader: csv_reader,
            _marker: PhantomData,
        })
    }

    fn validate_headers(reader: &mut Reader<R>) -> Result<(), RuleTableError> {
        let headers = reader.headers()?;
        let expected = T::EXPECTED_COLUMNS;

        if headers.len() < expected.len() {
            return Err(RuleTableError::InvalidHeader {
                expected: expected.len(),
                found: headers.len(),
            });
        }

        for (i, expected_col) in expected.iter().enumerate() {
            let found = headers.get(i).unwrap_or("");
            // Handle UTF-8 BOM at start of file
            let found = found.trim_start_matches('\u{feff}');
            if found != *expected_col {
                return Err(RuleTableError::UnexpectedColumn {
                    position: i,
                    expected: expected_col.to_string(),
                    found: found.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Parses all records into a Vec.
    pub fn parse_all(mut self) -> Result<Vec<T>, RuleTableError> {
        let mut results = Vec::new();
        let mut record = StringRecord::new();
        while self.reader.read_record(&mut record)? {
            if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            results.push(T::from_record(&record)?);
        }
        Ok(results)
    }
}

fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("")
}

/// One row of the extraction pattern table, before pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRuleRow {
    /// Rule identifier.
    pub id: RuleId,
    /// Priority within the rule's family; lower values are tried first.
    pub priority: u32,
    /// Rule family. A sentence yields at most one statement per family.
    pub family: String,
    /// Regex source with named groups `cond` and `action`.
    pub pattern: String,
}

impl RuleRecord for ExtractionRuleRow {
    const EXPECTED_COLUMNS: &'static [&'static str] = &["id", "priority", "family", "pattern"];

    fn from_record(record: &StringRecord) -> Result<Self, RuleTableError> {
        let id = field(record, 0).to_string();
        let priority_raw = field(record, 1);
        let priority =
            priority_raw
                .parse::<u32>()
                .map_err(|_| RuleTableError::InvalidField {
                    rule_id: id.clone(),
                    column: "priority".to_string(),
                    value: priority_raw.to_string(),
                })?;

        Ok(Self {
            id,
            priority,
            family: field(record, 2).to_string(),
            pattern: field(record, 3).to_string(),
        })
    }
}

/// A compiled extraction pattern rule.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Priority within the rule's family; lower values are tried first.
    pub priority: u32,
    /// Rule family.
    pub family: String,
    /// Compiled pattern with named groups `cond` and `action`.
    pub pattern: Regex,
}

impl ExtractionRule {
    fn compile(row: ExtractionRuleRow) -> Result<Self, RuleTableError> {
        let pattern = Regex::new(&row.pattern).map_err(|e| RuleTableError::InvalidPattern {
            rule_id: row.id.clone(),
            source: Box::new(e),
        })?;

        // A pattern without both capture groups can never produce a statement.
        for group in ["cond", "action"] {
            if !pattern.capture_names().flatten().any(|name| name == group) {
                return Err(RuleTableError::InvalidField {
                    rule_id: row.id.clone(),
                    column: "pattern".to_string(),
                    value: format!("missing named group '{}'", group),
                });
            }
        }

        Ok(Self {
            id: row.id,
            priority: row.priority,
            family: row.family,
            pattern,
        })
    }
}

/// Which side of a decision statement a classification phrase applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSide {
    /// Match against the condition text only.
    Condition,
    /// Match against the action text only.
    Action,
    /// Match against either side.
    Any,
}

impl RuleSide {
    fn from_code(rule_id: &str, code: &str) -> Result<Self, RuleTableError> {
        match code {
            "condition" => Ok(Self::Condition),
            "action" => Ok(Self::Action),
            "any" => Ok(Self::Any),
            other => Err(RuleTableError::InvalidField {
                rule_id: rule_id.to_string(),
                column: "side".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// One keyword/phrase rule of the classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Rule identifier, recorded in `matched_rules` for traceability.
    pub id: RuleId,
    /// Category assigned when the phrase matches.
    pub category: CdsCategory,
    /// Which side of the statement the phrase applies to.
    pub side: RuleSide,
    /// Lowercased phrase matched as a substring.
    pub phrase: String,
}

impl RuleRecord for ClassificationRule {
    const EXPECTED_COLUMNS: &'static [&'static str] = &["id", "category", "side", "phrase"];

    fn from_record(record: &StringRecord) -> Result<Self, RuleTableError> {
        let id = field(record, 0).to_string();
        let category = CdsCategory::from_code(field(record, 1))?;
        let side = RuleSide::from_code(&id, field(record, 2))?;
        let phrase = field(record, 3).to_lowercase();

        if phrase.is_empty() {
            return Err(RuleTableError::InvalidField {
                rule_id: id,
                column: "phrase".to_string(),
                value: String::new(),
            });
        }

        Ok(Self {
            id,
            category,
            side,
            phrase,
        })
    }
}

/// The loaded extraction and classification rule tables for a run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    extraction: Vec<ExtractionRule>,
    classification: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Loads the embedded versioned default tables.
    pub fn builtin() -> Result<Self, RuleTableError> {
        Self::from_readers(
            EXTRACTION_RULES_V1.as_bytes(),
            CLASSIFICATION_RULES_V1.as_bytes(),
        )
    }

    /// Loads rule tables from two readers.
    pub fn from_readers<E: Read, C: Read>(
        extraction: E,
        classification: C,
    ) -> Result<Self, RuleTableError> {
        let rows = RuleTableParser::<_, ExtractionRuleRow>::from_reader(extraction)?.parse_all()?;
        check_unique_ids(rows.iter().map(|r| r.id.as_str()))?;

        let mut extraction: Vec<ExtractionRule> = rows
            .into_iter()
            .map(ExtractionRule::compile)
            .collect::<Result<_, _>>()?;
        // Deterministic application order: priority, then id.
        extraction.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        let classification =
            RuleTableParser::<_, ClassificationRule>::from_reader(classification)?.parse_all()?;
        check_unique_ids(classification.iter().map(|r| r.id.as_str()))?;

        Ok(Self {
            extraction,
            classification,
        })
    }

    /// Loads rule tables from two file paths.
    pub fn from_paths<P: AsRef<Path>>(
        extraction_path: P,
        classification_path: P,
    ) -> Result<Self, RuleTableError> {
        let extraction = BufReader::new(File::open(extraction_path)?);
        let classification = BufReader::new(File::open(classification_path)?);
        Self::from_readers(extraction, classification)
    }

    /// Extraction rules in deterministic application order.
    pub fn extraction_rules(&self) -> &[ExtractionRule] {
        &self.extraction
    }

    /// Classification rules in table order.
    pub fn classification_rules(&self) -> &[ClassificationRule] {
        &self.classification
    }
}

fn check_unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), RuleTableError> {
    let mut seen = std::collections::BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(RuleTableError::DuplicateRuleId {
                rule_id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_load() {
        let rules = RuleSet::builtin().unwrap();
        assert!(!rules.extraction_rules().is_empty());
        assert!(!rules.classification_rules().is_empty());

        // Every category in the taxonomy has at least one classification rule.
        for category in CdsCategory::ALL {
            assert!(
                rules
                    .classification_rules()
                    .iter()
                    .any(|r| r.category == category),
                "no classification rule for {}",
                category
            );
        }
    }

    #[test]
    fn test_extraction_rules_sorted_by_priority() {
        let rules = RuleSet::builtin().unwrap();
        let priorities: Vec<u32> = rules.extraction_rules().iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_header_validation() {
        let bad = "id\tpriority\tpattern\nx\t1\tfoo\n";
        let err =
            RuleTableParser::<_, ExtractionRuleRow>::from_reader(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, RuleTableError::InvalidHeader { .. }));

        let wrong = "id\tprio\tfamily\tpattern\nx\t1\tf\tp\n";
        let err =
            RuleTableParser::<_, ExtractionRuleRow>::from_reader(wrong.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RuleTableError::UnexpectedColumn { position: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let extraction = "id\tpriority\tfamily\tpattern\nbad\t10\tf\t(?P<cond>[\n";
        let classification = "id\tcategory\tside\tphrase\nc1\tscreening\tany\tscreen\n";
        let err = RuleSet::from_readers(extraction.as_bytes(), classification.as_bytes())
            .unwrap_err();
        assert!(matches!(err, RuleTableError::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_without_groups_rejected() {
        let extraction = "id\tpriority\tfamily\tpattern\nbad\t10\tf\t^no groups$\n";
        let classification = "id\tcategory\tside\tphrase\nc1\tscreening\tany\tscreen\n";
        let err = RuleSet::from_readers(extraction.as_bytes(), classification.as_bytes())
            .unwrap_err();
        assert!(matches!(err, RuleTableError::InvalidField { .. }));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let extraction = EXTRACTION_RULES_V1;
        let classification = "id\tcategory\tside\tphrase\nc1\tnot_a_category\tany\tx\n";
        let err = RuleSet::from_readers(extraction.as_bytes(), classification.as_bytes())
            .unwrap_err();
        assert!(matches!(err, RuleTableError::UnknownCategory(_)));
    }

    #[test]
    fn test_duplicate_rule_id_rejected() {
        let extraction = EXTRACTION_RULES_V1;
        let classification =
            "id\tcategory\tside\tphrase\nc1\tscreening\tany\tscreen\nc1\tscreening\tany\ttest\n";
        let err = RuleSet::from_readers(extraction.as_bytes(), classification.as_bytes())
            .unwrap_err();
        assert!(matches!(err, RuleTableError::DuplicateRuleId { .. }));
    }

    #[test]
    fn test_contains_action_verb() {
        assert!(contains_action_verb("initiate ACE inhibitor therapy"));
        assert!(contains_action_verb("Patients should be screened annually"));
        assert!(contains_action_verb("Prescribing a statin is recommended"));
        assert!(!contains_action_verb("hypertension is common in adults"));
        assert!(!contains_action_verb(""));
    }
}
