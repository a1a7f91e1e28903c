//! Pipeline-specific types: errors, stage configuration, and diagnostics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cds_types::{CdsCategory, SectionId, UnknownCategoryError};
use thiserror::Error;

/// Errors raised while loading or compiling rule tables.
#[derive(Error, Debug)]
pub enum RuleTableError {
    /// I/O error reading a rule table file.
    #[error("IO error reading rule table: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level parsing error.
    #[error("rule table parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Header has fewer columns than expected.
    #[error("invalid rule table header: expected {expected} columns, found {found}")]
    InvalidHeader {
        /// Expected column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// Header column name mismatch.
    #[error("unexpected column '{found}' at position {position}, expected '{expected}'")]
    UnexpectedColumn {
        /// The column position.
        position: usize,
        /// Expected column name.
        expected: String,
        /// Found column name.
        found: String,
    },

    /// A field value could not be parsed.
    #[error("invalid value '{value}' in column '{column}' of rule '{rule_id}'")]
    InvalidField {
        /// The rule the bad value belongs to.
        rule_id: String,
        /// The column name.
        column: String,
        /// The offending value.
        value: String,
    },

    /// A regex pattern failed to compile.
    #[error("invalid pattern in rule '{rule_id}': {source}")]
    InvalidPattern {
        /// The rule carrying the bad pattern.
        rule_id: String,
        /// The regex compilation error.
        #[source]
        source: Box<regex::Error>,
    },

    /// A category code in the table is not part of the taxonomy.
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),

    /// Two rules share an id.
    #[error("duplicate rule id: '{rule_id}'")]
    DuplicateRuleId {
        /// The repeated id.
        rule_id: String,
    },
}

/// Errors raised while resolving a coverage policy.
///
/// Resolution is all-or-nothing: any violation fails the whole merge and no
/// partial or guessed policy is ever returned.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A tier is referenced but never defined.
    #[error("tier '{tier}' referenced by {referenced_by} is not defined")]
    UnknownTier {
        /// The undefined tier name.
        tier: String,
        /// What referenced it (a category, override, or the default tier).
        referenced_by: String,
    },

    /// A tier definition has min above max.
    #[error("tier '{tier}' has min_per_category {min} greater than max_per_category {max}")]
    InvalidBounds {
        /// The offending tier.
        tier: String,
        /// The minimum bound.
        min: usize,
        /// The maximum bound.
        max: usize,
    },

    /// A tier's quality threshold is outside `[0, 1]`.
    #[error("tier '{tier}' has quality threshold {value} outside [0, 1]")]
    InvalidThreshold {
        /// The offending tier.
        tier: String,
        /// The out-of-range value.
        value: f64,
    },
}

/// Errors raised by the pipeline.
///
/// Input validation and policy configuration errors are returned to the
/// caller; soft gaps never surface here (they live in the coverage report);
/// invariant violations are a distinct, fatal class so callers can alert
/// rather than retry.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fewer sections than ingestion-level validation allows.
    #[error("too few guideline sections: found {found}, at least {required} required")]
    TooFewSections {
        /// Sections supplied.
        found: usize,
        /// Minimum required.
        required: usize,
    },

    /// A section's body text is below the minimum length.
    #[error("section '{section_id}' is too short: {length} chars, at least {required} required")]
    SectionTooShort {
        /// The offending section.
        section_id: SectionId,
        /// Its body length in characters.
        length: usize,
        /// Minimum required length.
        required: usize,
    },

    /// Two sections share an id.
    #[error("duplicate section id: '{section_id}'")]
    DuplicateSectionId {
        /// The repeated id.
        section_id: SectionId,
    },

    /// No generation mode was enabled.
    #[error("no generation mode enabled")]
    NoModesEnabled,

    /// Coverage policy resolution failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Rule table loading failed.
    #[error(transparent)]
    RuleTable(#[from] RuleTableError),

    /// The run was cancelled before the reconciliation barrier.
    #[error("run cancelled")]
    Cancelled,

    /// An internal invariant was violated. Programming-defect class: the run
    /// aborts rather than producing an inventory with unverifiable provenance.
    #[error("internal invariant violated: {detail}")]
    Invariant {
        /// Description of the violated invariant.
        detail: String,
    },
}

impl PipelineError {
    /// Returns true for the programming-defect error class that should alert
    /// rather than be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant { .. })
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Configuration for the decision extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Sentences with fewer tokens than this are skipped as unparsed.
    pub min_sentence_tokens: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_sentence_tokens: 4,
        }
    }
}

/// Configuration for the CDS classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Category assigned when no rule matches but the statement carries a
    /// recognized action verb. `None` surfaces such statements as
    /// unclassified instead.
    pub default_category: Option<CdsCategory>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_category: Some(CdsCategory::TreatmentRecommendation),
        }
    }
}

impl ClassifierConfig {
    /// Creates a config with the default-category fallback disabled, so
    /// zero-match statements always surface as unclassified.
    pub fn strict() -> Self {
        Self {
            default_category: None,
        }
    }
}

/// Configuration for the deduplicator/reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Token-overlap similarity above which two same-category scenarios are
    /// considered duplicates.
    pub similarity_threshold: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Extractor settings.
    pub extractor: ExtractorConfig,
    /// Classifier settings.
    pub classifier: ClassifierConfig,
    /// Reconciler settings.
    pub reconciler: ReconcilerConfig,
    /// Minimum number of sections per request.
    pub min_sections: usize,
    /// Minimum body length per section, in characters.
    pub min_section_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            classifier: ClassifierConfig::default(),
            reconciler: ReconcilerConfig::default(),
            min_sections: 3,
            min_section_chars: 1000,
        }
    }
}

/// Extraction diagnostics for one section or an aggregated run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Sentences seen.
    pub sentences_total: usize,
    /// Decision statements extracted.
    pub statements_extracted: usize,
    /// Sentences skipped (too short, no action verb, or no rule matched).
    pub unparsed_sentences: usize,
}

impl ExtractionStats {
    /// Merges another stats value into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.sentences_total += other.sentences_total;
        self.statements_extracted += other.statements_extracted;
        self.unparsed_sentences += other.unparsed_sentences;
    }
}

/// Cooperative cancellation handle for a pipeline run.
///
/// A run may be cancelled at any point before the reconciliation barrier;
/// partial per-section work is discarded, never partially merged.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_sections, 3);
        assert_eq!(config.min_section_chars, 1000);
        assert_eq!(config.extractor.min_sentence_tokens, 4);
        assert_eq!(config.reconciler.similarity_threshold, 0.85);
        assert_eq!(
            config.classifier.default_category,
            Some(CdsCategory::TreatmentRecommendation)
        );
        assert_eq!(ClassifierConfig::strict().default_category, None);
    }

    #[test]
    fn test_invariant_is_fatal() {
        let err = PipelineError::Invariant {
            detail: "span out of bounds".to_string(),
        };
        assert!(err.is_fatal());

        let err = PipelineError::TooFewSections {
            found: 1,
            required: 3,
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_stats_merge() {
        let mut a = ExtractionStats {
            sentences_total: 10,
            statements_extracted: 4,
            unparsed_sentences: 6,
        };
        let b = ExtractionStats {
            sentences_total: 5,
            statements_extracted: 2,
            unparsed_sentences: 3,
        };
        a.merge(&b);
        assert_eq!(a.sentences_total, 15);
        assert_eq!(a.statements_extracted, 6);
        assert_eq!(a.unparsed_sentences, 9);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
