//! Classification result type.

use std::collections::BTreeSet;

use crate::{CdsCategory, RuleId, StatementId};

/// Rule id recorded when the classifier fell back to the default category
/// because no category rule matched but an action verb was present.
pub const DEFAULT_RULE_ID: &str = "default";

/// The categories assigned to one decision statement.
///
/// Classification is multi-label: zero, one, or many categories may fire.
/// `matched_rules` preserves the ordered trace of which rules fired, for
/// traceability. An empty `categories` set means the statement is
/// unclassified; it is excluded from synthesis and surfaced in the coverage
/// report, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassificationResult {
    /// The statement this result belongs to.
    pub decision_statement_id: StatementId,
    /// Categories assigned to the statement. BTreeSet gives deterministic
    /// iteration order.
    pub categories: BTreeSet<CdsCategory>,
    /// Ordered list of rule ids that matched.
    pub matched_rules: Vec<RuleId>,
}

impl ClassificationResult {
    /// Returns true if no category was assigned.
    pub fn is_unclassified(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns true if the default-category fallback produced this result.
    pub fn used_default(&self) -> bool {
        self.matched_rules.len() == 1 && self.matched_rules[0] == DEFAULT_RULE_ID
    }
}
