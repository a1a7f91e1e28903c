//! CDS classifier.
//!
//! Assigns each decision statement to zero or more CDS categories using the
//! keyword/phrase rules of a [`RuleSet`]. Condition-side and action-side
//! rules are applied independently; all firing categories are kept
//! (multi-label), each traceable to the rule id that matched.

use std::collections::BTreeSet;

use cds_types::{ClassificationResult, DecisionStatement, DEFAULT_RULE_ID};

use crate::rules::{contains_action_verb, RuleSet, RuleSide};
use crate::types::ClassifierConfig;

/// Classifies one decision statement.
///
/// Default policy: if and only if zero categories match but the statement
/// carries a recognized action verb, the configured default category is
/// assigned and `matched_rules` is flagged as `[default]`. Without an action
/// verb the statement stays unclassified; it is surfaced in the coverage
/// report, never silently dropped.
pub fn classify(
    statement: &DecisionStatement,
    rules: &RuleSet,
    config: &ClassifierConfig,
) -> ClassificationResult {
    let condition = statement.condition_text.to_lowercase();
    let action = statement.action_text.to_lowercase();

    let mut categories = BTreeSet::new();
    let mut matched_rules = Vec::new();

    for rule in rules.classification_rules() {
        let fired = match rule.side {
            RuleSide::Condition => condition.contains(&rule.phrase),
            RuleSide::Action => action.contains(&rule.phrase),
            RuleSide::Any => condition.contains(&rule.phrase) || action.contains(&rule.phrase),
        };
        if fired {
            categories.insert(rule.category);
            matched_rules.push(rule.id.clone());
        }
    }

    if categories.is_empty() {
        if let Some(default_category) = config.default_category {
            if contains_action_verb(&statement.action_text) {
                categories.insert(default_category);
                matched_rules.push(DEFAULT_RULE_ID.to_string());
            }
        }
    }

    ClassificationResult {
        decision_statement_id: statement.id.clone(),
        categories,
        matched_rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cds_types::{CdsCategory, SourceSpan};

    fn make_statement(condition: &str, action: &str) -> DecisionStatement {
        DecisionStatement {
            id: "s1:0".to_string(),
            section_id: "s1".to_string(),
            condition_text: condition.to_string(),
            action_text: action.to_string(),
            source_span: SourceSpan::new(0, 10),
        }
    }

    fn classify_default(condition: &str, action: &str) -> ClassificationResult {
        let rules = RuleSet::builtin().unwrap();
        classify(
            &make_statement(condition, action),
            &rules,
            &ClassifierConfig::default(),
        )
    }

    #[test]
    fn test_treatment_recommendation_via_rules() {
        let result = classify_default(
            "systolic BP \u{2265} 140 mmHg",
            "initiate ACE inhibitor therapy",
        );
        assert_eq!(
            result.categories,
            BTreeSet::from([CdsCategory::TreatmentRecommendation])
        );
        assert!(!result.used_default());
        assert!(result.matched_rules.iter().any(|r| r == "cls_tx_01"));
    }

    #[test]
    fn test_multi_label() {
        let result = classify_default(
            "patients with chronic kidney disease on an ACE inhibitor",
            "reduce the starting dose and monitor serum potassium",
        );
        assert!(result.categories.contains(&CdsCategory::DoseGuidance));
        assert!(result
            .categories
            .contains(&CdsCategory::AdverseEventMonitoring));
        assert!(result
            .categories
            .contains(&CdsCategory::ChronicDiseaseManagement));
        assert_eq!(result.matched_rules.len(), result.categories.len());
    }

    #[test]
    fn test_condition_side_rule_only_sees_condition() {
        // "renal impairment" is a condition-side phrase; in the action it
        // must not fire the dose_guidance condition rule.
        let result = classify_default("age over 75", "discuss renal impairment risks");
        assert!(result.matched_rules.iter().all(|r| r != "cls_dose_04"));
    }

    #[test]
    fn test_default_fallback_requires_action_verb() {
        // No keyword rule fires, but the action carries a verb.
        let result = classify_default("unusual presentation", "begin supportive care");
        assert_eq!(
            result.categories,
            BTreeSet::from([CdsCategory::TreatmentRecommendation])
        );
        assert!(result.used_default());

        // No keyword rule fires and there is no action verb either.
        let result = classify_default("unusual presentation", "supportive care");
        assert!(result.is_unclassified());
        assert!(result.matched_rules.is_empty());
    }

    #[test]
    fn test_strict_config_surfaces_unclassified() {
        let rules = RuleSet::builtin().unwrap();
        let statement = make_statement("unusual presentation", "begin supportive care");
        let result = classify(&statement, &rules, &ClassifierConfig::strict());
        assert!(result.is_unclassified());
    }

    #[test]
    fn test_rule_trace_order_is_table_order() {
        let result = classify_default(
            "patients due for screening",
            "schedule a follow-up colonoscopy",
        );
        // screening fires before follow_up_scheduling in table order.
        let screen_pos = result
            .matched_rules
            .iter()
            .position(|r| r == "cls_screen_01")
            .unwrap();
        let fup_pos = result
            .matched_rules
            .iter()
            .position(|r| r == "cls_fup_01")
            .unwrap();
        assert!(screen_pos < fup_pos);
    }
}
