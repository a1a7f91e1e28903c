//! Coverage policy resolution.
//!
//! Merges layered policy sources (system default, project default, run
//! overrides) into one effective [`CoveragePolicy`]. Merge order is strictly
//! default, then project, then run, with run-level entries always winning.
//! The merge is key-by-key, so a project can override three categories while
//! inheriting the rest from the defaults.

use std::collections::BTreeMap;

use cds_types::policy::{CoveragePolicy, PolicySource, TierDefinition, TierName};
use cds_types::{CategoryGroup, CdsCategory};

use crate::types::PolicyError;

/// The built-in system default policy layer.
///
/// Tiers: `low` (1..2), `medium` (2..4), `high` (4..8), and the reserved
/// exclusion tier `none`. Safety/quality categories default to `medium`;
/// everything else inherits the `low` default tier.
pub fn system_default() -> PolicySource {
    let mut tier_definitions = BTreeMap::new();
    tier_definitions.insert(TierName::new("low"), TierDefinition::new(1, 2, 0.25));
    tier_definitions.insert(TierName::new("medium"), TierDefinition::new(2, 4, 0.4));
    tier_definitions.insert(TierName::new("high"), TierDefinition::new(4, 8, 0.75));
    tier_definitions.insert(TierName::none(), TierDefinition::new(0, 0, 0.0));

    let mut category_tier = BTreeMap::new();
    for category in CdsCategory::ALL {
        if category.group() == CategoryGroup::SafetyQuality {
            category_tier.insert(category, TierName::new("medium"));
        }
    }

    PolicySource {
        default_tier: Some(TierName::new("low")),
        tier_definitions,
        category_tier,
        category_overrides: BTreeMap::new(),
        scenario_overrides: BTreeMap::new(),
    }
}

/// Resolves the effective coverage policy for one run.
///
/// Validation is strict: every tier referenced anywhere must be defined,
/// every definition must have `min <= max` and a quality threshold in
/// `[0, 1]`. Any violation fails resolution with a descriptive error; no
/// partial or guessed policy is ever returned. A category assigned the
/// `none` tier is a valid, deliberate exclusion, not a configuration error.
pub fn resolve(
    default_source: &PolicySource,
    project_source: &PolicySource,
    run_overrides: &PolicySource,
) -> Result<CoveragePolicy, PolicyError> {
    let mut merged = PolicySource::default();
    for layer in [default_source, project_source, run_overrides] {
        merge_layer(&mut merged, layer);
    }

    let default_tier = merged.default_tier.clone().ok_or(PolicyError::UnknownTier {
        tier: String::new(),
        referenced_by: "default tier (no layer set one)".to_string(),
    })?;

    let policy = CoveragePolicy {
        default_tier,
        tier_definitions: merged.tier_definitions,
        category_tier: merged.category_tier,
        category_overrides: merged.category_overrides,
        scenario_overrides: merged.scenario_overrides,
    };

    validate(&policy)?;
    Ok(policy)
}

/// Merges one layer into the accumulator, key by key.
fn merge_layer(merged: &mut PolicySource, layer: &PolicySource) {
    if let Some(ref tier) = layer.default_tier {
        merged.default_tier = Some(tier.clone());
    }
    for (name, definition) in &layer.tier_definitions {
        merged
            .tier_definitions
            .insert(name.clone(), definition.clone());
    }
    for (category, tier) in &layer.category_tier {
        merged.category_tier.insert(*category, tier.clone());
    }
    for (category, tier) in &layer.category_overrides {
        merged.category_overrides.insert(*category, tier.clone());
    }
    for (scenario_id, tier) in &layer.scenario_overrides {
        merged.scenario_overrides.insert(*scenario_id, tier.clone());
    }
}

fn validate(policy: &CoveragePolicy) -> Result<(), PolicyError> {
    for (name, definition) in &policy.tier_definitions {
        if definition.min_per_category > definition.max_per_category {
            return Err(PolicyError::InvalidBounds {
                tier: name.as_str().to_string(),
                min: definition.min_per_category,
                max: definition.max_per_category,
            });
        }
        if !(0.0..=1.0).contains(&definition.quality_threshold) {
            return Err(PolicyError::InvalidThreshold {
                tier: name.as_str().to_string(),
                value: definition.quality_threshold,
            });
        }
    }

    let check_defined = |tier: &TierName, referenced_by: String| {
        if policy.tier_definitions.contains_key(tier) {
            Ok(())
        } else {
            Err(PolicyError::UnknownTier {
                tier: tier.as_str().to_string(),
                referenced_by,
            })
        }
    };

    check_defined(&policy.default_tier, "default tier".to_string())?;
    for (category, tier) in &policy.category_tier {
        check_defined(tier, format!("category '{}'", category))?;
    }
    for (category, tier) in &policy.category_overrides {
        check_defined(tier, format!("override for category '{}'", category))?;
    }
    for (scenario_id, tier) in &policy.scenario_overrides {
        check_defined(tier, format!("override for scenario {}", scenario_id))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_only() {
        let policy = resolve(
            &system_default(),
            &PolicySource::default(),
            &PolicySource::default(),
        )
        .unwrap();

        assert_eq!(policy.default_tier.as_str(), "low");
        assert_eq!(
            policy.tier_for(CdsCategory::DrugInteraction).as_str(),
            "medium"
        );
        assert_eq!(policy.tier_for(CdsCategory::Screening).as_str(), "low");
        assert!(policy.definition_for(CdsCategory::Screening).is_some());
    }

    #[test]
    fn test_key_by_key_merge_inherits_unset_entries() {
        let mut project = PolicySource::default();
        project
            .category_tier
            .insert(CdsCategory::Screening, TierName::new("high"));

        let mut run = PolicySource::default();
        run.category_overrides
            .insert(CdsCategory::DrugInteraction, TierName::none());

        let policy = resolve(&system_default(), &project, &run).unwrap();

        // Project layer changed one category; the rest inherit.
        assert_eq!(policy.tier_for(CdsCategory::Screening).as_str(), "high");
        assert_eq!(
            policy.tier_for(CdsCategory::DoseGuidance).as_str(),
            "medium"
        );
        // Run layer wins over everything.
        assert!(policy.is_excluded(CdsCategory::DrugInteraction));
    }

    #[test]
    fn test_run_layer_wins_over_project() {
        let mut project = PolicySource::default();
        project
            .category_tier
            .insert(CdsCategory::Immunization, TierName::new("high"));

        let mut run = PolicySource::default();
        run.category_tier
            .insert(CdsCategory::Immunization, TierName::new("medium"));

        let policy = resolve(&system_default(), &project, &run).unwrap();
        assert_eq!(policy.tier_for(CdsCategory::Immunization).as_str(), "medium");
    }

    #[test]
    fn test_unknown_tier_fails_resolution() {
        let mut run = PolicySource::default();
        run.category_tier
            .insert(CdsCategory::Screening, TierName::new("platinum"));

        let err = resolve(&system_default(), &PolicySource::default(), &run).unwrap_err();
        match err {
            PolicyError::UnknownTier { tier, referenced_by } => {
                assert_eq!(tier, "platinum");
                assert!(referenced_by.contains("screening"));
            }
            other => panic!("expected UnknownTier, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bounds_fail_resolution() {
        let mut run = PolicySource::default();
        run.tier_definitions
            .insert(TierName::new("broken"), TierDefinition::new(5, 2, 0.5));

        let err = resolve(&system_default(), &PolicySource::default(), &run).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidBounds { min: 5, max: 2, .. }));
    }

    #[test]
    fn test_invalid_threshold_fails_resolution() {
        let mut run = PolicySource::default();
        run.tier_definitions
            .insert(TierName::new("broken"), TierDefinition::new(1, 2, 1.5));

        let err = resolve(&system_default(), &PolicySource::default(), &run).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_none_tier_is_not_an_error() {
        let mut run = PolicySource::default();
        run.category_tier
            .insert(CdsCategory::SharedDecisionMaking, TierName::none());

        let policy = resolve(&system_default(), &PolicySource::default(), &run).unwrap();
        assert!(policy.is_excluded(CdsCategory::SharedDecisionMaking));
    }
}
