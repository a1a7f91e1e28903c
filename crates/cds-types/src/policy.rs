//! Coverage policy types.
//!
//! A coverage policy decides how many scenarios must be produced per CDS
//! category. Policies are layered: system defaults, project defaults, and
//! per-run overrides are merged key-by-key into one immutable
//! [`CoveragePolicy`] at the start of a run (highest-specificity layer wins).
//! The merge itself lives in the pipeline crate; this module holds the data
//! model.
//!
//! # Examples
//!
//! ```
//! use cds_types::policy::{TierDefinition, TierName};
//!
//! let medium = TierDefinition::new(2, 4, 0.7);
//! assert!(medium.allows(3));
//! assert!(!medium.allows(5));
//! assert_eq!(medium.clamp(10), 4);
//!
//! let none = TierName::none();
//! assert!(none.is_none());
//! ```

use std::collections::BTreeMap;

use crate::{CdsCategory, ScenarioId};

/// Name of a coverage tier, e.g. `low`, `medium`, `high`, `none`.
///
/// Tier names are open data rather than a closed enumeration so policy
/// layers can define new tiers without code changes. Only the `none` tier
/// has reserved semantics: it is a valid, deliberate exclusion of a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TierName(String);

impl TierName {
    /// The reserved name of the exclusion tier.
    pub const NONE: &'static str = "none";

    /// Creates a tier name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the `none` tier name.
    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    /// Returns the tier name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the reserved exclusion tier.
    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }
}

impl std::fmt::Display for TierName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The per-category bounds and quality bar of one coverage tier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierDefinition {
    /// Minimum scenarios required per category (inclusive).
    pub min_per_category: usize,
    /// Maximum scenarios kept per category (inclusive).
    pub max_per_category: usize,
    /// Minimum specificity quality required of a kept scenario, in `[0, 1]`.
    pub quality_threshold: f64,
}

impl TierDefinition {
    /// Creates a new tier definition.
    pub fn new(min_per_category: usize, max_per_category: usize, quality_threshold: f64) -> Self {
        Self {
            min_per_category,
            max_per_category,
            quality_threshold,
        }
    }

    /// Returns true if `count` scenarios satisfy this tier's bounds.
    pub fn allows(&self, count: usize) -> bool {
        count >= self.min_per_category && count <= self.max_per_category
    }

    /// Clamps a candidate count into `[min, max]`.
    pub fn clamp(&self, count: usize) -> usize {
        count.clamp(self.min_per_category, self.max_per_category)
    }

    /// Returns true if the bounds and threshold are internally consistent.
    pub fn is_valid(&self) -> bool {
        self.min_per_category <= self.max_per_category
            && (0.0..=1.0).contains(&self.quality_threshold)
    }
}

/// One un-merged policy layer (system default, project default, or run
/// overrides).
///
/// Every field may be partial; missing keys inherit from lower layers during
/// resolution.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicySource {
    /// Tier applied to categories with no explicit assignment.
    pub default_tier: Option<TierName>,
    /// Tier definitions introduced or replaced by this layer.
    pub tier_definitions: BTreeMap<TierName, TierDefinition>,
    /// Per-category tier assignments.
    pub category_tier: BTreeMap<CdsCategory, TierName>,
    /// Per-category overrides (highest category-level specificity).
    pub category_overrides: BTreeMap<CdsCategory, TierName>,
    /// Per-scenario overrides, keyed by scenario id in a prior inventory.
    pub scenario_overrides: BTreeMap<ScenarioId, TierName>,
}

impl PolicySource {
    /// Returns true if this layer carries no entries at all.
    pub fn is_empty(&self) -> bool {
        self.default_tier.is_none()
            && self.tier_definitions.is_empty()
            && self.category_tier.is_empty()
            && self.category_overrides.is_empty()
            && self.scenario_overrides.is_empty()
    }
}

/// The effective per-category coverage policy for one run.
///
/// Resolved once per run from layered [`PolicySource`]s; immutable after
/// resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoveragePolicy {
    /// Tier applied to categories with no explicit assignment.
    pub default_tier: TierName,
    /// All known tier definitions.
    pub tier_definitions: BTreeMap<TierName, TierDefinition>,
    /// Per-category tier assignments.
    pub category_tier: BTreeMap<CdsCategory, TierName>,
    /// Per-category overrides; win over `category_tier`.
    pub category_overrides: BTreeMap<CdsCategory, TierName>,
    /// Per-scenario overrides; win over everything for the named scenario.
    pub scenario_overrides: BTreeMap<ScenarioId, TierName>,
}

impl CoveragePolicy {
    /// Returns the effective tier for a category: override, then assignment,
    /// then the default tier.
    pub fn tier_for(&self, category: CdsCategory) -> &TierName {
        self.category_overrides
            .get(&category)
            .or_else(|| self.category_tier.get(&category))
            .unwrap_or(&self.default_tier)
    }

    /// Returns the effective tier for a specific scenario.
    pub fn tier_for_scenario(&self, scenario_id: ScenarioId, category: CdsCategory) -> &TierName {
        self.scenario_overrides
            .get(&scenario_id)
            .unwrap_or_else(|| self.tier_for(category))
    }

    /// Returns the tier definition governing a category.
    ///
    /// Resolution validates that every referenced tier is defined, so this
    /// returns `Some` for any policy produced by the resolver.
    pub fn definition_for(&self, category: CdsCategory) -> Option<&TierDefinition> {
        self.tier_definitions.get(self.tier_for(category))
    }

    /// Returns true if the category is deliberately excluded (`none` tier).
    pub fn is_excluded(&self, category: CdsCategory) -> bool {
        self.tier_for(category).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_policy() -> CoveragePolicy {
        let mut tier_definitions = BTreeMap::new();
        tier_definitions.insert(TierName::new("low"), TierDefinition::new(1, 2, 0.3));
        tier_definitions.insert(TierName::new("medium"), TierDefinition::new(2, 4, 0.5));
        tier_definitions.insert(TierName::none(), TierDefinition::new(0, 0, 0.0));

        let mut category_tier = BTreeMap::new();
        category_tier.insert(CdsCategory::DrugInteraction, TierName::new("medium"));

        let mut category_overrides = BTreeMap::new();
        category_overrides.insert(CdsCategory::Screening, TierName::none());

        CoveragePolicy {
            default_tier: TierName::new("low"),
            tier_definitions,
            category_tier,
            category_overrides,
            scenario_overrides: BTreeMap::new(),
        }
    }

    #[test]
    fn test_tier_resolution_order() {
        let policy = make_policy();
        assert_eq!(policy.tier_for(CdsCategory::DrugInteraction).as_str(), "medium");
        assert_eq!(policy.tier_for(CdsCategory::Screening).as_str(), "none");
        assert_eq!(policy.tier_for(CdsCategory::Immunization).as_str(), "low");
    }

    #[test]
    fn test_none_tier_is_exclusion() {
        let policy = make_policy();
        assert!(policy.is_excluded(CdsCategory::Screening));
        assert!(!policy.is_excluded(CdsCategory::DrugInteraction));
    }

    #[test]
    fn test_scenario_override_wins() {
        let mut policy = make_policy();
        policy.scenario_overrides.insert(7, TierName::none());
        assert!(policy
            .tier_for_scenario(7, CdsCategory::DrugInteraction)
            .is_none());
        assert_eq!(
            policy
                .tier_for_scenario(8, CdsCategory::DrugInteraction)
                .as_str(),
            "medium"
        );
    }

    #[test]
    fn test_tier_definition_bounds() {
        let tier = TierDefinition::new(2, 4, 0.5);
        assert!(tier.allows(2));
        assert!(tier.allows(4));
        assert!(!tier.allows(1));
        assert!(!tier.allows(5));
        assert_eq!(tier.clamp(0), 2);
        assert_eq!(tier.clamp(10), 4);
        assert!(tier.is_valid());
        assert!(!TierDefinition::new(3, 1, 0.5).is_valid());
        assert!(!TierDefinition::new(1, 2, 1.5).is_valid());
    }
}
