//! Plan tier to capability resolution.
//!
//! Each tier has a fixed table. A school's stored [`FeatureFlag`] rows, when
//! present, are laid over its tier table. Without overrides, an expired
//! subscription falls back to the free table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Feature, FeatureFlag, PlanTier, School};

const FREE: &[(Feature, bool)] = &[
    (Feature::Notices, true),
    (Feature::Gallery, true),
    (Feature::StaffDirectory, true),
    (Feature::Achievements, false),
    (Feature::Admissions, false),
    (Feature::CustomPages, false),
    (Feature::CustomDomain, false),
    (Feature::SslCertificate, false),
    (Feature::WhoisPrivacy, false),
    (Feature::DomainTransfer, false),
    (Feature::SeoTools, false),
    (Feature::Analytics, false),
    (Feature::PremiumTemplates, false),
    (Feature::RemoveBranding, false),
];

const BASIC: &[(Feature, bool)] = &[
    (Feature::Notices, true),
    (Feature::Gallery, true),
    (Feature::StaffDirectory, true),
    (Feature::Achievements, true),
    (Feature::Admissions, true),
    (Feature::CustomPages, true),
    (Feature::CustomDomain, false),
    (Feature::SslCertificate, false),
    (Feature::WhoisPrivacy, false),
    (Feature::DomainTransfer, false),
    (Feature::SeoTools, true),
    (Feature::Analytics, false),
    (Feature::PremiumTemplates, false),
    (Feature::RemoveBranding, false),
];

const STANDARD: &[(Feature, bool)] = &[
    (Feature::Notices, true),
    (Feature::Gallery, true),
    (Feature::StaffDirectory, true),
    (Feature::Achievements, true),
    (Feature::Admissions, true),
    (Feature::CustomPages, true),
    (Feature::CustomDomain, true),
    (Feature::SslCertificate, true),
    (Feature::WhoisPrivacy, false),
    (Feature::DomainTransfer, false),
    (Feature::SeoTools, true),
    (Feature::Analytics, true),
    (Feature::PremiumTemplates, false),
    (Feature::RemoveBranding, false),
];

const PREMIUM: &[(Feature, bool)] = &[
    (Feature::Notices, true),
    (Feature::Gallery, true),
    (Feature::StaffDirectory, true),
    (Feature::Achievements, true),
    (Feature::Admissions, true),
    (Feature::CustomPages, true),
    (Feature::CustomDomain, true),
    (Feature::SslCertificate, true),
    (Feature::WhoisPrivacy, true),
    (Feature::DomainTransfer, true),
    (Feature::SeoTools, true),
    (Feature::Analytics, true),
    (Feature::PremiumTemplates, true),
    (Feature::RemoveBranding, true),
];

/// Returns the static feature table of a plan tier.
#[must_use]
pub fn plan_features(tier: PlanTier) -> &'static [(Feature, bool)] {
    match tier {
        PlanTier::Free => FREE,
        PlanTier::Basic => BASIC,
        PlanTier::Standard => STANDARD,
        PlanTier::Premium => PREMIUM,
    }
}

/// The resolved capabilities of one school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet(BTreeMap<Feature, bool>);

impl FeatureSet {
    fn from_table(table: &[(Feature, bool)]) -> Self {
        Self(table.iter().copied().collect())
    }

    #[must_use]
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.0.get(&feature).copied().unwrap_or(false)
    }

    /// Feature names mapped to their state, for JSON responses.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        self.0.iter().map(|(f, on)| (f.as_str(), *on)).collect()
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Resolves the effective features of `school` at `now`.
#[must_use]
pub fn resolve(school: &School, overrides: &[FeatureFlag], now: DateTime<Utc>) -> FeatureSet {
    if !overrides.is_empty() {
        let mut set = FeatureSet::from_table(plan_features(school.plan));
        for flag in overrides {
            set.0.insert(flag.feature, flag.is_enabled);
        }
        return set;
    }

    let expired = school.subscription_ends.is_some_and(|ends| ends <= now);
    let tier = if expired { PlanTier::Free } else { school.plan };
    FeatureSet::from_table(plan_features(tier))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn school(plan: PlanTier) -> School {
        let mut school = School::new(
            "school-1".to_string(),
            "Greenwood High".to_string(),
            "greenwood".to_string(),
            Utc::now(),
        );
        school.plan = plan;
        school
    }

    #[test]
    fn test_every_table_covers_every_feature() {
        for tier in PlanTier::ALL {
            let table = plan_features(*tier);
            assert_eq!(table.len(), Feature::ALL.len(), "{tier} table incomplete");
            for feature in Feature::ALL {
                assert!(table.iter().any(|(f, _)| f == feature));
            }
        }
    }

    #[test]
    fn test_basic_lacks_custom_domain_premium_has_it() {
        let now = Utc::now();
        let basic = resolve(&school(PlanTier::Basic), &[], now);
        assert!(!basic.is_enabled(Feature::CustomDomain));

        let premium = resolve(&school(PlanTier::Premium), &[], now);
        assert!(premium.is_enabled(Feature::CustomDomain));
    }

    #[test]
    fn test_expired_subscription_falls_back_to_free() {
        let now = Utc::now();
        let mut school = school(PlanTier::Premium);
        school.subscription_ends = Some(now - Duration::days(1));

        let set = resolve(&school, &[], now);
        assert!(!set.is_enabled(Feature::CustomDomain));
        assert!(set.is_enabled(Feature::Notices));

        school.subscription_ends = Some(now + Duration::days(1));
        assert!(resolve(&school, &[], now).is_enabled(Feature::CustomDomain));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let now = Utc::now();
        let school = school(PlanTier::Basic);
        let flags = vec![FeatureFlag {
            school_id: school.id.clone(),
            feature: Feature::CustomDomain,
            is_enabled: true,
            updated_at: now,
        }];

        let set = resolve(&school, &flags, now);
        assert!(set.is_enabled(Feature::CustomDomain));
        assert!(set.is_enabled(Feature::Admissions));
        assert!(!set.is_enabled(Feature::WhoisPrivacy));
    }

    #[test]
    fn test_serializes_as_name_map() {
        let set = resolve(&school(PlanTier::Free), &[], Utc::now());
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["custom_domain"], false);
        assert_eq!(json["notices"], true);
    }
}
