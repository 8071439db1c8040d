use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Feature, PlanTier};

string_enum! {
    /// Publication state of a school website.
    pub enum SchoolStatus {
        Draft => "DRAFT",
        Published => "PUBLISHED",
        Suspended => "SUSPENDED",
    }
}

string_enum! {
    pub enum UserRole {
        /// Platform operator, not bound to any school.
        SuperAdmin => "SUPER_ADMIN",
        SchoolAdmin => "SCHOOL_ADMIN",
        Editor => "EDITOR",
    }
}

/// A tenant. Every other record is scoped to exactly one school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    pub domain_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    pub plan: PlanTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_ends: Option<DateTime<Utc>>,
    pub status: SchoolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_template_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    /// Builds a freshly signed-up school on the free plan.
    #[must_use]
    pub fn new(id: String, name: String, subdomain: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            subdomain,
            custom_domain: None,
            domain_verified: false,
            verification_token: None,
            plan: PlanTier::Free,
            subscription_ends: None,
            status: SchoolStatus::Draft,
            tagline: None,
            logo_url: None,
            email: None,
            phone: None,
            address: None,
            theme_color: None,
            seo_title: None,
            seo_description: None,
            seo_keywords: None,
            active_template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The platform hostname of this school, e.g. `greenwood.schoolhub.site`.
    #[must_use]
    pub fn platform_host(&self, suffix: &str) -> String {
        format!("{}.{}", self.subdomain, suffix)
    }
}

/// Columns to change on a school row. `None` leaves the stored value alone,
/// so concurrent writers touching other columns are not overwritten.
#[derive(Debug, Clone, Default)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub theme_color: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub active_template_id: Option<String>,
    pub domain: Option<DomainChange>,
    pub plan: Option<PlanTier>,
    pub status: Option<SchoolStatus>,
    pub subscription_ends: Option<DateTime<Utc>>,
}

/// Custom domain change. Both variants reset verification.
#[derive(Debug, Clone)]
pub enum DomainChange {
    Attach { domain: String, token: String },
    Detach,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session credential. The raw token is only shown once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A per-school override of one plan feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub school_id: String,
    pub feature: Feature,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}
