use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;
use crate::types::{
    Achievement, Admission, BillingCycle, DnsRecordType, Gallery, GalleryImage, Notice, Page,
    PlanTier, School, SchoolStatus, Staff, Template, TransferAction, User, UserRole,
    WebsiteSection,
};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub school_name: String,
    pub subdomain: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureSet>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSchoolRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Required when `password` is set.
    #[serde(default)]
    pub current_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateSchoolRequest {
    #[serde(default)]
    pub plan: Option<PlanTier>,
    #[serde(default)]
    pub status: Option<SchoolStatus>,
    #[serde(default)]
    pub subscription_ends: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureOverrideRequest {
    pub is_enabled: bool,
}

/// A platform catalog template, the only kind that can be premium.
#[derive(Debug, Deserialize)]
pub struct CreateCatalogTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCatalogTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<serde_json::Value>,
    pub is_premium: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AdminSchoolResponse {
    pub school: School,
    pub features: FeatureSet,
    pub overrides: Vec<crate::types::FeatureFlag>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub version: &'static str,
    pub table_counts: Vec<TableCount>,
    pub pending_tasks: i64,
    pub billing_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetDomainRequest {
    pub custom_domain: String,
}

#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub custom_domain: Option<String>,
    pub domain_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_record: Option<VerificationRecord>,
}

/// The TXT record a school must publish to prove domain ownership.
#[derive(Debug, Serialize)]
pub struct VerificationRecord {
    pub record_type: DnsRecordType,
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDnsRecordRequest {
    #[serde(default)]
    pub domain: Option<String>,
    pub record_type: DnsRecordType,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub priority: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDnsRecordRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DomainRequest {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub domain: String,
    #[serde(default)]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferActionRequest {
    pub action: TransferAction,
    #[serde(default)]
    pub auth_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub plan: PlanTier,
    #[serde(default = "default_cycle")]
    pub cycle: BillingCycle,
}

fn default_cycle() -> BillingCycle {
    BillingCycle::Monthly
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub plan: PlanTier,
    pub cycle: BillingCycle,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: PlanTier,
    pub monthly_price: i64,
    pub yearly_price: i64,
    pub currency: &'static str,
    pub features: Vec<&'static str>,
}

/// School fields shown on the public website.
#[derive(Debug, Serialize)]
pub struct PublicSchool {
    pub name: String,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub theme_color: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
}

impl From<&School> for PublicSchool {
    fn from(school: &School) -> Self {
        Self {
            name: school.name.clone(),
            subdomain: school.subdomain.clone(),
            custom_domain: school
                .custom_domain
                .clone()
                .filter(|_| school.domain_verified),
            tagline: school.tagline.clone(),
            logo_url: school.logo_url.clone(),
            email: school.email.clone(),
            phone: school.phone.clone(),
            address: school.address.clone(),
            theme_color: school.theme_color.clone(),
            seo_title: school.seo_title.clone(),
            seo_description: school.seo_description.clone(),
            seo_keywords: school.seo_keywords.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicGallery {
    #[serde(flatten)]
    pub gallery: Gallery,
    pub images: Vec<GalleryImage>,
}

/// Everything a visitor sees, restricted to visible content of enabled
/// features.
#[derive(Debug, Serialize)]
pub struct PublicSite {
    pub school: PublicSchool,
    pub show_branding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    pub sections: Vec<WebsiteSection>,
    pub notices: Vec<Notice>,
    pub galleries: Vec<PublicGallery>,
    pub achievements: Vec<Achievement>,
    pub staff: Vec<Staff>,
    pub pages: Vec<Page>,
    pub admissions: Vec<Admission>,
}
