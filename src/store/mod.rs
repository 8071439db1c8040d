mod ordering;
mod schema;
mod sqlite;

pub use ordering::OrderedTable;
pub use sqlite::SqliteStore;
#[cfg(test)]
pub(crate) use sqlite::test_support;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store:
    TenantStore + ContentStore + DomainStore + LifecycleStore + BillingStore + Send + Sync
{
    fn initialize(&self) -> Result<()>;

    fn close(&self) -> Result<()>;
}

pub trait TenantStore {
    // School operations
    fn create_school(&self, school: &School) -> Result<()>;
    fn get_school(&self, id: &str) -> Result<Option<School>>;
    fn get_school_by_subdomain(&self, subdomain: &str) -> Result<Option<School>>;
    fn get_school_by_custom_domain(&self, domain: &str) -> Result<Option<School>>;
    fn list_schools(&self, cursor: &str, limit: i32) -> Result<Vec<School>>;
    /// Writes only the columns set in `update` and returns the stored row.
    fn update_school(&self, id: &str, update: &SchoolUpdate) -> Result<School>;
    /// DRAFT to PUBLISHED. Already published schools are returned as they
    /// are; suspended ones are a `Conflict`.
    fn publish_school(&self, id: &str) -> Result<School>;
    /// Marks the custom domain verified while `token` is still the current
    /// verification token.
    fn verify_custom_domain(&self, id: &str, token: &str) -> Result<School>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_school_users(&self, school_id: &str) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn has_platform_admin(&self) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Feature flag overrides
    fn list_feature_flags(&self, school_id: &str) -> Result<Vec<FeatureFlag>>;
    fn upsert_feature_flag(&self, flag: &FeatureFlag) -> Result<()>;
    fn delete_feature_flag(&self, school_id: &str, feature: Feature) -> Result<bool>;

    /// Row counts per table, for diagnostics.
    fn table_counts(&self) -> Result<Vec<(String, i64)>>;
}

/// Content resources. `create_*` on ordered resources assigns the next
/// `order` in the record's scope and writes it back into the record.
pub trait ContentStore {
    fn list_notices(&self, school_id: &str) -> Result<Vec<Notice>>;
    fn get_notice(&self, id: &str) -> Result<Option<Notice>>;
    fn create_notice(&self, notice: &mut Notice) -> Result<()>;
    fn update_notice(&self, notice: &Notice) -> Result<()>;
    fn delete_notice(&self, id: &str) -> Result<bool>;

    fn list_galleries(&self, school_id: &str) -> Result<Vec<Gallery>>;
    fn get_gallery(&self, id: &str) -> Result<Option<Gallery>>;
    fn create_gallery(&self, gallery: &mut Gallery) -> Result<()>;
    fn update_gallery(&self, gallery: &Gallery) -> Result<()>;
    fn delete_gallery(&self, id: &str) -> Result<bool>;

    fn list_gallery_images(&self, gallery_id: &str) -> Result<Vec<GalleryImage>>;
    fn get_gallery_image(&self, id: &str) -> Result<Option<GalleryImage>>;
    fn create_gallery_image(&self, image: &mut GalleryImage) -> Result<()>;
    fn update_gallery_image(&self, image: &GalleryImage) -> Result<()>;
    fn delete_gallery_image(&self, id: &str) -> Result<bool>;

    fn list_achievements(&self, school_id: &str) -> Result<Vec<Achievement>>;
    fn get_achievement(&self, id: &str) -> Result<Option<Achievement>>;
    fn create_achievement(&self, achievement: &mut Achievement) -> Result<()>;
    fn update_achievement(&self, achievement: &Achievement) -> Result<()>;
    fn delete_achievement(&self, id: &str) -> Result<bool>;

    fn list_staff(&self, school_id: &str) -> Result<Vec<Staff>>;
    fn get_staff(&self, id: &str) -> Result<Option<Staff>>;
    fn create_staff(&self, staff: &mut Staff) -> Result<()>;
    fn update_staff(&self, staff: &Staff) -> Result<()>;
    fn delete_staff(&self, id: &str) -> Result<bool>;

    fn list_pages(&self, school_id: &str) -> Result<Vec<Page>>;
    fn get_page(&self, id: &str) -> Result<Option<Page>>;
    fn get_page_by_slug(&self, school_id: &str, slug: &str) -> Result<Option<Page>>;
    fn create_page(&self, page: &mut Page) -> Result<()>;
    fn update_page(&self, page: &Page) -> Result<()>;
    fn delete_page(&self, id: &str) -> Result<bool>;

    fn list_sections(&self, school_id: &str) -> Result<Vec<WebsiteSection>>;
    fn get_section(&self, id: &str) -> Result<Option<WebsiteSection>>;
    fn create_section(&self, section: &mut WebsiteSection) -> Result<()>;
    fn update_section(&self, section: &WebsiteSection) -> Result<()>;
    fn delete_section(&self, id: &str) -> Result<bool>;

    /// Applies a batch of `{id, order}` pairs within one scope atomically.
    /// Fails with `NotFound` and changes nothing if any id is outside the scope.
    fn reorder(&self, table: OrderedTable, scope_id: &str, entries: &[OrderEntry]) -> Result<()>;

    fn list_admissions(&self, school_id: &str) -> Result<Vec<Admission>>;
    fn get_admission(&self, id: &str) -> Result<Option<Admission>>;
    fn create_admission(&self, admission: &Admission) -> Result<()>;
    fn update_admission(&self, admission: &Admission) -> Result<()>;
    fn delete_admission(&self, id: &str) -> Result<bool>;

    fn list_enquiries(&self, school_id: &str) -> Result<Vec<AdmissionEnquiry>>;
    fn get_enquiry(&self, id: &str) -> Result<Option<AdmissionEnquiry>>;
    fn create_enquiry(&self, enquiry: &AdmissionEnquiry) -> Result<()>;
    fn update_enquiry(&self, enquiry: &AdmissionEnquiry) -> Result<()>;
    fn delete_enquiry(&self, id: &str) -> Result<bool>;

    /// The school's own templates after the platform catalog.
    fn list_templates(&self, school_id: &str) -> Result<Vec<Template>>;
    fn list_catalog_templates(&self) -> Result<Vec<Template>>;
    fn get_template(&self, id: &str) -> Result<Option<Template>>;
    fn create_template(&self, template: &Template) -> Result<()>;
    fn update_template(&self, template: &Template) -> Result<()>;
    fn delete_template(&self, id: &str) -> Result<bool>;
}

/// Reads and deletes for domain entities. Inserts and status changes go
/// through [`LifecycleStore::commit_transition`] so that every change is
/// logged.
pub trait DomainStore {
    // DNS records
    fn list_dns_records(&self, school_id: &str) -> Result<Vec<DnsRecord>>;
    fn get_dns_record(&self, id: &str) -> Result<Option<DnsRecord>>;
    fn delete_dns_record(&self, id: &str) -> Result<bool>;

    // Domain transfers
    fn list_transfers(&self, school_id: &str) -> Result<Vec<DomainTransfer>>;
    fn get_transfer(&self, id: &str) -> Result<Option<DomainTransfer>>;

    // SSL certificates
    fn list_ssl_certificates(&self, school_id: &str) -> Result<Vec<SslCertificate>>;
    fn get_ssl_certificate(&self, id: &str) -> Result<Option<SslCertificate>>;
    fn delete_ssl_certificate(&self, id: &str) -> Result<bool>;

    // WHOIS privacy
    fn list_whois_privacy(&self, school_id: &str) -> Result<Vec<WhoisPrivacy>>;
    fn get_whois_privacy(&self, id: &str) -> Result<Option<WhoisPrivacy>>;
    fn get_whois_privacy_by_domain(&self, domain: &str) -> Result<Option<WhoisPrivacy>>;

    // Transition log
    fn list_events(&self, kind: EntityKind, entity_id: &str) -> Result<Vec<LifecycleEvent>>;
}

/// Durable queue of delayed lifecycle transitions.
pub trait LifecycleStore {
    /// Applies the entity write, appends the event and enqueues the
    /// follow-up task in one transaction. A guarded update whose row no
    /// longer holds the expected status fails with `Conflict` and writes
    /// nothing.
    fn commit_transition(&self, transition: &Transition) -> Result<()>;
    /// Marks up to `limit` pending tasks due at `now` as running and returns them.
    fn claim_due_tasks(&self, now: DateTime<Utc>, limit: i32) -> Result<Vec<LifecycleTask>>;
    fn complete_task(&self, id: &str) -> Result<()>;
    fn retry_task(&self, id: &str, run_at: DateTime<Utc>, error: &str) -> Result<()>;
    fn fail_task(&self, id: &str, error: &str) -> Result<()>;
    /// Returns tasks left running by a previous process to the queue.
    fn requeue_running_tasks(&self) -> Result<usize>;
    fn list_target_tasks(&self, target_id: &str) -> Result<Vec<LifecycleTask>>;
    fn count_pending_tasks(&self) -> Result<i64>;
}

pub trait BillingStore {
    fn create_billing_order(&self, order: &BillingOrder) -> Result<()>;
    fn get_billing_order(&self, id: &str) -> Result<Option<BillingOrder>>;
    /// Writes payment, subscription, paid order, school plan, and feature
    /// flags in one transaction. Fails with `Conflict` if the order is
    /// already paid.
    fn activate_subscription(&self, activation: &Activation) -> Result<()>;
    fn get_subscription_by_order(&self, order_id: &str) -> Result<Option<Subscription>>;
    fn list_subscriptions(&self, school_id: &str) -> Result<Vec<Subscription>>;
    fn list_payments(&self, school_id: &str) -> Result<Vec<Payment>>;
}
