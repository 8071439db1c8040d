use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DnsRecord, DomainTransfer, SslCertificate, WhoisPrivacy};

string_enum! {
    pub enum TaskKind {
        TransferAdvance => "TRANSFER_ADVANCE",
        SslIssue => "SSL_ISSUE",
        PrivacyActivate => "PRIVACY_ACTIVATE",
        DnsPropagate => "DNS_PROPAGATE",
    }
}

string_enum! {
    pub enum TaskStatus {
        Pending => "PENDING",
        Running => "RUNNING",
        Done => "DONE",
        Failed => "FAILED",
    }
}

string_enum! {
    pub enum EntityKind {
        DomainTransfer => "DOMAIN_TRANSFER",
        SslCertificate => "SSL_CERTIFICATE",
        WhoisPrivacy => "WHOIS_PRIVACY",
        DnsRecord => "DNS_RECORD",
    }
}

/// A delayed state transition persisted so that it survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleTask {
    pub id: String,
    pub kind: TaskKind,
    pub target_id: String,
    pub run_at: DateTime<Utc>,
    pub attempts: i64,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the append-only transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    pub to_status: String,
    pub trigger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A lifecycle entity row as written by a transition.
#[derive(Debug, Clone)]
pub enum LifecycleEntity {
    Transfer(DomainTransfer),
    Certificate(SslCertificate),
    Privacy(WhoisPrivacy),
    DnsRecord(DnsRecord),
}

#[derive(Debug, Clone)]
pub enum EntityWrite {
    Insert(LifecycleEntity),
    /// Rewrites the row. With `expected` set, only while the stored status
    /// still equals it.
    Update {
        entity: LifecycleEntity,
        expected: Option<String>,
    },
    /// Stamps `propagated_at` on a DNS record and nothing else.
    DnsPropagated { record_id: String, at: DateTime<Utc> },
}

/// An entity write, its transition-log row and an optional follow-up task,
/// committed together or not at all.
#[derive(Debug, Clone)]
pub struct Transition {
    pub write: EntityWrite,
    pub event: LifecycleEvent,
    pub task: Option<LifecycleTask>,
}
