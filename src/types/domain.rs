use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum DnsRecordType {
        A => "A",
        Aaaa => "AAAA",
        Cname => "CNAME",
        Mx => "MX",
        Txt => "TXT",
        Ns => "NS",
        Srv => "SRV",
        Caa => "CAA",
        Ptr => "PTR",
    }
}

string_enum! {
    pub enum TransferStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        AwaitingApproval => "AWAITING_APPROVAL",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    pub enum LockStatus {
        Locked => "LOCKED",
        Unlocked => "UNLOCKED",
    }
}

string_enum! {
    /// Operator actions accepted by `PUT /transfers/{id}`.
    pub enum TransferAction {
        Approve => "approve",
        Reject => "reject",
        Cancel => "cancel",
        SubmitAuthCode => "submit_auth_code",
        Lock => "lock",
        Unlock => "unlock",
    }
}

string_enum! {
    pub enum SslStatus {
        Pending => "PENDING",
        Active => "ACTIVE",
        Error => "ERROR",
    }
}

string_enum! {
    pub enum PrivacyStatus {
        Disabled => "DISABLED",
        Activating => "ACTIVATING",
        Active => "ACTIVE",
        Error => "ERROR",
    }
}

impl TransferStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub school_id: String,
    pub domain: String,
    pub record_type: DnsRecordType,
    pub name: String,
    pub value: String,
    pub ttl: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainTransfer {
    pub id: String,
    pub school_id: String,
    pub domain: String,
    pub transfer_status: TransferStatus,
    pub lock_status: LockStatus,
    #[serde(skip)]
    pub auth_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslCertificate {
    pub id: String,
    pub school_id: String,
    pub domain: String,
    pub status: SslStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoisPrivacy {
    pub id: String,
    pub school_id: String,
    pub domain: String,
    pub is_enabled: bool,
    pub status: PrivacyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
