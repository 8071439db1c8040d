use rusqlite::Row;
use rusqlite::types::Value;

use super::record::Record;
use super::{
    SqliteStore, flag, get_enum, get_opt_time, get_time, int, label, opt_int, opt_text, opt_time,
    text, time,
};
use crate::error::{Error, Result};
use crate::store::DomainStore;
use crate::types::*;

impl Record for DnsRecord {
    const TABLE: &'static str = "dns_records";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "domain",
        "record_type",
        "name",
        "value",
        "ttl",
        "priority",
        "propagated_at",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DnsRecord {
            id: row.get(0)?,
            school_id: row.get(1)?,
            domain: row.get(2)?,
            record_type: get_enum(row, 3)?,
            name: row.get(4)?,
            value: row.get(5)?,
            ttl: row.get(6)?,
            priority: row.get(7)?,
            propagated_at: get_opt_time(row, 8)?,
            created_at: get_time(row, 9)?,
            updated_at: get_time(row, 10)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.domain),
            label(self.record_type),
            text(&self.name),
            text(&self.value),
            int(self.ttl),
            opt_int(self.priority),
            opt_time(self.propagated_at.as_ref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for DomainTransfer {
    const TABLE: &'static str = "domain_transfers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "domain",
        "transfer_status",
        "lock_status",
        "auth_code",
        "notes",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DomainTransfer {
            id: row.get(0)?,
            school_id: row.get(1)?,
            domain: row.get(2)?,
            transfer_status: get_enum(row, 3)?,
            lock_status: get_enum(row, 4)?,
            auth_code: row.get(5)?,
            notes: row.get(6)?,
            created_at: get_time(row, 7)?,
            updated_at: get_time(row, 8)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.domain),
            label(self.transfer_status),
            label(self.lock_status),
            opt_text(self.auth_code.as_deref()),
            opt_text(self.notes.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for SslCertificate {
    const TABLE: &'static str = "ssl_certificates";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "domain",
        "status",
        "issuer",
        "cert_path",
        "key_path",
        "issued_at",
        "expires_at",
        "error_message",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SslCertificate {
            id: row.get(0)?,
            school_id: row.get(1)?,
            domain: row.get(2)?,
            status: get_enum(row, 3)?,
            issuer: row.get(4)?,
            cert_path: row.get(5)?,
            key_path: row.get(6)?,
            issued_at: get_opt_time(row, 7)?,
            expires_at: get_opt_time(row, 8)?,
            error_message: row.get(9)?,
            created_at: get_time(row, 10)?,
            updated_at: get_time(row, 11)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.domain),
            label(self.status),
            opt_text(self.issuer.as_deref()),
            opt_text(self.cert_path.as_deref()),
            opt_text(self.key_path.as_deref()),
            opt_time(self.issued_at.as_ref()),
            opt_time(self.expires_at.as_ref()),
            opt_text(self.error_message.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for WhoisPrivacy {
    const TABLE: &'static str = "whois_privacy";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "domain",
        "is_enabled",
        "status",
        "error_message",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(WhoisPrivacy {
            id: row.get(0)?,
            school_id: row.get(1)?,
            domain: row.get(2)?,
            is_enabled: row.get(3)?,
            status: get_enum(row, 4)?,
            error_message: row.get(5)?,
            created_at: get_time(row, 6)?,
            updated_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.domain),
            flag(self.is_enabled),
            label(self.status),
            opt_text(self.error_message.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for LifecycleEvent {
    const TABLE: &'static str = "lifecycle_events";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "entity_kind",
        "entity_id",
        "from_status",
        "to_status",
        "trigger_name",
        "note",
        "created_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(LifecycleEvent {
            id: row.get(0)?,
            entity_kind: get_enum(row, 1)?,
            entity_id: row.get(2)?,
            from_status: row.get(3)?,
            to_status: row.get(4)?,
            trigger: row.get(5)?,
            note: row.get(6)?,
            created_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            label(self.entity_kind),
            text(&self.entity_id),
            opt_text(self.from_status.as_deref()),
            text(&self.to_status),
            text(&self.trigger),
            opt_text(self.note.as_deref()),
            time(&self.created_at),
        ]
    }
}

impl DomainStore for SqliteStore {
    // DNS records

    fn list_dns_records(&self, school_id: &str) -> Result<Vec<DnsRecord>> {
        self.list_by("school_id", school_id, "domain, record_type, name, id")
    }

    fn get_dns_record(&self, id: &str) -> Result<Option<DnsRecord>> {
        self.find(id)
    }

    fn delete_dns_record(&self, id: &str) -> Result<bool> {
        self.remove::<DnsRecord>(id)
    }

    // Domain transfers

    fn list_transfers(&self, school_id: &str) -> Result<Vec<DomainTransfer>> {
        self.list_by("school_id", school_id, "created_at DESC, id")
    }

    fn get_transfer(&self, id: &str) -> Result<Option<DomainTransfer>> {
        self.find(id)
    }

    // SSL certificates

    fn list_ssl_certificates(&self, school_id: &str) -> Result<Vec<SslCertificate>> {
        self.list_by("school_id", school_id, "domain")
    }

    fn get_ssl_certificate(&self, id: &str) -> Result<Option<SslCertificate>> {
        self.find(id)
    }

    fn delete_ssl_certificate(&self, id: &str) -> Result<bool> {
        self.remove::<SslCertificate>(id)
    }

    // WHOIS privacy

    fn list_whois_privacy(&self, school_id: &str) -> Result<Vec<WhoisPrivacy>> {
        self.list_by("school_id", school_id, "domain")
    }

    fn get_whois_privacy(&self, id: &str) -> Result<Option<WhoisPrivacy>> {
        self.find(id)
    }

    fn get_whois_privacy_by_domain(&self, domain: &str) -> Result<Option<WhoisPrivacy>> {
        self.find_by("domain", domain)
    }

    // Transition log

    fn list_events(&self, kind: EntityKind, entity_id: &str) -> Result<Vec<LifecycleEvent>> {
        let sql = format!(
            "SELECT {} FROM lifecycle_events
             WHERE entity_kind = ?1 AND entity_id = ?2
             ORDER BY created_at, rowid",
            LifecycleEvent::COLUMNS.join(", ")
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([kind.as_str(), entity_id], LifecycleEvent::from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}
