use chrono::Utc;
use uuid::Uuid;

use super::transitions::{TransferEvent, check_lock_change, transition};
use super::{Change, Lifecycle, guarded};
use crate::error::{Error, Result};
use crate::store::DomainStore;
use crate::types::*;

const TRIGGER_API: &str = "api";

impl Lifecycle {
    /// Opens a PENDING transfer and schedules its first automatic step.
    pub fn start_transfer(
        &self,
        school_id: &str,
        domain: &str,
        auth_code: Option<String>,
        notes: Option<String>,
    ) -> Result<DomainTransfer> {
        let now = Utc::now();
        let transfer = DomainTransfer {
            id: Uuid::new_v4().to_string(),
            school_id: school_id.to_string(),
            domain: domain.to_string(),
            transfer_status: TransferStatus::Pending,
            lock_status: LockStatus::Locked,
            auth_code,
            notes,
            created_at: now,
            updated_at: now,
        };

        self.commit(
            EntityWrite::Insert(LifecycleEntity::Transfer(transfer.clone())),
            Change {
                kind: EntityKind::DomainTransfer,
                entity_id: &transfer.id,
                from: None,
                to: TransferStatus::Pending.as_str(),
                trigger: TRIGGER_API,
                note: None,
            },
            Some(TaskKind::TransferAdvance),
        )?;
        Ok(transfer)
    }

    /// Applies an operator action. Nothing is written when the transition
    /// table rejects the action.
    pub fn apply_transfer_action(
        &self,
        transfer_id: &str,
        action: TransferAction,
        auth_code: Option<String>,
    ) -> Result<DomainTransfer> {
        let _guard = self.lock_entities();
        let mut transfer = self
            .store
            .get_transfer(transfer_id)?
            .ok_or(Error::NotFound)?;
        let from = transfer.transfer_status;

        let Some(event) = TransferEvent::from_action(action) else {
            check_lock_change(from, action)?;
            transfer.lock_status = match action {
                TransferAction::Lock => LockStatus::Locked,
                _ => LockStatus::Unlocked,
            };
            transfer.updated_at = Utc::now();

            let note = format!("lock_status={}", transfer.lock_status);
            self.commit(
                guarded(LifecycleEntity::Transfer(transfer.clone()), from.as_str()),
                Change {
                    kind: EntityKind::DomainTransfer,
                    entity_id: &transfer.id,
                    from: Some(from.as_str()),
                    to: from.as_str(),
                    trigger: action.as_str(),
                    note: Some(&note),
                },
                None,
            )?;
            return Ok(transfer);
        };

        let code = match event {
            TransferEvent::SubmitAuthCode => {
                let code = auth_code
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| Error::BadRequest("auth_code is required".to_string()))?;
                Some(code)
            }
            _ => None,
        };

        let to = transition(from, event)?;
        if code.is_some() {
            transfer.auth_code = code;
        }
        transfer.transfer_status = to;
        transfer.updated_at = Utc::now();

        let follow_up =
            (event == TransferEvent::SubmitAuthCode).then_some(TaskKind::TransferAdvance);
        self.commit(
            guarded(LifecycleEntity::Transfer(transfer.clone()), from.as_str()),
            Change {
                kind: EntityKind::DomainTransfer,
                entity_id: &transfer.id,
                from: Some(from.as_str()),
                to: to.as_str(),
                trigger: action.as_str(),
                note: None,
            },
            follow_up,
        )?;
        Ok(transfer)
    }

    /// Opens a PENDING certificate and schedules issuance.
    pub fn request_certificate(&self, school_id: &str, domain: &str) -> Result<SslCertificate> {
        let now = Utc::now();
        let cert = SslCertificate {
            id: Uuid::new_v4().to_string(),
            school_id: school_id.to_string(),
            domain: domain.to_string(),
            status: SslStatus::Pending,
            issuer: None,
            cert_path: None,
            key_path: None,
            issued_at: None,
            expires_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        self.commit(
            EntityWrite::Insert(LifecycleEntity::Certificate(cert.clone())),
            Change {
                kind: EntityKind::SslCertificate,
                entity_id: &cert.id,
                from: None,
                to: SslStatus::Pending.as_str(),
                trigger: TRIGGER_API,
                note: None,
            },
            Some(TaskKind::SslIssue),
        )?;
        Ok(cert)
    }

    /// Puts a certificate back to PENDING and schedules issuance again.
    pub fn renew_certificate(&self, cert_id: &str) -> Result<SslCertificate> {
        let _guard = self.lock_entities();
        let mut cert = self
            .store
            .get_ssl_certificate(cert_id)?
            .ok_or(Error::NotFound)?;
        if cert.status == SslStatus::Pending {
            return Err(Error::Conflict(
                "certificate issuance is already in progress".to_string(),
            ));
        }

        let from = cert.status;
        cert.status = SslStatus::Pending;
        cert.error_message = None;
        cert.updated_at = Utc::now();

        self.commit(
            guarded(LifecycleEntity::Certificate(cert.clone()), from.as_str()),
            Change {
                kind: EntityKind::SslCertificate,
                entity_id: &cert.id,
                from: Some(from.as_str()),
                to: SslStatus::Pending.as_str(),
                trigger: "renew",
                note: None,
            },
            Some(TaskKind::SslIssue),
        )?;
        Ok(cert)
    }

    /// Starts privacy activation for a domain, creating its record on first
    /// use. Already enabled records are returned unchanged.
    pub fn enable_privacy(&self, school_id: &str, domain: &str) -> Result<WhoisPrivacy> {
        let _guard = self.lock_entities();
        let now = Utc::now();

        let (write, privacy, from) = match self.store.get_whois_privacy_by_domain(domain)? {
            Some(existing) if existing.school_id != school_id => return Err(Error::AlreadyExists),
            Some(existing)
                if matches!(
                    existing.status,
                    PrivacyStatus::Activating | PrivacyStatus::Active
                ) =>
            {
                return Ok(existing);
            }
            Some(mut existing) => {
                let from = existing.status;
                existing.is_enabled = true;
                existing.status = PrivacyStatus::Activating;
                existing.error_message = None;
                existing.updated_at = now;
                let write = guarded(LifecycleEntity::Privacy(existing.clone()), from.as_str());
                (write, existing, Some(from))
            }
            None => {
                let privacy = WhoisPrivacy {
                    id: Uuid::new_v4().to_string(),
                    school_id: school_id.to_string(),
                    domain: domain.to_string(),
                    is_enabled: true,
                    status: PrivacyStatus::Activating,
                    error_message: None,
                    created_at: now,
                    updated_at: now,
                };
                let write = EntityWrite::Insert(LifecycleEntity::Privacy(privacy.clone()));
                (write, privacy, None)
            }
        };

        self.commit(
            write,
            Change {
                kind: EntityKind::WhoisPrivacy,
                entity_id: &privacy.id,
                from: from.map(PrivacyStatus::as_str),
                to: PrivacyStatus::Activating.as_str(),
                trigger: "enable",
                note: None,
            },
            Some(TaskKind::PrivacyActivate),
        )?;
        Ok(privacy)
    }

    /// Turns privacy off immediately.
    pub fn disable_privacy(&self, privacy_id: &str) -> Result<WhoisPrivacy> {
        let _guard = self.lock_entities();
        let mut privacy = self
            .store
            .get_whois_privacy(privacy_id)?
            .ok_or(Error::NotFound)?;
        if privacy.status == PrivacyStatus::Disabled {
            return Ok(privacy);
        }

        let from = privacy.status;
        privacy.is_enabled = false;
        privacy.status = PrivacyStatus::Disabled;
        privacy.updated_at = Utc::now();

        self.commit(
            guarded(LifecycleEntity::Privacy(privacy.clone()), from.as_str()),
            Change {
                kind: EntityKind::WhoisPrivacy,
                entity_id: &privacy.id,
                from: Some(from.as_str()),
                to: PrivacyStatus::Disabled.as_str(),
                trigger: "disable",
                note: None,
            },
            None,
        )?;
        Ok(privacy)
    }

    /// Stores a new or edited DNS record, logs it and schedules its
    /// propagation stamp, all in one write.
    pub fn save_dns_record(&self, record: &DnsRecord, created: bool) -> Result<()> {
        let entity = LifecycleEntity::DnsRecord(record.clone());
        let write = if created {
            EntityWrite::Insert(entity)
        } else {
            EntityWrite::Update {
                entity,
                expected: None,
            }
        };

        let note = format!("{} {} {}", record.record_type, record.name, record.value);
        self.commit(
            write,
            Change {
                kind: EntityKind::DnsRecord,
                entity_id: &record.id,
                from: None,
                to: "SAVED",
                trigger: TRIGGER_API,
                note: Some(&note),
            },
            Some(TaskKind::DnsPropagate),
        )
    }
}
