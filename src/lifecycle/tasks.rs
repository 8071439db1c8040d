use chrono::{Duration, Utc};

use super::transitions::{TransferEvent, can_advance, transition};
use super::{Change, Lifecycle, guarded};
use crate::error::Result;
use crate::store::{DomainStore, TenantStore};
use crate::types::*;

const TRIGGER_WORKER: &str = "worker";
const CERT_ISSUER: &str = "Let's Encrypt";
const CERT_DIR: &str = "/etc/schoolhub/certs";
const CERT_VALIDITY_DAYS: i64 = 90;

impl Lifecycle {
    /// Runs one claimed task. A task whose target is gone or has moved on
    /// succeeds without doing anything.
    pub(super) fn execute(&self, task: &LifecycleTask) -> Result<()> {
        let _guard = self.lock_entities();
        match task.kind {
            TaskKind::TransferAdvance => self.advance_transfer(&task.target_id),
            TaskKind::SslIssue => self.issue_certificate(&task.target_id),
            TaskKind::PrivacyActivate => self.activate_privacy(&task.target_id),
            TaskKind::DnsPropagate => self.propagate_dns(&task.target_id),
        }
    }

    /// Puts the task's target into its failed state once retries run out.
    pub(super) fn on_exhausted(&self, task: &LifecycleTask, error: &str) -> Result<()> {
        let _guard = self.lock_entities();
        let note = format!("gave up after {} attempts: {error}", task.attempts);

        match task.kind {
            TaskKind::TransferAdvance => {
                let Some(mut transfer) = self.store.get_transfer(&task.target_id)? else {
                    return Ok(());
                };
                let from = transfer.transfer_status;
                let Ok(to) = transition(from, TransferEvent::Fail) else {
                    return Ok(());
                };
                transfer.transfer_status = to;
                transfer.updated_at = Utc::now();
                self.commit(
                    guarded(LifecycleEntity::Transfer(transfer), from.as_str()),
                    Change {
                        kind: EntityKind::DomainTransfer,
                        entity_id: &task.target_id,
                        from: Some(from.as_str()),
                        to: to.as_str(),
                        trigger: TRIGGER_WORKER,
                        note: Some(&note),
                    },
                    None,
                )
            }
            TaskKind::SslIssue => {
                let Some(mut cert) = self.store.get_ssl_certificate(&task.target_id)? else {
                    return Ok(());
                };
                if cert.status != SslStatus::Pending {
                    return Ok(());
                }
                cert.status = SslStatus::Error;
                cert.error_message = Some(note.clone());
                cert.updated_at = Utc::now();
                self.commit(
                    guarded(LifecycleEntity::Certificate(cert), SslStatus::Pending.as_str()),
                    Change {
                        kind: EntityKind::SslCertificate,
                        entity_id: &task.target_id,
                        from: Some(SslStatus::Pending.as_str()),
                        to: SslStatus::Error.as_str(),
                        trigger: TRIGGER_WORKER,
                        note: Some(&note),
                    },
                    None,
                )
            }
            TaskKind::PrivacyActivate => {
                let Some(mut privacy) = self.store.get_whois_privacy(&task.target_id)? else {
                    return Ok(());
                };
                if privacy.status != PrivacyStatus::Activating {
                    return Ok(());
                }
                privacy.status = PrivacyStatus::Error;
                privacy.error_message = Some(note.clone());
                privacy.updated_at = Utc::now();
                self.commit(
                    guarded(
                        LifecycleEntity::Privacy(privacy),
                        PrivacyStatus::Activating.as_str(),
                    ),
                    Change {
                        kind: EntityKind::WhoisPrivacy,
                        entity_id: &task.target_id,
                        from: Some(PrivacyStatus::Activating.as_str()),
                        to: PrivacyStatus::Error.as_str(),
                        trigger: TRIGGER_WORKER,
                        note: Some(&note),
                    },
                    None,
                )
            }
            TaskKind::DnsPropagate => {
                tracing::error!(record = %task.target_id, error, "DNS propagation abandoned");
                Ok(())
            }
        }
    }

    fn advance_transfer(&self, id: &str) -> Result<()> {
        let Some(mut transfer) = self.store.get_transfer(id)? else {
            return Ok(());
        };
        let from = transfer.transfer_status;
        if !can_advance(from) {
            tracing::debug!(transfer = id, status = %from, "Transfer has nothing to advance");
            return Ok(());
        }

        let to = transition(from, TransferEvent::Advance)?;
        transfer.transfer_status = to;
        transfer.updated_at = Utc::now();
        self.commit(
            guarded(LifecycleEntity::Transfer(transfer), from.as_str()),
            Change {
                kind: EntityKind::DomainTransfer,
                entity_id: id,
                from: Some(from.as_str()),
                to: to.as_str(),
                trigger: TRIGGER_WORKER,
                note: None,
            },
            can_advance(to).then_some(TaskKind::TransferAdvance),
        )
    }

    fn issue_certificate(&self, id: &str) -> Result<()> {
        let Some(mut cert) = self.store.get_ssl_certificate(id)? else {
            return Ok(());
        };
        if cert.status != SslStatus::Pending {
            return Ok(());
        }

        let now = Utc::now();
        let owned = match self.store.get_school(&cert.school_id)? {
            Some(school) => {
                cert.domain == school.platform_host(&self.public_host_suffix)
                    || (school.domain_verified
                        && school.custom_domain.as_deref() == Some(cert.domain.as_str()))
            }
            None => false,
        };

        let note = if owned {
            cert.status = SslStatus::Active;
            cert.issuer = Some(CERT_ISSUER.to_string());
            cert.cert_path = Some(format!("{CERT_DIR}/{}/fullchain.pem", cert.domain));
            cert.key_path = Some(format!("{CERT_DIR}/{}/privkey.pem", cert.domain));
            cert.issued_at = Some(now);
            cert.expires_at = Some(now + Duration::days(CERT_VALIDITY_DAYS));
            cert.error_message = None;
            None
        } else {
            let message = format!(
                "{} is neither the school's platform host nor its verified custom domain",
                cert.domain
            );
            cert.status = SslStatus::Error;
            cert.error_message = Some(message.clone());
            Some(message)
        };
        cert.updated_at = now;

        let to = cert.status;
        self.commit(
            guarded(LifecycleEntity::Certificate(cert), SslStatus::Pending.as_str()),
            Change {
                kind: EntityKind::SslCertificate,
                entity_id: id,
                from: Some(SslStatus::Pending.as_str()),
                to: to.as_str(),
                trigger: TRIGGER_WORKER,
                note: note.as_deref(),
            },
            None,
        )
    }

    fn activate_privacy(&self, id: &str) -> Result<()> {
        let Some(mut privacy) = self.store.get_whois_privacy(id)? else {
            return Ok(());
        };
        if privacy.status != PrivacyStatus::Activating {
            return Ok(());
        }

        privacy.status = PrivacyStatus::Active;
        privacy.updated_at = Utc::now();
        self.commit(
            guarded(
                LifecycleEntity::Privacy(privacy),
                PrivacyStatus::Activating.as_str(),
            ),
            Change {
                kind: EntityKind::WhoisPrivacy,
                entity_id: id,
                from: Some(PrivacyStatus::Activating.as_str()),
                to: PrivacyStatus::Active.as_str(),
                trigger: TRIGGER_WORKER,
                note: None,
            },
            None,
        )
    }

    fn propagate_dns(&self, id: &str) -> Result<()> {
        if self.store.get_dns_record(id)?.is_none() {
            return Ok(());
        }

        self.commit(
            EntityWrite::DnsPropagated {
                record_id: id.to_string(),
                at: Utc::now(),
            },
            Change {
                kind: EntityKind::DnsRecord,
                entity_id: id,
                from: Some("SAVED"),
                to: "PROPAGATED",
                trigger: TRIGGER_WORKER,
                note: None,
            },
            None,
        )
    }
}
