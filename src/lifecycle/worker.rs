use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use super::Lifecycle;
use crate::error::{Error, Result};
use crate::store::LifecycleStore;
use crate::types::LifecycleTask;

const BATCH_SIZE: i32 = 16;

/// Drains the durable task queue. One worker runs per process.
#[derive(Clone)]
pub struct LifecycleWorker {
    lifecycle: Lifecycle,
    /// Set when a task could not be returned to the queue and may still be
    /// RUNNING. The next batch requeues it first.
    stranded: Arc<AtomicBool>,
}

impl LifecycleWorker {
    pub(super) fn new(lifecycle: Lifecycle) -> Self {
        Self {
            lifecycle,
            stranded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns tasks left RUNNING by a previous process to the queue.
    pub fn recover(&self) -> Result<usize> {
        let count = self.lifecycle.store.requeue_running_tasks()?;
        if count > 0 {
            tracing::info!(count, "Requeued interrupted lifecycle tasks");
        }
        Ok(count)
    }

    /// Claims and runs one batch of due tasks. Returns how many were claimed.
    ///
    /// A task whose bookkeeping fails goes back to PENDING without stopping
    /// the rest of the batch.
    pub fn run_due(&self) -> Result<usize> {
        if self.stranded.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.recover() {
                self.stranded.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }

        let tasks = self.lifecycle.store.claim_due_tasks(Utc::now(), BATCH_SIZE)?;
        for task in &tasks {
            if let Err(e) = self.run_task(task) {
                tracing::error!(
                    task = %task.id,
                    kind = %task.kind,
                    error = %e,
                    "Lifecycle task bookkeeping failed"
                );
                self.release(task, &e);
            }
        }
        Ok(tasks.len())
    }

    fn release(&self, task: &LifecycleTask, error: &Error) {
        let retry_at = Utc::now() + self.lifecycle.delay(task.kind);
        let released = self
            .lifecycle
            .store
            .retry_task(&task.id, retry_at, &error.to_string());
        if let Err(e) = released {
            tracing::error!(
                task = %task.id,
                error = %e,
                "Failed to return lifecycle task to the queue"
            );
            self.stranded.store(true, Ordering::SeqCst);
        }
    }

    fn run_task(&self, task: &LifecycleTask) -> Result<()> {
        let store = &self.lifecycle.store;

        let error = match self.lifecycle.execute(task) {
            Ok(()) => return store.complete_task(&task.id),
            Err(e) => e.to_string(),
        };

        if task.attempts >= self.lifecycle.config.max_attempts {
            tracing::error!(task = %task.id, kind = %task.kind, attempts = task.attempts, error = %error, "Lifecycle task failed");
            store.fail_task(&task.id, &error)?;
            return self.lifecycle.on_exhausted(task, &error);
        }

        let retry_at = Utc::now() + self.lifecycle.delay(task.kind);
        tracing::warn!(task = %task.id, kind = %task.kind, attempts = task.attempts, error = %error, "Lifecycle task will be retried");
        store.retry_task(&task.id, retry_at, &error)
    }

    /// Runs until the process exits. Sleeps for the poll interval between
    /// empty batches unless woken by a newly scheduled task.
    pub async fn run(self) {
        let worker = self.clone();
        match tokio::task::spawn_blocking(move || worker.recover()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Failed to requeue lifecycle tasks: {e}"),
            Err(e) => tracing::error!("Lifecycle recovery panicked: {e}"),
        }

        let wakeup = self.lifecycle.wakeup.clone();
        let poll = self.lifecycle.config.poll_interval();
        loop {
            let notified = wakeup.notified();
            let worker = self.clone();
            let claimed = match tokio::task::spawn_blocking(move || worker.run_due()).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    tracing::error!("Lifecycle worker error: {e}");
                    0
                }
                Err(e) => {
                    tracing::error!("Lifecycle worker panicked: {e}");
                    0
                }
            };
            if claimed > 0 {
                continue;
            }

            tokio::select! {
                () = notified => {}
                () = tokio::time::sleep(poll) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::config::LifecycleConfig;
    use crate::store::{DomainStore, SqliteStore, Store, test_support};
    use crate::types::*;

    fn lifecycle() -> (tempfile::TempDir, Arc<SqliteStore>, Lifecycle) {
        let (dir, store) = test_support::store_with_school();
        let store = Arc::new(store);
        let lifecycle = Lifecycle::new(
            store.clone() as Arc<dyn Store>,
            LifecycleConfig::immediate(),
            "schoolhub.site".to_string(),
        );
        (dir, store, lifecycle)
    }

    fn drain(worker: &LifecycleWorker) {
        for _ in 0..10 {
            if worker.run_due().unwrap() == 0 {
                return;
            }
        }
    }

    #[test]
    fn test_transfer_reaches_awaiting_approval() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();

        drain(&lifecycle.worker());

        let transfer = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(transfer.transfer_status, TransferStatus::AwaitingApproval);

        let statuses: Vec<String> = store
            .list_events(EntityKind::DomainTransfer, &transfer.id)
            .unwrap()
            .into_iter()
            .map(|e| e.to_status)
            .collect();
        assert_eq!(statuses, ["PENDING", "PROCESSING", "AWAITING_APPROVAL"]);
    }

    #[test]
    fn test_cancelled_transfer_task_is_noop() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();
        lifecycle
            .apply_transfer_action(&transfer.id, TransferAction::Cancel, None)
            .unwrap();

        drain(&lifecycle.worker());

        let transfer = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(transfer.transfer_status, TransferStatus::Cancelled);
        let tasks = store.list_target_tasks(&transfer.id).unwrap();
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Done));
    }

    #[test]
    fn test_rejected_action_writes_nothing() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();

        let err = lifecycle
            .apply_transfer_action(&transfer.id, TransferAction::Approve, None)
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidTransition { .. }));

        let stored = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(stored.transfer_status, TransferStatus::Pending);
        let events = store
            .list_events(EntityKind::DomainTransfer, &transfer.id)
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_submit_auth_code_requires_code() {
        let (_dir, _store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();

        let err = lifecycle
            .apply_transfer_action(&transfer.id, TransferAction::SubmitAuthCode, Some("  ".into()))
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::BadRequest(_)));

        let updated = lifecycle
            .apply_transfer_action(&transfer.id, TransferAction::SubmitAuthCode, Some("EPP-1".into()))
            .unwrap();
        assert_eq!(updated.transfer_status, TransferStatus::Processing);
        assert_eq!(updated.auth_code.as_deref(), Some("EPP-1"));
    }

    #[test]
    fn test_certificate_for_platform_host_is_issued() {
        let (_dir, store, lifecycle) = lifecycle();
        let good = lifecycle
            .request_certificate("school-1", "greenwood.schoolhub.site")
            .unwrap();
        let bad = lifecycle
            .request_certificate("school-1", "stranger.example.com")
            .unwrap();

        drain(&lifecycle.worker());

        let good = store.get_ssl_certificate(&good.id).unwrap().unwrap();
        assert_eq!(good.status, SslStatus::Active);
        let issued = good.issued_at.unwrap();
        assert_eq!(good.expires_at.unwrap() - issued, Duration::days(90));

        let bad = store.get_ssl_certificate(&bad.id).unwrap().unwrap();
        assert_eq!(bad.status, SslStatus::Error);
        assert!(bad.error_message.is_some());
    }

    #[test]
    fn test_privacy_activates_and_disables() {
        let (_dir, store, lifecycle) = lifecycle();
        let privacy = lifecycle.enable_privacy("school-1", "greenwood.edu").unwrap();
        assert_eq!(privacy.status, PrivacyStatus::Activating);

        drain(&lifecycle.worker());
        let active = store.get_whois_privacy(&privacy.id).unwrap().unwrap();
        assert_eq!(active.status, PrivacyStatus::Active);

        let disabled = lifecycle.disable_privacy(&privacy.id).unwrap();
        assert_eq!(disabled.status, PrivacyStatus::Disabled);
        assert!(!disabled.is_enabled);
    }

    #[test]
    fn test_exhausted_task_fails_transfer() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();
        let task = store.list_target_tasks(&transfer.id).unwrap().remove(0);

        let claimed = store.claim_due_tasks(Utc::now(), 1).unwrap().remove(0);
        assert_eq!(claimed.id, task.id);
        store.fail_task(&task.id, "registry unreachable").unwrap();
        lifecycle.on_exhausted(&claimed, "registry unreachable").unwrap();

        let transfer = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(transfer.transfer_status, TransferStatus::Failed);
        let last = store
            .list_events(EntityKind::DomainTransfer, &transfer.id)
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(last.to_status, "FAILED");
        assert!(last.note.unwrap().contains("registry unreachable"));
    }

    #[test]
    fn test_running_tasks_resume_after_restart() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();

        // Claimed by a process that died before finishing.
        let claimed = store.claim_due_tasks(Utc::now(), 10).unwrap();
        assert_eq!(claimed.len(), 1);

        let worker = lifecycle.worker();
        assert_eq!(worker.recover().unwrap(), 1);
        drain(&worker);

        let transfer = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(transfer.transfer_status, TransferStatus::AwaitingApproval);
    }

    #[tokio::test]
    async fn test_background_worker_wakes_on_schedule() {
        let (_dir, store, lifecycle) = lifecycle();
        let handle = tokio::spawn(lifecycle.worker().run());

        let privacy = lifecycle.enable_privacy("school-1", "greenwood.edu").unwrap();

        let mut status = PrivacyStatus::Activating;
        for _ in 0..100 {
            status = store.get_whois_privacy(&privacy.id).unwrap().unwrap().status;
            if status == PrivacyStatus::Active {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        handle.abort();
        assert_eq!(status, PrivacyStatus::Active);
    }

    fn fail_task_update(store: &SqliteStore, name: &str, task_id: &str, status: &str) {
        store
            .connection()
            .execute_batch(&format!(
                "CREATE TRIGGER {name} BEFORE UPDATE ON lifecycle_tasks
                 WHEN OLD.id = '{task_id}' AND NEW.status = '{status}'
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;"
            ))
            .unwrap();
    }

    fn drop_trigger(store: &SqliteStore, name: &str) {
        store
            .connection()
            .execute_batch(&format!("DROP TRIGGER {name};"))
            .unwrap();
    }

    #[test]
    fn test_failed_completion_does_not_strand_batch() {
        let (_dir, store, lifecycle) = lifecycle();
        let first = lifecycle.enable_privacy("school-1", "greenwood.edu").unwrap();
        let second = lifecycle.enable_privacy("school-1", "greenwood.org").unwrap();
        let first_task = store.list_target_tasks(&first.id).unwrap().remove(0);
        fail_task_update(&store, "no_done", &first_task.id, "DONE");

        let worker = lifecycle.worker();
        assert_eq!(worker.run_due().unwrap(), 2);

        let second = store.get_whois_privacy(&second.id).unwrap().unwrap();
        assert_eq!(second.status, PrivacyStatus::Active);
        let second_tasks = store.list_target_tasks(&second.id).unwrap();
        assert!(second_tasks.iter().all(|t| t.status == TaskStatus::Done));

        let first_task = store.list_target_tasks(&first.id).unwrap().remove(0);
        assert_eq!(first_task.status, TaskStatus::Pending);
        assert!(first_task.last_error.unwrap().contains("disk I/O error"));

        drop_trigger(&store, "no_done");
        drain(&worker);
        let first_task = store.list_target_tasks(&first.id).unwrap().remove(0);
        assert_eq!(first_task.status, TaskStatus::Done);
    }

    #[test]
    fn test_unreleased_task_is_requeued_next_batch() {
        let (_dir, store, lifecycle) = lifecycle();
        let privacy = lifecycle.enable_privacy("school-1", "greenwood.edu").unwrap();
        let task = store.list_target_tasks(&privacy.id).unwrap().remove(0);
        fail_task_update(&store, "no_done", &task.id, "DONE");
        fail_task_update(&store, "no_pending", &task.id, "PENDING");

        let worker = lifecycle.worker();
        assert_eq!(worker.run_due().unwrap(), 1);
        let stuck = store.list_target_tasks(&privacy.id).unwrap().remove(0);
        assert_eq!(stuck.status, TaskStatus::Running);

        drop_trigger(&store, "no_done");
        drop_trigger(&store, "no_pending");
        drain(&worker);
        let task = store.list_target_tasks(&privacy.id).unwrap().remove(0);
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn test_failed_event_insert_leaves_transfer_untouched() {
        let (_dir, store, lifecycle) = lifecycle();
        let transfer = lifecycle
            .start_transfer("school-1", "greenwood.edu", None, None)
            .unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER no_events BEFORE INSERT ON lifecycle_events
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
            )
            .unwrap();

        let worker = lifecycle.worker();
        assert_eq!(worker.run_due().unwrap(), 1);

        let stored = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(stored.transfer_status, TransferStatus::Pending);
        let events = store
            .list_events(EntityKind::DomainTransfer, &transfer.id)
            .unwrap();
        assert_eq!(events.len(), 1);

        drop_trigger(&store, "no_events");
        drain(&worker);

        let statuses: Vec<String> = store
            .list_events(EntityKind::DomainTransfer, &transfer.id)
            .unwrap()
            .into_iter()
            .map(|e| e.to_status)
            .collect();
        assert_eq!(statuses, ["PENDING", "PROCESSING", "AWAITING_APPROVAL"]);
    }

    #[test]
    fn test_dns_save_is_all_or_nothing() {
        let (_dir, store, lifecycle) = lifecycle();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER no_tasks BEFORE INSERT ON lifecycle_tasks
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
            )
            .unwrap();

        let now = Utc::now();
        let record = DnsRecord {
            id: "dns-1".to_string(),
            school_id: "school-1".to_string(),
            domain: "greenwood.edu".to_string(),
            record_type: DnsRecordType::A,
            name: "@".to_string(),
            value: "203.0.113.7".to_string(),
            ttl: 3600,
            priority: None,
            propagated_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(lifecycle.save_dns_record(&record, true).is_err());

        assert!(store.get_dns_record("dns-1").unwrap().is_none());
        assert!(
            store
                .list_events(EntityKind::DnsRecord, "dns-1")
                .unwrap()
                .is_empty()
        );
    }
}
