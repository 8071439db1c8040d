//! Domain lifecycle manager.
//!
//! Delayed provisioning steps (transfer progress, certificate issuance,
//! WHOIS privacy activation, DNS propagation) are persisted as
//! [`LifecycleTask`] rows and run by a single [`LifecycleWorker`]. Every
//! status change is appended to the transition log.

mod operations;
mod tasks;
pub mod transitions;
mod worker;

pub use worker::LifecycleWorker;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::error::Result;
use crate::store::{LifecycleStore, Store};
use crate::types::{
    EntityKind, EntityWrite, LifecycleEntity, LifecycleEvent, LifecycleTask, TaskKind,
    TaskStatus, Transition,
};

/// Handle shared by request handlers and the worker.
#[derive(Clone)]
pub struct Lifecycle {
    store: Arc<dyn Store>,
    config: LifecycleConfig,
    public_host_suffix: String,
    wakeup: Arc<Notify>,
    /// Serializes read-modify-write cycles on lifecycle entities between
    /// handlers and the worker.
    entities: Arc<Mutex<()>>,
}

const MAX_DELAY_SECS: u64 = 365 * 24 * 60 * 60;

impl Lifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: LifecycleConfig, public_host_suffix: String) -> Self {
        Self {
            store,
            config,
            public_host_suffix,
            wakeup: Arc::new(Notify::new()),
            entities: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    #[must_use]
    pub fn worker(&self) -> LifecycleWorker {
        LifecycleWorker::new(self.clone())
    }

    fn delay(&self, kind: TaskKind) -> Duration {
        let secs = match kind {
            TaskKind::TransferAdvance => self.config.transfer_step_delay_secs,
            TaskKind::SslIssue => self.config.ssl_issue_delay_secs,
            TaskKind::PrivacyActivate => self.config.privacy_delay_secs,
            TaskKind::DnsPropagate => self.config.dns_propagation_delay_secs,
        };
        Duration::seconds(secs.min(MAX_DELAY_SECS) as i64)
    }

    fn lock_entities(&self) -> MutexGuard<'_, ()> {
        self.entities.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Builds a task due after the configured delay for its kind.
    fn task(&self, kind: TaskKind, target_id: &str) -> LifecycleTask {
        let now = Utc::now();
        LifecycleTask {
            id: Uuid::new_v4().to_string(),
            kind,
            target_id: target_id.to_string(),
            run_at: now + self.delay(kind),
            attempts: 0,
            status: TaskStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes an entity change together with its log row and follow-up
    /// task, then wakes the worker if a task was queued.
    fn commit(
        &self,
        write: EntityWrite,
        change: Change<'_>,
        follow_up: Option<TaskKind>,
    ) -> Result<()> {
        let event = change.event();
        let task = follow_up.map(|kind| self.task(kind, change.entity_id));
        self.store.commit_transition(&Transition {
            write,
            event,
            task: task.clone(),
        })?;

        tracing::info!(
            entity = %change.kind,
            id = change.entity_id,
            from = change.from.unwrap_or("-"),
            to = change.to,
            trigger = change.trigger,
            "Lifecycle transition"
        );
        if let Some(task) = task {
            self.wakeup.notify_one();
            tracing::debug!(
                task = %task.id,
                kind = %task.kind,
                target = %task.target_id,
                "Scheduled lifecycle task"
            );
        }
        Ok(())
    }
}

/// An update applied only while the row still holds `expected`.
fn guarded(entity: LifecycleEntity, expected: &str) -> EntityWrite {
    EntityWrite::Update {
        entity,
        expected: Some(expected.to_string()),
    }
}

/// One status change as it appears in the transition log.
struct Change<'a> {
    kind: EntityKind,
    entity_id: &'a str,
    from: Option<&'a str>,
    to: &'a str,
    trigger: &'a str,
    note: Option<&'a str>,
}

impl Change<'_> {
    fn event(&self) -> LifecycleEvent {
        LifecycleEvent {
            id: Uuid::new_v4().to_string(),
            entity_kind: self.kind,
            entity_id: self.entity_id.to_string(),
            from_status: self.from.map(str::to_string),
            to_status: self.to.to_string(),
            trigger: self.trigger.to_string(),
            note: self.note.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}
