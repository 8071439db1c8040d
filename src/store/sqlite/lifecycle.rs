use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Row, params};

use super::record::Record;
use super::{
    SqliteStore, format_datetime, get_enum, get_time, insert_with, int, label, opt_text,
    save_guarded, save_with, text, time,
};
use crate::error::{Error, Result};
use crate::store::LifecycleStore;
use crate::types::*;

impl Record for LifecycleTask {
    const TABLE: &'static str = "lifecycle_tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "kind",
        "target_id",
        "run_at",
        "attempts",
        "status",
        "last_error",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(LifecycleTask {
            id: row.get(0)?,
            kind: get_enum(row, 1)?,
            target_id: row.get(2)?,
            run_at: get_time(row, 3)?,
            attempts: row.get(4)?,
            status: get_enum(row, 5)?,
            last_error: row.get(6)?,
            created_at: get_time(row, 7)?,
            updated_at: get_time(row, 8)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            label(self.kind),
            text(&self.target_id),
            time(&self.run_at),
            int(self.attempts),
            label(self.status),
            opt_text(self.last_error.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl LifecycleStore for SqliteStore {
    fn commit_transition(&self, transition: &Transition) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        match &transition.write {
            EntityWrite::Insert(entity) => match entity {
                LifecycleEntity::Transfer(t) => insert_with(&tx, t)?,
                LifecycleEntity::Certificate(c) => insert_with(&tx, c)?,
                LifecycleEntity::Privacy(p) => insert_with(&tx, p)?,
                LifecycleEntity::DnsRecord(r) => insert_with(&tx, r)?,
            },
            EntityWrite::Update { entity, expected } => match (entity, expected.as_deref()) {
                (LifecycleEntity::Transfer(t), Some(status)) => {
                    save_guarded(&tx, t, "transfer_status", status)?;
                }
                (LifecycleEntity::Certificate(c), Some(status)) => {
                    save_guarded(&tx, c, "status", status)?;
                }
                (LifecycleEntity::Privacy(p), Some(status)) => {
                    save_guarded(&tx, p, "status", status)?;
                }
                (LifecycleEntity::Transfer(t), None) => save_with(&tx, t)?,
                (LifecycleEntity::Certificate(c), None) => save_with(&tx, c)?,
                (LifecycleEntity::Privacy(p), None) => save_with(&tx, p)?,
                // DNS records carry no status.
                (LifecycleEntity::DnsRecord(r), _) => save_with(&tx, r)?,
            },
            EntityWrite::DnsPropagated { record_id, at } => {
                let rows = tx.execute(
                    "UPDATE dns_records SET propagated_at = ?1, updated_at = ?1 WHERE id = ?2",
                    params![format_datetime(at), record_id],
                )?;
                if rows == 0 {
                    return Err(Error::NotFound);
                }
            }
        }

        insert_with(&tx, &transition.event)?;
        if let Some(task) = &transition.task {
            insert_with(&tx, task)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn claim_due_tasks(&self, now: DateTime<Utc>, limit: i32) -> Result<Vec<LifecycleTask>> {
        let now_str = format_datetime(&now);
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut tasks = {
            let sql = format!(
                "SELECT {} FROM lifecycle_tasks
                 WHERE status = ?1 AND run_at <= ?2
                 ORDER BY run_at, id LIMIT ?3",
                LifecycleTask::COLUMNS.join(", ")
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(
                params![TaskStatus::Pending.as_str(), now_str, limit],
                LifecycleTask::from_row,
            )?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        for task in &mut tasks {
            tx.execute(
                "UPDATE lifecycle_tasks
                 SET status = ?1, attempts = attempts + 1, updated_at = ?2
                 WHERE id = ?3",
                params![TaskStatus::Running.as_str(), now_str, task.id],
            )?;
            task.status = TaskStatus::Running;
            task.attempts += 1;
            task.updated_at = now;
        }

        tx.commit()?;
        Ok(tasks)
    }

    fn complete_task(&self, id: &str) -> Result<()> {
        self.set_task_status(id, TaskStatus::Done, None, None)
    }

    fn retry_task(&self, id: &str, run_at: DateTime<Utc>, error: &str) -> Result<()> {
        self.set_task_status(id, TaskStatus::Pending, Some(run_at), Some(error))
    }

    fn fail_task(&self, id: &str, error: &str) -> Result<()> {
        self.set_task_status(id, TaskStatus::Failed, None, Some(error))
    }

    fn requeue_running_tasks(&self) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE lifecycle_tasks SET status = ?1, updated_at = ?2 WHERE status = ?3",
            params![
                TaskStatus::Pending.as_str(),
                format_datetime(&Utc::now()),
                TaskStatus::Running.as_str(),
            ],
        )?;
        Ok(rows)
    }

    fn list_target_tasks(&self, target_id: &str) -> Result<Vec<LifecycleTask>> {
        self.list_by("target_id", target_id, "created_at, id")
    }

    fn count_pending_tasks(&self) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM lifecycle_tasks WHERE status IN (?1, ?2)",
            params![TaskStatus::Pending.as_str(), TaskStatus::Running.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl SqliteStore {
    fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        run_at: Option<DateTime<Utc>>,
        error: Option<&str>,
    ) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE lifecycle_tasks
             SET status = ?1,
                 run_at = COALESCE(?2, run_at),
                 last_error = COALESCE(?3, last_error),
                 updated_at = ?4
             WHERE id = ?5",
            params![
                status.as_str(),
                run_at.as_ref().map(format_datetime),
                error,
                format_datetime(&Utc::now()),
                id,
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::super::test_support::store_with_school;
    use super::*;
    use crate::store::DomainStore;

    fn task(id: &str, run_at: DateTime<Utc>) -> LifecycleTask {
        let now = Utc::now();
        LifecycleTask {
            id: id.to_string(),
            kind: TaskKind::SslIssue,
            target_id: "cert-1".to_string(),
            run_at,
            attempts: 0,
            status: TaskStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_claim_only_due_tasks() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        store.insert(&task("due", now - Duration::seconds(1))).unwrap();
        store.insert(&task("later", now + Duration::hours(1))).unwrap();

        let claimed = store.claim_due_tasks(now, 10).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, "due");
        assert_eq!(claimed[0].status, TaskStatus::Running);
        assert_eq!(claimed[0].attempts, 1);

        // A claimed task is not handed out twice.
        assert!(store.claim_due_tasks(now, 10).unwrap().is_empty());
        assert_eq!(store.count_pending_tasks().unwrap(), 2);
    }

    #[test]
    fn test_retry_then_fail() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        store.insert(&task("t", now)).unwrap();
        store.claim_due_tasks(now, 10).unwrap();

        let retry_at = now + Duration::seconds(5);
        store.retry_task("t", retry_at, "boom").unwrap();
        assert!(store.claim_due_tasks(now, 10).unwrap().is_empty());

        let claimed = store.claim_due_tasks(retry_at, 10).unwrap();
        assert_eq!(claimed[0].attempts, 2);
        assert_eq!(claimed[0].last_error.as_deref(), Some("boom"));

        store.fail_task("t", "gave up").unwrap();
        let tasks = store.list_target_tasks("cert-1").unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Failed);
        assert_eq!(store.count_pending_tasks().unwrap(), 0);
    }

    #[test]
    fn test_requeue_running_after_restart() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        store.insert(&task("t", now)).unwrap();
        store.claim_due_tasks(now, 10).unwrap();

        assert_eq!(store.requeue_running_tasks().unwrap(), 1);
        let claimed = store.claim_due_tasks(now, 10).unwrap();
        assert_eq!(claimed.len(), 1);

        store.complete_task("t").unwrap();
        assert!(matches!(
            store.complete_task("missing"),
            Err(Error::NotFound)
        ));
    }
    fn transfer(status: TransferStatus) -> DomainTransfer {
        let now = Utc::now();
        DomainTransfer {
            id: "transfer-1".to_string(),
            school_id: "school-1".to_string(),
            domain: "greenwood.edu".to_string(),
            transfer_status: status,
            lock_status: LockStatus::Locked,
            auth_code: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(id: &str, from: Option<&str>, to: &str) -> LifecycleEvent {
        LifecycleEvent {
            id: id.to_string(),
            entity_kind: EntityKind::DomainTransfer,
            entity_id: "transfer-1".to_string(),
            from_status: from.map(str::to_string),
            to_status: to.to_string(),
            trigger: "test".to_string(),
            note: None,
            created_at: Utc::now(),
        }
    }

    fn advance_task(id: &str) -> LifecycleTask {
        LifecycleTask {
            kind: TaskKind::TransferAdvance,
            target_id: "transfer-1".to_string(),
            ..task(id, Utc::now())
        }
    }

    #[test]
    fn test_commit_transition_writes_entity_event_and_task() {
        let (_temp, store) = store_with_school();
        store
            .commit_transition(&Transition {
                write: EntityWrite::Insert(LifecycleEntity::Transfer(transfer(
                    TransferStatus::Pending,
                ))),
                event: event("ev-1", None, "PENDING"),
                task: Some(advance_task("task-1")),
            })
            .unwrap();

        store
            .commit_transition(&Transition {
                write: EntityWrite::Update {
                    entity: LifecycleEntity::Transfer(transfer(TransferStatus::Processing)),
                    expected: Some("PENDING".to_string()),
                },
                event: event("ev-2", Some("PENDING"), "PROCESSING"),
                task: Some(advance_task("task-2")),
            })
            .unwrap();

        let stored = store.get_transfer("transfer-1").unwrap().unwrap();
        assert_eq!(stored.transfer_status, TransferStatus::Processing);
        assert_eq!(
            store
                .list_events(EntityKind::DomainTransfer, "transfer-1")
                .unwrap()
                .len(),
            2
        );
        assert_eq!(store.list_target_tasks("transfer-1").unwrap().len(), 2);
    }

    #[test]
    fn test_stale_transition_writes_nothing() {
        let (_temp, store) = store_with_school();
        store
            .commit_transition(&Transition {
                write: EntityWrite::Insert(LifecycleEntity::Transfer(transfer(
                    TransferStatus::Cancelled,
                ))),
                event: event("ev-1", None, "CANCELLED"),
                task: None,
            })
            .unwrap();

        // Written against a PENDING copy that has since been cancelled.
        let result = store.commit_transition(&Transition {
            write: EntityWrite::Update {
                entity: LifecycleEntity::Transfer(transfer(TransferStatus::Processing)),
                expected: Some("PENDING".to_string()),
            },
            event: event("ev-2", Some("PENDING"), "PROCESSING"),
            task: Some(advance_task("task-1")),
        });
        assert!(matches!(result, Err(Error::Conflict(_))));

        let stored = store.get_transfer("transfer-1").unwrap().unwrap();
        assert_eq!(stored.transfer_status, TransferStatus::Cancelled);
        assert_eq!(
            store
                .list_events(EntityKind::DomainTransfer, "transfer-1")
                .unwrap()
                .len(),
            1
        );
        assert!(store.list_target_tasks("transfer-1").unwrap().is_empty());
    }

    #[test]
    fn test_failed_task_insert_rolls_back_entity() {
        let (_temp, store) = store_with_school();
        let mut first = advance_task("task-1");
        first.target_id = "other".to_string();
        store.insert(&first).unwrap();

        // Reusing a task id fails the last statement of the transaction.
        let result = store.commit_transition(&Transition {
            write: EntityWrite::Insert(LifecycleEntity::Transfer(transfer(
                TransferStatus::Pending,
            ))),
            event: event("ev-1", None, "PENDING"),
            task: Some(advance_task("task-1")),
        });
        assert!(matches!(result, Err(Error::AlreadyExists)));

        assert!(store.get_transfer("transfer-1").unwrap().is_none());
        assert!(
            store
                .list_events(EntityKind::DomainTransfer, "transfer-1")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_dns_propagation_stamps_only_propagated_at() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        let record = DnsRecord {
            id: "dns-1".to_string(),
            school_id: "school-1".to_string(),
            domain: "greenwood.edu".to_string(),
            record_type: DnsRecordType::A,
            name: "@".to_string(),
            value: "10.0.0.1".to_string(),
            ttl: 3600,
            priority: None,
            propagated_at: None,
            created_at: now,
            updated_at: now,
        };
        store.insert(&record).unwrap();

        let dns_event = LifecycleEvent {
            entity_kind: EntityKind::DnsRecord,
            entity_id: "dns-1".to_string(),
            ..event("ev-1", Some("SAVED"), "PROPAGATED")
        };
        store
            .commit_transition(&Transition {
                write: EntityWrite::DnsPropagated {
                    record_id: "dns-1".to_string(),
                    at: now,
                },
                event: dns_event.clone(),
                task: None,
            })
            .unwrap();

        let stored = store.get_dns_record("dns-1").unwrap().unwrap();
        assert_eq!(
            stored.propagated_at.as_ref().map(format_datetime),
            Some(format_datetime(&now))
        );
        assert_eq!(stored.value, "10.0.0.1");

        let missing = store.commit_transition(&Transition {
            write: EntityWrite::DnsPropagated {
                record_id: "gone".to_string(),
                at: now,
            },
            event: LifecycleEvent {
                id: "ev-2".to_string(),
                ..dns_event
            },
            task: None,
        });
        assert!(matches!(missing, Err(Error::NotFound)));
    }
}
