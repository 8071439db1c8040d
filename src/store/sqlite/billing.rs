use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Row, params};

use super::record::Record;
use super::tenant::upsert_flag;
use super::{SqliteStore, format_datetime, get_enum, get_time, insert_with, int, label, text, time};
use crate::error::{Error, Result};
use crate::store::BillingStore;
use crate::types::*;

impl Record for BillingOrder {
    const TABLE: &'static str = "billing_orders";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "plan",
        "cycle",
        "amount",
        "currency",
        "receipt",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(BillingOrder {
            id: row.get(0)?,
            school_id: row.get(1)?,
            plan: get_enum(row, 2)?,
            cycle: get_enum(row, 3)?,
            amount: row.get(4)?,
            currency: row.get(5)?,
            receipt: row.get(6)?,
            status: get_enum(row, 7)?,
            created_at: get_time(row, 8)?,
            updated_at: get_time(row, 9)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            label(self.plan),
            label(self.cycle),
            int(self.amount),
            text(&self.currency),
            text(&self.receipt),
            label(self.status),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Payment {
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "provider_order_id",
        "provider_payment_id",
        "amount",
        "currency",
        "status",
        "created_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            school_id: row.get(1)?,
            provider_order_id: row.get(2)?,
            provider_payment_id: row.get(3)?,
            amount: row.get(4)?,
            currency: row.get(5)?,
            status: row.get(6)?,
            created_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.provider_order_id),
            text(&self.provider_payment_id),
            int(self.amount),
            text(&self.currency),
            text(&self.status),
            time(&self.created_at),
        ]
    }
}

impl Record for Subscription {
    const TABLE: &'static str = "subscriptions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "plan",
        "cycle",
        "amount",
        "status",
        "starts_at",
        "ends_at",
        "provider_order_id",
        "provider_payment_id",
        "created_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            school_id: row.get(1)?,
            plan: get_enum(row, 2)?,
            cycle: get_enum(row, 3)?,
            amount: row.get(4)?,
            status: row.get(5)?,
            starts_at: get_time(row, 6)?,
            ends_at: get_time(row, 7)?,
            provider_order_id: row.get(8)?,
            provider_payment_id: row.get(9)?,
            created_at: get_time(row, 10)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            label(self.plan),
            label(self.cycle),
            int(self.amount),
            text(&self.status),
            time(&self.starts_at),
            time(&self.ends_at),
            text(&self.provider_order_id),
            text(&self.provider_payment_id),
            time(&self.created_at),
        ]
    }
}

impl BillingStore for SqliteStore {
    fn create_billing_order(&self, order: &BillingOrder) -> Result<()> {
        self.insert(order)
    }

    fn get_billing_order(&self, id: &str) -> Result<Option<BillingOrder>> {
        self.find(id)
    }

    fn activate_subscription(&self, activation: &Activation) -> Result<()> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let claimed = tx.execute(
            "UPDATE billing_orders SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                OrderStatus::Paid.as_str(),
                now,
                activation.order_id,
                OrderStatus::Created.as_str(),
            ],
        )?;
        if claimed == 0 {
            return Err(Error::Conflict(format!(
                "order {} is not awaiting payment",
                activation.order_id
            )));
        }

        insert_with(&tx, &activation.payment)?;
        insert_with(&tx, &activation.subscription)?;

        let updated = tx.execute(
            "UPDATE schools SET plan = ?1, subscription_ends = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                activation.plan.as_str(),
                format_datetime(&activation.subscription_ends),
                now,
                activation.school_id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound);
        }

        for flag in &activation.flags {
            upsert_flag(&tx, flag)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_subscription_by_order(&self, order_id: &str) -> Result<Option<Subscription>> {
        self.find_by("provider_order_id", order_id)
    }

    fn list_subscriptions(&self, school_id: &str) -> Result<Vec<Subscription>> {
        self.list_by("school_id", school_id, "created_at DESC, id")
    }

    fn list_payments(&self, school_id: &str) -> Result<Vec<Payment>> {
        self.list_by("school_id", school_id, "created_at DESC, id")
    }
}
