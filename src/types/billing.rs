use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlanTier;

string_enum! {
    pub enum BillingCycle {
        Monthly => "MONTHLY",
        Yearly => "YEARLY",
    }
}

string_enum! {
    pub enum OrderStatus {
        Created => "CREATED",
        Paid => "PAID",
    }
}

/// An order opened with the payment provider, awaiting payment.
/// `id` is the provider's order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingOrder {
    pub id: String,
    pub school_id: String,
    pub plan: PlanTier,
    pub cycle: BillingCycle,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub school_id: String,
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub school_id: String,
    pub plan: PlanTier,
    pub cycle: BillingCycle,
    pub amount: i64,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub created_at: DateTime<Utc>,
}

/// Everything written when a verified payment activates a plan.
#[derive(Debug, Clone)]
pub struct Activation {
    pub order_id: String,
    pub school_id: String,
    pub plan: PlanTier,
    pub subscription_ends: DateTime<Utc>,
    pub payment: Payment,
    pub subscription: Subscription,
    pub flags: Vec<super::FeatureFlag>,
}
