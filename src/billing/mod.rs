//! Plan pricing, payment verification and subscription activation.

mod provider;
pub mod signature;

pub use provider::{PaymentProvider, ProviderOrder, RazorpayClient};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::error::Result;
use crate::features::plan_features;
use crate::types::{
    Activation, BillingCycle, BillingOrder, FeatureFlag, Payment, PlanTier, Subscription,
};

pub const CURRENCY: &str = "INR";
const YEARLY_MONTHS_CHARGED: i64 = 10;

/// Monthly list price in paise.
#[must_use]
pub const fn monthly_price(plan: PlanTier) -> i64 {
    match plan {
        PlanTier::Free => 0,
        PlanTier::Basic => 99_900,
        PlanTier::Standard => 249_900,
        PlanTier::Premium => 499_900,
    }
}

#[must_use]
pub const fn price(plan: PlanTier, cycle: BillingCycle) -> i64 {
    match cycle {
        BillingCycle::Monthly => monthly_price(plan),
        BillingCycle::Yearly => monthly_price(plan) * YEARLY_MONTHS_CHARGED,
    }
}

#[must_use]
pub fn period(cycle: BillingCycle) -> Duration {
    match cycle {
        BillingCycle::Monthly => Duration::days(30),
        BillingCycle::Yearly => Duration::days(365),
    }
}

/// Builds every row written when `payment_id` settles `order`.
#[must_use]
pub fn activation(order: &BillingOrder, payment_id: &str, now: DateTime<Utc>) -> Activation {
    let ends = now + period(order.cycle);

    let flags = plan_features(order.plan)
        .iter()
        .map(|(feature, enabled)| FeatureFlag {
            school_id: order.school_id.clone(),
            feature: *feature,
            is_enabled: *enabled,
            updated_at: now,
        })
        .collect();

    Activation {
        order_id: order.id.clone(),
        school_id: order.school_id.clone(),
        plan: order.plan,
        subscription_ends: ends,
        payment: Payment {
            id: Uuid::new_v4().to_string(),
            school_id: order.school_id.clone(),
            provider_order_id: order.id.clone(),
            provider_payment_id: payment_id.to_string(),
            amount: order.amount,
            currency: order.currency.clone(),
            status: "captured".to_string(),
            created_at: now,
        },
        subscription: Subscription {
            id: Uuid::new_v4().to_string(),
            school_id: order.school_id.clone(),
            plan: order.plan,
            cycle: order.cycle,
            amount: order.amount,
            status: "ACTIVE".to_string(),
            starts_at: now,
            ends_at: ends,
            provider_order_id: order.id.clone(),
            provider_payment_id: payment_id.to_string(),
            created_at: now,
        },
        flags,
    }
}

/// Provider handle and secrets of a configured billing account.
pub struct Billing {
    pub provider: Arc<dyn PaymentProvider>,
    pub key_id: String,
    key_secret: String,
    webhook_secret: Option<String>,
}

impl Billing {
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        key_id: String,
        key_secret: String,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            provider,
            key_id,
            key_secret,
            webhook_secret,
        }
    }

    /// Returns `None` when the key id or secret is missing.
    pub fn from_config(config: &BillingConfig) -> Result<Option<Self>> {
        let (Some(key_id), Some(key_secret)) = (&config.key_id, &config.key_secret) else {
            return Ok(None);
        };
        let client = RazorpayClient::new(&config.api_base, key_id, key_secret)?;
        Ok(Some(Self::new(
            Arc::new(client),
            key_id.clone(),
            key_secret.clone(),
            config.webhook_secret.clone(),
        )))
    }

    #[must_use]
    pub fn verify_payment(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature::verify_payment(&self.key_secret, order_id, payment_id, signature)
    }

    /// False when no webhook secret is configured.
    #[must_use]
    pub fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        self.webhook_secret
            .as_deref()
            .is_some_and(|secret| signature::verify(secret, body, signature))
    }
}
