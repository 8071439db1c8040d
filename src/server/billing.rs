use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireSchoolAdmin;
use crate::billing::{self, Billing, CURRENCY};
use crate::error::Error;
use crate::features::plan_features;
use crate::server::AppState;
use crate::server::dto::{
    CreateOrderRequest, CreateOrderResponse, PlanResponse, VerifyPaymentRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::store::{BillingStore, Store};
use crate::types::{BillingCycle, BillingOrder, OrderStatus, PlanTier, Subscription};

const SIGNATURE_HEADER: &str = "x-razorpay-signature";
const PAYMENT_CAPTURED: &str = "payment.captured";

pub fn billing_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/orders", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/webhook", post(webhook))
        .route("/subscription", get(get_subscription))
        .route("/payments", get(list_payments))
}

fn configured(state: &AppState) -> Result<&Billing, ApiError> {
    state
        .billing
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("Billing is not configured"))
}

/// Writes the payment, subscription and plan change for a settled order.
/// Settling an already paid order returns its existing subscription.
fn settle(
    store: &dyn Store,
    order: &BillingOrder,
    payment_id: &str,
) -> Result<Subscription, ApiError> {
    if order.status == OrderStatus::Created {
        match store.activate_subscription(&billing::activation(order, payment_id, Utc::now())) {
            Ok(()) => {
                tracing::info!(
                    school = %order.school_id,
                    order = %order.id,
                    plan = %order.plan,
                    cycle = %order.cycle,
                    "Subscription activated"
                );
            }
            // Paid concurrently by the webhook or a second callback.
            Err(Error::Conflict(_)) => {}
            Err(e) => return Err(ApiError::from(e)),
        }
    }

    store
        .get_subscription_by_order(&order.id)
        .api_err("Failed to get subscription")?
        .or_not_found("Subscription not found")
}

async fn list_plans() -> impl IntoResponse {
    let plans: Vec<PlanResponse> = PlanTier::ALL
        .iter()
        .map(|&plan| PlanResponse {
            plan,
            monthly_price: billing::price(plan, BillingCycle::Monthly),
            yearly_price: billing::price(plan, BillingCycle::Yearly),
            currency: CURRENCY,
            features: plan_features(plan)
                .iter()
                .filter(|(_, enabled)| *enabled)
                .map(|(feature, _)| feature.as_str())
                .collect(),
        })
        .collect();

    Json(ApiResponse::success(plans))
}

async fn create_order(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    if req.plan == PlanTier::Free {
        return Err(ApiError::bad_request("The FREE plan cannot be purchased"));
    }
    let billing = configured(&state)?;

    let amount = billing::price(req.plan, req.cycle);
    let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
    let provider_order = billing
        .provider
        .create_order(amount, CURRENCY, &receipt)
        .await
        .map_err(ApiError::from)?;

    let now = Utc::now();
    let order = BillingOrder {
        id: provider_order.id,
        school_id: auth.school.id.clone(),
        plan: req.plan,
        cycle: req.cycle,
        amount,
        currency: CURRENCY.to_string(),
        receipt,
        status: OrderStatus::Created,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_billing_order(&order)
        .api_err("Failed to store order")?;

    tracing::info!(school = %order.school_id, order = %order.id, amount, "Billing order created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateOrderResponse {
            order_id: order.id,
            amount,
            currency: order.currency,
            key_id: billing.key_id.clone(),
            plan: order.plan,
            cycle: order.cycle,
        })),
    ))
}

/// Checkout callback: the signature must match before anything is written.
async fn verify_payment(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> impl IntoResponse {
    let billing = configured(&state)?;
    let store = state.store.as_ref();

    let order = match store
        .get_billing_order(&req.razorpay_order_id)
        .api_err("Failed to get order")?
    {
        Some(order) if order.school_id == auth.school.id => order,
        _ => return Err(ApiError::not_found("Order not found")),
    };

    if order.status == OrderStatus::Paid {
        let subscription = settle(store, &order, &req.razorpay_payment_id)?;
        return Ok(Json(ApiResponse::success(subscription)));
    }

    if !billing.verify_payment(&order.id, &req.razorpay_payment_id, &req.razorpay_signature) {
        tracing::warn!(school = %auth.school.id, order = %order.id, "Payment signature mismatch");
        return Err(ApiError::bad_request("Invalid payment signature"));
    }

    let subscription = settle(store, &order, &req.razorpay_payment_id)?;
    Ok(Json(ApiResponse::success(subscription)))
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: Option<WebhookPayload>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    payment: Option<WebhookEntity>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntity {
    entity: WebhookPayment,
}

#[derive(Debug, Deserialize)]
struct WebhookPayment {
    id: String,
    order_id: Option<String>,
}

/// Provider webhook. The raw body is authenticated with the webhook secret;
/// events other than `payment.captured` are acknowledged and ignored.
async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let billing = configured(&state)?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !billing.verify_webhook(&body, signature) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(ApiError::bad_request("Invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid webhook payload: {e}")))?;
    if event.event != PAYMENT_CAPTURED {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(StatusCode::OK);
    }

    let Some(payment) = event.payload.and_then(|p| p.payment).map(|p| p.entity) else {
        return Err(ApiError::bad_request("Webhook payload has no payment"));
    };
    let Some(order_id) = payment.order_id else {
        tracing::warn!(payment = %payment.id, "Captured payment has no order");
        return Ok(StatusCode::OK);
    };

    let store = state.store.as_ref();
    match store
        .get_billing_order(&order_id)
        .api_err("Failed to get order")?
    {
        Some(order) => {
            settle(store, &order, &payment.id)?;
        }
        None => {
            tracing::warn!(order = %order_id, "Webhook references an unknown order");
        }
    }

    Ok(StatusCode::OK)
}

async fn get_subscription(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let subscription = state
        .store
        .list_subscriptions(&auth.school.id)
        .api_err("Failed to list subscriptions")?
        .into_iter()
        .next();

    Ok::<_, ApiError>(Json(ApiResponse::success(subscription)))
}

async fn list_payments(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let payments = state
        .store
        .list_payments(&auth.school.id)
        .api_err("Failed to list payments")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(payments)))
}
