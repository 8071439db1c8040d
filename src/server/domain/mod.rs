mod custom;
mod dns;
mod privacy;
mod ssl;
mod transfers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::error::Error;
use crate::server::AppState;
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::{DomainStore, Store};
use crate::types::{EntityKind, LifecycleEvent};

/// Maps lifecycle failures, naming the entity on 404 and unique-domain 409.
fn lifecycle_err(label: &'static str) -> impl Fn(Error) -> ApiError {
    move |err| match err {
        Error::NotFound => ApiError::not_found(format!("{label} not found")),
        Error::AlreadyExists => {
            ApiError::conflict(format!("{label} for this domain already exists"))
        }
        e => ApiError::from(e),
    }
}

/// Transition history of one entity, oldest first.
fn entity_events(
    store: &dyn Store,
    kind: EntityKind,
    id: &str,
) -> Result<Vec<LifecycleEvent>, ApiError> {
    store.list_events(kind, id).api_err("Failed to list events")
}

pub fn domain_router() -> Router<Arc<AppState>> {
    Router::new()
        // Custom domain
        .route(
            "/domain",
            get(custom::get_domain)
                .put(custom::set_domain)
                .delete(custom::remove_domain),
        )
        .route("/domain/verify", post(custom::verify_domain))
        // DNS records
        .route("/dns", get(dns::list_records).post(dns::create_record))
        .route(
            "/dns/{id}",
            get(dns::get_record)
                .put(dns::update_record)
                .delete(dns::delete_record),
        )
        // SSL certificates
        .route(
            "/ssl",
            get(ssl::list_certificates).post(ssl::request_certificate),
        )
        .route(
            "/ssl/{id}",
            get(ssl::get_certificate).delete(ssl::delete_certificate),
        )
        .route("/ssl/{id}/renew", post(ssl::renew_certificate))
        .route("/ssl/{id}/events", get(ssl::certificate_events))
        // WHOIS privacy
        .route(
            "/privacy",
            get(privacy::list_privacy).post(privacy::enable_privacy),
        )
        .route(
            "/privacy/{id}",
            get(privacy::get_privacy).delete(privacy::disable_privacy),
        )
        .route("/privacy/{id}/events", get(privacy::privacy_events))
        // Domain transfers
        .route(
            "/transfers",
            get(transfers::list_transfers).post(transfers::create_transfer),
        )
        .route(
            "/transfers/{id}",
            get(transfers::get_transfer).put(transfers::apply_action),
        )
        .route("/transfers/{id}/events", get(transfers::transfer_events))
}
