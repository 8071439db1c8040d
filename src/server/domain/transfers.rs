use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{entity_events, lifecycle_err};
use crate::auth::RequireSchoolAdmin;
use crate::server::AppState;
use crate::server::access::{require_feature, require_owned};
use crate::server::dto::{CreateTransferRequest, TransferActionRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::normalize_domain;
use crate::store::{DomainStore, Store};
use crate::types::{DomainTransfer, EntityKind, Feature, School};

const LABEL: &str = "Transfer";

fn load_transfer(store: &dyn Store, school: &School, id: &str) -> Result<DomainTransfer, ApiError> {
    require_feature(store, school, Feature::DomainTransfer)?;
    require_owned(
        store.get_transfer(id).api_err("Failed to get transfer")?,
        |t: &DomainTransfer| t.school_id.as_str(),
        school,
        "Transfer not found",
    )
}

pub async fn list_transfers(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::DomainTransfer)?;

    let transfers = store
        .list_transfers(&auth.school.id)
        .api_err("Failed to list transfers")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(transfers)))
}

pub async fn create_transfer(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    require_feature(state.store.as_ref(), &auth.school, Feature::DomainTransfer)?;

    let domain = normalize_domain(&req.domain)?;
    let auth_code = req
        .auth_code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let transfer = state
        .lifecycle
        .start_transfer(&auth.school.id, &domain, auth_code, req.notes)
        .map_err(lifecycle_err(LABEL))?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(transfer))))
}

pub async fn get_transfer(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let transfer = load_transfer(state.store.as_ref(), &auth.school, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(transfer)))
}

/// Applies an operator action; combinations the transition table rejects
/// answer 409.
pub async fn apply_action(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TransferActionRequest>,
) -> impl IntoResponse {
    let transfer = load_transfer(state.store.as_ref(), &auth.school, &id)?;
    let transfer = state
        .lifecycle
        .apply_transfer_action(&transfer.id, req.action, req.auth_code)
        .map_err(lifecycle_err(LABEL))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(transfer)))
}

pub async fn transfer_events(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let transfer = load_transfer(store, &auth.school, &id)?;
    let events = entity_events(store, EntityKind::DomainTransfer, &transfer.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(events)))
}
