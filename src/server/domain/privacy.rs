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
use crate::server::dto::DomainRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::normalize_domain;
use crate::store::{DomainStore, Store};
use crate::types::{EntityKind, Feature, PrivacyStatus, School, WhoisPrivacy};

const LABEL: &str = "Privacy record";

fn load_privacy(store: &dyn Store, school: &School, id: &str) -> Result<WhoisPrivacy, ApiError> {
    require_feature(store, school, Feature::WhoisPrivacy)?;
    require_owned(
        store
            .get_whois_privacy(id)
            .api_err("Failed to get privacy record")?,
        |p: &WhoisPrivacy| p.school_id.as_str(),
        school,
        "Privacy record not found",
    )
}

pub async fn list_privacy(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::WhoisPrivacy)?;

    let records = store
        .list_whois_privacy(&auth.school.id)
        .api_err("Failed to list privacy records")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(records)))
}

pub async fn enable_privacy(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DomainRequest>,
) -> impl IntoResponse {
    require_feature(state.store.as_ref(), &auth.school, Feature::WhoisPrivacy)?;

    let domain = normalize_domain(&req.domain)?;
    let privacy = state
        .lifecycle
        .enable_privacy(&auth.school.id, &domain)
        .map_err(lifecycle_err(LABEL))?;

    let status = if privacy.status == PrivacyStatus::Active {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok::<_, ApiError>((status, Json(ApiResponse::success(privacy))))
}

pub async fn get_privacy(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let privacy = load_privacy(state.store.as_ref(), &auth.school, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(privacy)))
}

pub async fn disable_privacy(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let privacy = load_privacy(state.store.as_ref(), &auth.school, &id)?;
    let privacy = state
        .lifecycle
        .disable_privacy(&privacy.id)
        .map_err(lifecycle_err(LABEL))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(privacy)))
}

pub async fn privacy_events(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let privacy = load_privacy(store, &auth.school, &id)?;
    let events = entity_events(store, EntityKind::WhoisPrivacy, &privacy.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(events)))
}
