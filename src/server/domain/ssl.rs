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
use crate::types::{EntityKind, Feature, School, SslCertificate};

const LABEL: &str = "Certificate";

fn load_certificate(
    store: &dyn Store,
    school: &School,
    id: &str,
) -> Result<SslCertificate, ApiError> {
    require_feature(store, school, Feature::SslCertificate)?;
    require_owned(
        store
            .get_ssl_certificate(id)
            .api_err("Failed to get certificate")?,
        |c: &SslCertificate| c.school_id.as_str(),
        school,
        "Certificate not found",
    )
}

pub async fn list_certificates(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::SslCertificate)?;

    let certs = store
        .list_ssl_certificates(&auth.school.id)
        .api_err("Failed to list certificates")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(certs)))
}

/// Opens a PENDING certificate; issuance happens in the background.
pub async fn request_certificate(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DomainRequest>,
) -> impl IntoResponse {
    require_feature(state.store.as_ref(), &auth.school, Feature::SslCertificate)?;

    let domain = normalize_domain(&req.domain)?;
    let cert = state
        .lifecycle
        .request_certificate(&auth.school.id, &domain)
        .map_err(lifecycle_err(LABEL))?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(cert))))
}

pub async fn get_certificate(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let cert = load_certificate(state.store.as_ref(), &auth.school, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(cert)))
}

pub async fn renew_certificate(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let cert = load_certificate(state.store.as_ref(), &auth.school, &id)?;
    let cert = state
        .lifecycle
        .renew_certificate(&cert.id)
        .map_err(lifecycle_err(LABEL))?;

    Ok::<_, ApiError>((StatusCode::ACCEPTED, Json(ApiResponse::success(cert))))
}

pub async fn delete_certificate(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let cert = load_certificate(store, &auth.school, &id)?;
    store
        .delete_ssl_certificate(&cert.id)
        .api_err("Failed to delete certificate")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn certificate_events(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let cert = load_certificate(store, &auth.school, &id)?;
    let events = entity_events(store, EntityKind::SslCertificate, &cert.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(events)))
}
