use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireSchoolAdmin;
use crate::dns::{DEFAULT_TTL, RecordInput, validate_record};
use crate::server::AppState;
use crate::server::access::{require_feature, require_owned};
use crate::server::dto::{CreateDnsRecordRequest, UpdateDnsRecordRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::normalize_domain;
use crate::store::{DomainStore, Store};
use crate::types::{DnsRecord, Feature, School};

fn check(record: &DnsRecord) -> Result<(), ApiError> {
    validate_record(&RecordInput {
        record_type: record.record_type,
        name: &record.name,
        value: &record.value,
        ttl: record.ttl,
        priority: record.priority,
    })
    .map_err(ApiError::bad_request)
}

fn load_record(store: &dyn Store, school: &School, id: &str) -> Result<DnsRecord, ApiError> {
    require_owned(
        store.get_dns_record(id).api_err("Failed to get DNS record")?,
        |r: &DnsRecord| r.school_id.as_str(),
        school,
        "DNS record not found",
    )
}

pub async fn list_records(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::CustomDomain)?;

    let records = store
        .list_dns_records(&auth.school.id)
        .api_err("Failed to list DNS records")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(records)))
}

pub async fn create_record(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDnsRecordRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = auth.school;
    require_feature(store, &school, Feature::CustomDomain)?;

    let domain = match req.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(domain) => normalize_domain(domain)?,
        None => school
            .custom_domain
            .clone()
            .unwrap_or_else(|| school.platform_host(&state.public_host_suffix)),
    };

    let now = Utc::now();
    let record = DnsRecord {
        id: Uuid::new_v4().to_string(),
        school_id: school.id.clone(),
        domain,
        record_type: req.record_type,
        name: req.name.trim().to_string(),
        value: req.value.trim().to_string(),
        ttl: req.ttl.unwrap_or(DEFAULT_TTL),
        priority: req.priority,
        propagated_at: None,
        created_at: now,
        updated_at: now,
    };
    check(&record)?;

    state
        .lifecycle
        .save_dns_record(&record, true)
        .api_err("Failed to create DNS record")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

pub async fn get_record(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::CustomDomain)?;

    let record = load_record(store, &auth.school, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(record)))
}

/// Partial update; the merged record is revalidated and propagated again.
pub async fn update_record(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDnsRecordRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::CustomDomain)?;

    let mut record = load_record(store, &auth.school, &id)?;
    if let Some(name) = req.name {
        record.name = name.trim().to_string();
    }
    if let Some(value) = req.value {
        record.value = value.trim().to_string();
    }
    if let Some(ttl) = req.ttl {
        record.ttl = ttl;
    }
    if req.priority.is_some() {
        record.priority = req.priority;
    }
    check(&record)?;

    record.propagated_at = None;
    record.updated_at = Utc::now();
    state
        .lifecycle
        .save_dns_record(&record, false)
        .api_err("Failed to update DNS record")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(record)))
}

pub async fn delete_record(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::CustomDomain)?;

    let record = load_record(store, &auth.school, &id)?;
    store
        .delete_dns_record(&record.id)
        .api_err("Failed to delete DNS record")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
