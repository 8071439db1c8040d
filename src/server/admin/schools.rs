use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequirePlatformAdmin;
use crate::server::AppState;
use crate::server::access::school_features;
use crate::server::dto::{
    AdminSchoolResponse, AdminUpdateSchoolRequest, FeatureOverrideRequest, PaginationParams,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt,
    StoreResultExt, paginate,
};
use crate::store::{Store, TenantStore};
use crate::types::{Feature, FeatureFlag, School, SchoolUpdate};

fn load_school(store: &dyn Store, id: &str) -> Result<School, ApiError> {
    store
        .get_school(id)
        .api_err("Failed to get school")?
        .or_not_found("School not found")
}

fn school_response(store: &dyn Store, school: School) -> Result<AdminSchoolResponse, ApiError> {
    let features = school_features(store, &school)?;
    let overrides = store
        .list_feature_flags(&school.id)
        .api_err("Failed to load feature flags")?;
    Ok(AdminSchoolResponse {
        school,
        features,
        overrides,
    })
}

fn parse_feature(name: &str) -> Result<Feature, ApiError> {
    name.parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown feature '{name}'")))
}

pub async fn list_schools(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let schools = state
        .store
        .list_schools(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list schools")?;

    let (schools, next_cursor, has_more) =
        paginate(schools, DEFAULT_PAGE_SIZE as usize, |s| s.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(schools, next_cursor, has_more)))
}

pub async fn get_school(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = load_school(store, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(school_response(store, school)?)))
}

/// Sets plan, status or subscription end directly, bypassing billing.
pub async fn update_school(
    admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AdminUpdateSchoolRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    load_school(store, &id)?;

    let update = SchoolUpdate {
        plan: req.plan,
        status: req.status,
        subscription_ends: req.subscription_ends,
        ..SchoolUpdate::default()
    };
    let school = store
        .update_school(&id, &update)
        .api_err("Failed to update school")?;

    tracing::info!(
        admin = %admin.user.id,
        school = %school.id,
        plan = %school.plan,
        status = %school.status,
        "School updated by platform admin"
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(school_response(store, school)?)))
}

pub async fn set_feature_override(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path((id, feature)): Path<(String, String)>,
    Json(req): Json<FeatureOverrideRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let feature = parse_feature(&feature)?;
    let school = load_school(store, &id)?;

    store
        .upsert_feature_flag(&FeatureFlag {
            school_id: school.id.clone(),
            feature,
            is_enabled: req.is_enabled,
            updated_at: Utc::now(),
        })
        .api_err("Failed to set feature override")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(school_response(store, school)?)))
}

pub async fn delete_feature_override(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path((id, feature)): Path<(String, String)>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let feature = parse_feature(&feature)?;
    let school = load_school(store, &id)?;

    let deleted = store
        .delete_feature_flag(&school.id, feature)
        .api_err("Failed to delete feature override")?;
    if !deleted {
        return Err(ApiError::not_found("Feature override not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
