//! CRUD and reorder handlers shared by every [`ContentResource`].

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use super::resource::{ContentResource, OrderedResource};
use crate::auth::RequireSchoolUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::access::require_feature;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::store::{ContentStore, Store};
use crate::types::{OrderEntry, School};

type ApiResult<T> = Result<T, ApiError>;

pub(super) fn gate<T: ContentResource>(store: &dyn Store, school: &School) -> ApiResult<()> {
    match T::FEATURE {
        Some(feature) => require_feature(store, school, feature),
        None => Ok(()),
    }
}

pub(super) fn not_found<T: ContentResource>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::LABEL))
}

/// Maps write failures, naming the resource on unique-key conflicts.
pub(super) fn write_err<T: ContentResource>(err: Error) -> ApiError {
    match err {
        Error::AlreadyExists => ApiError::conflict(format!("{} already exists", T::LABEL)),
        Error::NotFound => not_found::<T>(),
        e => ApiError::from(e),
    }
}

/// Loads a record, answering 404 for ids of other schools.
pub(super) fn load<T: ContentResource>(store: &dyn Store, school: &School, id: &str) -> ApiResult<T> {
    match T::fetch(store, id).api_err("Failed to load content")? {
        Some(item) if item.school_id() == school.id => Ok(item),
        _ => Err(not_found::<T>()),
    }
}

pub async fn list<T: ContentResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<T>>>> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    let items = T::list(store, &auth.school.id).api_err("Failed to list content")?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn create<T: ContentResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<T::Create>,
) -> ApiResult<(StatusCode, Json<ApiResponse<T>>)> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    let mut item = T::build(req, &auth.school.id, Utc::now())?;
    T::insert(store, &mut item).map_err(write_err::<T>)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn get_one<T: ContentResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<T>>> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    let item = load::<T>(store, &auth.school, &id)?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn update<T: ContentResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<T::Update>,
) -> ApiResult<Json<ApiResponse<T>>> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    let mut item = load::<T>(store, &auth.school, &id)?;
    item.apply(req)?;
    item.touch(Utc::now());
    T::save(store, &item).map_err(write_err::<T>)?;

    Ok(Json(ApiResponse::success(item)))
}

pub async fn delete<T: ContentResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    let item = load::<T>(store, &auth.school, &id)?;
    T::remove(store, item.id()).api_err("Failed to delete content")?;

    Ok(StatusCode::NO_CONTENT)
}

/// Applies `[{id, order}, ...]` atomically and returns the reordered list.
pub async fn reorder<T: OrderedResource>(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<OrderEntry>>,
) -> ApiResult<Json<ApiResponse<Vec<T>>>> {
    let store = state.store.as_ref();
    gate::<T>(store, &auth.school)?;

    store
        .reorder(T::TABLE, &auth.school.id, &entries)
        .map_err(write_err::<T>)?;

    let items = T::list(store, &auth.school.id).api_err("Failed to list content")?;
    Ok(Json(ApiResponse::success(items)))
}
