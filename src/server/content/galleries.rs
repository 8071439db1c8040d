use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::dto::{CreateGalleryImage, UpdateGalleryImage};
use super::handlers::{gate, load, write_err};
use crate::auth::RequireSchoolUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{required, required_opt};
use crate::store::{ContentStore, OrderedTable, Store};
use crate::types::{Gallery, GalleryImage, OrderEntry, School};

fn load_image(
    store: &dyn Store,
    gallery: &Gallery,
    id: &str,
) -> Result<GalleryImage, ApiError> {
    match store
        .get_gallery_image(id)
        .api_err("Failed to get image")?
    {
        Some(image) if image.gallery_id == gallery.id => Ok(image),
        _ => Err(ApiError::not_found("Image not found")),
    }
}

fn load_gallery(store: &dyn Store, school: &School, id: &str) -> Result<Gallery, ApiError> {
    gate::<Gallery>(store, school)?;
    load::<Gallery>(store, school, id)
}

pub async fn list_images(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(gallery_id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let gallery = load_gallery(store, &auth.school, &gallery_id)?;

    let images = store
        .list_gallery_images(&gallery.id)
        .api_err("Failed to list images")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(images)))
}

pub async fn create_image(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(gallery_id): Path<String>,
    Json(req): Json<CreateGalleryImage>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let gallery = load_gallery(store, &auth.school, &gallery_id)?;

    let now = Utc::now();
    let mut image = GalleryImage {
        id: Uuid::new_v4().to_string(),
        school_id: gallery.school_id.clone(),
        gallery_id: gallery.id.clone(),
        url: required(&req.url, "url")?,
        caption: req.caption,
        order: 0,
        created_at: now,
        updated_at: now,
    };
    store
        .create_gallery_image(&mut image)
        .api_err("Failed to create image")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(image))))
}

pub async fn update_image(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path((gallery_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateGalleryImage>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let gallery = load_gallery(store, &auth.school, &gallery_id)?;
    let mut image = load_image(store, &gallery, &id)?;

    if let Some(url) = required_opt(req.url, "url")? {
        image.url = url;
    }
    if req.caption.is_some() {
        image.caption = req.caption;
    }
    if let Some(order) = req.order {
        image.order = order;
    }
    image.updated_at = Utc::now();

    store
        .update_gallery_image(&image)
        .api_err("Failed to update image")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(image)))
}

pub async fn delete_image(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path((gallery_id, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let gallery = load_gallery(store, &auth.school, &gallery_id)?;
    let image = load_image(store, &gallery, &id)?;

    store
        .delete_gallery_image(&image.id)
        .api_err("Failed to delete image")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn reorder_images(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(gallery_id): Path<String>,
    Json(entries): Json<Vec<OrderEntry>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let gallery = load_gallery(store, &auth.school, &gallery_id)?;

    store
        .reorder(OrderedTable::GalleryImages, &gallery.id, &entries)
        .map_err(|e| match e {
            Error::NotFound => ApiError::not_found("Image not found"),
            e => write_err::<Gallery>(e),
        })?;

    let images = store
        .list_gallery_images(&gallery.id)
        .api_err("Failed to list images")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(images)))
}
