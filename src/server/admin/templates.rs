use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequirePlatformAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateCatalogTemplateRequest, UpdateCatalogTemplateRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{required, required_opt};
use crate::store::{ContentStore, Store};
use crate::types::Template;

fn load_catalog(store: &dyn Store, id: &str) -> Result<Template, ApiError> {
    store
        .get_template(id)
        .api_err("Failed to load template")?
        .filter(|t| t.school_id.is_none())
        .ok_or_else(|| ApiError::not_found("Catalog template not found"))
}

pub async fn list_templates(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let templates = state
        .store
        .list_catalog_templates()
        .api_err("Failed to list templates")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(templates)))
}

pub async fn create_template(
    admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCatalogTemplateRequest>,
) -> impl IntoResponse {
    let now = Utc::now();
    let template = Template {
        id: Uuid::new_v4().to_string(),
        school_id: None,
        name: required(&req.name, "name")?,
        description: req.description,
        config: req.config.unwrap_or_else(|| serde_json::json!({})),
        is_premium: req.is_premium,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .create_template(&template)
        .api_err("Failed to create template")?;

    tracing::info!(
        admin = %admin.user.id,
        template = %template.id,
        premium = template.is_premium,
        "Catalog template created"
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(template))))
}

pub async fn update_template(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCatalogTemplateRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let mut template = load_catalog(store, &id)?;

    if let Some(name) = required_opt(req.name, "name")? {
        template.name = name;
    }
    if req.description.is_some() {
        template.description = req.description;
    }
    if let Some(config) = req.config {
        template.config = config;
    }
    if let Some(is_premium) = req.is_premium {
        template.is_premium = is_premium;
    }
    template.updated_at = Utc::now();

    store
        .update_template(&template)
        .api_err("Failed to update template")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(template)))
}

pub async fn delete_template(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let template = load_catalog(store, &id)?;
    store
        .delete_template(&template.id)
        .api_err("Failed to delete template")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
