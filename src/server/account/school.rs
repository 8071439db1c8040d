use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::{RequireSchoolAdmin, RequireSchoolUser};
use crate::server::AppState;
use crate::server::access::{require_feature, school_features};
use crate::server::dto::UpdateSchoolRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{required_opt, validate_email};
use crate::store::TenantStore;
use crate::types::{Feature, SchoolStatus, SchoolUpdate};

pub async fn get_school(auth: RequireSchoolUser) -> impl IntoResponse {
    Json(ApiResponse::success(auth.school))
}

pub async fn update_school(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSchoolRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = auth.school;

    if req.seo_title.is_some() || req.seo_description.is_some() || req.seo_keywords.is_some() {
        require_feature(store, &school, Feature::SeoTools)?;
    }

    let name = required_opt(req.name, "name")?;
    let email = match req.email {
        Some(email) => {
            validate_email(email.trim())?;
            Some(email.trim().to_string())
        }
        None => None,
    };

    let update = SchoolUpdate {
        name,
        email,
        tagline: req.tagline,
        logo_url: req.logo_url,
        phone: req.phone,
        address: req.address,
        theme_color: req.theme_color,
        seo_title: req.seo_title,
        seo_description: req.seo_description,
        seo_keywords: req.seo_keywords,
        ..SchoolUpdate::default()
    };
    let school = store
        .update_school(&school.id, &update)
        .api_err("Failed to update school")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(school)))
}

pub async fn publish_school(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let was = auth.school.status;
    let school = state
        .store
        .publish_school(&auth.school.id)
        .map_err(ApiError::from)?;
    if was == SchoolStatus::Draft && school.status == SchoolStatus::Published {
        tracing::info!(school = %school.id, "School published");
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(school)))
}

pub async fn get_features(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let features = school_features(state.store.as_ref(), &auth.school)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(features)))
}
