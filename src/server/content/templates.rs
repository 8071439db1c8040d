use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::{RequireSchoolAdmin, RequireSchoolUser};
use crate::server::AppState;
use crate::server::access::require_feature;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::store::{ContentStore, Store, TenantStore};
use crate::types::{Feature, School, SchoolUpdate, Template};

/// Loads one of the school's own templates or a catalog template.
fn load_visible(store: &dyn Store, school: &School, id: &str) -> Result<Template, ApiError> {
    store
        .get_template(id)
        .api_err("Failed to load template")?
        .filter(|t| t.visible_to(&school.id))
        .ok_or_else(|| ApiError::not_found("Template not found"))
}

pub async fn get_template(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let template = load_visible(state.store.as_ref(), &auth.school, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(template)))
}

/// Makes the template the school's active site template. Premium catalog
/// templates need the premium templates feature.
pub async fn activate_template(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let template = load_visible(store, &auth.school, &id)?;
    if template.is_premium {
        require_feature(store, &auth.school, Feature::PremiumTemplates)?;
    }

    let update = SchoolUpdate {
        active_template_id: Some(template.id),
        ..SchoolUpdate::default()
    };
    let school = store
        .update_school(&auth.school.id, &update)
        .api_err("Failed to activate template")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(school)))
}
