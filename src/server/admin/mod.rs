mod diagnostics;
mod schools;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // School routes
        .route("/schools", get(schools::list_schools))
        .route(
            "/schools/{id}",
            get(schools::get_school).put(schools::update_school),
        )
        // Feature override routes
        .route(
            "/schools/{id}/features/{feature}",
            put(schools::set_feature_override).delete(schools::delete_feature_override),
        )
        // Platform template catalog
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/templates/{id}",
            put(templates::update_template).delete(templates::delete_template),
        )
        // Diagnostics
        .route("/diagnostics", get(diagnostics::get_diagnostics))
}
