pub mod dto;
mod enquiries;
mod galleries;
mod handlers;
mod resource;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;
use crate::types::{
    Achievement, Admission, Gallery, Notice, Page, Staff, Template, WebsiteSection,
};

use resource::{ContentResource, OrderedResource};

/// Collection, item, and reorder routes for one ordered resource.
fn ordered<T: OrderedResource>(path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            path,
            get(handlers::list::<T>).post(handlers::create::<T>),
        )
        .route(&format!("{path}/reorder"), put(handlers::reorder::<T>))
        .route(
            &format!("{path}/{{id}}"),
            get(handlers::get_one::<T>)
                .put(handlers::update::<T>)
                .delete(handlers::delete::<T>),
        )
}

fn unordered<T: ContentResource>(path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            path,
            get(handlers::list::<T>).post(handlers::create::<T>),
        )
        .route(
            &format!("{path}/{{id}}"),
            get(handlers::get_one::<T>)
                .put(handlers::update::<T>)
                .delete(handlers::delete::<T>),
        )
}

pub fn content_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(ordered::<Notice>("/notices"))
        .merge(ordered::<Gallery>("/galleries"))
        .merge(ordered::<Achievement>("/achievements"))
        .merge(ordered::<Staff>("/staff"))
        .merge(ordered::<Page>("/pages"))
        .merge(ordered::<WebsiteSection>("/sections"))
        .merge(unordered::<Admission>("/admissions"))
        // Own templates go through the shared handlers; reads also see the catalog
        .route(
            "/templates",
            get(handlers::list::<Template>).post(handlers::create::<Template>),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template)
                .put(handlers::update::<Template>)
                .delete(handlers::delete::<Template>),
        )
        // Gallery images, ordered per gallery
        .route(
            "/galleries/{id}/images",
            get(galleries::list_images).post(galleries::create_image),
        )
        .route(
            "/galleries/{id}/images/reorder",
            put(galleries::reorder_images),
        )
        .route(
            "/galleries/{id}/images/{image_id}",
            put(galleries::update_image).delete(galleries::delete_image),
        )
        // Admission enquiries
        .route("/admissions/enquiries", get(enquiries::list_enquiries))
        .route(
            "/admissions/enquiries/export",
            get(enquiries::export_enquiries),
        )
        .route(
            "/admissions/enquiries/{id}",
            put(enquiries::update_enquiry).delete(enquiries::delete_enquiry),
        )
        .route(
            "/templates/{id}/activate",
            post(templates::activate_template),
        )
}
