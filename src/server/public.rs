//! Unauthenticated routes backing the schools' public websites.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::AppState;
use super::access::{feature_unavailable, school_features};
use super::content::dto::CreateEnquiry;
use super::dto::{PublicGallery, PublicSchool, PublicSite};
use super::response::{ApiError, ApiResponse, StoreResultExt};
use super::validation::{required, validate_email};
use crate::store::{ContentStore, Store, TenantStore};
use crate::types::{Admission, AdmissionEnquiry, EnquiryStatus, Feature, School, SchoolStatus};

pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sites/{host}", get(get_site))
        .route("/sites/{host}/enquiries", post(submit_enquiry))
}

/// Finds a published school by `<subdomain>.<suffix>`, a verified custom
/// domain, or a bare subdomain.
fn resolve_site(store: &dyn Store, suffix: &str, host: &str) -> Result<School, ApiError> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

    let school = match host.strip_suffix(suffix).and_then(|h| h.strip_suffix('.')) {
        Some(subdomain) => store
            .get_school_by_subdomain(subdomain)
            .api_err("Failed to resolve site")?,
        None if host.contains('.') => store
            .get_school_by_custom_domain(&host)
            .api_err("Failed to resolve site")?
            .filter(|s| s.domain_verified),
        None => store
            .get_school_by_subdomain(&host)
            .api_err("Failed to resolve site")?,
    };

    school
        .filter(|s| s.status == SchoolStatus::Published)
        .ok_or_else(|| ApiError::not_found("Site not found"))
}

fn is_accepting(admission: &Admission, now: DateTime<Utc>) -> bool {
    admission.is_open
        && admission.start_date.is_none_or(|start| start <= now)
        && admission.end_date.is_none_or(|end| end >= now)
}

async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(host): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = resolve_site(store, &state.public_host_suffix, &host)?;
    let features = school_features(store, &school)?;
    let enabled = |feature| features.is_enabled(feature);
    let now = Utc::now();

    let sections = store
        .list_sections(&school.id)
        .api_err("Failed to load sections")?
        .into_iter()
        .filter(|s| s.is_visible)
        .collect();

    let notices = if enabled(Feature::Notices) {
        store
            .list_notices(&school.id)
            .api_err("Failed to load notices")?
            .into_iter()
            .filter(|n| n.is_visible && n.publish_date.is_none_or(|d| d <= now))
            .collect()
    } else {
        Vec::new()
    };

    let mut galleries = Vec::new();
    if enabled(Feature::Gallery) {
        for gallery in store
            .list_galleries(&school.id)
            .api_err("Failed to load galleries")?
        {
            if !gallery.is_visible {
                continue;
            }
            let images = store
                .list_gallery_images(&gallery.id)
                .api_err("Failed to load images")?;
            galleries.push(PublicGallery { gallery, images });
        }
    }

    let achievements = if enabled(Feature::Achievements) {
        store
            .list_achievements(&school.id)
            .api_err("Failed to load achievements")?
            .into_iter()
            .filter(|a| a.is_visible)
            .collect()
    } else {
        Vec::new()
    };

    let staff = if enabled(Feature::StaffDirectory) {
        store
            .list_staff(&school.id)
            .api_err("Failed to load staff")?
            .into_iter()
            .filter(|s| s.is_visible)
            .collect()
    } else {
        Vec::new()
    };

    let pages = if enabled(Feature::CustomPages) {
        store
            .list_pages(&school.id)
            .api_err("Failed to load pages")?
            .into_iter()
            .filter(|p| p.is_published)
            .collect()
    } else {
        Vec::new()
    };

    let admissions = if enabled(Feature::Admissions) {
        store
            .list_admissions(&school.id)
            .api_err("Failed to load admissions")?
            .into_iter()
            .filter(|a| is_accepting(a, now))
            .collect()
    } else {
        Vec::new()
    };

    let template = match &school.active_template_id {
        Some(id) => store
            .get_template(id)
            .api_err("Failed to load template")?
            .filter(|t| t.visible_to(&school.id)),
        None => None,
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(PublicSite {
        school: PublicSchool::from(&school),
        show_branding: !enabled(Feature::RemoveBranding),
        template,
        sections,
        notices,
        galleries,
        achievements,
        staff,
        pages,
        admissions,
    })))
}

/// Accepts an admission enquiry while the school has an open admission.
async fn submit_enquiry(
    State(state): State<Arc<AppState>>,
    Path(host): Path<String>,
    Json(req): Json<CreateEnquiry>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = resolve_site(store, &state.public_host_suffix, &host)?;
    if !school_features(store, &school)?.is_enabled(Feature::Admissions) {
        return Err(feature_unavailable(Feature::Admissions));
    }

    let now = Utc::now();
    let open: Vec<Admission> = store
        .list_admissions(&school.id)
        .api_err("Failed to load admissions")?
        .into_iter()
        .filter(|a| is_accepting(a, now))
        .collect();

    let admission_id = match req.admission_id.as_deref() {
        Some(id) => match open.iter().find(|a| a.id == id) {
            Some(admission) => admission.id.clone(),
            None => return Err(ApiError::bad_request("Admission is not open")),
        },
        None => match open.first() {
            Some(admission) => admission.id.clone(),
            None => return Err(ApiError::bad_request("Admissions are closed")),
        },
    };

    let email = required(&req.email, "email")?;
    validate_email(&email)?;

    let enquiry = AdmissionEnquiry {
        id: Uuid::new_v4().to_string(),
        school_id: school.id.clone(),
        admission_id: Some(admission_id),
        student_name: required(&req.student_name, "student_name")?,
        parent_name: required(&req.parent_name, "parent_name")?,
        email,
        phone: required(&req.phone, "phone")?,
        grade: required(&req.grade, "grade")?,
        message: req.message.filter(|m| !m.trim().is_empty()),
        status: EnquiryStatus::New,
        created_at: now,
        updated_at: now,
    };
    store
        .create_enquiry(&enquiry)
        .api_err("Failed to submit enquiry")?;

    tracing::info!(school = %school.id, enquiry = %enquiry.id, "Admission enquiry received");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(enquiry))))
}
