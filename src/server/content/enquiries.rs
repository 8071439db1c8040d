use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use super::dto::UpdateEnquiry;
use crate::auth::RequireSchoolUser;
use crate::server::AppState;
use crate::server::access::{require_feature, require_owned};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::store::ContentStore;
use crate::types::{AdmissionEnquiry, Feature};

const CSV_HEADER: [&str; 11] = [
    "id",
    "admission_id",
    "student_name",
    "parent_name",
    "email",
    "phone",
    "grade",
    "message",
    "status",
    "created_at",
    "updated_at",
];

pub async fn list_enquiries(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::Admissions)?;

    let enquiries = store
        .list_enquiries(&auth.school.id)
        .api_err("Failed to list enquiries")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(enquiries)))
}

pub async fn update_enquiry(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEnquiry>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::Admissions)?;

    let mut enquiry = require_owned(
        store.get_enquiry(&id).api_err("Failed to get enquiry")?,
        |e: &AdmissionEnquiry| e.school_id.as_str(),
        &auth.school,
        "Enquiry not found",
    )?;
    enquiry.status = req.status;
    enquiry.updated_at = Utc::now();

    store
        .update_enquiry(&enquiry)
        .api_err("Failed to update enquiry")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(enquiry)))
}

pub async fn delete_enquiry(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::Admissions)?;

    let enquiry = require_owned(
        store.get_enquiry(&id).api_err("Failed to get enquiry")?,
        |e: &AdmissionEnquiry| e.school_id.as_str(),
        &auth.school,
        "Enquiry not found",
    )?;
    store
        .delete_enquiry(&enquiry.id)
        .api_err("Failed to delete enquiry")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn export_enquiries(
    auth: RequireSchoolUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_feature(store, &auth.school, Feature::Admissions)?;

    let enquiries = store
        .list_enquiries(&auth.school.id)
        .api_err("Failed to list enquiries")?;

    let filename = format!("attachment; filename=\"{}-enquiries.csv\"", auth.school.subdomain);
    Ok::<_, ApiError>((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        enquiries_csv(&enquiries),
    ))
}

/// Leading characters a spreadsheet reads as the start of a formula.
const FORMULA_PREFIXES: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

/// Quotes a field. Values a spreadsheet would evaluate get a leading `'`.
fn csv_field(value: &str) -> String {
    let guard = if value.starts_with(FORMULA_PREFIXES) { "'" } else { "" };
    format!("\"{guard}{}\"", value.replace('"', "\"\""))
}

fn csv_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut row = fields.into_iter().map(csv_field).collect::<Vec<_>>().join(",");
    row.push_str("\r\n");
    row
}

/// Renders enquiries as CSV with every field quoted.
pub fn enquiries_csv(enquiries: &[AdmissionEnquiry]) -> String {
    let mut out = csv_row(CSV_HEADER);
    for e in enquiries {
        let created_at = e.created_at.to_rfc3339();
        let updated_at = e.updated_at.to_rfc3339();
        out.push_str(&csv_row([
            e.id.as_str(),
            e.admission_id.as_deref().unwrap_or_default(),
            e.student_name.as_str(),
            e.parent_name.as_str(),
            e.email.as_str(),
            e.phone.as_str(),
            e.grade.as_str(),
            e.message.as_deref().unwrap_or_default(),
            e.status.as_str(),
            created_at.as_str(),
            updated_at.as_str(),
        ]));
    }
    out
}
