use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use crate::auth::RequireSchoolAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::access::require_feature;
use crate::server::dto::{DomainResponse, SetDomainRequest, VerificationRecord};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::normalize_domain;
use crate::store::{DomainStore, TenantStore};
use crate::types::{DnsRecordType, DomainChange, Feature, School, SchoolUpdate};

/// Name of the TXT record that proves ownership of a custom domain.
pub const VERIFICATION_RECORD_NAME: &str = "_schoolhub-verify";

fn domain_response(school: &School) -> DomainResponse {
    let verification_record = match (&school.custom_domain, &school.verification_token) {
        (Some(_), Some(token)) if !school.domain_verified => Some(VerificationRecord {
            record_type: DnsRecordType::Txt,
            name: VERIFICATION_RECORD_NAME,
            value: token.clone(),
        }),
        _ => None,
    };
    DomainResponse {
        custom_domain: school.custom_domain.clone(),
        domain_verified: school.domain_verified,
        verification_record,
    }
}

pub async fn get_domain(auth: RequireSchoolAdmin) -> impl IntoResponse {
    Json(ApiResponse::success(domain_response(&auth.school)))
}

pub async fn set_domain(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetDomainRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let school = auth.school;
    require_feature(store, &school, Feature::CustomDomain)?;

    let domain = normalize_domain(&req.custom_domain)?;
    if domain == state.public_host_suffix
        || domain.ends_with(&format!(".{}", state.public_host_suffix))
    {
        return Err(ApiError::bad_request(
            "Platform hostnames cannot be used as a custom domain",
        ));
    }
    if let Some(owner) = store
        .get_school_by_custom_domain(&domain)
        .api_err("Failed to check domain")?
    {
        if owner.id != school.id {
            return Err(ApiError::conflict("Domain is already in use"));
        }
    }

    let update = SchoolUpdate {
        domain: Some(DomainChange::Attach {
            domain,
            token: Uuid::new_v4().simple().to_string(),
        }),
        ..SchoolUpdate::default()
    };
    let school = store
        .update_school(&school.id, &update)
        .map_err(|e| match e {
            Error::AlreadyExists => ApiError::conflict("Domain is already in use"),
            e => ApiError::from(e),
        })?;

    tracing::info!(school = %school.id, domain = ?school.custom_domain, "Custom domain attached");

    Ok(Json(ApiResponse::success(domain_response(&school))))
}

/// Marks the domain verified when the school's DNS records include the
/// verification TXT record.
pub async fn verify_domain(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let mut school = auth.school;

    let (Some(_), Some(token)) = (&school.custom_domain, &school.verification_token) else {
        return Err(ApiError::bad_request("No custom domain is attached"));
    };

    if !school.domain_verified {
        let records = store
            .list_dns_records(&school.id)
            .api_err("Failed to list DNS records")?;
        let found = records.iter().any(|r| {
            r.record_type == DnsRecordType::Txt
                && r.name == VERIFICATION_RECORD_NAME
                && r.value.trim() == token
        });
        if !found {
            return Err(ApiError::bad_request(format!(
                "TXT record '{VERIFICATION_RECORD_NAME}' with the verification token was not found"
            )));
        }

        school = store
            .verify_custom_domain(&school.id, token)
            .map_err(ApiError::from)?;
        tracing::info!(school = %school.id, "Custom domain verified");
    }

    Ok(Json(ApiResponse::success(domain_response(&school))))
}

pub async fn remove_domain(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let update = SchoolUpdate {
        domain: Some(DomainChange::Detach),
        ..SchoolUpdate::default()
    };
    state
        .store
        .update_school(&auth.school.id, &update)
        .api_err("Failed to remove domain")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
