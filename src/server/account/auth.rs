use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireUser, TokenGenerator, issue_token, session_expiry};
use crate::server::AppState;
use crate::server::access::school_features;
use crate::server::dto::{AuthResponse, LoginRequest, MeResponse, SignupRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{required, validate_email, validate_password, validate_subdomain};
use crate::store::TenantStore;
use crate::types::{School, User, UserRole};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let school_name = required(&req.school_name, "school_name")?;
    let name = required(&req.name, "name")?;
    let subdomain = req.subdomain.trim().to_string();
    let email = req.email.trim().to_string();
    validate_subdomain(&subdomain)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    if store
        .get_school_by_subdomain(&subdomain)
        .api_err("Failed to check subdomain")?
        .is_some()
    {
        return Err(ApiError::conflict("Subdomain is already taken"));
    }
    if store
        .get_user_by_email(&email)
        .api_err("Failed to check email")?
        .is_some()
    {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash = TokenGenerator::new()
        .hash(&req.password)
        .api_err("Failed to hash password")?;

    let now = Utc::now();
    let school = School::new(Uuid::new_v4().to_string(), school_name, subdomain, now);
    store.create_school(&school).map_err(ApiError::from)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        name,
        role: UserRole::SchoolAdmin,
        school_id: Some(school.id.clone()),
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).map_err(ApiError::from)?;

    let (token, record) =
        issue_token(store, &user.id, Some(session_expiry())).api_err("Failed to create token")?;

    tracing::info!(school = %school.id, subdomain = %school.subdomain, "School signed up");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse {
            token,
            expires_at: record.expires_at,
            user,
            school: Some(school),
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = store
        .get_user_by_email(req.email.trim())
        .api_err("Failed to look up user")?
        .ok_or_else(invalid)?;

    let valid = TokenGenerator::new()
        .verify(&req.password, &user.password_hash)
        .api_err("Failed to verify password")?;
    if !valid {
        return Err(invalid());
    }

    let school = match user.school_id.as_deref() {
        Some(id) => store.get_school(id).api_err("Failed to get school")?,
        None => None,
    };

    let (token, record) =
        issue_token(store, &user.id, Some(session_expiry())).api_err("Failed to create token")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(AuthResponse {
        token,
        expires_at: record.expires_at,
        user,
        school,
    })))
}

pub async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .store
        .delete_token(&auth.token.id)
        .api_err("Failed to delete token")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn me(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.as_ref();

    let school = match auth.user.school_id.as_deref() {
        Some(id) => store.get_school(id).api_err("Failed to get school")?,
        None => None,
    };
    let features = school
        .as_ref()
        .map(|s| school_features(store, s))
        .transpose()?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MeResponse {
        user: auth.user,
        school,
        features,
    })))
}
