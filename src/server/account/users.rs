use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireSchoolAdmin, RequireUser, TokenGenerator};
use crate::server::AppState;
use crate::server::access::require_owned;
use crate::server::dto::{CreateUserRequest, UpdateProfileRequest, UpdateUserRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{required, validate_email, validate_password};
use crate::store::TenantStore;
use crate::types::{User, UserRole};

fn school_role(role: Option<UserRole>) -> Result<UserRole, ApiError> {
    match role.unwrap_or(UserRole::Editor) {
        UserRole::SuperAdmin => Err(ApiError::bad_request(
            "Role must be SCHOOL_ADMIN or EDITOR",
        )),
        role => Ok(role),
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    validate_password(password)?;
    TokenGenerator::new()
        .hash(password)
        .api_err("Failed to hash password")
}

pub async fn list_users(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users = state
        .store
        .list_school_users(&auth.school.id)
        .api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}

pub async fn create_user(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let name = required(&req.name, "name")?;
    let email = req.email.trim().to_string();
    validate_email(&email)?;
    let role = school_role(req.role)?;
    let password_hash = hash_password(&req.password)?;

    if store
        .get_user_by_email(&email)
        .api_err("Failed to check email")?
        .is_some()
    {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        name,
        role,
        school_id: Some(auth.school.id.clone()),
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn update_user(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut user = require_owned(
        store.get_user(&id).api_err("Failed to get user")?,
        |u: &User| u.school_id.as_deref().unwrap_or_default(),
        &auth.school,
        "User not found",
    )?;

    if let Some(name) = req.name {
        user.name = required(&name, "name")?;
    }
    if let Some(role) = req.role {
        let role = school_role(Some(role))?;
        if user.id == auth.user.id && role != UserRole::SchoolAdmin {
            return Err(ApiError::bad_request("You cannot demote yourself"));
        }
        user.role = role;
    }
    if let Some(password) = req.password {
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = Utc::now();

    store.update_user(&user).api_err("Failed to update user")?;

    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    auth: RequireSchoolAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = require_owned(
        store.get_user(&id).api_err("Failed to get user")?,
        |u: &User| u.school_id.as_deref().unwrap_or_default(),
        &auth.school,
        "User not found",
    )?;
    if user.id == auth.user.id {
        return Err(ApiError::bad_request("You cannot delete yourself"));
    }

    store.delete_user(&user.id).api_err("Failed to delete user")?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_profile(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let mut user = auth.user;

    if let Some(name) = req.name {
        user.name = required(&name, "name")?;
    }
    if let Some(password) = req.password {
        let current = req
            .current_password
            .ok_or_else(|| ApiError::bad_request("current_password is required"))?;
        let valid = TokenGenerator::new()
            .verify(&current, &user.password_hash)
            .api_err("Failed to verify password")?;
        if !valid {
            return Err(ApiError::bad_request("Current password is incorrect"));
        }
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = Utc::now();

    state
        .store
        .update_user(&user)
        .api_err("Failed to update profile")?;

    Ok(Json(ApiResponse::success(user)))
}
