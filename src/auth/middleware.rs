use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{TokenValidationError, extract_token_from_header, validate_token};
use crate::server::AppState;
use crate::store::TenantStore;
use crate::types::{School, Token, User, UserRole};

/// Extractor that requires any valid session
pub struct RequireUser {
    pub token: Token,
    pub user: User,
}

/// Extractor that requires a user bound to a school; yields the school
pub struct RequireSchoolUser {
    pub token: Token,
    pub user: User,
    pub school: School,
}

/// Extractor that requires the school admin role
pub struct RequireSchoolAdmin {
    pub token: Token,
    pub user: User,
    pub school: School,
}

/// Extractor that requires the platform admin role
pub struct RequirePlatformAdmin {
    pub token: Token,
    pub user: User,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NoSchool,
    NotSchoolAdmin,
    NotPlatformAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::NoSchool => (
                StatusCode::FORBIDDEN,
                "This operation requires a school account",
            ),
            AuthError::NotSchoolAdmin => (StatusCode::FORBIDDEN, "School admin access required"),
            AuthError::NotPlatformAdmin => {
                (StatusCode::FORBIDDEN, "Platform admin access required")
            }
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"schoolhub\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        extract_and_validate(parts, state).await
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSchoolUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser { token, user } = extract_and_validate(parts, state).await?;

        let school_id = user.school_id.as_deref().ok_or(AuthError::NoSchool)?;
        let school = state
            .store
            .get_school(school_id)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::NoSchool)?;

        Ok(RequireSchoolUser {
            token,
            user,
            school,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSchoolAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireSchoolUser {
            token,
            user,
            school,
        } = RequireSchoolUser::from_request_parts(parts, state).await?;

        if user.role != UserRole::SchoolAdmin {
            return Err(AuthError::NotSchoolAdmin);
        }

        Ok(RequireSchoolAdmin {
            token,
            user,
            school,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for RequirePlatformAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser { token, user } = extract_and_validate(parts, state).await?;

        if user.role != UserRole::SuperAdmin {
            return Err(AuthError::NotPlatformAdmin);
        }

        Ok(RequirePlatformAdmin { token, user })
    }
}

async fn extract_and_validate(
    parts: &mut Parts,
    state: &Arc<AppState>,
) -> Result<RequireUser, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_token_from_header(auth_header)
        .map_err(|e| match e {
            TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
            _ => AuthError::InvalidToken,
        })?
        .ok_or(AuthError::MissingAuth)?;

    let validated = validate_token(state, &raw_token).map_err(|e| match e {
        TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
        TokenValidationError::InvalidToken => AuthError::InvalidToken,
        TokenValidationError::TokenExpired => AuthError::TokenExpired,
        TokenValidationError::InternalError => AuthError::InternalError,
    })?;

    Ok(RequireUser {
        token: validated.token,
        user: validated.user,
    })
}
