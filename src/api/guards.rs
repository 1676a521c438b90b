use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::api::errors::ApiError;
use crate::api::links::AuthorizationOutcome;
use crate::core::{security, state::AppState};

/// The caller identified by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Principal {
    pub(crate) user_id: String,
    pub(crate) is_admin: bool,
}

pub(crate) struct CurrentUser(pub(crate) Principal);
pub(crate) struct CurrentAdmin(pub(crate) Principal);

/// Anonymous callers and callers with unusable tokens both resolve to `None`.
pub(crate) struct OptionalUser(pub(crate) Option<Principal>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    Admin,
}

pub(crate) fn authorize(principal: Option<&Principal>, policy: Policy) -> AuthorizationOutcome {
    match policy {
        Policy::Admin if principal.is_some_and(|principal| principal.is_admin) => {
            AuthorizationOutcome::GRANTED
        }
        Policy::Admin => AuthorizationOutcome::DENIED,
    }
}

pub(crate) fn require_admin(principal: Option<Principal>) -> Result<Principal, ApiError> {
    let principal = principal.ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;
    if authorize(Some(&principal), Policy::Admin).granted {
        Ok(principal)
    } else {
        Err(ApiError::Forbidden("Admin access required"))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn principal_from_headers(headers: &HeaderMap, state: &AppState) -> Result<Principal, ApiError> {
    let token =
        bearer_token(headers).ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let claims = security::verify_token(token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

    Ok(Principal { user_id: claims.sub, is_admin: claims.admin })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers, state).map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        require_admin(Some(principal)).map(CurrentAdmin)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(principal_from_headers(&parts.headers, state).ok()))
    }
}
