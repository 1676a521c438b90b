use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, PrincipalResponse, TokenResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login)).route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = repositories::users::find_by_username(state.db(), payload.username.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let access_token =
        security::create_access_token(&user.id, user.is_admin, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(
        action = "login",
        user_id = %user.id,
        username = %user.username,
        is_admin = user.is_admin,
        "User logged in"
    );

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        is_admin: user.is_admin,
    }))
}

async fn me(CurrentUser(principal): CurrentUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(principal))
}
