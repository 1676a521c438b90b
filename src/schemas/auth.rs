use serde::{Deserialize, Serialize};

use crate::api::guards::Principal;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) is_admin: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PrincipalResponse {
    pub(crate) user_id: String,
    pub(crate) is_admin: bool,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self { user_id: principal.user_id, is_admin: principal.is_admin }
    }
}
