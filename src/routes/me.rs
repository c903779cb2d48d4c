use axum::Json;
use serde::Serialize;

use crate::auth::RequireAuth;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub issuer: String,
    pub audience: String,
}

/// Get current authenticated user info
pub async fn get_me(auth: RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id.clone(),
        email: auth.email.clone(),
        name: auth.name.clone(),
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
    })
}
