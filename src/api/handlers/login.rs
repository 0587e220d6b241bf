use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::account::{AccountService, SessionGrant};
use crate::api::handlers::error_response;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionGrant, content_type = "application/json"),
        (status = 401, description = "Unauthorized", body = String),
    ),
    tag = "auth"
)]
pub async fn login(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = request.username.trim().to_lowercase();

    match service.authenticate(&username, &request.password).await {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
