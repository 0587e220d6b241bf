use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::AccountService;
use crate::api::handlers::error_response;

#[derive(ToSchema, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[utoipa::path(
    post,
    path = "/users/{id}/password",
    request_body = ChangePasswordRequest,
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "Password changed", body = String),
        (status = 400, description = "Password mismatch or old password incorrect", body = String),
        (status = 404, description = "User not found", body = String),
    ),
    tag = "password"
)]
pub async fn change_password(
    service: Extension<Arc<AccountService>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let request: ChangePasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service
        .change_password(
            id,
            &request.old_password,
            &request.new_password,
            &request.confirm_password,
        )
        .await
    {
        Ok(()) => (StatusCode::OK, "Password changed".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
