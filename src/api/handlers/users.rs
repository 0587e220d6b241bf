use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::account::{AccountService, PublicUser};
use crate::api::handlers::error_response;

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "User found", body = PublicUser, content_type = "application/json"),
        (status = 404, description = "User not found", body = String),
    ),
    tag = "users"
)]
pub async fn get_user(
    service: Extension<Arc<AccountService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match service.user(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = String),
    ),
    tag = "users"
)]
pub async fn delete_user(
    service: Extension<Arc<AccountService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match service.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
