use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::account::{AccountService, PublicUser};
use crate::api::handlers::{error_response, valid_email, valid_password, valid_username};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = PublicUser, content_type = "application/json"),
        (status = 400, description = "Invalid username, email or password", body = String),
        (status = 409, description = "Username or email already exists", body = String),
    ),
    tag = "users"
)]
pub async fn register(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = request.username.trim().to_lowercase();
    if !valid_username(&username) {
        return (StatusCode::BAD_REQUEST, "Invalid username".to_string()).into_response();
    }

    let email = request.email.trim().to_lowercase();
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Password too short".to_string()).into_response();
    }

    match service.register(&username, &email, &request.password).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
