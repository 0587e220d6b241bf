//! The three-phase password-reset protocol: request a code, verify it,
//! then set the new password. Verification is read-only; only the final
//! phase consumes the code.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::account::{AccountService, PublicUser};
use crate::api::handlers::{error_response, valid_email};

#[derive(ToSchema, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct VerifyResetCodeRequest {
    pub reset_code: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub reset_code: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[utoipa::path(
    post,
    path = "/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset instructions sent", body = String),
        (status = 400, description = "Unknown email", body = String),
    ),
    tag = "password"
)]
pub async fn forgot_password(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = request.email.trim().to_lowercase();
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match service.request_reset(&email).await {
        Ok(()) => (
            StatusCode::OK,
            "Password reset instructions sent to your email".to_string(),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/password/verify",
    request_body = VerifyResetCodeRequest,
    responses(
        (status = 200, description = "Reset code is valid", body = PublicUser, content_type = "application/json"),
        (status = 400, description = "Invalid or expired reset code", body = String),
    ),
    tag = "password"
)]
pub async fn verify_reset_code(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<VerifyResetCodeRequest>>,
) -> impl IntoResponse {
    let request: VerifyResetCodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.verify_reset_code(&request.reset_code).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "New password saved", body = String),
        (status = 400, description = "Password mismatch or invalid reset code", body = String),
    ),
    tag = "password"
)]
pub async fn reset_password(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Confirmation mismatch is checked inside the engine, before any lookup,
    // so a mismatch never consumes the code.
    match service
        .complete_reset(
            &request.reset_code,
            &request.new_password,
            &request.confirm_password,
        )
        .await
    {
        Ok(()) => (StatusCode::OK, "New password saved".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
