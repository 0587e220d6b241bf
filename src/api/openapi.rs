use utoipa::OpenApi;

use crate::account::models::{PublicUser, SessionGrant};
use crate::api::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::login::login,
        handlers::reset::forgot_password,
        handlers::reset::verify_reset_code,
        handlers::reset::reset_password,
        handlers::change_password::change_password,
        handlers::users::get_user,
        handlers::users::delete_user,
    ),
    components(schemas(
        PublicUser,
        SessionGrant,
        handlers::register::RegisterRequest,
        handlers::login::LoginRequest,
        handlers::reset::ForgotPasswordRequest,
        handlers::reset::VerifyResetCodeRequest,
        handlers::reset::ResetPasswordRequest,
        handlers::change_password::ChangePasswordRequest,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "User registration and records"),
        (name = "auth", description = "Login and session tokens"),
        (name = "password", description = "Password reset and change"),
    )
)]
pub struct ApiDoc;
