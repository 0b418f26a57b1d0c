use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};

use crate::{
    dto::{
        auth::{
            AuthData, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
            ResetLinkSent, ResetPasswordRequest, UpdateProfileRequest,
        },
        otp::{OtpStatus, SendOtpRequest, VerifyOtpRequest},
    },
    error::AppResult,
    middleware::auth::{AuthUser, Client},
    models::User,
    response::ApiResponse,
    services::{auth_service, otp_service, password_reset_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_profile))
        .route("/password", put(change_password))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", put(reset_password))
        .route("/otp/send", post(send_otp))
        .route("/otp/verify", post(verify_otp))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register user", body = ApiResponse<AuthData>),
        (status = 409, description = "Email already registered"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    let resp = auth_service::register_user(&state, &client, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthData>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    let resp = auth_service::login_user(&state, &client, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(auth_service::logout_user(&state, &user, &client).await?))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "Current user", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(auth_service::me(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(auth_service::update_profile(&state, &user, &client, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Wrong old password or mismatch"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(auth_service::change_password(&state, &user, &client, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link mailed", body = ApiResponse<ResetLinkSent>),
        (status = 404, description = "No account for this email"),
        (status = 502, description = "Mail could not be sent"),
    ),
    tag = "Auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<ResetLinkSent>>> {
    Ok(Json(password_reset_service::forgot_password(&state, &client, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, new session issued", body = ApiResponse<AuthData>),
        (status = 400, description = "Invalid or expired token, or passwords do not match"),
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    Ok(Json(password_reset_service::reset_password(&state, &client, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/send",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code mailed", body = ApiResponse<OtpStatus>),
        (status = 429, description = "Cooldown still running"),
        (status = 502, description = "Mail could not be sent"),
    ),
    tag = "Auth"
)]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> AppResult<Json<ApiResponse<OtpStatus>>> {
    Ok(Json(otp_service::send_otp(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = ApiResponse<OtpStatus>),
        (status = 400, description = "Invalid or expired code"),
    ),
    tag = "Auth"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<OtpStatus>>> {
    Ok(Json(otp_service::verify_otp(&state, payload).await?))
}
