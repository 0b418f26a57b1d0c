//! Password recovery by mailed link.
//!
//! `pwreset:<email>` holds the argon2 hash of the single live token for an
//! account. Requesting a new link replaces it; a reset attempt consumes it.

use password_hash::rand_core::{OsRng, RngCore};

use crate::{
    dto::auth::{AuthData, ForgotPasswordRequest, ResetLinkSent, ResetPasswordRequest},
    error::{AppError, AppResult},
    middleware::auth::issue_token,
    models::{ClientInfo, UserLogType},
    notify::EmailMessage,
    response::ApiResponse,
    services::auth_service::{check_password, hash_secret, normalize_email, record, verify_secret},
    state::AppState,
};

fn reset_key(email: &str) -> String {
    format!("pwreset:{email}")
}

fn generate_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub async fn forgot_password(
    state: &AppState,
    client: &ClientInfo,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<ResetLinkSent>> {
    let email = normalize_email(&payload.email)?;
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found with this email"))?;

    let token = generate_token();
    let ttl = state.config.reset_token_ttl;
    state.ttl.put(&reset_key(&email), &hash_secret(&token)?, ttl).await?;

    let link = format!(
        "{}/{token}?email={email}",
        state.config.password_reset_url.trim_end_matches('/')
    );
    let message = EmailMessage {
        to: email.clone(),
        subject: "Password Recovery".into(),
        body: format!(
            "Your password reset link is:\n\n{link}\n\nIt expires in {} minutes. If you did not request it, ignore this email.",
            ttl.as_secs() / 60
        ),
    };
    if let Err(err) = state.notifier.send(&message).await {
        tracing::warn!(error = %err, user_id = %user.id, "password reset mail failed");
        state.ttl.remove(&reset_key(&email)).await?;
        return Err(AppError::Upstream("Failed to send password reset email".into()));
    }

    record(state, UserLogType::ForgotPassword, user.id, "Password reset link sent", client).await;
    Ok(ApiResponse::ok(
        format!("Email sent to {email}"),
        ResetLinkSent { email },
    ))
}

pub async fn reset_password(
    state: &AppState,
    client: &ClientInfo,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<AuthData>> {
    let email = normalize_email(&payload.email)?;
    // Input problems are reported before the token is spent.
    if payload.password != payload.confirm_password {
        return Err(AppError::validation("Passwords do not match"));
    }
    check_password(&payload.password)?;

    let invalid = || AppError::validation("Reset token is invalid or expired");
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(invalid());
    }
    let hash = state.ttl.take(&reset_key(&email)).await?.ok_or_else(invalid)?;
    if !verify_secret(token, &hash)? {
        return Err(invalid());
    }

    let mut user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    user.password_hash = hash_secret(&payload.password)?;
    state.users.save(&user).await?;
    let token = issue_token(&state.config, user.id, user.role)?;

    tracing::info!(user_id = %user.id, "password reset");
    record(state, UserLogType::ResetPassword, user.id, "User reset password via link", client).await;
    Ok(ApiResponse::ok("Password reset", AuthData { token, user }))
}
