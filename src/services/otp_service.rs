//! E-mail one-time codes.
//!
//! Two TTL entries per address: `otp:cooldown:<email>` throttles sends and
//! `otp:code:<email>` holds the argon2 hash of the pending code.

use password_hash::rand_core::{OsRng, RngCore};

use crate::{
    dto::otp::{OtpStatus, SendOtpRequest, VerifyOtpRequest},
    error::{AppError, AppResult},
    notify::EmailMessage,
    response::ApiResponse,
    services::auth_service::{hash_secret, normalize_email, verify_secret},
    state::AppState,
};

fn cooldown_key(email: &str) -> String {
    format!("otp:cooldown:{email}")
}

fn code_key(email: &str) -> String {
    format!("otp:code:{email}")
}

fn generate_code() -> String {
    format!("{:06}", 100_000 + OsRng.next_u32() % 900_000)
}

pub async fn send_otp(state: &AppState, payload: SendOtpRequest) -> AppResult<ApiResponse<OtpStatus>> {
    let email = normalize_email(&payload.email)?;
    let cooldown = state.config.otp_cooldown;

    if !state.ttl.try_claim(&cooldown_key(&email), cooldown).await? {
        return Err(AppError::TooManyRequests(format!(
            "Please wait {} seconds before retrying",
            cooldown.as_secs()
        )));
    }

    let code = generate_code();
    state
        .ttl
        .put(&code_key(&email), &hash_secret(&code)?, state.config.otp_ttl)
        .await?;

    let message = EmailMessage {
        to: email.clone(),
        subject: "Your Email Verification OTP".into(),
        body: format!(
            "Your OTP is {code}. It is valid for {} minutes.",
            state.config.otp_ttl.as_secs() / 60
        ),
    };
    // Without the mail the code is useless: drop it and release the cooldown.
    if let Err(err) = state.notifier.send(&message).await {
        tracing::warn!(error = %err, "otp mail failed");
        state.ttl.remove(&code_key(&email)).await?;
        state.ttl.remove(&cooldown_key(&email)).await?;
        return Err(AppError::Upstream("Failed to send OTP".into()));
    }

    tracing::info!(email = %email, "otp sent");
    Ok(ApiResponse::ok(
        "OTP sent to email",
        OtpStatus {
            email,
            verified: false,
        },
    ))
}

pub async fn verify_otp(state: &AppState, payload: VerifyOtpRequest) -> AppResult<ApiResponse<OtpStatus>> {
    let email = normalize_email(&payload.email)?;
    let code = payload.code.trim();
    if code.is_empty() {
        return Err(AppError::validation("OTP code is required"));
    }

    let invalid = || AppError::validation("Invalid or expired OTP");
    let hash = state.ttl.take(&code_key(&email)).await?.ok_or_else(invalid)?;
    if !verify_secret(code, &hash)? {
        return Err(invalid());
    }

    Ok(ApiResponse::ok(
        "OTP verified successfully",
        OtpStatus {
            email,
            verified: true,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
