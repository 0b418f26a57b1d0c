use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    dto::auth::{
        AuthData, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
        UpdateUserRequest, UserList,
    },
    effects::{self, Effects},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, issue_token},
    models::{ClientInfo, NewUserLog, Role, User, UserLogType},
    response::ApiResponse,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2 PHC string for a password or one-time code.
pub(crate) fn hash_secret(secret: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub(crate) fn verify_secret(secret: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

pub(crate) fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::validation("Please enter a valid email"));
    }
    Ok(email)
}

pub(crate) fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn load_user(state: &AppState, id: Uuid) -> AppResult<User> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User not found with ID: {id}")))
}

pub(crate) async fn record(state: &AppState, log_type: UserLogType, user_id: Uuid, message: &str, client: &ClientInfo) {
    let mut effects = Effects::new();
    effects.user_log(NewUserLog::new(log_type, user_id, message, client));
    effects::dispatch(state, effects).await;
}

pub async fn register_user(
    state: &AppState,
    client: &ClientInfo,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthData>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Please enter your name"));
    }
    let email = normalize_email(&payload.email)?;
    check_password(&payload.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: hash_secret(&payload.password)?,
        role: Role::User,
        created_at: Utc::now(),
    };
    let user = state.users.insert(user).await?;
    let token = issue_token(&state.config, user.id, user.role)?;

    record(state, UserLogType::UserRegister, user.id, "User registered successfully", client).await;
    Ok(ApiResponse::ok("User registered", AuthData { token, user }))
}

pub async fn login_user(
    state: &AppState,
    client: &ClientInfo,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthData>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());
    let email = payload.email.trim().to_lowercase();

    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_secret(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }
    let token = issue_token(&state.config, user.id, user.role)?;

    record(state, UserLogType::UserLogin, user.id, "User logged in successfully", client).await;
    Ok(ApiResponse::ok("Logged in", AuthData { token, user }))
}

/// Tokens are stateless; logging out only records the event.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
) -> AppResult<ApiResponse<serde_json::Value>> {
    record(state, UserLogType::UserLogout, user.user_id, "User logged out successfully", client).await;
    Ok(ApiResponse::ok("Logged out", serde_json::json!({})))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    Ok(ApiResponse::ok("User", load_user(state, user.user_id).await?))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let mut account = load_user(state, user.user_id).await?;
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::validation("Please enter your name"));
        }
        account.name = name;
    }
    if let Some(email) = payload.email {
        account.email = normalize_email(&email)?;
    }
    state.users.save(&account).await?;

    record(state, UserLogType::UpdateProfile, account.id, "User profile updated", client).await;
    Ok(ApiResponse::ok("Profile updated", account))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut account = load_user(state, user.user_id).await?;
    if !verify_secret(&payload.old_password, &account.password_hash)? {
        return Err(AppError::validation("Old password is incorrect"));
    }
    if payload.new_password != payload.confirm_password {
        return Err(AppError::validation("Passwords do not match"));
    }
    check_password(&payload.new_password)?;

    account.password_hash = hash_secret(&payload.new_password)?;
    state.users.save(&account).await?;

    record(state, UserLogType::ChangePassword, account.id, "User changed password", client).await;
    Ok(ApiResponse::ok("Password updated", serde_json::json!({})))
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let users = state.users.list().await?;
    Ok(ApiResponse::ok("Users", UserList { users }))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    Ok(ApiResponse::ok("User", load_user(state, id).await?))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let mut account = load_user(state, id).await?;
    if let Some(name) = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        account.name = name;
    }
    if let Some(email) = payload.email {
        account.email = normalize_email(&email)?;
    }
    if let Some(role) = payload.role {
        account.role = role;
    }
    state.users.save(&account).await?;

    record(state, UserLogType::UpdateProfile, account.id, "Admin updated user role/profile", client).await;
    Ok(ApiResponse::ok("User updated", account))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if !state.users.delete(id).await? {
        return Err(AppError::not_found(format!("User does not exist with ID: {id}")));
    }
    tracing::info!(user_id = %id, admin_id = %user.user_id, "user deleted");

    record(state, UserLogType::DeleteUser, id, "Admin deleted the user", client).await;
    Ok(ApiResponse::ok("User deleted successfully", serde_json::json!({ "id": id })))
}
