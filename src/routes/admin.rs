use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{UpdateUserRequest, UserList},
        logs::{AdminLogList, LogQuery, UserLogList},
    },
    error::AppResult,
    middleware::auth::{AuthUser, Client},
    models::User,
    response::ApiResponse,
    routes::{orders, products},
    services::{auth_service, log_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::admin_router())
        .nest("/orders", orders::admin_router())
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/logs/admin", get(admin_logs))
        .route("/logs/admin/export", get(export_admin_logs))
        .route("/logs/users", get(user_logs))
        .route("/logs/users/export", get(export_user_logs))
        .route("/logs/users/{user_id}", get(logs_for_user))
}

fn csv_attachment(file_name: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All users", body = ApiResponse<UserList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(auth_service::list_users(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(auth_service::get_user(&state, &user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses((status = 200, description = "User updated", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(auth_service::update_user(&state, &user, &client, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(auth_service::delete_user(&state, &user, &client, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/logs/admin",
    params(LogQuery),
    responses(
        (status = 200, description = "Admin log entries, newest first", body = ApiResponse<AdminLogList>),
        (status = 400, description = "Unknown type or bad date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn admin_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<ApiResponse<AdminLogList>>> {
    Ok(Json(log_service::admin_logs(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/logs/admin/export",
    params(LogQuery),
    responses((status = 200, description = "Admin log as CSV", content_type = "text/csv", body = String)),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn export_admin_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LogQuery>,
) -> AppResult<impl IntoResponse> {
    let body = log_service::export_admin_logs(&state, &user, query).await?;
    Ok(csv_attachment("admin-logs.csv", body))
}

#[utoipa::path(
    get,
    path = "/api/admin/logs/users",
    params(LogQuery),
    responses(
        (status = 200, description = "User log entries, newest first", body = ApiResponse<UserLogList>),
        (status = 400, description = "Unknown type or bad date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn user_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<ApiResponse<UserLogList>>> {
    Ok(Json(log_service::user_logs(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/logs/users/export",
    params(LogQuery),
    responses((status = 200, description = "User log as CSV", content_type = "text/csv", body = String)),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn export_user_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LogQuery>,
) -> AppResult<impl IntoResponse> {
    let body = log_service::export_user_logs(&state, &user, query).await?;
    Ok(csv_attachment("user-logs.csv", body))
}

#[utoipa::path(
    get,
    path = "/api/admin/logs/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Every entry of one user", body = ApiResponse<UserLogList>),
        (status = 404, description = "No logs found for this user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn logs_for_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserLogList>>> {
    Ok(Json(log_service::logs_for_user(&state, &user, user_id).await?))
}
