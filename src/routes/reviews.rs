use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::reviews::{ReviewList, ReviewRequest},
    error::AppResult,
    middleware::auth::{AuthUser, Client},
    models::Product,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(submit_review))
        .route("/{product_id}", get(product_reviews))
        .route("/{product_id}/{review_id}", delete(delete_review))
}

#[utoipa::path(
    put,
    path = "/api/reviews",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review added or updated", body = ApiResponse<Product>),
        (status = 400, description = "Rating out of range"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(review_service::submit_review(&state, &user, &client, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reviews of a product", body = ApiResponse<ReviewList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Reviews"
)]
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    Ok(Json(review_service::product_reviews(&state, product_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{product_id}/{review_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review removed", body = ApiResponse<Product>),
        (status = 403, description = "Neither author nor admin"),
        (status = 404, description = "Product or review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Path((product_id, review_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = review_service::delete_review(&state, &user, &client, product_id, review_id).await?;
    Ok(Json(resp))
}
