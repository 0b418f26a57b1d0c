use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{AdminOrderList, NewOrderRequest, OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AuthUser, Client},
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(new_order))
        .route("/me", get(my_orders))
        .route("/{id}", get(get_order))
}

/// Fulfillment, mounted under `/admin/orders`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(all_orders))
        .route("/{id}", axum::routing::put(update_order_status).delete(delete_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = NewOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<Order>),
        (status = 404, description = "A line item references an unknown product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn new_order(
    State(state): State<AppState>,
    user: AuthUser,
    Client(client): Client,
    Json(payload): Json<NewOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::new_order(&state, &user, &client, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/me",
    responses(
        (status = 200, description = "Orders of the caller, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn my_orders(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::my_orders(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order details", body = ApiResponse<Order>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    responses(
        (status = 200, description = "Every order with the summed total", body = ApiResponse<AdminOrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_orders(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<AdminOrderList>>> {
    Ok(Json(order_service::all_orders(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status advanced and stock consumed", body = ApiResponse<Order>),
        (status = 404, description = "Order or product not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order deleted and stock restored"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(order_service::delete_order(&state, &user, id).await?))
}
