use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::orders::{AdminOrderList, NewOrderRequest, OrderList},
    effects::{self, Effects},
    error::{AppError, AppResult},
    fulfillment,
    middleware::auth::{AuthUser, ensure_admin},
    models::{
        AdminLogType, ClientInfo, MAX_STOCK, NewAdminLog, NewUserLog, Order, OrderItem, OrderStatus,
        Product, UserLogType,
    },
    response::ApiResponse,
    state::AppState,
};

async fn load_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found with this id"))
}

async fn products_for(state: &AppState, items: &[OrderItem]) -> AppResult<HashMap<Uuid, Product>> {
    let mut ids: Vec<Uuid> = items.iter().map(|i| i.product).collect();
    ids.sort();
    ids.dedup();
    Ok(state
        .products
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

pub async fn new_order(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    payload: NewOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.order_items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    if payload.order_items.iter().any(|i| i.quantity <= 0) {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    if payload.order_items.iter().any(|i| i.quantity > MAX_STOCK) {
        return Err(AppError::validation(format!(
            "Quantity cannot exceed {MAX_STOCK}"
        )));
    }
    if payload.tax_price < 0 || payload.shipping_price < 0 {
        return Err(AppError::validation("Prices cannot be negative"));
    }

    let ids: Vec<Uuid> = payload.order_items.iter().map(|i| i.product).collect();
    let products: HashMap<Uuid, Product> = state
        .products
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut order_items = Vec::with_capacity(payload.order_items.len());
    for item in &payload.order_items {
        let product = products.get(&item.product).ok_or_else(|| {
            AppError::not_found(format!("Product not found with ID: {}", item.product))
        })?;
        order_items.push(OrderItem {
            product: product.id,
            name: product.name.clone(),
            quantity: item.quantity,
            price: product.price,
            image: product.images.first().map(|img| img.url.clone()),
        });
    }

    let items_price = order_items
        .iter()
        .try_fold(0i64, |acc, i| i.price.checked_mul(i.quantity)?.checked_add(acc))
        .ok_or_else(|| AppError::validation("Order total is out of range"))?;
    let total_price = items_price
        .checked_add(payload.tax_price)
        .and_then(|t| t.checked_add(payload.shipping_price))
        .ok_or_else(|| AppError::validation("Order total is out of range"))?;
    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        user: user.user_id,
        shipping_info: payload.shipping_info,
        order_items,
        payment_info: payload.payment_info,
        items_price,
        tax_price: payload.tax_price,
        shipping_price: payload.shipping_price,
        total_price,
        order_status: OrderStatus::Processing,
        paid_at: now,
        delivered_at: None,
        created_at: now,
    };
    let order = state.orders.insert(order).await?;
    tracing::info!(order_id = %order.id, user_id = %user.user_id, total = order.total_price, "order placed");

    let mut effects = Effects::new();
    effects.user_log(NewUserLog::new(
        UserLogType::PlaceOrder,
        user.user_id,
        format!("Placed order {} with {} item(s)", order.id, order.order_items.len()),
        client,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok("Order placed", order))
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = state.orders.find_by_user(user.user_id).await?;
    Ok(ApiResponse::ok("Orders", OrderList { orders }))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = load_order(state, id).await?;
    if order.user != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(ApiResponse::ok("Order", order))
}

pub async fn all_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;
    let orders = state.orders.find_all().await?;
    let total_amount = orders
        .iter()
        .fold(0i64, |acc, o| acc.saturating_add(o.total_price));
    Ok(ApiResponse::ok(
        "Orders",
        AdminOrderList {
            total_amount,
            orders,
        },
    ))
}

/// Advance an order and consume its stock.
///
/// The whole stock plan is computed before anything is written; products and the
/// order are then saved together and the effects dispatched afterwards.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    next: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let mut order = load_order(state, id).await?;
    fulfillment::check_transition(order.order_status, next)?;

    let products = products_for(state, &order.order_items).await?;
    let plan = fulfillment::plan_consumption(
        &order.order_items,
        products,
        user.user_id,
        &state.config.admin_email,
    )?;
    let previous = fulfillment::advance(&mut order, next, Utc::now());

    state.orders.save_with_products(&order, &plan.products).await?;
    tracing::info!(order_id = %order.id, from = %previous, to = %next, "order status updated");

    let mut effects = plan.effects;
    effects.admin_log(NewAdminLog::for_order(
        AdminLogType::UpdateOrderStatus,
        order.id,
        format!("Order status changed from \"{previous}\" to \"{next}\"."),
        user.user_id,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok("Order status updated", order))
}

/// Delete an order and give its stock back.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let order = load_order(state, id).await?;

    let products = products_for(state, &order.order_items).await?;
    let restored = fulfillment::plan_restoration(&order.order_items, products);
    if !state.orders.delete_with_products(order.id, &restored).await? {
        return Err(AppError::not_found("Order not found with this ID"));
    }
    tracing::info!(order_id = %order.id, restored = restored.len(), "order deleted");

    let mut effects = Effects::new();
    effects.admin_log(NewAdminLog::for_order(
        AdminLogType::DeleteOrder,
        order.id,
        "Order deleted by admin.",
        user.user_id,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok(
        "Order deleted successfully",
        serde_json::json!({ "id": order.id }),
    ))
}
