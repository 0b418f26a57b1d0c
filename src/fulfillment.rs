//! Order status machine and the stock plans that go with it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    effects::Effects,
    error::{AppError, AppResult},
    models::{Order, OrderItem, OrderStatus, Product},
    stock,
};

/// Orders only move forward: Processing -> Shipped -> Delivered.
pub fn check_transition(current: OrderStatus, next: OrderStatus) -> AppResult<()> {
    if current == OrderStatus::Delivered {
        return Err(AppError::Conflict(
            "You have already delivered this order".into(),
        ));
    }
    if next <= current {
        return Err(AppError::Conflict(format!(
            "Cannot move order from {current} to {next}"
        )));
    }
    Ok(())
}

/// Set the new status, stamping the delivery time when it is reached.
pub fn advance(order: &mut Order, next: OrderStatus, now: DateTime<Utc>) -> OrderStatus {
    let previous = order.order_status;
    order.order_status = next;
    if next == OrderStatus::Delivered {
        order.delivered_at = Some(now);
    }
    previous
}

/// Product writes and effects computed for a status transition.
#[derive(Debug, Clone, Default)]
pub struct StockPlan {
    /// Updated products, in order of first appearance among the line items.
    pub products: Vec<Product>,
    pub effects: Effects,
}

/// Compute the consumption of every line item against a snapshot of the products.
///
/// Line items are applied in order, so two items for the same product see each
/// other's decrement. Any missing product fails the whole plan before anything
/// has been written.
pub fn plan_consumption(
    items: &[OrderItem],
    mut products: HashMap<Uuid, Product>,
    acting_user: Uuid,
    operator_email: &str,
) -> AppResult<StockPlan> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut effects = Effects::new();

    for item in items {
        let product = products.get_mut(&item.product).ok_or_else(|| {
            AppError::not_found(format!("Product not found with ID: {}", item.product))
        })?;
        effects.extend(stock::apply_consumption(
            product,
            item.quantity,
            acting_user,
            operator_email,
        ));
        if !order.contains(&item.product) {
            order.push(item.product);
        }
    }

    let products = order
        .into_iter()
        .filter_map(|id| products.remove(&id))
        .collect();
    Ok(StockPlan { products, effects })
}

/// Stock given back when an order is deleted. Products that no longer exist are skipped.
pub fn plan_restoration(items: &[OrderItem], mut products: HashMap<Uuid, Product>) -> Vec<Product> {
    let mut order: Vec<Uuid> = Vec::new();
    for item in items {
        match products.get_mut(&item.product) {
            Some(product) => {
                stock::restore_stock(product, item.quantity);
                if !order.contains(&item.product) {
                    order.push(item.product);
                }
            }
            None => {
                tracing::debug!(product_id = %item.product, "skipping restore for missing product");
            }
        }
    }
    order
        .into_iter()
        .filter_map(|id| products.remove(&id))
        .collect()
}
