mod common;

use common::{Harness, shipping};
use storefront_api::{
    audit::{AdminLogFilter, UserLogFilter},
    dto::{
        orders::{NewOrderItem, NewOrderRequest},
        products::ProductInput,
    },
    error::AppError,
    models::{AdminLogType, MAX_PRICE, OrderStatus, PaymentInfo, ProductStatus, UserLogType},
    notify::MemoryNotifier,
    services::{order_service, product_service},
};

async fn admin_log_types(h: &Harness) -> Vec<AdminLogType> {
    h.state
        .admin_logs
        .list(&AdminLogFilter::default(), None)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.log_type)
        .collect()
}

#[tokio::test]
async fn shipping_the_last_units_marks_product_out_of_stock_once() {
    let h = Harness::new().await;
    let lamp = h.add_product("Desk Lamp", 1_500, 3).await;
    let order = h.place_order(&[(&lamp, 3)]).await;

    let resp = order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(resp.data.unwrap().order_status, OrderStatus::Shipped);

    let lamp = h.reload(&lamp).await;
    assert_eq!(lamp.stock, 0);
    assert_eq!(lamp.status, ProductStatus::OutOfStock);

    let sent = h.mail.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
    assert!(sent[0].subject.contains("Desk Lamp"));

    let types = admin_log_types(&h).await;
    assert_eq!(types.iter().filter(|t| **t == AdminLogType::OutOfStock).count(), 1);
    assert!(types.contains(&AdminLogType::UpdateOrderStatus));
}

#[tokio::test]
async fn each_forward_transition_consumes_stock() {
    let h = Harness::new().await;
    let mug = h.add_product("Mug", 900, 10).await;
    let order = h.place_order(&[(&mug, 2)]).await;

    order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(h.reload(&mug).await.stock, 8);

    let delivered = order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Delivered)
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(delivered.delivered_at.is_some());
    assert_eq!(h.reload(&mug).await.stock, 6);
    assert!(h.mail.sent().await.is_empty());
}

#[tokio::test]
async fn delivered_orders_cannot_move() {
    let h = Harness::new().await;
    let mug = h.add_product("Mug", 900, 10).await;
    let order = h.place_order(&[(&mug, 1)]).await;
    order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    let err = order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.reload(&mug).await.stock, 9);
}

#[tokio::test]
async fn missing_product_aborts_before_any_write() {
    let h = Harness::new().await;
    let kept = h.add_product("Kept", 100, 5).await;
    let gone = h.add_product("Gone", 100, 5).await;
    let order = h.place_order(&[(&kept, 2), (&gone, 1)]).await;
    assert!(h.state.products.delete(gone.id).await.unwrap());

    let err = order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(h.reload(&kept).await.stock, 5);
    let stored = h.state.orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.order_status, OrderStatus::Processing);
    assert!(admin_log_types(&h).await.is_empty());
    assert!(h.mail.sent().await.is_empty());
}

#[tokio::test]
async fn deleting_an_order_restores_each_line() {
    let h = Harness::new().await;
    let a = h.add_product("A", 100, 10).await;
    let b = h.add_product("B", 100, 10).await;
    let order = h.place_order(&[(&a, 1), (&b, 2)]).await;
    order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(h.reload(&a).await.stock, 9);
    assert_eq!(h.reload(&b).await.stock, 8);

    order_service::delete_order(&h.state, &h.admin, order.id).await.unwrap();

    assert_eq!(h.reload(&a).await.stock, 10);
    assert_eq!(h.reload(&b).await.stock, 10);
    assert!(h.state.orders.find_by_id(order.id).await.unwrap().is_none());
    assert!(admin_log_types(&h).await.contains(&AdminLogType::DeleteOrder));
}

#[tokio::test]
async fn admin_zero_on_out_of_stock_product_is_not_repeated() {
    let h = Harness::new().await;
    let empty = h.add_product("Empty Shelf", 100, 0).await;
    assert_eq!(empty.status, ProductStatus::OutOfStock);

    let input = ProductInput {
        stock: Some(0),
        ..ProductInput::default()
    };
    product_service::update_product(&h.state, &h.admin, empty.id, input, Vec::new())
        .await
        .unwrap();

    assert!(h.mail.sent().await.is_empty());
    let types = admin_log_types(&h).await;
    assert!(!types.contains(&AdminLogType::OutOfStock));
    assert_eq!(types, vec![AdminLogType::UpdateProduct]);
}

#[tokio::test]
async fn admin_restock_reactivates_and_logs() {
    let h = Harness::new().await;
    let empty = h.add_product("Empty Shelf", 100, 0).await;

    let input = ProductInput {
        stock: Some(12),
        ..ProductInput::default()
    };
    let updated = product_service::update_product(&h.state, &h.admin, empty.id, input, Vec::new())
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(updated.stock, 12);
    assert_eq!(updated.status, ProductStatus::Active);
    assert!(admin_log_types(&h).await.contains(&AdminLogType::Restocked));
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_logs_the_user() {
    let h = Harness::new().await;
    let lamp = h.add_product("Lamp", 1_250, 4).await;
    let order = h.place_order(&[(&lamp, 2)]).await;

    assert_eq!(order.items_price, 2_500);
    assert_eq!(order.total_price, 2_500);
    assert_eq!(order.order_items[0].name, "Lamp");
    assert_eq!(h.reload(&lamp).await.stock, 4);

    let logs = h
        .state
        .user_logs
        .list(&UserLogFilter::for_user(h.shopper.user_id), None)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_type, UserLogType::PlaceOrder);
    assert_eq!(logs[0].ip_address, "203.0.113.9");
}

#[tokio::test]
async fn only_owner_or_admin_can_read_an_order() {
    let h = Harness::new().await;
    let lamp = h.add_product("Lamp", 1_250, 4).await;
    let order = h.place_order(&[(&lamp, 1)]).await;

    let stranger = storefront_api::middleware::auth::AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: storefront_api::models::Role::User,
    };
    assert!(matches!(
        order_service::get_order(&h.state, &stranger, order.id).await,
        Err(AppError::Forbidden)
    ));
    assert!(order_service::get_order(&h.state, &h.admin, order.id).await.is_ok());
    assert!(order_service::get_order(&h.state, &h.shopper, order.id).await.is_ok());
}

fn order_request(product: uuid::Uuid, quantity: i64, tax_price: i64) -> NewOrderRequest {
    NewOrderRequest {
        shipping_info: shipping(),
        order_items: vec![NewOrderItem { product, quantity }],
        payment_info: PaymentInfo {
            id: "pi_test".into(),
            status: "succeeded".into(),
        },
        tax_price,
        shipping_price: 0,
    }
}

#[tokio::test]
async fn oversized_quantities_and_totals_are_rejected() {
    let h = Harness::new().await;
    let yacht = h.add_product("Yacht", MAX_PRICE, 5).await;

    let err = order_service::new_order(
        &h.state,
        &h.shopper,
        &h.client,
        order_request(yacht.id, 100_000_000_000_000, 0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = order_service::new_order(
        &h.state,
        &h.shopper,
        &h.client,
        order_request(yacht.id, 1, i64::MAX),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let order = order_service::new_order(&h.state, &h.shopper, &h.client, order_request(yacht.id, 9_999, 0))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(order.items_price, MAX_PRICE * 9_999);
    assert_eq!(h.state.orders.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_out_of_stock_mail_keeps_the_stock_change() {
    let h = Harness::with_notifier(MemoryNotifier::failing()).await;
    let lamp = h.add_product("Desk Lamp", 1_500, 2).await;
    let order = h.place_order(&[(&lamp, 2)]).await;

    let resp = order_service::update_order_status(&h.state, &h.admin, order.id, OrderStatus::Shipped).await;
    assert!(resp.is_ok());

    let lamp = h.reload(&lamp).await;
    assert_eq!(lamp.stock, 0);
    assert_eq!(lamp.status, ProductStatus::OutOfStock);

    let types = admin_log_types(&h).await;
    assert_eq!(types.iter().filter(|t| **t == AdminLogType::OutOfStock).count(), 1);
    assert!(types.contains(&AdminLogType::UpdateOrderStatus));
}
