use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderStatus, PaymentInfo, ShippingInfo};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<NewOrderItem>,
    pub payment_info: PaymentInfo,
    #[serde(default)]
    pub tax_price: i64,
    #[serde(default)]
    pub shipping_price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderList {
    pub total_amount: i64,
    pub orders: Vec<Order>,
}
