use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Order, OrderItem, OrderStatus, PaymentInfo, Product, ProductStatus, ShippingInfo,
};

pub fn product(name: &str, price: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        category: "General".to_string(),
        brand: "Acme".to_string(),
        tags: Vec::new(),
        stock,
        num_of_reviews: 0,
        ratings: 0.0,
        images: Vec::new(),
        is_featured: false,
        status: if stock > 0 {
            ProductStatus::Active
        } else {
            ProductStatus::OutOfStock
        },
        owner: Uuid::new_v4(),
        reviews: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn line_item(product: &Product, quantity: i64) -> OrderItem {
    OrderItem {
        product: product.id,
        name: product.name.clone(),
        quantity,
        price: product.price,
        image: None,
    }
}

pub fn order(user: Uuid, items: Vec<OrderItem>) -> Order {
    let now = Utc::now();
    let items_price = items.iter().map(|i| i.price * i.quantity).sum();
    Order {
        id: Uuid::new_v4(),
        user,
        shipping_info: ShippingInfo {
            address: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            country: "US".into(),
            pin_code: "62701".into(),
            phone_no: "5550100".into(),
        },
        order_items: items,
        payment_info: PaymentInfo {
            id: "pay_1".into(),
            status: "succeeded".into(),
        },
        items_price,
        tax_price: 0,
        shipping_price: 0,
        total_price: items_price,
        order_status: OrderStatus::Processing,
        paid_at: now,
        delivered_at: None,
        created_at: now,
    }
}
