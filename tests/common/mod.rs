#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use storefront_api::{
    config::AppConfig,
    dto::orders::{NewOrderItem, NewOrderRequest},
    images::MemoryImageStore,
    middleware::auth::{AuthUser, issue_token},
    models::{ClientInfo, Order, PaymentInfo, Product, ProductStatus, Role, ShippingInfo, User},
    notify::MemoryNotifier,
    services::order_service,
    state::AppState,
};
use uuid::Uuid;

/// In-memory application with one admin and one shopper already registered.
pub struct Harness {
    pub state: AppState,
    pub mail: MemoryNotifier,
    pub images: MemoryImageStore,
    pub admin: AuthUser,
    pub shopper: AuthUser,
    pub client: ClientInfo,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_notifier(MemoryNotifier::new()).await
    }

    pub async fn with_notifier(mail: MemoryNotifier) -> Self {
        let images = MemoryImageStore::new();
        let state = AppState::in_memory(AppConfig::for_tests())
            .with_notifier(Arc::new(mail.clone()))
            .with_images(Arc::new(images.clone()));

        let admin = add_user(&state, "Ada Admin", "admin@example.com", Role::Admin).await;
        let shopper = add_user(&state, "Sam Shopper", "sam@example.com", Role::User).await;

        Self {
            state,
            mail,
            images,
            admin: AuthUser {
                user_id: admin.id,
                role: Role::Admin,
            },
            shopper: AuthUser {
                user_id: shopper.id,
                role: Role::User,
            },
            client: ClientInfo {
                ip_address: "203.0.113.9".into(),
                user_agent: "integration-test".into(),
            },
        }
    }

    pub fn token(&self, user: &AuthUser) -> String {
        issue_token(&self.state.config, user.user_id, user.role).expect("token")
    }

    pub async fn add_product(&self, name: &str, price: i64, stock: i64) -> Product {
        self.state
            .products
            .insert(product(name, price, stock))
            .await
            .expect("insert product")
    }

    pub async fn reload(&self, product: &Product) -> Product {
        self.state
            .products
            .find_by_id(product.id)
            .await
            .expect("find product")
            .expect("product exists")
    }

    /// Place an order for the shopper through the order service.
    pub async fn place_order(&self, items: &[(&Product, i64)]) -> Order {
        let request = NewOrderRequest {
            shipping_info: shipping(),
            order_items: items
                .iter()
                .map(|(p, quantity)| NewOrderItem {
                    product: p.id,
                    quantity: *quantity,
                })
                .collect(),
            payment_info: PaymentInfo {
                id: "pi_test".into(),
                status: "succeeded".into(),
            },
            tax_price: 0,
            shipping_price: 0,
        };
        order_service::new_order(&self.state, &self.shopper, &self.client, request)
            .await
            .expect("place order")
            .data
            .expect("order")
    }
}

pub async fn add_user(state: &AppState, name: &str, email: &str, role: Role) -> User {
    state
        .users
        .insert(User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: "not-a-real-hash".into(),
            role,
            created_at: Utc::now(),
        })
        .await
        .expect("insert user")
}

pub fn product(name: &str, price: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.into(),
        description: format!("{name} description"),
        price,
        category: "General".into(),
        brand: "Acme".into(),
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

pub fn shipping() -> ShippingInfo {
    ShippingInfo {
        address: "1 Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        country: "US".into(),
        pin_code: "62701".into(),
        phone_no: "5550100".into(),
    }
}

pub fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
