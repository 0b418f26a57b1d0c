//! Persistence boundary.
//!
//! Services only see these traits. `postgres` implements them over SeaORM, `memory`
//! keeps everything in process for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Order, Product, User},
    query::{ProductFilter, Window},
};

pub use memory::{InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository};
pub use postgres::{PgOrderRepository, PgProductRepository, PgUserRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    Brand,
    Category,
    Status,
    Tags,
}

/// Cheapest and most expensive price over the whole catalog; zero when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriceBounds {
    pub min: i64,
    pub max: i64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>>;

    /// Products matching `filter` in its sort order, optionally windowed.
    async fn find(&self, filter: &ProductFilter, window: Option<Window>) -> AppResult<Vec<Product>>;

    async fn count(&self, filter: &ProductFilter) -> AppResult<u64>;

    async fn insert(&self, product: Product) -> AppResult<Product>;

    async fn save(&self, product: &Product) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Sorted distinct values of a field across all products.
    async fn distinct(&self, field: DistinctField) -> AppResult<Vec<String>>;

    async fn price_bounds(&self) -> AppResult<PriceBounds>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Newest first.
    async fn find_by_user(&self, user: Uuid) -> AppResult<Vec<Order>>;

    /// Newest first.
    async fn find_all(&self) -> AppResult<Vec<Order>>;

    async fn insert(&self, order: Order) -> AppResult<Order>;

    /// Save the order together with the products its transition touched, atomically.
    async fn save_with_products(&self, order: &Order, products: &[Product]) -> AppResult<()>;

    /// Delete the order and save the restocked products, atomically.
    async fn delete_with_products(&self, id: Uuid, products: &[Product]) -> AppResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    /// Fails with `Conflict` when the e-mail is taken.
    async fn insert(&self, user: User) -> AppResult<User>;

    async fn save(&self, user: &User) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}
