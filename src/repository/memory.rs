use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DistinctField, OrderRepository, PriceBounds, ProductRepository, UserRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Order, Product, User},
    query::{ProductFilter, Window},
};

type ProductMap = Arc<RwLock<HashMap<Uuid, Product>>>;

#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: ProductMap,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn find(&self, filter: &ProductFilter, window: Option<Window>) -> AppResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut result: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        result.sort_by(|a, b| filter.compare(a, b));

        Ok(match window {
            Some(w) => result
                .into_iter()
                .skip(w.skip as usize)
                .take(w.limit as usize)
                .collect(),
            None => result,
        })
    }

    async fn count(&self, filter: &ProductFilter) -> AppResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn insert(&self, product: Product) -> AppResult<Product> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(AppError::Conflict(format!("product {} already exists", product.id)));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn save(&self, product: &Product) -> AppResult<()> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!("Product not found with ID: {}", product.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn distinct(&self, field: DistinctField) -> AppResult<Vec<String>> {
        let products = self.products.read().await;
        let values: BTreeSet<String> = products
            .values()
            .flat_map(|p| match field {
                DistinctField::Brand => vec![p.brand.clone()],
                DistinctField::Category => vec![p.category.clone()],
                DistinctField::Status => vec![p.status.as_str().to_string()],
                DistinctField::Tags => p.tags.clone(),
            })
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn price_bounds(&self) -> AppResult<PriceBounds> {
        let products = self.products.read().await;
        let prices = products.values().map(|p| p.price);
        Ok(PriceBounds {
            min: prices.clone().min().unwrap_or(0),
            max: prices.max().unwrap_or(0),
        })
    }
}

/// Orders kept next to a shared product map so transitions can update both under one lock.
#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
    products: ProductMap,
}

impl InMemoryOrderRepository {
    pub fn new(products: &InMemoryProductRepository) -> Self {
        Self {
            orders: Arc::default(),
            products: products.products.clone(),
        }
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_user(&self, user: Uuid) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(
            orders.values().filter(|o| o.user == user).cloned().collect(),
        ))
    }

    async fn find_all(&self) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.values().cloned().collect()))
    }

    async fn insert(&self, order: Order) -> AppResult<Order> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn save_with_products(&self, order: &Order, products: &[Product]) -> AppResult<()> {
        let mut product_map = self.products.write().await;
        let mut orders = self.orders.write().await;

        if !orders.contains_key(&order.id) {
            return Err(AppError::not_found("Order not found"));
        }
        if let Some(missing) = products.iter().find(|p| !product_map.contains_key(&p.id)) {
            return Err(AppError::not_found(format!("Product not found with ID: {}", missing.id)));
        }

        for product in products {
            product_map.insert(product.id, product.clone());
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete_with_products(&self, id: Uuid, products: &[Product]) -> AppResult<bool> {
        let mut product_map = self.products.write().await;
        let mut orders = self.orders.write().await;

        if orders.remove(&id).is_none() {
            return Ok(false);
        }
        for product in products {
            if let Some(slot) = product_map.get_mut(&product.id) {
                *slot = product.clone();
            }
        }
        Ok(true)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, "created user");
        Ok(user)
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(AppError::not_found("User not found")),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
