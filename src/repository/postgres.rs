use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement, TransactionTrait,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::{DistinctField, OrderRepository, PriceBounds, ProductRepository, UserRepository};
use crate::{
    db::OrmConn,
    entity::{
        Orders, Products, Users,
        orders::{self, Column as OrderCol},
        products::{self, Column as ProductCol},
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    models::{Order, Product, User},
    query::{ProductFilter, Window},
};

fn decode<T: DeserializeOwned>(value: serde_json::Value, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt {column} column: {e}")))
}

fn encode<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn parse_column<T: std::str::FromStr<Err = String>>(raw: &str) -> AppResult<T> {
    raw.parse::<T>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

fn product_from_model(model: products::Model) -> AppResult<Product> {
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        brand: model.brand,
        tags: model.tags,
        stock: model.stock,
        num_of_reviews: model.num_of_reviews,
        ratings: model.ratings,
        images: decode(model.images, "products.images")?,
        is_featured: model.is_featured,
        status: parse_column(&model.status)?,
        owner: model.owner_id,
        reviews: decode(model.reviews, "products.reviews")?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn product_to_active(product: &Product) -> AppResult<products::ActiveModel> {
    Ok(products::ActiveModel {
        id: Set(product.id),
        name: Set(product.name.clone()),
        description: Set(product.description.clone()),
        price: Set(product.price),
        category: Set(product.category.clone()),
        brand: Set(product.brand.clone()),
        tags: Set(product.tags.clone()),
        stock: Set(product.stock),
        num_of_reviews: Set(product.num_of_reviews),
        ratings: Set(product.ratings),
        images: Set(encode(&product.images)?),
        is_featured: Set(product.is_featured),
        status: Set(product.status.as_str().to_string()),
        owner_id: Set(product.owner),
        reviews: Set(encode(&product.reviews)?),
        created_at: Set(product.created_at.into()),
        updated_at: Set(product.updated_at.into()),
    })
}

fn order_from_model(model: orders::Model) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user: model.user_id,
        shipping_info: decode(model.shipping_info, "orders.shipping_info")?,
        order_items: decode(model.order_items, "orders.order_items")?,
        payment_info: decode(model.payment_info, "orders.payment_info")?,
        items_price: model.items_price,
        tax_price: model.tax_price,
        shipping_price: model.shipping_price,
        total_price: model.total_price,
        order_status: parse_column(&model.order_status)?,
        paid_at: model.paid_at.with_timezone(&Utc),
        delivered_at: model.delivered_at.map(|t| t.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn order_to_active(order: &Order) -> AppResult<orders::ActiveModel> {
    Ok(orders::ActiveModel {
        id: Set(order.id),
        user_id: Set(order.user),
        shipping_info: Set(encode(&order.shipping_info)?),
        order_items: Set(encode(&order.order_items)?),
        payment_info: Set(encode(&order.payment_info)?),
        items_price: Set(order.items_price),
        tax_price: Set(order.tax_price),
        shipping_price: Set(order.shipping_price),
        total_price: Set(order.total_price),
        order_status: Set(order.order_status.as_str().to_string()),
        paid_at: Set(order.paid_at.into()),
        delivered_at: Set(order.delivered_at.map(Into::into)),
        created_at: Set(order.created_at.into()),
    })
}

fn user_from_model(model: users::Model) -> AppResult<User> {
    Ok(User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: parse_column(&model.role)?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn user_to_active(user: &User) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_string()),
        created_at: Set(user.created_at.into()),
    }
}

/// `RecordNotUpdated` means the row was gone; everything else is a real failure.
fn missing_as_not_found(err: DbErr, what: String) -> AppError {
    match err {
        DbErr::RecordNotUpdated => AppError::not_found(what),
        other => other.into(),
    }
}

async fn update_products<C: ConnectionTrait>(conn: &C, products: &[Product]) -> AppResult<()> {
    for product in products {
        Products::update(product_to_active(product)?)
            .exec(conn)
            .await
            .map_err(|e| missing_as_not_found(e, format!("Product not found with ID: {}", product.id)))?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgProductRepository {
    orm: OrmConn,
}

impl PgProductRepository {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Products::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(product_from_model)
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        Products::find()
            .filter(ProductCol::Id.is_in(ids.iter().copied()))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_model)
            .collect()
    }

    async fn find(&self, filter: &ProductFilter, window: Option<Window>) -> AppResult<Vec<Product>> {
        let mut select = filter.select();
        if let Some(w) = window {
            select = select.offset(w.skip).limit(w.limit);
        }
        select
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_model)
            .collect()
    }

    async fn count(&self, filter: &ProductFilter) -> AppResult<u64> {
        Ok(Products::find()
            .filter(filter.to_condition())
            .count(&self.orm)
            .await?)
    }

    async fn insert(&self, product: Product) -> AppResult<Product> {
        let model = Products::insert(product_to_active(&product)?)
            .exec_with_returning(&self.orm)
            .await?;
        product_from_model(model)
    }

    async fn save(&self, product: &Product) -> AppResult<()> {
        update_products(&self.orm, std::slice::from_ref(product)).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn distinct(&self, field: DistinctField) -> AppResult<Vec<String>> {
        let column = match field {
            DistinctField::Brand => ProductCol::Brand,
            DistinctField::Category => ProductCol::Category,
            DistinctField::Status => ProductCol::Status,
            DistinctField::Tags => {
                let rows = self
                    .orm
                    .query_all(Statement::from_string(
                        DbBackend::Postgres,
                        "SELECT DISTINCT unnest(tags) AS tag FROM products ORDER BY tag",
                    ))
                    .await?;
                return rows
                    .iter()
                    .map(|row| row.try_get::<String>("", "tag").map_err(AppError::from))
                    .collect();
            }
        };

        Ok(Products::find()
            .select_only()
            .column(column)
            .distinct()
            .order_by_asc(column)
            .into_tuple::<String>()
            .all(&self.orm)
            .await?)
    }

    async fn price_bounds(&self) -> AppResult<PriceBounds> {
        let bounds: Option<(Option<i64>, Option<i64>)> = Products::find()
            .select_only()
            .column_as(Expr::col(ProductCol::Price).min(), "min_price")
            .column_as(Expr::col(ProductCol::Price).max(), "max_price")
            .into_tuple()
            .one(&self.orm)
            .await?;
        let (min, max) = bounds.unwrap_or_default();
        Ok(PriceBounds {
            min: min.unwrap_or(0),
            max: max.unwrap_or(0),
        })
    }
}

#[derive(Clone)]
pub struct PgOrderRepository {
    orm: OrmConn,
}

impl PgOrderRepository {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(order_from_model)
            .transpose()
    }

    async fn find_by_user(&self, user: Uuid) -> AppResult<Vec<Order>> {
        Orders::find()
            .filter(OrderCol::UserId.eq(user))
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn find_all(&self) -> AppResult<Vec<Order>> {
        Orders::find()
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn insert(&self, order: Order) -> AppResult<Order> {
        let model = Orders::insert(order_to_active(&order)?)
            .exec_with_returning(&self.orm)
            .await?;
        order_from_model(model)
    }

    async fn save_with_products(&self, order: &Order, products: &[Product]) -> AppResult<()> {
        let txn = self.orm.begin().await?;
        update_products(&txn, products).await?;
        Orders::update(order_to_active(order)?)
            .exec(&txn)
            .await
            .map_err(|e| missing_as_not_found(e, "Order not found".into()))?;
        txn.commit().await?;
        Ok(())
    }

    async fn delete_with_products(&self, id: Uuid, products: &[Product]) -> AppResult<bool> {
        let txn = self.orm.begin().await?;
        let result = Orders::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        update_products(&txn, products).await?;
        txn.commit().await?;
        Ok(true)
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    orm: OrmConn,
}

impl PgUserRepository {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

fn email_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already registered".into())
        }
        _ => err.into(),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Users::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Users::find()
            .filter(UserCol::Email.eq(email.to_lowercase()))
            .one(&self.orm)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Users::find()
            .order_by_desc(UserCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(user_from_model)
            .collect()
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        let model = Users::insert(user_to_active(&user))
            .exec_with_returning(&self.orm)
            .await
            .map_err(email_conflict)?;
        user_from_model(model)
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        Users::update(user_to_active(user))
            .exec(&self.orm)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => AppError::not_found("User not found"),
                other => email_conflict(other),
            })?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = Users::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }
}
