use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::{AdminLogFilter, AdminLogStore, DateRange, UserLogFilter, UserLogStore};
use crate::{
    db::{DbPool, OrmConn},
    entity::{AdminLogs, UserLogs, admin_logs, user_logs},
    error::{AppError, AppResult},
    models::{AdminLogEntry, NewAdminLog, NewUserLog, UserLogEntry},
    query::Window,
};

fn parse_type<T: std::str::FromStr<Err = String>>(raw: &str) -> AppResult<T> {
    raw.parse::<T>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

fn admin_from_model(model: admin_logs::Model) -> AppResult<AdminLogEntry> {
    Ok(AdminLogEntry {
        id: model.id,
        log_type: parse_type(&model.log_type)?,
        product_id: model.product_id,
        product_name: model.product_name,
        order_id: model.order_id,
        message: model.message,
        triggered_by: model.triggered_by,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn user_from_model(model: user_logs::Model) -> AppResult<UserLogEntry> {
    Ok(UserLogEntry {
        id: model.id,
        log_type: parse_type(&model.log_type)?,
        user_id: model.user_id,
        message: model.message,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn with_range<C: ColumnTrait>(mut cond: Condition, column: C, range: &DateRange) -> Condition {
    if let Some(start) = range.start {
        cond = cond.add(column.gte(start));
    }
    if let Some(end) = range.end {
        cond = cond.add(column.lte(end));
    }
    cond
}

fn admin_condition(filter: &AdminLogFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(t) = filter.log_type {
        cond = cond.add(admin_logs::Column::LogType.eq(t.as_str()));
    }
    if let Some(user) = filter.triggered_by {
        cond = cond.add(admin_logs::Column::TriggeredBy.eq(user));
    }
    with_range(cond, admin_logs::Column::CreatedAt, &filter.created)
}

fn user_condition(filter: &UserLogFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(t) = filter.log_type {
        cond = cond.add(user_logs::Column::LogType.eq(t.as_str()));
    }
    if let Some(user) = filter.user_id {
        cond = cond.add(user_logs::Column::UserId.eq(user));
    }
    if let Some(ip) = &filter.ip_address {
        cond = cond.add(user_logs::Column::IpAddress.eq(ip.clone()));
    }
    if let Some(ua) = &filter.user_agent {
        cond = cond.add(user_logs::Column::UserAgent.eq(ua.clone()));
    }
    with_range(cond, user_logs::Column::CreatedAt, &filter.created)
}

/// Appends go through sqlx; reads go through SeaORM over the same pool.
pub struct PgAdminLogStore {
    pool: DbPool,
    orm: OrmConn,
}

impl PgAdminLogStore {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}

#[async_trait]
impl AdminLogStore for PgAdminLogStore {
    async fn append(&self, entry: NewAdminLog) -> AppResult<AdminLogEntry> {
        let id = Uuid::new_v4();
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO admin_logs (id, log_type, product_id, product_name, order_id, message, triggered_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(entry.log_type.as_str())
        .bind(entry.product_id)
        .bind(&entry.product_name)
        .bind(entry.order_id)
        .bind(&entry.message)
        .bind(entry.triggered_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminLogEntry {
            id,
            log_type: entry.log_type,
            product_id: entry.product_id,
            product_name: entry.product_name,
            order_id: entry.order_id,
            message: entry.message,
            triggered_by: entry.triggered_by,
            created_at,
        })
    }

    async fn list(&self, filter: &AdminLogFilter, window: Option<Window>) -> AppResult<Vec<AdminLogEntry>> {
        let mut select = AdminLogs::find()
            .filter(admin_condition(filter))
            .order_by_desc(admin_logs::Column::CreatedAt)
            .order_by_desc(admin_logs::Column::Id);
        if let Some(w) = window {
            select = select.offset(w.skip).limit(w.limit);
        }
        select
            .all(&self.orm)
            .await?
            .into_iter()
            .map(admin_from_model)
            .collect()
    }

    async fn count(&self, filter: &AdminLogFilter) -> AppResult<u64> {
        Ok(AdminLogs::find()
            .filter(admin_condition(filter))
            .count(&self.orm)
            .await?)
    }
}

pub struct PgUserLogStore {
    pool: DbPool,
    orm: OrmConn,
}

impl PgUserLogStore {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}

#[async_trait]
impl UserLogStore for PgUserLogStore {
    async fn append(&self, entry: NewUserLog) -> AppResult<UserLogEntry> {
        let id = Uuid::new_v4();
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO user_logs (id, log_type, user_id, message, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(entry.log_type.as_str())
        .bind(entry.user_id)
        .bind(&entry.message)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserLogEntry {
            id,
            log_type: entry.log_type,
            user_id: entry.user_id,
            message: entry.message,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at,
        })
    }

    async fn list(&self, filter: &UserLogFilter, window: Option<Window>) -> AppResult<Vec<UserLogEntry>> {
        let mut select = UserLogs::find()
            .filter(user_condition(filter))
            .order_by_desc(user_logs::Column::CreatedAt)
            .order_by_desc(user_logs::Column::Id);
        if let Some(w) = window {
            select = select.offset(w.skip).limit(w.limit);
        }
        select
            .all(&self.orm)
            .await?
            .into_iter()
            .map(user_from_model)
            .collect()
    }

    async fn count(&self, filter: &UserLogFilter) -> AppResult<u64> {
        Ok(UserLogs::find()
            .filter(user_condition(filter))
            .count(&self.orm)
            .await?)
    }
}
