//! Append-only audit trail for admin and user actions, plus its reporting reads.

pub mod export;
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{AdminLogEntry, AdminLogType, NewAdminLog, NewUserLog, UserLogEntry, UserLogType},
    query::Window,
};

pub use memory::{MemoryAdminLogStore, MemoryUserLogStore};
pub use postgres::{PgAdminLogStore, PgUserLogStore};

/// Inclusive creation-time bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminLogFilter {
    pub log_type: Option<AdminLogType>,
    pub triggered_by: Option<Uuid>,
    pub created: DateRange,
}

impl AdminLogFilter {
    pub fn matches(&self, entry: &AdminLogEntry) -> bool {
        self.log_type.is_none_or(|t| entry.log_type == t)
            && self.triggered_by.is_none_or(|u| entry.triggered_by == u)
            && self.created.contains(entry.created_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserLogFilter {
    pub log_type: Option<UserLogType>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created: DateRange,
}

impl UserLogFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &UserLogEntry) -> bool {
        self.log_type.is_none_or(|t| entry.log_type == t)
            && self.user_id.is_none_or(|u| entry.user_id == u)
            && self
                .ip_address
                .as_deref()
                .is_none_or(|ip| entry.ip_address == ip)
            && self
                .user_agent
                .as_deref()
                .is_none_or(|ua| entry.user_agent == ua)
            && self.created.contains(entry.created_at)
    }
}

/// Sink and reporting reads for admin entries. Lists are newest first.
#[async_trait]
pub trait AdminLogStore: Send + Sync {
    async fn append(&self, entry: NewAdminLog) -> AppResult<AdminLogEntry>;
    async fn list(&self, filter: &AdminLogFilter, window: Option<Window>) -> AppResult<Vec<AdminLogEntry>>;
    async fn count(&self, filter: &AdminLogFilter) -> AppResult<u64>;
}

/// Sink and reporting reads for user entries. Lists are newest first.
#[async_trait]
pub trait UserLogStore: Send + Sync {
    async fn append(&self, entry: NewUserLog) -> AppResult<UserLogEntry>;
    async fn list(&self, filter: &UserLogFilter, window: Option<Window>) -> AppResult<Vec<UserLogEntry>>;
    async fn count(&self, filter: &UserLogFilter) -> AppResult<u64>;
}

/// Admin entry with a sentence describing it for the reporting views.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescribedAdminLog {
    #[serde(flatten)]
    pub entry: AdminLogEntry,
    pub action_description: String,
}

impl From<AdminLogEntry> for DescribedAdminLog {
    fn from(entry: AdminLogEntry) -> Self {
        Self {
            action_description: action_description(&entry),
            entry,
        }
    }
}

pub fn action_description(entry: &AdminLogEntry) -> String {
    let product = entry.product_name.as_deref().unwrap_or("unknown product");
    let order = entry
        .order_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    match entry.log_type {
        AdminLogType::OutOfStock => format!("Marked '{product}' as out of stock."),
        AdminLogType::Restocked => format!("Restocked '{product}'."),
        AdminLogType::CreateProduct => format!("Created product '{product}'."),
        AdminLogType::UpdateProduct => format!("Updated product '{product}'."),
        AdminLogType::DeleteProduct => format!("Deleted product '{product}'."),
        AdminLogType::UpdateOrderStatus => format!("Updated status of order {order}."),
        AdminLogType::DeleteOrder => format!("Deleted order {order}."),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn entry(log_type: AdminLogType) -> AdminLogEntry {
        AdminLogEntry {
            id: Uuid::new_v4(),
            log_type,
            product_id: Some(Uuid::new_v4()),
            product_name: Some("Lamp".into()),
            order_id: None,
            message: String::new(),
            triggered_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn descriptions_name_the_product() {
        assert_eq!(
            action_description(&entry(AdminLogType::OutOfStock)),
            "Marked 'Lamp' as out of stock."
        );
        assert_eq!(action_description(&entry(AdminLogType::Restocked)), "Restocked 'Lamp'.");
    }

    #[test]
    fn date_range_is_inclusive() {
        let now = Utc::now();
        let range = DateRange {
            start: Some(now),
            end: Some(now + Duration::hours(1)),
        };
        assert!(range.contains(now));
        assert!(range.contains(now + Duration::hours(1)));
        assert!(!range.contains(now - Duration::seconds(1)));
        assert!(DateRange::default().contains(now));
    }

    #[test]
    fn admin_filter_combines_fields() {
        let e = entry(AdminLogType::Restocked);
        let mut filter = AdminLogFilter {
            log_type: Some(AdminLogType::Restocked),
            triggered_by: Some(e.triggered_by),
            ..AdminLogFilter::default()
        };
        assert!(filter.matches(&e));
        filter.log_type = Some(AdminLogType::OutOfStock);
        assert!(!filter.matches(&e));
    }
}
