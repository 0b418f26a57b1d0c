use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminLogFilter, AdminLogStore, UserLogFilter, UserLogStore};
use crate::{
    error::AppResult,
    models::{AdminLogEntry, NewAdminLog, NewUserLog, UserLogEntry},
    query::Window,
};

fn window_newest_first<T: Clone>(
    entries: &[T],
    keep: impl Fn(&T) -> bool,
    window: Option<Window>,
) -> Vec<T> {
    let matching = entries.iter().rev().filter(|e| keep(e)).cloned();
    match window {
        Some(w) => matching
            .skip(w.skip as usize)
            .take(w.limit as usize)
            .collect(),
        None => matching.collect(),
    }
}

/// Entries are kept in append order, which is also creation order.
#[derive(Debug, Default, Clone)]
pub struct MemoryAdminLogStore {
    entries: Arc<RwLock<Vec<AdminLogEntry>>>,
}

impl MemoryAdminLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminLogStore for MemoryAdminLogStore {
    async fn append(&self, entry: NewAdminLog) -> AppResult<AdminLogEntry> {
        let stored = AdminLogEntry {
            id: Uuid::new_v4(),
            log_type: entry.log_type,
            product_id: entry.product_id,
            product_name: entry.product_name,
            order_id: entry.order_id,
            message: entry.message,
            triggered_by: entry.triggered_by,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: &AdminLogFilter, window: Option<Window>) -> AppResult<Vec<AdminLogEntry>> {
        let entries = self.entries.read().await;
        Ok(window_newest_first(&entries, |e| filter.matches(e), window))
    }

    async fn count(&self, filter: &AdminLogFilter) -> AppResult<u64> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryUserLogStore {
    entries: Arc<RwLock<Vec<UserLogEntry>>>,
}

impl MemoryUserLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserLogStore for MemoryUserLogStore {
    async fn append(&self, entry: NewUserLog) -> AppResult<UserLogEntry> {
        let stored = UserLogEntry {
            id: Uuid::new_v4(),
            log_type: entry.log_type,
            user_id: entry.user_id,
            message: entry.message,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: &UserLogFilter, window: Option<Window>) -> AppResult<Vec<UserLogEntry>> {
        let entries = self.entries.read().await;
        Ok(window_newest_first(&entries, |e| filter.matches(e), window))
    }

    async fn count(&self, filter: &UserLogFilter) -> AppResult<u64> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientInfo, UserLogType};

    #[tokio::test]
    async fn lists_newest_first_with_window() {
        let store = MemoryUserLogStore::new();
        let user = Uuid::new_v4();
        let client = ClientInfo::default();
        for msg in ["one", "two", "three"] {
            store
                .append(NewUserLog::new(UserLogType::UserLogin, user, msg, &client))
                .await
                .unwrap();
        }
        store
            .append(NewUserLog::new(UserLogType::UserLogin, Uuid::new_v4(), "other", &client))
            .await
            .unwrap();

        let filter = UserLogFilter::for_user(user);
        assert_eq!(store.count(&filter).await.unwrap(), 3);

        let page = store
            .list(&filter, Some(Window { skip: 1, limit: 5 }))
            .await
            .unwrap();
        let messages: Vec<_> = page.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["two", "one"]);
    }
}
