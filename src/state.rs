use std::sync::Arc;

use crate::{
    audit::{
        AdminLogStore, MemoryAdminLogStore, MemoryUserLogStore, PgAdminLogStore, PgUserLogStore,
        UserLogStore,
    },
    config::AppConfig,
    db::{DbPool, orm_from_pool},
    images::{ImageStore, LocalImageStore, MemoryImageStore},
    notify::{LogNotifier, MemoryNotifier, Notifier},
    repository::{
        InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository,
        OrderRepository, PgOrderRepository, PgProductRepository, PgUserRepository,
        ProductRepository, UserRepository,
    },
    ttl::{MemoryTtlStore, PgTtlStore, TtlStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub admin_logs: Arc<dyn AdminLogStore>,
    pub user_logs: Arc<dyn UserLogStore>,
    pub notifier: Arc<dyn Notifier>,
    pub images: Arc<dyn ImageStore>,
    pub ttl: Arc<dyn TtlStore>,
}

impl AppState {
    /// Everything backed by Postgres; images on local disk, mail to the log until
    /// [`AppState::with_notifier`] swaps in SMTP.
    pub fn postgres(pool: DbPool, config: AppConfig) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self {
            products: Arc::new(PgProductRepository::new(orm.clone())),
            orders: Arc::new(PgOrderRepository::new(orm.clone())),
            users: Arc::new(PgUserRepository::new(orm.clone())),
            admin_logs: Arc::new(PgAdminLogStore::new(pool.clone(), orm.clone())),
            user_logs: Arc::new(PgUserLogStore::new(pool.clone(), orm)),
            notifier: Arc::new(LogNotifier),
            images: Arc::new(LocalImageStore::new(
                config.image_root.clone(),
                config.image_base_url.clone(),
            )),
            ttl: Arc::new(PgTtlStore::new(pool)),
            config: Arc::new(config),
        }
    }

    /// Process-local state for tests and demos.
    pub fn in_memory(config: AppConfig) -> Self {
        let products = InMemoryProductRepository::new();
        Self {
            orders: Arc::new(InMemoryOrderRepository::new(&products)),
            products: Arc::new(products),
            users: Arc::new(InMemoryUserRepository::new()),
            admin_logs: Arc::new(MemoryAdminLogStore::new()),
            user_logs: Arc::new(MemoryUserLogStore::new()),
            notifier: Arc::new(MemoryNotifier::new()),
            images: Arc::new(MemoryImageStore::new()),
            ttl: Arc::new(MemoryTtlStore::new()),
            config: Arc::new(config),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = images;
        self
    }
}
