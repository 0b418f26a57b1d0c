pub mod admin_logs;
pub mod orders;
pub mod products;
pub mod user_logs;
pub mod users;

pub use admin_logs::Entity as AdminLogs;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use user_logs::Entity as UserLogs;
pub use users::Entity as Users;
