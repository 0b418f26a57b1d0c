pub mod auth;
pub mod logs;
pub mod orders;
pub mod otp;
pub mod products;
pub mod reviews;
