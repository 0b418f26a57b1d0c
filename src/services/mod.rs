pub mod auth_service;
pub mod log_service;
pub mod order_service;
pub mod otp_service;
pub mod password_reset_service;
pub mod product_service;
pub mod review_service;
