use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_PRICE: i64 = 99_999_999;
pub const MAX_STOCK: i64 = 9_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProductStatus {
    Active,
    Inactive,
    #[serde(alias = "Out of Stock")]
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "Active",
            ProductStatus::Inactive => "Inactive",
            ProductStatus::OutOfStock => "OutOfStock",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(ProductStatus::Active),
            "Inactive" => Ok(ProductStatus::Inactive),
            "OutOfStock" | "Out of Stock" => Ok(ProductStatus::OutOfStock),
            other => Err(format!("unknown product status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub storage_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user: Uuid,
    pub name: String,
    pub rating: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub brand: String,
    pub tags: Vec<String>,
    pub stock: i64,
    pub num_of_reviews: i64,
    pub ratings: f64,
    pub images: Vec<ProductImage>,
    pub is_featured: bool,
    pub status: ProductStatus,
    pub owner: Uuid,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
    pub phone_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Uuid,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    pub payment_info: PaymentInfo,
    pub items_price: i64,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
    pub order_status: OrderStatus,
    pub paid_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminLogType {
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    OutOfStock,
    Restocked,
    UpdateOrderStatus,
    DeleteOrder,
}

impl AdminLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminLogType::CreateProduct => "CREATE_PRODUCT",
            AdminLogType::UpdateProduct => "UPDATE_PRODUCT",
            AdminLogType::DeleteProduct => "DELETE_PRODUCT",
            AdminLogType::OutOfStock => "OUT_OF_STOCK",
            AdminLogType::Restocked => "RESTOCKED",
            AdminLogType::UpdateOrderStatus => "UPDATE_ORDER_STATUS",
            AdminLogType::DeleteOrder => "DELETE_ORDER",
        }
    }
}

impl FromStr for AdminLogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CREATE_PRODUCT" => Ok(AdminLogType::CreateProduct),
            "UPDATE_PRODUCT" => Ok(AdminLogType::UpdateProduct),
            "DELETE_PRODUCT" => Ok(AdminLogType::DeleteProduct),
            "OUT_OF_STOCK" => Ok(AdminLogType::OutOfStock),
            "RESTOCKED" => Ok(AdminLogType::Restocked),
            "UPDATE_ORDER_STATUS" => Ok(AdminLogType::UpdateOrderStatus),
            "DELETE_ORDER" => Ok(AdminLogType::DeleteOrder),
            other => Err(format!("unknown admin log type '{other}'")),
        }
    }
}

/// Audit record of an administrative action. Rows are only ever inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub log_type: AdminLogType,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub order_id: Option<Uuid>,
    pub message: String,
    pub triggered_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAdminLog {
    #[serde(rename = "type")]
    pub log_type: AdminLogType,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub order_id: Option<Uuid>,
    pub message: String,
    pub triggered_by: Uuid,
}

impl NewAdminLog {
    pub fn for_product(
        log_type: AdminLogType,
        product: &Product,
        message: impl Into<String>,
        triggered_by: Uuid,
    ) -> Self {
        Self {
            log_type,
            product_id: Some(product.id),
            product_name: Some(product.name.clone()),
            order_id: None,
            message: message.into(),
            triggered_by,
        }
    }

    pub fn for_order(
        log_type: AdminLogType,
        order_id: Uuid,
        message: impl Into<String>,
        triggered_by: Uuid,
    ) -> Self {
        Self {
            log_type,
            product_id: None,
            product_name: None,
            order_id: Some(order_id),
            message: message.into(),
            triggered_by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserLogType {
    UserRegister,
    UserLogin,
    UserLogout,
    UpdateProfile,
    ChangePassword,
    ForgotPassword,
    ResetPassword,
    DeleteUser,
    SubmitReview,
    DeleteReview,
    PlaceOrder,
}

impl UserLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserLogType::UserRegister => "USER_REGISTER",
            UserLogType::UserLogin => "USER_LOGIN",
            UserLogType::UserLogout => "USER_LOGOUT",
            UserLogType::UpdateProfile => "UPDATE_PROFILE",
            UserLogType::ChangePassword => "CHANGE_PASSWORD",
            UserLogType::ForgotPassword => "FORGOT_PASSWORD",
            UserLogType::ResetPassword => "RESET_PASSWORD",
            UserLogType::DeleteUser => "DELETE_USER",
            UserLogType::SubmitReview => "SUBMIT_REVIEW",
            UserLogType::DeleteReview => "DELETE_REVIEW",
            UserLogType::PlaceOrder => "PLACE_ORDER",
        }
    }
}

impl FromStr for UserLogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "USER_REGISTER" => Ok(UserLogType::UserRegister),
            "USER_LOGIN" => Ok(UserLogType::UserLogin),
            "USER_LOGOUT" => Ok(UserLogType::UserLogout),
            "UPDATE_PROFILE" => Ok(UserLogType::UpdateProfile),
            "CHANGE_PASSWORD" => Ok(UserLogType::ChangePassword),
            "FORGOT_PASSWORD" => Ok(UserLogType::ForgotPassword),
            "RESET_PASSWORD" => Ok(UserLogType::ResetPassword),
            "DELETE_USER" => Ok(UserLogType::DeleteUser),
            "SUBMIT_REVIEW" => Ok(UserLogType::SubmitReview),
            "DELETE_REVIEW" => Ok(UserLogType::DeleteReview),
            "PLACE_ORDER" => Ok(UserLogType::PlaceOrder),
            other => Err(format!("unknown user log type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserLogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub log_type: UserLogType,
    pub user_id: Uuid,
    pub message: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUserLog {
    #[serde(rename = "type")]
    pub log_type: UserLogType,
    pub user_id: Uuid,
    pub message: String,
    pub ip_address: String,
    pub user_agent: String,
}

impl NewUserLog {
    pub fn new(
        log_type: UserLogType,
        user_id: Uuid,
        message: impl Into<String>,
        client: &ClientInfo,
    ) -> Self {
        Self {
            log_type,
            user_id,
            message: message.into(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        }
    }
}

/// Caller address and agent as reported by the request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}
