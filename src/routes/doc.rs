use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    audit::DescribedAdminLog,
    dto::{
        auth::{
            AuthData, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
            ResetLinkSent, ResetPasswordRequest, UpdateProfileRequest, UpdateUserRequest, UserList,
        },
        logs::{AdminLogList, UserLogList},
        orders::{AdminOrderList, NewOrderItem, NewOrderRequest, OrderList, UpdateOrderStatusRequest},
        otp::{OtpStatus, SendOtpRequest, VerifyOtpRequest},
        products::{FilterFacets, ProductList, ProductListing, ProductUpload},
        reviews::{ReviewList, ReviewRequest},
    },
    error::ErrorData,
    models::{
        AdminLogEntry, AdminLogType, Order, OrderItem, OrderStatus, PaymentInfo, Product,
        ProductImage, ProductStatus, Review, Role, ShippingInfo, User, UserLogEntry, UserLogType,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, products, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        auth::change_password,
        auth::forgot_password,
        auth::reset_password,
        auth::send_otp,
        auth::verify_otp,
        products::list_products,
        products::featured_products,
        products::product_filters,
        products::get_product,
        products::admin_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        reviews::submit_review,
        reviews::product_reviews,
        reviews::delete_review,
        orders::new_order,
        orders::my_orders,
        orders::get_order,
        orders::all_orders,
        orders::update_order_status,
        orders::delete_order,
        admin::list_users,
        admin::get_user,
        admin::update_user,
        admin::delete_user,
        admin::admin_logs,
        admin::export_admin_logs,
        admin::user_logs,
        admin::export_user_logs,
        admin::logs_for_user
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            ProductImage,
            ProductStatus,
            Review,
            Order,
            OrderItem,
            OrderStatus,
            ShippingInfo,
            PaymentInfo,
            AdminLogEntry,
            AdminLogType,
            UserLogEntry,
            UserLogType,
            DescribedAdminLog,
            RegisterRequest,
            LoginRequest,
            AuthData,
            UpdateProfileRequest,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetLinkSent,
            ResetPasswordRequest,
            UpdateUserRequest,
            UserList,
            SendOtpRequest,
            VerifyOtpRequest,
            OtpStatus,
            ProductListing,
            ProductList,
            FilterFacets,
            ProductUpload,
            ReviewRequest,
            ReviewList,
            NewOrderItem,
            NewOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            AdminOrderList,
            AdminLogList,
            UserLogList,
            ErrorData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductListing>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<AuthData>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Catalog, fulfillment and user administration"),
        (name = "Logs", description = "Audit trail reporting"),
        (name = "Auth", description = "Accounts, sessions and e-mail OTP"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
