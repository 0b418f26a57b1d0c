use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{FilterFacets, ProductInput, ProductList, ProductListing, ProductUpload},
    error::AppResult,
    images,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::{CatalogParams, read_product_form},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/featured", get(featured_products))
        .route("/filters", get(product_filters))
        .route("/{id}", get(get_product))
}

/// Catalog administration, mounted under `/admin/products`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_products).post(create_product))
        .route("/{id}", axum::routing::put(update_product).delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(CatalogParams),
    responses(
        (status = 200, description = "Filtered, sorted and paged catalog", body = ApiResponse<ProductListing>),
        (status = 400, description = "Unparseable filter value"),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<ApiResponse<ProductListing>>> {
    let resp = product_service::list_products(&state, &params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured_products(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::featured_products(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/filters",
    responses(
        (status = 200, description = "Distinct brands, statuses and tags", body = ApiResponse<FilterFacets>)
    ),
    tag = "Products"
)]
pub async fn product_filters(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FilterFacets>>> {
    Ok(Json(product_service::product_filters(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::get_product(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(CatalogParams),
    responses(
        (status = 200, description = "All products regardless of status", body = ApiResponse<ProductList>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::admin_products(&state, &user, &params).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Missing field or image"),
        (status = 502, description = "Image upload failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_product_form(&state.config, multipart).await?;
    let input = match ProductInput::from_fields(&form.fields) {
        Ok(input) => input,
        Err(err) => {
            images::discard(&form.uploads).await;
            return Err(err);
        }
    };
    let resp = product_service::create_product(&state, &user, input, form.uploads).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid field or status contradicting stock"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_product_form(&state.config, multipart).await?;
    let input = match ProductInput::from_fields(&form.fields) {
        Ok(input) => input,
        Err(err) => {
            images::discard(&form.uploads).await;
            return Err(err);
        }
    };
    let resp = product_service::update_product(&state, &user, id, input, form.uploads).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(product_service::delete_product(&state, &user, id).await?))
}
