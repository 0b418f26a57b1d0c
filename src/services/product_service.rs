use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::products::{FilterFacets, ProductInput, ProductList, ProductListing},
    effects::{self, Effects},
    error::{AppError, AppResult},
    images,
    middleware::auth::{AuthUser, ensure_admin},
    models::{AdminLogType, NewAdminLog, Product, ProductStatus},
    query::{ProductFilter, ProductQuery, StatusScope},
    repository::DistinctField,
    response::{ApiResponse, Meta},
    state::AppState,
    stock,
};

pub async fn list_products(
    state: &AppState,
    params: &[(String, String)],
) -> AppResult<ApiResponse<ProductListing>> {
    let query = ProductQuery::parse(params, StatusScope::ActiveByDefault)?;
    let per_page = state.config.result_per_page;

    let products_count = state.products.count(&ProductFilter::all()).await?;
    let bounds = state.products.price_bounds().await?;
    let filtered_products_count = state.products.count(&query.filter).await?;
    let products = state
        .products
        .find(&query.filter, Some(query.window(per_page)))
        .await?;

    let meta = Meta::new(
        query.page as i64,
        per_page as i64,
        filtered_products_count as i64,
    );
    let data = ProductListing {
        products,
        products_count,
        result_per_page: per_page,
        filtered_products_count,
        min_price: bounds.min,
        max_price: bounds.max,
    };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

/// Every product matching the query, whatever its status.
pub async fn admin_products(
    state: &AppState,
    user: &AuthUser,
    params: &[(String, String)],
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let query = ProductQuery::parse(params, StatusScope::Unrestricted)?;
    let products = state.products.find(&query.filter, None).await?;
    Ok(ApiResponse::ok("Products", ProductList { products }))
}

pub async fn featured_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let products = state.products.find(&ProductFilter::featured(), None).await?;
    Ok(ApiResponse::ok("Featured products", ProductList { products }))
}

pub async fn product_filters(state: &AppState) -> AppResult<ApiResponse<FilterFacets>> {
    let facets = FilterFacets {
        brands: state.products.distinct(DistinctField::Brand).await?,
        statuses: state.products.distinct(DistinctField::Status).await?,
        tags: state.products.distinct(DistinctField::Tags).await?,
    };
    Ok(ApiResponse::ok("Product filters", facets))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = load_product(state, id).await?;
    Ok(ApiResponse::ok("Product", product))
}

pub(crate) async fn load_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))
}

/// Reject an explicit status that disagrees with the stock it will end up with.
fn check_explicit_status(status: Option<ProductStatus>, final_stock: i64) -> AppResult<()> {
    match status {
        Some(ProductStatus::Active) if final_stock == 0 => Err(AppError::validation(
            "A product with no stock cannot be Active",
        )),
        Some(ProductStatus::OutOfStock) if final_stock > 0 => Err(AppError::validation(
            "A product with stock cannot be OutOfStock",
        )),
        _ => Ok(()),
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("Please enter product {field}")))
}

fn draft_product(user: &AuthUser, input: ProductInput, uploads: &[PathBuf]) -> AppResult<Product> {
    ensure_admin(user)?;
    if uploads.is_empty() {
        return Err(AppError::validation("Please upload at least one image"));
    }

    let stock = input.stock.unwrap_or(1).max(0);
    check_explicit_status(input.status, stock)?;
    let status = match input.status {
        Some(status) => status,
        None if stock == 0 => ProductStatus::OutOfStock,
        None => ProductStatus::Active,
    };

    let now = Utc::now();
    Ok(Product {
        id: Uuid::new_v4(),
        name: required(input.name, "name")?,
        description: required(input.description, "description")?,
        price: input
            .price
            .ok_or_else(|| AppError::validation("Please enter product price"))?,
        category: required(input.category, "category")?,
        brand: required(input.brand, "brand")?,
        tags: input.tags.unwrap_or_default(),
        stock,
        num_of_reviews: 0,
        ratings: 0.0,
        images: Vec::new(),
        is_featured: input.is_featured.unwrap_or(false),
        status,
        owner: user.user_id,
        reviews: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    input: ProductInput,
    uploads: Vec<PathBuf>,
) -> AppResult<ApiResponse<Product>> {
    let mut product = match draft_product(user, input, &uploads) {
        Ok(product) => product,
        Err(err) => {
            images::discard(&uploads).await;
            return Err(err);
        }
    };

    product.images = images::upload_all(state.images.as_ref(), &uploads).await?;
    let product = match state.products.insert(product.clone()).await {
        Ok(saved) => saved,
        Err(err) => {
            images::destroy_all(state.images.as_ref(), &product.images).await;
            return Err(err);
        }
    };
    tracing::info!(product_id = %product.id, "product created");

    let mut effects = Effects::new();
    effects.admin_log(NewAdminLog::for_product(
        AdminLogType::CreateProduct,
        &product,
        "Product created by admin.",
        user.user_id,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok("Product created", product))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    input: ProductInput,
    uploads: Vec<PathBuf>,
) -> AppResult<ApiResponse<Product>> {
    let loaded = async {
        ensure_admin(user)?;
        let product = load_product(state, id).await?;
        let final_stock = input.stock.map(|s| s.max(0)).unwrap_or(product.stock);
        check_explicit_status(input.status, final_stock)?;
        Ok::<_, AppError>(product)
    }
    .await;
    let mut product = match loaded {
        Ok(product) => product,
        Err(err) => {
            images::discard(&uploads).await;
            return Err(err);
        }
    };

    let changed = input.changed_fields(&product);
    let mut effects = Effects::new();

    let replaced_images = if uploads.is_empty() {
        Vec::new()
    } else {
        let uploaded = images::upload_all(state.images.as_ref(), &uploads).await?;
        effects.admin_log(NewAdminLog::for_product(
            AdminLogType::UpdateProduct,
            &product,
            "Product images updated by admin.",
            user.user_id,
        ));
        std::mem::replace(&mut product.images, uploaded)
    };

    if let Some(name) = input.name {
        product.name = name;
    }
    if let Some(description) = input.description {
        product.description = description;
    }
    if let Some(price) = input.price {
        product.price = price;
    }
    if let Some(category) = input.category {
        product.category = category;
    }
    if let Some(brand) = input.brand {
        product.brand = brand;
    }
    if let Some(tags) = input.tags {
        product.tags = tags;
    }
    if let Some(flag) = input.is_featured {
        product.is_featured = flag;
    }
    if let Some(requested) = input.stock {
        let previous_status = product.status;
        effects.extend(stock::apply_admin_stock(
            &mut product,
            requested,
            previous_status,
            user.user_id,
            &state.config.admin_email,
        ));
    }
    if let Some(status) = input.status {
        product.status = status;
    }
    product.updated_at = Utc::now();

    let message = if changed.is_empty() {
        "Product updated with no field-level changes.".to_string()
    } else {
        format!("Product fields updated: {} by admin.", changed.join(", "))
    };
    effects.admin_log(NewAdminLog::for_product(
        AdminLogType::UpdateProduct,
        &product,
        message,
        user.user_id,
    ));

    if let Err(err) = state.products.save(&product).await {
        if !replaced_images.is_empty() {
            images::destroy_all(state.images.as_ref(), &product.images).await;
        }
        return Err(err);
    }
    images::destroy_all(state.images.as_ref(), &replaced_images).await;
    tracing::info!(product_id = %product.id, fields = ?changed, "product updated");

    effects::dispatch(state, effects).await;
    Ok(ApiResponse::ok("Product updated", product))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let product = load_product(state, id).await?;

    if !state.products.delete(id).await? {
        return Err(AppError::not_found("Product not found"));
    }
    images::destroy_all(state.images.as_ref(), &product.images).await;
    tracing::info!(product_id = %id, "product deleted");

    let mut effects = Effects::new();
    effects.admin_log(NewAdminLog::for_product(
        AdminLogType::DeleteProduct,
        &product,
        "Product deleted by admin.",
        user.user_id,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok(
        "Product deleted successfully",
        serde_json::json!({ "id": id }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_status_must_agree_with_stock() {
        assert!(check_explicit_status(Some(ProductStatus::Active), 0).is_err());
        assert!(check_explicit_status(Some(ProductStatus::OutOfStock), 4).is_err());
        assert!(check_explicit_status(Some(ProductStatus::Inactive), 0).is_ok());
        assert!(check_explicit_status(None, 0).is_ok());
    }
}
