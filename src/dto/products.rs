use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{MAX_PRICE, MAX_STOCK, Product, ProductStatus},
};

/// Storefront listing plus the counters the catalog UI needs.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub products: Vec<Product>,
    pub products_count: u64,
    pub result_per_page: u64,
    pub filtered_products_count: u64,
    pub min_price: i64,
    pub max_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FilterFacets {
    pub brands: Vec<String>,
    pub statuses: Vec<String>,
    pub tags: Vec<String>,
}

/// Multipart body accepted by product create/update. Documentation only; the
/// handlers read the parts directly.
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpload {
    name: Option<String>,
    description: Option<String>,
    price: Option<i64>,
    category: Option<String>,
    brand: Option<String>,
    /// Comma separated.
    tags: Option<String>,
    stock: Option<i64>,
    /// `"true"` marks the product as featured; anything else clears it.
    is_featured: Option<String>,
    status: Option<String>,
    #[schema(value_type = Vec<String>, format = Binary)]
    images: Option<Vec<Vec<u8>>>,
}

/// Product fields from a form, each present only if the form carried it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub stock: Option<i64>,
    pub is_featured: Option<bool>,
    pub status: Option<ProductStatus>,
}

fn parse_bounded(field: &str, raw: &str, max: i64) -> AppResult<i64> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::validation(format!("{field} must be a whole number")))?;
    if !(0..=max).contains(&value) {
        return Err(AppError::validation(format!("{field} must be between 0 and {max}")));
    }
    Ok(value)
}

impl ProductInput {
    /// Parse the text parts of a product form. Unknown parts are ignored.
    pub fn from_fields(fields: &[(String, String)]) -> AppResult<Self> {
        let mut input = ProductInput::default();
        for (name, value) in fields {
            match name.as_str() {
                "name" => input.name = Some(value.trim().to_string()),
                "description" => input.description = Some(value.trim().to_string()),
                "price" => input.price = Some(parse_bounded("price", value, MAX_PRICE)?),
                "category" => input.category = Some(value.trim().to_string()),
                "brand" => input.brand = Some(value.trim().to_string()),
                "tags" => {
                    input.tags = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                }
                // Stock below zero is clamped by the ledger, above the cap is refused.
                "stock" => {
                    let stock = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| AppError::validation("stock must be a whole number"))?;
                    if stock > MAX_STOCK {
                        return Err(AppError::validation(format!(
                            "stock cannot exceed {MAX_STOCK}"
                        )));
                    }
                    input.stock = Some(stock);
                }
                "isFeatured" => input.is_featured = Some(value.trim() == "true"),
                "status" => {
                    input.status = Some(value.parse::<ProductStatus>().map_err(AppError::Validation)?)
                }
                _ => {}
            }
        }
        Ok(input)
    }

    /// Names of the fields whose value differs from `product`.
    pub fn changed_fields(&self, product: &Product) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name.as_ref().is_some_and(|v| *v != product.name) {
            changed.push("name");
        }
        if self.description.as_ref().is_some_and(|v| *v != product.description) {
            changed.push("description");
        }
        if self.price.is_some_and(|v| v != product.price) {
            changed.push("price");
        }
        if self.category.as_ref().is_some_and(|v| *v != product.category) {
            changed.push("category");
        }
        if self.brand.as_ref().is_some_and(|v| *v != product.brand) {
            changed.push("brand");
        }
        if self.tags.as_ref().is_some_and(|v| *v != product.tags) {
            changed.push("tags");
        }
        if self.stock.is_some_and(|v| v.max(0) != product.stock) {
            changed.push("stock");
        }
        if self.is_featured.is_some_and(|v| v != product.is_featured) {
            changed.push("isFeatured");
        }
        if self.status.is_some_and(|v| v != product.status) {
            changed.push("status");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn form_fields_are_typed() {
        let input = ProductInput::from_fields(&fields(&[
            ("name", " Lamp "),
            ("price", "1500"),
            ("tags", "home, light,"),
            ("isFeatured", "true"),
            ("status", "Out of Stock"),
            ("colour", "red"),
        ]))
        .unwrap();

        assert_eq!(input.name.as_deref(), Some("Lamp"));
        assert_eq!(input.price, Some(1500));
        assert_eq!(input.tags, Some(vec!["home".to_string(), "light".to_string()]));
        assert_eq!(input.is_featured, Some(true));
        assert_eq!(input.status, Some(ProductStatus::OutOfStock));
        assert_eq!(input.stock, None);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        for bad in [("price", "-1"), ("price", "100000000"), ("stock", "10000"), ("stock", "x")] {
            let err = ProductInput::from_fields(&fields(&[bad])).unwrap_err();
            assert_eq!(err.kind(), "validation", "{bad:?}");
        }
    }

    #[test]
    fn changed_fields_ignore_identical_values() {
        let product = crate::test_support::product("Lamp", 100, 3);
        let input = ProductInput {
            name: Some("Lamp".into()),
            price: Some(120),
            stock: Some(3),
            ..ProductInput::default()
        };
        assert_eq!(input.changed_fields(&product), vec!["price"]);
    }
}
