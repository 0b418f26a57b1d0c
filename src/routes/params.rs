use axum::extract::Multipart;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    images,
};

/// Documented subset of the catalog query string. The handlers read the raw
/// ordered pairs, so bracket operators such as `price[gte]` also apply.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Case-insensitive substring match on the product name or description.
    pub keyword: Option<String>,
    /// 1-based page number.
    pub page: Option<u64>,
    /// Comma separated fields, `-` prefix for descending, e.g. `price,-ratings`.
    pub sort: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    /// `Active`, `Inactive` or `OutOfStock`.
    pub status: Option<String>,
    pub tags: Option<String>,
    pub is_featured: Option<bool>,
    #[serde(rename = "price[gte]")]
    pub price_gte: Option<f64>,
    #[serde(rename = "price[lte]")]
    pub price_lte: Option<f64>,
    #[serde(rename = "ratings[gte]")]
    pub ratings_gte: Option<f64>,
}

/// Text fields of a product form plus the files stashed under `upload_dir`.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: Vec<(String, String)>,
    pub uploads: Vec<std::path::PathBuf>,
}

/// Drain a multipart body. File parts named `images` are written to the upload
/// directory; a malformed body removes whatever was already stashed.
pub async fn read_product_form(config: &AppConfig, mut multipart: Multipart) -> AppResult<ProductForm> {
    let mut form = ProductForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                images::discard(&form.uploads).await;
                return Err(AppError::validation(format!("Malformed form data: {err}")));
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        let stashed = match file_name {
            Some(file_name) if name == "images" => match field.bytes().await {
                Ok(bytes) => images::stash_upload(&config.upload_dir, &file_name, &bytes)
                    .await
                    .map(|path| form.uploads.push(path)),
                Err(err) => Err(AppError::validation(format!("Malformed form data: {err}"))),
            },
            _ => match field.text().await {
                Ok(value) => {
                    form.fields.push((name, value));
                    Ok(())
                }
                Err(err) => Err(AppError::validation(format!("Malformed form data: {err}"))),
            },
        };
        if let Err(err) = stashed {
            images::discard(&form.uploads).await;
            return Err(err);
        }
    }
    Ok(form)
}
