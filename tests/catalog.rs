mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{Harness, pairs, product};
use storefront_api::{
    audit::AdminLogFilter,
    dto::products::ProductInput,
    error::AppError,
    images::MemoryImageStore,
    models::{AdminLogType, ProductStatus},
    services::product_service,
};

async fn seed_catalog(h: &Harness) {
    let mut phone = product("Smartphone X", 600, 5);
    phone.tags = vec!["electronics".into(), "mobile".into()];
    let mut cable = product("USB Cable", 15, 100);
    cable.tags = vec!["electronics".into()];
    let mut chair = product("Office Chair", 250, 3);
    chair.tags = vec!["furniture".into()];
    let mut hidden = product("Retired Phone", 300, 2);
    hidden.tags = vec!["mobile".into()];
    hidden.status = ProductStatus::Inactive;

    for p in [phone, cable, chair, hidden] {
        h.state.products.insert(p).await.unwrap();
    }
}

#[tokio::test]
async fn price_range_and_tags_narrow_the_listing() {
    let h = Harness::new().await;
    seed_catalog(&h).await;

    let params = pairs(&[("price[gte]", "100"), ("price[lte]", "700"), ("tags", "mobile")]);
    let listing = product_service::list_products(&h.state, &params)
        .await
        .unwrap()
        .data
        .unwrap();

    let names: Vec<_> = listing.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Smartphone X"]);
    assert_eq!(listing.filtered_products_count, 1);
    assert_eq!(listing.products_count, 4);
    assert_eq!(listing.min_price, 15);
    assert_eq!(listing.max_price, 600);
}

#[tokio::test]
async fn second_page_keeps_the_filtered_total() {
    let h = Harness::new().await;
    for i in 0..7 {
        h.add_product(&format!("Widget {i}"), 10 + i, 5).await;
    }

    let params = pairs(&[("keyword", "widget"), ("sort", "price"), ("page", "2")]);
    let resp = product_service::list_products(&h.state, &params).await.unwrap();
    let meta = resp.meta.clone().unwrap();
    let listing = resp.data.unwrap();

    assert_eq!(listing.result_per_page, 5);
    assert_eq!(listing.filtered_products_count, 7);
    let prices: Vec<_> = listing.products.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![15, 16]);
    assert_eq!(meta.page, Some(2));
    assert_eq!(meta.pages, Some(2));
}

#[tokio::test]
async fn public_listing_hides_inactive_but_admin_listing_does_not() {
    let h = Harness::new().await;
    seed_catalog(&h).await;

    let public = product_service::list_products(&h.state, &[]).await.unwrap().data.unwrap();
    assert!(public.products.iter().all(|p| p.status == ProductStatus::Active));
    assert_eq!(public.filtered_products_count, 3);

    let admin = product_service::admin_products(&h.state, &h.admin, &[])
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(admin.products.len(), 4);

    let err = product_service::admin_products(&h.state, &h.shopper, &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn description_filter_narrows_and_unknown_field_is_rejected() {
    let h = Harness::new().await;
    seed_catalog(&h).await;

    let none = product_service::list_products(&h.state, &pairs(&[("description", "no such text")]))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(none.filtered_products_count, 0);

    let chair = product_service::list_products(
        &h.state,
        &pairs(&[("description", "Office Chair description")]),
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(chair.filtered_products_count, 1);

    let err = product_service::list_products(&h.state, &pairs(&[("colour", "red")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn unparseable_filter_value_is_rejected() {
    let h = Harness::new().await;
    let err = product_service::list_products(&h.state, &pairs(&[("price[gte]", "abc")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn facets_list_distinct_values() {
    let h = Harness::new().await;
    seed_catalog(&h).await;

    let facets = product_service::product_filters(&h.state).await.unwrap().data.unwrap();
    assert_eq!(facets.tags, vec!["electronics", "furniture", "mobile"]);
    assert_eq!(facets.brands, vec!["Acme"]);
}

async fn temp_uploads(dir: &tempfile::TempDir, n: usize) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for i in 0..n {
        let path = dir.path().join(format!("upload-{i}.png"));
        tokio::fs::write(&path, b"png").await.unwrap();
        files.push(path);
    }
    files
}

fn full_input(stock: &str) -> ProductInput {
    ProductInput::from_fields(&pairs(&[
        ("name", "Standing Desk"),
        ("description", "Electric height adjustment"),
        ("price", "45000"),
        ("category", "Furniture"),
        ("brand", "LiftCo"),
        ("tags", "desk, office"),
        ("stock", stock),
        ("isFeatured", "true"),
    ]))
    .unwrap()
}

#[tokio::test]
async fn create_product_uploads_images_and_logs() {
    let h = Harness::new().await;
    let dir = tempfile::tempdir().unwrap();
    let uploads = temp_uploads(&dir, 2).await;

    let created = product_service::create_product(&h.state, &h.admin, full_input("7"), uploads.clone())
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(created.images.len(), 2);
    assert_eq!(created.tags, vec!["desk", "office"]);
    assert!(created.is_featured);
    assert_eq!(created.status, ProductStatus::Active);
    assert!(uploads.iter().all(|p| !p.exists()));

    let logs = h.state.admin_logs.list(&AdminLogFilter::default(), None).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_type, AdminLogType::CreateProduct);
}

#[tokio::test]
async fn create_without_images_is_rejected() {
    let h = Harness::new().await;
    let err = product_service::create_product(&h.state, &h.admin, full_input("1"), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn failed_upload_destroys_earlier_images() {
    let h = Harness::new().await;
    let images = MemoryImageStore::failing_after(1);
    let state = h.state.clone().with_images(Arc::new(images.clone()));
    let dir = tempfile::tempdir().unwrap();
    let uploads = temp_uploads(&dir, 3).await;

    let err = product_service::create_product(&state, &h.admin, full_input("1"), uploads.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(images.stored().await.is_empty());
    assert_eq!(images.destroyed().await.len(), 1);
    assert!(uploads.iter().all(|p| !p.exists()));
    assert_eq!(
        state
            .products
            .count(&storefront_api::query::ProductFilter::all())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn explicit_status_contradicting_stock_is_rejected() {
    let h = Harness::new().await;
    let lamp = h.add_product("Lamp", 100, 4).await;
    let input = ProductInput::from_fields(&pairs(&[("status", "OutOfStock")])).unwrap();

    let err = product_service::update_product(&h.state, &h.admin, lamp.id, input, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.reload(&lamp).await.status, ProductStatus::Active);
}

#[tokio::test]
async fn replacing_images_destroys_the_old_ones() {
    let h = Harness::new().await;
    let dir = tempfile::tempdir().unwrap();
    let created = product_service::create_product(
        &h.state,
        &h.admin,
        full_input("3"),
        temp_uploads(&dir, 1).await,
    )
    .await
    .unwrap()
    .data
    .unwrap();
    let old_id = created.images[0].storage_id.clone();

    let renamed = ProductInput::from_fields(&pairs(&[("name", "Sit-Stand Desk")])).unwrap();
    let updated = product_service::update_product(
        &h.state,
        &h.admin,
        created.id,
        renamed,
        temp_uploads(&dir, 1).await,
    )
    .await
    .unwrap()
    .data
    .unwrap();

    assert_eq!(updated.name, "Sit-Stand Desk");
    assert_ne!(updated.images[0].storage_id, old_id);
    assert_eq!(h.images.destroyed().await, vec![old_id]);

    let logs = h.state.admin_logs.list(&AdminLogFilter::default(), None).await.unwrap();
    assert!(logs.iter().any(|l| l.message == "Product images updated by admin."));
    assert!(logs.iter().any(|l| l.message == "Product fields updated: name by admin."));
}

#[tokio::test]
async fn delete_product_removes_images() {
    let h = Harness::new().await;
    let dir = tempfile::tempdir().unwrap();
    let created = product_service::create_product(
        &h.state,
        &h.admin,
        full_input("3"),
        temp_uploads(&dir, 2).await,
    )
    .await
    .unwrap()
    .data
    .unwrap();

    product_service::delete_product(&h.state, &h.admin, created.id).await.unwrap();
    assert!(h.images.stored().await.is_empty());
    assert!(matches!(
        product_service::get_product(&h.state, created.id).await,
        Err(AppError::NotFound(_))
    ));
}
