mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::Harness;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use storefront_api::routes;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn unknown_route_gets_json_404() {
    let h = Harness::new().await;
    let app = routes::app(h.state.clone());

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = send(&app, get("/no/such/thing", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/no/such/thing");
}

#[tokio::test]
async fn catalog_query_string_is_parsed_in_order() {
    let h = Harness::new().await;
    h.add_product("Cheap", 50, 5).await;
    h.add_product("Mid", 150, 5).await;
    h.add_product("Dear", 900, 5).await;
    let app = routes::app(h.state.clone());

    let (status, body) = send(&app, get("/api/products?price%5Bgte%5D=100&sort=-price", None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Dear", "Mid"]);
    assert_eq!(body["data"]["filteredProductsCount"], 2);
    assert_eq!(body["data"]["productsCount"], 3);

    let (status, body) = send(&app, get("/api/products?price%5Bgte%5D=abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["kind"], "validation");
}

#[tokio::test]
async fn admin_routes_require_an_admin_token() {
    let h = Harness::new().await;
    let app = routes::app(h.state.clone());

    let (status, body) = send(&app, get("/api/admin/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["kind"], "unauthorized");

    let (status, _) = send(&app, get("/api/admin/orders", Some(&h.token(&h.shopper)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, get("/api/admin/orders", Some(&h.token(&h.admin)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalAmount"], 0);
}

#[tokio::test]
async fn order_placed_and_shipped_over_http() {
    let h = Harness::new().await;
    let lamp = h.add_product("Lamp", 400, 2).await;
    let app = routes::app(h.state.clone());

    let payload = json!({
        "shippingInfo": {
            "address": "1 Main St", "city": "Springfield", "state": "IL",
            "country": "US", "pinCode": "62701", "phoneNo": "5550100"
        },
        "orderItems": [{ "product": lamp.id, "quantity": 2 }],
        "paymentInfo": { "id": "pi_1", "status": "succeeded" },
        "taxPrice": 40,
        "shippingPrice": 10
    });
    let (status, body) = send(&app, json_request("POST", "/api/orders", &h.token(&h.shopper), payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalPrice"], 850);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/orders/{order_id}"),
            &h.token(&h.admin),
            json!({ "status": "Shipped" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderStatus"], "Shipped");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/orders/{order_id}"),
            &h.token(&h.admin),
            json!({ "status": "Processing" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["kind"], "conflict");

    let lamp = h.reload(&lamp).await;
    assert_eq!(lamp.stock, 0);
    assert_eq!(h.mail.sent().await.len(), 1);

    let logs = h
        .state
        .user_logs
        .list(&storefront_api::audit::UserLogFilter::for_user(h.shopper.user_id), None)
        .await
        .unwrap();
    assert_eq!(logs[0].ip_address, "198.51.100.4");
}

#[tokio::test]
async fn product_form_with_image_creates_a_product() {
    let h = Harness::new().await;
    let app = routes::app(h.state.clone());
    let boundary = "X-STOREFRONT-BOUNDARY";

    let mut body = String::new();
    for (name, value) in [
        ("name", "Kettle"),
        ("description", "Boils water"),
        ("price", "3500"),
        ("category", "Kitchen"),
        ("brand", "Steam"),
        ("stock", "0"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"kettle.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/products")
        .header(header::AUTHORIZATION, format!("Bearer {}", h.token(&h.admin)))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Kettle");
    assert_eq!(body["data"]["status"], "OutOfStock");
    assert_eq!(body["data"]["images"].as_array().unwrap().len(), 1);
    assert_eq!(h.images.stored().await.len(), 1);
}
