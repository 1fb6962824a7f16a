use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use comptoir::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Seeded by the admin migration (must match m20250302_seed_admin.rs)
const ADMIN_EMAIL: &str = "admin@comptoir.local";
const ADMIN_PASSWORD: &str = "ChangeMeInProduction!";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = comptoir::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    comptoir::api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = if let Some(body) = body {
        builder
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["accessToken"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, token: &str, slug: &str, price: &str, stock: i64) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/admin/products",
        Some(token),
        Some(serde_json::json!({
            "name": format!("Produit {slug}"),
            "slug": slug,
            "description": "d",
            "price": price,
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn place_order(app: &Router, email: &str, product_id: i64, quantity: i64) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "customerEmail": email,
            "customerName": "Client",
            "items": [ { "productId": product_id, "quantity": quantity } ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn set_status(app: &Router, token: &str, order_id: i64, status_str: &str) {
    let (status, _) = request(
        app,
        "PATCH",
        &format!("/admin/orders/{order_id}/status"),
        Some(token),
        Some(serde_json::json!({ "status": status_str })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn dashboard(app: &Router, token: &str, query: &str) -> serde_json::Value {
    let (status, body) = request(
        app,
        "GET",
        &format!("/admin/stats/dashboard{query}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn empty_dashboard_has_a_full_zeroed_series() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let body = dashboard(&app, &token, "").await;

    assert_eq!(body["kpis"]["totalRevenue"], "0.00");
    assert_eq!(body["kpis"]["totalOrders"], 0);
    assert_eq!(body["kpis"]["activeProducts"], 0);
    assert_eq!(body["kpis"]["newCustomers"], 0);
    assert_eq!(body["kpis"]["conversionRate"], "0.00");
    assert_eq!(body["kpis"]["averageOrderValue"], "0.00");

    let series = body["salesEvolution"].as_array().unwrap();
    assert_eq!(series.len(), 30);
    assert!(
        series
            .iter()
            .all(|p| p["count"] == 0 && p["total"] == "0.00")
    );

    // Dates come out sorted chronologically.
    let dates: Vec<&str> = series.iter().map(|p| p["date"].as_str().unwrap()).collect();
    let mut sorted = dates.clone();
    sorted.sort_unstable();
    assert_eq!(dates, sorted);

    assert_eq!(body["topProducts"].as_array().unwrap().len(), 0);
    assert_eq!(body["alerts"]["pendingOrders"], 0);
    assert_eq!(body["alerts"]["lowStockCount"], 0);
}

#[tokio::test]
async fn days_parameter_clamps_and_falls_back() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let cases = [
        ("", 30),
        ("?days=abc", 30),
        ("?days=0", 30),
        ("?days=-5", 30),
        ("?days=1", 7),
        ("?days=45", 45),
        ("?days=9999", 365),
    ];
    for (query, expected) in cases {
        let body = dashboard(&app, &token, query).await;
        assert_eq!(
            body["salesEvolution"].as_array().unwrap().len(),
            expected,
            "query {query:?}"
        );
    }
}

#[tokio::test]
async fn revenue_sums_at_full_precision_and_rounds_once() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // Three completed one-item orders: 10.00 + 20.005 + 5.00 = 35.005,
    // which must surface as 35.01 (not 35.00 from per-line rounding).
    let p1 = create_product(&app, &token, "p1", "10.00", 50).await;
    let p2 = create_product(&app, &token, "p2", "20.005", 50).await;
    let p3 = create_product(&app, &token, "p3", "5.00", 50).await;

    for (i, product) in [p1, p2, p3].into_iter().enumerate() {
        let order = place_order(&app, &format!("c{i}@example.com"), product, 1).await;
        set_status(&app, &token, order, "COMPLETED").await;
    }

    let body = dashboard(&app, &token, "").await;
    assert_eq!(body["kpis"]["totalRevenue"], "35.01");
    assert_eq!(body["kpis"]["totalOrders"], 3);
    assert_eq!(body["kpis"]["conversionRate"], "100.00");
    // 35.005 / 3 = 11.668..., rounded once at presentation.
    assert_eq!(body["kpis"]["averageOrderValue"], "11.67");
    assert_eq!(body["kpis"]["newCustomers"], 3);
}

#[tokio::test]
async fn kpi_revenue_only_counts_completed_orders() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let product = create_product(&app, &token, "p1", "40.00", 50).await;

    let completed = place_order(&app, "a@example.com", product, 1).await;
    set_status(&app, &token, completed, "COMPLETED").await;
    // This one stays PENDING: in the window, invisible to the revenue KPI.
    place_order(&app, "b@example.com", product, 5).await;

    let body = dashboard(&app, &token, "").await;
    assert_eq!(body["kpis"]["totalRevenue"], "40.00");
    assert_eq!(body["kpis"]["totalOrders"], 2);
    assert_eq!(body["kpis"]["newCustomers"], 2);
    assert_eq!(body["kpis"]["conversionRate"], "50.00");
    assert_eq!(body["alerts"]["pendingOrders"], 1);
}

#[tokio::test]
async fn top_products_rank_completed_revenue_only() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let cheap = create_product(&app, &token, "cheap", "1.00", 50).await;
    let expensive = create_product(&app, &token, "expensive", "100.00", 50).await;
    let ignored = create_product(&app, &token, "ignored", "500.00", 50).await;

    let o1 = place_order(&app, "a@example.com", cheap, 10).await;
    set_status(&app, &token, o1, "COMPLETED").await;
    let o2 = place_order(&app, "b@example.com", expensive, 1).await;
    set_status(&app, &token, o2, "COMPLETED").await;
    // Canceled orders contribute nothing to the ranking.
    let o3 = place_order(&app, "c@example.com", ignored, 3).await;
    set_status(&app, &token, o3, "CANCELED").await;

    let body = dashboard(&app, &token, "").await;
    let top = body["topProducts"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["revenue"], "100.00");
    assert_eq!(top[1]["revenue"], "10.00");
    assert_eq!(top[1]["quantity"], 10);
    assert!(top.iter().all(|p| p["name"] != "Produit ignored"));
}

#[tokio::test]
async fn low_stock_and_recent_orders_surface_in_the_payload() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    create_product(&app, &token, "rare", "9.00", 2).await;
    create_product(&app, &token, "plenty", "9.00", 100).await;
    let product = create_product(&app, &token, "ordered", "25.00", 3).await;

    place_order(&app, "client@example.com", product, 2).await;

    let body = dashboard(&app, &token, "").await;

    let low = body["lowStockProducts"].as_array().unwrap();
    let low_slugs: Vec<&str> = low.iter().map(|p| p["slug"].as_str().unwrap()).collect();
    assert!(low_slugs.contains(&"rare"));
    assert!(low_slugs.contains(&"ordered"));
    assert!(!low_slugs.contains(&"plenty"));
    assert_eq!(body["alerts"]["lowStockCount"], low.len());

    let recent = body["recentOrders"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["itemCount"], 1);
    assert_eq!(recent[0]["total"], "50.00");
    assert_eq!(recent[0]["customerEmail"], "client@example.com");
    assert_eq!(recent[0]["status"], "PENDING");
}

#[tokio::test]
async fn soft_deleted_orders_would_be_excluded_from_counts() {
    // No API path soft-deletes orders; the invariant is exercised through
    // the product side instead: deleting a product leaves past orders (and
    // their revenue) untouched.
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let product = create_product(&app, &token, "gone-soon", "15.00", 5).await;
    let order = place_order(&app, "a@example.com", product, 1).await;
    set_status(&app, &token, order, "COMPLETED").await;

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/products/{product}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = dashboard(&app, &token, "").await;
    assert_eq!(body["kpis"]["totalRevenue"], "15.00");
    assert_eq!(body["kpis"]["totalOrders"], 1);
    // The deleted product no longer counts as an active product.
    assert_eq!(body["kpis"]["activeProducts"], 0);
}
