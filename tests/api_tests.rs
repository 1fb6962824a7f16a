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
    // A single connection keeps the in-memory database shared.
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
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    body["accessToken"].as_str().unwrap().to_string()
}

async fn create_product(
    app: &Router,
    token: &str,
    name: &str,
    slug: &str,
    price: &str,
    active: bool,
) -> i32 {
    let (status, body) = request(
        app,
        "POST",
        "/admin/products",
        Some(token),
        Some(serde_json::json!({
            "name": name,
            "slug": slug,
            "description": format!("{name} description"),
            "price": price,
            "stock": 10,
            "isActive": active,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
    i32::try_from(body["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn admin_routes_require_auth() {
    let app = spawn_app().await;

    let (status, _) = request(&app, "GET", "/admin/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/admin/orders", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_are_forbidden_on_admin_routes() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({ "email": "client@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["accessToken"].as_str().unwrap();
    assert_eq!(body["user"]["role"], "CUSTOMER");

    let (status, _) = request(&app, "GET", "/admin/stats/dashboard", Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_and_me_round_trip() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (status, body) = request(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn bad_credentials_are_unauthorized_with_constant_shape() {
    let app = spawn_app().await;

    let (status_unknown, body_unknown) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "email": "ghost@example.com", "password": "whatever-pass" })),
    )
    .await;
    let (status_wrong, body_wrong) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "email": ADMIN_EMAIL, "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(status_wrong, StatusCode::UNAUTHORIZED);
    // No distinction between unknown user and wrong password.
    assert_eq!(body_unknown["message"], body_wrong["message"]);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;

    let payload = serde_json::json!({ "email": "Dup@Example.com", "password": "secret-pass" });
    let (status, _) = request(&app, "POST", "/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same address, different case: emails are stored lowercase.
    let again = serde_json::json!({ "email": "dup@example.com", "password": "other-pass-9" });
    let (status, _) = request(&app, "POST", "/auth/register", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn refresh_tokens_rotate_and_cannot_be_replayed() {
    let app = spawn_app().await;

    let (_, login) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
    )
    .await;
    let refresh_token = login["refreshToken"].as_str().unwrap().to_string();

    let (status, refreshed) = request(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(serde_json::json!({ "refreshToken": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["accessToken"].is_string());
    assert_ne!(refreshed["refreshToken"], login["refreshToken"]);

    // The consumed token is gone.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(serde_json::json!({ "refreshToken": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_listing_hides_inactive_and_serializes_price_as_string() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    create_product(&app, &token, "Profil alu 40x40", "profil-alu-40x40", "12.50", true).await;
    create_product(&app, &token, "Plat acier", "plat-acier", "7.90", true).await;
    create_product(&app, &token, "Brouillon", "brouillon", "1.00", false).await;

    let (status, body) = request(&app, "GET", "/products?limit=50", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"Brouillon"));

    // Price is an exact decimal string, never a JSON number.
    let first = &body["data"][0];
    assert!(first["price"].is_string());

    // Admin mode sees the inactive row too.
    let (_, body) = request(&app, "GET", "/admin/products?limit=50", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn search_matches_name_and_description_case_insensitively() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    create_product(&app, &token, "Profil ALU 40x40", "profil-alu", "12.50", true).await;
    create_product(&app, &token, "Plat acier", "plat-acier", "7.90", true).await;

    let (_, body) = request(&app, "GET", "/products?search=alu", None, None).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["slug"], "profil-alu");

    // Blank search is ignored entirely.
    let (_, body) = request(&app, "GET", "/products?search=%20%20", None, None).await;
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn pagination_meta_reports_total_pages() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    for i in 0..5 {
        create_product(&app, &token, &format!("Produit {i}"), &format!("produit-{i}"), "5.00", true)
            .await;
    }

    let (_, body) = request(&app, "GET", "/products?page=1&limit=2", None, None).await;
    assert_eq!(body["meta"]["total"], 5);
    assert_eq!(body["meta"]["limit"], 2);
    assert_eq!(body["meta"]["totalPages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, last) = request(&app, "GET", "/products?page=3&limit=2", None, None).await;
    assert_eq!(last["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn slug_lookup_requires_active_on_public_path() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    create_product(&app, &token, "Visible", "visible", "3.00", true).await;
    create_product(&app, &token, "Masque", "masque", "3.00", false).await;

    let (status, body) = request(&app, "GET", "/products/visible", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "visible");

    let (status, _) = request(&app, "GET", "/products/masque", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Admin by-slug still reaches the inactive row.
    let (status, _) = request(
        &app,
        "GET",
        "/admin/products/by-slug/masque",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn soft_deleted_products_vanish_everywhere() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let id = create_product(&app, &token, "Ephemere", "ephemere", "9.99", true).await;

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/products/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "GET", "/products/ephemere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = request(&app, "GET", "/admin/products?limit=50", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 0);

    // Deleting again is a 404: the row is already invisible.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/products/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn related_products_prefer_the_same_category() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (status, category) = request(
        &app,
        "POST",
        "/admin/categories",
        Some(&token),
        Some(serde_json::json!({ "name": "Profilés", "slug": "profiles" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_i64().unwrap();

    for (name, slug) in [("A", "rel-a"), ("B", "rel-b"), ("C", "rel-c")] {
        let (status, _) = request(
            &app,
            "POST",
            "/admin/products",
            Some(&token),
            Some(serde_json::json!({
                "name": name,
                "slug": slug,
                "description": "d",
                "price": "1.00",
                "categoryId": category_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    create_product(&app, &token, "Autre", "sans-categorie", "1.00", true).await;

    let (status, body) = request(&app, "GET", "/products/rel-a/related", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert!(!slugs.contains(&"rel-a"));
    assert!(slugs.contains(&"rel-b") && slugs.contains(&"rel-c"));
    assert!(!slugs.contains(&"sans-categorie"));
}

#[tokio::test]
async fn category_tree_nests_children_in_sort_order() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (_, root) = request(
        &app,
        "POST",
        "/admin/categories",
        Some(&token),
        Some(serde_json::json!({ "name": "Aluminium", "slug": "aluminium", "sortOrder": 1 })),
    )
    .await;
    let root_id = root["id"].as_i64().unwrap();
    for (name, slug, sort) in [("Tubes", "tubes", 2), ("Plats", "plats", 1)] {
        request(
            &app,
            "POST",
            "/admin/categories",
            Some(&token),
            Some(serde_json::json!({
                "name": name, "slug": slug, "parentId": root_id, "sortOrder": sort,
            })),
        )
        .await;
    }

    let (status, tree) = request(&app, "GET", "/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    let children = roots[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["slug"], "plats");
    assert_eq!(children[1]["slug"], "tubes");

    let (status, child) = request(&app, "GET", "/categories/plats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(child["parent"]["slug"], "aluminium");
}

#[tokio::test]
async fn order_creation_snapshots_prices() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let product_id = create_product(&app, &token, "Profil", "profil", "100.00", true).await;

    let (status, order) = request(
        &app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "customerEmail": "client@example.com",
            "customerName": "Client",
            "items": [ { "productId": product_id, "quantity": 2 } ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "PENDING");
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["unitPrice"], "100.00");
    assert_eq!(items[0]["quantity"], 2);
    let order_id = order["id"].as_i64().unwrap();

    // A later price change must not touch the stored snapshot.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/products/{product_id}"),
        Some(&token),
        Some(serde_json::json!({ "price": "150.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, reloaded) = request(
        &app,
        "GET",
        &format!("/admin/orders/{order_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reloaded["items"][0]["unitPrice"], "100.00");
}

#[tokio::test]
async fn order_creation_rejects_bad_input() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;
    let product_id = create_product(&app, &token, "Profil", "profil", "10.00", true).await;

    // Empty items.
    let (status, body) = request(
        &app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "customerEmail": "client@example.com",
            "customerName": "Client",
            "items": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_array());

    // Unknown product id.
    let (status, _) = request(
        &app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "customerEmail": "client@example.com",
            "customerName": "Client",
            "items": [ { "productId": 999_999, "quantity": 1 } ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A soft-deleted product no longer resolves.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/products/{product_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(
        &app,
        "POST",
        "/orders",
        None,
        Some(serde_json::json!({
            "customerEmail": "client@example.com",
            "customerName": "Client",
            "items": [ { "productId": product_id, "quantity": 1 } ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was persisted along the way.
    let (_, orders) = request(&app, "GET", "/admin/orders", Some(&token), None).await;
    assert_eq!(orders["meta"]["total"], 0);
}

#[tokio::test]
async fn order_listing_filters_by_status_and_updates_are_unrestricted() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;
    let product_id = create_product(&app, &token, "Profil", "profil", "10.00", true).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let (_, order) = request(
            &app,
            "POST",
            "/orders",
            None,
            Some(serde_json::json!({
                "customerEmail": format!("c{i}@example.com"),
                "customerName": "Client",
                "items": [ { "productId": product_id, "quantity": 1 } ],
            })),
        )
        .await;
        ids.push(order["id"].as_i64().unwrap());
    }

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/admin/orders/{}/status", ids[0]),
        Some(&token),
        Some(serde_json::json!({ "status": "COMPLETED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    let (_, completed) = request(
        &app,
        "GET",
        "/admin/orders?status=COMPLETED",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(completed["meta"]["total"], 1);

    let (_, pending) = request(&app, "GET", "/admin/orders?status=PENDING", Some(&token), None).await;
    assert_eq!(pending["meta"]["total"], 2);

    // No transition guard: COMPLETED goes straight back to PENDING.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/admin/orders/{}/status", ids[0]),
        Some(&token),
        Some(serde_json::json!({ "status": "PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    let (status, _) = request(
        &app,
        "PATCH",
        "/admin/orders/999999/status",
        Some(&token),
        Some(serde_json::json!({ "status": "CANCELED" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
