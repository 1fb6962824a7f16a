use axum::{
    Json, Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin_categories;
mod admin_orders;
mod admin_products;
mod admin_stats;
pub mod auth;
mod categories;
mod error;
mod observability;
mod orders;
mod products;

pub use error::ApiError;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn catalog_service(&self) -> &Arc<dyn crate::services::CatalogService> {
        &self.shared.catalog_service
    }

    #[must_use]
    pub fn order_service(&self) -> &Arc<dyn crate::services::OrderService> {
        &self.shared.order_service
    }

    #[must_use]
    pub fn stats_service(&self) -> &Arc<dyn crate::services::StatsService> {
        &self.shared.stats_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let admin_routes = Router::new()
        .route(
            "/admin/products",
            get(admin_products::list_products).post(admin_products::create_product),
        )
        .route(
            "/admin/products/by-slug/{slug}",
            get(admin_products::get_product_by_slug),
        )
        .route("/admin/products/{id}", get(admin_products::get_product))
        .route("/admin/products/{id}", put(admin_products::update_product))
        .route(
            "/admin/products/{id}",
            delete(admin_products::delete_product),
        )
        .route(
            "/admin/categories",
            get(admin_categories::category_tree).post(admin_categories::create_category),
        )
        .route(
            "/admin/categories/by-slug/{slug}",
            get(admin_categories::get_category),
        )
        .route(
            "/admin/categories/{id}",
            put(admin_categories::update_category),
        )
        .route(
            "/admin/categories/{id}",
            delete(admin_categories::delete_category),
        )
        .route("/admin/orders", get(admin_orders::list_orders))
        .route("/admin/orders/{id}", get(admin_orders::get_order))
        .route(
            "/admin/orders/{id}/status",
            patch(admin_orders::update_status),
        )
        .route("/admin/stats/dashboard", get(admin_stats::dashboard))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_admin));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/health", get(health))
        .route("/products", get(products::list_products))
        .route("/products/{slug}", get(products::get_product))
        .route(
            "/products/{slug}/related",
            get(products::related_products),
        )
        .route("/categories", get(categories::category_tree))
        .route("/categories/{slug}", get(categories::get_category))
        .route("/orders", post(orders::create_order))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

/// GET /health. Liveness probe, no auth required.
async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database unreachable: {e}")))?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "uptime": state.start_time.elapsed().as_secs(),
    })))
}
