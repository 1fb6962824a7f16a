pub mod catalog_service;
pub use catalog_service::{CatalogError, CatalogService};

pub mod catalog_service_impl;
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod order_service;
pub use order_service::{OrderError, OrderService, OrderStatus};

pub mod order_service_impl;
pub use order_service_impl::SeaOrmOrderService;

pub mod stats_service;
pub use stats_service::{StatsError, StatsService};

pub mod stats_service_impl;
pub use stats_service_impl::SeaOrmStatsService;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Role};

pub mod auth_service_impl;
pub use auth_service_impl::JwtAuthService;
