use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::StatsError;
use crate::services::stats_service::Dashboard;

use super::{ApiError, AppState};

const DEFAULT_WINDOW_DAYS: i64 = 30;
const MIN_WINDOW_DAYS: i64 = 7;
const MAX_WINDOW_DAYS: i64 = 365;

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Taken as a raw string: garbage falls back to the default window
    /// instead of rejecting the request.
    #[serde(default)]
    pub days: Option<String>,
}

/// Non-numeric, zero or negative input falls back to the default; anything
/// else clamps to the supported window.
fn sanitize_days(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|d| *d > 0)
        .map_or(DEFAULT_WINDOW_DAYS, |d| {
            d.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)
        })
}

/// GET /admin/stats/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let days = sanitize_days(query.days.as_deref());
    let dashboard = state.stats_service().dashboard(days).await?;
    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_garbage_fall_back_to_default() {
        assert_eq!(sanitize_days(None), 30);
        assert_eq!(sanitize_days(Some("")), 30);
        assert_eq!(sanitize_days(Some("abc")), 30);
        assert_eq!(sanitize_days(Some("12.5")), 30);
    }

    #[test]
    fn zero_and_negative_fall_back_to_default() {
        assert_eq!(sanitize_days(Some("0")), 30);
        assert_eq!(sanitize_days(Some("-5")), 30);
    }

    #[test]
    fn small_and_large_values_clamp() {
        assert_eq!(sanitize_days(Some("1")), 7);
        assert_eq!(sanitize_days(Some("7")), 7);
        assert_eq!(sanitize_days(Some("90")), 90);
        assert_eq!(sanitize_days(Some("365")), 365);
        assert_eq!(sanitize_days(Some("9999")), 365);
    }
}
