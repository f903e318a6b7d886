//! Response envelopes for the external interface

use chrono::{DateTime, Utc};
use repository::{ErrorStatistics, OrderStatistics, Page};
use serde::Serialize;
use types::error_event::ErrorEvent;
use types::order::OrderEvent;
use types::time;

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub page: Page<T>,
}

impl<T> PageResponse<T> {
    pub fn success(page: Page<T>) -> Self {
        Self {
            status: "success",
            page,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub status: &'static str,
    pub order: OrderEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEventResponse {
    pub status: &'static str,
    pub error: ErrorEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    pub status: &'static str,
    pub statistics: OrderStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorStatisticsResponse {
    pub status: &'static str,
    pub statistics: ErrorStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(with = "time::iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            timestamp: time::now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::{paginate, Pagination};

    #[test]
    fn test_page_response_flattens_envelope() {
        let response = PageResponse::success(paginate(vec![1, 2, 3], Pagination::new(1, 2)));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["total"], 3);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasMore"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_health_shape() {
        let json = serde_json::to_value(HealthResponse::healthy()).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
