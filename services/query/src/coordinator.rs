//! Read-only coordinator over the repositories

use crate::error::QueryError;
use crate::models::{
    ErrorEventResponse, ErrorStatisticsResponse, HealthResponse, OrderResponse, PageResponse,
    StatisticsResponse,
};
use crate::params::{
    parse_error_filter, parse_order_filter, parse_pagination, parse_partner, parse_sort, Params,
};
use repository::{ErrorStore, OrderFilter, OrderStore};
use std::sync::Arc;
use tracing::debug;
use types::error_event::ErrorEvent;
use types::ids::{ErrorEventId, OrderEventId};
use types::order::OrderEvent;

/// Thin facade the transport calls for every read.
pub struct QueryCoordinator {
    orders: Arc<OrderStore>,
    errors: Arc<ErrorStore>,
}

impl QueryCoordinator {
    pub fn new(orders: Arc<OrderStore>, errors: Arc<ErrorStore>) -> Self {
        Self { orders, errors }
    }

    /// `GET /api/orders`
    pub fn list_orders(&self, params: &Params) -> Result<PageResponse<OrderEvent>, QueryError> {
        let filter = parse_order_filter(params)?;
        let pagination = parse_pagination(params);
        let sort = parse_sort(params);
        debug!(?filter, "listing orders");
        Ok(PageResponse::success(
            self.orders.find_many(&filter, pagination, sort),
        ))
    }

    /// `GET /api/orders/:id`
    pub fn order_by_id(&self, id: &str) -> Result<OrderResponse, QueryError> {
        let parsed: OrderEventId = id
            .parse()
            .map_err(|_| QueryError::OrderNotFound(id.to_string()))?;
        self.orders
            .find_by_id(&parsed)
            .map(|order| OrderResponse {
                status: "success",
                order,
            })
            .ok_or_else(|| QueryError::OrderNotFound(id.to_string()))
    }

    /// `GET /api/orders/external/:partner/:extId`
    pub fn order_by_external_id(
        &self,
        partner: &str,
        external_id: &str,
    ) -> Result<OrderResponse, QueryError> {
        let partner = parse_partner(partner)?;
        self.orders
            .find_by_external_id(external_id, partner)
            .map(|order| OrderResponse {
                status: "success",
                order,
            })
            .ok_or_else(|| QueryError::OrderNotFound(external_id.to_string()))
    }

    /// `GET /api/orders/by-partner/:partner`
    pub fn orders_by_partner(
        &self,
        partner: &str,
        params: &Params,
    ) -> Result<PageResponse<OrderEvent>, QueryError> {
        let filter = OrderFilter {
            partner_id: Some(parse_partner(partner)?),
            ..OrderFilter::default()
        };
        Ok(PageResponse::success(self.orders.find_many(
            &filter,
            parse_pagination(params),
            parse_sort(params),
        )))
    }

    /// `GET /api/orders/by-customer/:customer`
    pub fn orders_by_customer(&self, customer: &str, params: &Params) -> PageResponse<OrderEvent> {
        let filter = OrderFilter {
            customer_id: Some(customer.to_string()),
            ..OrderFilter::default()
        };
        PageResponse::success(self.orders.find_many(
            &filter,
            parse_pagination(params),
            parse_sort(params),
        ))
    }

    /// `GET /api/orders/stats`
    pub fn order_statistics(&self, params: &Params) -> Result<StatisticsResponse, QueryError> {
        let filter = parse_order_filter(params)?;
        Ok(StatisticsResponse {
            status: "success",
            statistics: self.orders.statistics(&filter),
        })
    }

    /// `GET /api/errors`
    pub fn list_errors(&self, params: &Params) -> Result<PageResponse<ErrorEvent>, QueryError> {
        let filter = parse_error_filter(params)?;
        Ok(PageResponse::success(
            self.errors.find_many(&filter, parse_pagination(params)),
        ))
    }

    /// `GET /api/errors/:id`
    pub fn error_by_id(&self, id: &str) -> Result<ErrorEventResponse, QueryError> {
        let parsed: ErrorEventId = id
            .parse()
            .map_err(|_| QueryError::ErrorEventNotFound(id.to_string()))?;
        self.errors
            .find_by_id(&parsed)
            .map(|error| ErrorEventResponse {
                status: "success",
                error,
            })
            .ok_or_else(|| QueryError::ErrorEventNotFound(id.to_string()))
    }

    /// `GET /api/errors/stats`
    pub fn error_statistics(&self) -> ErrorStatisticsResponse {
        ErrorStatisticsResponse {
            status: "success",
            statistics: self.errors.statistics(),
        }
    }

    /// `GET /health`
    pub fn health(&self) -> HealthResponse {
        HealthResponse::healthy()
    }
}
