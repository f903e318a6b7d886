//! Query-parameter parsing and normalization
//!
//! Parameters arrive as the string map the transport extracted from the URL.
//! Unparseable paging and sort values fall back to defaults; filter values
//! that would silently change the result set (dates, amounts, partner and
//! code names) are rejected instead.

use crate::error::QueryError;
use repository::{ErrorFilter, OrderFilter, Pagination, Sort, SortBy, SortOrder};
use rust_decimal::Decimal;
use std::collections::HashMap;
use types::errors::ErrorCode;
use types::partner::PartnerId;
use types::time;

pub type Params = HashMap<String, String>;

/// Partner from a path or query value, canonical or short form.
pub fn parse_partner(value: &str) -> Result<PartnerId, QueryError> {
    value
        .parse::<PartnerId>()
        .map_err(|e| QueryError::UnknownPartner(e.0))
}

/// `page` / `pageSize`, clamped; anything unparseable keeps its default.
pub fn parse_pagination(params: &Params) -> Pagination {
    let page = params
        .get("page")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1);
    let page_size = params
        .get("pageSize")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(repository::query::DEFAULT_PAGE_SIZE);
    Pagination::new(page, page_size)
}

/// `sortBy` / `sortOrder`; unknown values keep the default policy.
pub fn parse_sort(params: &Params) -> Sort {
    let by = params
        .get("sortBy")
        .and_then(|v| v.parse::<SortBy>().ok())
        .unwrap_or_default();
    let order = params
        .get("sortOrder")
        .and_then(|v| v.parse::<SortOrder>().ok())
        .unwrap_or_default();
    Sort::new(by, order)
}

/// Order filter from `partnerId`, `customerId`, `productId`, `fromDate`,
/// `toDate`, `minAmount`, `maxAmount`.
pub fn parse_order_filter(params: &Params) -> Result<OrderFilter, QueryError> {
    let mut filter = OrderFilter::default();

    if let Some(partner) = params.get("partnerId") {
        filter.partner_id = Some(parse_partner(partner)?);
    }
    filter.customer_id = params.get("customerId").cloned();
    filter.product_id = params.get("productId").cloned();

    if let Some(raw) = params.get("fromDate") {
        filter.from = Some(parse_date("fromDate", raw)?);
    }
    if let Some(raw) = params.get("toDate") {
        filter.to = Some(parse_date("toDate", raw)?);
    }
    if let Some(raw) = params.get("minAmount") {
        filter.min_amount = Some(parse_amount("minAmount", raw)?);
    }
    if let Some(raw) = params.get("maxAmount") {
        filter.max_amount = Some(parse_amount("maxAmount", raw)?);
    }

    Ok(filter)
}

/// Error filter from `partnerId`, `errorCode`, `fromDate`, `toDate`.
pub fn parse_error_filter(params: &Params) -> Result<ErrorFilter, QueryError> {
    let mut filter = ErrorFilter::default();

    if let Some(partner) = params.get("partnerId") {
        filter.partner_id = Some(parse_partner(partner)?);
    }
    if let Some(code) = params.get("errorCode") {
        filter.error_code = Some(
            code.parse::<ErrorCode>()
                .map_err(|_| QueryError::invalid("errorCode", format!("unknown code: {code}")))?,
        );
    }
    if let Some(raw) = params.get("fromDate") {
        filter.from = Some(parse_date("fromDate", raw)?);
    }
    if let Some(raw) = params.get("toDate") {
        filter.to = Some(parse_date("toDate", raw)?);
    }

    Ok(filter)
}

fn parse_date(param: &'static str, raw: &str) -> Result<chrono::DateTime<chrono::Utc>, QueryError> {
    time::parse_instant(raw)
        .ok_or_else(|| QueryError::invalid(param, format!("not an ISO-8601 instant: {raw}")))
}

fn parse_amount(param: &'static str, raw: &str) -> Result<Decimal, QueryError> {
    use std::str::FromStr;
    Decimal::from_str(raw).map_err(|_| QueryError::invalid(param, format!("not a number: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_partner_both_forms() {
        assert_eq!(parse_partner("PARTNER_A").unwrap(), PartnerId::PartnerA);
        assert_eq!(parse_partner("b").unwrap(), PartnerId::PartnerB);
        assert!(matches!(
            parse_partner("PARTNER_C"),
            Err(QueryError::UnknownPartner(_))
        ));
    }

    #[test]
    fn test_pagination_defaults_and_ceiling() {
        let p = parse_pagination(&params(&[]));
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), 20);

        let p = parse_pagination(&params(&[("page", "3"), ("pageSize", "500")]));
        assert_eq!(p.page(), 3);
        assert_eq!(p.page_size(), 100, "page size is clamped");

        let p = parse_pagination(&params(&[("page", "zero"), ("pageSize", "-4")]));
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), 20);
    }

    #[test]
    fn test_sort_defaults_on_unknown_values() {
        let sort = parse_sort(&params(&[("sortBy", "grossAmount"), ("sortOrder", "asc")]));
        assert_eq!(sort.by, SortBy::GrossAmount);
        assert_eq!(sort.order, SortOrder::Asc);

        let sort = parse_sort(&params(&[("sortBy", "color"), ("sortOrder", "sideways")]));
        assert_eq!(sort, Sort::default());
    }

    #[test]
    fn test_order_filter_parsing() {
        let filter = parse_order_filter(&params(&[
            ("partnerId", "A"),
            ("customerId", "C1"),
            ("fromDate", "2024-01-01T00:00:00Z"),
            ("minAmount", "50.5"),
        ]))
        .unwrap();

        assert_eq!(filter.partner_id, Some(PartnerId::PartnerA));
        assert_eq!(filter.customer_id.as_deref(), Some("C1"));
        assert!(filter.from.is_some());
        assert_eq!(filter.min_amount.unwrap().to_string(), "50.5");
        assert!(filter.to.is_none());
    }

    #[test]
    fn test_order_filter_rejects_bad_values() {
        let err = parse_order_filter(&params(&[("fromDate", "yesterday")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");

        let err = parse_order_filter(&params(&[("maxAmount", "lots")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");

        let err = parse_order_filter(&params(&[("partnerId", "PARTNER_Z")])).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_PARTNER");
    }

    #[test]
    fn test_error_filter_parsing() {
        let filter = parse_error_filter(&params(&[
            ("partnerId", "PARTNER_B"),
            ("errorCode", "INVALID_TIMESTAMP"),
        ]))
        .unwrap();
        assert_eq!(filter.partner_id, Some(PartnerId::PartnerB));
        assert_eq!(filter.error_code, Some(ErrorCode::InvalidTimestamp));

        let err = parse_error_filter(&params(&[("errorCode", "BAD_CODE")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }
}
