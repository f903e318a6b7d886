//! Filters, sorting, and pagination for repository queries
//!
//! Filters combine with AND semantics and a missing filter matches all.
//! Pagination applies after filtering and sorting; page size is clamped to a
//! hard ceiling so no query can drag the full store across the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use types::order::OrderEvent;
use types::partner::PartnerId;

/// Hard ceiling on page size.
pub const MAX_PAGE_SIZE: usize = 100;
/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Conjunctive filter over canonical orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub partner_id: Option<PartnerId>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    /// Inclusive lower bound on `transaction_time`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `transaction_time`.
    pub to: Option<DateTime<Utc>>,
    /// Inclusive lower bound on `gross_amount`.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound on `gross_amount`.
    pub max_amount: Option<Decimal>,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderEvent) -> bool {
        if let Some(partner) = self.partner_id {
            if order.partner_id != partner {
                return false;
            }
        }
        if let Some(customer) = &self.customer_id {
            if &order.customer_id != customer {
                return false;
            }
        }
        if let Some(product) = &self.product_id {
            if &order.product_id != product {
                return false;
            }
        }
        if let Some(from) = self.from {
            if order.transaction_time < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if order.transaction_time > to {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if order.gross_amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if order.gross_amount > max {
                return false;
            }
        }
        true
    }
}

/// 1-based page selection with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    /// Clamp out-of-range values instead of rejecting them: page floors at 1,
    /// page size stays within `1..=MAX_PAGE_SIZE`.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Sortable order fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    ProcessedAt,
    TransactionTime,
    GrossAmount,
    SequenceNumber,
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processedAt" => Ok(SortBy::ProcessedAt),
            "transactionTime" => Ok(SortBy::TransactionTime),
            "grossAmount" => Ok(SortBy::GrossAmount),
            "sequenceNumber" => Ok(SortBy::SequenceNumber),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

/// Sort policy; the default is newest-processed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub by: SortBy,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(by: SortBy, order: SortOrder) -> Self {
        Self { by, order }
    }
}

/// One page of query results with its paging envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// Slice an already filtered and sorted result set into one page.
pub fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len();
    let page_size = pagination.page_size();
    let total_pages = total.div_ceil(page_size);
    let page = pagination.page();

    let data: Vec<T> = items
        .into_iter()
        .skip(pagination.offset())
        .take(page_size)
        .collect();

    Page {
        data,
        total,
        page,
        page_size,
        total_pages,
        has_more: page < total_pages,
    }
}
