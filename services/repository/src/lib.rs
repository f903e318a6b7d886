//! Repositories for canonical orders and rejection records
//!
//! Append-heavy write path, read-mostly query surface. Full state lives in
//! memory guarded by a single lock per store; the embedded deployment
//! snapshots each store to a JSON file through a debounced flusher. Batch
//! saves are atomic with respect to readers: a query sees pre- or post-batch
//! state, never the middle.

pub mod errors_store;
pub mod orders;
pub mod query;

pub use errors_store::{ErrorFilter, ErrorStatistics, ErrorStore};
pub use orders::{OrderStatistics, OrderStore};
pub use query::{paginate, OrderFilter, Page, Pagination, Sort, SortBy, SortOrder};
