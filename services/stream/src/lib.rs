//! Stream bus for the feed pipeline
//!
//! Decouples the single producer (the feed coordinator) from its sinks. Two
//! event kinds are carried: accepted canonical orders and rejected payloads.
//! Fan-out is synchronous and in-process; durability belongs to the
//! repository sinks, not the bus.
//!
//! ```text
//! FeedCoordinator
//!       │
//!   ┌───┴────────────┐
//!   │                │
//! VALID_ORDER    ERROR_ORDER
//!   │                │
//! ┌─▼──────────┐ ┌───▼────────┐
//! │ order sink │ │ error sink │
//! └────────────┘ └────────────┘
//! ```

pub mod bus;
pub mod events;

pub use bus::{StreamBus, SubscriptionId, Topic};
pub use events::{ErrorOrderPayload, ValidOrderPayload};
