//! Feed ingestion pipeline
//!
//! The sole write path of the system. A raw partner payload flows
//! validation → sequencing → normalization → fan-out:
//!
//! ```text
//! raw payload
//!     │
//! ┌───▼──────┐  field errors   ┌─────────────┐
//! │ validate ├────────────────►│ ERROR_ORDER │
//! └───┬──────┘                 └─────────────┘
//!     │ typed input
//! ┌───▼──────┐
//! │ sequence │   next(partner), only after validation succeeds
//! └───┬──────┘
//! ┌───▼──────┐
//! │normalize │   canonical record
//! └───┬──────┘
//! ┌───▼─────────┐
//! │ VALID_ORDER │ → repository sink
//! └─────────────┘
//! ```
//!
//! Invalid payloads never consume sequence numbers, so per-partner sequences
//! stay dense across any mix of good and bad submissions.

pub mod config;
pub mod coordinator;
pub mod normalize;
pub mod sequence;
pub mod service;
pub mod validate;

pub use config::{DuplicatePolicy, FeedConfig};
pub use coordinator::{BatchResult, FeedCoordinator, ProcessingResult};
pub use sequence::SequenceGenerator;
pub use service::FeedService;
