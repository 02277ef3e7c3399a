//! Market data models
//!
//! - `quote` - Normalized quote returned by every provider
//! - `search` - Symbol search result
//! - `health` - Point-in-time provider health

mod health;
mod quote;
mod search;

pub use health::HealthStatus;
pub use quote::Quote;
pub use search::SearchResult;
