//! Resilient HTTP fetching.
//!
//! This module contains:
//! - [`RetryPolicy`]: bounds and backoff parameters for one logical request
//! - [`RequestOptions`]: method, headers, body, ordered query params, deadline
//! - [`AttemptOutcome`]: classification of a single attempt
//! - [`RetryableFetch`]: the retry loop itself
//!
//! The fetcher knows nothing about providers. Providers call it for their
//! network I/O; the registry never does.

mod client;
mod outcome;
mod policy;
mod request;

pub use client::RetryableFetch;
pub use outcome::{
    classify_status, classify_transport_error, parse_retry_after, AttemptOutcome, FetchResponse,
    StatusClass, MAX_RETRY_AFTER,
};
pub use policy::RetryPolicy;
pub use request::{build_url, RequestOptions};
