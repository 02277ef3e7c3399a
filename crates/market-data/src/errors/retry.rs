/// Classification for failover across providers.
///
/// Used by [`fetch_with_fallback`](crate::fallback::fetch_with_fallback) to decide
/// whether a failure from one provider should stop the walk down the fallback chain.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? |
/// |-------|-------------------|
/// | `Never` | No |
/// | `NextProvider` | Yes |
///
/// This is separate from per-request retrying, which happens inside
/// [`RetryableFetch`](crate::fetch::RetryableFetch) before an error ever reaches
/// the fallback walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the request itself is invalid (client error, bad config).
    /// Another provider would reject it for the same reason.
    Never,

    /// Try the next provider in the chain.
    ///
    /// Used when this provider is unreachable, exhausted its retries, or can't
    /// serve the operation, but another provider might succeed.
    NextProvider,
}
