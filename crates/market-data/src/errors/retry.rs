/// Classification for retry policy.
///
/// Adapters and the cached fetcher never retry; this tells the caller
/// whether polling again later can succeed.
///
/// | Class | Worth polling again? |
/// |-------|----------------------|
/// | `Never` | No |
/// | `WithBackoff` | Yes, after a delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - unknown provider, bad payload, or a client-side HTTP error.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Transient failure such as a timeout, a dropped connection, rate
    /// limiting (429) or an upstream 5xx.
    WithBackoff,
}
