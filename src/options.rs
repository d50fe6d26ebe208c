/// Configures HTTP timeout, retry and pagination behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per idempotent request, including the first one.
    ///
    /// Requests carrying a body always make a single attempt.
    pub max_attempts: usize,
    /// Base retry backoff in milliseconds (pure exponential, no jitter).
    pub retry_backoff_ms: u64,
    /// `page[size]` sent with list requests. `None` keeps the server default.
    pub page_size: Option<u32>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_attempts: 10,
            retry_backoff_ms: 500,
            page_size: None,
        }
    }
}
