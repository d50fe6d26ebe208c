/// Boxed source error carried by [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by an [`HttpTransport`](crate::HttpTransport) before any
/// HTTP status was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The per-attempt timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(BoxError),
    /// DNS resolution or TCP/TLS connection failed.
    #[error("connection failed: {0}")]
    Connect(BoxError),
    /// Any other request execution failure.
    #[error("request failed: {0}")]
    Other(BoxError),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(Box::new(err))
        } else if err.is_connect() {
            Self::Connect(Box::new(err))
        } else {
            Self::Other(Box::new(err))
        }
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum TfeError {
    /// Base URL or resolved request URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Network-level failure after retries were exhausted.
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    /// HTTP 401: the token is invalid, expired or lacks access.
    #[error("user is not authorized to perform this action")]
    Unauthorized,
    /// HTTP 404 on an endpoint without a more specific mapping.
    #[error("not found")]
    NotFound,
    /// HTTP 404 from a workspace endpoint.
    #[error("workspace not found")]
    WorkspaceNotFound,
    /// HTTP 404 from a state version endpoint, or an empty "latest" lookup.
    #[error("state version not found")]
    StateVersionNotFound,
    /// Any other non-success HTTP status with raw response body.
    #[error("unexpected http status {status}: {body}")]
    BadStatus { status: u16, body: String },
    /// Response body did not match the expected JSON:API shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// State version carries no hosted download URL.
    #[error("state version {0} has no hosted download url")]
    MissingDownloadUrl(String),
}

impl TfeError {
    /// Returns `true` for the generic and every resource-specific not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::WorkspaceNotFound | Self::StateVersionNotFound
        )
    }

    /// Replaces a generic [`TfeError::NotFound`] with `specific`, leaving
    /// every other error untouched.
    pub(crate) fn remap_not_found(self, specific: TfeError) -> TfeError {
        match self {
            Self::NotFound => specific,
            other => other,
        }
    }
}
