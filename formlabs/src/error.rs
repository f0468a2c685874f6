/// Result type returned by the Formlabs client.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors returned while talking to the Formlabs api.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client-credentials exchange was rejected, or answered with a
    /// payload that did not contain an access token.
    #[error("token error {status}: {body}")]
    Authentication {
        /// HTTP status of the token response.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// An authenticated request came back with a status of 400 or above.
    #[error("API error {status} on {path}: {body}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Path of the request, relative to the base url.
        path: String,
        /// Raw response body.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON on {path}: {source}")]
    Decode {
        /// Path of the request, relative to the base url.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The response was JSON, but not of the shape the endpoint documents.
    #[error("unexpected payload on {path}: expected {expected}")]
    UnexpectedShape {
        /// Path of the request, relative to the base url.
        path: String,
        /// Description of what was expected.
        expected: &'static str,
    },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Return true if the api rejected our credentials (401 or 403). The
    /// client drops its cached token when it sees one of these.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }
}
