use std::path::PathBuf;

/// A GraphQL operation could not be completed.
///
/// The query client never panics or bubbles transport errors up through the pagination loop;
/// every failure is reported as one of these variants and the page sequence ends.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// The request could not be sent, or the response could not be received or decoded as a
    /// GraphQL response (e.g. connection refused, unauthorized HTML page, timeout).
    #[error("request error: {0}")]
    Request(String),

    /// The server answered with GraphQL errors.
    #[error("response error: {0:?}")]
    Response(Vec<String>),

    /// The server answered without data and without errors.
    #[error("empty response")]
    EmptyResponse,

    /// The response data has no field with the descriptor's instance name.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// The response data does not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A project timestamp supplied by the server is absent or not a valid ISO-8601 date-time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTimestamp {
    /// The field is `null` or was not returned.
    #[error("missing timestamp")]
    Missing,

    #[error("malformed timestamp {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Invalid configuration, reported before any query is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid GitLab endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("page size must be greater than 0")]
    InvalidPageSize,

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
