//! Error types surfaced while querying the GitHub search API.

use std::num::ParseIntError;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised anywhere between building a request and rendering results.
///
/// Only complete success yields a result set; every variant aborts the query
/// as a whole.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No non-blank token was supplied on the command line or in the environment.
    #[error("GitHub token is required")]
    MissingToken,

    /// The HTTP request could not be assembled.
    #[error("error creating request: {0}")]
    BuildRequest(#[source] reqwest::Error),

    /// The request cannot be re-sent after a rate-limit wait.
    #[error("request to {url} cannot be retried because its body is not cloneable")]
    RequestNotRetryable {
        /// Target of the request.
        url: String,
    },

    /// Networking failed while talking to GitHub.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A rate-limit header was missing or not an integer.
    #[error("failed to parse {header} header value {value:?}: {source}")]
    MalformedRateLimit {
        /// Header name.
        header: &'static str,
        /// Raw header value, empty when the header was absent.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },

    /// GitHub answered with a non-success status that is not a throttle.
    #[error("HTTP request failed with code {}: {body}", .status.as_u16())]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, verbatim.
        body: String,
    },

    /// A page body was not a valid search response.
    #[error("error decoding body as json: {0}")]
    Decode(#[from] serde_json::Error),

    /// A `Link` header carried a page number that does not fit an integer.
    #[error("HTTP response contained link with an unparseable page number - {value:?}: {source}")]
    LinkPage {
        /// Raw page value from the link URL.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },

    /// The cancellation signal fired before the query completed.
    #[error("query cancelled")]
    Cancelled,

    /// Failure while fetching a specific page.
    #[error("page {page}: {source}")]
    Page {
        /// Page being requested when the failure happened.
        page: u32,
        /// Underlying failure.
        #[source]
        source: Box<SearchError>,
    },

    /// The repository discovery phase failed.
    #[error("failed to search for repositories: {0}")]
    RepositorySearch(#[source] Box<SearchError>),

    /// The code search for one discovered repository failed.
    #[error("failed to search for code within repo {repo}: {source}")]
    RepositoryCodeSearch {
        /// Repository full name.
        repo: String,
        /// Underlying failure.
        #[source]
        source: Box<SearchError>,
    },

    /// Writing rendered output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns true when the failure, or the failure it wraps, is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Page { source, .. }
            | Self::RepositorySearch(source)
            | Self::RepositoryCodeSearch { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    pub(crate) fn at_page(self, page: u32) -> Self {
        if matches!(self, Self::Cancelled) {
            return self;
        }
        Self::Page {
            page,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
