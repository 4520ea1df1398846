//! Services for communicating with APIs using HTTP.
//!
//! Clients and the errors they raise come from [`hypertyper`]. This module
//! adds what talking to Reddit needs on top of that: building URLs from
//! query parameters, and telling a rejected token request apart from a
//! network that is simply unreachable.

use reqwest::{StatusCode, Url};
use std::{error, fmt};

pub use hypertyper::{HTTPClient, HTTPClientFactory};

/// Builds a URL from a base URL, a path, and query parameters.
///
/// # Examples
///
/// ```
/// use reddit_cli::http::build_url;
/// let url = build_url("https://oauth.reddit.com", "r/rust/top", &[("t", "week".into())]).unwrap();
/// assert_eq!(url.as_str(), "https://oauth.reddit.com/r/rust/top?t=week");
/// ```
pub fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> HTTPResult<Url> {
    let uri = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let url = if params.is_empty() {
        Url::parse(&uri)
    } else {
        Url::parse_with_params(&uri, params)
    };
    url.map_err(|err| HTTPError::InvalidUrl(uri, err.to_string()))
}

/// The result of an HTTP request.
pub type HTTPResult<T> = Result<T, HTTPError>;

/// Indicates an error has occurred when making an HTTP call.
#[derive(Debug)]
pub enum HTTPError {
    /// The request could not be completed, or its response could not be
    /// read. Unreachable hosts and unexpected content types end up here.
    Client(hypertyper::HTTPError),

    /// An unsuccessful HTTP status code in an HTTP response.
    Http(StatusCode),

    /// A URL could not be built from its parts.
    InvalidUrl(String, String),

    /// The OAuth token endpoint refused to hand out a token, giving this
    /// reason (such as `invalid_grant`).
    Token(String),
}

impl HTTPError {
    /// The HTTP status code that caused the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HTTPError::Http(status) => Some(*status),
            _ => None,
        }
    }

    /// True if Reddit turned the app's credentials down, as opposed to
    /// the request failing for some other reason.
    pub fn is_rejection(&self) -> bool {
        match self {
            HTTPError::Token(_) => true,
            HTTPError::Http(status) => *status == StatusCode::UNAUTHORIZED,
            HTTPError::Client(_) | HTTPError::InvalidUrl(..) => false,
        }
    }
}

impl From<hypertyper::HTTPError> for HTTPError {
    fn from(err: hypertyper::HTTPError) -> Self {
        match err {
            hypertyper::HTTPError::Http(status) => HTTPError::Http(status),
            err => HTTPError::Client(err),
        }
    }
}

impl fmt::Display for HTTPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HTTPError::Client(err) => write!(f, "{err}"),
            HTTPError::Http(status) => write!(f, "Request returned HTTP {status}"),
            HTTPError::InvalidUrl(uri, err) => write!(f, "Invalid URL {uri}: {err}"),
            HTTPError::Token(reason) => write!(f, "Could not obtain an access token: {reason}"),
        }
    }
}

impl error::Error for HTTPError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            HTTPError::Client(err) => Some(err),
            HTTPError::Http(_) | HTTPError::InvalidUrl(..) | HTTPError::Token(_) => None,
        }
    }
}
