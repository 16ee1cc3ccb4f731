//! Outbound HTTP capability used by the fetch operator (`<-`).
//!
//! The evaluator only sees the [`Fetcher`] trait; the reqwest-backed
//! implementation lives here so tests can substitute a stub.

use std::fmt;

/// Transport-level fetch failure (resolution, connection, read).
#[derive(Debug, Clone)]
pub struct FetchError(pub String);

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// Performs HTTP GET requests on behalf of the fetch operator.
///
/// Implementations block the calling thread; the dispatcher only invokes
/// them from worker threads.
pub trait Fetcher: Send + Sync {
    /// GET the url and return the response body as a string.
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetcher backed by a real HTTP client.
///
/// The url must carry a scheme; a missing port defaults to 80. No request
/// timeout is applied, so a stalled upstream holds its worker until the
/// connection resolves.
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = reqwest::blocking::get(url).map_err(|e| FetchError(e.to_string()))?;
        response.text().map_err(|e| FetchError(e.to_string()))
    }
}
