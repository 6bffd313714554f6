/// Errors that can occur while fetching a JSON document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  /// The request could not be built or sent.
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("failed to fetch from {url} with status: {status}")]
  Status { url: String, status: u16 },

  /// The body is not valid JSON.
  #[error("invalid JSON from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },
}
