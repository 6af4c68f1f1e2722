//! Upstream access: the remote fetcher and the record decoder.
//!
//! [`Fetcher`] performs a single bounded-timeout GET per call and hands back
//! the raw body. [`decode`] turns those bytes into the shared domain types.
//! Neither keeps mutable state, so one fetcher is shared by every worker.

pub mod decode;

use std::time::Duration;

use noderank_shared::{NodeRankError, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

pub use decode::{decode_base_list, decode_node};

/// User-Agent string for upstream requests.
const USER_AGENT: &str = concat!("noderank/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP fetcher with a fixed per-request timeout and no retries.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference-counted
/// and safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| NodeRankError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` once and return the full response body.
    ///
    /// Connection failures, timeouts and non-2xx statuses are
    /// [`NodeRankError::Transport`], including a timeout that fires while the
    /// body is still streaming. Any other failure to read the body to the end
    /// is [`NodeRankError::Read`].
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("downloading");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NodeRankError::transport(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NodeRankError::transport(url, format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NodeRankError::transport(url, describe(&e))
                } else {
                    NodeRankError::read(url, describe(&e))
                }
            })?;

        debug!(bytes = body.len(), "download complete");
        Ok(body.to_vec())
    }
}

/// Render a reqwest error, calling out timeouts explicitly.
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Build the lookup URL for one node: `<base>/<public_key>/json`.
pub fn node_url(base: &Url, public_key: &str) -> Result<Url> {
    if public_key.is_empty() {
        return Err(NodeRankError::validation("empty public key"));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| NodeRankError::validation(format!("cannot append path to {base}")))?
        .pop_if_empty()
        .push(public_key)
        .push("json");
    Ok(url)
}
