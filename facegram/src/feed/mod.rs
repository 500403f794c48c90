pub mod coordinator;
pub mod debounce;
pub mod liveness;
pub mod pager;
pub mod posts;
pub mod proximity;

use async_trait::async_trait;
use thiserror::Error;

pub use coordinator::{spawn_feed, FeedEvent, FeedHandle, FeedSettings};
pub use pager::{PageOutcome, PageRequest, PageSizePolicy, Pager};
pub use proximity::Viewport;

/// Why a page fetch failed. Every variant is recoverable by retrying the same page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response: connection refused, DNS, TLS, or an HTTP-layer timeout.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status or an unreadable body.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// A paginated collection the coordinator can pull from.
///
/// Implementations must be idempotent per `(page, size)` pair.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, page: u32, size: u32) -> Result<Vec<Self::Item>, FetchError>;
}
