use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Status { url: String, status: u16 },
    Body(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Status { url, status } => write!(f, "HTTP {status} for {url}"),
            FetchError::Body(msg) => write!(f, "failed to read response body: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Text fetch seam.
///
/// Implementations run on a single-threaded event loop, so the returned
/// futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// In-memory fetcher keyed by URL. Unknown URLs answer 404.
///
/// Records every requested URL so callers can assert on caching.
#[derive(Debug, Default)]
pub struct MemoryFetch {
    files: BTreeMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.files.insert(url.into(), body.into());
    }

    pub fn remove(&mut self, url: &str) -> Option<String> {
        self.files.remove(url)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for MemoryFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.files.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}
