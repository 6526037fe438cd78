use gloo_net::http::Request;
use streaming::{Fetch, FetchError};

/// Fetches data files with the browser's `fetch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooFetch;

impl Fetch for GlooFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = Request::get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        resp.text().await.map_err(|e| FetchError::Body(e.to_string()))
    }
}
