//! Catalog source using the browser `fetch` API (WASM only).

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::CatalogSource;
use crate::error::DataError;

/// Fetches documents relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn window(path: &str) -> Result<web_sys::Window, DataError> {
        web_sys::window().ok_or_else(|| DataError::network(path, "No window object available"))
    }

    /// Check the status of a settled fetch and read its body.
    async fn read_body(response: JsValue, url: &str) -> Result<String, DataError> {
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|_| DataError::network(url, "fetch did not resolve to a Response"))?;

        if !response.ok() {
            return Err(DataError::network(
                url,
                format!("HTTP {} {}", response.status(), response.status_text()),
            ));
        }

        let text_promise = response
            .text()
            .map_err(|e| DataError::network(url, format!("{:?}", e)))?;
        let text = JsFuture::from(text_promise)
            .await
            .map_err(|e| DataError::network(url, format!("{:?}", e)))?;

        text.as_string()
            .ok_or_else(|| DataError::network(url, "response body is not text"))
    }
}

impl CatalogSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, DataError> {
        let url = self.url_for(path);
        let response = JsFuture::from(Self::window(&url)?.fetch_with_str(&url))
            .await
            .map_err(|e| DataError::network(&url, format!("{:?}", e)))?;
        Self::read_body(response, &url).await
    }

    /// Issue every fetch up front and join them with `Promise.all`.
    async fn fetch_all(&self, paths: &[String]) -> Result<Vec<String>, DataError> {
        let window = Self::window(&self.base_url)?;
        let urls: Vec<String> = paths.iter().map(|p| self.url_for(p)).collect();

        let pending = js_sys::Array::new();
        for url in &urls {
            pending.push(&window.fetch_with_str(url));
        }

        let settled = JsFuture::from(js_sys::Promise::all(&pending))
            .await
            .map_err(|e| DataError::network(&self.base_url, format!("{:?}", e)))?;
        let responses: js_sys::Array = settled
            .dyn_into()
            .map_err(|_| DataError::network(&self.base_url, "Promise.all did not yield an array"))?;

        let mut bodies = Vec::with_capacity(urls.len());
        for (response, url) in responses.iter().zip(&urls) {
            bodies.push(Self::read_body(response, url).await?);
        }
        log::debug!("Fetched {} catalog documents", bodies.len());
        Ok(bodies)
    }
}
