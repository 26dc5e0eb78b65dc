//! HTTP client for the product search and chat API.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use validator::Validate;

use crate::config::Config;
use crate::epd::{ScanCreated, ScanReport, ScanRequest};
use crate::models::{
    CertificationNames, ChatRequest, FilterOptions, Health, Product, ProductId, SearchRequest,
    SearchResponse, SimilarProducts, Stats,
};
use crate::{Error, Result};

/// Client for the backend's JSON and event-stream endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Filter options shown in the sidebar, fetched once at startup.
    pub async fn filters(&self) -> Result<FilterOptions> {
        self.get_json("/api/filters").await
    }

    /// Run a search or filtered browse.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate()?;

        debug!(
            page = request.page,
            per_page = request.per_page,
            use_llm_refinement = request.use_llm_refinement,
            "Sending search request"
        );

        let response = self
            .http
            .post(self.url("/api/search"))
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// Full detail record for one product.
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        let encoded = urlencoding::encode(&id.to_string()).into_owned();
        self.get_json(&format!("/api/products/{}", encoded)).await
    }

    /// Look up a product by numeric id, product id, SKU, or code.
    pub async fn lookup_product(&self, raw_id: &str) -> Result<Product> {
        let raw_id = raw_id.trim();
        if raw_id.is_empty() {
            return Err(Error::Validation("Missing product id".to_string()));
        }
        let encoded = urlencoding::encode(raw_id).into_owned();
        self.get_json(&format!("/api/product?id={}", encoded)).await
    }

    /// Products the backend ranks as similar to the given one.
    pub async fn similar(&self, id: &ProductId) -> Result<SimilarProducts> {
        let encoded = urlencoding::encode(&id.to_string()).into_owned();
        self.get_json(&format!("/api/similar/{}", encoded)).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.get_json("/api/stats").await
    }

    pub async fn certifications(&self) -> Result<CertificationNames> {
        self.get_json("/api/certifications").await
    }

    /// Grade a batch of product ids by EPD risk.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanCreated> {
        request.validate()?;

        debug!(ids = request.product_ids.len(), "Starting EPD scan");
        let response = self
            .http
            .post(self.url("/api/epd/scan"))
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// A stored scan with all of its graded products.
    pub async fn scan_report(&self, scan_id: u64) -> Result<ScanReport> {
        self.get_json(&format!("/api/epd/scan/{}", scan_id)).await
    }

    /// A stored scan as CSV text, byte-order mark removed.
    pub async fn export_scan(&self, scan_id: u64) -> Result<String> {
        let response = self
            .http
            .get(self.url(&format!("/api/epd/export/{}?format=csv", scan_id)))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), scan_id, "Scan export failed");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body.trim_start_matches('\u{feff}').to_string())
    }

    /// Backend health. An unhealthy backend answers 500 with a health body,
    /// which is returned as `Ok` so the caller can show it.
    pub async fn health(&self) -> Result<Health> {
        let response = self.http.get(self.url("/api/health")).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Health>(&body) {
            Ok(health) => Ok(health),
            Err(_) if !status.is_success() => Err(Error::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(Error::Serialization(e)),
        }
    }

    /// Open the chat event stream. Fails before any bytes are read when the
    /// backend rejects the request.
    pub async fn open_chat_stream(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.url("/api/chat"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Chat request rejected");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        read_json(response).await
    }
}

/// Decode a JSON body, mapping non-success statuses and `{error}` bodies.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await?;

    if !status.is_success() {
        error!(status = status.as_u16(), path = %url, "Request failed");
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(Error::Api(message.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}
