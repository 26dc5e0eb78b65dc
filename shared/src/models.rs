//! Wire models for the product search API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::config::{MAX_PER_PAGE, MIN_PER_PAGE};

/// Opaque product identifier. The backend uses integers, but nothing on the
/// client relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(id) => write!(f, "{}", id),
            ProductId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        ProductId::Number(id)
    }
}

impl From<&str> for ProductId {
    fn from(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(id) => ProductId::Number(id),
            Err(_) => ProductId::Text(raw.trim().to_string()),
        }
    }
}

/// Category a product is listed under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    #[serde(default)]
    pub category_name: Option<String>,
}

/// Sustainability certification attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default)]
    pub certification: Option<String>,
}

/// Secondary image keys some records carry besides `product_image`.
pub const IMAGE_KEYS: [&str; 2] = ["image_url", "image"];

/// A product record as returned by search and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub product_categories: Vec<ProductCategory>,
    #[serde(default)]
    pub certifications: Vec<Certification>,

    // Sustainability figures arrive as numbers or numeric strings.
    #[serde(default, deserialize_with = "lenient_number")]
    pub recycled_content_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub recyclable_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub net_carbon_emissions: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub expected_lifespan_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub manufacturers_warranty_years: Option<f64>,

    /// Present only when semantic ranking was requested
    #[serde(default)]
    pub similarity_score: Option<f64>,
    /// Present only when LLM refinement ran
    #[serde(default)]
    pub llm_relevance: Option<f64>,
    #[serde(default)]
    pub llm_explanation: Option<String>,

    /// Every other field, kept for the detail view
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unnamed product")
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.product_categories
            .iter()
            .filter_map(|c| c.category_name.as_deref())
            .collect()
    }

    pub fn certification_names(&self) -> Vec<&str> {
        self.certifications
            .iter()
            .filter_map(|c| c.certification.as_deref())
            .collect()
    }

    /// First non-blank image reference. `image_url` and `image` may sit
    /// alongside `product_image` and stay in `extra`.
    pub fn image_path(&self) -> Option<&str> {
        let fallback = IMAGE_KEYS
            .iter()
            .filter_map(|key| self.extra.get(*key).and_then(Value::as_str));
        self.product_image
            .as_deref()
            .into_iter()
            .chain(fallback)
            .map(str::trim)
            .find(|path| !path.is_empty())
    }

    /// LLM explanation, if one was given. The backend sends `""` when the
    /// model returned none.
    pub fn explanation(&self) -> Option<&str> {
        self.llm_explanation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Relevance shown on a card: the LLM score when present, else the
    /// embedding similarity.
    pub fn relevance(&self) -> Option<f64> {
        self.llm_relevance.or(self.similarity_score)
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    })
}

/// A filter value with the number of products it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Response of `GET /api/filters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub categories: Vec<FilterOption>,
    #[serde(default)]
    pub manufacturers: Vec<FilterOption>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// Filter block of a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub categories: Vec<String>,
    pub manufacturers: Vec<String>,
    /// Specific certification names; a product passes if it holds any of them
    pub certifications: Vec<String>,
    pub has_certifications: bool,
    pub has_carbon_data: bool,
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub use_llm_refinement: bool,
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = MIN_PER_PAGE, max = MAX_PER_PAGE))]
    pub per_page: u32,
}

/// Successful response of `POST /api/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Sustainability counters from `GET /api/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SustainabilityStats {
    #[serde(default)]
    pub with_certifications: u64,
    #[serde(default)]
    pub with_carbon_data: u64,
    #[serde(default)]
    pub with_recycled_content: u64,
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_products: u64,
    pub total_categories: u64,
    pub total_manufacturers: u64,
    #[serde(default)]
    pub sustainability_stats: SustainabilityStats,
    #[serde(default)]
    pub top_categories: Vec<(String, u64)>,
    #[serde(default)]
    pub top_manufacturers: Vec<(String, u64)>,
}

/// Response of `GET /api/similar/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarProducts {
    pub product_id: ProductId,
    #[serde(default)]
    pub similar_products: Vec<Product>,
    #[serde(default)]
    pub count: u64,
}

/// Response of `GET /api/certifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificationNames {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub names: Vec<String>,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub products_loaded: Option<u64>,
    #[serde(default)]
    pub embeddings_ready: Option<bool>,
    #[serde(default)]
    pub api_configured: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub history: Vec<ChatTurn>,
}

/// Event carried by one `data: ` frame of the chat stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Sent once before the first chunk
    Start,
    Content {
        #[serde(default)]
        text: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Done,
}
