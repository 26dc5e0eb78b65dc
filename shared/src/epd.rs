//! EPD (environmental product declaration) risk scans.
//!
//! The backend grades a batch of product ids by how well their EPD and
//! certification evidence holds up and stores the result as a numbered scan
//! that can be fetched again or exported as CSV.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Most ids the backend accepts in one scan.
pub const MAX_SCAN_IDS: usize = 5000;
/// `MAX_SCAN_IDS` as `u64`, the integer type `validator` length bounds require.
const MAX_SCAN_IDS_U64: u64 = MAX_SCAN_IDS as u64;

/// Column names recognised as the product id column of an uploaded list.
const ID_COLUMNS: [&str; 2] = ["product_id", "id"];

/// Risk bucket of one scanned product, as the backend labels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// No certificates at all
    Red,
    /// Certificates, but no EPD
    Yellow,
    /// EPD certificate present
    Green,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Red => "High",
            RiskLevel::Yellow => "Medium",
            RiskLevel::Green => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Body of `POST /api/epd/scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ScanRequest {
    #[validate(length(min = 1, max = MAX_SCAN_IDS_U64))]
    pub product_ids: Vec<String>,
}

impl ScanRequest {
    /// Trimmed, non-blank ids in input order.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let product_ids = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        Self { product_ids }
    }
}

/// Number of scanned products per risk bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub total: u64,
}

impl RiskCounts {
    pub fn get(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Red => self.high,
            RiskLevel::Yellow => self.medium,
            RiskLevel::Green => self.low,
        }
    }
}

/// Header of a freshly created scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub counts: RiskCounts,
    #[serde(default)]
    pub advisory: Option<String>,
}

/// One graded product. Stored scans only carry the first block of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub input_product_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub epd_url: Option<String>,
    #[serde(default)]
    pub epd_issue_date: Option<String>,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub advisories: Vec<String>,

    #[serde(default)]
    pub has_epd_certificate: Option<bool>,
    #[serde(default)]
    pub has_certifications: Option<bool>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub certificate_urls: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl ScanEntry {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unknown product")
    }
}

/// Response of `POST /api/epd/scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCreated {
    pub summary: ScanSummary,
    #[serde(default)]
    pub results: Vec<ScanEntry>,
}

/// Response of `GET /api/epd/scan/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub counts: RiskCounts,
    #[serde(default)]
    pub results: Vec<ScanEntry>,
}

/// Product ids from a CSV listing.
///
/// The first row is a header. Values come from the `product_id` or `id`
/// column when one exists (case-insensitive), otherwise from the first
/// column. Blank values are dropped.
pub fn ids_from_csv(text: &str) -> Vec<String> {
    let mut rows = text
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|line| !line.trim().is_empty());

    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let columns: Vec<String> = split_row(header).iter().map(|c| c.to_lowercase()).collect();
    let index = ID_COLUMNS
        .iter()
        .find_map(|name| columns.iter().position(|c| c == name))
        .unwrap_or(0);

    rows.filter_map(|row| split_row(row).into_iter().nth(index))
        .filter(|id| !id.is_empty())
        .collect()
}

fn split_row(row: &str) -> Vec<String> {
    row.split(',')
        .map(|cell| cell.trim().trim_matches('"').trim().to_string())
        .collect()
}
