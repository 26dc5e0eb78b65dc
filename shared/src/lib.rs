//! Shared library for the product search dashboard.
//!
//! This crate provides the API client, wire models, and the state layers behind
//! the search results panel, the streaming chat widget and EPD risk scans. Nothing here renders.

pub mod chat;
pub mod client;
pub mod config;
pub mod epd;
pub mod error;
pub mod filters;
pub mod format;
pub mod models;
pub mod pagination;
pub mod search;
pub mod sse;

pub use chat::{ChatController, ChatEntry, ChatPhase, ChatSession, ChatView};
pub use client::ApiClient;
pub use config::Config;
pub use epd::{RiskLevel, ScanCreated, ScanReport, ScanRequest};
pub use error::{Error, Result};
pub use filters::{search_manufacturers, FilterChange, FilterState};
pub use format::{format_message, FormattedMessage};
pub use models::{ChatRequest, ChatTurn, FilterOptions, Product, ProductId, SearchRequest, SearchResponse, Stats, StreamEvent};
pub use pagination::{PageItem, PaginationModel, PaginationState};
pub use search::{ResultsBody, ResultsView, SearchController, SearchStatus};
pub use sse::SseDecoder;
