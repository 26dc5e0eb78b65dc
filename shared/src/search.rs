//! Result/filter controller.
//!
//! Owns the query, filter selection, pagination cursor and the last result
//! set. Every user action mutates that state, issues one search request, and
//! merges the response. The render model is produced by [`SearchController::view`]
//! and never touches a terminal or DOM.

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::filters::{search_manufacturers, FilterChange, FilterState};
use crate::models::{FilterOption, FilterOptions, Product, ProductId, SearchRequest, SearchResponse, Stats};
use crate::pagination::{PaginationModel, PaginationState};
use crate::{Error, Result};

/// Request lifecycle of the results panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
}

/// What the results area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsBody<'a> {
    /// Nothing requested yet
    Empty,
    Products(&'a [Product]),
    Error(&'a str),
}

/// Render model for the results panel.
#[derive(Debug, Clone)]
pub struct ResultsView<'a> {
    pub status: SearchStatus,
    pub query: &'a str,
    pub body: ResultsBody<'a>,
    pub total: u64,
    pub active_filters: usize,
    pub pagination: Option<PaginationModel>,
    /// Set after a page change so the renderer starts from the top
    pub scroll_to_top: bool,
}

/// Controller for search, filters and pagination.
pub struct SearchController {
    client: ApiClient,
    query: String,
    filters: FilterState,
    pagination: PaginationState,
    /// Last page a response confirmed
    confirmed_page: u32,
    results: Vec<Product>,
    loaded: bool,
    status: SearchStatus,
    error: Option<String>,
    options: FilterOptions,
    scroll_to_top: bool,
}

impl SearchController {
    pub fn new(client: ApiClient, per_page: u32) -> Self {
        Self {
            client,
            query: String::new(),
            filters: FilterState::default(),
            pagination: PaginationState::new(per_page),
            confirmed_page: 1,
            results: Vec::new(),
            loaded: false,
            status: SearchStatus::Idle,
            error: None,
            options: FilterOptions::default(),
            scroll_to_top: false,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn results(&self) -> &[Product] {
        &self.results
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    /// Update the query input without issuing a request.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    /// Payload for the current state. A non-empty query always routes through
    /// LLM refinement; an empty one is a plain filtered browse.
    pub fn request(&self) -> SearchRequest {
        let query = self.query.trim().to_string();
        SearchRequest {
            use_llm_refinement: !query.is_empty(),
            query,
            filters: self.filters.to_request(),
            page: self.pagination.page,
            per_page: self.pagination.per_page,
        }
    }

    /// Enter `Loading` and return the request to send.
    pub fn begin(&mut self) -> Result<SearchRequest> {
        if self.status == SearchStatus::Loading {
            return Err(Error::Busy);
        }
        self.status = SearchStatus::Loading;
        Ok(self.request())
    }

    /// Merge the outcome of the request started by [`begin`](Self::begin).
    ///
    /// A failure leaves the previous result set untouched and moves the cursor
    /// back to the last confirmed page; the view shows the error in its place.
    pub fn complete(&mut self, outcome: Result<SearchResponse>) -> Result<()> {
        self.status = SearchStatus::Idle;
        match outcome {
            Ok(response) => {
                info!(
                    total = response.total,
                    total_pages = response.total_pages,
                    page = response.page,
                    returned = response.results.len(),
                    "Search completed"
                );
                self.pagination.apply(&response);
                self.confirmed_page = self.pagination.page;
                self.results = response.results;
                self.loaded = true;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, page = self.pagination.page, "Search failed");
                self.pagination.page = self.confirmed_page;
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch the filter options once at startup.
    pub async fn load_filter_options(&mut self) -> Result<&FilterOptions> {
        self.options = self.client.filters().await?;
        info!(
            categories = self.options.categories.len(),
            manufacturers = self.options.manufacturers.len(),
            "Loaded filter options"
        );
        Ok(&self.options)
    }

    /// Submit the query box: back to page 1 with the current filters.
    pub async fn search(&mut self, query: impl Into<String>) -> Result<()> {
        self.ensure_idle()?;
        self.set_query(query);
        self.pagination.reset();
        self.scroll_to_top = false;
        self.run().await
    }

    /// Apply a filter action and re-issue the request immediately.
    pub async fn change_filter(&mut self, change: FilterChange) -> Result<()> {
        self.ensure_idle()?;
        self.filters.apply(change);
        self.pagination.reset();
        self.scroll_to_top = false;
        self.run().await
    }

    /// Jump to a page, clamped to the known range, keeping query and filters.
    pub async fn go_to_page(&mut self, page: u32) -> Result<()> {
        self.ensure_idle()?;
        self.pagination.page = self.pagination.clamp(page);
        self.scroll_to_top = true;
        self.run().await
    }

    /// Next page; does nothing on the last page.
    pub async fn next_page(&mut self) -> Result<()> {
        if !self.pagination.has_next() {
            debug!(page = self.pagination.page, "Already on the last page");
            return Ok(());
        }
        self.go_to_page(self.pagination.page + 1).await
    }

    /// Previous page; does nothing on the first page.
    pub async fn previous_page(&mut self) -> Result<()> {
        if !self.pagination.has_previous() {
            debug!(page = self.pagination.page, "Already on the first page");
            return Ok(());
        }
        self.go_to_page(self.pagination.page - 1).await
    }

    /// Local narrowing of the manufacturer list; no request is made.
    pub fn manufacturer_matches(&self, term: &str) -> Vec<&FilterOption> {
        search_manufacturers(&self.options.manufacturers, term)
    }

    pub async fn product_detail(&self, id: &ProductId) -> Result<Product> {
        self.client.product(id).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.client.stats().await
    }

    pub fn view(&self) -> ResultsView<'_> {
        let body = match (&self.error, self.loaded) {
            (Some(message), _) => ResultsBody::Error(message.as_str()),
            (None, true) => ResultsBody::Products(&self.results),
            (None, false) => ResultsBody::Empty,
        };
        let pagination = match body {
            ResultsBody::Products(_) => self.pagination.model(),
            ResultsBody::Empty | ResultsBody::Error(_) => None,
        };

        ResultsView {
            status: self.status,
            query: &self.query,
            body,
            total: self.pagination.total,
            active_filters: self.filters.active_count(),
            pagination,
            scroll_to_top: self.scroll_to_top,
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.status {
            SearchStatus::Idle => Ok(()),
            SearchStatus::Loading => Err(Error::Busy),
        }
    }

    async fn run(&mut self) -> Result<()> {
        let request = self.begin()?;
        let outcome = self.client.search(&request).await;
        self.complete(outcome)
    }
}
