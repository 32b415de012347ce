//! The debounced, page-accumulating search controller.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use toolkart_api::{CatalogApi, ProductHit, SearchQuery, SortBy};
use toolkart_core::Price;
use toolkart_storage::KeyValueStore;

use crate::history::SearchHistory;

/// Quiet period after the last keystroke before a query fires.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Items requested per page.
const PAGE_SIZE: u32 = 10;

/// Filter and sort parameters applied alongside the query text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub sort_by: Option<SortBy>,
}

#[derive(Debug, Default)]
struct SearchState {
    text: String,
    filters: SearchFilters,
    page: u32,
    items: Vec<ProductHit>,
    has_more: bool,
    /// Generation of the fetch currently in flight, if any.
    in_flight: Option<u64>,
    error: bool,
    first_query_done: bool,
}

/// Drives catalog search for one screen.
///
/// Every parameter change supersedes whatever was pending or in flight: the
/// generation counter is bumped, the accumulated list resets, and a response
/// arriving for an older generation is discarded. The first non-empty query
/// of the session skips the debounce.
pub struct SearchController<A, S> {
    api: A,
    history: SearchHistory<S>,
    state: Mutex<SearchState>,
    generation: AtomicU64,
}

impl<A, S> SearchController<A, S>
where
    A: CatalogApi,
    S: KeyValueStore,
{
    pub fn new(api: A, history: SearchHistory<S>) -> Self {
        Self {
            api,
            history,
            state: Mutex::new(SearchState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// The user edited the query text.
    pub async fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let generation = self.bump_generation();
        let instant = self.with_state(|state| {
            state.text = text.clone();
            Self::reset_results(state);
            let instant = !state.first_query_done && !text.trim().is_empty();
            if instant {
                state.first_query_done = true;
            }
            instant
        });

        if text.trim().is_empty() {
            // Cleared input: the screen falls back to history/keywords.
            return;
        }
        if !instant {
            sleep(DEBOUNCE).await;
            if self.generation.load(Ordering::SeqCst) != generation {
                return; // superseded while waiting
            }
        }
        self.fetch_page(generation, 1).await;
    }

    /// The user changed filters or sort order. Always debounced.
    pub async fn set_filters(&self, filters: SearchFilters) {
        let generation = self.bump_generation();
        let text_empty = self.with_state(|state| {
            state.filters = filters;
            Self::reset_results(state);
            state.text.trim().is_empty()
        });

        if text_empty {
            return;
        }
        sleep(DEBOUNCE).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.fetch_page(generation, 1).await;
    }

    /// Fetch the next page. Returns `false` when there is nothing to do:
    /// a fetch already in flight, no further pages, or no query.
    pub async fn load_more(&self) -> bool {
        let generation = self.generation.load(Ordering::SeqCst);
        let next_page = self.with_state(|state| {
            if state.in_flight.is_some() || !state.has_more || state.text.trim().is_empty() {
                None
            } else {
                state.page += 1;
                Some(state.page)
            }
        });
        let Some(page) = next_page else {
            return false;
        };
        self.fetch_page(generation, page).await;
        true
    }

    /// Record a tapped result into the persisted history.
    pub async fn record_selection(&self, hit: &ProductHit) {
        self.history.record_selection(hit).await;
    }

    pub fn history(&self) -> &SearchHistory<S> {
        &self.history
    }

    /// Accumulated results across all fetched pages.
    pub fn results(&self) -> Vec<ProductHit> {
        self.with_state(|state| state.items.clone())
    }

    pub fn has_more(&self) -> bool {
        self.with_state(|state| state.has_more)
    }

    pub fn is_error(&self) -> bool {
        self.with_state(|state| state.error)
    }

    pub fn page(&self) -> u32 {
        self.with_state(|state| state.page)
    }

    async fn fetch_page(&self, generation: u64, page: u32) {
        let query = self.with_state(|state| {
            state.in_flight = Some(generation);
            SearchQuery {
                text: state.text.clone(),
                category: state.filters.category.clone(),
                brand: state.filters.brand.clone(),
                min_price: state.filters.min_price,
                max_price: state.filters.max_price,
                sort_by: state.filters.sort_by,
                limit: PAGE_SIZE,
                page,
            }
        });

        let result = self.api.search_products(&query).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding response for superseded query");
            self.with_state(|state| {
                if state.in_flight == Some(generation) {
                    state.in_flight = None;
                }
            });
            return;
        }

        let record = self.with_state(|state| {
            state.in_flight = None;
            match &result {
                Ok(fetched) => {
                    if page == 1 {
                        state.items = fetched.items.clone();
                    } else {
                        // Overlapping pages can repeat a product when the
                        // catalog shifts underneath the pagination.
                        for hit in &fetched.items {
                            if !state.items.iter().any(|existing| existing.id == hit.id) {
                                state.items.push(hit.clone());
                            }
                        }
                    }
                    state.has_more = fetched.current_page < fetched.last_page;
                    state.error = false;
                    page == 1
                }
                Err(err) => {
                    tracing::warn!(page, error = %err, "search fetch failed");
                    state.error = true;
                    // Keep the accumulated list; step back so a retry
                    // re-requests the page that failed.
                    if page > 1 {
                        state.page = page - 1;
                    }
                    false
                }
            }
        });

        if record {
            self.history.record_query(&query.text).await;
        }
    }

    fn reset_results(state: &mut SearchState) {
        state.page = 1;
        state.items.clear();
        state.has_more = true;
        state.error = false;
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SearchState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use rust_decimal_macros::dec;
    use tokio::sync::Semaphore;
    use tokio::time::Instant;
    use toolkart_api::{ApiError, SearchPage};
    use toolkart_storage::MemoryStore;

    use super::*;

    struct FakeCatalog {
        calls: Mutex<Vec<SearchQuery>>,
        last_page: u32,
        fail: AtomicBool,
        /// Produce the same product ids on every page.
        repeat_ids: AtomicBool,
        /// When set with zero permits, the next search blocks until released.
        gate: Option<Arc<Semaphore>>,
        gate_first_only: AtomicBool,
    }

    impl FakeCatalog {
        fn with_pages(last_page: u32) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                last_page,
                fail: AtomicBool::new(false),
                repeat_ids: AtomicBool::new(false),
                gate: None,
                gate_first_only: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> Vec<SearchQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogApi for FakeCatalog {
        async fn search_products(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
            if let Some(gate) = &self.gate {
                if self.gate_first_only.swap(false, Ordering::SeqCst) {
                    let permit = gate.acquire().await.unwrap();
                    permit.forget();
                }
            }
            self.calls.lock().unwrap().push(query.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Network("search endpoint down".to_string()));
            }
            let repeat = self.repeat_ids.load(Ordering::SeqCst);
            let items = (0..2)
                .map(|i| ProductHit {
                    id: if repeat {
                        format!("{}-{}", query.text, i).parse().unwrap()
                    } else {
                        format!("{}-p{}-{}", query.text, query.page, i).parse().unwrap()
                    },
                    name: format!("{} result {} on page {}", query.text, i, query.page),
                    price: Price::new(dec!(9.99)),
                    image: None,
                    brand: None,
                })
                .collect();
            Ok(SearchPage {
                items,
                current_page: query.page,
                last_page: self.last_page,
            })
        }
    }

    fn controller(api: FakeCatalog) -> SearchController<FakeCatalog, MemoryStore> {
        SearchController::new(api, SearchHistory::new(MemoryStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn first_nonempty_query_fires_without_the_debounce_delay() {
        let controller = controller(FakeCatalog::with_pages(1));
        let before = Instant::now();

        controller.set_text("shoes").await;

        assert_eq!(before.elapsed(), Duration::ZERO);
        let calls = controller.api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "shoes");
        assert_eq!(controller.results().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_inside_the_window_produce_one_fetch_with_the_final_text() {
        let controller = controller(FakeCatalog::with_pages(1));
        controller.set_text("s").await; // consume the instant carve-out

        futures::join!(controller.set_text("sh"), controller.set_text("shoes"));

        let calls = controller.api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].text, "shoes");
        assert!(controller.results()[0].name.starts_with("shoes"));
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_text_fetches_nothing() {
        let controller = controller(FakeCatalog::with_pages(1));

        controller.set_text("").await;
        controller.set_text("   ").await;

        assert!(controller.api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pages_accumulate_and_has_more_tracks_last_page() {
        let controller = controller(FakeCatalog::with_pages(3));

        controller.set_text("shoes").await;
        assert_eq!(controller.results().len(), 2);
        assert!(controller.has_more());

        assert!(controller.load_more().await);
        assert_eq!(controller.results().len(), 4);
        assert!(controller.has_more());

        assert!(controller.load_more().await);
        assert_eq!(controller.results().len(), 6);
        assert!(!controller.has_more());

        // Exhausted: no further request goes out.
        assert!(!controller.load_more().await);
        let pages: Vec<u32> = controller.api.calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_pages_do_not_duplicate_results() {
        let api = FakeCatalog::with_pages(3);
        api.repeat_ids.store(true, Ordering::SeqCst);
        let controller = controller(api);

        controller.set_text("shoes").await;
        controller.load_more().await;

        assert_eq!(controller.api.calls().len(), 2);
        assert_eq!(controller.results().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn changing_the_text_resets_accumulated_pages() {
        let controller = controller(FakeCatalog::with_pages(3));

        controller.set_text("shoes").await;
        controller.load_more().await;
        assert_eq!(controller.results().len(), 4);

        controller.set_text("socks").await;

        assert_eq!(controller.page(), 1);
        assert_eq!(controller.results().len(), 2);
        assert!(controller.results()[0].name.starts_with("socks"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_page_fetch_keeps_accumulated_results() {
        let controller = controller(FakeCatalog::with_pages(3));

        controller.set_text("shoes").await;
        assert_eq!(controller.results().len(), 2);

        controller.api.fail.store(true, Ordering::SeqCst);
        controller.load_more().await;

        assert!(controller.is_error());
        assert_eq!(controller.results().len(), 2);
        // Retry re-requests the page that failed.
        controller.api.fail.store(false, Ordering::SeqCst);
        controller.load_more().await;
        assert_eq!(controller.results().len(), 4);
        let pages: Vec<u32> = controller.api.calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn a_late_response_for_a_superseded_query_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let api = FakeCatalog {
            gate: Some(gate.clone()),
            gate_first_only: AtomicBool::new(true),
            ..FakeCatalog::with_pages(1)
        };
        let controller = controller(api);

        futures::join!(
            // Instant first query, held at the gate until released below.
            controller.set_text("shoes"),
            async {
                tokio::task::yield_now().await;
                // Debounced replacement completes while the first is stuck.
                controller.set_text("socks").await;
                gate.add_permits(1);
            }
        );

        let results = controller.results();
        assert!(!results.is_empty());
        assert!(results.iter().all(|hit| hit.name.starts_with("socks")));
        assert!(!controller.is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn filter_changes_are_debounced_and_reset_results() {
        let controller = controller(FakeCatalog::with_pages(3));
        controller.set_text("shoes").await;
        controller.load_more().await;

        controller
            .set_filters(SearchFilters {
                sort_by: Some(SortBy::PriceAsc),
                ..SearchFilters::default()
            })
            .await;

        let calls = controller.api.calls();
        let last = calls.last().unwrap();
        assert_eq!(last.page, 1);
        assert_eq!(last.sort_by, Some(SortBy::PriceAsc));
        assert_eq!(controller.results().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_first_page_is_recorded_into_history() {
        let controller = controller(FakeCatalog::with_pages(3));

        controller.set_text("shoes").await;
        controller.load_more().await;

        let recent = controller.history().recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "shoes");
        assert_eq!(controller.history().hot_keywords()[0].frequency, 1);
    }
}
