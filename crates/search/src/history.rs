//! Persisted search history: recent searches and hot keywords.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use toolkart_api::ProductHit;
use toolkart_core::Price;
use toolkart_storage::{KeyValueStore, get_json, keys, set_json};

/// Recent searches kept, most-recent-first.
const RECENT_LIMIT: usize = 5;

/// Hot keywords kept, sorted by descending frequency.
const HOT_LIMIT: usize = 9;

/// One recent-search row. Product fields are filled when the row came from
/// tapping a result rather than submitting a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    pub recorded_at: DateTime<Utc>,
}

/// One row of the keyword frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotKeyword {
    pub keyword: String,
    pub frequency: u32,
}

/// Bounded, persisted search history.
///
/// Both lists live in memory and are mirrored to the key-value store on every
/// change; a failed write is logged and the in-memory lists stay live.
#[derive(Debug)]
pub struct SearchHistory<S> {
    store: S,
    recent: Mutex<Vec<RecentSearch>>,
    hot: Mutex<Vec<HotKeyword>>,
}

impl<S: KeyValueStore> SearchHistory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            recent: Mutex::new(Vec::new()),
            hot: Mutex::new(Vec::new()),
        }
    }

    /// Hydrate both lists from storage. Missing or corrupt data starts empty.
    pub async fn load(&self) {
        let recent = match get_json::<Vec<RecentSearch>, _>(&self.store, keys::RECENT_SEARCHES).await
        {
            Ok(Some(list)) => list,
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "recent searches unreadable, starting empty");
                Vec::new()
            }
        };
        let hot = match get_json::<Vec<HotKeyword>, _>(&self.store, keys::HOT_KEYWORDS).await {
            Ok(Some(list)) => list,
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "hot keywords unreadable, starting empty");
                Vec::new()
            }
        };
        *lock(&self.recent) = recent;
        *lock(&self.hot) = hot;
    }

    /// Record a submitted query.
    pub async fn record_query(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.push_recent(RecentSearch {
            name: text.to_string(),
            image: None,
            price: None,
            recorded_at: Utc::now(),
        });
        self.bump_keyword(text);
        self.persist().await;
    }

    /// Record a tapped search result. Also bumps the keyword frequency for
    /// the product name.
    pub async fn record_selection(&self, hit: &ProductHit) {
        self.push_recent(RecentSearch {
            name: hit.name.clone(),
            image: hit.image.clone(),
            price: Some(hit.price),
            recorded_at: Utc::now(),
        });
        self.bump_keyword(&hit.name);
        self.persist().await;
    }

    pub fn recent(&self) -> Vec<RecentSearch> {
        lock(&self.recent).clone()
    }

    pub fn hot_keywords(&self) -> Vec<HotKeyword> {
        lock(&self.hot).clone()
    }

    fn push_recent(&self, row: RecentSearch) {
        let mut recent = lock(&self.recent);
        recent.retain(|existing| existing.name != row.name);
        recent.insert(0, row);
        recent.truncate(RECENT_LIMIT);
    }

    fn bump_keyword(&self, keyword: &str) {
        let mut hot = lock(&self.hot);
        match hot.iter_mut().find(|row| row.keyword == keyword) {
            Some(row) => row.frequency += 1,
            None => hot.push(HotKeyword {
                keyword: keyword.to_string(),
                frequency: 1,
            }),
        }
        hot.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        hot.truncate(HOT_LIMIT);
    }

    async fn persist(&self) {
        let recent = self.recent();
        let hot = self.hot_keywords();
        if let Err(err) = set_json(&self.store, keys::RECENT_SEARCHES, &recent).await {
            tracing::warn!(error = %err, "failed to persist recent searches");
        }
        if let Err(err) = set_json(&self.store, keys::HOT_KEYWORDS, &hot).await {
            tracing::warn!(error = %err, "failed to persist hot keywords");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use toolkart_storage::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn recent_list_is_capped_and_most_recent_first() {
        let history = SearchHistory::new(MemoryStore::new());

        for text in ["a", "b", "c", "d", "e", "f"] {
            history.record_query(text).await;
        }

        let recent = history.recent();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].name, "f");
        assert_eq!(recent[4].name, "b");
    }

    #[tokio::test]
    async fn repeating_a_query_moves_it_to_the_front_without_duplicating() {
        let history = SearchHistory::new(MemoryStore::new());

        history.record_query("shoes").await;
        history.record_query("socks").await;
        history.record_query("shoes").await;

        let recent = history.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "shoes");
    }

    #[tokio::test]
    async fn hot_keywords_sort_by_descending_frequency_and_cap_at_nine() {
        let history = SearchHistory::new(MemoryStore::new());

        for _ in 0..3 {
            history.record_query("popular").await;
        }
        history.record_query("rare").await;
        for i in 0..9 {
            history.record_query(&format!("filler-{i}")).await;
        }

        let hot = history.hot_keywords();
        assert_eq!(hot.len(), 9);
        assert_eq!(hot[0].keyword, "popular");
        assert_eq!(hot[0].frequency, 3);
    }

    #[tokio::test]
    async fn history_survives_a_reload() {
        let store = MemoryStore::new();
        {
            let history = SearchHistory::new(store.clone());
            history.record_query("shoes").await;
        }

        let history = SearchHistory::new(store);
        history.load().await;
        assert_eq!(history.recent()[0].name, "shoes");
        assert_eq!(history.hot_keywords()[0].keyword, "shoes");
    }

    #[tokio::test]
    async fn corrupt_history_starts_empty() {
        let store = MemoryStore::new();
        store.set(keys::RECENT_SEARCHES, "[broken").await.unwrap();

        let history = SearchHistory::new(store);
        history.load().await;
        assert!(history.recent().is_empty());
    }

    #[tokio::test]
    async fn blank_queries_are_not_recorded() {
        let history = SearchHistory::new(MemoryStore::new());
        history.record_query("   ").await;
        assert!(history.recent().is_empty());
        assert!(history.hot_keywords().is_empty());
    }
}
