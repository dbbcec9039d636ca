//! Sources of item batches for the executor.

use std::collections::HashMap;
use std::future::Future;

use topicflow_shared::{ProcessingItem, Result};
use topicflow_storage::Storage;

/// Fetches the draft items of a run.
pub trait ItemLoader {
    /// Items of `run_id` in a stable order, at most `limit` of them; a limit
    /// of `0` means no limit. An unknown run yields an empty batch, not an error.
    fn load_batch(
        &self,
        run_id: i64,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<ProcessingItem>>>;
}

impl ItemLoader for Storage {
    async fn load_batch(&self, run_id: i64, limit: Option<usize>) -> Result<Vec<ProcessingItem>> {
        Storage::load_batch(self, run_id, limit).await
    }
}

/// Batches held in memory, keyed by run id.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    runs: HashMap<i64, Vec<ProcessingItem>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(mut self, run_id: i64, items: Vec<ProcessingItem>) -> Self {
        self.insert(run_id, items);
        self
    }

    /// Replace the batch for `run_id`.
    pub fn insert(&mut self, run_id: i64, items: Vec<ProcessingItem>) {
        self.runs.insert(run_id, items);
    }
}

impl ItemLoader for MemoryLoader {
    async fn load_batch(&self, run_id: i64, limit: Option<usize>) -> Result<Vec<ProcessingItem>> {
        let items = self.runs.get(&run_id).map(Vec::as_slice).unwrap_or_default();
        let take = limit.filter(|&l| l > 0).unwrap_or(items.len());
        Ok(items.iter().take(take).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::news_items;

    #[tokio::test]
    async fn memory_loader_respects_limit() {
        let loader = MemoryLoader::new().with_run(3, news_items());
        assert_eq!(loader.load_batch(3, None).await.unwrap().len(), 6);

        let sample = loader.load_batch(3, Some(2)).await.unwrap();
        let ids: Vec<i64> = sample.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(loader.load_batch(4, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_loads_everything() {
        let loader = MemoryLoader::new().with_run(3, news_items());
        assert_eq!(loader.load_batch(3, Some(0)).await.unwrap().len(), 6);

        let storage = Storage::open_in_memory().await.unwrap();
        storage.import_items(3, &news_items()).await.unwrap();
        assert_eq!(ItemLoader::load_batch(&storage, 3, Some(0)).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn storage_is_a_loader() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.import_items(9, &news_items()).await.unwrap();

        let items = ItemLoader::load_batch(&storage, 9, Some(4)).await.unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].title, "OpenAI launches new GPT model");
        assert!(items[0].text().unwrap().starts_with("OpenAI launched"));
    }
}
