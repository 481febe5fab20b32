use super::Embedder;
use crate::embeddings::util::embed_cache_key;
use async_trait::async_trait;
use moka::sync::Cache;
use std::sync::Arc;

/// Memoises embeddings per (model, text). Answer relevancy embeds the user
/// question once per synthetic question; this keeps that to one call.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, max_entries: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_entries),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let key = embed_cache_key(&self.inner.model_id(), text);
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(event = "llmao.embed.cache_hit", key = %key);
            return Ok(hit.as_ref().clone());
        }
        let v = self.inner.embed(text).await?;
        self.cache.insert(key, Arc::new(v.clone()));
        Ok(v)
    }

    fn model_id(&self) -> String {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting(AtomicU32);

    #[async_trait]
    impl Embedder for Counting {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 2.0])
        }
        fn model_id(&self) -> String {
            "counting".into()
        }
    }

    #[tokio::test]
    async fn repeated_text_embeds_once() -> anyhow::Result<()> {
        let inner = Arc::new(Counting(AtomicU32::new(0)));
        let cached = CachedEmbedder::new(inner.clone(), 16);
        cached.embed("Tell me about the sky.").await?;
        cached.embed("Tell me about the sky.").await?;
        cached.embed("Describe nature.").await?;
        assert_eq!(inner.0.load(Ordering::SeqCst), 2);
        assert_eq!(cached.entry_count(), 2);
        Ok(())
    }
}
