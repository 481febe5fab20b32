use crate::providers::embedder::Embedder;
use std::sync::Arc;

pub mod util;

/// Semantic similarity between two texts: embed each independently and
/// take the cosine. Fails on a zero-norm embedding rather than guessing.
#[derive(Clone)]
pub struct Similarity {
    embedder: Arc<dyn Embedder>,
}

impl Similarity {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub async fn cosine(&self, a: &str, b: &str) -> anyhow::Result<f64> {
        let va = self.embedder.embed(a).await?;
        let vb = self.embedder.embed(b).await?;
        util::cosine_similarity(&va, &vb)
    }

    pub fn model_id(&self) -> String {
        self.embedder.model_id()
    }
}
