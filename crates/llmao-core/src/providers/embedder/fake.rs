use super::Embedder;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Hashed bag-of-words vectors: identical texts embed identically, texts
/// sharing words land close together, and every component is non-negative.
pub struct FakeEmbedder {
    dims: usize,
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        Self { dims: 64 }
    }
}

impl FakeEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut idx = [0u8; 8];
        idx.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(idx) % self.dims as u64) as usize
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[self.bucket(&token.to_lowercase())] += 1.0;
        }
        Ok(v)
    }

    fn model_id(&self) -> String {
        format!("fake-bow-{}", self.dims)
    }
}
