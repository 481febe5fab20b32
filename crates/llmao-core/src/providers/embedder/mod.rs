use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn model_id(&self) -> String;
}

pub mod cached;
pub mod fake;
pub mod openai;
