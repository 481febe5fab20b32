use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

pub fn embed_cache_key(model_id: &str, text: &str) -> String {
    format!("emb|{}|{}", model_id, sha256_hex(text))
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> anyhow::Result<f64> {
    let af: Vec<f64> = a.iter().map(|x| *x as f64).collect();
    let bf: Vec<f64> = b.iter().map(|x| *x as f64).collect();
    cosine_similarity_f64(&af, &bf)
}

pub fn cosine_similarity_f64(a: &[f64], b: &[f64]) -> anyhow::Result<f64> {
    if a.is_empty() || a.len() != b.len() {
        anyhow::bail!(
            "embedding dims mismatch (a={}, b={})",
            a.len(),
            b.len()
        );
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 {
        anyhow::bail!("zero-norm embedding: cosine similarity undefined");
    }
    Ok(dot / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_is_one() -> anyhow::Result<()> {
        let a = vec![1.0_f32, 0.0, 0.0];
        let b = vec![1.0_f32, 0.0, 0.0];
        let s = cosine_similarity(&a, &b)?;
        assert!((s - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn cosine_orthogonal_is_zero() -> anyhow::Result<()> {
        let s = cosine_similarity(&[1.0, 0.0], &[0.0, 3.0])?;
        assert!(s.abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn zero_vector_and_dim_mismatch_fail() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_err());
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn cache_key_is_model_scoped() {
        assert_ne!(embed_cache_key("a", "x"), embed_cache_key("b", "x"));
        assert!(embed_cache_key("a", "x").starts_with("emb|a|"));
    }
}
