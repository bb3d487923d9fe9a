//! Embedding provider: text in, unit-length vector of fixed dimension out.
//!
//! The provider is an explicitly owned service injected into the pipeline
//! (never ambient global state), so tests can substitute a stub. The HTTP
//! implementation initializes lazily: the first call probes the model once,
//! guarded so concurrent first calls trigger exactly one probe.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::EmbeddingConfig;
use crate::error::SearchError;

/// Maximum characters to send per text to the embedding API. Descriptions
/// are prose, so ~3 chars/token; 3 000 chars stays well under the context
/// window of the small sentence-embedding models this targets.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Scale a vector to unit L2 norm. Zero vectors are returned unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Text-to-vector capability used by the search pipeline.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text. Always returns exactly `dimension()` elements;
    /// whitespace-only input yields the zero vector rather than an error.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;

    /// Embed a batch of texts. Output is parallel with the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;

    fn dimension(&self) -> usize;
}

/// Embedder backed by an Ollama or OpenAI-compatible HTTP endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
    /// One-time model probe. `OnceCell` guarantees at most one concurrent
    /// initialization; after that the cell is read without synchronization.
    init: OnceCell<()>,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            init: OnceCell::new(),
        })
    }

    /// Probe the model once with a fixed input and verify the reported
    /// dimension. Failure here is fatal to the request that triggered it;
    /// the next request probes again.
    async fn ensure_initialized(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async {
                let probe = self
                    .embed_raw(&["warmup".to_string()])
                    .await
                    .context("embedding model probe failed")?;
                let dim = probe.first().map(|v| v.len()).unwrap_or(0);
                if dim != self.config.dimension {
                    anyhow::bail!(
                        "embedding model '{}' returned dimension {dim}, expected {}",
                        self.config.model,
                        self.config.dimension
                    );
                }
                tracing::info!(
                    "Embedding model '{}' ready (dimension {dim})",
                    self.config.model
                );
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Call the provider API for a batch of non-empty texts.
    async fn embed_raw(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.config.provider.as_str() {
            "ollama" => self.embed_ollama(texts).await,
            "openai" => self.embed_openai(texts).await,
            other => anyhow::bail!("Unknown embedding provider: {other}"),
        }
    }

    async fn embed_ollama(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);

        let batch_size = 32;
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(batch_size) {
            let req = OllamaEmbedRequest {
                model: self.config.model.clone(),
                input: chunk.to_vec(),
                truncate: true,
            };

            let resp = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .context("Failed to call Ollama embed API")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Ollama embed API returned {status}: {body}");
            }

            let body: OllamaEmbedResponse = resp
                .json()
                .await
                .context("Failed to parse Ollama embed response")?;

            all_embeddings.extend(body.embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let batch_size = 64;
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(batch_size) {
            let req = OpenAiEmbedRequest {
                model: self.config.model.clone(),
                input: chunk.to_vec(),
            };

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&req)
                .send()
                .await
                .context("Failed to call OpenAI embed API")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("OpenAI embed API returned {status}: {body}");
            }

            let body: OpenAiEmbedResponse = resp
                .json()
                .await
                .context("Failed to parse OpenAI embed response")?;

            let mut embeddings: Vec<Vec<f32>> =
                body.data.into_iter().map(|d| d.embedding).collect();
            all_embeddings.append(&mut embeddings);
        }

        Ok(all_embeddings)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::EmbeddingUnavailable("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Whitespace-only texts map to the zero vector without an API round
        // trip; only the non-empty ones are sent.
        let mut nonempty_idx = Vec::new();
        let mut nonempty = Vec::new();
        for (i, t) in texts.iter().enumerate() {
            if !t.trim().is_empty() {
                nonempty_idx.push(i);
                nonempty.push(truncate_for_embedding(t).to_string());
            }
        }

        let mut out = vec![vec![0.0f32; self.config.dimension]; texts.len()];

        if !nonempty.is_empty() {
            self.ensure_initialized()
                .await
                .map_err(|e| SearchError::EmbeddingUnavailable(format!("{e:#}")))?;

            let embeddings = self
                .embed_raw(&nonempty)
                .await
                .map_err(|e| SearchError::EmbeddingUnavailable(format!("{e:#}")))?;

            if embeddings.len() != nonempty.len() {
                return Err(SearchError::EmbeddingUnavailable(format!(
                    "provider returned {} embeddings for {} inputs",
                    embeddings.len(),
                    nonempty.len()
                )));
            }

            for (slot, mut embedding) in nonempty_idx.into_iter().zip(embeddings) {
                if embedding.len() != self.config.dimension {
                    return Err(SearchError::EmbeddingUnavailable(format!(
                        "provider returned dimension {}, expected {}",
                        embedding.len(),
                        self.config.dimension
                    )));
                }
                l2_normalize(&mut embedding);
                out[slot] = embedding;
            }
        }

        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's
    /// context length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "é".repeat(MAX_EMBED_CHARS); // 2 bytes per char
        let truncated = truncate_for_embedding(&text);
        assert!(truncated.len() <= MAX_EMBED_CHARS);
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_for_embedding("jazz night"), "jazz night");
    }

    #[test]
    fn test_l2_normalize_unit_norm() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
