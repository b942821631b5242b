use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use tracing::debug;

use crate::{
    error::AppError,
    utils::config::{AppConfig, EmbeddingBackend},
};

/// Produces embedding vectors for queries and content items.
///
/// Provider failures and timeouts surface as [`AppError::Embedding`] so
/// callers can decide whether the call is fatal (search) or deferrable
/// (sync backfill) without inspecting transport details.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
    timeout: Duration,
}

#[derive(Clone)]
enum EmbeddingInner {
    OpenAI {
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: u32,
    },
    Hashed {
        dimension: usize,
    },
    #[cfg(any(test, feature = "test-utils"))]
    Failing,
}

impl EmbeddingProvider {
    pub fn from_config(
        config: &AppConfig,
        client: Option<Arc<Client<async_openai::config::OpenAIConfig>>>,
    ) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.embed_timeout_secs);
        match config.embedding_backend {
            EmbeddingBackend::OpenAI => {
                let client = client.ok_or_else(|| {
                    AppError::Validation(
                        "The openai embedding backend requires an OpenAI client".to_string(),
                    )
                })?;
                Ok(Self::new_openai(
                    client,
                    config.embedding_model.clone(),
                    config.embedding_dimensions,
                    timeout,
                ))
            }
            EmbeddingBackend::Hashed => {
                Ok(Self::new_hashed(config.embedding_dimensions as usize))
            }
        }
    }

    pub fn new_openai(
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: u32,
        timeout: Duration,
    ) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            },
            timeout,
        }
    }

    pub fn new_hashed(dimension: usize) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
            timeout: Duration::from_secs(1),
        }
    }

    /// Backend that fails every call, for exercising degraded paths.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_failing() -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::Failing,
            timeout: Duration::from_secs(1),
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::OpenAI { .. } => "openai",
            #[cfg(any(test, feature = "test-utils"))]
            EmbeddingInner::Failing => "failing",
        }
    }

    pub fn dimension(&self) -> usize {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => *dimension,
            EmbeddingInner::OpenAI { dimensions, .. } => *dimensions as usize,
            #[cfg(any(test, feature = "test-utils"))]
            EmbeddingInner::Failing => 0,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(hashed_embedding(text, *dimension)),
            #[cfg(any(test, feature = "test-utils"))]
            EmbeddingInner::Failing => Err(AppError::Embedding(
                "Embedding backend is configured to fail".to_string(),
            )),
            EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            } => {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input([text])
                    .dimensions(*dimensions)
                    .build()
                    .map_err(|err| AppError::Embedding(err.to_string()))?;

                let response =
                    tokio::time::timeout(self.timeout, client.embeddings().create(request))
                        .await
                        .map_err(|_| {
                            AppError::Embedding(format!(
                                "Embedding call timed out after {}s",
                                self.timeout.as_secs()
                            ))
                        })?
                        .map_err(|err| AppError::Embedding(err.to_string()))?;

                let embedding = response
                    .data
                    .first()
                    .ok_or_else(|| {
                        AppError::Embedding("No embedding data received from API".to_string())
                    })?
                    .embedding
                    .clone();

                debug!(
                    "Embedding was created with {:?} dimensions",
                    embedding.len()
                );

                Ok(embedding)
            }
        }
    }
}

// Helper functions for hashed embeddings
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    for token in tokens(text) {
        let idx = bucket(&token, dim);
        vector[idx] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_vectors_are_deterministic_and_normalized() {
        let a = hashed_embedding("rust async runtimes", 32);
        let b = hashed_embedding("rust async runtimes", 32);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);

        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_yields_a_zero_vector() {
        let vector = hashed_embedding("", 8);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn failing_backend_reports_embedding_errors() {
        let provider = EmbeddingProvider::new_failing();
        let result = provider.embed("anything").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
