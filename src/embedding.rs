//! Embedding backends, backend selection, and vector utilities.
//!
//! Two backends exist, modelled as the tagged enum [`Backend`]:
//! - **Local**: a deterministic hashed bag-of-tokens embedding. Needs no
//!   credentials or network and produces the same vector for the same text
//!   in every process.
//! - **Remote**: an OpenAI-compatible `POST {base_url}/embeddings` service,
//!   called in batches bounded by item count and estimated token budget.
//!
//! [`EmbeddingProvider`] wraps a backend together with its fallback policy
//! and reports which path produced the vectors through [`EmbedOutcome`].
//!
//! # Fallback
//!
//! | Choice | Credential | Remote batch fails |
//! |--------|-----------|--------------------|
//! | `remote` | required | that batch is embedded locally |
//! | `auto` | present | the whole call is re-embedded locally |
//! | `auto` | absent | local from the start |
//! | `local` | n/a | n/a |
//!
//! # Retry Strategy
//!
//! Within one remote batch:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, ... (capped at 2^5)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::EmbedError;
use crate::models::{EmbedBackend, IndexMeta};

/// Approximate characters per token, used for truncation and batch budgets.
pub const CHARS_PER_TOKEN: usize = 4;

/// Guards the cosine denominator against zero vectors.
const COSINE_EPSILON: f64 = 1e-12;

/// Backend selection policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Remote when a credential is configured, otherwise local.
    #[default]
    Auto,
    /// Remote only; fails without a credential.
    #[serde(alias = "openai")]
    Remote,
    /// Local only.
    Local,
}

/// Settings for the deterministic local backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalConfig {
    pub dims: usize,
}

/// Settings for the remote embedding service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub batch_size: usize,
    pub max_batch_tokens: usize,
    pub max_item_tokens: usize,
}

impl RemoteConfig {
    /// Builds remote settings from config, reading the credential from the
    /// environment.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| EmbedError::MissingCredentials(config.api_key_env.clone()))?;
        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            batch_size: config.batch_size.max(1),
            max_batch_tokens: config.max_batch_tokens.max(1),
            max_item_tokens: config.max_item_tokens.max(1),
        })
    }
}

/// An embedding strategy.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote(RemoteConfig),
    Local(LocalConfig),
}

impl Backend {
    pub fn kind(&self) -> EmbedBackend {
        match self {
            Backend::Remote(_) => EmbedBackend::Remote,
            Backend::Local(_) => EmbedBackend::Local,
        }
    }

    /// Reconstructs the backend that built an index, so queries land in the
    /// same vector space. `Ok(None)` for an index that was never embedded.
    pub fn for_index(
        meta: &IndexMeta,
        config: &EmbeddingConfig,
    ) -> Result<Option<Self>, EmbedError> {
        match meta.embed_backend {
            EmbedBackend::None => Ok(None),
            EmbedBackend::Local => Ok(Some(Backend::Local(LocalConfig {
                dims: meta.dims.unwrap_or(config.local_dims),
            }))),
            EmbedBackend::Remote => {
                let mut remote = RemoteConfig::from_config(config)?;
                if let Some(model) = &meta.model {
                    remote.model = model.clone();
                }
                Ok(Some(Backend::Remote(remote)))
            }
        }
    }
}

/// What to do when a remote batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Replace only the failed batch with local vectors.
    PerBatch,
    /// Recompute the whole call locally.
    WholeCall,
}

/// Which path produced a set of vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedOutcome {
    /// Every batch came back from the remote service.
    Remote { vectors: Vec<Vec<f32>>, model: String },
    /// Remote succeeded for some batches; the listed batches were embedded locally.
    PartialFallback {
        vectors: Vec<Vec<f32>>,
        model: String,
        degraded_batches: Vec<usize>,
        error: String,
    },
    /// Remote failed and the whole call was embedded locally.
    LocalFallback { vectors: Vec<Vec<f32>>, error: String },
    /// Local backend by selection.
    Local { vectors: Vec<Vec<f32>> },
}

impl EmbedOutcome {
    pub fn vectors(&self) -> &[Vec<f32>] {
        match self {
            EmbedOutcome::Remote { vectors, .. }
            | EmbedOutcome::PartialFallback { vectors, .. }
            | EmbedOutcome::LocalFallback { vectors, .. }
            | EmbedOutcome::Local { vectors } => vectors,
        }
    }

    /// Backend that owns the resulting vector space.
    pub fn backend(&self) -> EmbedBackend {
        match self {
            EmbedOutcome::Remote { .. } | EmbedOutcome::PartialFallback { .. } => {
                EmbedBackend::Remote
            }
            EmbedOutcome::LocalFallback { .. } | EmbedOutcome::Local { .. } => EmbedBackend::Local,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            EmbedOutcome::Remote { model, .. } | EmbedOutcome::PartialFallback { model, .. } => {
                Some(model.as_str())
            }
            _ => None,
        }
    }

    /// Short label for logs and reports.
    pub fn path(&self) -> &'static str {
        match self {
            EmbedOutcome::Remote { .. } => "remote",
            EmbedOutcome::PartialFallback { .. } => "remote+local-fallback",
            EmbedOutcome::LocalFallback { .. } => "local-fallback",
            EmbedOutcome::Local { .. } => "local",
        }
    }

    /// A human-readable note when a fallback happened.
    pub fn fallback_note(&self) -> Option<String> {
        match self {
            EmbedOutcome::PartialFallback {
                degraded_batches,
                error,
                ..
            } => Some(format!(
                "{} remote batch(es) embedded locally: {}",
                degraded_batches.len(),
                error
            )),
            EmbedOutcome::LocalFallback { error, .. } => {
                Some(format!("remote embedding failed, used local: {}", error))
            }
            _ => None,
        }
    }
}

/// A backend plus its fallback policy.
#[derive(Debug, Clone)]
pub struct EmbeddingProvider {
    backend: Backend,
    fallback: Fallback,
    local: LocalConfig,
}

impl EmbeddingProvider {
    /// Applies the selection policy. Forcing remote without a credential is
    /// the only hard failure.
    pub fn resolve(choice: BackendChoice, config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let local = LocalConfig {
            dims: config.local_dims,
        };
        match choice {
            BackendChoice::Local => Ok(Self::local(local)),
            BackendChoice::Remote => Ok(Self::new(
                Backend::Remote(RemoteConfig::from_config(config)?),
                Fallback::PerBatch,
                local,
            )),
            BackendChoice::Auto => match RemoteConfig::from_config(config) {
                Ok(remote) => Ok(Self::new(Backend::Remote(remote), Fallback::WholeCall, local)),
                Err(_) => Ok(Self::local(local)),
            },
        }
    }

    pub fn new(backend: Backend, fallback: Fallback, local: LocalConfig) -> Self {
        Self {
            backend,
            fallback,
            local,
        }
    }

    pub fn local(local: LocalConfig) -> Self {
        Self::new(Backend::Local(local), Fallback::WholeCall, local)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Dimension of locally computed vectors, including fallback vectors.
    pub fn local_dims(&self) -> usize {
        self.local.dims
    }

    /// Embeds `texts` in order. Remote failures degrade according to the
    /// fallback policy, so this never fails.
    pub async fn embed(&self, texts: &[String]) -> EmbedOutcome {
        let remote = match &self.backend {
            Backend::Local(local) => {
                return EmbedOutcome::Local {
                    vectors: embed_local_all(texts, local.dims),
                }
            }
            Backend::Remote(remote) => remote,
        };

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_to_tokens(t, remote.max_item_tokens))
            .collect();
        let batches = plan_batches(&truncated, remote.batch_size, remote.max_batch_tokens);
        let client = match http_client(remote) {
            Ok(client) => client,
            Err(e) => return self.degrade_all(texts, e),
        };

        let mut vectors = Vec::with_capacity(texts.len());
        let mut degraded = Vec::new();
        let mut last_error = String::new();

        for (batch_no, range) in batches.iter().enumerate() {
            let batch = &truncated[range.clone()];
            match embed_remote_batch(&client, remote, batch).await {
                Ok(batch_vectors) => vectors.extend(batch_vectors),
                Err(e) => match self.fallback {
                    Fallback::WholeCall => return self.degrade_all(texts, e),
                    Fallback::PerBatch => {
                        tracing::warn!(
                            batch = batch_no,
                            size = batch.len(),
                            error = %e,
                            "remote embedding batch failed, using local vectors for it"
                        );
                        vectors.extend(embed_local_all(&texts[range.clone()], self.local.dims));
                        degraded.push(batch_no);
                        last_error = e.to_string();
                    }
                },
            }
        }

        if !batches.is_empty() && degraded.len() == batches.len() {
            tracing::warn!(
                error = %last_error,
                "every remote batch failed, labelling the call local"
            );
            EmbedOutcome::LocalFallback {
                vectors,
                error: last_error,
            }
        } else if degraded.is_empty() {
            EmbedOutcome::Remote {
                vectors,
                model: remote.model.clone(),
            }
        } else {
            EmbedOutcome::PartialFallback {
                vectors,
                model: remote.model.clone(),
                degraded_batches: degraded,
                error: last_error,
            }
        }
    }

    fn degrade_all(&self, texts: &[String], error: EmbedError) -> EmbedOutcome {
        tracing::warn!(error = %error, "remote embedding failed, embedding locally instead");
        EmbedOutcome::LocalFallback {
            vectors: embed_local_all(texts, self.local.dims),
            error: error.to_string(),
        }
    }
}

/// Embeds a single query strictly with `backend`; no fallback.
pub async fn embed_query(backend: &Backend, text: &str) -> Result<Vec<f32>, EmbedError> {
    match backend {
        Backend::Local(local) => Ok(embed_local(text, local.dims)),
        Backend::Remote(remote) => {
            let client = http_client(remote)?;
            let input = vec![truncate_to_tokens(text, remote.max_item_tokens)];
            embed_remote_batch(&client, remote, &input)
                .await?
                .into_iter()
                .next()
                .ok_or(EmbedError::CountMismatch {
                    expected: 1,
                    got: 0,
                })
        }
    }
}

// ============ Local backend ============

/// Deterministic hashed bag-of-tokens embedding, L2-normalized.
///
/// Tokens are lower-cased alphanumeric runs. Each token's SHA-256 digest
/// selects a bucket and a sign. Text without tokens maps to the zero vector.
pub fn embed_local(text: &str, dims: usize) -> Vec<f32> {
    let dims = dims.max(1);
    let mut vector = vec![0f32; dims];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digest = Sha256::digest(token.to_lowercase().as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % dims as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn embed_local_all(texts: &[String], dims: usize) -> Vec<Vec<f32>> {
    texts.iter().map(|t| embed_local(t, dims)).collect()
}

// ============ Remote backend ============

/// Estimated token count for budget purposes.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Truncates to roughly `max_tokens` tokens, on a character boundary.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Groups consecutive texts into batches of at most `max_items` items and
/// `max_tokens` estimated tokens. A single oversized text gets its own batch.
pub fn plan_batches(texts: &[String], max_items: usize, max_tokens: usize) -> Vec<Range<usize>> {
    let max_items = max_items.max(1);
    let mut batches = Vec::new();
    let mut start = 0usize;
    let mut tokens = 0usize;
    for (i, text) in texts.iter().enumerate() {
        let cost = estimate_tokens(text);
        let count = i - start;
        if count > 0 && (count >= max_items || tokens + cost > max_tokens) {
            batches.push(start..i);
            start = i;
            tokens = 0;
        }
        tokens += cost;
    }
    if start < texts.len() {
        batches.push(start..texts.len());
    }
    batches
}

fn http_client(remote: &RemoteConfig) -> Result<reqwest::Client, EmbedError> {
    Ok(reqwest::Client::builder().timeout(remote.timeout).build()?)
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Sends one batch with retry/backoff and returns vectors in input order.
async fn embed_remote_batch(
    client: &reqwest::Client,
    remote: &RemoteConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let url = format!("{}/embeddings", remote.base_url);
    let body = serde_json::json!({
        "model": remote.model,
        "input": texts,
    });

    let mut last_err = None;

    for attempt in 0..=remote.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(&url)
            .bearer_auth(&remote.api_key)
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let parsed: EmbeddingsResponse = response
                        .json()
                        .await
                        .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;
                    return order_response(parsed, texts.len());
                }

                let body_text = response.text().await.unwrap_or_default();
                let err = EmbedError::Status {
                    status: status.as_u16(),
                    body: body_text,
                };
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(err);
                    continue;
                }
                return Err(err);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| EmbedError::InvalidResponse("no attempts made".to_string())))
}

fn order_response(
    mut parsed: EmbeddingsResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    if parsed.data.len() != expected {
        return Err(EmbedError::CountMismatch {
            expected,
            got: parsed.data.len(),
        });
    }
    let indexed = parsed.data.iter().filter(|d| d.index.is_some()).count();
    if indexed == expected {
        parsed.data.sort_by_key(|d| d.index);
        let in_range = parsed
            .data
            .iter()
            .enumerate()
            .all(|(i, d)| d.index == Some(i));
        if !in_range {
            return Err(EmbedError::InvalidResponse(
                "embedding indices are not a permutation of the input positions".to_string(),
            ));
        }
    } else if indexed > 0 {
        return Err(EmbedError::InvalidResponse(
            "only some embeddings carry an index".to_string(),
        ));
    }
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

// ============ Similarity ============

/// Cosine similarity, clamped to `[-1.0, 1.0]`.
///
/// ```text
///            a · b
/// cos(θ) = ─────────────────
///          max(‖a‖ × ‖b‖, ε)
/// ```
///
/// Returns `0.0` for vectors of different lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = (norm_a.sqrt() * norm_b.sqrt()).max(COSINE_EPSILON);
    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn local_embedding_is_deterministic() {
        let a = embed_local("Hydraulic pressure and flow", 256);
        let b = embed_local("Hydraulic pressure and flow", 256);
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[test]
    fn local_embedding_is_stable_across_processes() {
        // Pinned against a fixed hash function, not a per-process seed.
        let v = embed_local("alpha", 8);
        let nonzero: Vec<usize> = (0..8).filter(|&i| v[i] != 0.0).collect();
        assert_eq!(nonzero.len(), 1);
        assert!((v[nonzero[0]].abs() - 1.0).abs() < 1e-6);
        assert_eq!(embed_local("ALPHA", 8), v);
    }

    #[test]
    fn local_embedding_is_normalized() {
        let v = embed_local("one two three four five six", 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tokenless_text_is_zero_vector() {
        assert!(embed_local("  ... !!", 16).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_zero_and_mismatched() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn cosine_within_bounds() {
        let samples = [
            "the quick brown fox",
            "jumps over the lazy dog",
            "fox fox fox",
            "",
            "survey questions for retailers",
        ];
        for a in samples {
            for b in samples {
                let s = cosine_similarity(&embed_local(a, 32), &embed_local(b, 32));
                assert!((-1.0..=1.0).contains(&s), "{} vs {} = {}", a, b, s);
            }
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_to_tokens("abcdefghij", 2), "abcdefgh");
        assert_eq!(truncate_to_tokens("abc", 2), "abc");
        assert_eq!(truncate_to_tokens(&"é".repeat(10), 1), "éééé");
    }

    #[test]
    fn batches_bounded_by_items() {
        let t = texts(&["a", "b", "c", "d", "e"]);
        assert_eq!(plan_batches(&t, 2, 1_000), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn batches_bounded_by_tokens() {
        // 40 chars = 10 tokens each
        let t: Vec<String> = (0..5).map(|_| "x".repeat(40)).collect();
        assert_eq!(plan_batches(&t, 100, 25), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn oversized_item_gets_its_own_batch() {
        let t = vec!["x".repeat(400), "y".to_string(), "z".to_string()];
        assert_eq!(plan_batches(&t, 100, 10), vec![0..1, 1..3]);
    }

    #[test]
    fn no_batches_for_no_texts() {
        assert!(plan_batches(&[], 10, 10).is_empty());
    }

    #[tokio::test]
    async fn local_provider_preserves_order_and_count() {
        let provider = EmbeddingProvider::local(LocalConfig { dims: 32 });
        let input = texts(&["first", "second", "third"]);
        let outcome = provider.embed(&input).await;
        assert_eq!(outcome.path(), "local");
        assert_eq!(outcome.backend(), EmbedBackend::Local);
        assert_eq!(outcome.vectors().len(), 3);
        for (text, vector) in input.iter().zip(outcome.vectors()) {
            assert_eq!(vector, &embed_local(text, 32));
        }
    }

    #[test]
    fn forced_remote_without_credential_fails() {
        let config = EmbeddingConfig {
            api_key_env: "DOC_INDEX_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        let err = EmbeddingProvider::resolve(BackendChoice::Remote, &config).unwrap_err();
        assert!(matches!(err, EmbedError::MissingCredentials(_)));
    }

    #[test]
    fn auto_without_credential_is_local() {
        let config = EmbeddingConfig {
            api_key_env: "DOC_INDEX_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        let provider = EmbeddingProvider::resolve(BackendChoice::Auto, &config).unwrap();
        assert_eq!(provider.backend().kind(), EmbedBackend::Local);
    }

    #[test]
    fn index_backend_reconstruction() {
        let config = EmbeddingConfig::default();
        let meta = IndexMeta {
            embed_backend: EmbedBackend::Local,
            dims: Some(48),
            ..Default::default()
        };
        match Backend::for_index(&meta, &config).unwrap() {
            Some(Backend::Local(local)) => assert_eq!(local.dims, 48),
            other => panic!("unexpected backend: {:?}", other),
        }
        assert!(Backend::for_index(&IndexMeta::default(), &config)
            .unwrap()
            .is_none());
    }

    fn response(indices: &[Option<usize>]) -> EmbeddingsResponse {
        EmbeddingsResponse {
            data: indices
                .iter()
                .enumerate()
                .map(|(i, index)| EmbeddingDatum {
                    index: *index,
                    embedding: vec![i as f32],
                })
                .collect(),
        }
    }

    #[test]
    fn response_sorted_by_index() {
        let vectors = order_response(response(&[Some(2), Some(0), Some(1)]), 3).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![0.0]]);
    }

    #[test]
    fn response_without_indices_keeps_order() {
        let vectors = order_response(response(&[None, None]), 2).unwrap();
        assert_eq!(vectors, vec![vec![0.0], vec![1.0]]);
    }

    #[test]
    fn response_with_bad_indices_is_rejected() {
        for indices in [
            vec![Some(0), Some(0)],
            vec![Some(0), Some(5)],
            vec![Some(1), None],
        ] {
            let err = order_response(response(&indices), 2).unwrap_err();
            assert!(matches!(err, EmbedError::InvalidResponse(_)), "{:?}", indices);
        }
    }
}
