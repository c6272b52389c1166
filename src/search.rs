//! Similarity search over the persisted index.
//!
//! The query is embedded with the backend recorded in the index metadata,
//! never with the process default: vectors from different backends or models
//! live in unrelated spaces. Every record whose dimension matches the query
//! vector is scored by cosine similarity (exhaustive scan); the rest are
//! skipped silently.
//!
//! Only an empty query is rejected. A missing or unreadable index, an index
//! without records, and an unavailable query backend all produce an empty
//! result list.

use anyhow::Result;
use std::cmp::Ordering;

use crate::config::Config;
use crate::embedding::{cosine_similarity, embed_query, Backend};
use crate::error::SearchError;
use crate::index::load_index;
use crate::models::{ChunkRecord, IndexMeta, SearchHit, SearchResponse};

/// Ranks the index against `query` and returns the top `top_k` hits.
pub async fn search(
    config: &Config,
    query: &str,
    top_k: usize,
) -> Result<SearchResponse, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let index = match load_index(&config.paths.index_path) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "index unreadable, returning no results");
            return Ok(empty(IndexMeta::default()));
        }
    };
    if index.is_empty() {
        return Ok(empty(index.meta));
    }

    let backend = match Backend::for_index(&index.meta, &config.embedding) {
        Ok(Some(backend)) => backend,
        Ok(None) => return Ok(empty(index.meta)),
        Err(e) => {
            tracing::warn!(error = %e, backend = %index.meta.embed_backend, "cannot embed query");
            return Ok(empty(index.meta));
        }
    };

    let query_vector = match embed_query(&backend, query).await {
        Ok(vector) => vector,
        Err(e) => {
            tracing::warn!(
                error = %e,
                backend = %index.meta.embed_backend,
                "query embedding failed"
            );
            return Ok(empty(index.meta));
        }
    };

    let results = rank(&index.records, &query_vector, top_k);
    tracing::debug!(
        candidates = index.records.len(),
        returned = results.len(),
        "search complete"
    );
    Ok(SearchResponse {
        results,
        meta: index.meta,
    })
}

fn empty(meta: IndexMeta) -> SearchResponse {
    SearchResponse {
        results: Vec::new(),
        meta,
    }
}

/// Scores dimension-compatible records and keeps the best `top_k`.
///
/// Ties keep index order. `top_k` is clamped to at least 1.
pub fn rank(records: &[ChunkRecord], query_vector: &[f32], top_k: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = records
        .iter()
        .filter(|r| r.embedding.len() == query_vector.len())
        .map(|r| SearchHit {
            source_path: r.source_path.clone(),
            chunk_index: r.chunk_index,
            text: r.text.clone(),
            score: cosine_similarity(query_vector, &r.embedding),
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(top_k.max(1));
    hits
}

/// CLI entry point for `dix search`.
pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let response = search(config, query, top_k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in response.results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} #{}",
            i + 1,
            hit.score,
            hit.source_path,
            hit.chunk_index
        );
        println!("    excerpt: \"{}\"", excerpt(&hit.text, 200));
        println!();
    }
    match &response.meta.model {
        Some(model) => println!("backend: {} ({})", response.meta.embed_backend, model),
        None => println!("backend: {}", response.meta.embed_backend),
    }
    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat.to_string(),
    }
}
