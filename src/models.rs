//! Core data models: the persisted index, its records, and search hits.
//!
//! The on-disk format is the serde JSON form of [`Index`]. Legacy key
//! spellings (`chunks`, `openai_model`, `"openai"`) are accepted on read.

use serde::{Deserialize, Serialize};

/// Which embedding backend produced the vectors stored in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedBackend {
    #[serde(alias = "openai")]
    Remote,
    Local,
    #[default]
    None,
}

impl EmbedBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedBackend::Remote => "remote",
            EmbedBackend::Local => "local",
            EmbedBackend::None => "none",
        }
    }
}

impl std::fmt::Display for EmbedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded chunk of one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    /// Path relative to the documents directory, `/`-separated.
    pub source_path: String,
    pub chunk_index: usize,
    pub text: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Build metadata stored alongside the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IndexMeta {
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub embed_backend: EmbedBackend,
    #[serde(default, alias = "openai_model")]
    pub model: Option<String>,
    #[serde(default)]
    pub only_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl IndexMeta {
    /// Returns a copy carrying an informational note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The persisted collection of records plus build metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Index {
    #[serde(default)]
    pub meta: IndexMeta,
    #[serde(default, alias = "chunks")]
    pub records: Vec<ChunkRecord>,
}

impl Index {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub source_path: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f64,
}

/// Ranked hits plus the metadata of the index they were drawn from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub meta: IndexMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_keys_are_accepted() {
        let json = r#"{
            "meta": {"created_at": 10, "count": 1, "embed_backend": "openai",
                     "openai_model": "text-embedding-3-small", "only_file": null},
            "chunks": [{"id": "a", "source_path": "x.md", "chunk_index": 0,
                        "text": "hi", "embedding": [0.5, 0.5]}]
        }"#;
        let index: Index = serde_json::from_str(json).unwrap();
        assert_eq!(index.meta.embed_backend, EmbedBackend::Remote);
        assert_eq!(index.meta.model.as_deref(), Some("text-embedding-3-small"));
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.records[0].embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn canonical_names_on_write() {
        let index = Index {
            meta: IndexMeta {
                embed_backend: EmbedBackend::Local,
                ..Default::default()
            },
            records: Vec::new(),
        };
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.contains("\"records\""));
        assert!(json.contains("\"embed_backend\":\"local\""));
        assert!(!json.contains("\"note\""));
    }

    #[test]
    fn missing_meta_defaults_to_none_backend() {
        let index: Index = serde_json::from_str("{}").unwrap();
        assert_eq!(index.meta.embed_backend, EmbedBackend::None);
        assert_eq!(index.meta.count, 0);
        assert!(index.is_empty());
    }
}
