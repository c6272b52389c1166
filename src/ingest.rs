//! Ingestion pipeline orchestration.
//!
//! Coordinates the indexing flow: discovery → extraction → chunking →
//! embedding → merge → atomic persist.
//!
//! A **full** ingest rebuilds the index from every supported file under the
//! documents directory. A **filtered** ingest (`only_file`) re-embeds just
//! the matching file(s) and merges them into the existing index; records of
//! every other source are carried over untouched, vectors included.
//!
//! All ingests against one index path are serialized by
//! [`crate::index::write_lock`].

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::{
    Backend, BackendChoice, EmbedOutcome, EmbeddingProvider, Fallback, LocalConfig,
};
use crate::extract::{extract, is_supported};
use crate::index::{load_index, persist_index, write_lock};
use crate::jobs::JobStore;
use crate::models::{ChunkRecord, EmbedBackend, Index, IndexMeta};
use crate::progress::{IngestProgressEvent, NoProgress, ProgressMode, ProgressReporter};

/// A document found under the documents directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the documents directory, `/`-separated.
    pub source_path: String,
}

impl SourceFile {
    fn file_name(&self) -> &str {
        self.source_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_path)
    }

    fn matches(&self, only_file: &str) -> bool {
        self.source_path == only_file || self.file_name() == only_file
    }
}

/// A file that contributed no records, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub source_path: String,
    pub reason: String,
}

/// Result of one ingest call, with enough detail for CLI output.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub meta: IndexMeta,
    pub files_processed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Which embedding path produced the new vectors; `None` when nothing
    /// was embedded.
    pub embed_path: Option<&'static str>,
}

impl IngestReport {
    fn unchanged(meta: IndexMeta) -> Self {
        Self {
            meta,
            files_processed: 0,
            skipped: Vec::new(),
            embed_path: None,
        }
    }
}

/// Runs ingestions against one configured index.
#[derive(Clone)]
pub struct Indexer {
    config: Arc<Config>,
    progress: Arc<dyn ProgressReporter>,
}

impl Indexer {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress = Arc::from(reporter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingests documents and returns the metadata of the resulting index.
    ///
    /// With `only_file`, only matching sources are rebuilt. With
    /// `backend_override`, that choice wins over both the configured backend
    /// and the backend recorded in an existing index.
    pub async fn ingest(
        &self,
        only_file: Option<&str>,
        backend_override: Option<BackendChoice>,
    ) -> Result<IndexMeta> {
        Ok(self.ingest_with_report(only_file, backend_override).await?.meta)
    }

    pub async fn ingest_with_report(
        &self,
        only_file: Option<&str>,
        backend_override: Option<BackendChoice>,
    ) -> Result<IngestReport> {
        let index_path = self.config.paths.index_path.clone();
        let lock = write_lock(&index_path);
        let _guard = lock.lock().await;

        match only_file.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => self.ingest_filtered(name, backend_override).await,
            None => self.ingest_full(backend_override).await,
        }
    }

    /// Starts an ingestion in the background and returns its job id.
    ///
    /// The ingestion runs in its own task; an error or a panic inside it
    /// marks the job `error`.
    pub fn spawn_ingest(
        &self,
        jobs: &JobStore,
        only_file: Option<String>,
        backend_override: Option<BackendChoice>,
    ) -> String {
        let job_id = jobs.create(only_file.clone());
        let indexer = self.clone();
        let jobs = jobs.clone();
        let id = job_id.clone();

        tokio::spawn(async move {
            let task = tokio::spawn(async move {
                indexer.ingest(only_file.as_deref(), backend_override).await
            });
            match task.await {
                Ok(Ok(meta)) => {
                    tracing::info!(job_id = %id, count = meta.count, "ingest job finished");
                    jobs.mark_done(&id, meta);
                }
                Ok(Err(e)) => {
                    tracing::warn!(job_id = %id, error = %format!("{:#}", e), "ingest job failed");
                    jobs.mark_error(&id, format!("{:#}", e));
                }
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "ingest job aborted");
                    jobs.mark_error(&id, format!("ingest task failed: {}", e));
                }
            }
        });

        job_id
    }

    async fn ingest_full(&self, backend_override: Option<BackendChoice>) -> Result<IngestReport> {
        let choice = backend_override.unwrap_or(self.config.embedding.backend);
        let provider = EmbeddingProvider::resolve(choice, &self.config.embedding)?;

        let files = self.discover()?;
        let (records, skipped) = self.build_records(files).await?;
        let files_processed = count_sources(&records);

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let outcome = self.embed(&provider, &texts).await;
        let records = attach_vectors(records, &outcome)?;

        let meta = build_meta(&outcome, &provider, records.len(), None);
        let index = Index { meta, records };
        persist_index(&self.config.paths.index_path, &index)?;

        tracing::info!(
            records = index.records.len(),
            files = files_processed,
            skipped = skipped.len(),
            backend = %index.meta.embed_backend,
            path = outcome.path(),
            "full ingest complete"
        );

        Ok(IngestReport {
            meta: index.meta,
            files_processed,
            skipped,
            embed_path: Some(outcome.path()),
        })
    }

    async fn ingest_filtered(
        &self,
        only_file: &str,
        backend_override: Option<BackendChoice>,
    ) -> Result<IngestReport> {
        let index_path = &self.config.paths.index_path;
        let existing = load_index(index_path)?;

        if !is_supported(Path::new(only_file)) {
            tracing::info!(only_file, "filtered ingest skipped: unsupported format");
            let meta = current_meta(&existing)
                .with_note(format!("only_file '{}' has an unsupported format", only_file));
            return Ok(IngestReport::unchanged(meta));
        }

        let files: Vec<SourceFile> = self
            .discover()?
            .into_iter()
            .filter(|f| f.matches(only_file))
            .collect();
        if files.is_empty() {
            tracing::info!(only_file, "filtered ingest skipped: file not found");
            let meta =
                current_meta(&existing).with_note(format!("only_file '{}' not found", only_file));
            return Ok(IngestReport::unchanged(meta));
        }

        let provider = match self.filtered_provider(&existing.meta, backend_override)? {
            Some(provider) => provider,
            None => {
                let meta = current_meta(&existing).with_note(format!(
                    "index backend '{}' unavailable; only_file '{}' not ingested",
                    existing.meta.embed_backend, only_file
                ));
                return Ok(IngestReport::unchanged(meta));
            }
        };
        if existing.meta.embed_backend != EmbedBackend::None
            && existing.meta.embed_backend != provider.backend().kind()
        {
            tracing::warn!(
                index_backend = %existing.meta.embed_backend,
                new_backend = %provider.backend().kind(),
                "filtered ingest uses a different backend than the existing index"
            );
        }

        let replaced: Vec<String> = files.iter().map(|f| f.source_path.clone()).collect();
        let (fresh, skipped) = self.build_records(files).await?;
        let files_processed = count_sources(&fresh);

        let texts: Vec<String> = fresh.iter().map(|r| r.text.clone()).collect();
        let outcome = self.embed(&provider, &texts).await;
        let fresh = attach_vectors(fresh, &outcome)?;

        let mut records: Vec<ChunkRecord> = existing
            .records
            .into_iter()
            .filter(|r| !replaced.contains(&r.source_path) && r.source_path != only_file)
            .collect();
        let kept = records.len();
        records.extend(fresh);

        let mut meta = build_meta(&outcome, &provider, records.len(), Some(only_file));
        let pinned = backend_override.is_none()
            && kept > 0
            && existing.meta.embed_backend != EmbedBackend::None;
        if pinned {
            // Kept records stay searchable only under the index's own backend.
            if meta.embed_backend != existing.meta.embed_backend {
                tracing::warn!(
                    index_backend = %existing.meta.embed_backend,
                    path = outcome.path(),
                    "new vectors fell back to another backend; index keeps its recorded backend"
                );
            }
            meta.embed_backend = existing.meta.embed_backend;
            meta.model = existing.meta.model.clone();
            meta.dims = existing.meta.dims.or(meta.dims);
        } else if meta.dims.is_none() {
            meta.dims = existing.meta.dims;
        }
        let index = Index { meta, records };
        persist_index(index_path, &index)?;

        tracing::info!(
            only_file,
            kept,
            added = index.records.len() - kept,
            backend = %index.meta.embed_backend,
            path = outcome.path(),
            "filtered ingest complete"
        );

        Ok(IngestReport {
            meta: index.meta,
            files_processed,
            skipped,
            embed_path: Some(outcome.path()),
        })
    }

    /// Backend for a filtered ingest: the override if given, otherwise the
    /// backend recorded in the index, otherwise the configured choice.
    ///
    /// `None` when the index records a backend that cannot be used now.
    fn filtered_provider(
        &self,
        meta: &IndexMeta,
        backend_override: Option<BackendChoice>,
    ) -> Result<Option<EmbeddingProvider>> {
        let embedding = &self.config.embedding;
        if let Some(choice) = backend_override {
            return Ok(Some(EmbeddingProvider::resolve(choice, embedding)?));
        }
        let local = LocalConfig {
            dims: embedding.local_dims,
        };
        match Backend::for_index(meta, embedding) {
            Ok(Some(Backend::Local(recorded))) => Ok(Some(EmbeddingProvider::local(recorded))),
            Ok(Some(remote @ Backend::Remote(_))) => Ok(Some(EmbeddingProvider::new(
                remote,
                Fallback::PerBatch,
                local,
            ))),
            Ok(None) => Ok(Some(EmbeddingProvider::resolve(
                embedding.backend,
                embedding,
            )?)),
            Err(e) => {
                tracing::warn!(
                    backend = %meta.embed_backend,
                    error = %e,
                    "index backend unavailable; filtered ingest skipped"
                );
                Ok(None)
            }
        }
    }

    /// Walks the documents directory in sorted order, honoring exclude globs.
    pub fn discover(&self) -> Result<Vec<SourceFile>> {
        let root = &self.config.paths.docs_dir;
        if !root.is_dir() {
            bail!("Documents directory does not exist: {}", root.display());
        }
        self.progress.report(IngestProgressEvent::Discovering {
            root: root.display().to_string(),
        });

        let mut excludes = vec!["**/.git/**".to_string()];
        excludes.extend(self.config.paths.exclude_globs.iter().cloned());
        let exclude_set = build_globset(&excludes)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let source_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if exclude_set.is_match(&source_path) {
                tracing::debug!(source_path, "excluded by glob");
                continue;
            }
            files.push(SourceFile {
                path: path.to_path_buf(),
                source_path,
            });
        }
        files.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(files)
    }

    /// Extracts and chunks files into records without embeddings.
    async fn build_records(
        &self,
        files: Vec<SourceFile>,
    ) -> Result<(Vec<ChunkRecord>, Vec<SkippedFile>)> {
        let size = self.config.chunking.size;
        let overlap = self.config.chunking.overlap;
        let progress = self.progress.clone();

        tokio::task::spawn_blocking(move || {
            let total = files.len() as u64;
            let mut records = Vec::new();
            let mut skipped = Vec::new();

            for (n, file) in files.into_iter().enumerate() {
                progress.report(IngestProgressEvent::Extracting {
                    n: n as u64 + 1,
                    total,
                });
                if !is_supported(&file.path) {
                    tracing::debug!(source_path = %file.source_path, "unsupported format");
                    skipped.push(SkippedFile {
                        source_path: file.source_path,
                        reason: "unsupported format".to_string(),
                    });
                    continue;
                }

                let text = extract(&file.path);
                let chunks = chunk_text(&text, size, overlap);
                if chunks.is_empty() {
                    tracing::debug!(source_path = %file.source_path, "no extractable text");
                    skipped.push(SkippedFile {
                        source_path: file.source_path,
                        reason: "no extractable text".to_string(),
                    });
                    continue;
                }

                for (chunk_index, text) in chunks.into_iter().enumerate() {
                    records.push(ChunkRecord {
                        id: Uuid::new_v4().to_string(),
                        source_path: file.source_path.clone(),
                        chunk_index,
                        text,
                        embedding: Vec::new(),
                    });
                }
            }
            (records, skipped)
        })
        .await
        .context("extraction task failed")
    }

    async fn embed(&self, provider: &EmbeddingProvider, texts: &[String]) -> EmbedOutcome {
        self.progress.report(IngestProgressEvent::Embedding {
            texts: texts.len() as u64,
        });
        provider.embed(texts).await
    }
}

fn attach_vectors(
    mut records: Vec<ChunkRecord>,
    outcome: &EmbedOutcome,
) -> Result<Vec<ChunkRecord>> {
    let vectors = outcome.vectors();
    if vectors.len() != records.len() {
        bail!(
            "embedding count mismatch: {} records, {} vectors",
            records.len(),
            vectors.len()
        );
    }
    for (record, vector) in records.iter_mut().zip(vectors) {
        record.embedding = vector.clone();
    }
    Ok(records)
}

fn build_meta(
    outcome: &EmbedOutcome,
    provider: &EmbeddingProvider,
    count: usize,
    only_file: Option<&str>,
) -> IndexMeta {
    let embed_backend = outcome.backend();
    let dims = dominant_dims(outcome.vectors()).or(match embed_backend {
        EmbedBackend::Local => Some(provider.local_dims()),
        _ => None,
    });
    IndexMeta {
        created_at: chrono::Utc::now().timestamp(),
        count,
        embed_backend,
        model: outcome.model().map(str::to_string),
        only_file: only_file.map(str::to_string),
        dims,
        note: outcome.fallback_note(),
    }
}

/// Most common vector length. Partial fallback can mix remote and local
/// dimensions; the majority is the index's own space.
fn dominant_dims(vectors: &[Vec<f32>]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for v in vectors {
        *counts.entry(v.len()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(dims, _)| dims)
}

/// Existing metadata with `count` reconciled against the records.
fn current_meta(index: &Index) -> IndexMeta {
    let mut meta = index.meta.clone();
    meta.count = index.records.len();
    meta
}

fn count_sources(records: &[ChunkRecord]) -> usize {
    let mut sources: Vec<&str> = records.iter().map(|r| r.source_path.as_str()).collect();
    sources.dedup();
    sources.len()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// CLI entry point for `dix ingest`.
pub async fn run_ingest(
    config: &Config,
    only_file: Option<String>,
    backend: Option<BackendChoice>,
    progress: ProgressMode,
) -> Result<()> {
    let indexer = Indexer::new(Arc::new(config.clone())).with_progress(progress.reporter());
    let report = indexer
        .ingest_with_report(only_file.as_deref(), backend)
        .await?;
    let meta = &report.meta;

    match &only_file {
        Some(name) => println!("ingest {}", name),
        None => println!("ingest {}", config.paths.docs_dir.display()),
    }
    println!("  files processed: {}", report.files_processed);
    for skipped in &report.skipped {
        println!("  skipped: {} ({})", skipped.source_path, skipped.reason);
    }
    println!("  records: {}", meta.count);
    match (&meta.model, meta.dims) {
        (Some(model), _) => println!("  backend: {} ({})", meta.embed_backend, model),
        (None, Some(dims)) => println!("  backend: {} ({} dims)", meta.embed_backend, dims),
        (None, None) => println!("  backend: {}", meta.embed_backend),
    }
    if let Some(path) = report.embed_path {
        println!("  embedding path: {}", path);
    }
    if let Some(note) = &meta.note {
        println!("  note: {}", note);
    }
    println!("  index: {}", config.paths.index_path.display());
    println!("ok");
    Ok(())
}
