//! Index statistics and health overview.
//!
//! Provides a quick summary of what's indexed: record counts, vector
//! dimensions, the backend that produced them, and per-source breakdowns.
//! Used by `dix stats` to give confidence that ingestion worked as expected.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::index::load_index;
use crate::models::{Index, IndexMeta};

/// Per-source breakdown of chunk counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub source_path: String,
    pub chunks: usize,
    pub chars: usize,
}

/// Summary of one index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub records: usize,
    pub sources: Vec<SourceStats>,
    /// Vector length → number of records with that length.
    pub dims: BTreeMap<usize, usize>,
    pub meta: IndexMeta,
}

pub fn index_stats(index: &Index) -> IndexStats {
    let mut sources: Vec<SourceStats> = Vec::new();
    let mut dims: BTreeMap<usize, usize> = BTreeMap::new();

    for record in &index.records {
        *dims.entry(record.embedding.len()).or_default() += 1;
        match sources.iter_mut().find(|s| s.source_path == record.source_path) {
            Some(s) => {
                s.chunks += 1;
                s.chars += record.text.chars().count();
            }
            None => sources.push(SourceStats {
                source_path: record.source_path.clone(),
                chunks: 1,
                chars: record.text.chars().count(),
            }),
        }
    }
    sources.sort_by(|a, b| b.chunks.cmp(&a.chunks).then(a.source_path.cmp(&b.source_path)));

    IndexStats {
        records: index.records.len(),
        sources,
        dims,
        meta: index.meta.clone(),
    }
}

/// Run the stats command: load the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let path = &config.paths.index_path;
    let index = load_index(path)?;
    let stats = index_stats(&index);
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("doc-index — Index Stats");
    println!("=======================");
    println!();
    println!("  Index:       {}", path.display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Records:     {}", stats.records);
    println!("  Sources:     {}", stats.sources.len());
    println!("  Backend:     {}", stats.meta.embed_backend);
    if let Some(model) = &stats.meta.model {
        println!("  Model:       {}", model);
    }
    if !stats.dims.is_empty() {
        let dims = stats
            .dims
            .iter()
            .map(|(d, n)| format!("{} ({} records)", d, n))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  Dimensions:  {}", dims);
    }
    println!(
        "  Built:       {}",
        if stats.meta.created_at > 0 {
            format_ts_relative(stats.meta.created_at)
        } else {
            "never".to_string()
        }
    );
    if let Some(only_file) = &stats.meta.only_file {
        println!("  Last ingest: only {}", only_file);
    }
    if let Some(note) = &stats.meta.note {
        println!("  Note:        {}", note);
    }

    if !stats.sources.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<48} {:>8} {:>10}", "SOURCE", "CHUNKS", "CHARS");
        println!("  {}", "-".repeat(68));
        for s in &stats.sources {
            println!("  {:<48} {:>8} {:>10}", s.source_path, s.chunks, s.chars);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;
    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
