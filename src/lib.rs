//! # doc-index
//!
//! Document indexing and similarity retrieval.
//!
//! doc-index extracts text from heterogeneous documents (plain text,
//! Markdown, HTML, PDF, DOCX), splits it into overlapping paragraph-aware
//! chunks, embeds the chunks through a remote or deterministic local backend,
//! and persists everything as one JSON index. Queries are embedded with the
//! same backend that built the index and ranked by cosine similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌───────────┐   ┌────────────┐
//! │  Extract  │──▶│  Chunk  │──▶│   Embed   │──▶│ JSON index │
//! │ txt/html/ │   │ windows │   │ remote or │   │ tmp+rename │
//! │ pdf/docx  │   └─────────┘   │   local   │   └─────┬──────┘
//! └───────────┘                 └───────────┘         │
//!                                  ┌──────────────────┤
//!                                  ▼                  ▼
//!                             ┌──────────┐      ┌──────────┐
//!                             │   CLI    │      │   HTTP   │
//!                             │  (dix)   │      │ + jobs   │
//!                             └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dix ingest                       # index ./docs into ./data/index.json
//! dix ingest --only-file guide.md  # re-embed one document
//! dix search "pump maintenance" --top-k 3
//! dix serve                        # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Index, record, and search result types |
//! | [`error`] | Typed errors for extraction, embedding, and search |
//! | [`extract`] | Multi-format text extraction |
//! | [`chunk`] | Paragraph-aware sliding-window chunking |
//! | [`embedding`] | Remote and local embedding backends |
//! | [`index`] | Atomic index persistence and writer locks |
//! | [`ingest`] | Full and filtered ingestion |
//! | [`jobs`] | Background ingestion job registry |
//! | [`search`] | Cosine-similarity ranking |
//! | [`progress`] | Ingest progress reporting |
//! | [`stats`] | Index statistics |
//! | [`server`] | JSON HTTP server |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod jobs;
pub mod models;
pub mod progress;
pub mod search;
pub mod server;
pub mod stats;
