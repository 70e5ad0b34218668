//! # gujarati-news-finder
//!
//! Search scanned Gujarati newspaper PDFs for a topic using a Vision
//! Language Model.
//!
//! Scanned newspapers have no text layer, and Gujarati OCR engines struggle
//! with dense multi-column newsprint. Instead each page is rasterised and
//! shown to a VLM together with the search tag; the model transcribes,
//! translates and summarises the matching items.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Google Drive folder
//!  │
//!  ├─ 1. Sync    mirror PDFs locally, record them in the file index (once per session)
//!  ├─ 2. Cache   (file, tag) already searched? return the stored findings
//!  ├─ 3. Render  rasterise page N via pdfium (spawn_blocking)
//!  ├─ 4. Encode  PNG → base64 ImageData
//!  ├─ 5. VLM     one call per page, fixed pause between calls
//!  └─ 6. Store   join page findings, write the result cache, split into items
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gujarati_news_finder::{FinderConfig, NewsFinder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = FinderConfig::default();
//!     let mut finder = NewsFinder::from_config(config)?;
//!     let outcome = finder.search("sandesh_2024-07-01.pdf", "monsoon").await?;
//!     for item in outcome.sections() {
//!         println!("News Item {}\n{}\n", item.number, item.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `news-finder` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod drive;
pub mod error;
pub mod pipeline;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod search;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FinderConfig, FinderConfigBuilder};
pub use drive::{DriveClient, DriveFile, GoogleDriveClient, SyncReport};
pub use error::{FinderError, PageError};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderedDocument};
pub use pipeline::vision::{PageReader, VisionReader};
pub use present::{split_sections, NewsItem};
pub use progress::{NoopProgressCallback, ProgressCallback, SearchProgressCallback};
pub use search::{NewsFinder, SearchOutcome};
pub use store::{FileIndex, ResultCache};
