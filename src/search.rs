//! The cache-aware search loop.
//!
//! ```text
//!             ┌─────────── cached? ───────────┐
//! (file, tag) ┤                               ├─▶ SearchOutcome
//!             └─ page 1..N: render ▶ encode ▶ read ─ join ─ cache ┘
//! ```
//!
//! Pages are processed strictly in order with a fixed pause between model
//! calls. A page whose model call fails contributes nothing, so a search in
//! which every call fails caches an empty result. A page that cannot be
//! rendered aborts the search and nothing is cached.

use crate::config::FinderConfig;
use crate::drive::{sync_once, DriveClient, SyncReport};
use crate::error::FinderError;
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::vision::{PageReader, VisionReader};
use crate::pipeline::{encode, input};
use crate::present::{split_sections, NewsItem};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::store::{FileIndex, ResultCache};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

/// Text placed between the findings of consecutive pages.
pub const PAGE_JOINER: &str = "\n---\n";

/// Result of one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub file_name: String,
    pub tag: String,
    /// Joined findings; empty when nothing relevant was found.
    pub text: String,
    /// True when the text came straight from the result cache.
    pub from_cache: bool,
    /// Zero on a cache hit.
    pub total_pages: usize,
    pub pages_with_findings: usize,
    pub pages_failed: usize,
    pub duration_ms: u64,
}

impl SearchOutcome {
    /// The findings split into numbered news items.
    pub fn sections(&self) -> Vec<NewsItem> {
        split_sections(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Owns the two persistent stores and the page stages.
pub struct NewsFinder {
    config: FinderConfig,
    cache: ResultCache,
    index: FileIndex,
    renderer: Arc<dyn PageRenderer>,
    reader: Arc<dyn PageReader>,
}

impl NewsFinder {
    /// Create the cache directories and load both stores from disk.
    pub fn open(
        config: FinderConfig,
        renderer: Arc<dyn PageRenderer>,
        reader: Arc<dyn PageReader>,
    ) -> Result<Self, FinderError> {
        config.ensure_dirs()?;
        let cache = ResultCache::open(config.cache_file())?;
        let index = FileIndex::open(config.files_index_file())?;
        info!(
            "Loaded {} cached results and {} indexed files from {}",
            cache.len(),
            index.len(),
            config.cache_dir.display()
        );
        Ok(Self {
            config,
            cache,
            index,
            renderer,
            reader,
        })
    }

    /// Open with the pdfium renderer and the configured vision provider.
    pub fn from_config(config: FinderConfig) -> Result<Self, FinderError> {
        let renderer = Arc::new(PdfiumRenderer::from_config(&config));
        let reader = Arc::new(VisionReader::from_config(&config)?);
        Self::open(config, renderer, reader)
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    /// Run the once-per-session drive sync (see [`sync_once`]).
    pub async fn sync<D>(&mut self, drive: &D, force: bool) -> Result<Option<SyncReport>, FinderError>
    where
        D: DriveClient + ?Sized,
    {
        sync_once(drive, &mut self.index, &self.config, force).await
    }

    /// Search one synced file for `tag`.
    pub async fn search(&mut self, file_name: &str, tag: &str) -> Result<SearchOutcome, FinderError> {
        let started = Instant::now();
        let file_name = file_name.trim();
        let tag = tag.trim();
        if file_name.is_empty() {
            return Err(FinderError::NoFileSelected);
        }
        if tag.is_empty() {
            return Err(FinderError::EmptyTag);
        }

        let progress: ProgressCallback = self
            .config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));

        // ── Cache hit ────────────────────────────────────────────────────
        if let Some(text) = self.cache.get(file_name, tag) {
            info!("Cache hit for '{}' / '{}'", file_name, tag);
            progress.on_cache_hit(file_name, tag);
            return Ok(SearchOutcome {
                file_name: file_name.to_string(),
                tag: tag.to_string(),
                text: text.to_string(),
                from_cache: true,
                total_pages: 0,
                pages_with_findings: 0,
                pages_failed: 0,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        // ── Processing ───────────────────────────────────────────────────
        let pdf_path = self
            .index
            .get(file_name)
            .ok_or_else(|| FinderError::FileNotIndexed {
                name: file_name.to_string(),
            })?
            .to_path_buf();
        input::validate_pdf(&pdf_path)?;

        let mut document = self.renderer.open(&pdf_path).await?;
        let total_pages = document.page_count();
        info!("Searching '{}' ({} pages) for '{}'", file_name, total_pages, tag);
        progress.on_search_start(file_name, total_pages);

        let delay = Duration::from_millis(self.config.page_delay_ms);
        let mut findings: Vec<String> = Vec::new();
        let mut failures: Vec<String> = Vec::new();

        for idx in 0..total_pages {
            let page_num = idx + 1;
            if idx > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            progress.on_page_start(page_num, total_pages);

            let image = document.render_page(idx).await?;
            if idx == 0 {
                if let Some(ref preview) = self.config.preview_path {
                    if let Err(e) = encode::save_preview(&image, preview) {
                        warn!("Could not write preview: {}", e);
                    }
                }
            }
            let data = encode::encode_page(&image, page_num)?;
            drop(image);

            match self.reader.read_page(page_num, data, tag).await {
                Ok(text) => {
                    let text = text.trim();
                    progress.on_page_complete(page_num, total_pages, text.len());
                    if !text.is_empty() {
                        findings.push(text.to_string());
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    progress.on_page_error(page_num, total_pages, &e.to_string());
                    failures.push(e.to_string());
                }
            }
        }

        drop(document);
        progress.on_search_complete(total_pages, findings.len());

        // ── Done ─────────────────────────────────────────────────────────
        // Cached even when every page failed; reads the same as "nothing found".
        if total_pages > 0 && failures.len() == total_pages {
            warn!(
                "All {} pages failed for '{}'; caching an empty result. First error: {}",
                total_pages, file_name, failures[0]
            );
        }

        let text = findings.join(PAGE_JOINER);
        self.cache.insert(file_name, tag, text.as_str())?;

        let outcome = SearchOutcome {
            file_name: file_name.to_string(),
            tag: tag.to_string(),
            text,
            from_cache: false,
            total_pages,
            pages_with_findings: findings.len(),
            pages_failed: failures.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Search complete: {}/{} pages with findings, {} failed, {}ms",
            outcome.pages_with_findings, total_pages, outcome.pages_failed, outcome.duration_ms
        );
        Ok(outcome)
    }
}
