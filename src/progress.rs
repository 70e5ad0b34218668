//! Progress-callback trait for per-page search events.
//!
//! Inject an [`Arc<dyn SearchProgressCallback>`] via
//! [`crate::config::FinderConfigBuilder::progress_callback`] to receive
//! events while the search loop walks a newspaper page by page. The CLI
//! forwards them to an indicatif progress bar; library callers can forward
//! them anywhere.
//!
//! # Example
//!
//! ```rust
//! use gujarati_news_finder::{FinderConfig, SearchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl SearchProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, findings_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, findings_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = FinderConfig::builder()
//!     .progress_callback(counter as Arc<dyn SearchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the search loop as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed strictly in order, so events
/// for page N+1 never precede the completion event for page N.
pub trait SearchProgressCallback: Send + Sync {
    /// Called when the `(file, tag)` pair was already cached. No other event
    /// follows.
    fn on_cache_hit(&self, file_name: &str, tag: &str) {
        let _ = (file_name, tag);
    }

    /// Called once the page count is known, before the first page renders.
    fn on_search_start(&self, file_name: &str, total_pages: usize) {
        let _ = (file_name, total_pages);
    }

    /// Called just before a page is rendered.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when the model answered for a page.
    ///
    /// `findings_len` is the byte length of the trimmed answer; zero means
    /// nothing relevant was found on that page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, findings_len: usize) {
        let _ = (page_num, total_pages, findings_len);
    }

    /// Called when the model call for a page failed. The search continues.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`: pages in the document
    /// * `pages_with_findings`: pages whose answer was non-empty
    fn on_search_complete(&self, total_pages: usize, pages_with_findings: usize) {
        let _ = (total_pages, pages_with_findings);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SearchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FinderConfig`].
pub type ProgressCallback = Arc<dyn SearchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        hits: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SearchProgressCallback for TrackingCallback {
        fn on_cache_hit(&self, _file: &str, _tag: &str) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_cache_hit("a.pdf", "rain");
        cb.on_search_start("a.pdf", 5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 42);
        cb.on_page_error(2, 5, "some error");
        cb.on_search_complete(5, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "VLM timeout");
        tracker.on_cache_hit("b.pdf", "cricket");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.hits.load(Ordering::SeqCst), 1);
    }
}
