//! Configuration types for the news finder.
//!
//! Everything the sync step and the search loop need is carried by
//! [`FinderConfig`], built via its [`FinderConfigBuilder`]. The CLI maps its
//! flags onto the builder; library callers set only what they care about and
//! rely on the defaults for the rest.

use crate::error::FinderError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Name of the drive folder that holds the newspaper PDFs.
pub const DEFAULT_FOLDER_NAME: &str = "GujaratiNewsFinder";

/// Directory name created under the system temp dir for all local state.
pub const DEFAULT_CACHE_DIR_NAME: &str = "gujarati_news_finder";

/// File name of the `(file, tag) → result` cache.
pub const CACHE_FILE_NAME: &str = "processed_cache.json";

/// File name of the `display name → local path` index.
pub const FILES_INDEX_NAME: &str = "files_index.json";

/// Default model when OpenAI is picked without an explicit model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Google Drive REST endpoint root.
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";

/// Configuration for syncing and searching.
///
/// # Example
/// ```rust
/// use gujarati_news_finder::FinderConfig;
///
/// let config = FinderConfig::builder()
///     .cache_dir("/tmp/news")
///     .page_delay_ms(500)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert!(config.cache_file().ends_with("processed_cache.json"));
/// ```
#[derive(Clone)]
pub struct FinderConfig {
    /// Root directory for the cache file, the file index and mirrored PDFs.
    /// Default: `<system temp>/gujarati_news_finder`.
    pub cache_dir: PathBuf,

    /// Remote folder name searched for (and created if absent) during sync.
    pub folder_name: String,

    /// OAuth bearer token for Google Drive. Sync is unavailable without it.
    pub drive_token: Option<String>,

    /// Base URL of the Drive REST API. Overridable for proxies and tests.
    pub drive_api_base: String,

    /// HTTP timeout applied to each drive request, in seconds. Default: 300.
    pub download_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4o". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 2048.
    pub max_tokens: usize,

    /// Longest edge of a rendered page, in pixels. Default: 2000.
    ///
    /// Broadsheet pages are large; capping the edge keeps one page image
    /// within the provider's upload limits while small Gujarati print stays
    /// legible.
    pub max_rendered_pixels: u32,

    /// Fixed pause between consecutive model calls, in ms. Default: 1000.
    pub page_delay_ms: u64,

    /// Per-page model call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in newspaper prompt.
    pub system_prompt: Option<String>,

    /// Write the first rendered page of each uncached search here as PNG.
    pub preview_path: Option<PathBuf>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME),
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            drive_token: None,
            drive_api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            download_timeout_secs: 300,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 2048,
            max_rendered_pixels: 2000,
            page_delay_ms: 1000,
            api_timeout_secs: 120,
            password: None,
            system_prompt: None,
            preview_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("cache_dir", &self.cache_dir)
            .field("folder_name", &self.folder_name)
            .field("drive_token", &self.drive_token.as_ref().map(|_| "<redacted>"))
            .field("drive_api_base", &self.drive_api_base)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("preview_path", &self.preview_path)
            .finish()
    }
}

impl FinderConfig {
    /// Create a new builder for `FinderConfig`.
    pub fn builder() -> FinderConfigBuilder {
        FinderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the persisted result cache.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }

    /// Path of the persisted file index.
    pub fn files_index_file(&self) -> PathBuf {
        self.cache_dir.join(FILES_INDEX_NAME)
    }

    /// Directory the synced PDFs are mirrored into.
    pub fn pdf_dir(&self) -> PathBuf {
        self.cache_dir.join("pdfs")
    }

    /// Create the cache directory and the PDF mirror directory.
    pub fn ensure_dirs(&self) -> Result<(), FinderError> {
        let pdf_dir = self.pdf_dir();
        std::fs::create_dir_all(&pdf_dir).map_err(|e| FinderError::StoreWrite {
            path: pdf_dir,
            source: e,
        })
    }
}

/// Builder for [`FinderConfig`].
#[derive(Debug)]
pub struct FinderConfigBuilder {
    config: FinderConfig,
}

impl FinderConfigBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn folder_name(mut self, name: impl Into<String>) -> Self {
        self.config.folder_name = name.into();
        self
    }

    pub fn drive_token(mut self, token: impl Into<String>) -> Self {
        self.config.drive_token = Some(token.into());
        self
    }

    pub fn drive_api_base(mut self, base: impl Into<String>) -> Self {
        self.config.drive_api_base = base.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn page_delay_ms(mut self, ms: u64) -> Self {
        self.config.page_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn preview_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.preview_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FinderConfig, FinderError> {
        let c = &self.config;
        if c.folder_name.trim().is_empty() {
            return Err(FinderError::InvalidConfig(
                "Drive folder name must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(FinderError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(FinderError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
