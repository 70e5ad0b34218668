//! CLI binary for gujarati-news-finder.
//!
//! A thin shim over the library crate: maps flags to `FinderConfig`, runs
//! the drive sync and the search loop, and prints the news items.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gujarati_news_finder::config::DEFAULT_FOLDER_NAME;
use gujarati_news_finder::present::render_markdown;
use gujarati_news_finder::{
    FileIndex, FinderConfig, GoogleDriveClient, NewsFinder, ProgressCallback, ResultCache,
    SearchOutcome, SearchProgressCallback, SyncReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a page bar plus one log line per page.
///
/// Nothing is drawn until the search starts reading pages, so the file
/// picker and tag prompt stay clean.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Self::with_bar(ProgressBar::new(0))
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Stop ticking and erase the bar; used when a search fails.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SearchProgressCallback for CliProgressCallback {
    fn on_cache_hit(&self, file_name: &str, _tag: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} cached result for {}", cyan("◆"), bold(file_name));
    }

    fn on_search_start(&self, file_name: &str, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Searching");
        self.bar.reset_eta();
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing file: {file_name} ({total_pages} pages)"))
        ));
    }

    fn on_page_start(&self, page_num: usize, total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar
            .set_message(format!("Processing page {page_num} of {total}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, findings_len: usize) {
        let what = if findings_len == 0 {
            dim("nothing relevant")
        } else {
            format!("{findings_len} chars of findings")
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<24}  {}",
            green("✓"),
            page_num,
            total,
            what,
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_search_complete(&self, total_pages: usize, pages_with_findings: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} pages read, {} with relevant news",
                green("✔"),
                bold(&total_pages.to_string()),
                bold(&pages_with_findings.to_string())
            );
        } else {
            eprintln!(
                "{} {} pages read, {} with relevant news  ({} failed)",
                if failed == total_pages { red("✘") } else { cyan("⚠") },
                bold(&total_pages.to_string()),
                bold(&pages_with_findings.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Mirror the GujaratiNewsFinder drive folder locally
  GOOGLE_DRIVE_TOKEN=ya29... news-finder sync

  # Pick a file and enter a tag interactively
  news-finder search

  # Non-interactive search
  news-finder search --file sandesh_2024-07-01.pdf --tag "ચોમાસું"

  # Save the first page image while searching
  news-finder search -f sandesh.pdf -t cricket --preview page1.png

  # JSON output
  news-finder --json search -f sandesh.pdf -t cricket > result.json

ADDING FILES:
  1. Open your Google Drive
  2. Navigate to the 'GujaratiNewsFinder' folder
  3. Upload your PDF files there
  4. Run `news-finder sync --force` to pick up the new files

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (default provider)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  GOOGLE_DRIVE_TOKEN      OAuth access token with drive scope
  NEWS_FINDER_CACHE_DIR   Where the cache, file index and PDFs live
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Search Gujarati newspaper PDFs from Google Drive with a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "news-finder",
    version,
    about = "ગુજરાતી સમાચાર શોધક: search Gujarati newspapers with a Vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for the result cache, file index and mirrored PDFs.
    #[arg(long, global = true, env = "NEWS_FINDER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Google Drive folder holding the newspapers.
    #[arg(long, global = true, env = "NEWS_FINDER_FOLDER", default_value = DEFAULT_FOLDER_NAME)]
    folder: String,

    /// Google Drive OAuth access token.
    #[arg(long, global = true, env = "GOOGLE_DRIVE_TOKEN", hide_env_values = true)]
    drive_token: Option<String>,

    /// LLM model ID (e.g. gpt-4o, gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Pause between page model calls, in milliseconds.
    #[arg(long, global = true, env = "NEWS_FINDER_PAGE_DELAY_MS", default_value_t = 1000)]
    page_delay_ms: u64,

    /// Max LLM output tokens per page.
    #[arg(long, global = true, env = "NEWS_FINDER_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, global = true, env = "NEWS_FINDER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "NEWS_FINDER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "NEWS_FINDER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "NEWS_FINDER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "NEWS_FINDER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror the drive folder's PDFs and rebuild the file index.
    Sync {
        /// Sync even if the file index is already populated.
        #[arg(long)]
        force: bool,
    },
    /// List synced files.
    Files,
    /// Search one newspaper for a tag.
    Search {
        /// File display name (prompted for when omitted).
        #[arg(short, long)]
        file: Option<String>,
        /// Search tag in English or Gujarati (prompted for when omitted).
        #[arg(short, long)]
        tag: Option<String>,
        /// Write the first rendered page to this PNG.
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Show where the result cache lives and how many entries it holds.
    Cache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Sync { force } => {
            let config = build_config(&cli, None, None).await?;
            run_sync(&cli, &config, *force).await
        }
        Command::Files => {
            let config = build_config(&cli, None, None).await?;
            run_files(&cli, &config)
        }
        Command::Cache => {
            let config = build_config(&cli, None, None).await?;
            run_cache(&cli, &config)
        }
        Command::Search { file, tag, preview } => {
            let progress = show_progress.then(CliProgressCallback::new);
            let callback = progress.clone().map(|p| p as ProgressCallback);
            let config = build_config(&cli, callback, preview.clone()).await?;
            run_search(&cli, config, progress, file.clone(), tag.clone()).await
        }
    }
}

/// Map CLI args to `FinderConfig`.
async fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    preview: Option<PathBuf>,
) -> Result<FinderConfig> {
    let mut builder = FinderConfig::builder()
        .folder_name(&cli.folder)
        .page_delay_ms(cli.page_delay_ms)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref dir) = cli.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(ref token) = cli.drive_token {
        builder = builder.drive_token(token);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(path) = preview {
        builder = builder.preview_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;
    config.ensure_dirs().context("Failed to create cache directory")?;
    Ok(config)
}

async fn run_sync(cli: &Cli, config: &FinderConfig, force: bool) -> Result<()> {
    let drive = GoogleDriveClient::from_config(config).context("Cannot reach Google Drive")?;
    let mut index = FileIndex::open(config.files_index_file()).context("Failed to load file index")?;

    if !cli.quiet && !cli.json {
        eprintln!("{} Syncing files from Google Drive…", cyan("◆"));
    }
    let report = gujarati_news_finder::drive::sync_once(&drive, &mut index, config, force)
        .await
        .context("Sync failed")?;

    match report {
        Some(report) => print_sync_report(cli, &report)?,
        None if cli.json => println!("null"),
        None => eprintln!(
            "{} {} files already synced. Use --force to sync again.",
            cyan("◆"),
            index.len()
        ),
    }
    Ok(())
}

fn print_sync_report(cli: &Cli, report: &SyncReport) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise sync report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{} Files synced successfully!  {} in folder, {} downloaded, {} already present",
            green("✔"),
            bold(&report.files.len().to_string()),
            report.downloaded,
            report.already_present
        );
    }
    Ok(())
}

fn run_files(cli: &Cli, config: &FinderConfig) -> Result<()> {
    let index = FileIndex::open(config.files_index_file()).context("Failed to load file index")?;
    if cli.json {
        let map: std::collections::BTreeMap<&str, &std::path::Path> = index.iter().collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&map).context("Failed to serialise file index")?
        );
        return Ok(());
    }
    if index.is_empty() {
        eprintln!("No files synced yet. Run `news-finder sync`.");
        return Ok(());
    }
    for (i, name) in index.names().iter().enumerate() {
        println!("{:>3}. {}", i + 1, name);
    }
    Ok(())
}

fn run_cache(cli: &Cli, config: &FinderConfig) -> Result<()> {
    let cache = ResultCache::open(config.cache_file()).context("Failed to load result cache")?;
    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "path": cache.path(), "entries": cache.len() })
        );
    } else {
        println!("Cache file:   {}", cache.path().display());
        println!("Entries:      {}", cache.len());
    }
    Ok(())
}

async fn run_search(
    cli: &Cli,
    config: FinderConfig,
    progress: Option<Arc<CliProgressCallback>>,
    file: Option<String>,
    tag: Option<String>,
) -> Result<()> {
    let has_token = config.drive_token.is_some();
    let mut finder = NewsFinder::from_config(config).context("Failed to start news finder")?;

    // Once-per-session sync: only when the index is still empty.
    if has_token {
        let drive = GoogleDriveClient::from_config(finder.config())?;
        if let Some(report) = finder.sync(&drive, false).await.context("Sync failed")? {
            if !cli.quiet && !cli.json {
                print_sync_report(cli, &report)?;
            }
        }
    }
    if finder.index().is_empty() {
        bail!("No files synced yet. Set GOOGLE_DRIVE_TOKEN and run `news-finder sync`.");
    }

    let file = match file {
        Some(f) => f,
        None => {
            let names: Vec<String> = finder.index().names().into_iter().map(String::from).collect();
            tokio::task::block_in_place(|| pick_file(&names))?
        }
    };
    let tag = match tag {
        Some(t) => t,
        None => tokio::task::block_in_place(|| {
            prompt("Enter search tag (topic in English or Gujarati): ")
        })?,
    };

    let outcome = finder.search(&file, &tag).await;
    if let (Err(_), Some(progress)) = (&outcome, &progress) {
        progress.clear();
    }
    print_outcome(cli, &outcome.context("Search failed")?)
}

fn print_outcome(cli: &Cli, outcome: &SearchOutcome) -> Result<()> {
    if cli.json {
        let json = serde_json::json!({
            "outcome": outcome,
            "items": outcome.sections(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
        return Ok(());
    }

    let items = outcome.sections();
    if items.is_empty() {
        eprintln!("{} No relevant news found in {}.", red("✘"), outcome.file_name);
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{} Processing complete for {}!",
            green("✔"),
            bold(&outcome.file_name)
        );
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "### 🔍 Search Results\n").context("Failed to write to stdout")?;
    handle
        .write_all(render_markdown(&items).as_bytes())
        .context("Failed to write to stdout")?;
    Ok(())
}

/// Numbered file picker on stderr/stdin. Accepts a number or an exact name.
fn pick_file(names: &[String]) -> Result<String> {
    eprintln!("{}", bold("Available Files"));
    for (i, name) in names.iter().enumerate() {
        eprintln!("  {:>3}. {}", i + 1, name);
    }
    let answer = prompt("Select a file to process: ")?;

    if let Ok(n) = answer.parse::<usize>() {
        if (1..=names.len()).contains(&n) {
            return Ok(names[n - 1].clone());
        }
        bail!("Selection {} is out of range (1–{})", n, names.len());
    }
    Ok(answer)
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_stays_idle_until_search_starts() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        assert!(cb.bar.prefix().is_empty());
        assert!(cb.bar.message().is_empty());

        cb.on_search_start("sandesh.pdf", 3);
        assert_eq!(cb.bar.prefix(), "Searching");
        assert_eq!(cb.bar.length(), Some(3));
        cb.clear();
    }

    #[test]
    fn clear_finishes_the_bar() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        cb.on_search_start("sandesh.pdf", 2);
        cb.on_page_start(1, 2);
        cb.clear();
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn page_errors_are_counted() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        cb.on_search_start("sandesh.pdf", 2);
        cb.on_page_error(1, 2, "timeout");
        cb.on_page_complete(2, 2, 0);
        assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
        assert_eq!(cb.bar.position(), 2);
        cb.clear();
    }
}
