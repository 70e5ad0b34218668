//! PDF rasterisation: render one newspaper page at a time via pdfium.
//!
//! [`PageRenderer::open`] starts a `spawn_blocking` worker that binds pdfium
//! and parses the document once. The returned [`RenderedDocument`] sends
//! page requests to that worker, so one bitmap is alive at a time and the
//! document stays open for the whole page loop. The worker exits when the
//! handle is dropped.

use crate::config::FinderConfig;
use crate::error::FinderError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Opens documents for the search loop.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self, pdf_path: &Path) -> Result<Box<dyn RenderedDocument>, FinderError>;
}

/// An open document that renders pages on request.
#[async_trait]
pub trait RenderedDocument: Send {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Rasterise the page at 0-based `index`.
    async fn render_page(&mut self, index: usize) -> Result<DynamicImage, FinderError>;
}

/// pdfium-backed renderer with a fixed longest-edge cap.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    max_rendered_pixels: u32,
    password: Option<String>,
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(max_rendered_pixels: u32) -> Self {
        Self {
            max_rendered_pixels,
            password: None,
            library_path: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        }
    }

    pub fn from_config(config: &FinderConfig) -> Self {
        let mut renderer = Self::new(config.max_rendered_pixels);
        renderer.password = config.password.clone();
        renderer
    }

    /// Bind to a specific pdfium library instead of the default search.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

struct RenderRequest {
    index: usize,
    reply: oneshot::Sender<Result<DynamicImage, FinderError>>,
}

/// Handle to a document held open by a render worker.
pub struct PdfiumDocument {
    pages: usize,
    requests: mpsc::Sender<RenderRequest>,
}

#[async_trait]
impl PageRenderer for PdfiumRenderer {
    async fn open(&self, pdf_path: &Path) -> Result<Box<dyn RenderedDocument>, FinderError> {
        let path = pdf_path.to_path_buf();
        let this = self.clone();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<usize, FinderError>>();
        let (req_tx, req_rx) = mpsc::channel::<RenderRequest>(1);

        tokio::task::spawn_blocking(move || this.run_worker(&path, ready_tx, req_rx));

        let pages = ready_rx.await.map_err(|_| {
            FinderError::Internal("Render worker exited before opening the document".into())
        })??;

        Ok(Box::new(PdfiumDocument {
            pages,
            requests: req_tx,
        }))
    }
}

#[async_trait]
impl RenderedDocument for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    async fn render_page(&mut self, index: usize) -> Result<DynamicImage, FinderError> {
        let worker_gone = || {
            FinderError::Internal(format!("Render worker stopped before page {}", index + 1))
        };
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(RenderRequest { index, reply })
            .await
            .map_err(|_| worker_gone())?;
        rx.await.map_err(|_| worker_gone())?
    }
}

impl PdfiumRenderer {
    /// Worker body: bind, open, report the page count, then serve requests.
    fn run_worker(
        &self,
        pdf_path: &Path,
        ready: oneshot::Sender<Result<usize, FinderError>>,
        mut requests: mpsc::Receiver<RenderRequest>,
    ) {
        let pdfium = match bind_pdfium(self.library_path.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let document = match open_document(&pdfium, pdf_path, self.password.as_deref()) {
            Ok(d) => d,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        if ready.send(Ok(total)).is_err() {
            return;
        }

        while let Some(req) = requests.blocking_recv() {
            let _ = req.reply.send(self.render_from(&document, req.index));
        }
        debug!("Render worker for {} finished", pdf_path.display());
    }

    fn render_from(
        &self,
        document: &PdfDocument<'_>,
        index: usize,
    ) -> Result<DynamicImage, FinderError> {
        let raster_err = |detail: String| FinderError::RasterisationFailed {
            page: index + 1,
            detail,
        };

        let pages = document.pages();
        let total = pages.len() as usize;
        if index >= total {
            return Err(raster_err(format!("page out of range (document has {total})")));
        }

        let page = pages
            .get(index as u16)
            .map_err(|e| raster_err(format!("{:?}", e)))?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_rendered_pixels as i32)
            .set_maximum_height(self.max_rendered_pixels as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| raster_err(format!("{:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Bind to pdfium: explicit path first, then `./`, then the system library.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, FinderError> {
    let bindings = match library_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    };

    bindings
        .map(Pdfium::new)
        .map_err(|e| FinderError::PdfiumBindingFailed(e.to_string()))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, FinderError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            FinderError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        } else {
            FinderError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_copies_render_settings() {
        let config = FinderConfig::builder()
            .max_rendered_pixels(1600)
            .password("secret")
            .build()
            .unwrap();
        let r = PdfiumRenderer::from_config(&config).with_library_path("/opt/pdfium");
        assert_eq!(r.max_rendered_pixels, 1600);
        assert_eq!(r.password.as_deref(), Some("secret"));
        assert_eq!(r.library_path.as_deref(), Some(Path::new("/opt/pdfium")));
    }

    #[test]
    fn binding_to_missing_library_fails_cleanly() {
        let err = bind_pdfium(Some(Path::new("/nonexistent/libpdfium.so"))).err().unwrap();
        assert!(matches!(err, FinderError::PdfiumBindingFailed(_)));
    }

    #[tokio::test]
    async fn open_reports_worker_bind_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let pdf = tmp.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let renderer = PdfiumRenderer::new(1000).with_library_path("/nonexistent/libpdfium.so");
        let err = renderer.open(&pdf).await.err().unwrap();
        assert!(matches!(err, FinderError::PdfiumBindingFailed(_)));
    }
}
