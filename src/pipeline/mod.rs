//! Per-page stages used by the search loop.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ vision
//! (check)   (pdfium)   (base64)   (VLM)
//! ```
//!
//! 1. [`input`]: confirm the indexed path is a readable PDF
//! 2. [`render`]: rasterise one page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]: PNG-encode and base64-wrap the page for the request body
//! 4. [`vision`]: one model call per page; the only stage with network I/O
//!
//! [`render::PageRenderer`] and [`vision::PageReader`] are traits so the
//! loop can run against in-process fakes.

pub mod encode;
pub mod input;
pub mod render;
pub mod vision;
