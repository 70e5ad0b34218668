//! Page image encoding for the model request and the optional preview file.
//!
//! Pages travel to the model as base64 PNG inside the JSON request body.
//! PNG keeps the thin strokes and matras of Gujarati script intact.

use crate::error::FinderError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Encode a rendered page as a base64 PNG attachment.
///
/// `detail: "high"` makes GPT-4-class models tile the full page instead of
/// downsampling it to one overview tile.
pub fn encode_page(img: &DynamicImage, page_num: usize) -> Result<ImageData, FinderError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| FinderError::RasterisationFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {}", e),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Page {}: encoded {} bytes base64", page_num, b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Write a rendered page to disk so the user can see what the model sees.
pub fn save_preview(img: &DynamicImage, path: &Path) -> Result<(), FinderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FinderError::StoreWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| FinderError::Internal(format!("preview {}: {e}", path.display())))?;
    info!("Saved page preview to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn white_page() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 16, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn encodes_png_base64() {
        let data = encode_page(&white_page(), 1).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[test]
    fn preview_written_as_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("preview/page1.png");
        save_preview(&white_page(), &path).unwrap();
        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (12, 16));
    }
}
