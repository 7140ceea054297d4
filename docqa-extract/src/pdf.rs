//! PDF documents: text per page through lopdf, plus embedded images.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docqa_rag::{ExtractedDocument, ExtractedImage, ExtractedPage, Extractor, Result};
use flate2::read::ZlibDecoder;
use lopdf::xobject::PdfImage;
use lopdf::{Document, ObjectId};
use tracing::{debug, warn};

use crate::{extraction_error, parse_blocking};

const FORMAT: &str = "pdf";

/// Images below this size on either side are icons or decorations.
const MIN_DIMENSION: i64 = 50;

/// Extracts the text of every page together with its embedded images.
///
/// JPEG and JPEG 2000 streams are kept as-is; Flate-compressed raw
/// bitmaps are re-encoded as PNG. Other encodings are skipped.
#[derive(Debug, Clone, Copy)]
pub struct PdfExtractor {
    extract_images: bool,
}

impl PdfExtractor {
    /// Create an extractor that also collects images.
    #[must_use]
    pub fn new() -> Self {
        Self { extract_images: true }
    }

    /// Create an extractor that only reads page text.
    #[must_use]
    pub fn text_only() -> Self {
        Self { extract_images: false }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        FORMAT
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let extract_images = self.extract_images;
        let document =
            parse_blocking(FORMAT, path, move |path| read_pdf(path, extract_images)).await?;
        debug!(
            file = %path.display(),
            pages = document.pages.len(),
            images = document.image_count(),
            "read pdf file"
        );
        Ok(document)
    }
}

fn read_pdf(path: PathBuf, extract_images: bool) -> Result<ExtractedDocument> {
    let doc = Document::load(&path).map_err(|e| extraction_error(FORMAT, e))?;

    let mut pages = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let text = match doc.extract_text(&[number]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(file = %path.display(), page = number, error = %e, "no text on page");
                String::new()
            }
        };
        let images =
            if extract_images { page_images(&doc, page_id, number) } else { Vec::new() };

        if text.is_empty() && images.is_empty() {
            debug!(page = number, "skipping empty page");
            continue;
        }
        pages.push(ExtractedPage { number, text, images });
    }

    Ok(ExtractedDocument { pages })
}

fn page_images(doc: &Document, page_id: ObjectId, number: u32) -> Vec<ExtractedImage> {
    let images = match doc.get_page_images(page_id) {
        Ok(images) => images,
        Err(e) => {
            debug!(page = number, error = %e, "failed to list page images");
            return Vec::new();
        }
    };

    images
        .iter()
        .filter(|image| {
            let large_enough = image.width >= MIN_DIMENSION && image.height >= MIN_DIMENSION;
            if !large_enough {
                debug!(
                    page = number,
                    width = image.width,
                    height = image.height,
                    "skipping small image"
                );
            }
            large_enough
        })
        .filter_map(|image| match decode_image(image) {
            Ok(decoded) => decoded,
            Err(message) => {
                debug!(page = number, error = %message, "failed to decode image");
                None
            }
        })
        .collect()
}

/// `Ok(None)` means the stream uses an encoding we do not handle.
fn decode_image(image: &PdfImage<'_>) -> std::result::Result<Option<ExtractedImage>, String> {
    let Some(filters) = image.filters.as_ref() else {
        return Ok(None);
    };
    let has = |name: &str| filters.iter().any(|f| f == name);

    let (data, extension) = if has("DCTDecode") {
        (image.content.to_vec(), "jpeg")
    } else if has("JPXDecode") {
        (image.content.to_vec(), "jp2")
    } else if has("FlateDecode") {
        (flate_to_png(image)?, "png")
    } else {
        debug!(?filters, "unsupported image filter");
        return Ok(None);
    };

    Ok(Some(ExtractedImage { data, extension: extension.to_string() }))
}

fn flate_to_png(image: &PdfImage<'_>) -> std::result::Result<Vec<u8>, String> {
    let mut raw = Vec::new();
    ZlibDecoder::new(image.content)
        .read_to_end(&mut raw)
        .map_err(|e| format!("decompression failed: {e}"))?;

    let width = u32::try_from(image.width).map_err(|e| e.to_string())?;
    let height = u32::try_from(image.height).map_err(|e| e.to_string())?;
    let color_space = image.color_space.as_deref().unwrap_or("DeviceRGB");

    let bitmap = match color_space {
        "DeviceGray" | "Gray" | "CalGray" => {
            image::GrayImage::from_raw(width, height, raw).map(image::DynamicImage::ImageLuma8)
        }
        "DeviceCMYK" | "CMYK" => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&raw))
            .map(image::DynamicImage::ImageRgb8),
        _ => image::RgbImage::from_raw(width, height, raw).map(image::DynamicImage::ImageRgb8),
    }
    .ok_or_else(|| format!("{width}x{height} {color_space} bitmap has the wrong size"))?;

    let mut png = Vec::new();
    bitmap
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| format!("png encoding failed: {e}"))?;
    Ok(png)
}

#[allow(clippy::many_single_char_names, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let [c, m, y, k] = [px[0], px[1], px[2], px[3]].map(|v| f32::from(v) / 255.0);
        rgb.push((255.0 * (1.0 - c) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - m) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - y) * (1.0 - k)) as u8);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmyk_extremes_map_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }

    #[test]
    fn trailing_partial_pixel_is_ignored() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0, 9, 9]).len(), 3);
    }
}
