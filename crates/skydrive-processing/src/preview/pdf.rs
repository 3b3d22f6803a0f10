//! First-page PDF rasterization.

use image::DynamicImage;

use super::PreviewError;

/// Render scale applied to the first page relative to its native size.
pub const PDF_RENDER_SCALE: f32 = 2.0;

/// Renders the first page of a document to a raster image.
///
/// Implementations must never touch pages beyond index 0.
pub trait PageRasterizer: Send + Sync {
    fn render_first_page(&self, bytes: &[u8], scale: f32) -> Result<DynamicImage, PreviewError>;
}

/// Pixel size of a page rendered at `scale`, from its size in points.
///
/// One point maps to one pixel at scale 1.0.
pub fn scaled_page_size(width_points: f32, height_points: f32, scale: f32) -> (u32, u32) {
    let width = (width_points * scale).round().max(1.0) as u32;
    let height = (height_points * scale).round().max(1.0) as u32;
    (width, height)
}

#[cfg(feature = "pdf")]
pub use pdfium::PdfiumRasterizer;

#[cfg(feature = "pdf")]
mod pdfium {
    use image::{DynamicImage, RgbaImage};
    use pdfium_render::prelude::{PdfRenderConfig, Pdfium};

    use super::{scaled_page_size, PageRasterizer};
    use crate::preview::PreviewError;

    /// `PageRasterizer` backed by a dynamically bound pdfium library.
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// Bind pdfium from `library_dir` when given, falling back to the system library.
        pub fn bind(library_dir: Option<&str>) -> Result<Self, PreviewError> {
            let bindings = match library_dir {
                Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                    .or_else(|_| Pdfium::bind_to_system_library()),
                None => Pdfium::bind_to_system_library(),
            }
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to bind pdfium library");
                PreviewError::RendererUnavailable
            })?;

            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn render_first_page(
            &self,
            bytes: &[u8],
            scale: f32,
        ) -> Result<DynamicImage, PreviewError> {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| PreviewError::Decode(format!("invalid PDF: {}", e)))?;

            let pages = document.pages();
            if pages.is_empty() {
                return Err(PreviewError::EmptyDocument);
            }

            let page = pages
                .get(0)
                .map_err(|e| PreviewError::Decode(format!("unreadable first page: {}", e)))?;
            let (width, height) = scaled_page_size(page.width().value, page.height().value, scale);

            let config = PdfRenderConfig::new().set_target_size(width as i32, height as i32);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| PreviewError::Decode(format!("failed to render page: {}", e)))?;

            let (bitmap_width, bitmap_height) = (bitmap.width() as u32, bitmap.height() as u32);
            let rgba = RgbaImage::from_raw(bitmap_width, bitmap_height, bitmap.as_rgba_bytes())
                .ok_or_else(|| PreviewError::Decode("rendered bitmap has wrong length".into()))?;

            tracing::debug!(
                page_width = bitmap_width,
                page_height = bitmap_height,
                page_count = pages.len(),
                "Rendered first PDF page"
            );

            Ok(DynamicImage::ImageRgba8(rgba))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const MINIMAL_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >> endobj
4 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 50 50] >> endobj
trailer << /Root 1 0 R >>
%%EOF";

        #[test]
        #[ignore = "requires a pdfium shared library"]
        fn test_renders_first_page_at_double_scale() {
            let rasterizer = PdfiumRasterizer::bind(None).unwrap();
            let image = rasterizer.render_first_page(MINIMAL_PDF, 2.0).unwrap();
            assert_eq!((image.width(), image.height()), (400, 200));
        }

        #[test]
        #[ignore = "requires a pdfium shared library"]
        fn test_garbage_is_decode_error() {
            let rasterizer = PdfiumRasterizer::bind(None).unwrap();
            assert!(matches!(
                rasterizer.render_first_page(b"%PDF-garbage", 2.0),
                Err(PreviewError::Decode(_))
            ));
        }
    }
}
