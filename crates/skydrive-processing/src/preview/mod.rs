//! Preview thumbnail generation
//!
//! `bytes + filename -> base64 PNG`. The pipeline is:
//! - dispatch on the filename extension ([`PreviewFormat`])
//! - decode the raster, or render page 0 of a PDF at 2x through a [`PageRasterizer`]
//! - [`squarify`] onto a `size` x `size` canvas
//! - [`encode_png_base64`]
//!
//! A generator holds no mutable state and may be shared across threads.

mod encode;
mod error;
mod format;
mod pdf;
mod squarify;

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};

pub use encode::encode_png_base64;
pub use error::PreviewError;
pub use format::{sniff_matches, PreviewFormat};
pub use pdf::{scaled_page_size, PageRasterizer, PDF_RENDER_SCALE};
#[cfg(feature = "pdf")]
pub use pdf::PdfiumRasterizer;
pub use squarify::{centering_offset, foreground_dimensions, squarify, BACKGROUND_BLUR_SIGMA};

pub const DEFAULT_PREVIEW_SIZE: u32 = 256;

#[derive(Clone)]
pub struct PreviewGenerator {
    size: u32,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_SIZE)
    }
}

impl std::fmt::Debug for PreviewGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewGenerator")
            .field("size", &self.size)
            .field("pdf_enabled", &self.rasterizer.is_some())
            .finish()
    }
}

impl PreviewGenerator {
    /// Generator without PDF support; PDFs fail with `RendererUnavailable`.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            rasterizer: None,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn supports_pdf(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Generate a preview at the configured size.
    pub fn generate(&self, bytes: &[u8], filename: &str) -> Result<String, PreviewError> {
        self.generate_with_size(bytes, filename, self.size)
    }

    pub fn generate_with_size(
        &self,
        bytes: &[u8],
        filename: &str,
        size: u32,
    ) -> Result<String, PreviewError> {
        let format = PreviewFormat::from_filename(filename)?;
        if size == 0 {
            return Err(PreviewError::InvalidSize);
        }

        let image = self.decode(bytes, format)?;
        let thumbnail = squarify(&image, size);
        let encoded = encode_png_base64(&thumbnail)?;

        tracing::debug!(
            filename = %filename,
            format = ?format,
            input_bytes = bytes.len(),
            output_chars = encoded.len(),
            "Generated preview"
        );

        Ok(encoded)
    }

    fn decode(&self, bytes: &[u8], format: PreviewFormat) -> Result<DynamicImage, PreviewError> {
        let image = match format {
            PreviewFormat::Raster => {
                let reader = ImageReader::new(Cursor::new(bytes))
                    .with_guessed_format()
                    .map_err(|e| PreviewError::Decode(e.to_string()))?;
                // PNG and JPEG content are interchangeable behind a raster extension.
                match reader.format() {
                    Some(ImageFormat::Png | ImageFormat::Jpeg) => reader.decode()?,
                    Some(other) => {
                        return Err(PreviewError::Decode(format!(
                            "{:?} content is not a PNG or JPEG image",
                            other
                        )))
                    }
                    None => {
                        return Err(PreviewError::Decode(
                            "content is not a recognized image".to_string(),
                        ))
                    }
                }
            }
            PreviewFormat::Document => {
                let rasterizer = self
                    .rasterizer
                    .as_ref()
                    .ok_or(PreviewError::RendererUnavailable)?;
                rasterizer.render_first_page(bytes, PDF_RENDER_SCALE)?
            }
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(PreviewError::Decode("image has zero size".to_string()));
        }
        Ok(image)
    }
}

/// Run the generator on the blocking pool so async request tasks stay responsive.
///
/// A panic inside the generator surfaces as `TaskFailed` rather than
/// unwinding into the caller.
pub async fn generate_preview_blocking(
    generator: PreviewGenerator,
    bytes: Bytes,
    filename: String,
) -> Result<String, PreviewError> {
    tokio::task::spawn_blocking(move || generator.generate(&bytes, &filename))
        .await
        .map_err(|e| PreviewError::TaskFailed(e.to_string()))?
}

/// Neutral preview stored while a deferred preview is pending or after it failed.
pub fn placeholder_preview(size: u32) -> Result<String, PreviewError> {
    if size == 0 {
        return Err(PreviewError::InvalidSize);
    }
    let canvas = RgbaImage::from_pixel(size, size, Rgba([226, 232, 240, 255]));
    encode_png_base64(&canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::{GenericImageView, ImageFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([40, 200, 40, 255]),
        ))
        .to_rgb8();
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    fn decode_preview(encoded: &str) -> DynamicImage {
        let bytes = STANDARD.decode(encoded).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap()
    }

    /// Records calls and returns a page-sized raster at the requested scale.
    struct StubRasterizer {
        calls: AtomicUsize,
        scales: Mutex<Vec<f32>>,
        page: (u32, u32),
        pages: usize,
    }

    impl StubRasterizer {
        fn new(page: (u32, u32), pages: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                scales: Mutex::new(Vec::new()),
                page,
                pages,
            }
        }
    }

    impl PageRasterizer for StubRasterizer {
        fn render_first_page(
            &self,
            _bytes: &[u8],
            scale: f32,
        ) -> Result<DynamicImage, PreviewError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.scales.lock().unwrap().push(scale);
            if self.pages == 0 {
                return Err(PreviewError::EmptyDocument);
            }
            let (w, h) = scaled_page_size(self.page.0 as f32, self.page.1 as f32, scale);
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                w,
                h,
                Rgba([0, 0, 0, 255]),
            )))
        }
    }

    #[test]
    fn test_end_to_end_landscape_png() {
        let generator = PreviewGenerator::default();
        let encoded = generator.generate(&png_bytes(1000, 500), "photo.png").unwrap();
        assert!(!encoded.is_empty());

        let preview = decode_preview(&encoded);
        assert_eq!(preview.dimensions(), (256, 256));
        assert!(preview.color().has_alpha());
        // Foreground band starts at y = 64.
        assert_eq!(preview.get_pixel(128, 64), Rgba([200, 40, 40, 255]));
    }

    #[test]
    fn test_custom_size() {
        let generator = PreviewGenerator::default();
        let encoded = generator
            .generate_with_size(&png_bytes(30, 90), "tall.PNG", 48)
            .unwrap();
        assert_eq!(decode_preview(&encoded).dimensions(), (48, 48));
    }

    #[test]
    fn test_jpeg_extensions() {
        let generator = PreviewGenerator::new(64);
        for name in ["a.jpg", "a.JPEG"] {
            let encoded = generator.generate(&jpeg_bytes(40, 20), name).unwrap();
            assert_eq!(decode_preview(&encoded).dimensions(), (64, 64));
        }
    }

    #[test]
    fn test_idempotent_output() {
        let generator = PreviewGenerator::default();
        let bytes = png_bytes(321, 123);
        let first = generator.generate(&bytes, "x.png").unwrap();
        let second = generator.generate(&bytes, "x.png").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_extension_skips_decoding() {
        let stub = Arc::new(StubRasterizer::new((10, 10), 1));
        let generator = PreviewGenerator::default().with_rasterizer(stub.clone());
        for name in ["anim.gif", "doc.docx", "noextension"] {
            let err = generator.generate(b"%PDF-1.7", name).unwrap_err();
            assert!(matches!(err, PreviewError::UnsupportedFormat { .. }));
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let bytes = png_bytes(64, 64);
        let truncated = &bytes[..bytes.len() / 2];
        let err = PreviewGenerator::default()
            .generate(truncated, "broken.png")
            .unwrap_err();
        assert!(matches!(err, PreviewError::Decode(_)));
    }

    #[test]
    fn test_non_image_bytes_with_image_extension() {
        let err = PreviewGenerator::default()
            .generate(b"%PDF-1.7 not an image", "fake.jpg")
            .unwrap_err();
        assert!(matches!(err, PreviewError::Decode(_)));
    }

    #[test]
    fn test_other_image_formats_with_raster_extension() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        let mut gif = Vec::new();
        img.write_to(&mut Cursor::new(&mut gif), ImageFormat::Gif)
            .unwrap();
        let mut bmp = Vec::new();
        DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut bmp), ImageFormat::Bmp)
            .unwrap();

        let generator = PreviewGenerator::default();
        assert!(matches!(
            generator.generate(&gif, "x.png"),
            Err(PreviewError::Decode(_))
        ));
        assert!(matches!(
            generator.generate(&bmp, "x.jpg"),
            Err(PreviewError::Decode(_))
        ));
        // PNG and JPEG content may sit behind either raster extension.
        assert!(generator.generate(&png_bytes(8, 8), "swapped.jpg").is_ok());
        assert!(generator.generate(&jpeg_bytes(8, 8), "swapped.png").is_ok());
    }

    #[test]
    fn test_pdf_renders_first_page_at_double_scale() {
        let stub = Arc::new(StubRasterizer::new((300, 150), 3));
        let generator = PreviewGenerator::default().with_rasterizer(stub.clone());
        let encoded = generator.generate(b"%PDF-1.7", "Report.PDF").unwrap();

        assert_eq!(decode_preview(&encoded).dimensions(), (256, 256));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*stub.scales.lock().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_empty_pdf_propagates() {
        let stub = Arc::new(StubRasterizer::new((300, 150), 0));
        let generator = PreviewGenerator::default().with_rasterizer(stub);
        assert!(matches!(
            generator.generate(b"%PDF-1.7", "empty.pdf"),
            Err(PreviewError::EmptyDocument)
        ));
    }

    #[test]
    fn test_pdf_without_renderer() {
        let generator = PreviewGenerator::default();
        assert!(!generator.supports_pdf());
        assert!(matches!(
            generator.generate(b"%PDF-1.7", "doc.pdf"),
            Err(PreviewError::RendererUnavailable)
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = PreviewGenerator::default()
            .generate_with_size(&png_bytes(4, 4), "a.png", 0)
            .unwrap_err();
        assert!(matches!(err, PreviewError::InvalidSize));
        assert!(placeholder_preview(0).is_err());
    }

    #[test]
    fn test_placeholder_is_square_png() {
        let preview = decode_preview(&placeholder_preview(256).unwrap());
        assert_eq!(preview.dimensions(), (256, 256));
    }

    #[tokio::test]
    async fn test_blocking_wrapper() {
        let encoded = generate_preview_blocking(
            PreviewGenerator::new(32),
            Bytes::from(png_bytes(10, 20)),
            "small.png".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(decode_preview(&encoded).dimensions(), (32, 32));

        let err = generate_preview_blocking(
            PreviewGenerator::new(32),
            Bytes::new(),
            "nothing.txt".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PreviewError::UnsupportedFormat { .. }));
    }

    struct PanickingRasterizer;

    impl PageRasterizer for PanickingRasterizer {
        fn render_first_page(
            &self,
            _bytes: &[u8],
            _scale: f32,
        ) -> Result<DynamicImage, PreviewError> {
            panic!("renderer crashed")
        }
    }

    #[tokio::test]
    async fn test_blocking_wrapper_reports_panics() {
        let generator = PreviewGenerator::new(32).with_rasterizer(Arc::new(PanickingRasterizer));
        let err = generate_preview_blocking(
            generator,
            Bytes::from_static(b"%PDF-1.7"),
            "crash.pdf".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PreviewError::TaskFailed(_)));
    }
}
