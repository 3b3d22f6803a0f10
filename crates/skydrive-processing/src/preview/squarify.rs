//! Square thumbnail compositing.
//!
//! The source is drawn twice: stretched and blurred across the whole canvas,
//! then aspect-preserved and centered on top. Non-square sources therefore
//! get a soft backdrop in their margins instead of bars.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Gaussian sigma applied to the stretched background layer.
pub const BACKGROUND_BLUR_SIGMA: f32 = 10.0;

/// Size of the aspect-preserving foreground so that its larger side equals `size`.
///
/// Rounded dimensions never drop below one pixel.
pub fn foreground_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    if aspect > 1.0 {
        let new_height = (size as f64 / aspect).round() as u32;
        (size, new_height.clamp(1, size))
    } else {
        let new_width = (size as f64 * aspect).round() as u32;
        (new_width.clamp(1, size), size)
    }
}

/// Top-left position that centers a `width` x `height` layer on the canvas.
pub fn centering_offset(size: u32, width: u32, height: u32) -> (u32, u32) {
    (
        size.saturating_sub(width) / 2,
        size.saturating_sub(height) / 2,
    )
}

/// Composite `image` into a `size` x `size` RGBA thumbnail.
///
/// Deterministic: identical input always yields identical pixels. Callers
/// must pass a non-empty image and a non-zero size.
pub fn squarify(image: &DynamicImage, size: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 0]));

    // Cheap bilinear stretch; the blur hides its artifacts.
    let background = image
        .resize_exact(size, size, FilterType::Triangle)
        .blur(BACKGROUND_BLUR_SIGMA)
        .to_rgba8();

    let (width, height) = image.dimensions();
    let (fg_width, fg_height) = foreground_dimensions(width, height, size);
    let foreground = image
        .resize_exact(fg_width, fg_height, FilterType::Lanczos3)
        .to_rgba8();

    let (x, y) = centering_offset(size, fg_width, fg_height);

    imageops::replace(&mut canvas, &background, 0, 0);
    imageops::replace(&mut canvas, &foreground, x as i64, y as i64);

    tracing::debug!(
        source_width = width,
        source_height = height,
        foreground_width = fg_width,
        foreground_height = fg_height,
        offset_x = x,
        offset_y = y,
        size,
        "Squarified image"
    );

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn test_landscape_geometry() {
        let (w, h) = foreground_dimensions(1000, 500, 256);
        assert_eq!((w, h), (256, 128));
        assert_eq!(centering_offset(256, w, h), (0, 64));
    }

    #[test]
    fn test_portrait_geometry() {
        let (w, h) = foreground_dimensions(300, 900, 256);
        assert_eq!((w, h), (85, 256));
        let (x, y) = centering_offset(256, w, h);
        assert!(x > 0);
        assert_eq!(y, 0);
    }

    #[test]
    fn test_square_geometry_fills_canvas() {
        for size in [1, 64, 256, 333] {
            let (w, h) = foreground_dimensions(40, 40, size);
            assert_eq!((w, h), (size, size));
            assert_eq!(centering_offset(size, w, h), (0, 0));
        }
    }

    #[test]
    fn test_aspect_ratio_preserved_within_a_pixel() {
        let cases = [(1920, 1080), (1080, 1920), (7, 3), (3, 7), (4000, 3), (640, 641)];
        for (width, height) in cases {
            for size in [16, 100, 256, 512] {
                let (w, h) = foreground_dimensions(width, height, size);
                assert!(w <= size && h <= size);
                assert_eq!(w.max(h), size);
                let expected_w = h as f64 * width as f64 / height as f64;
                let expected_h = w as f64 * height as f64 / width as f64;
                if w == size {
                    assert!((h as f64 - expected_h).abs() <= 1.0, "{width}x{height}@{size}");
                } else {
                    assert!((w as f64 - expected_w).abs() <= 1.0, "{width}x{height}@{size}");
                }
            }
        }
    }

    #[test]
    fn test_extreme_aspect_never_zero() {
        assert_eq!(foreground_dimensions(10_000, 1, 256), (256, 1));
        assert_eq!(foreground_dimensions(1, 10_000, 256), (1, 256));
    }

    #[test]
    fn test_output_is_always_size_square() {
        for (width, height) in [(1000, 500), (500, 1000), (1, 1), (3, 2)] {
            for size in [1, 32, 256] {
                let out = squarify(&solid(width, height, [10, 20, 30, 255]), size);
                assert_eq!(out.dimensions(), (size, size));
            }
        }
    }

    #[test]
    fn test_foreground_overwrites_center() {
        // Red landscape: foreground occupies rows 64..192 at size 256.
        let out = squarify(&solid(1000, 500, [255, 0, 0, 255]), 256);
        assert_eq!(out.get_pixel(128, 128), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 64), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_margins_show_opaque_background() {
        let out = squarify(&solid(1000, 500, [0, 0, 255, 255]), 256);
        // Top margin is covered by the blurred stretch, never left transparent.
        let margin = out.get_pixel(128, 40);
        assert!(margin[3] >= 250);
        assert!(margin[2] >= 200);
    }

    #[test]
    fn test_transparent_source_keeps_alpha() {
        let out = squarify(&solid(50, 50, [0, 255, 0, 0]), 64);
        assert_eq!(out.get_pixel(32, 32)[3], 0);
    }

    #[test]
    fn test_deterministic() {
        let mut source = RgbaImage::new(120, 45);
        for (x, y, pixel) in source.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 2) as u8, (y * 5) as u8, ((x + y) % 256) as u8, 255]);
        }
        let source = DynamicImage::ImageRgba8(source);
        assert_eq!(squarify(&source, 256), squarify(&source, 256));
    }
}
