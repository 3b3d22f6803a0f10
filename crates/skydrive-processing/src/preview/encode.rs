use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};

use super::PreviewError;

/// Encode a thumbnail as PNG (alpha preserved) and return it as padded standard base64.
pub fn encode_png_base64(image: &RgbaImage) -> Result<String, PreviewError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PreviewError::Encode(e.to_string()))?;
    Ok(STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_output_is_png_with_alpha() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 4]));
        let encoded = encode_png_base64(&image).unwrap();
        let bytes = STANDARD.decode(&encoded).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.get_pixel(3, 3), &Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_standard_alphabet_is_padded() {
        let image = RgbaImage::from_pixel(3, 1, Rgba([255, 255, 255, 255]));
        let encoded = encode_png_base64(&image).unwrap();
        assert!(!encoded.contains('-') && !encoded.contains('_'));
        assert_eq!(encoded.len() % 4, 0);
    }
}
