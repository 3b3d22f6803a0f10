use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 120, 200, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png");
    buffer
}

/// Passes the magic-byte check but cannot be rendered.
pub fn broken_pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\nthis is not a real document\n%%EOF".to_vec()
}
