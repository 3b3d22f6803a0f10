//! SkyDrive Preview Processing Library
//!
//! Turns an uploaded PNG, JPEG or PDF into the fixed-size square preview
//! thumbnail stored alongside each file, and validates uploads before any
//! bytes reach the generator.

pub mod preview;
pub mod validator;

pub use preview::{
    encode_png_base64, generate_preview_blocking, placeholder_preview, squarify, PageRasterizer,
    PreviewError, PreviewFormat, PreviewGenerator, DEFAULT_PREVIEW_SIZE,
};
#[cfg(feature = "pdf")]
pub use preview::PdfiumRasterizer;
pub use validator::{sanitize_filename, UploadValidator, ValidationError};
