use std::path::Path;

use super::PreviewError;

/// How an asset is turned into a working raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewFormat {
    /// PNG or JPEG, decoded directly.
    Raster,
    /// PDF, of which only the first page is rendered.
    Document,
}

impl PreviewFormat {
    /// Dispatch on the filename extension, case-insensitively.
    ///
    /// Only the name is inspected, so unsupported uploads are rejected
    /// before any decoding work happens.
    pub fn from_filename(filename: &str) -> Result<Self, PreviewError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("png") | Some("jpg") | Some("jpeg") => Ok(PreviewFormat::Raster),
            Some("pdf") => Ok(PreviewFormat::Document),
            _ => Err(PreviewError::UnsupportedFormat { extension }),
        }
    }
}

/// Check the leading magic bytes against the declared format.
///
/// Raster uploads accept either PNG or JPEG content, since the decoder
/// sniffs the real format anyway.
pub fn sniff_matches(bytes: &[u8], format: PreviewFormat) -> bool {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const PDF: &[u8] = b"%PDF-";

    match format {
        PreviewFormat::Raster => bytes.starts_with(PNG) || bytes.starts_with(JPEG),
        PreviewFormat::Document => bytes.starts_with(PDF),
    }
}
