use std::path::Path;

use crate::preview::{sniff_matches, PreviewFormat};

/// Maximum accepted upload size: 3 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("File content does not match its .{extension} extension")]
    ContentMismatch { extension: String },
}

/// Upload validator
///
/// Runs before any bytes are stored or handed to the preview generator.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_UPLOAD_BYTES,
            ["png", "jpg", "jpeg", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::InvalidFilename(
                "File name is required".to_string(),
            ));
        }
        if filename.len() > 255 {
            return Err(ValidationError::InvalidFilename(
                "File name is too long".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the extension (case-insensitive) against the allow-list.
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = extension_of(filename)
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Reject empty payloads and payloads whose magic bytes contradict the extension.
    pub fn validate_content(&self, filename: &str, data: &[u8]) -> Result<(), ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        if let Ok(format) = PreviewFormat::from_filename(filename) {
            if !sniff_matches(data, format) {
                return Err(ValidationError::ContentMismatch {
                    extension: extension_of(filename).unwrap_or_default(),
                });
            }
        }

        Ok(())
    }

    /// Run every check in the order the upload endpoint applies them.
    pub fn validate_all(&self, filename: &str, data: &[u8]) -> Result<(), ValidationError> {
        self.validate_filename(filename)?;
        self.validate_extension(filename)?;
        self.validate_size(data.len())?;
        self.validate_content(filename, data)?;
        Ok(())
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Keep only the final path component and strip control characters.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_validate_size() {
        let validator = UploadValidator::default();
        assert!(validator.validate_size(1).is_ok());
        assert!(validator.validate_size(3 * 1024 * 1024).is_ok());
        assert!(matches!(
            validator.validate_size(3 * 1024 * 1024 + 1),
            Err(ValidationError::FileTooLarge { .. })
        ));
        assert!(matches!(
            validator.validate_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension() {
        let validator = UploadValidator::default();
        assert_eq!(validator.validate_extension("Photo.JPG").unwrap(), "jpg");
        assert_eq!(validator.validate_extension("doc.pdf").unwrap(), "pdf");
        assert!(matches!(
            validator.validate_extension("anim.gif"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validator.validate_extension("README"),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_validate_filename() {
        let validator = UploadValidator::default();
        assert!(validator.validate_filename("a.png").is_ok());
        assert!(validator.validate_filename("   ").is_err());
        assert!(validator
            .validate_filename(&format!("{}.png", "a".repeat(300)))
            .is_err());
    }

    #[test]
    fn test_validate_content_mismatch() {
        let validator = UploadValidator::default();
        assert!(validator.validate_content("a.png", PNG_MAGIC).is_ok());
        assert!(validator.validate_content("a.jpg", PNG_MAGIC).is_ok());
        assert!(matches!(
            validator.validate_content("a.pdf", PNG_MAGIC),
            Err(ValidationError::ContentMismatch { .. })
        ));
        assert!(matches!(
            validator.validate_content("a.png", b""),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_all_order() {
        let validator = UploadValidator::new(8, vec!["PNG".to_string()]);
        // Extension is checked before size.
        assert!(matches!(
            validator.validate_all("a.gif", &[0u8; 100]),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validator.validate_all("a.png", &[0u8; 100]),
            Err(ValidationError::FileTooLarge { size: 100, max: 8 })
        ));
        assert!(validator.validate_all("a.png", &PNG_MAGIC[..8]).is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cat.png"), "cat.png");
        assert_eq!(sanitize_filename("re\u{0}port\n.pdf"), "report.pdf");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("dir/"), "file");
        assert_eq!(sanitize_filename("holiday photo.JPG"), "holiday photo.JPG");
    }
}
