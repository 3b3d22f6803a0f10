/// Failure modes of preview generation.
///
/// The generator never recovers from these itself; callers decide whether
/// to surface the error or store a placeholder.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Unsupported file format: {extension:?} (supported: png, jpg, jpeg, pdf)")]
    UnsupportedFormat { extension: Option<String> },

    #[error("Failed to decode file: {0}")]
    Decode(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("PDF renderer is not available")]
    RendererUnavailable,

    #[error("Failed to encode preview: {0}")]
    Encode(String),

    #[error("Preview size must be greater than zero")]
    InvalidSize,

    /// The blocking task running the generator panicked or was cancelled.
    #[error("Preview task failed: {0}")]
    TaskFailed(String),
}

impl From<image::ImageError> for PreviewError {
    fn from(err: image::ImageError) -> Self {
        PreviewError::Decode(err.to_string())
    }
}
