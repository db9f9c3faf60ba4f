use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// The pipeline has all-or-nothing semantics: any error aborts the run and no
/// partial results are produced. Zero detected somas is *not* an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The source image could not be decoded, or has a zero dimension.
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    /// A stage received an intermediate whose shape does not match the
    /// reference raster. This signals a wiring bug, never bad input data.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dimension_mismatch(
        stage: &str,
        expected: (u32, u32),
        found: (u32, u32),
    ) -> Self {
        Error::InternalInconsistency(format!(
            "{stage}: expected {}x{} intermediate, found {}x{}",
            expected.0, expected.1, found.0, found.1
        ))
    }
}
