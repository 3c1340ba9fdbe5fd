#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
