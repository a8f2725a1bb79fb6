use std::io;

/// Errors raised while producing the status image.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Artwork could not be downloaded
    #[error("artwork download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Composed image could not be encoded as PNG
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Artwork file could not be read or the image could not be written
    #[error("image I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Font file could not be parsed
    #[error("invalid font: {0}")]
    Font(String),

    /// Compositing task did not finish
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
