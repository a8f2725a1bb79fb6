//! Status image rendering.
//!
//! The artwork is fetched, composed off the async runtime and written next to
//! the served file with a rename, so the HTTP server never sees a partial PNG.

mod compose;
mod error;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ab_glyph::FontVec;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::{
    bridge::{ActiveSelection, Renderer},
    publish::ImageReadyMessage,
};

pub use compose::{
    CANVAS_HEIGHT, CANVAS_WIDTH, compose, dominant_color, placeholder_artwork, truncate,
};
pub use error::RenderError;

/// Caption used when nothing is playing.
pub const IDLE_CAPTION: &str = "Not Playing";

/// Where the image goes and how it is announced.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Directory served over HTTP
    pub directory: PathBuf,
    /// File name inside `directory`
    pub filename: String,
    /// Public URL of the file, without cache buster
    pub base_url: String,
    /// TTF/OTF used for the captions
    pub font_path: Option<PathBuf>,
    /// Caption size in pixels
    pub font_size: f32,
}

/// Renders the active selection into a PNG on disk.
pub struct ImageRenderer {
    http: Client,
    settings: RenderSettings,
    font: Option<Arc<FontVec>>,
}

impl ImageRenderer {
    /// Creates a renderer, loading the caption font if one is configured.
    ///
    /// # Errors
    /// Returns error if the font file cannot be read or parsed
    pub fn new(http: Client, settings: RenderSettings) -> Result<Self, RenderError> {
        let font = match &settings.font_path {
            Some(path) => Some(Arc::new(load_font(path)?)),
            None => {
                warn!("no font configured, captions will not be drawn");
                None
            }
        };

        Ok(Self {
            http,
            settings,
            font,
        })
    }

    /// Final location of the rendered file.
    pub fn output_path(&self) -> PathBuf {
        self.settings.directory.join(&self.settings.filename)
    }

    async fn fetch_artwork(&self, reference: &str) -> Result<Vec<u8>, RenderError> {
        if let Some(path) = reference.strip_prefix("file://") {
            return Ok(tokio::fs::read(path).await?);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            let bytes = self
                .http
                .get(reference)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            return Ok(bytes.to_vec());
        }

        Ok(tokio::fs::read(reference).await?)
    }

    /// Artwork bytes, or `None` to use the placeholder.
    ///
    /// Missing files and HTTP client errors fall back to the placeholder.
    /// Transport failures and server errors are returned so the dispatch is
    /// retried on the next tick.
    async fn artwork_bytes(&self, reference: &str) -> Result<Option<Vec<u8>>, RenderError> {
        if reference.is_empty() {
            return Ok(None);
        }

        match self.fetch_artwork(reference).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(RenderError::Fetch(e)) if is_transient(&e) => Err(RenderError::Fetch(e)),
            Err(e) => {
                warn!(artwork = reference, error = %e, "using placeholder artwork");
                Ok(None)
            }
        }
    }
}

/// Whether a download failure may succeed on a later attempt.
fn is_transient(error: &reqwest::Error) -> bool {
    error.status().is_none_or(|status| status.is_server_error())
}

fn load_font(path: &Path) -> Result<FontVec, RenderError> {
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec(bytes).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))
}

fn decode_or_placeholder(bytes: Option<Vec<u8>>) -> DynamicImage {
    match bytes.map(|bytes| image::load_from_memory(&bytes)) {
        Some(Ok(artwork)) => artwork,
        Some(Err(e)) => {
            warn!(error = %e, "artwork is not a supported image, using placeholder");
            placeholder_artwork()
        }
        None => placeholder_artwork(),
    }
}

/// Writes `image` as PNG to a sibling temp file, then renames it into place.
fn write_atomically(image: &image::RgbaImage, target: &Path) -> Result<(), RenderError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = image.save_with_format(&temp, ImageFormat::Png) {
        let _ = std::fs::remove_file(&temp);
        return Err(match e {
            image::ImageError::IoError(e) => RenderError::Io(e),
            e => RenderError::Encode(e),
        });
    }
    std::fs::rename(&temp, target)?;
    Ok(())
}

#[async_trait]
impl Renderer for ImageRenderer {
    #[instrument(skip_all, fields(title = %selection.title()))]
    async fn render(&self, selection: &ActiveSelection) -> Result<ImageReadyMessage, RenderError> {
        let (title, artist) = if selection.is_idle() {
            (IDLE_CAPTION.to_string(), String::new())
        } else {
            (selection.title().to_string(), selection.artist().to_string())
        };

        let bytes = self.artwork_bytes(selection.artwork_reference()).await?;
        let font = self.font.clone();
        let font_size = self.settings.font_size;
        let target = self.output_path();
        let (caption_title, caption_artist) = (title.clone(), artist.clone());

        tokio::task::spawn_blocking(move || {
            let artwork = decode_or_placeholder(bytes);
            let image = compose(
                &artwork,
                &caption_title,
                &caption_artist,
                font.as_deref().map(|font| (font, font_size)),
            );
            write_atomically(&image, &target)
        })
        .await??;

        debug!(path = %self.output_path().display(), "status image written");

        let timestamp = chrono::Utc::now().timestamp();
        Ok(ImageReadyMessage::new(
            &self.settings.base_url,
            &title,
            &artist,
            timestamp,
        ))
    }
}
