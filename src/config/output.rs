use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::publish::image_base_url;

/// File server for the rendered image.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Run the built-in file server.
    pub enabled: bool,

    /// Address the display uses to reach this host. Required when rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,

    /// Listening port.
    pub port: u16,

    /// Served directory; the image is written here.
    pub directory: PathBuf,

    /// Image file name inside `directory`.
    pub filename: String,
}

impl HttpConfig {
    /// Public URL of the image, if `host_ip` is known.
    pub fn image_url(&self) -> Option<String> {
        self.host_ip
            .as_deref()
            .map(|host| image_base_url(host, self.port, &self.filename))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host_ip: None,
            port: 8000,
            directory: PathBuf::from("htdocs"),
            filename: "artwork.png".to_string(),
        }
    }
}

/// Status image appearance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Render and announce the status image.
    pub enabled: bool,

    /// TTF/OTF font for the captions; without one no text is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Caption size in pixels.
    pub font_size: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
            font_size: 14.0,
        }
    }
}
