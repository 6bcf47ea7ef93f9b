use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image must be a data URI of the form data:image/<type>;base64,<data>")]
    Malformed,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image payload is not valid base64")]
    InvalidBase64,

    #[error("Image payload is empty")]
    Empty,
}

/// A decoded `data:image/<ext>;base64,...` payload.
#[derive(Debug)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn parse(data_uri: &str) -> Result<Self, ImageError> {
        let rest = data_uri
            .trim()
            .strip_prefix("data:image/")
            .ok_or(ImageError::Malformed)?;
        let (mime_ext, payload) = rest.split_once(";base64,").ok_or(ImageError::Malformed)?;

        let extension = mime_ext.to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageError::UnsupportedType(extension));
        }

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|_| ImageError::InvalidBase64)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        Ok(Self { extension, bytes })
    }
}

/// Stores recipe images under `<media root>/recipes/`.
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Write the image and return its path relative to the media root.
    pub async fn save(&self, image: &DecodedImage) -> Result<String> {
        let relative = format!("recipes/{}.{}", uuid::Uuid::new_v4(), image.extension);
        let file_path = self.media_root.join(&relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), bytes = image.bytes.len(), "Saved recipe image");
        Ok(relative)
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        let file_path = self.media_root.join(relative);
        if !is_inside_recipes_dir(Path::new(relative)) {
            warn!(path = %relative, "Refusing to delete image outside media/recipes");
            return;
        }

        if let Err(e) = fs::remove_file(&file_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %file_path.display(), error = %e, "Failed to delete recipe image");
        }
    }
}

fn is_inside_recipes_dir(relative: &Path) -> bool {
    let mut components = relative.components();
    matches!(
        components.next(),
        Some(std::path::Component::Normal(dir)) if dir == "recipes"
    ) && components.all(|c| matches!(c, std::path::Component::Normal(_)))
}
