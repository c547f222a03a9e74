//! Turns an uploaded file into the wizard's photo.

use base64::Engine;
use thiserror::Error;
use tracing::info;

use crate::models::UserImage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageInputError {
    #[error("Please upload a valid image file.")]
    NotAnImage,
    #[error("No file was uploaded.")]
    Missing,
    #[error("Image is too large ({size} bytes, limit {limit}).")]
    TooLarge { size: usize, limit: usize },
}

/// Accepts `image/*` uploads. A missing or generic declared type falls back
/// to sniffing the bytes.
pub fn accept_upload(content_type: Option<&str>, bytes: &[u8], limit: usize) -> Result<UserImage, ImageInputError> {
    if bytes.is_empty() {
        return Err(ImageInputError::Missing);
    }
    if bytes.len() > limit {
        return Err(ImageInputError::TooLarge { size: bytes.len(), limit });
    }

    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    let mime_type = match declared {
        Some(ct) if ct.starts_with("image/") => ct,
        Some(_) => return Err(ImageInputError::NotAnImage),
        None => image::guess_format(bytes)
            .map_err(|_| ImageInputError::NotAnImage)?
            .to_mime_type()
            .to_string(),
    };

    info!("📷 Accepted {} upload ({} bytes)", mime_type, bytes.len());
    Ok(UserImage::new(mime_type, base64::engine::general_purpose::STANDARD.encode(bytes)))
}
