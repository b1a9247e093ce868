//! Still-image validation for thumbnails, post images, and user icons.
//!
//! Dimensions are read from the image header only; pixels are never decoded.

use std::io::Cursor;

use crate::error::CoreError;
use crate::video::VideoType;

/// Upload ceiling for still images (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image content types and the file extension used for their keys.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Map an accepted image content type to its key extension.
pub fn image_extension(content_type: &str) -> Result<&'static str, CoreError> {
    IMAGE_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unsupported image type '{content_type}'. Must be JPEG, PNG, WebP or GIF"
            ))
        })
}

/// Read `(width, height)` from an encoded image.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), CoreError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Validation(format!("Unreadable image: {e}")))?
        .into_dimensions()
        .map_err(|e| CoreError::Validation(format!("Unreadable image: {e}")))
}

/// Validate an uploaded image's type and size, returning its key extension.
pub fn validate_image(bytes: &[u8], content_type: &str) -> Result<&'static str, CoreError> {
    let ext = image_extension(content_type)?;
    if bytes.is_empty() {
        return Err(CoreError::Validation("Image file is empty".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "Image is too large. Maximum is {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(ext)
}

/// Normal videos take landscape (or square) thumbnails; shorts take
/// portrait (or square) ones.
pub fn validate_thumbnail_aspect(
    (width, height): (u32, u32),
    video_type: VideoType,
) -> Result<(), CoreError> {
    let ok = match video_type {
        VideoType::Normal => width >= height,
        VideoType::Shorts => height >= width,
    };
    if ok {
        Ok(())
    } else {
        let expected = match video_type {
            VideoType::Normal => "landscape",
            VideoType::Shorts => "portrait",
        };
        Err(CoreError::Validation(format!(
            "Thumbnail for a {} video must be {expected} (got {width}x{height})",
            video_type.as_str()
        )))
    }
}
