//! Video enums, thumbnail settings, and metadata validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upload ceiling for raw video files (200 MiB).
pub const MAX_VIDEO_BYTES: u64 = 200 * 1024 * 1024;

/// Accepted raw video content types.
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
pub const MAX_GAME_TYPE_CHARS: usize = 50;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 30;

/// Default page size for `list_videos`.
pub const DEFAULT_VIDEO_LIMIT: i64 = 10;

/// Maximum page size for `list_videos`.
pub const MAX_VIDEO_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Mirrors `ck_videos_video_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Normal,
    Shorts,
}

impl VideoType {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "normal" => Ok(Self::Normal),
            "shorts" => Ok(Self::Shorts),
            other => Err(CoreError::Validation(format!(
                "Unknown video type '{other}'. Must be one of: normal, shorts"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Shorts => "shorts",
        }
    }
}

/// Orderings supported by `list_videos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSort {
    #[default]
    Latest,
    Earliest,
    Liked,
    Viewed,
}

/// Mirrors `ck_videos_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Processing,
    Ready,
    Error,
}

impl VideoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSource {
    Stream,
    Custom,
}

impl ThumbnailSource {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "stream" => Ok(Self::Stream),
            "custom" => Ok(Self::Custom),
            other => Err(CoreError::Validation(format!(
                "Unknown thumbnail source '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Custom => "custom",
        }
    }
}

// ---------------------------------------------------------------------------
// Thumbnail setting
// ---------------------------------------------------------------------------

/// Where a video's poster comes from.
///
/// A stream poster carries only its timestamp; a custom poster carries only
/// its object key. The three `videos` thumbnail columns are derived from
/// this, so the "exactly one of timestamp / key" invariant holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ThumbnailSetting {
    Stream { timestamp_secs: f64 },
    Custom { key: String },
}

impl ThumbnailSetting {
    pub fn source(&self) -> ThumbnailSource {
        match self {
            Self::Stream { .. } => ThumbnailSource::Stream,
            Self::Custom { .. } => ThumbnailSource::Custom,
        }
    }

    pub fn timestamp_secs(&self) -> Option<f64> {
        match self {
            Self::Stream { timestamp_secs } => Some(*timestamp_secs),
            Self::Custom { .. } => None,
        }
    }

    pub fn custom_key(&self) -> Option<&str> {
        match self {
            Self::Stream { .. } => None,
            Self::Custom { key } => Some(key),
        }
    }

    /// Rebuild from the `videos` columns, rejecting rows that break the
    /// invariant.
    pub fn from_columns(
        source: &str,
        timestamp_secs: Option<f64>,
        custom_key: Option<&str>,
    ) -> Result<Self, CoreError> {
        match (ThumbnailSource::from_name(source)?, timestamp_secs, custom_key) {
            (ThumbnailSource::Stream, Some(timestamp_secs), None) => {
                Ok(Self::Stream { timestamp_secs })
            }
            (ThumbnailSource::Custom, None, Some(key)) => Ok(Self::Custom {
                key: key.to_string(),
            }),
            _ => Err(CoreError::Internal(format!(
                "Inconsistent thumbnail columns for source '{source}'"
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Stream { timestamp_secs } => {
                if !timestamp_secs.is_finite() || *timestamp_secs < 0.0 {
                    return Err(CoreError::Validation(
                        "Thumbnail timestamp must be a non-negative number of seconds".into(),
                    ));
                }
                Ok(())
            }
            Self::Custom { key } => {
                if key.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "Custom thumbnail key must not be empty".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Convert a poster timestamp into the fraction of the video's duration the
/// transcoder expects. Returns `None` when the duration is unknown.
pub fn poster_fraction(timestamp_secs: f64, duration_secs: Option<f64>) -> Option<f64> {
    let duration = duration_secs.filter(|d| d.is_finite() && *d > 0.0)?;
    Some((timestamp_secs / duration).clamp(0.0, 1.0))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validated, normalized video metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMetadata {
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    pub tags: Vec<String>,
}

/// Validate metadata fields in order, returning the first violation.
///
/// Titles and game types are trimmed, blank descriptions become `None`, and
/// tags are trimmed and de-duplicated case-insensitively (first spelling
/// wins).
pub fn validate_metadata(
    title: &str,
    description: Option<&str>,
    game_type: &str,
    tags: &[String],
) -> Result<ValidMetadata, CoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("Title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let description = description.map(str::trim).filter(|d| !d.is_empty());
    if let Some(d) = description {
        if d.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(CoreError::Validation(format!(
                "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }

    let game_type = game_type.trim();
    if game_type.is_empty() {
        return Err(CoreError::Validation("Game type is required".into()));
    }
    if game_type.chars().count() > MAX_GAME_TYPE_CHARS {
        return Err(CoreError::Validation(format!(
            "Game type must be at most {MAX_GAME_TYPE_CHARS} characters"
        )));
    }

    let tags = normalize_tags(tags)?;

    Ok(ValidMetadata {
        title: title.to_string(),
        description: description.map(str::to_string),
        game_type: game_type.to_string(),
        tags,
    })
}

/// Trim, drop blanks, and de-duplicate tags case-insensitively.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, CoreError> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(CoreError::Validation(format!(
                "Tags must be at most {MAX_TAG_CHARS} characters"
            )));
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "A video can have at most {MAX_TAGS} tags"
        )));
    }
    Ok(out)
}

/// Reject uploads above `max_bytes` (or empty ones) before any bytes move.
pub fn validate_video_size(declared_bytes: u64, max_bytes: u64) -> Result<(), CoreError> {
    if declared_bytes == 0 {
        return Err(CoreError::Validation("Video file is empty".into()));
    }
    if declared_bytes > max_bytes {
        return Err(CoreError::Validation(format!(
            "Video file is too large ({declared_bytes} bytes). Maximum is {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn validate_video_content_type(content_type: &str) -> Result<(), CoreError> {
    if VIDEO_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported video type '{content_type}'. Must be one of: {VIDEO_CONTENT_TYPES:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn video_type_names() {
        assert_eq!(VideoType::from_name("shorts").unwrap(), VideoType::Shorts);
        assert_matches!(VideoType::from_name("Shorts"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn thumbnail_columns_round_trip() {
        let stream = ThumbnailSetting::Stream { timestamp_secs: 3.5 };
        assert_eq!(
            ThumbnailSetting::from_columns("stream", stream.timestamp_secs(), stream.custom_key())
                .unwrap(),
            stream
        );

        let custom = ThumbnailSetting::Custom {
            key: "thumbnails/normal/1-a.jpg".into(),
        };
        assert_eq!(custom.timestamp_secs(), None);
        assert_eq!(
            ThumbnailSetting::from_columns("custom", None, custom.custom_key()).unwrap(),
            custom
        );
    }

    #[test]
    fn thumbnail_columns_reject_mixed_state() {
        assert_matches!(
            ThumbnailSetting::from_columns("stream", Some(1.0), Some("k")),
            Err(CoreError::Internal(_))
        );
        assert_matches!(
            ThumbnailSetting::from_columns("custom", Some(1.0), None),
            Err(CoreError::Internal(_))
        );
    }

    #[test]
    fn thumbnail_setting_json_shape() {
        let parsed: ThumbnailSetting =
            serde_json::from_str(r#"{"source":"stream","timestamp_secs":2.0}"#).unwrap();
        assert_eq!(parsed, ThumbnailSetting::Stream { timestamp_secs: 2.0 });
    }

    #[test]
    fn negative_timestamp_rejected() {
        let setting = ThumbnailSetting::Stream { timestamp_secs: -1.0 };
        assert_matches!(setting.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn poster_fraction_clamps_and_needs_duration() {
        assert_eq!(poster_fraction(5.0, Some(20.0)), Some(0.25));
        assert_eq!(poster_fraction(50.0, Some(20.0)), Some(1.0));
        assert_eq!(poster_fraction(5.0, None), None);
        assert_eq!(poster_fraction(5.0, Some(0.0)), None);
    }

    #[test]
    fn metadata_first_violation_wins() {
        let long_title = "x".repeat(MAX_TITLE_CHARS + 1);
        let err = validate_metadata(&long_title, None, "", &[]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("Title"));
    }

    #[test]
    fn metadata_is_normalized() {
        let meta = validate_metadata(
            "  Clutch  ",
            Some("   "),
            " Valorant ",
            &tags(&["FPS", " fps ", "", "ranked"]),
        )
        .unwrap();
        assert_eq!(meta.title, "Clutch");
        assert_eq!(meta.description, None);
        assert_eq!(meta.game_type, "Valorant");
        assert_eq!(meta.tags, tags(&["FPS", "ranked"]));
    }

    #[test]
    fn too_many_tags_rejected() {
        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        assert_matches!(normalize_tags(&many), Err(CoreError::Validation(_)));
    }

    #[test]
    fn video_size_ceiling() {
        assert!(validate_video_size(MAX_VIDEO_BYTES, MAX_VIDEO_BYTES).is_ok());
        assert_matches!(
            validate_video_size(MAX_VIDEO_BYTES + 1, MAX_VIDEO_BYTES),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_video_size(0, MAX_VIDEO_BYTES),
            Err(CoreError::Validation(_))
        );
    }
}
