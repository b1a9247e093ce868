//! Public read URLs for stored objects and transcoded assets.
//!
//! Pure string construction: responses embed these so clients can fetch
//! thumbnails and playlists without going through the API.

/// Base URLs for public reads.
#[derive(Debug, Clone)]
pub struct PublicUrls {
    /// Public base for object-store keys, e.g. `https://media.example.com`.
    pub storage_base: String,
    /// Delivery base for transcoded assets, e.g.
    /// `https://customer-abc123.cloudflarestream.com`.
    pub stream_base: String,
}

impl PublicUrls {
    pub fn new(storage_base: impl Into<String>, stream_base: impl Into<String>) -> Self {
        Self {
            storage_base: storage_base.into().trim_end_matches('/').to_string(),
            stream_base: stream_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of an object-store key.
    pub fn object(&self, key: &str) -> String {
        format!("{}/{}", self.storage_base, key.trim_start_matches('/'))
    }

    /// URL for a user image: external URLs pass through, keys are resolved.
    pub fn user_image(&self, image: &str) -> String {
        if image.starts_with("https://") || image.starts_with("http://") {
            image.to_string()
        } else {
            self.object(image)
        }
    }

    /// Poster frame of a transcoded asset, optionally at a timestamp.
    pub fn stream_thumbnail(&self, asset_id: &str, timestamp_secs: Option<f64>) -> String {
        let base = format!("{}/{asset_id}/thumbnails/thumbnail.jpg", self.stream_base);
        match timestamp_secs {
            Some(t) => format!("{base}?time={}s", format_seconds(t)),
            None => base,
        }
    }

    /// HLS playlist of a transcoded asset.
    pub fn stream_playback(&self, asset_id: &str) -> String {
        format!("{}/{asset_id}/manifest/video.m3u8", self.stream_base)
    }
}

/// Whole seconds print without a fraction (`3s`), others with up to three
/// decimals (`2.5s`).
fn format_seconds(t: f64) -> String {
    if t.fract() == 0.0 {
        format!("{}", t as i64)
    } else {
        let s = format!("{t:.3}");
        s.trim_end_matches('0').to_string()
    }
}
