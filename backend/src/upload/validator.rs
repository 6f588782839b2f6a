//! Size and media type checks over the declared upload metadata

use mime::Mime;
use strum::Display;

use super::{UploadError, UploadResult};

/// Maximum thumbnail size: 10 MiB
pub const THUMBNAIL_MAX_BYTES: u64 = 10 << 20;

/// Maximum video size: 1 GiB
pub const VIDEO_MAX_BYTES: u64 = 1 << 30;

/// Room left for multipart boundaries and part headers on top of the file itself
pub const MULTIPART_ENVELOPE_BYTES: u64 = 64 << 10;

/// Which asset of a video is being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    /// Still image shown for the video
    Thumbnail,
    /// The video file itself
    Video,
}

impl AssetKind {
    /// Largest accepted payload in bytes
    #[must_use]
    pub const fn max_bytes(self) -> u64 {
        match self {
            Self::Thumbnail => THUMBNAIL_MAX_BYTES,
            Self::Video => VIDEO_MAX_BYTES,
        }
    }

    /// Accepted media types
    #[must_use]
    pub const fn allowed_media_types(self) -> &'static [&'static str] {
        match self {
            Self::Thumbnail => &["image/jpeg", "image/png"],
            Self::Video => &["video/mp4"],
        }
    }

    /// Multipart field carrying the file
    #[must_use]
    pub const fn form_field(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Video => "video",
        }
    }

    /// Upper bound for a whole multipart request carrying this kind
    #[must_use]
    pub const fn request_limit(self) -> u64 {
        self.max_bytes() + MULTIPART_ENVELOPE_BYTES
    }
}

/// Upload metadata that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedPayload {
    kind: AssetKind,
    media_type: Mime,
    declared_size: Option<u64>,
}

impl ValidatedPayload {
    /// Asset kind the payload was validated for
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Media type without parameters, e.g. `image/png`
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.media_type.essence_str()
    }

    /// File extension derived from the media subtype
    #[must_use]
    pub fn extension(&self) -> &str {
        self.media_type.subtype().as_str()
    }

    /// Declared payload size, if the client sent one
    #[must_use]
    pub const fn declared_size(&self) -> Option<u64> {
        self.declared_size
    }

    /// Ceiling the measured size must stay under
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.kind.max_bytes()
    }
}

/// Validates declared size and media type for `kind`
///
/// The size is checked first so oversized payloads are rejected before anything else
/// about them is looked at.
///
/// # Errors
///
/// * `UploadError::PayloadTooLarge` - declared size above the ceiling for `kind`
/// * `UploadError::UnsupportedMediaType` - media type missing, unparsable or not allowed
pub fn validate(
    kind: AssetKind,
    declared_size: Option<u64>,
    media_type: Option<&str>,
) -> UploadResult<ValidatedPayload> {
    if let Some(size) = declared_size {
        check_size(kind, size)?;
    }

    let raw = media_type.unwrap_or_default().trim();
    let parsed: Mime = raw
        .parse()
        .map_err(|_| UploadError::UnsupportedMediaType(raw.to_string()))?;

    if !kind.allowed_media_types().contains(&parsed.essence_str()) {
        return Err(UploadError::UnsupportedMediaType(
            parsed.essence_str().to_string(),
        ));
    }

    Ok(ValidatedPayload {
        kind,
        media_type: parsed,
        declared_size,
    })
}

/// Rejects a payload whose size exceeds the ceiling for `kind`
///
/// # Errors
///
/// Returns `UploadError::PayloadTooLarge` when `size` is above the ceiling
pub fn check_size(kind: AssetKind, size: u64) -> UploadResult<()> {
    if size > kind.max_bytes() {
        return Err(UploadError::PayloadTooLarge {
            limit: kind.max_bytes(),
        });
    }
    Ok(())
}

/// Rejects a whole request whose `Content-Length` cannot possibly fit under the ceiling
///
/// # Errors
///
/// Returns `UploadError::PayloadTooLarge` when the request is larger than the file
/// ceiling plus the multipart envelope
pub fn check_request_length(kind: AssetKind, content_length: Option<u64>) -> UploadResult<()> {
    match content_length {
        Some(length) if length > kind.request_limit() => Err(UploadError::PayloadTooLarge {
            limit: kind.max_bytes(),
        }),
        _ => Ok(()),
    }
}
