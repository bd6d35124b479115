/// Media kind classification by file extension
use serde::{Deserialize, Serialize};

/// Coarse media kind derived from an attachment's file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

const EXTENSIONS: &[(&str, MediaKind)] = &[
    ("jpeg", MediaKind::Image),
    ("jpg", MediaKind::Image),
    ("gif", MediaKind::Image),
    ("png", MediaKind::Image),
    ("mov", MediaKind::Video),
    ("mp4", MediaKind::Video),
    ("avi", MediaKind::Video),
    ("flv", MediaKind::Video),
    ("wmv", MediaKind::Video),
];

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Unknown => "unknown",
        }
    }

    /// Parse the indexed string form
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "unknown" => Some(MediaKind::Unknown),
            _ => None,
        }
    }
}

/// Classify a file name by its extension.
///
/// Matching is case-insensitive on the suffix after the last `.` of the final
/// path component, so a bare `.png` counts as a png. Names without a `.` are
/// `Unknown`.
pub fn classify(file_name: &str) -> MediaKind {
    let base = file_name.rsplit('/').next().unwrap_or_default();
    let extension = match base.rfind('.') {
        Some(dot) => base[dot + 1..].to_ascii_lowercase(),
        None => return MediaKind::Unknown,
    };

    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, kind)| *kind)
        .unwrap_or(MediaKind::Unknown)
}

/// Best-effort content type for a kind when the client did not send one
pub fn default_content_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image/*",
        MediaKind::Video => "video/*",
        MediaKind::Unknown => "application/octet-stream",
    }
}
