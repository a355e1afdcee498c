//! Content-type detection and presentation helpers.

use crate::vfs::FileMetadata;

/// Best-effort content classifier.
///
/// Consulted only when a backend reports no content type for a file.
pub trait MimeSniffer: Send + Sync {
    fn sniff(&self, bytes: &[u8]) -> Option<String>;
}

/// Magic-number sniffing via the `infer` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferSniffer;

impl MimeSniffer for InferSniffer {
    fn sniff(&self, bytes: &[u8]) -> Option<String> {
        infer::get(bytes).map(|kind| kind.mime_type().to_owned())
    }
}

/// Never classifies anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSniffer;

impl MimeSniffer for NoSniffer {
    fn sniff(&self, _bytes: &[u8]) -> Option<String> {
        None
    }
}

/// Coarse content category, keyed on the top-level MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeCategory {
    Text,
    Image,
    Video,
    /// Anything unrecognized, including no type at all.
    Other,
}

impl MimeCategory {
    const TABLE: &'static [(&'static str, MimeCategory)] = &[
        ("text", MimeCategory::Text),
        ("image", MimeCategory::Image),
        ("video", MimeCategory::Video),
    ];

    /// Categorize a MIME string such as `image/png`.
    pub fn from_mime(mime: Option<&str>) -> Self {
        let Some(top) = mime.and_then(|m| m.split('/').next()) else {
            return MimeCategory::Other;
        };
        Self::TABLE
            .iter()
            .find(|(prefix, _)| top.eq_ignore_ascii_case(prefix))
            .map_or(MimeCategory::Other, |(_, category)| *category)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MimeCategory::Text => "text",
            MimeCategory::Image => "image",
            MimeCategory::Video => "video",
            MimeCategory::Other => "other",
        }
    }
}

/// Content type for a file: the backend's report when non-empty, otherwise
/// whatever `sniffer` makes of `content`.
///
/// `content` is only evaluated when a sniff is actually needed.
pub async fn resolve_mime<F, Fut>(
    meta: &FileMetadata,
    sniffer: Option<&dyn MimeSniffer>,
    content: F,
) -> Option<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<Vec<u8>>>,
{
    if let Some(reported) = meta.reported_mime() {
        return Some(reported.to_owned());
    }
    let sniffer = sniffer?;
    let bytes = content().await?;
    sniffer.sniff(&bytes)
}

/// Human-readable byte size: `5 Bytes`, `1.5 KB`, `2.25 MB`.
pub fn human_size(size: u64) -> String {
    const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
