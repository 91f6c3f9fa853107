//! Asset kinds, object keys and name resolution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Kind of uploaded asset. Each kind lives under its own prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Final rendered video
    Video,
    /// Narration audio
    Audio,
}

impl AssetKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetKind::Video => "video-files",
            AssetKind::Audio => "audio-files",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AssetKind::Video => "mp4",
            AssetKind::Audio => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AssetKind::Video => "video/mp4",
            AssetKind::Audio => "audio/mpeg",
        }
    }

    /// Fresh storage-assigned name, e.g. `3f2a….mp4`.
    pub fn new_name(&self) -> String {
        format!("{}.{}", Uuid::new_v4(), self.extension())
    }

    /// Object key for `name` under this kind's prefix.
    pub fn object_key(&self, name: &str) -> String {
        format!("{}/{}", self.prefix(), name)
    }
}

/// Reduce a public URL, an object key, or a bare name to the asset name.
///
/// `https://cdn/audio-files/a.mp3?x=1`, `audio-files/a.mp3` and `a.mp3` all
/// resolve to `a.mp3`. Names containing path traversal are rejected.
pub fn resolve_asset_name(reference: &str) -> StorageResult<String> {
    let trimmed = reference.trim();
    let without_query = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let path = match url::Url::parse(without_query) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => without_query.to_string(),
    };

    let name = path.rsplit('/').next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StorageError::InvalidName(reference.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys() {
        assert_eq!(AssetKind::Video.object_key("a.mp4"), "video-files/a.mp4");
        assert_eq!(AssetKind::Audio.object_key("b.mp3"), "audio-files/b.mp3");
    }

    #[test]
    fn test_new_names_are_unique_and_typed() {
        let a = AssetKind::Video.new_name();
        let b = AssetKind::Video.new_name();
        assert_ne!(a, b);
        assert!(a.ends_with(".mp4"));
        assert!(AssetKind::Audio.new_name().ends_with(".mp3"));
    }

    #[test]
    fn test_resolve_asset_name() {
        for reference in [
            "https://cdn.example.com/audio-files/a.mp3",
            "https://cdn.example.com/audio-files/a.mp3?sig=abc",
            "audio-files/a.mp3",
            "a.mp3",
            "  a.mp3 ",
        ] {
            assert_eq!(resolve_asset_name(reference).unwrap(), "a.mp3", "{reference}");
        }
    }

    #[test]
    fn test_resolve_rejects_empty_names() {
        assert!(resolve_asset_name("").is_err());
        assert!(resolve_asset_name("https://cdn.example.com/").is_err());
        assert!(resolve_asset_name("audio-files/..").is_err());
    }
}
