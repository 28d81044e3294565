use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

pub const MAX_STADIUM_IMAGES: usize = 5;
const DATA_IMAGE_PREFIX: &str = "data:image/";

/// Received images are only checked for the data-URI prefix, never decoded.
pub fn is_data_image(value: &str) -> bool {
    value.starts_with(DATA_IMAGE_PREFIX)
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

pub fn encode_image_file(path: &Path) -> Result<String> {
    let mime = mime_for_path(path)
        .ok_or_else(|| anyhow!("unsupported image type: {}", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("read image {}", path.display()))?;
    Ok(encode_data_uri(mime, &bytes))
}

/// Splits a comma separated list of paths, skipping blanks.
pub fn split_paths(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn encode_image_list(raw: &str) -> Result<Vec<String>> {
    split_paths(raw)
        .into_iter()
        .map(|p| encode_image_file(Path::new(p)))
        .collect()
}

/// Slots left for new uploads once `removing` of `existing` images are gone.
pub fn available_slots(existing: usize, removing: usize) -> usize {
    MAX_STADIUM_IMAGES.saturating_sub(existing.saturating_sub(removing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_check_only() {
        assert!(is_data_image("data:image/png;base64,AAAA"));
        assert!(is_data_image("data:image/whatever"));
        assert!(!is_data_image("https://example.com/a.png"));
        assert!(!is_data_image(""));
    }

    #[test]
    fn encodes_known_extensions() {
        assert_eq!(mime_for_path(Path::new("shield.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("a/b.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(encode_data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn slots_respect_cap() {
        assert_eq!(available_slots(0, 0), 5);
        assert_eq!(available_slots(5, 0), 0);
        assert_eq!(available_slots(5, 2), 2);
        assert_eq!(available_slots(3, 9), 5);
    }

    #[test]
    fn splits_paths() {
        assert_eq!(split_paths(" a.png, ,b.jpg "), vec!["a.png", "b.jpg"]);
        assert!(split_paths("").is_empty());
    }
}
