//! Recognition of welcome image files by extension.

use std::path::Path;

/// Lowercase extensions accepted as welcome images.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Returns `true` if `path` has one of [`IMAGE_EXTENSIONS`], compared
/// case-insensitively.
pub fn is_welcome_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_extensions_in_any_case() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.Gif"] {
            assert!(is_welcome_image(Path::new(name)), "{name} must be accepted");
        }
    }

    #[test]
    fn test_rejects_other_files() {
        for name in ["notes.txt", "video.mp4", "png", ".gitkeep", "image.png.bak"] {
            assert!(!is_welcome_image(Path::new(name)), "{name} must be rejected");
        }
    }
}
