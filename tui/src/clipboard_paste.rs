//! Clipboard access and pasted-path recognition.
//!
//! Terminals deliver pastes as text. Two kinds of paste carry images:
//!
//! - <kbd>Ctrl</kbd>+<kbd>V</kbd> / <kbd>Alt</kbd>+<kbd>V</kbd> reads the system clipboard image
//!   directly ([`paste_image_as_png`]).
//! - Dropping files onto the terminal pastes their paths. [`pasted_image_paths`] recognizes a paste
//!   that consists only of image paths so it can be treated as a file selection.

use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PasteImageError {
    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
    #[error("no image on clipboard: {0}")]
    NoImage(String),
    #[error("could not encode image: {0}")]
    EncodeFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastedImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Capture the clipboard image and re-encode it as PNG.
pub fn paste_image_as_png() -> Result<(Vec<u8>, PastedImageInfo), PasteImageError> {
    tracing::debug!("attempting clipboard image read");
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| PasteImageError::ClipboardUnavailable(e.to_string()))?;
    let img = clipboard
        .get_image()
        .map_err(|e| PasteImageError::NoImage(e.to_string()))?;
    let width = u32::try_from(img.width)
        .map_err(|_| PasteImageError::EncodeFailed("image too wide".to_string()))?;
    let height = u32::try_from(img.height)
        .map_err(|_| PasteImageError::EncodeFailed("image too tall".to_string()))?;

    let Some(rgba) = image::RgbaImage::from_raw(width, height, img.bytes.into_owned()) else {
        return Err(PasteImageError::EncodeFailed(
            "invalid RGBA buffer".to_string(),
        ));
    };
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| PasteImageError::EncodeFailed(e.to_string()))?;

    tracing::debug!("clipboard image {width}x{height} encoded to PNG ({} bytes)", png.len());
    Ok((png, PastedImageInfo { width, height }))
}

/// Normalize pasted text that may represent a single filesystem path.
///
/// Supports `file://` URLs, Windows drive and UNC paths (converted under WSL), and shell-escaped
/// or quoted POSIX paths.
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return None;
    }

    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    // POSIX shlex would treat the backslashes as escapes.
    if looks_like_windows_path(pasted) {
        #[cfg(target_os = "linux")]
        {
            if is_probably_wsl()
                && let Some(converted) = convert_windows_path_to_wsl(pasted)
            {
                return Some(converted);
            }
        }
        return Some(PathBuf::from(pasted));
    }

    let mut parts = shlex::Shlex::new(pasted);
    match (parts.next(), parts.next()) {
        (Some(single), None) => Some(PathBuf::from(single)),
        _ => None,
    }
}

/// Recognize a paste made only of paths to existing image files (drag and drop from a file
/// manager). Returns the paths in paste order, or `None` when any token is not such a path.
pub fn pasted_image_paths(pasted: &str) -> Option<Vec<PathBuf>> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return None;
    }

    let tokens: Vec<String> = if pasted.contains('\n') {
        pasted
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else if looks_like_windows_path(pasted) {
        vec![pasted.to_string()]
    } else {
        shlex::split(pasted)?
    };

    let mut paths = Vec::with_capacity(tokens.len());
    for token in tokens {
        let path = normalize_pasted_path(&quote_if_needed(&token))?;
        if !path.is_file() || !is_image_path(&path) {
            return None;
        }
        paths.push(path);
    }
    (!paths.is_empty()).then_some(paths)
}

/// Tokens from `shlex::split` are already unescaped; quote them again so `normalize_pasted_path`
/// does not split on embedded spaces.
fn quote_if_needed(token: &str) -> String {
    if token.contains(char::is_whitespace) && !looks_like_windows_path(token) {
        shlex::try_quote(token).map_or_else(|_| token.to_string(), |quoted| quoted.into_owned())
    } else {
        token.to_string()
    }
}

/// True when the extension maps to an `image/*` MIME type (the picker's `image/*` filter).
pub fn is_image_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first_raw()
        .is_some_and(|mime| mime.starts_with("image/"))
}

fn looks_like_windows_path(pasted: &str) -> bool {
    let mut chars = pasted.chars();
    let drive = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.next() == Some(':')
        && matches!(chars.next(), Some('\\' | '/'));
    drive || pasted.starts_with("\\\\")
}

#[cfg(target_os = "linux")]
pub fn is_probably_wsl() -> bool {
    if let Ok(version) = std::fs::read_to_string("/proc/version") {
        let version = version.to_lowercase();
        if version.contains("microsoft") || version.contains("wsl") {
            return true;
        }
    }

    // Custom WSL kernels may not mention WSL in /proc/version.
    std::env::var_os("WSL_DISTRO_NAME").is_some() || std::env::var_os("WSL_INTEROP").is_some()
}

#[cfg(target_os = "linux")]
fn convert_windows_path_to_wsl(input: &str) -> Option<PathBuf> {
    if input.starts_with("\\\\") {
        return None;
    }

    let drive_letter = input.chars().next()?.to_ascii_lowercase();
    if !drive_letter.is_ascii_lowercase() || input.get(1..2) != Some(":") {
        return None;
    }

    let mut result = PathBuf::from(format!("/mnt/{drive_letter}"));
    for component in input
        .get(2..)?
        .split(['\\', '/'])
        .filter(|component| !component.is_empty())
    {
        result.push(component);
    }
    Some(result)
}
