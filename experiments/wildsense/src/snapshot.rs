use {
    anyhow::{Result, bail},
    image::Image,
    std::path::{Path, PathBuf},
};

pub const SNAPSHOT_NAME: &str = "capture.png";

/// Write `frame` as `capture.png` into `dir`, replacing an older snapshot.
pub fn save_snapshot(frame: Option<&Image>, dir: &Path) -> Result<PathBuf> {
    let Some(frame) = frame else {
        bail!("no frame captured yet");
    };
    let png = image::to_png(frame)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(SNAPSHOT_NAME);
    std::fs::write(&path, png)?;
    Ok(path)
}

/// Mime type for a photo path, from its extension.
pub fn photo_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some(image::JPEG_MIME),
        "png" => Some(image::PNG_MIME),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
