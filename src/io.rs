use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use rfd::FileDialog;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use crate::error::EditorError;

/// File name the save dialog and the CLI suggest.
pub const DEFAULT_EXPORT_NAME: &str = "mosaic-image.png";

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "bmp", "tga", "gif", "ico", "tiff", "tif",
];

// ============================================================================
// DECODE / ENCODE
// ============================================================================

pub fn load_image_bytes(bytes: &[u8]) -> Result<RgbaImage, EditorError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Read and decode any format the `image` crate understands (first frame
/// for animations).
pub fn load_image_sync(path: &Path) -> Result<RgbaImage, EditorError> {
    let bytes = std::fs::read(path)?;
    load_image_bytes(&bytes)
}

/// Lossless PNG encoding of an RGBA8 buffer.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out)
}

pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), EditorError> {
    let bytes = encode_png(image)?;
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// `true` for extensions the open dialog offers.
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

// ============================================================================
// BACKGROUND IO
// ============================================================================

/// Result delivered from a background IO task.
pub enum IoResult {
    ImageLoaded { image: RgbaImage, path: PathBuf },
    LoadFailed(String),
    Saved { path: PathBuf },
    SaveFailed(String),
}

/// Decode `path` on the rayon pool and report through `sender`.
pub fn spawn_load(path: PathBuf, sender: Sender<IoResult>) {
    rayon::spawn(move || match load_image_sync(&path) {
        Ok(image) => {
            let _ = sender.send(IoResult::ImageLoaded { image, path });
        }
        Err(e) => {
            crate::log_err!("failed to load {}: {}", path.display(), e);
            let _ = sender.send(IoResult::LoadFailed(e.to_string()));
        }
    });
}

/// Write already-encoded PNG bytes on the rayon pool.
pub fn spawn_save(bytes: Vec<u8>, path: PathBuf, sender: Sender<IoResult>) {
    rayon::spawn(move || match std::fs::write(&path, &bytes) {
        Ok(()) => {
            crate::log_info!("saved {}", path.display());
            let _ = sender.send(IoResult::Saved { path });
        }
        Err(e) => {
            crate::log_err!("failed to save {}: {}", path.display(), e);
            let _ = sender.send(IoResult::SaveFailed(e.to_string()));
        }
    });
}

// ============================================================================
// FILE DIALOGS
// ============================================================================

#[derive(Default)]
pub struct FileHandler {
    /// Last image opened; the save dialog starts in its directory.
    pub current_path: Option<PathBuf>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native dialog for picking an image to open.
    pub fn pick_image(&self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("All Files", &["*"]);
        if let Some(dir) = self.current_dir() {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    /// Native save dialog, pre-filled with `mosaic-image.png`.
    pub fn pick_save_path(&self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(DEFAULT_EXPORT_NAME);
        if let Some(dir) = self.current_dir() {
            dialog = dialog.set_directory(dir);
        }
        dialog.save_file()
    }

    fn current_dir(&self) -> Option<&Path> {
        self.current_path.as_deref().and_then(Path::parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_is_lossless() {
        let img = RgbaImage::from_fn(7, 5, |x, y| Rgba([x as u8 * 30, y as u8 * 40, 9, (x + y) as u8 * 20]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(load_image_bytes(&bytes).unwrap(), img);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(load_image_bytes(b"not an image"), Err(EditorError::Decode(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_image_sync(&dir.path().join("missing.png")), Err(EditorError::Io(_))));
    }

    #[test]
    fn write_png_creates_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let img = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        write_png(&img, &path).unwrap();
        assert_eq!(load_image_sync(&path).unwrap(), img);
    }

    #[test]
    fn extension_filter() {
        assert!(is_supported_extension(Path::new("a/b.JPG")));
        assert!(!is_supported_extension(Path::new("notes.txt")));
        assert!(!is_supported_extension(Path::new("noext")));
    }
}
