use image::ImageError;

/// Error type for editor, file and encoding operations.
#[derive(Debug)]
pub enum EditorError {
    Io(std::io::Error),
    /// The input bytes could not be decoded into a raster.
    Decode(String),
    /// The surface could not be encoded for export.
    Encode(String),
    /// The operation needs a loaded image.
    NoImage,
    /// A rectangle did not fit the surface.
    InvalidRegion(String),
    /// A surface size was malformed or zero.
    InvalidSurface(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Io(e) => write!(f, "I/O error: {}", e),
            EditorError::Decode(e) => write!(f, "Decode error: {}", e),
            EditorError::Encode(e) => write!(f, "Encode error: {}", e),
            EditorError::NoImage => write!(f, "No image loaded"),
            EditorError::InvalidRegion(e) => write!(f, "Invalid region: {}", e),
            EditorError::InvalidSurface(e) => write!(f, "Invalid surface size: {}", e),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(e: std::io::Error) -> Self {
        EditorError::Io(e)
    }
}

impl From<ImageError> for EditorError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => EditorError::Io(io),
            ImageError::Decoding(d) => EditorError::Decode(d.to_string()),
            ImageError::Encoding(enc) => EditorError::Encode(enc.to_string()),
            other => EditorError::Decode(other.to_string()),
        }
    }
}
