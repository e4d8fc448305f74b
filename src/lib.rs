//! MosaicFE: blur rectangular regions of a raster image.
//!
//! The engine (`canvas`, `ops`, `components`, `editor`) has no GUI state and
//! is driven by both the egui shell in [`app`] and the headless [`cli`].

#[macro_use]
pub mod logger;
#[macro_use]
pub mod i18n;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod editor;
pub mod error;
pub mod io;
pub mod ops;
pub mod settings;

pub use canvas::{CoordinateMapper, PixelRect, RasterSurface};
pub use editor::Editor;
pub use error::EditorError;
pub use ops::filters::BlurStrength;
