use std::path::{Path, PathBuf};

use egui::Pos2;
use image::RgbaImage;

use crate::canvas::{CoordinateMapper, PixelRect, RasterSurface};
use crate::components::history::{HistoryEntry, HistoryStack, MAX_HISTORY};
use crate::components::selection::{MIN_SELECTION_SIZE, SelectionOutcome, SelectionTool};
use crate::error::EditorError;
use crate::ops::filters::BlurStrength;
use crate::ops::region::blur_region;

/// The single open document: surface, source image, history and the live
/// selection. Event handlers reach all of it through `&mut self`, so they
/// always act on the current state.
pub struct Editor {
    surface: RasterSurface,
    /// Decoded image as loaded, before fitting; redrawn by "clear effects".
    original: Option<RgbaImage>,
    history: HistoryStack,
    selection: SelectionTool,
    blur_strength: BlurStrength,
    /// Bumped on every surface change.
    generation: u64,
    /// `None` until an image arrives.
    pub path: Option<PathBuf>,
    /// Display name (file name of the loaded image)
    pub name: String,
}

impl Editor {
    pub fn new(width: u32, height: u32) -> Self {
        let surface = RasterSurface::new(width, height);
        if surface.is_degenerate() {
            crate::log_warn!("editor surface is {}x{}: editing disabled", width, height);
        }
        Self {
            surface,
            original: None,
            history: HistoryStack::new(MAX_HISTORY),
            selection: SelectionTool::new(),
            blur_strength: BlurStrength::default(),
            generation: 0,
            path: None,
            name: String::new(),
        }
    }

    /// `false` when the surface has no area; the editor then ignores input.
    pub fn is_supported(&self) -> bool {
        !self.surface.is_degenerate()
    }

    pub fn has_image(&self) -> bool {
        self.original.is_some()
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn selection(&self) -> &SelectionTool {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn blur_strength(&self) -> BlurStrength {
        self.blur_strength
    }

    /// Read again at the moment a selection commits.
    pub fn set_blur_strength(&mut self, strength: BlurStrength) {
        self.blur_strength = strength;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- load -------------------------------------------------------------

    /// Fit `image` into the surface and start a fresh history with it.
    pub fn load_image(&mut self, image: RgbaImage) -> bool {
        if !self.is_supported() {
            return false;
        }
        let placement = self.surface.draw_fitted(&image);
        crate::log_info!(
            "loaded {}x{} image at {:?} on {}x{} surface",
            image.width(),
            image.height(),
            placement,
            self.surface.width(),
            self.surface.height()
        );
        self.original = Some(image);
        self.selection = SelectionTool::new();
        self.history
            .reset(HistoryEntry::capture(&self.surface, t!("history.load")));
        self.touch();
        true
    }

    /// Like [`load_image`](Self::load_image), remembering where it came from.
    pub fn load_image_from(&mut self, image: RgbaImage, path: &Path) -> bool {
        if !self.load_image(image) {
            return false;
        }
        self.name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.path = Some(path.to_path_buf());
        true
    }

    // ---- pointer ----------------------------------------------------------

    pub fn pointer_down(&mut self, page_pos: Pos2, mapper: &CoordinateMapper) -> bool {
        self.has_image() && self.is_supported() && self.selection.begin(page_pos, mapper)
    }

    pub fn pointer_move(&mut self, page_pos: Pos2, mapper: &CoordinateMapper) {
        self.selection.queue_move(page_pos, mapper);
    }

    /// Once per display frame.
    pub fn frame(&mut self) -> bool {
        self.selection.apply_pending()
    }

    /// Pointer released or left the surface: commit the drag.
    pub fn pointer_up(&mut self) -> SelectionOutcome {
        let outcome = self
            .selection
            .finish(self.surface.width(), self.surface.height());
        self.handle_outcome(outcome)
    }

    /// Blur a rectangle given in raster coordinates, under the same size
    /// policy and clamping as a drag.
    pub fn apply_blur(&mut self, left: i64, top: i64, width: i64, height: i64) -> SelectionOutcome {
        if !self.has_image() {
            return SelectionOutcome::NoImage;
        }
        let outcome = if width < MIN_SELECTION_SIZE || height < MIN_SELECTION_SIZE {
            SelectionOutcome::TooSmall
        } else {
            match PixelRect::clamp_to_surface(
                left,
                top,
                width,
                height,
                self.surface.width(),
                self.surface.height(),
            ) {
                Some(rect) => SelectionOutcome::Committed(rect),
                None => SelectionOutcome::OffSurface,
            }
        };
        self.handle_outcome(outcome)
    }

    fn handle_outcome(&mut self, outcome: SelectionOutcome) -> SelectionOutcome {
        match outcome {
            SelectionOutcome::Committed(rect) => {
                let strength = self.blur_strength;
                if blur_region(&mut self.surface, &rect, strength) {
                    crate::log_info!("blur {:?} at strength {}", rect, strength.value());
                    self.history
                        .push(HistoryEntry::capture(&self.surface, t!("history.blur")));
                    self.touch();
                }
            }
            SelectionOutcome::TooSmall | SelectionOutcome::OffSurface => {
                crate::log_info!("selection discarded: {:?}", outcome);
            }
            SelectionOutcome::NotDragging | SelectionOutcome::NoImage => {}
        }
        outcome
    }

    // ---- history ----------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let restored = match self.history.undo() {
            Some(entry) => entry.restore_into(&mut self.surface),
            None => false,
        };
        if restored {
            self.touch();
        }
        restored
    }

    pub fn redo(&mut self) -> bool {
        let restored = match self.history.redo() {
            Some(entry) => entry.restore_into(&mut self.surface),
            None => false,
        };
        if restored {
            self.touch();
        }
        restored
    }

    /// Redraw the image as loaded. Recorded as a new, undoable entry.
    pub fn clear_effects(&mut self) -> bool {
        let Some(original) = self.original.as_ref() else {
            return false;
        };
        self.surface.draw_fitted(original);
        self.history
            .push(HistoryEntry::capture(&self.surface, t!("history.clear")));
        self.touch();
        true
    }

    // ---- export -----------------------------------------------------------

    /// PNG bytes of the current surface.
    pub fn export_png(&self) -> Result<Vec<u8>, EditorError> {
        if !self.has_image() {
            return Err(EditorError::NoImage);
        }
        crate::io::encode_png(self.surface.pixels())
    }

    pub fn save_png(&self, path: &Path) -> Result<(), EditorError> {
        if !self.has_image() {
            return Err(EditorError::NoImage);
        }
        crate::io::write_png(self.surface.pixels(), path)?;
        crate::log_info!("saved {}", path.display());
        Ok(())
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Rect, Vec2};
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn mapper_for(editor: &Editor) -> CoordinateMapper {
        let s = editor.surface();
        CoordinateMapper::new(
            Rect::from_min_size(Pos2::ZERO, Vec2::new(s.width() as f32, s.height() as f32)),
            s.width(),
            s.height(),
        )
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8, 255]))
    }

    fn drag(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) -> SelectionOutcome {
        let mapper = mapper_for(editor);
        assert!(editor.pointer_down(Pos2::new(from.0, from.1), &mapper));
        editor.pointer_move(Pos2::new(to.0, to.1), &mapper);
        editor.frame();
        editor.pointer_up()
    }

    #[test]
    fn load_resets_history_to_one_entry() {
        let mut editor = Editor::new(50, 50);
        assert!(editor.load_image(gradient(50, 50)));
        drag(&mut editor, (5.0, 5.0), (30.0, 30.0));
        assert_eq!(editor.history().len(), 2);

        assert!(editor.load_image(gradient(20, 10)));
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.can_undo());
    }

    #[test]
    fn degenerate_selection_changes_nothing() {
        let mut editor = Editor::new(40, 40);
        editor.load_image(gradient(40, 40));
        let before = editor.surface().clone();
        let generation = editor.generation();

        assert_eq!(drag(&mut editor, (10.0, 10.0), (11.0, 30.0)), SelectionOutcome::TooSmall);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(*editor.surface(), before);
        assert_eq!(editor.generation(), generation);
    }

    #[test]
    fn blur_then_undo_redo_round_trip() {
        let mut editor = Editor::new(40, 40);
        editor.load_image(gradient(40, 40));
        let loaded = editor.surface().clone();

        let outcome = drag(&mut editor, (5.0, 5.0), (25.0, 25.0));
        assert_eq!(outcome, SelectionOutcome::Committed(PixelRect::new(5, 5, 20, 20)));
        let blurred = editor.surface().clone();
        assert_ne!(blurred, loaded);

        assert!(editor.undo());
        assert_eq!(*editor.surface(), loaded);
        assert!(!editor.undo());
        assert!(editor.redo());
        assert_eq!(*editor.surface(), blurred);
        assert!(!editor.redo());
    }

    #[test]
    fn strength_is_sampled_at_release() {
        let mut a = Editor::new(30, 30);
        let mut b = Editor::new(30, 30);
        a.load_image(gradient(30, 30));
        b.load_image(gradient(30, 30));

        a.set_blur_strength(BlurStrength::new(0));
        let mapper = mapper_for(&a);
        a.pointer_down(Pos2::new(2.0, 2.0), &mapper);
        a.pointer_move(Pos2::new(28.0, 28.0), &mapper);
        a.frame();
        a.set_blur_strength(BlurStrength::new(100));
        a.pointer_up();

        b.set_blur_strength(BlurStrength::new(100));
        b.apply_blur(2, 2, 26, 26);
        assert_eq!(a.surface(), b.surface());
    }

    #[test]
    fn clear_effects_is_undoable() {
        let mut editor = Editor::new(30, 30);
        editor.load_image(gradient(30, 30));
        let loaded = editor.surface().clone();
        editor.apply_blur(0, 0, 30, 30);
        let blurred = editor.surface().clone();

        assert!(editor.clear_effects());
        assert_eq!(*editor.surface(), loaded);
        assert_eq!(editor.history().len(), 3);
        assert!(editor.undo());
        assert_eq!(*editor.surface(), blurred);
    }

    #[test]
    fn without_image_everything_is_inert() {
        let mut editor = Editor::new(30, 30);
        let mapper = mapper_for(&editor);
        assert!(!editor.pointer_down(Pos2::new(3.0, 3.0), &mapper));
        assert!(!editor.undo());
        assert!(!editor.redo());
        assert!(!editor.clear_effects());
        assert!(matches!(editor.export_png(), Err(EditorError::NoImage)));
        assert_eq!(editor.apply_blur(0, 0, 10, 10), SelectionOutcome::NoImage);
    }

    #[test]
    fn zero_sized_surface_is_unsupported() {
        let mut editor = Editor::new(0, 600);
        assert!(!editor.is_supported());
        assert!(!editor.load_image(gradient(4, 4)));
        assert!(!editor.has_image());
    }

    #[test]
    fn uniform_red_region_stays_red() {
        let mut editor = Editor::new(100, 100);
        editor.load_image(RgbaImage::from_pixel(100, 100, RED));
        let loaded = editor.surface().clone();
        drag(&mut editor, (10.0, 10.0), (50.0, 50.0));
        assert_eq!(editor.history().len(), 2);
        assert_eq!(*editor.surface(), loaded);
        assert!(editor.undo());
        assert_eq!(*editor.surface(), loaded);
    }

    #[test]
    fn export_produces_png_signature() {
        let mut editor = Editor::new(8, 8);
        editor.load_image(gradient(8, 8));
        let bytes = editor.export_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
