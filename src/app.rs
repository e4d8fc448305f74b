use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, TextureOptions};
use std::path::PathBuf;
use std::sync::mpsc;

use crate::canvas::{CoordinateMapper, fit_display_box};
use crate::components::history::HistoryPanel;
use crate::components::selection::SelectionOutcome;
use crate::editor::Editor;
use crate::io::{self, FileHandler, IoResult};
use crate::ops::filters::{BlurStrength, MAX_BLUR_STRENGTH};
use crate::settings::AppSettings;

const SELECTION_FILL: Color32 = Color32::from_rgba_premultiplied(40, 40, 40, 40);
const SELECTION_STROKE: Color32 = Color32::from_rgb(30, 144, 255);
const LETTERBOX: Color32 = Color32::from_gray(235);

/// Look for a system font that covers Japanese. egui's bundled fonts don't.
fn discover_system_cjk_font() -> Option<(String, Vec<u8>)> {
    let candidates: &[&str] = &[
        #[cfg(target_os = "windows")]
        "C:\\Windows\\Fonts\\YuGothR.ttc",
        #[cfg(target_os = "windows")]
        "C:\\Windows\\Fonts\\meiryo.ttc",
        #[cfg(target_os = "windows")]
        "C:\\Windows\\Fonts\\msgothic.ttc",
        #[cfg(target_os = "linux")]
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        #[cfg(target_os = "linux")]
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        #[cfg(target_os = "linux")]
        "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
        #[cfg(target_os = "linux")]
        "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
        #[cfg(target_os = "macos")]
        "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
        #[cfg(target_os = "macos")]
        "/System/Library/Fonts/HiraginoSans-W3.ttc",
    ];

    for path in candidates {
        if let Ok(data) = std::fs::read(path)
            && data.len() > 100
        {
            crate::log_info!("using CJK font {}", path);
            return Some(("system_cjk".to_string(), data));
        }
    }
    None
}

/// Fold one finished background operation into the editor and return the
/// status line for it. A failed load leaves the current document untouched.
fn apply_io_result(editor: &mut Editor, file_handler: &mut FileHandler, result: IoResult) -> String {
    match result {
        IoResult::ImageLoaded { image, path } => {
            if editor.load_image_from(image, &path) {
                file_handler.current_path = Some(path);
                t!("status.loaded", name = editor.name)
            } else {
                t!("status.unsupported")
            }
        }
        IoResult::LoadFailed(error) => t!("status.load_failed", error = error),
        IoResult::Saved { path } => t!("status.saved", path = path.display()),
        IoResult::SaveFailed(error) => t!("status.save_failed", error = error),
    }
}

pub struct MosaicApp {
    editor: Editor,
    settings: AppSettings,
    file_handler: FileHandler,
    history_panel: HistoryPanel,
    /// Slider binding; pushed into the editor on change.
    strength: u8,

    texture: Option<egui::TextureHandle>,
    /// Editor generation the texture was last uploaded for.
    texture_generation: Option<u64>,

    io_sender: mpsc::Sender<IoResult>,
    io_receiver: mpsc::Receiver<IoResult>,
    pending_io_ops: usize,
    status: String,
}

impl MosaicApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();

        if settings.language.is_empty() {
            let detected = crate::i18n::detect_system_language();
            crate::i18n::set_language(&detected);
        } else {
            crate::i18n::set_language(&settings.language);
        }

        if let Some((name, data)) = discover_system_cjk_font() {
            let mut fonts = egui::FontDefinitions::default();
            fonts
                .font_data
                .insert(name.clone(), egui::FontData::from_owned(data));
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .push(name);
            cc.egui_ctx.set_fonts(fonts);
        }

        let (width, height) = settings.surface_size();
        let mut editor = Editor::new(width, height);
        editor.set_blur_strength(settings.strength());

        let (io_sender, io_receiver) = mpsc::channel();

        Self {
            strength: editor.blur_strength().value(),
            editor,
            settings,
            file_handler: FileHandler::new(),
            history_panel: HistoryPanel::default(),
            texture: None,
            texture_generation: None,
            io_sender,
            io_receiver,
            pending_io_ops: 0,
            status: String::new(),
        }
    }

    // ---- actions ----------------------------------------------------------

    fn open_dialog(&mut self) {
        if let Some(path) = self.file_handler.pick_image() {
            self.start_load(path);
        }
    }

    fn start_load(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.status = t!("status.loading", name = name);
        self.pending_io_ops += 1;
        io::spawn_load(path, self.io_sender.clone());
    }

    fn save_dialog(&mut self) {
        let bytes = match self.editor.export_png() {
            Ok(bytes) => bytes,
            Err(e) => {
                crate::log_err!("export failed: {}", e);
                self.status = t!("status.save_failed", error = e);
                return;
            }
        };
        if let Some(path) = self.file_handler.pick_save_path() {
            self.pending_io_ops += 1;
            io::spawn_save(bytes, path, self.io_sender.clone());
        }
    }

    fn set_strength(&mut self, value: u8, persist: bool) {
        self.strength = value;
        self.editor.set_blur_strength(BlurStrength::new(value as i32));
        if persist {
            self.settings.blur_strength = value;
            self.settings.save();
        }
    }

    fn set_language(&mut self, code: &str) {
        crate::i18n::set_language(code);
        self.settings.language = code.to_string();
        self.settings.save();
        crate::log_info!("language set to {}", code);
    }

    // ---- per-frame plumbing -----------------------------------------------

    fn poll_io(&mut self) {
        while let Ok(result) = self.io_receiver.try_recv() {
            self.pending_io_ops = self.pending_io_ops.saturating_sub(1);
            self.status = apply_io_result(&mut self.editor, &mut self.file_handler, result);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().find(|p| io::is_supported_extension(p)) {
            self.start_load(path);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, Modifiers};
        let (redo_shift, redo_y, undo, open, save) = ctx.input_mut(|i| {
            (
                i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z),
                i.consume_key(Modifiers::COMMAND, Key::Y),
                i.consume_key(Modifiers::COMMAND, Key::Z),
                i.consume_key(Modifiers::COMMAND, Key::O),
                i.consume_key(Modifiers::COMMAND, Key::S),
            )
        });
        if self.editor.selection().is_dragging() {
            return;
        }
        if redo_shift || redo_y {
            self.editor.redo();
        } else if undo {
            self.editor.undo();
        }
        if open {
            self.open_dialog();
        }
        if save && self.editor.has_image() {
            self.save_dialog();
        }
    }

    fn sync_texture(&mut self, ctx: &egui::Context) {
        let generation = self.editor.generation();
        if self.texture_generation == Some(generation) || !self.editor.is_supported() {
            return;
        }
        let pixels = self.editor.surface().pixels();
        let size = [pixels.width() as usize, pixels.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("mosaic_surface", image, TextureOptions::LINEAR));
            }
        }
        self.texture_generation = Some(generation);
    }

    // ---- panels -----------------------------------------------------------

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(t!("app.title"));
            ui.label(egui::RichText::new(t!("app.subtitle")).weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let current = crate::i18n::current_language();
                let current_name = crate::i18n::LANGUAGES
                    .iter()
                    .find(|(code, _)| *code == current)
                    .map(|(_, name)| *name)
                    .unwrap_or("English");
                let mut chosen = None;
                egui::ComboBox::from_id_source("language_picker")
                    .selected_text(current_name)
                    .show_ui(ui, |ui| {
                        for (code, name) in crate::i18n::LANGUAGES {
                            if ui.selectable_label(current == *code, *name).clicked() {
                                chosen = Some(*code);
                            }
                        }
                    });
                ui.label(t!("label.language"));
                if let Some(code) = chosen {
                    self.set_language(code);
                }
            });
        });

        ui.separator();

        let has_image = self.editor.has_image();
        let dragging = self.editor.selection().is_dragging();
        ui.horizontal(|ui| {
            if ui
                .button(t!("button.open"))
                .on_hover_text(t!("hint.upload"))
                .clicked()
            {
                self.open_dialog();
            }

            ui.separator();

            ui.label(t!("label.strength", value = self.strength));
            let mut value = self.strength;
            let slider = ui.add_enabled(
                has_image,
                egui::Slider::new(&mut value, 0..=MAX_BLUR_STRENGTH).show_value(false),
            );
            if value != self.strength || slider.drag_released() {
                self.set_strength(value, !slider.dragged());
            }

            ui.separator();

            let undo = ui
                .add_enabled(has_image && !dragging && self.editor.can_undo(), egui::Button::new(t!("button.undo")))
                .on_hover_text(t!("hint.undo"));
            if undo.clicked() {
                self.editor.undo();
            }
            let redo = ui
                .add_enabled(has_image && !dragging && self.editor.can_redo(), egui::Button::new(t!("button.redo")))
                .on_hover_text(t!("hint.redo"));
            if redo.clicked() {
                self.editor.redo();
            }
            let clear = ui
                .add_enabled(has_image && !dragging, egui::Button::new(t!("button.clear")))
                .on_hover_text(t!("hint.clear"));
            if clear.clicked() {
                self.editor.clear_effects();
            }
            let save = ui
                .add_enabled(has_image, egui::Button::new(t!("button.save")))
                .on_hover_text(t!("hint.save"));
            if save.clicked() {
                self.save_dialog();
            }

            if self.pending_io_ops > 0 {
                ui.spinner();
            }
            if !self.status.is_empty() {
                ui.label(egui::RichText::new(&self.status).weak());
            }
        });
    }

    fn show_instructions(ui: &mut egui::Ui) {
        ui.strong(t!("instructions.title"));
        for key in [
            "instructions.step1",
            "instructions.step2",
            "instructions.step3",
            "instructions.step4",
            "instructions.step5",
        ] {
            ui.label(format!("• {}", t!(key)));
        }
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        if !self.editor.is_supported() {
            ui.centered_and_justified(|ui| ui.label(t!("status.unsupported")));
            return;
        }

        let surface = self.editor.surface();
        let (w, h) = (surface.width(), surface.height());
        let display_box = fit_display_box(ui.available_rect_before_wrap(), w, h);
        let response = ui.allocate_rect(display_box, egui::Sense::click_and_drag());
        let mapper = CoordinateMapper::new(display_box, w, h);

        let painter = ui.painter_at(display_box);
        painter.rect_filled(display_box, 0.0, LETTERBOX);
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), display_box, uv, Color32::WHITE);
        }

        if !self.editor.has_image() {
            painter.text(
                display_box.center(),
                egui::Align2::CENTER_CENTER,
                t!("hint.upload"),
                egui::FontId::proportional(18.0),
                Color32::from_gray(120),
            );
            return;
        }

        self.handle_pointer(ui.ctx(), &response, &mapper);

        if let Some(overlay) = self.editor.selection().overlay() {
            let overlay = overlay.intersect(display_box);
            painter.rect_filled(overlay, 0.0, SELECTION_FILL);
            painter.rect_stroke(overlay, 0.0, Stroke::new(1.5, SELECTION_STROKE));
        }
    }

    /// Press starts a drag on the surface, moves are queued and applied once
    /// per frame, release or leaving the surface commits.
    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, mapper: &CoordinateMapper) {
        let (pressed, down, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });

        if pressed
            && response.hovered()
            && let Some(p) = pos
        {
            self.editor.pointer_down(p, mapper);
        }

        if !self.editor.selection().is_dragging() {
            return;
        }

        if let Some(p) = pos {
            self.editor.pointer_move(p, mapper);
        }
        self.editor.frame();

        let left_surface = pos.is_some_and(|p| !mapper.contains(p));
        if released || !down || left_surface {
            match self.editor.pointer_up() {
                SelectionOutcome::Committed(rect) => {
                    crate::log_info!("selection committed {:?}", rect);
                }
                SelectionOutcome::TooSmall
                | SelectionOutcome::OffSurface
                | SelectionOutcome::NotDragging
                | SelectionOutcome::NoImage => {}
            }
        } else {
            ctx.request_repaint();
        }
    }
}

impl eframe::App for MosaicApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let title = if self.editor.name.is_empty() {
            "MosaicFE".to_string()
        } else {
            format!("MosaicFE - {}", self.editor.name)
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));

        self.poll_io();
        if self.pending_io_ops > 0 {
            ctx.request_repaint();
        }
        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.show_toolbar(ui);
        });

        egui::SidePanel::right("side_panel")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                if self.editor.has_image() {
                    self.history_panel.show(ui, self.editor.history());
                    ui.separator();
                }
                Self::show_instructions(ui);
            });

        self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_canvas(ui);
        });

        // Edits made while drawing the canvas show up next frame.
        if self.texture_generation != Some(self.editor.generation()) {
            ctx.request_repaint();
        }
    }
}
