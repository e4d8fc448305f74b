use eframe::egui;
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

use crate::canvas::RasterSurface;

/// Maximum number of snapshots kept.
pub const MAX_HISTORY: usize = 20;

// ============================================================================
// HISTORY ENTRY - immutable full-surface snapshot
// ============================================================================

/// One recorded surface state. The pixel buffer is shared and never mutated,
/// so truncating or evicting other entries cannot change it.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    snapshot: Arc<RgbaImage>,
    pub created_at: SystemTime,
    pub description: String,
}

impl HistoryEntry {
    pub fn capture(surface: &RasterSurface, description: impl Into<String>) -> Self {
        Self {
            snapshot: Arc::new(surface.pixels().clone()),
            created_at: SystemTime::now(),
            description: description.into(),
        }
    }

    pub fn snapshot(&self) -> &RgbaImage {
        &self.snapshot
    }

    /// Copy this state back into `surface`.
    pub fn restore_into(&self, surface: &mut RasterSurface) -> bool {
        surface.restore(&self.snapshot)
    }

    pub fn memory_bytes(&self) -> usize {
        self.snapshot.as_raw().len() + self.description.len()
    }
}

// ============================================================================
// HISTORY STACK - bounded linear history with a cursor
// ============================================================================

/// Linear undo/redo history. `entries[cursor]` is the state on screen;
/// entries after it are redo-able until the next push.
#[derive(Debug)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Drop the redo tail, append `entry` and make it current. Evicts the
    /// oldest entry when over capacity; the cursor stays on `entry`.
    pub fn push(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry. `None` at the first entry or when empty.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry. `None` at the last entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: HistoryEntry) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Sum of all snapshot buffers.
    pub fn memory_usage(&self) -> usize {
        self.entries.iter().map(HistoryEntry::memory_bytes).sum()
    }
}

// ============================================================================
// HISTORY PANEL - read-only list of recorded states
// ============================================================================

#[derive(Default)]
pub struct HistoryPanel {
    show_memory_info: bool,
}

impl HistoryPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, history: &HistoryStack) {
        ui.horizontal(|ui| {
            ui.label(t!(
                "label.history",
                current = history.cursor() + 1,
                total = history.len()
            ));
            if ui.small_button("ℹ").clicked() {
                self.show_memory_info = !self.show_memory_info;
            }
        });

        if self.show_memory_info {
            let mem_mb = history.memory_usage() as f64 / (1024.0 * 1024.0);
            ui.label(format!("{:.2} MB", mem_mb));
        }

        egui::ScrollArea::vertical()
            .max_height(180.0)
            .show(ui, |ui| {
                for (i, entry) in history.entries().enumerate().rev() {
                    let text = egui::RichText::new(&entry.description).size(11.0);
                    let text = if i == history.cursor() {
                        text.strong()
                    } else if i > history.cursor() {
                        text.weak().italics()
                    } else {
                        text.weak()
                    };
                    ui.label(text);
                }
            });
    }
}
