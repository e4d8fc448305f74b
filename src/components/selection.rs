use egui::{Pos2, Rect};

use crate::canvas::{CoordinateMapper, PixelRect};

/// Drags narrower or shorter than this (in raster pixels) count as clicks.
pub const MIN_SELECTION_SIZE: i64 = 2;

// ============================================================================
// SELECTION DRAG - transient state between pointer-down and commit
// ============================================================================

/// Drag origin and current point, in both display and raster space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionDrag {
    pub origin_display: Pos2,
    pub origin_raster: Pos2,
    pub current_display: Pos2,
    pub current_raster: Pos2,
}

impl SelectionDrag {
    fn new(page_pos: Pos2, raster_pos: Pos2) -> Self {
        Self {
            origin_display: page_pos,
            origin_raster: raster_pos,
            current_display: page_pos,
            current_raster: raster_pos,
        }
    }

    /// Display-space rectangle spanned by origin and current point.
    pub fn overlay(&self) -> Rect {
        Rect::from_two_pos(self.origin_display, self.current_display)
    }

    /// Unclamped raster rectangle: `floor(min)` corner, `floor(|Δ|)` size.
    pub fn raster_extent(&self) -> (i64, i64, i64, i64) {
        let (p0, p1) = (self.origin_raster, self.current_raster);
        let left = p0.x.min(p1.x).floor() as i64;
        let top = p0.y.min(p1.y).floor() as i64;
        let width = (p1.x - p0.x).abs().floor() as i64;
        let height = (p1.y - p0.y).abs().floor() as i64;
        (left, top, width, height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Dragging(SelectionDrag),
}

/// What happened when a drag ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Final rectangle, already clamped to the surface.
    Committed(PixelRect),
    /// Under the minimum size: treated as a click.
    TooSmall,
    /// Nothing of the rectangle lies on the surface.
    OffSurface,
    /// No drag was in progress.
    NotDragging,
    /// Nothing is loaded, so there is nothing to blur.
    NoImage,
}

#[derive(Clone, Copy, Debug)]
struct PendingMove {
    page_pos: Pos2,
    mapper: CoordinateMapper,
}

// ============================================================================
// SELECTION TOOL - Idle → Dragging → (commit) → Idle
// ============================================================================

/// Rectangle-selection state machine.
///
/// Pointer moves are coalesced: [`queue_move`](Self::queue_move) only records
/// the latest position, and [`apply_pending`](Self::apply_pending) applies it
/// once per frame. Positions overwritten in between are dropped.
#[derive(Debug, Default)]
pub struct SelectionTool {
    state: SelectionState,
    pending_move: Option<PendingMove>,
}

impl SelectionTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging(_))
    }

    pub fn drag(&self) -> Option<&SelectionDrag> {
        match &self.state {
            SelectionState::Dragging(drag) => Some(drag),
            SelectionState::Idle => None,
        }
    }

    /// Overlay rectangle to draw, in display space.
    pub fn overlay(&self) -> Option<Rect> {
        self.drag().map(SelectionDrag::overlay)
    }

    /// Pointer-down. Starts a drag when idle and the press is on the surface.
    pub fn begin(&mut self, page_pos: Pos2, mapper: &CoordinateMapper) -> bool {
        if self.is_dragging() || !mapper.contains(page_pos) {
            return false;
        }
        let raster_pos = mapper.page_to_raster(page_pos);
        self.state = SelectionState::Dragging(SelectionDrag::new(page_pos, raster_pos));
        self.pending_move = None;
        true
    }

    /// Pointer-move. Replaces any move not yet applied this frame.
    pub fn queue_move(&mut self, page_pos: Pos2, mapper: &CoordinateMapper) {
        if self.is_dragging() {
            self.pending_move = Some(PendingMove {
                page_pos,
                mapper: *mapper,
            });
        }
    }

    /// Frame tick: apply the latest queued move. Returns `true` when the
    /// drag changed.
    pub fn apply_pending(&mut self) -> bool {
        let Some(pending) = self.pending_move.take() else {
            return false;
        };
        match &mut self.state {
            SelectionState::Dragging(drag) => {
                drag.current_display = pending.page_pos;
                drag.current_raster = pending.mapper.page_to_raster(pending.page_pos);
                true
            }
            SelectionState::Idle => false,
        }
    }

    /// Pointer-up or pointer-left-surface. Flushes the pending move, returns
    /// to `Idle` and reports the clamped rectangle, if any.
    pub fn finish(&mut self, surface_width: u32, surface_height: u32) -> SelectionOutcome {
        self.apply_pending();
        let SelectionState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return SelectionOutcome::NotDragging;
        };

        let (left, top, width, height) = drag.raster_extent();
        if width < MIN_SELECTION_SIZE || height < MIN_SELECTION_SIZE {
            return SelectionOutcome::TooSmall;
        }
        match PixelRect::clamp_to_surface(left, top, width, height, surface_width, surface_height) {
            Some(rect) => SelectionOutcome::Committed(rect),
            None => SelectionOutcome::OffSurface,
        }
    }
}
