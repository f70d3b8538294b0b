use tilegrid::{
    Align, ContainerEvent, DataSource, GridOptions, GridView, ListDataSource, PendingWork, Rect,
    Result,
};

use crate::{ScrollAnchor, apply_anchor, capture_first_visible_anchor};

/// What a single [`Controller::tick`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Work still outstanding after this frame; schedule another tick unless idle.
    pub pending: PendingWork,
    /// The scroll offset was adjusted to keep the first visible item in place.
    pub anchored: bool,
    /// Container changes to render, in the order they happened.
    pub events: Vec<ContainerEvent>,
}

/// A framework-neutral controller that wraps a `tilegrid::GridView` and provides common
/// adapter workflows (per-frame passes, anchoring across edits).
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_viewport` / `on_scroll` when UI events occur
/// - `tick()` each frame, then rendering the returned container events
///
/// With `preserve_anchor` enabled, edits applied during a tick that shift the content before
/// the viewport are compensated by moving the scroll offset, so visible tiles stay put.
#[derive(Debug)]
pub struct Controller<T, G = String, S = ListDataSource<T>> {
    view: GridView<T, G, S>,
    preserve_anchor: bool,
}

impl<T, G, S> Controller<T, G, S>
where
    T: Clone + 'static,
    G: Clone,
    S: DataSource<T>,
{
    pub fn new(source: S, options: GridOptions<T, G>) -> Self {
        Self::from_view(GridView::new(source, options))
    }

    pub fn from_view(view: GridView<T, G, S>) -> Self {
        Self {
            view,
            preserve_anchor: false,
        }
    }

    pub fn with_preserve_anchor(mut self, preserve_anchor: bool) -> Self {
        self.preserve_anchor = preserve_anchor;
        self
    }

    pub fn view(&self) -> &GridView<T, G, S> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GridView<T, G, S> {
        &mut self.view
    }

    pub fn into_view(self) -> GridView<T, G, S> {
        self.view
    }

    pub fn preserve_anchor(&self) -> bool {
        self.preserve_anchor
    }

    pub fn set_preserve_anchor(&mut self, preserve_anchor: bool) {
        self.preserve_anchor = preserve_anchor;
    }

    pub fn on_viewport(&mut self, rect: Rect) -> Result<()> {
        self.view.set_viewport(rect)
    }

    /// Call this when the UI reports a scroll offset change (e.g. user wheel/drag).
    pub fn on_scroll(&mut self, scroll_offset: u64) -> Result<()> {
        self.view.set_scroll_offset(scroll_offset)
    }

    /// Computes and applies a scroll-to-index immediately.
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> Result<u64> {
        let offset = self.view.scroll_target(index, align);
        self.view.set_scroll_offset(offset)?;
        Ok(offset)
    }

    /// Runs one scheduling pass and collects the resulting container events.
    ///
    /// A pending `ensure_visible` takes precedence over anchoring for that frame.
    pub fn tick(&mut self) -> FrameOutcome {
        let anchor = if self.preserve_anchor && !self.view.pending().ensure_visible {
            capture_first_visible_anchor(&self.view)
        } else {
            None
        };
        let generation = self.view.generation();
        let mut pending = self.view.run_pass();

        let mut anchored = false;
        if let Some(anchor) = anchor {
            if self.view.generation() != generation {
                let before = self.view.scroll_offset();
                if apply_anchor(&mut self.view, &anchor) && self.view.scroll_offset() != before {
                    anchored = true;
                    pending = self.view.run_pass();
                }
            }
        }

        FrameOutcome {
            pending,
            anchored,
            events: self.view.take_container_events(),
        }
    }

    /// Ticks until the view is idle, disposed, or waiting on the data source to confirm an
    /// edit. Returns the events of every frame.
    pub fn run_until_idle(&mut self) -> Vec<ContainerEvent> {
        let mut events = Vec::new();
        while !self.view.is_disposed() {
            let frame = self.tick();
            events.extend(frame.events);
            if frame.pending.is_idle() || frame.pending.is_awaiting_source() {
                break;
            }
        }
        events
    }

    pub fn capture_first_visible_anchor(&self) -> Option<ScrollAnchor> {
        capture_first_visible_anchor(&self.view)
    }

    /// Applies a previously captured anchor by adjusting the scroll offset.
    pub fn apply_anchor(&mut self, anchor: &ScrollAnchor) -> bool {
        apply_anchor(&mut self.view, anchor)
    }
}
