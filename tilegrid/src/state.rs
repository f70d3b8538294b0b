use crate::{Rect, VirtualRange};

/// A lightweight, serializable snapshot of the viewport.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub rect: Rect,
    /// Scroll position along the main axis, in content-space pixels.
    pub scroll_offset: u64,
    /// The index interval currently backed (or about to be backed) by containers.
    pub realized: VirtualRange,
}

/// Work still outstanding in a [`crate::GridView`].
///
/// `GridView::run_pass` returns this so hosts can decide whether to schedule another pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingWork {
    pub queued_edits: usize,
    /// An edit was sent to the data source and is waiting for its confirmation.
    pub edit_in_flight: bool,
    /// Source notifications were received but not mirrored yet.
    pub notifications_pending: bool,
    pub layout_dirty: bool,
    /// The scroll offset or viewport changed since the realized range was last computed.
    pub window_dirty: bool,
    pub missing_containers: usize,
    pub ensure_visible: bool,
}

impl PendingWork {
    pub fn is_idle(&self) -> bool {
        self.queued_edits == 0 && !self.edit_in_flight && self.is_local_idle()
    }

    /// Only the data source can make progress: an edit is in flight and everything else is
    /// settled.
    pub fn is_awaiting_source(&self) -> bool {
        self.edit_in_flight && self.is_local_idle()
    }

    fn is_local_idle(&self) -> bool {
        !self.notifications_pending
            && !self.layout_dirty
            && !self.window_dirty
            && self.missing_containers == 0
            && !self.ensure_visible
    }
}
