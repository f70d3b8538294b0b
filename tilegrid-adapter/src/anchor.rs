use tilegrid::{DataSource, GridView, ItemKey};

/// A scroll anchor that can be used to preserve visual position across data changes.
///
/// Typical use cases:
/// - loading older tiles at the start of the grid without the viewport content jumping
/// - any edit before the viewport where the visible items should stay where they are
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollAnchor {
    pub key: ItemKey,
    /// The distance from the anchor item's main-axis start to the scroll offset. Negative when
    /// the item starts inside the viewport (e.g. below a group header).
    pub offset_in_viewport: i64,
}

/// Captures an anchor for the first visible item (by key).
///
/// Returns `None` if layout is pending or nothing is visible.
pub fn capture_first_visible_anchor<T, G, S>(v: &GridView<T, G, S>) -> Option<ScrollAnchor>
where
    T: Clone + 'static,
    G: Clone,
    S: DataSource<T>,
{
    let state = v.viewport_state();
    let visible = v.visible_index_range(state.scroll_offset, state.rect.main);
    if visible.is_empty() {
        return None;
    }
    let index = visible.start_index;
    let start = v
        .item_geometry(index)?
        .main_start(v.layout_options().orientation);
    let key = v.key_of(index).ok()?;
    let offset_in_viewport = state.scroll_offset as i64 - start as i64;
    Some(ScrollAnchor {
        key,
        offset_in_viewport,
    })
}

/// Applies a previously captured anchor by adjusting the scroll offset.
///
/// Returns `true` when the anchor item still exists and has geometry. The offset is clamped
/// to the scrollable range and only written when it differs from the current one.
pub fn apply_anchor<T, G, S>(v: &mut GridView<T, G, S>, anchor: &ScrollAnchor) -> bool
where
    T: Clone + 'static,
    G: Clone,
    S: DataSource<T>,
{
    let Some(index) = v.index_of_key(anchor.key) else {
        return false;
    };
    let Some(geometry) = v.item_geometry(index) else {
        return false;
    };
    let start = geometry.main_start(v.layout_options().orientation);
    let target = start
        .saturating_add_signed(anchor.offset_in_viewport)
        .min(v.max_scroll_offset());
    if target == v.scroll_offset() {
        return true;
    }
    v.set_scroll_offset(target).is_ok()
}
