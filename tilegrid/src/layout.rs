//! Grid placement with optional cell spanning.
//!
//! Tiles are packed per group with a single-pass shelf cursor: a shelf is a strip along the
//! cross axis, `lanes` cells deep. A tile joins the current shelf if its cross span still fits,
//! otherwise a new shelf opens after the widest tile of the current one. Source order is never
//! changed.
//!
//! Tile positions are cached relative to their group, and group offsets are prefix sums, so an
//! edit re-packs only the tiles of the touched group from the edited tile onward while later
//! groups are merely translated.

use crate::fenwick::Fenwick;
use crate::groups::{GroupProjection, Splice};
use crate::types::ItemRecord;
use crate::{Geometry, ItemSize, LayoutOptions, Orientation, VirtualRange};

/// Shelf packing state right before a tile is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ShelfCursor {
    shelf_main: u64,
    shelf_extent: u64,
    used_lanes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Tile {
    /// Offsets relative to the group's tile origin.
    main: u64,
    cross: u64,
    main_size: u32,
    cross_size: u32,
    before: ShelfCursor,
}

impl Tile {
    fn main_end(&self) -> u64 {
        self.main.saturating_add(self.main_size as u64)
    }
}

#[derive(Clone, Debug, Default)]
struct GroupLayout {
    tiles: Vec<Tile>,
    /// Main-axis extent of the whole group, header included.
    extent: u64,
    /// `extent` matches `tiles` and the group's item count.
    measured: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct LayoutEngine {
    options: LayoutOptions,
    viewport_cross: u32,
    lanes: u32,
    groups: Vec<GroupLayout>,
    offsets: Fenwick,
    offsets_stale: bool,
    dirty: bool,
}

impl LayoutEngine {
    pub(crate) fn new(options: LayoutOptions, viewport_cross: u32) -> Self {
        let mut layout = Self {
            options,
            viewport_cross,
            lanes: 1,
            groups: Vec::new(),
            offsets: Fenwick::default(),
            offsets_stale: true,
            dirty: false,
        };
        layout.lanes = layout.compute_lanes();
        layout
    }

    pub(crate) fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub(crate) fn orientation(&self) -> Orientation {
        self.options.orientation
    }

    pub(crate) fn lanes(&self) -> u32 {
        self.lanes
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_options(&mut self, options: LayoutOptions) {
        if self.options == options {
            return;
        }
        self.options = options;
        self.lanes = self.compute_lanes();
        self.invalidate_all();
    }

    pub(crate) fn set_viewport_cross(&mut self, cross: u32) {
        if self.viewport_cross == cross {
            return;
        }
        self.viewport_cross = cross;
        let lanes = self.compute_lanes();
        if lanes != self.lanes {
            self.lanes = lanes;
            self.invalidate_all();
        }
    }

    /// Discards every cached tile; the next `relayout` packs all groups.
    pub(crate) fn invalidate_all(&mut self) {
        for g in &mut self.groups {
            g.tiles.clear();
            g.measured = false;
        }
        self.offsets_stale = true;
        self.dirty = true;
    }

    /// Resets the cache to `group_count` unplaced groups.
    pub(crate) fn reset(&mut self, group_count: usize) {
        self.groups = vec![GroupLayout::default(); group_count];
        self.offsets_stale = true;
        self.dirty = true;
    }

    /// Mirrors a group projection update caused by an edit at item `dirty_item`.
    ///
    /// `projection` is already updated. Tiles before `dirty_item` in the first spliced group
    /// are kept; everything after it in the spliced range is re-packed.
    pub(crate) fn splice<G: Clone>(
        &mut self,
        splice: Splice,
        projection: &GroupProjection<G>,
        dirty_item: usize,
    ) {
        self.dirty = true;
        if !splice.structural {
            let gi = projection.group_index_of(dirty_item);
            if let Some(g) = self.groups.get_mut(gi) {
                g.tiles.truncate(dirty_item.saturating_sub(projection.start_of(gi)));
                g.measured = false;
            }
            return;
        }

        let mut replacement = vec![GroupLayout::default(); splice.inserted];
        if let (Some(first), Some(old)) = (replacement.first_mut(), self.groups.get(splice.first))
        {
            let keep = dirty_item.saturating_sub(projection.start_of(splice.first));
            first.tiles = old.tiles[..keep.min(old.tiles.len())].to_vec();
        }
        let end = (splice.first + splice.removed).min(self.groups.len());
        self.groups.splice(splice.first.min(end)..end, replacement);
        self.offsets_stale = true;
    }

    /// Packs every group whose tiles are incomplete and re-measures every group touched since
    /// the last call (a spliced group may keep all of its tiles yet lose its extent). Returns
    /// the number of tiles placed.
    pub(crate) fn relayout<G: Clone, T>(
        &mut self,
        projection: &GroupProjection<G>,
        items: &[ItemRecord<T>],
    ) -> usize {
        if !self.dirty {
            return 0;
        }
        debug_assert_eq!(self.groups.len(), projection.len());
        let multisize = self.options.is_multisize();
        let mut placed = 0usize;
        for gi in 0..self.groups.len() {
            let start = projection.start_of(gi);
            let count = projection.count_of(gi);
            if self.groups[gi].measured && self.groups[gi].tiles.len() == count {
                continue;
            }
            let from = self.groups[gi].tiles.len().min(count);
            let mut cursor = match self.groups[gi].tiles.get(from) {
                Some(t) => t.before,
                None => self.cursor_after(gi, from),
            };
            self.groups[gi].tiles.truncate(from);
            for item in &items[start + from..start + count] {
                let size = if multisize {
                    item.size
                } else {
                    self.options.item_size
                };
                let tile = self.place(&mut cursor, size);
                self.groups[gi].tiles.push(tile);
                placed += 1;
            }
            let extent = self.group_extent(&self.groups[gi].tiles);
            let prev = self.groups[gi].extent;
            self.groups[gi].extent = extent;
            self.groups[gi].measured = true;
            if !self.offsets_stale && extent != prev {
                self.offsets.add(gi, extent as i64 - prev as i64);
            }
        }
        if self.offsets_stale {
            let margin = self.options.group_margin as u64;
            let spans: Vec<u64> = self.groups.iter().map(|g| margin + g.extent).collect();
            self.offsets = Fenwick::from_spans(&spans);
            self.offsets_stale = false;
        }
        self.dirty = false;
        gtrace!(placed, groups = self.groups.len(), "relayout");
        placed
    }

    /// Cursor state after the first `from` tiles of group `gi` (all of them still cached).
    fn cursor_after(&self, gi: usize, from: usize) -> ShelfCursor {
        let tiles = &self.groups[gi].tiles;
        if from == 0 {
            return ShelfCursor::default();
        }
        let mut cursor = tiles[from - 1].before;
        let last = tiles[from - 1];
        self.advance(&mut cursor, last.main_size, self.span_cross(last.cross_size));
        cursor
    }

    fn place(&self, cursor: &mut ShelfCursor, size: ItemSize) -> Tile {
        let o = self.options.orientation;
        let cell = self.options.cell();
        let gutter = self.options.gutter;
        let span_main = spans(size.main(o), cell.main(o), gutter);
        let span_cross = spans(size.cross(o), cell.cross(o), gutter);
        let main_size = span_px(span_main, cell.main(o), gutter);
        let cross_size = span_px(span_cross, cell.cross(o), gutter);

        if cursor.used_lanes > 0 && cursor.used_lanes.saturating_add(span_cross) > self.lanes {
            cursor.shelf_main = cursor
                .shelf_main
                .saturating_add(cursor.shelf_extent)
                .saturating_add(gutter as u64);
            cursor.shelf_extent = 0;
            cursor.used_lanes = 0;
        }
        let before = *cursor;
        let lane_pitch = cell.cross(o) as u64 + gutter as u64;
        let tile = Tile {
            main: cursor.shelf_main,
            cross: cursor.used_lanes as u64 * lane_pitch,
            main_size,
            cross_size,
            before,
        };
        self.advance(cursor, main_size, span_cross);
        tile
    }

    fn advance(&self, cursor: &mut ShelfCursor, main_size: u32, span_cross: u32) {
        cursor.shelf_extent = cursor.shelf_extent.max(main_size as u64);
        cursor.used_lanes = cursor.used_lanes.saturating_add(span_cross);
    }

    fn span_cross(&self, cross_size: u32) -> u32 {
        let o = self.options.orientation;
        spans(cross_size, self.options.cell().cross(o), self.options.gutter)
    }

    fn group_extent(&self, tiles: &[Tile]) -> u64 {
        let o = self.options.orientation;
        let header_main = self.options.header_size.main(o) as u64;
        let items = tiles.iter().map(Tile::main_end).max().unwrap_or(0);
        match o {
            Orientation::Horizontal => header_main.max(items),
            Orientation::Vertical => header_main + self.options.header_gap as u64 + items,
        }
    }

    /// Tile origin relative to the group's main start: `(main, cross)`.
    fn tile_origin(&self) -> (u64, u64) {
        let o = self.options.orientation;
        let gap = self.options.header_gap as u64;
        match o {
            Orientation::Horizontal => (0, self.options.header_size.cross(o) as u64 + gap),
            Orientation::Vertical => (self.options.header_size.main(o) as u64 + gap, 0),
        }
    }

    fn compute_lanes(&self) -> u32 {
        let o = self.options.orientation;
        let available = self.viewport_cross as u64;
        let pitch = self.options.cell().cross(o) as u64 + self.options.gutter as u64;
        let lanes = (available + self.options.gutter as u64) / pitch.max(1);
        lanes.clamp(1, u32::MAX as u64) as u32
    }

    /// Main-axis start of group `gi` (after its leading margin).
    pub(crate) fn group_main(&self, gi: usize) -> u64 {
        self.offsets.prefix_sum(gi) + self.options.group_margin as u64
    }

    pub(crate) fn total_extent(&self) -> u64 {
        self.offsets.total() + self.options.padding_end as u64
    }

    pub(crate) fn header_geometry(&self, gi: usize) -> Option<Geometry> {
        if self.dirty || gi >= self.groups.len() {
            return None;
        }
        let header = self.options.header_size;
        let o = self.options.orientation;
        Some(Geometry::from_axes(
            o,
            self.group_main(gi),
            0,
            header.main(o),
            header.cross(o),
        ))
    }

    /// Final geometry of an item, or `None` while its group awaits `relayout`.
    pub(crate) fn item_geometry<G: Clone>(
        &self,
        projection: &GroupProjection<G>,
        index: usize,
    ) -> Option<Geometry> {
        if self.dirty || projection.is_empty() {
            return None;
        }
        let gi = projection.group_index_of(index);
        let local = index.checked_sub(projection.start_of(gi))?;
        let tile = self.groups.get(gi)?.tiles.get(local)?;
        Some(self.tile_geometry(gi, tile))
    }

    fn tile_geometry(&self, gi: usize, tile: &Tile) -> Geometry {
        let (origin_main, origin_cross) = self.tile_origin();
        Geometry::from_axes(
            self.options.orientation,
            self.group_main(gi) + origin_main + tile.main,
            origin_cross + tile.cross,
            tile.main_size,
            tile.cross_size,
        )
    }

    /// Items intersecting `[start, end)` on the main axis.
    ///
    /// When the span only covers margins or headers, the returned range is empty and positioned
    /// at the next item.
    pub(crate) fn visible_index_range<G: Clone>(
        &self,
        projection: &GroupProjection<G>,
        start: u64,
        end: u64,
    ) -> VirtualRange {
        let group_count = self.groups.len();
        if self.dirty || group_count == 0 || end <= start {
            return VirtualRange::default();
        }
        let (origin_main, _) = self.tile_origin();
        let item_count = projection.start_of(group_count - 1) + projection.count_of(group_count - 1);

        let mut first = item_count;
        let mut gi = self.offsets.lower_bound(start).min(group_count - 1);
        while gi < group_count {
            let base = self.group_main(gi) + origin_main;
            let rel = start.saturating_sub(base);
            if let Some(local) = first_ending_after(&self.groups[gi].tiles, rel) {
                first = projection.start_of(gi) + local;
                break;
            }
            gi += 1;
        }

        let g_last = self
            .offsets
            .lower_bound(end.saturating_sub(1))
            .min(group_count - 1);
        let base = self.group_main(g_last) + origin_main;
        let starting = if end > base {
            let rel = end - base;
            self.groups[g_last].tiles.partition_point(|t| t.main < rel)
        } else {
            0
        };
        let last_exclusive = projection.start_of(g_last) + starting;

        VirtualRange {
            start_index: first,
            end_index: last_exclusive.max(first),
        }
    }

    #[cfg(test)]
    pub(crate) fn group_extent_of(&self, gi: usize) -> u64 {
        self.groups[gi].extent
    }
}

/// First tile whose main end lies after `rel`.
fn first_ending_after(tiles: &[Tile], rel: u64) -> Option<usize> {
    let k = tiles.partition_point(|t| t.main <= rel);
    if k == 0 {
        return (!tiles.is_empty()).then_some(0);
    }
    // Only the shelf holding `rel` can contain tiles that started before it and end after it.
    let shelf_main = tiles[k - 1].main;
    let shelf_start = tiles.partition_point(|t| t.main < shelf_main);
    tiles[shelf_start..k]
        .iter()
        .position(|t| t.main_end() > rel)
        .map(|i| shelf_start + i)
        .or_else(|| (k < tiles.len()).then_some(k))
}

fn spans(size: u32, cell: u32, gutter: u32) -> u32 {
    let pitch = cell.max(1) as u64 + gutter as u64;
    let n = (size as u64 + gutter as u64).div_ceil(pitch);
    n.clamp(1, u32::MAX as u64) as u32
}

fn span_px(spans: u32, cell: u32, gutter: u32) -> u32 {
    spans
        .saturating_mul(cell)
        .saturating_add(spans.saturating_sub(1).saturating_mul(gutter))
}
