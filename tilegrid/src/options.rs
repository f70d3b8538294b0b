use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{ItemSize, Orientation, Rect};

/// Derives the group key of an item.
pub type GroupKeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Derives the data shown in a group header from an item of that group.
pub type GroupDataFn<T, G> = Arc<dyn Fn(&T) -> G + Send + Sync>;

/// Supplies the size class of an item in multisize mode (aka `itemInfo`).
///
/// Receives the item index at the time the size is resolved and the item data. Sizes are in
/// pixels; the layout rounds them up to whole cells.
pub type ItemInfoFn<T> = Arc<dyn Fn(usize, &T) -> ItemSize + Send + Sync>;

/// Monotonic time source used to enforce the container-creation budget.
#[derive(Clone)]
pub enum Clock {
    /// Wall-clock time measured from the given instant.
    System(Instant),
    /// An injected time source (elapsed time since an arbitrary origin).
    Manual(Arc<dyn Fn() -> Duration + Send + Sync>),
}

impl Clock {
    pub fn system() -> Self {
        Self::System(Instant::now())
    }

    pub fn manual(now: impl Fn() -> Duration + Send + Sync + 'static) -> Self {
        Self::Manual(Arc::new(now))
    }

    pub(crate) fn now(&self) -> Duration {
        match self {
            Self::System(origin) => origin.elapsed(),
            Self::Manual(f) => f(),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::System(origin) => f.debug_tuple("System").field(origin).finish(),
            Self::Manual(_) => f.write_str("Manual(..)"),
        }
    }
}

/// Cell spanning configuration (aka `groupInfo`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupInfo {
    pub enable_cell_spanning: bool,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GroupInfo {
    pub fn cell_spanning(cell_width: u32, cell_height: u32) -> Self {
        Self {
            enable_cell_spanning: true,
            cell_width,
            cell_height,
        }
    }
}

/// Geometry parameters of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutOptions {
    pub orientation: Orientation,
    /// Tile size in uniform mode.
    pub item_size: ItemSize,
    /// Enables multisize layout when `enable_cell_spanning` is set.
    pub group_info: Option<GroupInfo>,
    pub header_size: ItemSize,
    /// Space between a group header and the first row/column of its tiles.
    pub header_gap: u32,
    /// Space before every group along the main axis.
    pub group_margin: u32,
    /// Space between adjacent cells.
    pub gutter: u32,
    /// Space after the last group.
    pub padding_end: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            item_size: ItemSize::new(100, 100),
            group_info: None,
            header_size: ItemSize::new(100, 100),
            header_gap: 20,
            group_margin: 70,
            gutter: 0,
            padding_end: 0,
        }
    }
}

impl LayoutOptions {
    pub fn is_multisize(&self) -> bool {
        self.group_info.is_some_and(|g| g.enable_cell_spanning)
    }

    /// The packing unit: one cell in multisize mode, one tile in uniform mode.
    pub fn cell(&self) -> ItemSize {
        match self.group_info {
            Some(g) if g.enable_cell_spanning => {
                ItemSize::new(g.cell_width.max(1), g.cell_height.max(1))
            }
            _ => ItemSize::new(self.item_size.width.max(1), self.item_size.height.max(1)),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_item_size(mut self, item_size: ItemSize) -> Self {
        self.item_size = item_size;
        self
    }

    pub fn with_group_info(mut self, group_info: Option<GroupInfo>) -> Self {
        self.group_info = group_info;
        self
    }

    pub fn with_header(mut self, header_size: ItemSize, header_gap: u32) -> Self {
        self.header_size = header_size;
        self.header_gap = header_gap;
        self
    }

    pub fn with_group_margin(mut self, group_margin: u32) -> Self {
        self.group_margin = group_margin;
        self
    }

    pub fn with_gutter(mut self, gutter: u32) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_padding_end(mut self, padding_end: u32) -> Self {
        self.padding_end = padding_end;
        self
    }
}

/// Configuration for [`crate::GridView`].
///
/// Cheap to clone: the hooks are stored in `Arc`s.
pub struct GridOptions<T, G = String> {
    pub group_key_of: GroupKeyFn<T>,
    pub group_data_of: GroupDataFn<T, G>,
    /// Optional per-item size class, consulted only in multisize mode.
    pub item_info: Option<ItemInfoFn<T>>,
    pub layout: LayoutOptions,
    /// Container-creation budget for a single scheduling pass.
    ///
    /// At least one container is created per pass, so a zero budget still makes progress.
    pub max_time_per_create_containers: Duration,
    pub clock: Clock,
    /// Number of items realized on each side of the visible range.
    pub overscan: usize,
    pub initial_rect: Rect,
    pub initial_offset: u64,
}

impl<T, G> Clone for GridOptions<T, G> {
    fn clone(&self) -> Self {
        Self {
            group_key_of: Arc::clone(&self.group_key_of),
            group_data_of: Arc::clone(&self.group_data_of),
            item_info: self.item_info.clone(),
            layout: self.layout,
            max_time_per_create_containers: self.max_time_per_create_containers,
            clock: self.clock.clone(),
            overscan: self.overscan,
            initial_rect: self.initial_rect,
            initial_offset: self.initial_offset,
        }
    }
}

impl<T: 'static> GridOptions<T, String> {
    /// Creates options whose group header data is the group key itself.
    pub fn new(group_key_of: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        let group_key_of: GroupKeyFn<T> = Arc::new(group_key_of);
        let group_data_of: GroupDataFn<T, String> = {
            let key_of = Arc::clone(&group_key_of);
            Arc::new(move |item: &T| key_of(item))
        };
        Self::from_parts(group_key_of, group_data_of)
    }
}

impl<T, G> GridOptions<T, G> {
    pub fn new_with_data(
        group_key_of: impl Fn(&T) -> String + Send + Sync + 'static,
        group_data_of: impl Fn(&T) -> G + Send + Sync + 'static,
    ) -> Self {
        Self::from_parts(Arc::new(group_key_of), Arc::new(group_data_of))
    }

    fn from_parts(group_key_of: GroupKeyFn<T>, group_data_of: GroupDataFn<T, G>) -> Self {
        Self {
            group_key_of,
            group_data_of,
            item_info: None,
            layout: LayoutOptions::default(),
            max_time_per_create_containers: Duration::from_millis(5),
            clock: Clock::default(),
            overscan: 2,
            initial_rect: Rect::default(),
            initial_offset: 0,
        }
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_item_info(
        mut self,
        item_info: impl Fn(usize, &T) -> ItemSize + Send + Sync + 'static,
    ) -> Self {
        self.item_info = Some(Arc::new(item_info));
        self
    }

    pub fn with_max_time_per_create_containers(mut self, budget: Duration) -> Self {
        self.max_time_per_create_containers = budget;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_initial_rect(mut self, initial_rect: Rect) -> Self {
        self.initial_rect = initial_rect;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: u64) -> Self {
        self.initial_offset = initial_offset;
        self
    }
}

impl<T, G> core::fmt::Debug for GridOptions<T, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridOptions")
            .field("item_info", &self.item_info.is_some())
            .field("layout", &self.layout)
            .field(
                "max_time_per_create_containers",
                &self.max_time_per_create_containers,
            )
            .field("clock", &self.clock)
            .field("overscan", &self.overscan)
            .field("initial_rect", &self.initial_rect)
            .field("initial_offset", &self.initial_offset)
            .finish_non_exhaustive()
    }
}
