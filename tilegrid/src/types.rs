/// Opaque, stable identity of an item. Assigned by the data source.
pub type ItemKey = u64;

/// Identity of a realized container. Never reused within one [`crate::GridView`].
pub type ContainerId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

/// The scroll axis of the grid.
///
/// `Horizontal` grids scroll along x and stack tiles top-to-bottom inside a shelf;
/// `Vertical` grids scroll along y and stack tiles left-to-right inside a shelf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Viewport extent split by axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub main: u32,
    pub cross: u32,
}

/// Pixel size of a tile or header, in screen terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemSize {
    pub width: u32,
    pub height: u32,
}

impl ItemSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub(crate) fn main(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub(crate) fn cross(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Horizontal => self.height,
            Orientation::Vertical => self.width,
        }
    }
}

/// Content-space placement of a tile or a group header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub left: u64,
    pub top: u64,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub(crate) fn from_axes(
        orientation: Orientation,
        main: u64,
        cross: u64,
        main_size: u32,
        cross_size: u32,
    ) -> Self {
        match orientation {
            Orientation::Horizontal => Self {
                left: main,
                top: cross,
                width: main_size,
                height: cross_size,
            },
            Orientation::Vertical => Self {
                left: cross,
                top: main,
                width: cross_size,
                height: main_size,
            },
        }
    }

    /// Start offset along the scroll axis.
    pub fn main_start(&self, orientation: Orientation) -> u64 {
        match orientation {
            Orientation::Horizontal => self.left,
            Orientation::Vertical => self.top,
        }
    }

    /// End offset (exclusive) along the scroll axis.
    pub fn main_end(&self, orientation: Orientation) -> u64 {
        match orientation {
            Orientation::Horizontal => self.left.saturating_add(self.width as u64),
            Orientation::Vertical => self.top.saturating_add(self.height as u64),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl VirtualRange {
    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// An item as delivered by the data source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item<T> {
    pub key: ItemKey,
    pub data: T,
}

/// A contiguous run of items sharing a group key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group<G> {
    pub key: String,
    pub data: G,
    pub start_index: usize,
    pub item_count: usize,
}

impl<G> Group<G> {
    pub fn end_index(&self) -> usize {
        self.start_index + self.item_count
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index()
    }
}

/// A realized visual binding for exactly one item at one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Container {
    pub id: ContainerId,
    pub index: usize,
    pub key: ItemKey,
    pub geometry: Geometry,
}

/// Realization changes, queued for the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerEvent {
    Realized {
        id: ContainerId,
        index: usize,
        key: ItemKey,
    },
    Moved {
        id: ContainerId,
        index: usize,
        geometry: Geometry,
    },
    /// The item bound to a live container got new data; the host should re-render it.
    Changed {
        id: ContainerId,
        index: usize,
        key: ItemKey,
    },
    Released {
        id: ContainerId,
        key: ItemKey,
    },
}

/// The engine's mirror of one item: source data plus the derived group key and size class.
#[derive(Clone, Debug)]
pub(crate) struct ItemRecord<T> {
    pub key: ItemKey,
    pub data: T,
    pub group_key: String,
    pub size: ItemSize,
}
