//! A headless engine for virtualized, grouped grids.
//!
//! For adapter-level utilities (scroll anchoring, a frame controller), see the
//! `tilegrid-adapter` crate.
//!
//! This crate covers the core of a grouped list/grid control that must stay interactive with
//! large collections:
//! - a group projection that partitions the item sequence into runs of equal group keys,
//! - a grid layout with optional cell spanning (multisize tiles),
//! - a realized window of containers around the viewport, created under a time budget,
//! - a serialized edit queue reconciled against an observable [`DataSource`],
//! - key-based selection that survives edits.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - the viewport rect and scroll offset
//! - a frame loop calling [`GridView::run_pass`]
//! - rendering for the [`ContainerEvent`]s it receives
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod completion;
mod error;
mod fenwick;
mod groups;
mod layout;
mod options;
mod reconciler;
mod selection;
mod source;
mod state;
mod types;
mod view;
mod window;


pub use completion::{Completion, Resolver};
pub use error::{Error, Result};
pub use options::{
    Clock, GridOptions, GroupDataFn, GroupInfo, GroupKeyFn, ItemInfoFn, LayoutOptions,
};
pub use source::{DataSource, Edit, ListDataSource, Notification, Position};
pub use state::{PendingWork, ViewportState};
pub use types::{
    Align, Container, ContainerEvent, ContainerId, Geometry, Group, Item, ItemKey, ItemSize,
    Orientation, Rect, VirtualRange,
};
pub use view::GridView;
