use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::completion::{Completion, Resolver};
use crate::groups::GroupProjection;
use crate::layout::LayoutEngine;
use crate::reconciler::Reconciler;
use crate::selection::Selection;
use crate::source::{DataSource, Edit, ListDataSource, Notification, Position};
use crate::types::ItemRecord;
use crate::window::Window;
use crate::{
    Align, Container, ContainerEvent, Error, Geometry, Group, GridOptions, Item, ItemKey,
    ItemSize, LayoutOptions, PendingWork, Rect, Result, ViewportState, VirtualRange,
};

/// A virtualized, grouped grid over a [`DataSource`].
///
/// The view mirrors the source's item sequence, partitions it into groups, places every item
/// on a grid and keeps containers realized for the items around the viewport. It is UI-agnostic:
/// the host feeds it viewport geometry and scroll offsets, consumes [`ContainerEvent`]s, and
/// drives progress by calling [`GridView::run_pass`] once per frame.
///
/// Edits are requested through the `insert_*`/`remove`/`move_*`/`change` methods. They are
/// queued and sent to the source one at a time; each returns a [`Completion`] that resolves
/// with the affected key once the data source has confirmed the edit. The next queued edit is
/// held back until then, even across passes.
pub struct GridView<T, G = String, S = ListDataSource<T>> {
    options: GridOptions<T, G>,
    source: S,
    notifications: Receiver<Notification<T>>,

    items: Vec<ItemRecord<T>>,
    groups: GroupProjection<G>,
    layout: LayoutEngine,
    window: Window,
    window_dirty: bool,
    selection: Selection,
    reconciler: Reconciler<T>,

    rect: Rect,
    scroll_offset: u64,
    ensure_visible: Option<ItemKey>,
    ready_waiters: Vec<Resolver<()>>,
    generation: u64,
    disposed: bool,
}

impl<T, G, S> GridView<T, G, S>
where
    T: Clone + 'static,
    G: Clone,
    S: DataSource<T>,
{
    /// Creates a view over `source` and loads its current contents.
    ///
    /// Geometry and containers are produced by the first [`GridView::run_pass`].
    pub fn new(mut source: S, options: GridOptions<T, G>) -> Self {
        let notifications = source.subscribe();
        let rect = options.initial_rect;
        let layout = LayoutEngine::new(options.layout, rect.cross);
        let mut view = Self {
            scroll_offset: options.initial_offset,
            options,
            source,
            notifications,
            items: Vec::new(),
            groups: GroupProjection::new(),
            layout,
            window: Window::new(),
            window_dirty: true,
            selection: Selection::default(),
            reconciler: Reconciler::new(),
            rect,
            ensure_visible: None,
            ready_waiters: Vec::new(),
            generation: 0,
            disposed: false,
        };
        view.reload();
        gdebug!(
            count = view.items.len(),
            groups = view.groups.len(),
            "grid view created"
        );
        view
    }

    pub fn options(&self) -> &GridOptions<T, G> {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Direct access to the data source. Edits applied here bypass the queue but are still
    /// mirrored through the notification stream on the next pass.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Number of items in the local mirror of the source.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Increments whenever the mirrored sequence changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn item(&self, index: usize) -> Result<Item<T>> {
        self.check_alive()?;
        let record = self.record(index)?;
        Ok(Item {
            key: record.key,
            data: record.data.clone(),
        })
    }

    pub fn key_of(&self, index: usize) -> Result<ItemKey> {
        self.check_alive()?;
        self.record(index).map(|r| r.key)
    }

    pub fn index_of_key(&self, key: ItemKey) -> Option<usize> {
        self.items.iter().position(|r| r.key == key)
    }

    // Groups.

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, group: usize) -> Option<Group<G>> {
        self.groups.group(group)
    }

    pub fn groups(&self) -> Vec<Group<G>> {
        (0..self.groups.len())
            .filter_map(|i| self.groups.group(i))
            .collect()
    }

    /// Index of the group containing item `index`.
    pub fn group_index_of(&self, index: usize) -> Result<usize> {
        self.check_alive()?;
        self.record(index)?;
        Ok(self.groups.group_index_of(index))
    }

    // Geometry.

    pub fn layout_options(&self) -> &LayoutOptions {
        self.layout.options()
    }

    /// Replaces the layout parameters. Every group is re-packed on the next pass.
    pub fn set_layout_options(&mut self, layout: LayoutOptions) -> Result<()> {
        self.check_alive()?;
        self.options.layout = layout;
        self.layout.set_options(layout);
        for index in 0..self.items.len() {
            let size = self.size_of(index, &self.items[index].data);
            self.items[index].size = size;
        }
        self.window_dirty = true;
        Ok(())
    }

    /// Number of cells stacked along the cross axis of a shelf.
    pub fn lanes(&self) -> u32 {
        self.layout.lanes()
    }

    /// Geometry of the item at `index`, or `None` while layout is pending.
    pub fn item_geometry(&self, index: usize) -> Option<Geometry> {
        if index >= self.items.len() {
            return None;
        }
        self.layout.item_geometry(&self.groups, index)
    }

    pub fn header_geometry(&self, group: usize) -> Option<Geometry> {
        self.layout.header_geometry(group)
    }

    /// Main-axis extent of all content, including group margins and end padding.
    pub fn total_extent(&self) -> u64 {
        self.layout.total_extent()
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_extent().saturating_sub(self.rect.main as u64)
    }

    /// Items intersecting `[offset, offset + extent)` on the main axis.
    pub fn visible_index_range(&self, offset: u64, extent: u32) -> VirtualRange {
        self.layout
            .visible_index_range(&self.groups, offset, offset.saturating_add(extent as u64))
    }

    // Viewport.

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState {
            rect: self.rect,
            scroll_offset: self.scroll_offset,
            realized: self.window.realized(),
        }
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u64) -> Result<()> {
        self.check_alive()?;
        self.ensure_visible = None;
        self.scroll_offset = offset;
        self.window_dirty = true;
        Ok(())
    }

    pub fn set_viewport(&mut self, rect: Rect) -> Result<()> {
        self.check_alive()?;
        self.ensure_visible = None;
        self.rect = rect;
        self.layout.set_viewport_cross(rect.cross);
        self.window_dirty = true;
        Ok(())
    }

    /// Scrolls the item at `index` into view (minimal scroll) and realizes its container.
    ///
    /// Takes effect on the next pass; a later `set_scroll_offset`/`set_viewport` cancels it
    /// and a later `ensure_visible` replaces it.
    pub fn ensure_visible(&mut self, index: usize) -> Result<()> {
        self.check_alive()?;
        let key = self.record(index)?.key;
        self.ensure_visible = Some(key);
        Ok(())
    }

    // Containers.

    pub fn element_from_index(&self, index: usize) -> Option<&Container> {
        self.window.get(index)
    }

    /// Live containers in index order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> + '_ {
        self.window.containers()
    }

    pub fn container_count(&self) -> usize {
        self.window.len()
    }

    /// Drains the realization events produced since the last call.
    pub fn take_container_events(&mut self) -> Vec<ContainerEvent> {
        self.window.take_events()
    }

    // Selection.

    pub fn selection_set(&mut self, indices: &[usize]) -> Result<()> {
        self.check_alive()?;
        self.selection.set(&self.items, indices)
    }

    pub fn selection_add(&mut self, index: usize) -> Result<()> {
        self.check_alive()?;
        self.selection.add(&self.items, index)
    }

    pub fn selection_remove(&mut self, index: usize) -> Result<()> {
        self.check_alive()?;
        self.selection.remove(&self.items, index)
    }

    pub fn selection_clear(&mut self) -> Result<()> {
        self.check_alive()?;
        self.selection.clear();
        Ok(())
    }

    /// Current indices of the selected items, ascending.
    pub fn selection_indices(&self) -> Vec<usize> {
        self.selection.indices(&self.items)
    }

    pub fn selection_keys(&self) -> Vec<ItemKey> {
        self.selection.keys()
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|r| self.selection.contains(r.key))
    }

    // Edits.

    /// Queues an arbitrary edit.
    pub fn edit(&mut self, edit: Edit<T>) -> Result<Completion<ItemKey>> {
        self.check_alive()?;
        Ok(self.reconciler.enqueue(edit))
    }

    pub fn insert_before(&mut self, key: ItemKey, data: T) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Insert {
            data,
            at: Position::Before(key),
        })
    }

    pub fn insert_after(&mut self, key: ItemKey, data: T) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Insert {
            data,
            at: Position::After(key),
        })
    }

    pub fn insert_at_start(&mut self, data: T) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Insert {
            data,
            at: Position::Start,
        })
    }

    pub fn insert_at_end(&mut self, data: T) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Insert {
            data,
            at: Position::End,
        })
    }

    pub fn remove(&mut self, key: ItemKey) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Remove { key })
    }

    pub fn move_before(&mut self, key: ItemKey, reference: ItemKey) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Move {
            key,
            to: Position::Before(reference),
        })
    }

    pub fn move_after(&mut self, key: ItemKey, reference: ItemKey) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Move {
            key,
            to: Position::After(reference),
        })
    }

    pub fn move_to_start(&mut self, key: ItemKey) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Move {
            key,
            to: Position::Start,
        })
    }

    pub fn move_to_end(&mut self, key: ItemKey) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Move {
            key,
            to: Position::End,
        })
    }

    pub fn change(&mut self, key: ItemKey, data: T) -> Result<Completion<ItemKey>> {
        self.edit(Edit::Change { key, data })
    }

    // Scheduling.

    /// Outstanding work; idle means `ready()` would resolve immediately.
    pub fn pending(&self) -> PendingWork {
        PendingWork {
            queued_edits: self.reconciler.len(),
            edit_in_flight: self.reconciler.is_in_flight(),
            notifications_pending: !self.notifications.is_empty(),
            layout_dirty: self.layout.is_dirty(),
            window_dirty: self.window_dirty,
            missing_containers: self.window.missing(),
            ensure_visible: self.ensure_visible.is_some(),
        }
    }

    /// Resolves once nothing is pending. Fails with [`Error::Disposed`] if the view is torn
    /// down first.
    pub fn ready(&mut self) -> Completion<()> {
        if self.disposed {
            return Completion::resolved(Err(Error::Disposed));
        }
        if self.pending().is_idle() {
            return Completion::resolved(Ok(()));
        }
        let (completion, resolver) = Completion::pending();
        self.ready_waiters.push(resolver);
        completion
    }

    /// Runs one scheduling slice and returns what is still outstanding.
    ///
    /// Order: mirror source notifications, advance the edit queue by one step (settle the
    /// edit in flight or dispatch the next one) and mirror what it produced, re-pack dirty layout, resolve a pending `ensure_visible`, update the
    /// realized window within the creation budget, then resolve `ready()` waiters.
    pub fn run_pass(&mut self) -> PendingWork {
        if self.disposed {
            return PendingWork::default();
        }
        self.drain_notifications();
        self.reconciler.advance(&mut self.source);
        self.drain_notifications();

        if self.layout.is_dirty() {
            self.layout.relayout(&self.groups, &self.items);
            self.window_dirty = true;
        }
        let max = self.max_scroll_offset();
        if self.scroll_offset > max {
            self.scroll_offset = max;
            self.window_dirty = true;
        }

        if let Some(key) = self.ensure_visible.take() {
            if let Some(index) = self.index_of_key(key) {
                let target = self.scroll_target(index, Align::Auto);
                if target != self.scroll_offset {
                    self.scroll_offset = target;
                    self.window_dirty = true;
                }
            }
        }

        if self.window_dirty {
            self.update_window();
        }
        self.realize();

        let pending = self.pending();
        if pending.is_idle() && !self.ready_waiters.is_empty() {
            gtrace!(waiters = self.ready_waiters.len(), "grid view ready");
            for waiter in self.ready_waiters.drain(..) {
                waiter.resolve(Ok(()));
            }
        }
        pending
    }

    /// Runs passes until nothing is pending, or until only an unconfirmed edit remains.
    /// Returns the number of passes.
    pub fn settle(&mut self) -> usize {
        let mut passes = 0usize;
        while !self.disposed {
            passes += 1;
            let pending = self.run_pass();
            if pending.is_idle() || pending.is_awaiting_source() {
                break;
            }
        }
        passes
    }

    /// Tears the view down: releases every container and fails queued or in-flight edits and
    /// `ready()` waiters with [`Error::Disposed`]. Later calls fail with the same error.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.reconciler.fail_all(Error::Disposed);
        for waiter in self.ready_waiters.drain(..) {
            waiter.resolve(Err(Error::Disposed));
        }
        self.window.release_all();
        self.ensure_visible = None;
        gdebug!("grid view disposed");
    }

    /// Offset that brings the item at `index` into view with `align`, clamped to the
    /// scrollable range.
    pub fn scroll_target(&self, index: usize, align: Align) -> u64 {
        let Some(geometry) = self.item_geometry(index) else {
            return self.scroll_offset;
        };
        let o = self.layout.orientation();
        let start = geometry.main_start(o);
        let end = geometry.main_end(o);
        let view = self.rect.main as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add((end - start) / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };
        target.min(self.max_scroll_offset())
    }

    fn check_alive(&self) -> Result<()> {
        if self.disposed {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn record(&self, index: usize) -> Result<&ItemRecord<T>> {
        self.items
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.items.len()))
    }

    fn size_of(&self, index: usize, data: &T) -> ItemSize {
        match &self.options.item_info {
            Some(info) if self.options.layout.is_multisize() => info(index, data),
            _ => self.options.layout.item_size,
        }
    }

    fn make_record(&self, index: usize, item: Item<T>) -> ItemRecord<T> {
        ItemRecord {
            key: item.key,
            group_key: (self.options.group_key_of)(&item.data),
            size: self.size_of(index, &item.data),
            data: item.data,
        }
    }

    /// Reloads the whole sequence from the source.
    fn reload(&mut self) {
        let count = self.source.count();
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            if let Some(item) = self.source.item_from_index(index) {
                items.push(self.make_record(index, item));
            }
        }
        self.items = items;
        self.groups.rebuild(&self.items, &*self.options.group_data_of);
        self.layout.reset(self.groups.len());
        self.window.release_all();
        self.selection.retain_present(&self.items);
        self.window_dirty = true;
        self.generation += 1;
    }

    fn drain_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            self.apply_notification(notification);
        }
    }

    fn apply_notification(&mut self, notification: Notification<T>) {
        self.generation += 1;
        self.window_dirty = true;
        let data_of = Arc::clone(&self.options.group_data_of);
        let data_of = &*data_of;
        match notification {
            Notification::Inserted { item, index } => {
                if index > self.items.len() {
                    gwarn!(index, count = self.items.len(), "insert out of range; reloading");
                    self.reload();
                    return;
                }
                let record = self.make_record(index, item);
                self.items.insert(index, record);
                let splice = self.groups.insert(index, &self.items, data_of);
                self.layout.splice(splice, &self.groups, index);
                self.window.on_insert(index);
            }
            Notification::Removed { key, index } => {
                if self.items.get(index).map(|r| r.key) != Some(key) {
                    gwarn!(key, index, "removed key not at index; reloading");
                    self.reload();
                    return;
                }
                self.items.remove(index);
                self.selection.forget(key);
                let splice = self.groups.remove(index, &self.items, data_of);
                self.layout.splice(splice, &self.groups, index);
                self.window.on_remove(index);
            }
            Notification::Moved { key, from, to } => {
                if self.items.get(from).map(|r| r.key) != Some(key) || to >= self.items.len() {
                    gwarn!(key, from, to, "moved key not at index; reloading");
                    self.reload();
                    return;
                }
                let record = self.items.remove(from);
                let splice = self.groups.remove(from, &self.items, data_of);
                self.layout.splice(splice, &self.groups, from);
                self.items.insert(to, record);
                let splice = self.groups.insert(to, &self.items, data_of);
                self.layout.splice(splice, &self.groups, to);
                self.window.on_move(from, to);
            }
            Notification::Changed { item, index } => {
                if self.items.get(index).map(|r| r.key) != Some(item.key) {
                    gwarn!(key = item.key, index, "changed key not at index; reloading");
                    self.reload();
                    return;
                }
                let record = self.make_record(index, item);
                let same_slot = record.group_key == self.items[index].group_key
                    && record.size == self.items[index].size;
                self.items[index] = record;
                let splice = self.groups.change(index, &self.items, data_of);
                if !same_slot || splice.structural {
                    self.layout.splice(splice, &self.groups, index);
                }
                self.window.on_change(index);
            }
            Notification::Reset => {
                gdebug!("source reset");
                self.reload();
            }
        }
    }

    fn update_window(&mut self) {
        self.window_dirty = false;
        let count = self.items.len();
        if count == 0 || self.rect.main == 0 || self.layout.is_dirty() {
            self.window
                .set_range(VirtualRange::default(), VirtualRange::default());
            return;
        }
        let visible = self.visible_index_range(self.scroll_offset, self.rect.main);
        let overscan = self.options.overscan;
        let realized = VirtualRange {
            start_index: visible.start_index.saturating_sub(overscan),
            end_index: visible.end_index.saturating_add(overscan).min(count),
        };
        self.window.set_range(realized, visible);
        let layout = &self.layout;
        let groups = &self.groups;
        self.window.refresh(|index| layout.item_geometry(groups, index));
        gtrace!(
            start = realized.start_index,
            end = realized.end_index,
            offset = self.scroll_offset,
            "window range"
        );
    }

    fn realize(&mut self) {
        if self.window.missing() == 0 {
            return;
        }
        let layout = &self.layout;
        let groups = &self.groups;
        let items = &self.items;
        self.window.realize(
            &self.options.clock,
            self.options.max_time_per_create_containers,
            |index| {
                let key = items.get(index)?.key;
                Some((key, layout.item_geometry(groups, index)?))
            },
        );
    }
}

impl<T, G, S> core::fmt::Debug for GridView<T, G, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridView")
            .field("count", &self.items.len())
            .field("groups", &self.groups.len())
            .field("rect", &self.rect)
            .field("scroll_offset", &self.scroll_offset)
            .field("containers", &self.window.len())
            .field("queued_edits", &self.reconciler.len())
            .field("edit_in_flight", &self.reconciler.is_in_flight())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl<T, G, S> GridView<T, G, S>
where
    T: Clone + 'static,
    G: Clone,
    S: DataSource<T>,
{
    /// Compares the incremental state against a projection and layout built from scratch.
    pub(crate) fn check_consistency(&self) -> core::result::Result<(), String> {
        self.groups.check_invariants(self.items.len())?;
        let mut rebuilt = GroupProjection::new();
        rebuilt.rebuild(&self.items, &*self.options.group_data_of);
        if rebuilt.shape() != self.groups.shape() {
            return Err(format!(
                "projection {:?} != rebuilt {:?}",
                self.groups.shape(),
                rebuilt.shape()
            ));
        }
        let mut fresh = LayoutEngine::new(self.options.layout, self.rect.cross);
        fresh.reset(rebuilt.len());
        fresh.relayout(&rebuilt, &self.items);
        for index in 0..self.items.len() {
            let incremental = self.layout.item_geometry(&self.groups, index);
            let expected = fresh.item_geometry(&rebuilt, index);
            if incremental != expected {
                return Err(format!(
                    "item {index}: geometry {incremental:?} != {expected:?}"
                ));
            }
        }
        if fresh.total_extent() != self.layout.total_extent() {
            return Err(format!(
                "total extent {} != {}",
                self.layout.total_extent(),
                fresh.total_extent()
            ));
        }
        Ok(())
    }
}
