//! Container bookkeeping for the realized index range.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::options::Clock;
use crate::{Container, ContainerEvent, ContainerId, Geometry, ItemKey, VirtualRange};

#[derive(Clone, Copy, Debug)]
struct Slot {
    container: Container,
    /// Index last reported to the host through an event.
    reported_index: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Window {
    slots: BTreeMap<usize, Slot>,
    realized: VirtualRange,
    visible: VirtualRange,
    next_id: ContainerId,
    events: Vec<ContainerEvent>,
}

impl Window {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub(crate) fn realized(&self) -> VirtualRange {
        self.realized
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Container> {
        self.slots.get(&index).map(|s| &s.container)
    }

    pub(crate) fn containers(&self) -> impl Iterator<Item = &Container> + '_ {
        self.slots.values().map(|s| &s.container)
    }

    pub(crate) fn take_events(&mut self) -> Vec<ContainerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Indices in the realized range that have no container yet.
    pub(crate) fn missing(&self) -> usize {
        let live = self
            .slots
            .range(self.realized.start_index..self.realized.end_index)
            .count();
        self.realized.len() - live
    }

    /// An item was inserted at `index`: later containers move up by one.
    pub(crate) fn on_insert(&mut self, index: usize) {
        let tail = self.slots.split_off(&index);
        for (i, mut slot) in tail {
            slot.container.index = i + 1;
            self.slots.insert(i + 1, slot);
        }
    }

    /// The item at `index` was removed: its container is released, later ones move down.
    pub(crate) fn on_remove(&mut self, index: usize) {
        if let Some(slot) = self.slots.remove(&index) {
            self.release(slot);
        }
        let tail = self.slots.split_off(&index);
        for (i, mut slot) in tail {
            slot.container.index = i - 1;
            self.slots.insert(i - 1, slot);
        }
    }

    /// The item at `from` now lives at `to`; its container (if any) follows it.
    pub(crate) fn on_move(&mut self, from: usize, to: usize) {
        let moving = self.slots.remove(&from);
        let tail = self.slots.split_off(&from);
        for (i, mut slot) in tail {
            slot.container.index = i - 1;
            self.slots.insert(i - 1, slot);
        }
        self.on_insert(to);
        if let Some(mut slot) = moving {
            slot.container.index = to;
            self.slots.insert(to, slot);
        }
    }

    /// The data of the item at `index` changed in place; the host re-binds its container.
    pub(crate) fn on_change(&mut self, index: usize) {
        if let Some(slot) = self.slots.get(&index) {
            self.events.push(ContainerEvent::Changed {
                id: slot.container.id,
                index,
                key: slot.container.key,
            });
        }
    }

    /// Releases every container.
    pub(crate) fn release_all(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        for slot in slots.into_values() {
            self.release(slot);
        }
        self.realized = VirtualRange::default();
        self.visible = VirtualRange::default();
    }

    /// Sets the target range and releases containers outside of it.
    pub(crate) fn set_range(&mut self, realized: VirtualRange, visible: VirtualRange) {
        self.realized = realized;
        self.visible = visible;
        let stale: Vec<usize> = self
            .slots
            .keys()
            .copied()
            .filter(|i| !realized.contains(*i))
            .collect();
        for index in stale {
            if let Some(slot) = self.slots.remove(&index) {
                self.release(slot);
            }
        }
    }

    /// Re-reads the geometry of every live container and reports the ones that moved.
    pub(crate) fn refresh(&mut self, mut geometry_of: impl FnMut(usize) -> Option<Geometry>) {
        for (&index, slot) in &mut self.slots {
            let Some(geometry) = geometry_of(index) else {
                continue;
            };
            if geometry != slot.container.geometry || slot.reported_index != index {
                slot.container.geometry = geometry;
                slot.reported_index = index;
                self.events.push(ContainerEvent::Moved {
                    id: slot.container.id,
                    index,
                    geometry,
                });
            }
        }
    }

    /// Creates missing containers, visible indices first, until `budget` has elapsed on
    /// `clock`. At least one container is created per call when any is missing.
    ///
    /// Returns the number of containers created.
    pub(crate) fn realize(
        &mut self,
        clock: &Clock,
        budget: Duration,
        mut bind: impl FnMut(usize) -> Option<(ItemKey, Geometry)>,
    ) -> usize {
        let started = clock.now();
        let visible = self.visible.start_index.max(self.realized.start_index)
            ..self.visible.end_index.min(self.realized.end_index);
        let before = self.realized.start_index..visible.start.max(self.realized.start_index);
        let after = visible.end.max(self.realized.start_index)..self.realized.end_index;

        let mut created = 0usize;
        for index in visible.chain(after).chain(before.rev()) {
            if self.slots.contains_key(&index) {
                continue;
            }
            let Some((key, geometry)) = bind(index) else {
                continue;
            };
            let id = self.next_id;
            self.next_id += 1;
            self.slots.insert(
                index,
                Slot {
                    container: Container {
                        id,
                        index,
                        key,
                        geometry,
                    },
                    reported_index: index,
                },
            );
            self.events.push(ContainerEvent::Realized { id, index, key });
            created += 1;
            if clock.now().saturating_sub(started) >= budget {
                break;
            }
        }
        if created > 0 {
            gtrace!(created, missing = self.missing(), "realize containers");
        }
        created
    }

    fn release(&mut self, slot: Slot) {
        self.events.push(ContainerEvent::Released {
            id: slot.container.id,
            key: slot.container.key,
        });
    }
}
