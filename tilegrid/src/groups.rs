//! Group projection: partitions the item sequence into runs of equal group keys.

use std::collections::HashMap;

use crate::Group;
use crate::types::ItemRecord;

#[derive(Clone, Debug)]
struct GroupRun<G> {
    key: String,
    /// `group_data_of` of the run's first item.
    data: G,
    start: usize,
    count: usize,
}

/// Describes how a projection update replaced groups.
///
/// Groups `[first, first + removed)` of the previous projection were replaced by groups
/// `[first, first + inserted)` of the new one. Later groups kept their identity (their
/// `start_index` may have shifted).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Splice {
    pub first: usize,
    pub removed: usize,
    pub inserted: usize,
    /// `false` when the replaced groups have the same keys, starts and counts as before.
    pub structural: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct GroupProjection<G> {
    groups: Vec<GroupRun<G>>,
    /// Index of the last group carrying each key; its data is shown for all of them.
    shown: HashMap<String, usize>,
}

impl<G> GroupProjection<G> {
    pub(crate) fn new() -> Self {
        Self {
            groups: Vec::new(),
            shown: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn reindex(&mut self) {
        self.shown.clear();
        for (i, g) in self.groups.iter().enumerate() {
            self.shown.insert(g.key.clone(), i);
        }
    }
}

impl<G: Clone> GroupProjection<G> {
    pub(crate) fn rebuild<T>(&mut self, items: &[ItemRecord<T>], data_of: &dyn Fn(&T) -> G) {
        self.groups = partition(items, 0, items.len(), data_of);
        self.reindex();
        gdebug!(groups = self.groups.len(), items = items.len(), "rebuild groups");
    }

    /// Item `index` was inserted; `items` is the sequence after the insertion.
    pub(crate) fn insert<T>(
        &mut self,
        index: usize,
        items: &[ItemRecord<T>],
        data_of: &dyn Fn(&T) -> G,
    ) -> Splice {
        let old_len = items.len().saturating_sub(1);
        if self.groups.is_empty() || old_len == 0 {
            let removed = self.groups.len();
            self.rebuild(items, data_of);
            return Splice {
                first: 0,
                removed,
                inserted: self.groups.len(),
                structural: true,
            };
        }
        let lo = self.group_index_of(index.saturating_sub(1).min(old_len - 1));
        let hi = self.group_index_of(index.min(old_len - 1));
        self.repartition(lo, hi, 1, items, data_of)
    }

    /// Item `index` was removed; `items` is the sequence after the removal.
    pub(crate) fn remove<T>(
        &mut self,
        index: usize,
        items: &[ItemRecord<T>],
        data_of: &dyn Fn(&T) -> G,
    ) -> Splice {
        let old_len = items.len() + 1;
        let lo = self.group_index_of(index.saturating_sub(1));
        let hi = self.group_index_of((index + 1).min(old_len - 1));
        self.repartition(lo, hi, -1, items, data_of)
    }

    /// Item `index` changed in place; `items` is the sequence after the change.
    pub(crate) fn change<T>(
        &mut self,
        index: usize,
        items: &[ItemRecord<T>],
        data_of: &dyn Fn(&T) -> G,
    ) -> Splice {
        let last = items.len().saturating_sub(1);
        let lo = self.group_index_of(index.saturating_sub(1));
        let hi = self.group_index_of((index + 1).min(last));
        self.repartition(lo, hi, 0, items, data_of)
    }

    /// Re-partitions the items covered by groups `lo..=hi` (after applying `delta` items to
    /// that span) and shifts every later group.
    fn repartition<T>(
        &mut self,
        lo: usize,
        hi: usize,
        delta: isize,
        items: &[ItemRecord<T>],
        data_of: &dyn Fn(&T) -> G,
    ) -> Splice {
        let start = self.groups[lo].start;
        let old_end = self.groups[hi].start + self.groups[hi].count;
        let new_end = old_end.saturating_add_signed(delta);
        let runs = partition(items, start, new_end, data_of);

        let structural = runs.len() != hi + 1 - lo
            || runs
                .iter()
                .zip(&self.groups[lo..=hi])
                .any(|(a, b)| a.key != b.key || a.start != b.start || a.count != b.count);

        let inserted = runs.len();
        self.groups.splice(lo..=hi, runs);
        for run in &mut self.groups[lo + inserted..] {
            run.start = run.start.saturating_add_signed(delta);
        }
        self.reindex();
        gtrace!(lo, hi, inserted, delta, structural, "repartition groups");

        Splice {
            first: lo,
            removed: hi + 1 - lo,
            inserted,
            structural,
        }
    }

    /// Index of the group containing item `index`. `index` must be in range.
    pub(crate) fn group_index_of(&self, index: usize) -> usize {
        self.groups
            .partition_point(|g| g.start <= index)
            .saturating_sub(1)
    }

    pub(crate) fn start_of(&self, group: usize) -> usize {
        self.groups[group].start
    }

    pub(crate) fn count_of(&self, group: usize) -> usize {
        self.groups[group].count
    }

    /// The group as exposed to callers. When several non-adjacent groups share a key, the
    /// data of the last one is reported for all of them.
    pub(crate) fn group(&self, group: usize) -> Option<Group<G>> {
        let run = self.groups.get(group)?;
        let shown = self
            .shown
            .get(&run.key)
            .and_then(|&i| self.groups.get(i))
            .unwrap_or(run);
        Some(Group {
            key: run.key.clone(),
            data: shown.data.clone(),
            start_index: run.start,
            item_count: run.count,
        })
    }

    /// Verifies that the groups partition `[0, count)` into maximal equal-key runs.
    pub(crate) fn check_invariants(&self, count: usize) -> Result<(), String> {
        let mut next = 0usize;
        for (i, g) in self.groups.iter().enumerate() {
            if g.start != next {
                return Err(format!("group {i} starts at {} (expected {next})", g.start));
            }
            if g.count == 0 {
                return Err(format!("group {i} is empty"));
            }
            if i > 0 && self.groups[i - 1].key == g.key {
                return Err(format!("groups {} and {i} share key {:?}", i - 1, g.key));
            }
            next += g.count;
        }
        if next != count {
            return Err(format!("groups cover {next} items (expected {count})"));
        }
        for (key, &shown) in &self.shown {
            let last = self.groups.iter().rposition(|g| &g.key == key);
            if last != Some(shown) {
                return Err(format!("key {key:?} shows group {shown} (last is {last:?})"));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn shape(&self) -> Vec<(String, usize, usize)> {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.start, g.count))
            .collect()
    }
}

fn partition<T, G>(
    items: &[ItemRecord<T>],
    start: usize,
    end: usize,
    data_of: &dyn Fn(&T) -> G,
) -> Vec<GroupRun<G>> {
    let mut runs: Vec<GroupRun<G>> = Vec::new();
    for (i, item) in items[start..end].iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.key == item.group_key => run.count += 1,
            _ => runs.push(GroupRun {
                key: item.group_key.clone(),
                data: data_of(&item.data),
                start: start + i,
                count: 1,
            }),
        }
    }
    runs
}
