use std::collections::BTreeSet;

use crate::types::ItemRecord;
use crate::{Error, ItemKey, Result};

/// Selected items, tracked by key so that edits elsewhere never change what is selected.
#[derive(Clone, Debug, Default)]
pub(crate) struct Selection {
    keys: BTreeSet<ItemKey>,
}

impl Selection {
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn contains(&self, key: ItemKey) -> bool {
        self.keys.contains(&key)
    }

    /// Replaces the selection. Fails without touching it if any index is out of range.
    pub(crate) fn set<T>(&mut self, items: &[ItemRecord<T>], indices: &[usize]) -> Result<()> {
        let keys = resolve(items, indices)?;
        self.keys = keys.into_iter().collect();
        Ok(())
    }

    pub(crate) fn add<T>(&mut self, items: &[ItemRecord<T>], index: usize) -> Result<()> {
        let key = key_at(items, index)?;
        self.keys.insert(key);
        Ok(())
    }

    pub(crate) fn remove<T>(&mut self, items: &[ItemRecord<T>], index: usize) -> Result<()> {
        let key = key_at(items, index)?;
        self.keys.remove(&key);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.keys.clear();
    }

    /// Drops a key whose item left the collection.
    pub(crate) fn forget(&mut self, key: ItemKey) -> bool {
        self.keys.remove(&key)
    }

    /// Drops keys that are no longer present, e.g. after a reload.
    pub(crate) fn retain_present<T>(&mut self, items: &[ItemRecord<T>]) {
        if self.keys.is_empty() {
            return;
        }
        let present: BTreeSet<ItemKey> = items.iter().map(|r| r.key).collect();
        self.keys.retain(|k| present.contains(k));
    }

    /// Current positions of the selected items, ascending.
    pub(crate) fn indices<T>(&self, items: &[ItemRecord<T>]) -> Vec<usize> {
        if self.keys.is_empty() {
            return Vec::new();
        }
        items
            .iter()
            .enumerate()
            .filter(|(_, r)| self.keys.contains(&r.key))
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn keys(&self) -> Vec<ItemKey> {
        self.keys.iter().copied().collect()
    }
}

fn key_at<T>(items: &[ItemRecord<T>], index: usize) -> Result<ItemKey> {
    items
        .get(index)
        .map(|r| r.key)
        .ok_or_else(|| Error::out_of_range(index, items.len()))
}

fn resolve<T>(items: &[ItemRecord<T>], indices: &[usize]) -> Result<Vec<ItemKey>> {
    indices.iter().map(|&i| key_at(items, i)).collect()
}
