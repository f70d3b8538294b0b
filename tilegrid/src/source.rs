//! The data-source boundary.
//!
//! The canonical item sequence lives outside the engine. A [`DataSource`] owns it, applies
//! [`Edit`]s, and reports every change through an ordered [`Notification`] stream. The
//! engine only ever mirrors what the notifications say.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{Completion, Error, Item, ItemKey, Result};

/// Where an inserted or moved item lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    Start,
    End,
    Before(ItemKey),
    After(ItemKey),
}

/// A single-item mutation request.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit<T> {
    Insert { data: T, at: Position },
    Remove { key: ItemKey },
    Move { key: ItemKey, to: Position },
    Change { key: ItemKey, data: T },
}

impl<T> Edit<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::Move { .. } => "move",
            Self::Change { .. } => "change",
        }
    }
}

/// A change report, delivered in the order the changes were applied.
///
/// Indices are positions in the sequence right after the change (for `Removed` and the
/// `from` of `Moved`, the position the item had right before it).
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<T> {
    Inserted { item: Item<T>, index: usize },
    Removed { key: ItemKey, index: usize },
    Moved { key: ItemKey, from: usize, to: usize },
    Changed { item: Item<T>, index: usize },
    /// The whole sequence was replaced; consumers must reload it.
    Reset,
}

/// An ordered, keyed item collection that can be edited and observed.
///
/// `count` and `item_from_index` read the source's current snapshot; they are only used for
/// (re)loading. Every later change reaches the engine through the notification stream.
pub trait DataSource<T> {
    fn count(&self) -> usize;

    fn item_from_index(&self, index: usize) -> Option<Item<T>>;

    /// Starts applying `edit`. The returned completion resolves with the affected key (the new
    /// key for inserts) once the source has confirmed the edit, possibly several passes later.
    ///
    /// The edit's notifications must be sent no later than its confirmation. On error the
    /// sequence must be left untouched and no notification sent.
    fn apply(&mut self, edit: Edit<T>) -> Completion<ItemKey>;

    /// Opens a new notification stream. Only changes applied after this call are reported.
    fn subscribe(&mut self) -> Receiver<Notification<T>>;
}

/// An in-memory [`DataSource`] backed by a `Vec`.
///
/// Keys are allocated sequentially starting at 1.
#[derive(Debug)]
pub struct ListDataSource<T> {
    items: Vec<Item<T>>,
    next_key: ItemKey,
    subscribers: Vec<Sender<Notification<T>>>,
}

impl<T: Clone> ListDataSource<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let mut source = Self {
            items: Vec::new(),
            next_key: 1,
            subscribers: Vec::new(),
        };
        for data in items {
            let key = source.allocate_key();
            source.items.push(Item { key, data });
        }
        source
    }

    pub fn items(&self) -> &[Item<T>] {
        &self.items
    }

    pub fn index_of(&self, key: ItemKey) -> Option<usize> {
        self.items.iter().position(|it| it.key == key)
    }

    pub fn key_at(&self, index: usize) -> Option<ItemKey> {
        self.items.get(index).map(|it| it.key)
    }

    /// Applies `edit` right away and notifies subscribers. [`DataSource::apply`] confirms
    /// through this.
    pub fn edit(&mut self, edit: Edit<T>) -> Result<ItemKey> {
        match edit {
            Edit::Insert { data, at } => {
                let index = self.resolve(at)?;
                let key = self.allocate_key();
                let item = Item { key, data };
                self.items.insert(index, item.clone());
                self.notify(Notification::Inserted { item, index });
                Ok(key)
            }
            Edit::Remove { key } => {
                let index = self.require(key)?;
                self.items.remove(index);
                self.notify(Notification::Removed { key, index });
                Ok(key)
            }
            Edit::Move { key, to } => {
                let from = self.require(key)?;
                if matches!(to, Position::Before(r) | Position::After(r) if r == key) {
                    return Ok(key);
                }
                // Validate the reference before touching the sequence.
                self.resolve(to)?;
                let item = self.items.remove(from);
                let to_index = match self.resolve(to) {
                    Ok(i) => i,
                    Err(err) => {
                        self.items.insert(from, item);
                        return Err(err);
                    }
                };
                self.items.insert(to_index, item);
                if to_index != from {
                    self.notify(Notification::Moved {
                        key,
                        from,
                        to: to_index,
                    });
                }
                Ok(key)
            }
            Edit::Change { key, data } => {
                let index = self.require(key)?;
                self.items[index].data = data;
                let item = self.items[index].clone();
                self.notify(Notification::Changed { item, index });
                Ok(key)
            }
        }
    }

    /// Replaces the whole sequence and notifies subscribers with [`Notification::Reset`].
    pub fn reset(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.clear();
        for data in items {
            let key = self.allocate_key();
            self.items.push(Item { key, data });
        }
        self.notify(Notification::Reset);
    }

    fn allocate_key(&mut self) -> ItemKey {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn notify(&mut self, notification: Notification<T>) {
        // Dropped receivers unsubscribe.
        self.subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    fn require(&self, key: ItemKey) -> Result<usize> {
        self.index_of(key).ok_or(Error::NotFound { key })
    }

    fn resolve(&self, at: Position) -> Result<usize> {
        match at {
            Position::Start => Ok(0),
            Position::End => Ok(self.items.len()),
            Position::Before(key) => self.require(key),
            Position::After(key) => self.require(key).map(|i| i + 1),
        }
    }
}

impl<T: Clone> DataSource<T> for ListDataSource<T> {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn item_from_index(&self, index: usize) -> Option<Item<T>> {
        self.items.get(index).cloned()
    }

    fn apply(&mut self, edit: Edit<T>) -> Completion<ItemKey> {
        Completion::resolved(self.edit(edit))
    }

    fn subscribe(&mut self) -> Receiver<Notification<T>> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }
}
