//! Typed output channels filled by a collect pass.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;
use tessera_tiles::TileCoordinates;

/// Hierarchical name of a collected item, e.g. `planet/ground/_2.1.0.0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(Vec<String>);

impl ItemKey {
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Key of a tile's items: a single `_lod.x.y.z` segment.
    #[must_use]
    pub fn from_tile(coords: &TileCoordinates) -> Self {
        Self(vec![format!("_{}", coords.id())])
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Items of one type, ordered by key.
#[derive(Debug)]
pub struct Channel<T> {
    items: BTreeMap<ItemKey, T>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Store `item`, replacing any previous item at `key`.
    pub fn put(&mut self, key: ItemKey, item: T) -> Option<T> {
        self.items.insert(key, item)
    }

    #[must_use]
    pub fn get(&self, key: &ItemKey) -> Option<&T> {
        self.items.get(key)
    }

    #[must_use]
    pub fn has(&self, key: &ItemKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn remove(&mut self, key: &ItemKey) -> Option<T> {
        self.items.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &T)> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Receives what a collect pass produces.
///
/// The caller opens one channel per item type it wants; a producer only fills
/// the channels that are open.
#[derive(Default)]
pub struct Collector {
    channels: HashMap<TypeId, Box<dyn Any>>,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the channel for `T`. Opening an open channel keeps its items.
    pub fn add_channel<T: 'static>(&mut self) -> &mut Self {
        self.channels
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Channel::<T>::new()));
        self
    }

    #[must_use]
    pub fn has_channel<T: 'static>(&self) -> bool {
        self.channels.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn channel<T: 'static>(&self) -> Option<&Channel<T>> {
        self.channels
            .get(&TypeId::of::<T>())
            .and_then(|channel| channel.downcast_ref())
    }

    pub fn channel_mut<T: 'static>(&mut self) -> Option<&mut Channel<T>> {
        self.channels
            .get_mut(&TypeId::of::<T>())
            .and_then(|channel| channel.downcast_mut())
    }
}
