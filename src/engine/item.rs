use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use super::{BatchError, FetchError};

/// Opaque identity of an item, unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One downloadable unit of a batch.
///
/// The `payload` carries whatever the concrete [`Fetcher`](super::Fetcher)
/// needs to perform the transfer (for tracks: the catalog metadata used for
/// tagging). Everything except the expected size is fixed once the item has
/// been added to a [`Batch`].
#[derive(Debug, Clone)]
pub struct FetchableItem<T> {
    key: ItemKey,
    name: String,
    destination: PathBuf,
    position: usize,
    expected_size: Option<u64>,
    payload: T,
}

impl<T> FetchableItem<T> {
    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// 1-based position inside the batch, stable across retry passes.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub(crate) fn fill_expected_size(&mut self, size: Option<u64>) {
        if self.expected_size.is_none() {
            self.expected_size = size;
        }
    }
}

/// Result of a single attempt for a single item.
#[derive(Debug)]
pub enum Outcome {
    Success,
    Failure(FetchError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// The full, ordered set of items submitted for one download operation.
///
/// Positions are handed out in insertion order starting at 1 and identities
/// are checked for uniqueness on insert.
#[derive(Debug)]
pub struct Batch<T> {
    items: Vec<FetchableItem<T>>,
    keys: HashSet<ItemKey>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<T> Batch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.keys.contains(key)
    }

    /// Position the next pushed item will receive.
    pub fn next_position(&self) -> usize {
        self.items.len() + 1
    }

    pub fn push(
        &mut self,
        key: impl Into<ItemKey>,
        name: impl Into<String>,
        destination: impl Into<PathBuf>,
        payload: T,
    ) -> Result<&FetchableItem<T>, BatchError> {
        let key = key.into();
        if !self.keys.insert(key.clone()) {
            return Err(BatchError::DuplicateKey(key));
        }

        let position = self.next_position();
        self.items.push(FetchableItem {
            key,
            name: name.into(),
            destination: destination.into(),
            position,
            expected_size: None,
            payload,
        });

        Ok(&self.items[position - 1])
    }

    /// Same as [`Batch::push`] for callers that already know the size.
    pub fn push_sized(
        &mut self,
        key: impl Into<ItemKey>,
        name: impl Into<String>,
        destination: impl Into<PathBuf>,
        size: u64,
        payload: T,
    ) -> Result<&FetchableItem<T>, BatchError> {
        self.push(key, name, destination, payload)?;
        let last = self.items.len() - 1;
        self.items[last].expected_size = Some(size);
        Ok(&self.items[last])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FetchableItem<T>> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<FetchableItem<T>> {
        self.items
    }
}
