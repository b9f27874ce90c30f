use crate::error::TableError;
use crate::hash::{Djb2, KeyHasher};
use crate::table::{Entry, Probe, RawIter, RawTable, DEFAULT_CAPACITY};
use std::fmt::{self, Debug};

#[derive(Debug, Clone, Copy)]
struct Bucket<'k, V> {
    key: &'k str,
    value: V,
}

impl<V: Copy> Entry for Bucket<'_, V> {
    type Key = str;

    #[inline]
    fn key(&self) -> &str {
        self.key
    }
}

/// Result of the insert variants of [`KeyedTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The key was absent and now holds the value.
    Added,
    /// The key was present and its value was replaced.
    Changed,
    /// The key was present and its value was left alone.
    Existed,
    /// The key was absent and nothing was stored.
    Absent,
}

impl Outcome {
    pub fn is_added(self) -> bool {
        self == Outcome::Added
    }

    pub fn is_changed(self) -> bool {
        self == Outcome::Changed
    }
}

/// Maps borrowed string keys to small `Copy` values.
///
/// Keys are never copied or freed; the caller keeps them alive for `'k`.
/// Capacity is always zero or a power of two and at most 80% of the slots are
/// occupied after any call returns.
pub struct KeyedTable<'k, V, H = Djb2> {
    raw: RawTable<Bucket<'k, V>, H>,
}

impl<'k, V: Copy> KeyedTable<'k, V, Djb2> {
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, Djb2)
    }

    /// `initial_capacity` is rounded up to a power of two and allocated on the
    /// first insert.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_capacity_and_hasher(initial_capacity, Djb2)
    }
}

impl<'k, V, H> KeyedTable<'k, V, H>
where
    V: Copy,
    H: KeyHasher<str>,
{
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(initial_capacity: usize, hasher: H) -> Self {
        KeyedTable {
            raw: RawTable::with_capacity_and_hasher(initial_capacity, hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.raw.load_factor()
    }

    pub fn hasher(&self) -> &H {
        self.raw.hasher()
    }

    /// Stores `value` under `key`, replacing any previous value.
    /// Returns [`Outcome::Added`] or [`Outcome::Changed`].
    pub fn set(&mut self, key: &'k str, value: V) -> Outcome {
        self.raw.reserve_one();
        match self.raw.probe(key) {
            Probe::Found(i) => {
                if let Some(bucket) = self.raw.slot_mut(i) {
                    bucket.value = value;
                }
                Outcome::Changed
            }
            Probe::Vacant(i) => {
                self.raw.occupy(i, Bucket { key, value });
                Outcome::Added
            }
        }
    }

    /// Stores `value` only if `key` is absent.
    /// Returns [`Outcome::Added`] or [`Outcome::Existed`].
    pub fn try_add(&mut self, key: &'k str, value: V) -> Outcome {
        self.raw.reserve_one();
        match self.raw.probe(key) {
            Probe::Found(_) => Outcome::Existed,
            Probe::Vacant(i) => {
                self.raw.occupy(i, Bucket { key, value });
                Outcome::Added
            }
        }
    }

    /// Replaces the value only if `key` is present.
    /// Returns [`Outcome::Changed`] or [`Outcome::Absent`].
    pub fn try_change(&mut self, key: &str, value: V) -> Outcome {
        self.raw.reserve_one();
        match self.raw.probe(key) {
            Probe::Found(i) => {
                if let Some(bucket) = self.raw.slot_mut(i) {
                    bucket.value = value;
                }
                Outcome::Changed
            }
            Probe::Vacant(_) => Outcome::Absent,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let i: usize = self.raw.find(key)?;
        self.raw.slot(i).map(|bucket| bucket.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let i: usize = self.raw.find(key)?;
        self.raw.slot_mut(i).map(|bucket| &mut bucket.value)
    }

    /// Returns the key as stored in the table together with its value.
    pub fn get_key_value(&self, key: &str) -> Option<(&'k str, V)> {
        let i: usize = self.raw.find(key)?;
        self.raw.slot(i).map(|bucket| (bucket.key, bucket.value))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.raw.find(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let i: usize = self.raw.find(key)?;
        self.raw.remove_at(i).map(|bucket| bucket.value)
    }

    /// Empties the table and keeps its capacity.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Releases the slot array. The table stays usable and reallocates on the
    /// next insert.
    pub fn destroy(&mut self) {
        self.raw.destroy();
    }

    /// Grows so that `additional` more keys fit without a resize.
    /// Aborts on allocation failure.
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.raw.try_reserve(additional)
    }

    /// Visits entries in slot order. The order changes whenever the table is
    /// resized or entries are removed.
    pub fn iter(&self) -> Iter<'_, 'k, V, H> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'k str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

impl<V: Copy> Default for KeyedTable<'_, V, Djb2> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy, H: Clone> Clone for KeyedTable<'_, V, H> {
    fn clone(&self) -> Self {
        KeyedTable {
            raw: self.raw.clone(),
        }
    }
}

impl<V, H> Debug for KeyedTable<'_, V, H>
where
    V: Copy + Debug,
    H: KeyHasher<str>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'k, V, H> Extend<(&'k str, V)> for KeyedTable<'k, V, H>
where
    V: Copy,
    H: KeyHasher<str>,
{
    fn extend<I: IntoIterator<Item = (&'k str, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'k, V: Copy> FromIterator<(&'k str, V)> for KeyedTable<'k, V, Djb2> {
    fn from_iter<I: IntoIterator<Item = (&'k str, V)>>(iter: I) -> Self {
        let mut table: Self = KeyedTable::new();
        table.extend(iter);
        table
    }
}

impl<'a, 'k, V, H> IntoIterator for &'a KeyedTable<'k, V, H>
where
    V: Copy,
    H: KeyHasher<str>,
{
    type Item = (&'k str, V);
    type IntoIter = Iter<'a, 'k, V, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over the entries of a [`KeyedTable`].
pub struct Iter<'a, 'k, V, H> {
    inner: RawIter<'a, Bucket<'k, V>, H>,
}

impl<'k, V: Copy, H> Iterator for Iter<'_, 'k, V, H> {
    type Item = (&'k str, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|bucket| (bucket.key, bucket.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V: Copy, H> ExactSizeIterator for Iter<'_, '_, V, H> {}
