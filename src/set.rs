use crate::error::TableError;
use crate::hash::{KeyHasher, Murmur3Mix};
use crate::table::{Probe, RawIter, RawTable, DEFAULT_CAPACITY};
use std::fmt::{self, Debug};

/// Membership set of pointer-sized values.
///
/// Zero doubles as the empty marker inside the slot array, so it lives in a
/// separate `null_slot` and never goes through the hasher.
pub struct MemberSet<H = Murmur3Mix> {
    raw: RawTable<usize, H>,
    null_slot: bool,
}

impl MemberSet<Murmur3Mix> {
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, Murmur3Mix)
    }

    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_capacity_and_hasher(initial_capacity, Murmur3Mix)
    }
}

impl<H: KeyHasher<usize>> MemberSet<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(initial_capacity: usize, hasher: H) -> Self {
        MemberSet {
            raw: RawTable::with_capacity_and_hasher(initial_capacity, hasher),
            null_slot: false,
        }
    }

    /// Number of members, zero included.
    pub fn len(&self) -> usize {
        self.raw.len() + self.null_slot as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in the probed array; the zero slot is not counted.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.raw.load_factor()
    }

    pub fn hasher(&self) -> &H {
        self.raw.hasher()
    }

    /// Returns `true` if `value` was not a member yet.
    pub fn add(&mut self, value: usize) -> bool {
        if value == 0 {
            return !std::mem::replace(&mut self.null_slot, true);
        }
        self.raw.reserve_one();
        match self.raw.probe(&value) {
            Probe::Found(_) => false,
            Probe::Vacant(i) => {
                self.raw.occupy(i, value);
                true
            }
        }
    }

    pub fn has(&self, value: usize) -> bool {
        if value == 0 {
            return self.null_slot;
        }
        self.raw.find(&value).is_some()
    }

    /// Returns `true` if `value` was a member.
    pub fn remove(&mut self, value: usize) -> bool {
        if value == 0 {
            return std::mem::replace(&mut self.null_slot, false);
        }
        match self.raw.find(&value) {
            Some(i) => self.raw.remove_at(i).is_some(),
            None => false,
        }
    }

    pub fn add_ptr<T>(&mut self, ptr: *const T) -> bool {
        self.add(ptr as usize)
    }

    pub fn has_ptr<T>(&self, ptr: *const T) -> bool {
        self.has(ptr as usize)
    }

    pub fn remove_ptr<T>(&mut self, ptr: *const T) -> bool {
        self.remove(ptr as usize)
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.null_slot = false;
    }

    pub fn destroy(&mut self) {
        self.raw.destroy();
        self.null_slot = false;
    }

    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.raw.try_reserve(additional)
    }

    /// Members in slot order, then zero if present.
    pub fn iter(&self) -> Iter<'_, H> {
        Iter {
            inner: self.raw.iter(),
            null_slot: self.null_slot,
        }
    }
}

impl Default for MemberSet<Murmur3Mix> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> Clone for MemberSet<H> {
    fn clone(&self) -> Self {
        MemberSet {
            raw: self.raw.clone(),
            null_slot: self.null_slot,
        }
    }
}

impl<H: KeyHasher<usize>> Debug for MemberSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<H: KeyHasher<usize>> Extend<usize> for MemberSet<H> {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<usize> for MemberSet<Murmur3Mix> {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set: Self = MemberSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, H: KeyHasher<usize>> IntoIterator for &'a MemberSet<H> {
    type Item = usize;
    type IntoIter = Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over the members of a [`MemberSet`].
pub struct Iter<'a, H> {
    inner: RawIter<'a, usize, H>,
    null_slot: bool,
}

impl<H> Iterator for Iter<'_, H> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self.inner.next() {
            Some(value) => Some(value),
            None if self.null_slot => {
                self.null_slot = false;
                Some(0)
            }
            None => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len: usize = self.inner.len() + self.null_slot as usize;
        (len, Some(len))
    }
}

impl<H> ExactSizeIterator for Iter<'_, H> {}
