use crate::error::TableError;
use crate::hash::KeyHasher;
use std::alloc::{self, Layout};

/// Fixed probing step. Any odd step is coprime with a power-of-two capacity,
/// so the probe sequence visits every slot before it repeats.
pub const STRIDE: usize = 342049;

/// Initial capacity used when none is requested.
pub const DEFAULT_CAPACITY: usize = 8;

pub const MIN_CAPACITY: usize = 2;
pub const MAX_INITIAL_CAPACITY: usize = 1 << (std::mem::size_of::<usize>() * 8 - 2);

/// Multiplicative inverse of `STRIDE` modulo 2^w. Each Newton step doubles the
/// number of correct low bits, and an odd number is its own inverse mod 8.
const STRIDE_INVERSE: usize = {
    let mut inverse: usize = STRIDE;
    let mut step: usize = 0;
    while step < 5 {
        inverse = inverse.wrapping_mul(2usize.wrapping_sub(STRIDE.wrapping_mul(inverse)));
        step += 1;
    }
    inverse
};

const _: () = assert!(STRIDE % 2 == 1);
const _: () = assert!(STRIDE.wrapping_mul(STRIDE_INVERSE) == 1);

/// Largest `count` allowed for `capacity` slots: `floor(capacity * 0.8)`.
#[inline]
pub fn max_load(capacity: usize) -> usize {
    capacity - (capacity + 4) / 5
}

/// What a table stores in an occupied slot.
pub(crate) trait Entry: Copy {
    type Key: ?Sized;
    fn key(&self) -> &Self::Key;
}

impl Entry for usize {
    type Key = usize;

    #[inline]
    fn key(&self) -> &usize {
        self
    }
}

/// Where probing for a key stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    Found(usize),
    Vacant(usize),
}

/// Open-addressing slot array shared by [`KeyedTable`](crate::KeyedTable) and
/// [`MemberSet`](crate::MemberSet).
///
/// Slots are probed from `hash & mask` in steps of [`STRIDE`]. Removal shifts
/// later cluster members back into the hole instead of leaving tombstones, so
/// a probe that reaches an empty slot has seen every candidate.
#[derive(Debug, Clone)]
pub(crate) struct RawTable<T, H> {
    count: usize,
    mask: usize,
    initial_capacity: usize,
    slots: Vec<Option<T>>,
    hasher: H,
}

impl<T, H> RawTable<T, H>
where
    T: Entry,
    H: KeyHasher<T::Key>,
{
    /// No slots are allocated until the first insert.
    pub fn with_capacity_and_hasher(initial_capacity: usize, hasher: H) -> Self {
        let initial_capacity: usize = initial_capacity
            .clamp(MIN_CAPACITY, MAX_INITIAL_CAPACITY)
            .next_power_of_two();
        RawTable {
            count: 0,
            mask: 0,
            initial_capacity,
            slots: Vec::new(),
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        if self.capacity() == 0 {
            0.0
        } else {
            self.count as f64 / self.capacity() as f64
        }
    }

    #[inline]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    #[inline]
    fn ideal(&self, key: &T::Key) -> usize {
        self.hasher.hash(key) & self.mask
    }

    #[inline]
    fn next(&self, index: usize) -> usize {
        index.wrapping_add(STRIDE) & self.mask
    }

    /// Number of strides from `from` to `to`.
    #[inline]
    fn distance(&self, from: usize, to: usize) -> usize {
        to.wrapping_sub(from).wrapping_mul(STRIDE_INVERSE) & self.mask
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Probes until `key` or an empty slot is found. The table must have been
    /// allocated.
    pub fn probe(&self, key: &T::Key) -> Probe {
        debug_assert!(self.count < self.capacity());
        let mut i: usize = self.ideal(key);
        loop {
            match &self.slots[i] {
                None => return Probe::Vacant(i),
                Some(entry) if self.hasher.equal(entry.key(), key) => return Probe::Found(i),
                Some(_) => i = self.next(i),
            }
        }
    }

    pub fn find(&self, key: &T::Key) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        match self.probe(key) {
            Probe::Found(i) => Some(i),
            Probe::Vacant(_) => None,
        }
    }

    /// Grows the slot array until one more entry fits under the load limit.
    /// Must run before probing, since growing moves every entry.
    pub fn reserve_one(&mut self) {
        while self.count >= max_load(self.capacity()) {
            if let Err(err) = self.next_capacity().and_then(|capacity| self.resize(capacity)) {
                Self::fail(err);
            }
        }
    }

    /// Stores `entry` in the vacant slot returned by [`probe`](Self::probe).
    pub fn occupy(&mut self, index: usize, entry: T) {
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(entry);
        self.count += 1;
    }

    /// Places an entry known to be absent without comparing keys.
    fn insert_unchecked(&mut self, entry: T) {
        let mut i: usize = self.ideal(entry.key());
        while self.slots[i].is_some() {
            i = self.next(i);
        }
        self.slots[i] = Some(entry);
        self.count += 1;
    }

    /// Empties slot `index` and shifts the rest of its cluster back.
    ///
    /// Walking forward from the hole until the next empty slot, an entry is
    /// moved into the hole whenever the hole lies on its own probe path, and
    /// the hole follows it. Every entry stays reachable from its ideal slot.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let removed: T = self.slots.get_mut(index)?.take()?;
        self.count -= 1;

        let mut hole: usize = index;
        let mut i: usize = self.next(index);
        while let Some(entry) = self.slots[i] {
            let ideal: usize = self.ideal(entry.key());
            if self.distance(ideal, hole) < self.distance(ideal, i) {
                self.slots[hole] = self.slots[i].take();
                hole = i;
            }
            i = self.next(i);
        }
        Some(removed)
    }

    /// Empties every slot and keeps the allocation.
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.count = 0;
        tracing::trace!(capacity = self.capacity(), "cleared slot array");
    }

    /// Releases the slot array. The table can be reused afterwards.
    pub fn destroy(&mut self) {
        let capacity: usize = self.capacity();
        self.slots = Vec::new();
        self.count = 0;
        self.mask = 0;
        tracing::trace!(capacity, "released slot array");
    }

    /// Grows so that `additional` more entries fit without resizing.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let required: usize = self
            .count
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow)?;
        if required <= max_load(self.capacity()) {
            return Ok(());
        }
        let mut capacity: usize = self.capacity().max(self.initial_capacity);
        while max_load(capacity) < required {
            capacity = capacity
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
        }
        self.resize(capacity)
    }

    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            Self::fail(err);
        }
    }

    pub fn iter(&self) -> RawIter<'_, T, H> {
        RawIter {
            table: self,
            index: 0,
            remaining: self.count,
        }
    }

    fn next_capacity(&self) -> Result<usize, TableError> {
        if self.capacity() == 0 {
            return Ok(self.initial_capacity);
        }
        self.capacity()
            .checked_mul(2)
            .map(|capacity| capacity.max(self.initial_capacity))
            .ok_or(TableError::CapacityOverflow)
    }

    /// Moves every entry into a fresh array of `new_capacity` slots.
    fn resize(&mut self, new_capacity: usize) -> Result<(), TableError> {
        debug_assert!(new_capacity.is_power_of_two());
        if Layout::array::<Option<T>>(new_capacity).is_err() {
            return Err(TableError::CapacityOverflow);
        }
        let mut slots: Vec<Option<T>> = Vec::new();
        slots
            .try_reserve_exact(new_capacity)
            .map_err(|_| TableError::AllocationFailure {
                capacity: new_capacity,
            })?;
        slots.resize(new_capacity, None);

        let old_capacity: usize = self.capacity();
        let old: Vec<Option<T>> = std::mem::replace(&mut self.slots, slots);
        self.mask = new_capacity - 1;
        self.count = 0;
        for entry in old.into_iter().flatten() {
            self.insert_unchecked(entry);
        }
        tracing::debug!(
            old_capacity,
            new_capacity,
            count = self.count,
            "resized slot array"
        );
        Ok(())
    }

    /// Growth that callers cannot observe failing is fatal.
    fn fail(err: TableError) -> ! {
        match err {
            TableError::AllocationFailure { capacity } => {
                match Layout::array::<Option<T>>(capacity) {
                    Ok(layout) => alloc::handle_alloc_error(layout),
                    Err(_) => panic!("capacity overflow"),
                }
            }
            TableError::CapacityOverflow => panic!("capacity overflow"),
        }
    }
}

/// Forward scan over the occupied slots of a [`RawTable`].
#[derive(Debug, Clone)]
pub(crate) struct RawIter<'a, T, H> {
    table: &'a RawTable<T, H>,
    index: usize,
    remaining: usize,
}

impl<T: Copy, H> Iterator for RawIter<'_, T, H> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.index < self.table.slots.len() {
            let slot: Option<T> = self.table.slots[self.index];
            self.index += 1;
            if slot.is_some() {
                self.remaining -= 1;
                return slot;
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy, H> ExactSizeIterator for RawIter<'_, T, H> {}

#[cfg(test)]
impl<T, H> RawTable<T, H>
where
    T: Entry,
    H: KeyHasher<T::Key>,
{
    /// Panics unless the load limit holds, keys are unique, and every entry is
    /// reachable from its ideal slot without crossing an empty one.
    pub(crate) fn assert_invariants(&self) {
        let capacity: usize = self.capacity();
        assert!(capacity == 0 || capacity.is_power_of_two());
        assert!(self.count <= max_load(capacity));
        let occupied: usize = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.count);
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                let mut i: usize = self.ideal(entry.key());
                while i != index {
                    match &self.slots[i] {
                        None => panic!("empty slot {i} inside the probe path of slot {index}"),
                        Some(other) => assert!(
                            !self.hasher.equal(other.key(), entry.key()),
                            "duplicate key in slots {i} and {index}"
                        ),
                    }
                    i = self.next(i);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FnHasher;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn identity(key: &usize) -> usize {
        *key
    }

    fn same(a: &usize, b: &usize) -> bool {
        a == b
    }

    fn table(capacity: usize) -> RawTable<usize, FnHasher<usize>> {
        RawTable::with_capacity_and_hasher(capacity, FnHasher::new(identity, same))
    }

    fn insert(table: &mut RawTable<usize, FnHasher<usize>>, key: usize) -> bool {
        table.reserve_one();
        match table.probe(&key) {
            Probe::Found(_) => false,
            Probe::Vacant(i) => {
                table.occupy(i, key);
                true
            }
        }
    }

    fn remove(table: &mut RawTable<usize, FnHasher<usize>>, key: usize) -> Option<usize> {
        let i: usize = table.find(&key)?;
        table.remove_at(i)
    }

    #[test]
    fn stride_inverse_undoes_stride() {
        assert_eq!(STRIDE.wrapping_mul(STRIDE_INVERSE), 1);
        let mut t = table(64);
        t.reserve(1);
        assert_eq!(t.capacity(), 64);
        assert_eq!(t.distance(5, t.next(5)), 1);
        assert_eq!(t.distance(5, t.next(t.next(t.next(5)))), 3);
        assert_eq!(t.distance(5, 5), 0);
    }

    #[test]
    fn probe_sequence_covers_every_slot() {
        for capacity in [2usize, 8, 64, 1024] {
            let mut t = table(capacity);
            t.reserve(1);
            let mut seen: HashSet<usize> = HashSet::new();
            let mut i: usize = 3 & t.mask;
            for _ in 0..capacity {
                assert!(seen.insert(i), "slot {i} visited twice at capacity {capacity}");
                i = t.next(i);
            }
            assert_eq!(seen.len(), capacity);
        }
    }

    #[test]
    fn max_load_is_floor_of_four_fifths() {
        assert_eq!(max_load(0), 0);
        assert_eq!(max_load(2), 1);
        assert_eq!(max_load(8), 6);
        assert_eq!(max_load(10), 8);
        assert_eq!(max_load(16), 12);
        assert_eq!(max_load(1024), 819);
    }

    #[test]
    fn initial_capacity_is_rounded_and_lazy() {
        let t = table(5);
        assert_eq!(t.capacity(), 0);
        assert_eq!(t.initial_capacity, 8);
        let t = table(0);
        assert_eq!(t.initial_capacity, MIN_CAPACITY);
    }

    #[test]
    fn grows_before_crossing_the_load_limit() {
        let mut t = table(8);
        for key in 0..6 {
            assert!(insert(&mut t, key));
        }
        assert_eq!(t.capacity(), 8);
        assert!(insert(&mut t, 6));
        assert_eq!(t.capacity(), 16);
        for key in 0..7 {
            assert!(t.find(&key).is_some());
        }
        t.assert_invariants();
    }

    #[test]
    fn removal_shifts_colliding_entries_back() {
        let mut t = table(8);
        t.reserve(1);
        // all of these share ideal slot 1 at capacity 8
        for key in [1usize, 9, 17, 25] {
            assert!(insert(&mut t, key));
        }
        t.assert_invariants();
        assert_eq!(remove(&mut t, 9), Some(9));
        t.assert_invariants();
        for key in [1usize, 17, 25] {
            assert!(t.find(&key).is_some(), "lost {key}");
        }
        assert_eq!(remove(&mut t, 1), Some(1));
        assert_eq!(t.slot(1), Some(&17));
        assert_eq!(t.slot(2), Some(&25));
        t.assert_invariants();
        assert!(t.find(&17).is_some());
        assert!(t.find(&25).is_some());
    }

    #[test]
    fn removal_keeps_foreign_entries_in_a_cluster() {
        let mut t = table(16);
        t.reserve(1);
        let a: usize = 2;
        let b: usize = 2 + 16;
        // lands on a's probe path even though its ideal slot differs
        let c: usize = t.next(2);
        let d: usize = 2 + 32;
        for key in [a, b, c, d] {
            assert!(insert(&mut t, key));
        }
        t.assert_invariants();
        assert_eq!(remove(&mut t, a), Some(a));
        t.assert_invariants();
        for key in [b, c, d] {
            assert!(t.find(&key).is_some(), "lost {key}");
        }
    }

    #[test]
    fn removal_handles_wrap_around() {
        let mut t = table(8);
        t.reserve(1);
        let last: usize = 7;
        let keys: [usize; 4] = [last, last + 8, last + 16, 0];
        for key in keys {
            assert!(insert(&mut t, key));
        }
        t.assert_invariants();
        assert_eq!(remove(&mut t, last), Some(last));
        t.assert_invariants();
        for key in &keys[1..] {
            assert!(t.find(key).is_some(), "lost {key}");
        }
    }

    #[test]
    fn random_operations_keep_invariants() {
        let mut rng: StdRng = StdRng::seed_from_u64(0x5eed);
        let mut t = table(8);
        let mut model: HashSet<usize> = HashSet::new();
        for _ in 0..4000 {
            // few distinct low bits to force long clusters
            let key: usize = rng.gen_range(0..96) * 64 + rng.gen_range(0..3);
            if rng.gen_bool(0.6) {
                assert_eq!(insert(&mut t, key), model.insert(key));
            } else {
                assert_eq!(remove(&mut t, key).is_some(), model.remove(&key));
            }
            t.assert_invariants();
            assert_eq!(t.len(), model.len());
        }
        for key in &model {
            assert!(t.find(key).is_some());
        }
    }

    #[test]
    fn try_reserve_sizes_for_additional_entries() {
        let mut t = table(8);
        t.try_reserve(0).unwrap();
        assert_eq!(t.capacity(), 0);
        t.try_reserve(7).unwrap();
        assert_eq!(t.capacity(), 16);
        for key in 0..12 {
            insert(&mut t, key);
        }
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.try_reserve(usize::MAX), Err(TableError::CapacityOverflow));
        assert_eq!(t.capacity(), 16);
    }

    #[test]
    fn clear_and_destroy() {
        let mut t = table(8);
        for key in 0..20 {
            insert(&mut t, key);
        }
        let capacity: usize = t.capacity();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), capacity);
        assert!(t.find(&3).is_none());
        t.destroy();
        assert_eq!(t.capacity(), 0);
        assert!(t.find(&3).is_none());
        assert!(insert(&mut t, 3));
        assert_eq!(t.capacity(), 8);
    }

    #[test]
    fn iter_reports_exact_length() {
        let mut t = table(8);
        for key in 0..10 {
            insert(&mut t, key * 3);
        }
        let it = t.iter();
        assert_eq!(it.len(), 10);
        let mut keys: Vec<usize> = it.collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..10).map(|k| k * 3).collect::<Vec<usize>>());
    }
}
