const USIZE_BITS: usize = std::mem::size_of::<usize>() * 8;

/// 2^w divided by the golden ratio, for a w-bit `usize`.
///
/// The golden ratio can be calculated with Python 3 using the following statements:
///
/// ```text
/// from decimal import Decimal
/// golden_ratio = Decimal((Decimal(1.0) + Decimal.sqrt(Decimal(5.0)))/ Decimal(2.0))
/// golden_ratio
/// 1.618033988749894848204586834
/// ```
///
/// For 64-bit values use 2^64 / golden_ratio = 11400714819323198486
/// For 32-bit values use 2^32 / golden_ratio = 2654435769
const HASH_MULTIPLIER: usize = if USIZE_BITS == 64 {
    11400714819323198486u64 as usize
} else if USIZE_BITS == 32 {
    2654435769
} else {
    panic!("Only 32-bit and 64-bit platforms are supported.")
};

/// The hash and equality functions a table probes with.
///
/// Tables reduce `hash` with a power-of-two mask, so implementations should
/// spread entropy into the low bits. Two keys that are `equal` must hash the
/// same.
pub trait KeyHasher<K: ?Sized> {
    fn hash(&self, key: &K) -> usize;
    fn equal(&self, a: &K, b: &K) -> bool;
}

/// djb2 string hash (`hash * 33 + byte`), with plain string equality.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Djb2;

impl KeyHasher<str> for Djb2 {
    #[inline]
    fn hash(&self, key: &str) -> usize {
        let mut hash: usize = 5381;
        for byte in key.bytes() {
            hash = (hash << 5).wrapping_add(hash).wrapping_add(byte as usize);
        }
        hash
    }

    #[inline]
    fn equal(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

/// The murmur3 64-bit finalizer. Members compare by identity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Murmur3Mix;

impl KeyHasher<usize> for Murmur3Mix {
    #[inline]
    fn hash(&self, key: &usize) -> usize {
        let mut h: u64 = *key as u64;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51afd7ed558ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
        h ^= h >> 33;
        h as usize
    }

    #[inline]
    fn equal(&self, a: &usize, b: &usize) -> bool {
        a == b
    }
}

/// Multiplicative hashing by 2^w / golden ratio.
///
/// The low bits of the product only depend on the low bits of the key, so the
/// high half is shifted down before the table masks it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fibonacci;

impl KeyHasher<usize> for Fibonacci {
    #[inline]
    fn hash(&self, key: &usize) -> usize {
        key.wrapping_mul(HASH_MULTIPLIER) >> (USIZE_BITS / 2)
    }

    #[inline]
    fn equal(&self, a: &usize, b: &usize) -> bool {
        a == b
    }
}

/// A hash/equality pair of plain function pointers picked at construction.
pub struct FnHasher<K: ?Sized> {
    hash: fn(&K) -> usize,
    equal: fn(&K, &K) -> bool,
}

impl<K: ?Sized> FnHasher<K> {
    pub fn new(hash: fn(&K) -> usize, equal: fn(&K, &K) -> bool) -> Self {
        FnHasher { hash, equal }
    }
}

impl<K: ?Sized> Clone for FnHasher<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized> Copy for FnHasher<K> {}

impl<K: ?Sized> std::fmt::Debug for FnHasher<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHasher").finish_non_exhaustive()
    }
}

impl<K: ?Sized> KeyHasher<K> for FnHasher<K> {
    #[inline]
    fn hash(&self, key: &K) -> usize {
        (self.hash)(key)
    }

    #[inline]
    fn equal(&self, a: &K, b: &K) -> bool {
        (self.equal)(a, b)
    }
}
