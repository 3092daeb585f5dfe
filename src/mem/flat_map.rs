//! Open-addressing hash map for integer keys.
//!
//! ## Mechanism
//!
//! Backing storage is a power-of-two array of buckets, each `Empty`,
//! `Occupied` or `Tombstone`. Hashing is Fibonacci multiplicative
//! (`key * 11400714819323198485`, reduced by mask); collisions resolve by
//! linear probing. Deletion writes a tombstone so probe chains stay intact;
//! insertion remembers the first tombstone on its probe path and reuses it
//! when the key is absent. When occupied + tombstone buckets reach 70% of
//! capacity the table doubles and rehashes, discarding all tombstones.
//!
//! The two hottest maps in the engine (id to order, price to level) are
//! keyed on `u64`/`u32`, which is all this table supports: keys must
//! implement [`IntKey`].

use std::mem;

/// Keys convertible to 64 bits without loss.
pub trait IntKey: Copy + Eq {
    fn as_u64(self) -> u64;
}

impl IntKey for u64 {
    #[inline]
    fn as_u64(self) -> u64 {
        self
    }
}

impl IntKey for u32 {
    #[inline]
    fn as_u64(self) -> u64 {
        u64::from(self)
    }
}

const FIB_MULTIPLIER: u64 = 11_400_714_819_323_198_485;
const MIN_CAPACITY: usize = 16;

enum Bucket<K, V> {
    Empty,
    Occupied { key: K, value: V },
    Tombstone,
}

/// Open-addressing hash map with linear probing and Fibonacci hashing.
pub struct FlatHashMap<K, V> {
    buckets: Box<[Bucket<K, V>]>,
    /// Occupied buckets.
    len: usize,
    /// Occupied + tombstone buckets; drives the load check.
    used: usize,
}

impl<K: IntKey, V> FlatHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Creates a map with a power-of-two capacity of at least `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut cap = MIN_CAPACITY;
        while cap < capacity {
            cap <<= 1;
        }
        Self {
            buckets: Self::empty_buckets(cap),
            len: 0,
            used: 0,
        }
    }

    fn empty_buckets(capacity: usize) -> Box<[Bucket<K, V>]> {
        (0..capacity).map(|_| Bucket::Empty).collect::<Vec<_>>().into_boxed_slice()
    }

    #[inline]
    fn bucket_index(key: K, mask: usize) -> usize {
        (key.as_u64().wrapping_mul(FIB_MULTIPLIER) as usize) & mask
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Probes for `key`; returns its bucket index, or `None` after hitting
    /// an empty bucket (the key is absent).
    fn find_index(&self, key: K) -> Option<usize> {
        let mask = self.buckets.len() - 1;
        let mut index = Self::bucket_index(key, mask);
        loop {
            match &self.buckets[index] {
                Bucket::Empty => return None,
                Bucket::Occupied { key: existing, .. } if *existing == key => return Some(index),
                _ => index = (index + 1) & mask,
            }
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let index = self.find_index(key)?;
        match &self.buckets[index] {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let index = self.find_index(key)?;
        match &mut self.buckets[index] {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.find_index(key).is_some()
    }

    /// Inserts `key -> value`, returning the previous value if the key was
    /// present. Reuses the first tombstone seen on the probe path.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if (self.used + 1) * 10 > self.buckets.len() * 7 {
            self.rehash(self.buckets.len() * 2);
        }

        let mask = self.buckets.len() - 1;
        let mut index = Self::bucket_index(key, mask);
        let mut first_tombstone: Option<usize> = None;
        loop {
            match &self.buckets[index] {
                Bucket::Empty => break,
                Bucket::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                }
                Bucket::Occupied { key: existing, .. } if *existing == key => {
                    if let Bucket::Occupied { value: existing_value, .. } = &mut self.buckets[index] {
                        return Some(mem::replace(existing_value, value));
                    }
                }
                Bucket::Occupied { .. } => {}
            }
            index = (index + 1) & mask;
        }

        let target = match first_tombstone {
            Some(tombstone) => tombstone,
            None => {
                self.used += 1;
                index
            }
        };
        self.buckets[target] = Bucket::Occupied { key, value };
        self.len += 1;
        None
    }

    /// Removes `key`, returning its value. Leaves a tombstone so probe
    /// chains through this bucket keep working.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = self.find_index(key)?;
        match mem::replace(&mut self.buckets[index], Bucket::Tombstone) {
            Bucket::Occupied { value, .. } => {
                self.len -= 1;
                Some(value)
            }
            _ => None,
        }
    }

    /// Sizes the table so that holding `entries` keys stays under the load
    /// limit, i.e. inserting that many keys will not trigger a rehash.
    pub fn reserve(&mut self, entries: usize) {
        let required = entries * 10 / 7 + 1;
        if required <= self.buckets.len() {
            return;
        }
        let mut new_capacity = self.buckets.len();
        while new_capacity < required {
            new_capacity <<= 1;
        }
        self.rehash(new_capacity);
    }

    /// Moves every live entry into a fresh table of `new_capacity` buckets,
    /// dropping all tombstones.
    fn rehash(&mut self, new_capacity: usize) {
        let old = mem::replace(&mut self.buckets, Self::empty_buckets(new_capacity));
        self.used = self.len;
        let mask = new_capacity - 1;
        for bucket in old.into_vec() {
            if let Bucket::Occupied { key, value } = bucket {
                let mut index = Self::bucket_index(key, mask);
                while matches!(self.buckets[index], Bucket::Occupied { .. }) {
                    index = (index + 1) & mask;
                }
                self.buckets[index] = Bucket::Occupied { key, value };
            }
        }
    }

    /// Visits each occupied entry exactly once, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.buckets.iter().filter_map(|bucket| match bucket {
            Bucket::Occupied { key, value } => Some((*key, value)),
            _ => None,
        })
    }
}

impl<K: IntKey, V> Default for FlatHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
