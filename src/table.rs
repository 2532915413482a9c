//! The consistent-hash routing table.
//!
//! [`DoubleJump`] keeps every live member in two holders at once. The
//! *loose* holder is an index-stable arena: removals punch holes instead of
//! shifting survivors, so keys that did not map to the removed member keep
//! their answer. The *compact* holder is a dense array maintained by
//! swap-removal; keys that land in a loose hole fall back to it, so a lookup
//! on a non-empty table always returns a live member.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use hashbrown::HashMap;
use rand::Rng;

use crate::DefaultHashBuilder;
use crate::jump::jump_bucket;

/// Odd multiplier (MurmurHash2's 64-bit mixing constant) applied to keys
/// before the compact-holder lookup. Decorrelates the fallback distribution
/// from the loose holder's, so keys landing in different holes don't pile
/// onto the same compact bucket.
const COMPACT_MIXER: u64 = 0xc6a4a7935bd1e995;

/// Index-stable member storage: an arena of optional slots plus a LIFO free
/// list. `slots.len() == index.len() + free.len()` always holds.
#[derive(Clone)]
struct LooseHolder<T, S> {
    slots: Vec<Option<T>>,
    index: HashMap<T, usize, S>,
    free: Vec<usize>,
}

impl<T, S> LooseHolder<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn with_hasher(hash_builder: S) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::with_hasher(hash_builder),
            free: Vec::new(),
        }
    }

    fn add(&mut self, member: T) {
        if self.index.contains_key(&member) {
            return;
        }
        match self.free.pop() {
            // Reuse the most recently freed slot; every surviving member
            // keeps its position, which is what keeps the mapping consistent
            // across adds.
            Some(slot) => {
                self.slots[slot] = Some(member.clone());
                self.index.insert(member, slot);
            }
            None => {
                self.slots.push(Some(member.clone()));
                self.index.insert(member, self.slots.len() - 1);
            }
        }
    }

    /// Leaves a hole rather than shifting: compacting here would renumber
    /// every later slot and remap the keys of unrelated members.
    fn remove(&mut self, member: &T) {
        if let Some(slot) = self.index.remove(member) {
            self.slots[slot] = None;
            self.free.push(slot);
        }
    }

    /// `None` means either an empty holder or a key that landed in a hole;
    /// the caller falls back to the compact holder for the latter.
    fn get(&self, key: u64) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        self.slots[jump_bucket(key, self.slots.len())].as_ref()
    }

    /// Compacts out all holes, preserving the relative order of survivors,
    /// and reindexes them. O(slots); renumbers members, so callers opt in.
    fn shrink(&mut self) {
        if self.free.is_empty() {
            return;
        }
        self.slots.retain(Option::is_some);
        for (slot, member) in self.slots.iter().flatten().enumerate() {
            self.index.insert(member.clone(), slot);
        }
        self.free.clear();
    }
}

/// Densely packed member storage. Removal swap-deletes, so positions here
/// move on unrelated removals; only used where that is acceptable (fallback
/// lookups, enumeration, random selection).
#[derive(Clone)]
struct CompactHolder<T, S> {
    dense: Vec<T>,
    index: HashMap<T, usize, S>,
}

impl<T, S> CompactHolder<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn with_hasher(hash_builder: S) -> Self {
        Self {
            dense: Vec::new(),
            index: HashMap::with_hasher(hash_builder),
        }
    }

    fn add(&mut self, member: T) {
        if self.index.contains_key(&member) {
            return;
        }
        self.dense.push(member.clone());
        self.index.insert(member, self.dense.len() - 1);
    }

    fn remove(&mut self, member: &T) {
        if let Some(slot) = self.index.remove(member) {
            self.dense.swap_remove(slot);
            if let Some(moved) = self.dense.get(slot) {
                self.index.insert(moved.clone(), slot);
            }
        }
    }

    fn get(&self, key: u64) -> Option<&T> {
        if self.dense.is_empty() {
            return None;
        }
        let slot = jump_bucket(key.wrapping_mul(COMPACT_MIXER), self.dense.len());
        Some(&self.dense[slot])
    }
}

/// A consistent-hash routing table over jump consistent hashing.
///
/// `DoubleJump<T, S>` maps arbitrary `u64` keys to exactly one live member
/// of type `T`, where `T` implements `Hash + Eq + Clone`. Adding or removing
/// one of `n` members remaps only ~`1/n` of keys; every other key keeps its
/// answer. The hasher builder `S` is used only for the internal member
/// index maps, never for routing keys.
///
/// This type is single-owner and does no locking; see
/// [`SyncDoubleJump`](crate::sync::SyncDoubleJump) for the lock-guarded
/// variant (requires the `std` feature).
///
/// # Performance Characteristics
///
/// - **`add` / `remove` / `get`**: O(1) (amortized for `add`).
/// - **`shrink` / `all`**: O(n).
/// - **Memory**: each member is stored twice plus two index-map entries.
///   Removed members leave an empty slot behind until [`shrink`] runs.
///
/// [`shrink`]: DoubleJump::shrink
#[derive(Clone)]
pub struct DoubleJump<T, S = DefaultHashBuilder> {
    loose: LooseHolder<T, S>,
    compact: CompactHolder<T, S>,
}

impl<T, S> Debug for DoubleJump<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.compact.dense.iter()).finish()
    }
}

impl<T, S> DoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates a new table with the given hasher builder.
    ///
    /// The builder is cloned; both internal index maps hash members the same
    /// way.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use double_jump::DoubleJump;
    ///
    /// let table: DoubleJump<&str, _> = DoubleJump::with_hasher(RandomState::new());
    /// assert!(table.is_empty());
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self
    where
        S: Clone,
    {
        Self {
            loose: LooseHolder::with_hasher(hash_builder.clone()),
            compact: CompactHolder::with_hasher(hash_builder),
        }
    }

    /// Adds a member to the table.
    ///
    /// Adding a member that is already present is a no-op; `add` never
    /// fails. At most ~`1/(n+1)` of keys move to the new member, and every
    /// key that moves maps to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<&str> = DoubleJump::new();
    /// table.add("node-a");
    /// table.add("node-a");
    /// assert_eq!(table.len(), 1);
    /// # }
    /// ```
    pub fn add(&mut self, member: T) {
        self.loose.add(member.clone());
        self.compact.add(member);
    }

    /// Removes a member from the table.
    ///
    /// Removing an absent member is a no-op, not an error. The member's
    /// loose slot is kept as a hole (see [`loose_len`]) until [`shrink`]
    /// runs, so no other member's keys are disturbed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<&str> = DoubleJump::new();
    /// table.add("node-a");
    /// table.remove(&"node-a");
    /// table.remove(&"never-added");
    /// assert!(table.is_empty());
    /// # }
    /// ```
    ///
    /// [`loose_len`]: DoubleJump::loose_len
    /// [`shrink`]: DoubleJump::shrink
    pub fn remove(&mut self, member: &T) {
        self.loose.remove(member);
        self.compact.remove(member);
    }

    /// Maps a key to a live member.
    ///
    /// Returns `None` iff the table is empty. The fast path indexes the
    /// loose holder directly; keys that land in a hole left by a removal
    /// fall back to the compact holder with a remixed key, which always
    /// answers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<&str> = DoubleJump::new();
    /// assert_eq!(table.get(42), None);
    ///
    /// table.add("node-a");
    /// table.add("node-b");
    /// assert!(table.get(42).is_some());
    /// # }
    /// ```
    pub fn get(&self, key: u64) -> Option<&T> {
        match self.loose.get(key) {
            Some(member) => Some(member),
            None => self.compact.get(key),
        }
    }

    /// Returns `true` if the member is in the table.
    pub fn contains(&self, member: &T) -> bool {
        self.compact.index.contains_key(member)
    }

    /// Returns the number of live members.
    pub fn len(&self) -> usize {
        self.compact.dense.len()
    }

    /// Returns `true` if the table has no members.
    pub fn is_empty(&self) -> bool {
        self.compact.dense.is_empty()
    }

    /// Returns the loose holder's slot count, holes included.
    ///
    /// This is the bucket count the primary hash runs over. It never
    /// decreases except across [`shrink`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<i32> = DoubleJump::new();
    /// table.add(1);
    /// table.add(2);
    /// table.remove(&1);
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.loose_len(), 2);
    /// # }
    /// ```
    ///
    /// [`shrink`]: DoubleJump::shrink
    pub fn loose_len(&self) -> usize {
        self.loose.slots.len()
    }

    /// Reclaims all holes in the loose holder.
    ///
    /// No-op when there are no holes. This renumbers surviving members'
    /// slots, so keys remap as if the table had been rebuilt from scratch:
    /// a one-time burst the caller accepts in exchange for reclaimed memory.
    /// The member set, [`len`], and the compact holder are untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<i32> = DoubleJump::new();
    /// for i in 0..10 {
    ///     table.add(i);
    /// }
    /// for i in 0..5 {
    ///     table.remove(&i);
    /// }
    /// assert_eq!(table.loose_len(), 10);
    ///
    /// table.shrink();
    /// assert_eq!(table.loose_len(), 5);
    /// assert_eq!(table.len(), 5);
    /// # }
    /// ```
    ///
    /// [`len`]: DoubleJump::len
    pub fn shrink(&mut self) {
        self.loose.shrink();
    }

    /// Returns a snapshot of all live members.
    ///
    /// The order is unspecified and not stable across removals.
    pub fn all(&self) -> Vec<T> {
        self.compact.dense.clone()
    }

    /// Returns an iterator over the live members, in unspecified order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<i32> = DoubleJump::new();
    /// table.add(1);
    /// table.add(2);
    /// assert_eq!(table.iter().sum::<i32>(), 3);
    /// # }
    /// ```
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.compact.dense.iter()
    }

    /// Returns a uniformly random live member, drawn from `rng`.
    ///
    /// Returns `None` iff the table is empty.
    pub fn random_with<R>(&self, rng: &mut R) -> Option<&T>
    where
        R: Rng + ?Sized,
    {
        if self.compact.dense.is_empty() {
            return None;
        }
        self.compact.dense.get(rng.random_range(0..self.compact.dense.len()))
    }

    /// Returns a uniformly random live member, drawn from the thread-local
    /// RNG.
    ///
    /// Returns `None` iff the table is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use double_jump::DoubleJump;
    ///
    /// let mut table: DoubleJump<&str> = DoubleJump::new();
    /// assert_eq!(table.random(), None);
    ///
    /// table.add("node-a");
    /// assert_eq!(table.random(), Some(&"node-a"));
    /// ```
    #[cfg(feature = "std")]
    pub fn random(&self) -> Option<&T> {
        self.random_with(&mut rand::rng())
    }
}

impl<T, S> DoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Creates a new, empty table using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use double_jump::DoubleJump;
    ///
    /// let table: DoubleJump<&str> = DoubleJump::new();
    /// assert!(table.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self {
            loose: LooseHolder::with_hasher(S::default()),
            compact: CompactHolder::with_hasher(S::default()),
        }
    }
}

impl<T, S> Default for DoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Extend<T> for DoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for member in iter {
            self.add(member);
        }
    }
}

impl<T, S> FromIterator<T> for DoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
