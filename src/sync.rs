//! Lock-guarded routing table for concurrent callers.
//!
//! [`SyncDoubleJump`] wraps a [`DoubleJump`] in a reader/writer lock and
//! exposes the whole contract through `&self`, so it can sit in an `Arc`
//! shared across threads. Queries take the shared lock and run in parallel;
//! `add`/`remove`/`shrink` take the exclusive lock and serialize. Keeping
//! the lock in a separate type means single-owner users of [`DoubleJump`]
//! never pay for synchronization.

use std::fmt::Debug;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use rand::Rng;

use crate::DefaultHashBuilder;
use crate::table::DoubleJump;

/// A thread-safe consistent-hash routing table.
///
/// Same mapping behavior as [`DoubleJump`]; every operation acquires the
/// internal `RwLock` for its duration and nothing else blocks. Lock hold
/// times are O(1) except `shrink` and `all`, which are O(n).
///
/// Borrow-returning calls on [`DoubleJump`] return owned clones here
/// (`get`, `random`), since a borrow cannot outlive the lock guard.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use double_jump::SyncDoubleJump;
///
/// let table: Arc<SyncDoubleJump<u32>> = Arc::new(SyncDoubleJump::new());
/// thread::scope(|s| {
///     for t in 0..4 {
///         let table = Arc::clone(&table);
///         s.spawn(move || table.add(t));
///     }
/// });
/// assert_eq!(table.len(), 4);
/// ```
pub struct SyncDoubleJump<T, S = DefaultHashBuilder> {
    inner: RwLock<DoubleJump<T, S>>,
}

impl<T, S> SyncDoubleJump<T, S> {
    fn read(&self) -> RwLockReadGuard<'_, DoubleJump<T, S>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DoubleJump<T, S>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unwraps the table, dropping the lock.
    pub fn into_inner(self) -> DoubleJump<T, S> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, S> Debug for SyncDoubleJump<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.read(), f)
    }
}

impl<T, S> SyncDoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates a new table with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self
    where
        S: Clone,
    {
        Self {
            inner: RwLock::new(DoubleJump::with_hasher(hash_builder)),
        }
    }

    /// Adds a member to the table. Idempotent; takes the write lock.
    ///
    /// See [`DoubleJump::add`].
    pub fn add(&self, member: T) {
        self.write().add(member);
    }

    /// Removes a member from the table. No-op when absent; takes the write
    /// lock.
    ///
    /// See [`DoubleJump::remove`].
    pub fn remove(&self, member: &T) {
        self.write().remove(member);
    }

    /// Maps a key to a live member, or `None` iff the table is empty.
    ///
    /// See [`DoubleJump::get`].
    pub fn get(&self, key: u64) -> Option<T> {
        self.read().get(key).cloned()
    }

    /// Returns `true` if the member is in the table.
    pub fn contains(&self, member: &T) -> bool {
        self.read().contains(member)
    }

    /// Returns the number of live members.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the table has no members.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the loose holder's slot count, holes included.
    ///
    /// See [`DoubleJump::loose_len`].
    pub fn loose_len(&self) -> usize {
        self.read().loose_len()
    }

    /// Reclaims all holes in the loose holder; takes the write lock.
    ///
    /// See [`DoubleJump::shrink`].
    pub fn shrink(&self) {
        self.write().shrink();
    }

    /// Returns a snapshot of all live members, in unspecified order.
    pub fn all(&self) -> Vec<T> {
        self.read().all()
    }

    /// Returns a uniformly random live member drawn from `rng`, or `None`
    /// iff the table is empty.
    pub fn random_with<R>(&self, rng: &mut R) -> Option<T>
    where
        R: Rng + ?Sized,
    {
        self.read().random_with(rng).cloned()
    }

    /// Returns a uniformly random live member drawn from the thread-local
    /// RNG, or `None` iff the table is empty.
    pub fn random(&self) -> Option<T> {
        self.read().random().cloned()
    }
}

impl<T, S> SyncDoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Creates a new, empty table using the default hasher builder.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DoubleJump::new()),
        }
    }
}

impl<T, S> Default for SyncDoubleJump<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> From<DoubleJump<T, S>> for SyncDoubleJump<T, S> {
    fn from(table: DoubleJump<T, S>) -> Self {
        Self {
            inner: RwLock::new(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use rand::Rng;

    use super::*;

    #[test]
    fn delegates_to_the_inner_table() {
        let table: SyncDoubleJump<&str> = SyncDoubleJump::new();
        assert!(table.is_empty());
        assert_eq!(table.get(1), None);
        assert_eq!(table.random(), None);

        table.add("a");
        table.add("b");
        table.add("b");
        assert_eq!(table.len(), 2);
        assert!(table.contains(&"a"));
        assert!(table.get(1).is_some());
        assert!(table.random().is_some());

        table.remove(&"a");
        assert_eq!(table.len(), 1);
        assert_eq!(table.loose_len(), 2);
        table.shrink();
        assert_eq!(table.loose_len(), 1);
        assert_eq!(table.all(), vec!["b"]);
    }

    #[test]
    fn wraps_and_unwraps() {
        let mut inner: DoubleJump<&str> = DoubleJump::new();
        inner.add("a");

        let table = SyncDoubleJump::from(inner);
        table.add("b");
        assert_eq!(table.len(), 2);

        let inner = table.into_inner();
        assert!(inner.contains(&"a"));
        assert!(inner.contains(&"b"));
    }

    #[test]
    fn concurrent_adds_land_exactly_once() {
        let table: SyncDoubleJump<u32> = SyncDoubleJump::new();
        thread::scope(|s| {
            // Two threads per range; duplicates must collapse under the lock.
            for _ in 0..2 {
                for t in 0..4u32 {
                    let table = &table;
                    s.spawn(move || {
                        for m in (t * 500)..((t + 1) * 500) {
                            table.add(m);
                        }
                    });
                }
            }
        });
        assert_eq!(table.len(), 2000);
        assert_eq!(table.loose_len(), 2000);
    }

    #[test]
    fn interleaved_removals_converge() {
        let table: SyncDoubleJump<u32> = SyncDoubleJump::new();
        for m in 0..1000 {
            table.add(m);
        }
        thread::scope(|s| {
            for t in 0..4u32 {
                let table = &table;
                s.spawn(move || {
                    for m in (t..1000).step_by(4) {
                        if m % 2 == 1 {
                            table.remove(&m);
                        }
                    }
                });
            }
        });
        assert_eq!(table.len(), 500);
        for m in 0..1000u32 {
            assert_eq!(table.contains(&m), m % 2 == 0);
        }
    }

    #[test]
    fn reads_during_churn_always_resolve() {
        let table: SyncDoubleJump<u32> = SyncDoubleJump::new();
        for m in 0..8 {
            table.add(m);
        }
        thread::scope(|s| {
            s.spawn(|| {
                // Members 0..8 stay put, so the table is never empty.
                for m in 8..2000u32 {
                    table.add(m);
                    table.remove(&m);
                }
            });
            s.spawn(|| {
                for _ in 0..50 {
                    table.shrink();
                }
            });
            for _ in 0..2 {
                s.spawn(|| {
                    let mut rng = rand::rng();
                    for _ in 0..10_000 {
                        let member = table.get(rng.random()).expect("table is never empty");
                        assert!(member < 2000);
                    }
                });
            }
        });
        assert_eq!(table.len(), 8);
    }
}
