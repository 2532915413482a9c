//! Google's jump consistent hash.
//!
//! [`jump_bucket`] is the stateless primitive underneath [`DoubleJump`]
//! (see the [paper](https://arxiv.org/abs/1406.2294)): it maps a 64-bit key
//! to one of `n` buckets such that raising `n` to `n + 1` reassigns only the
//! keys that land in the new bucket. It is exposed publicly because it is
//! useful on its own whenever bucket counts only ever grow.
//!
//! [`DoubleJump`]: crate::table::DoubleJump

/// The multiplier of the linear congruential generator that drives the jump
/// sequence. Fixed by the algorithm; changing it breaks interoperability
/// with every other jump hash implementation.
const LCG_MULTIPLIER: u64 = 2862933555777941757;

/// Maps `key` to a bucket index in `0..buckets`.
///
/// The result is deterministic in `key` and `buckets`, and growing `buckets`
/// by one moves only ~`1/buckets` of all keys (all of them into the new
/// bucket). Shrinking is the mirror image: bucket `n - 1`'s keys scatter
/// uniformly over the survivors.
///
/// `buckets` must be at least 1; this is debug-asserted. Callers branching
/// on an empty collection first (as this crate's holders do) never hit the
/// precondition.
///
/// # Examples
///
/// ```rust
/// use double_jump::jump_bucket;
///
/// let key = 0xdead_beef_cafe_f00d;
/// let b = jump_bucket(key, 16);
/// assert!(b < 16);
///
/// // Adding a 17th bucket either keeps the answer or moves it to the new
/// // last bucket; it never shuffles keys between existing buckets.
/// let b17 = jump_bucket(key, 17);
/// assert!(b17 == b || b17 == 16);
/// ```
pub fn jump_bucket(mut key: u64, buckets: usize) -> usize {
    debug_assert!(buckets >= 1, "jump_bucket requires at least one bucket");

    let n = buckets as i64;
    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < n {
        b = j;
        key = key.wrapping_mul(LCG_MULTIPLIER).wrapping_add(1);
        // (2^31 / ((key >> 33) + 1)) is in (0, 2^31]; the product fits an
        // i64 comfortably for any realistic bucket count.
        j = ((b + 1) as f64 * ((1i64 << 31) as f64 / ((key >> 33) + 1) as f64)) as i64;
    }
    b as usize
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for buckets in 1..=64 {
            for _ in 0..1000 {
                assert!(jump_bucket(rng.random(), buckets) < buckets);
            }
        }
    }

    #[test]
    fn deterministic() {
        for key in [0u64, 1, 42, u64::MAX, 0x0123_4567_89ab_cdef] {
            assert_eq!(jump_bucket(key, 37), jump_bucket(key, 37));
        }
    }

    #[test]
    fn single_bucket_is_total() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert_eq!(jump_bucket(rng.random(), 1), 0);
        }
    }

    #[test]
    fn growth_only_moves_keys_into_the_new_bucket() {
        let mut rng = SmallRng::seed_from_u64(0xa11ce);
        for _ in 0..10_000 {
            let key = rng.random();
            for n in 1..32 {
                let before = jump_bucket(key, n);
                let after = jump_bucket(key, n + 1);
                assert!(
                    after == before || after == n,
                    "key {key:#x} moved {before} -> {after} when growing {n} -> {}",
                    n + 1
                );
            }
        }
    }

    #[test]
    fn growth_moves_about_one_nth_of_keys() {
        const SAMPLES: usize = 200_000;
        let mut rng = SmallRng::seed_from_u64(0xbeef);
        let n = 20;
        let mut moved = 0usize;
        for _ in 0..SAMPLES {
            let key = rng.random();
            if jump_bucket(key, n) != jump_bucket(key, n + 1) {
                moved += 1;
            }
        }
        let expected = SAMPLES / (n + 1);
        // Allow generous slack; the point is "about 1/(n+1)", not "exactly".
        assert!(
            moved > expected / 2 && moved < expected * 2,
            "moved {moved}, expected around {expected}"
        );
    }

    #[test]
    fn buckets_fill_evenly() {
        const SAMPLES: usize = 100_000;
        let n = 10;
        let mut counts = vec![0usize; n];
        let mut rng = SmallRng::seed_from_u64(0xf00d);
        for _ in 0..SAMPLES {
            counts[jump_bucket(rng.random(), n)] += 1;
        }
        let ideal = SAMPLES / n;
        for (bucket, &count) in counts.iter().enumerate() {
            assert!(
                count > ideal * 85 / 100 && count < ideal * 115 / 100,
                "bucket {bucket} holds {count} keys, ideal {ideal}"
            );
        }
    }
}
