use serde::{Deserialize, Serialize};

/// What a pool does when every block is checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Double the ceiling and keep going. Each growth is logged and counted.
    #[default]
    Grow,
    /// Refuse the request with [`PoolError::Exhausted`].
    Reject,
}

/// Errors from block pool operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool exhausted: all {capacity} blocks in use")]
    Exhausted { capacity: usize },
}

/// Pool occupancy snapshot for instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Current ceiling on blocks checked out at once.
    pub capacity: usize,
    /// Blocks checked out right now.
    pub in_use: usize,
    /// Largest `in_use` ever observed.
    pub high_water: usize,
    /// How many times the ceiling was raised.
    pub grow_count: usize,
}

/// Fixed-ceiling recycler for reusable blocks.
///
/// Blocks are values handed out by [`acquire_with`](Self::acquire_with) and
/// given back with [`release`](Self::release); released blocks keep their
/// heap allocations and are reused before anything new is built.
///
/// # Thread Safety
///
/// Not thread-safe on its own. Wrap it in a mutex to share between threads.
#[derive(Debug)]
pub struct BlockPool<T> {
    free: Vec<T>,
    in_use: usize,
    capacity: usize,
    policy: PoolPolicy,
    high_water: usize,
    grow_count: usize,
}

impl<T> BlockPool<T> {
    /// Creates a pool with room for `capacity` live blocks (minimum 1).
    pub fn new(capacity: usize, policy: PoolPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            free: Vec::new(),
            in_use: 0,
            capacity,
            policy,
            high_water: 0,
            grow_count: 0,
        }
    }

    /// Checks out a recycled block, or builds one with `make`.
    pub fn acquire_with(&mut self, make: impl FnOnce() -> T) -> Result<T, PoolError> {
        if self.in_use >= self.capacity {
            match self.policy {
                PoolPolicy::Reject => {
                    tracing::warn!(capacity = self.capacity, "block pool exhausted");
                    return Err(PoolError::Exhausted {
                        capacity: self.capacity,
                    });
                }
                PoolPolicy::Grow => {
                    let grown = self.capacity * 2;
                    tracing::warn!(from = self.capacity, to = grown, "block pool grown");
                    self.capacity = grown;
                    self.grow_count += 1;
                }
            }
        }

        let block = self.free.pop().unwrap_or_else(make);
        self.in_use += 1;
        self.high_water = self.high_water.max(self.in_use);
        Ok(block)
    }

    /// Returns a block for reuse. Surplus blocks beyond the ceiling are dropped.
    pub fn release(&mut self, block: T) {
        self.in_use = self.in_use.saturating_sub(1);
        if self.free.len() < self.capacity {
            self.free.push(block);
        }
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            in_use: self.in_use,
            high_water: self.high_water,
            grow_count: self.grow_count,
        }
    }

    /// Blocks waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_policy_stops_at_ceiling() {
        let mut pool: BlockPool<Vec<u8>> = BlockPool::new(2, PoolPolicy::Reject);
        let a = pool.acquire_with(Vec::new).unwrap();
        let _b = pool.acquire_with(Vec::new).unwrap();
        assert_eq!(
            pool.acquire_with(Vec::new),
            Err(PoolError::Exhausted { capacity: 2 })
        );

        pool.release(a);
        assert!(pool.acquire_with(Vec::new).is_ok());
        assert_eq!(pool.stats().grow_count, 0);
    }

    #[test]
    fn grow_policy_doubles_and_counts() {
        let mut pool: BlockPool<u32> = BlockPool::new(2, PoolPolicy::Grow);
        for i in 0..5 {
            pool.acquire_with(|| i).unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.grow_count, 2);
        assert_eq!(stats.in_use, 5);
        assert_eq!(stats.high_water, 5);
    }

    #[test]
    fn released_blocks_are_reused() {
        let mut pool: BlockPool<Vec<u8>> = BlockPool::new(4, PoolPolicy::Reject);
        let mut block = pool.acquire_with(Vec::new).unwrap();
        block.reserve(1024);
        let cap = block.capacity();
        pool.release(block);
        assert_eq!(pool.free_count(), 1);

        let again = pool.acquire_with(Vec::new).unwrap();
        assert_eq!(again.capacity(), cap);
    }

    #[test]
    fn high_water_survives_release() {
        let mut pool: BlockPool<u8> = BlockPool::new(8, PoolPolicy::Reject);
        let blocks: Vec<u8> = (0..3).map(|_| pool.acquire_with(|| 0).unwrap()).collect();
        for b in blocks {
            pool.release(b);
        }
        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.high_water, 3);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let pool: BlockPool<u8> = BlockPool::new(0, PoolPolicy::Reject);
        assert_eq!(pool.stats().capacity, 1);
    }

    #[test]
    fn policy_parses_from_yaml() {
        let p: PoolPolicy = serde_yaml::from_str("reject").unwrap();
        assert_eq!(p, PoolPolicy::Reject);
    }
}
