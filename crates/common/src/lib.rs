//! Shared building blocks: resource guids, interned names, block pools.
//!
//! # Invariants
//! - A [`NameId`] is only meaningful against the [`NameTable`] that issued it
//!   (or a mirror built from that table's entries in order).
//! - A [`BlockPool`] never has more than `capacity` blocks checked out; the
//!   ceiling only moves under [`PoolPolicy::Grow`].

mod names;
mod pool;
mod types;

pub use names::{NameError, NameId, NameTable};
pub use pool::{BlockPool, PoolError, PoolPolicy, PoolStats};
pub use types::{Guid, GuidAllocator, Viewport};

pub fn crate_info() -> &'static str {
    "framepipe-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
