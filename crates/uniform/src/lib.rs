//! Named, typed shader values and their binary transport.
//!
//! # Invariants
//! - A [`UniformVar`] payload is always `ty.data_size(num_items)` bytes.
//! - [`UniformBuffer`] never reads or writes past its capacity; a refused
//!   access changes nothing.
//! - Wire entries are `[u32 header][name][data]` with
//!   `header = (name_len << 16) | data_len`, little-endian.

mod buffer;
mod param;
mod var;
pub mod wire;

pub use buffer::{DEFAULT_UNIFORM_BUFFER_SIZE, UniformBuffer};
pub use param::ParameterType;
pub use var::{UniformDataBlob, UniformVar, floats_to_le, le_to_floats, mats_from_le};
pub use wire::{DecodedVar, UniformEntry, VarReader};

/// Errors from uniform construction and serialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniformError {
    #[error("uniform name must not be empty")]
    EmptyName,
    #[error("array uniform needs at least one item")]
    NoItems,
    #[error("payload size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("name ({name_len} bytes) or data ({data_len} bytes) exceeds 65535 bytes")]
    FieldTooLong { name_len: usize, data_len: usize },
    #[error("uniform buffer full: need {needed} bytes, {remaining} left")]
    BufferFull { needed: usize, remaining: usize },
    #[error("truncated uniform entry")]
    Truncated,
    #[error("uniform name is not valid UTF-8")]
    InvalidName,
}

pub fn crate_info() -> &'static str {
    "framepipe-uniform v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("uniform"));
    }
}
