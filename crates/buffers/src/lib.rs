//! GPU buffer payloads and the descriptions needed to draw them.
//!
//! # Invariants
//! - A [`BufferData`] never holds more bytes than its capacity; rejected
//!   writes leave it untouched.
//! - Pooled storage returns to its [`BufferPool`] when the buffer drops.
//! - [`VertexLayout`] offsets are running sums of component sizes.
//! - [`PrimitiveGroup`]s cannot change after construction.

mod buffer;
mod layout;
mod pool;
mod primitive;

pub use buffer::{BufferAccess, BufferData, BufferError, BufferKind};
pub use layout::{VertComponent, VertexAttribute, VertexFormat, VertexLayout};
pub use pool::BufferPool;
pub use primitive::{IndexType, PrimitiveGroup, PrimitiveType};

pub fn crate_info() -> &'static str {
    "framepipe-buffers v0.1.0"
}
