//! Mesh assembly: vertex formats, materials, meshes and the shape builder.
//!
//! # Invariants
//! - A [`Mesh`] owns its vertex and index buffers; materials are shared.
//! - Builders take every resource they need from an explicit
//!   [`ResourceContext`], never from process-wide state.
//! - A text box of `n` characters has `4n` vertices and `6n` indices.

mod builder;
mod context;
mod material;
mod mesh;
pub mod text;
mod vertex;

pub use builder::{MeshBuilder, UiRect};
pub use context::ResourceContext;
pub use material::{
    ColorSlot, DEFAULT_COLOR_MATERIAL, DEFAULT_FONT_MATERIAL, DEFAULT_FONT_TEXTURE,
    DEFAULT_TEXTURE_MATERIAL, DEFAULT_UI_MATERIAL, Material, MaterialCache, MaterialType,
};
pub use mesh::Mesh;
pub use vertex::{ColorVert, RenderVert, UiVert, VertexType};

/// Errors from mesh construction.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error(transparent)]
    Buffer(#[from] framepipe_buffers::BufferError),
    #[error("{0:?} is not supported by this builder")]
    UnsupportedVertexType(VertexType),
    #[error("{what}: expected {expected} entries, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("no {0} supplied")]
    Empty(&'static str),
    #[error("line list needs a non-zero, even number of indices, got {0}")]
    OddLineIndices(usize),
    #[error("index {index} out of range for {num_vertices} vertices")]
    IndexOutOfRange { index: u32, num_vertices: usize },
    #[error("no mesh under construction")]
    NothingBuilt,
    #[error("mesh does not hold text vertices")]
    NotATextMesh,
}

pub fn crate_info() -> &'static str {
    "framepipe-mesh v0.1.0"
}
