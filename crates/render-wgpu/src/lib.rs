//! wgpu render backend for the frame pipeline.
//!
//! Draws a mirrored [`framepipe_render::RenderScene`] offscreen: one pipeline
//! per vertex format and primitive, one uniform block per mesh.
//!
//! # Invariants
//! - The renderer only reads the scene; uploads are keyed by mesh guid.
//! - Fans and meshes without vertices are skipped, never drawn partially.

mod context;
mod gpu;
mod shaders;

pub use context::{GpuContext, GpuError};
pub use gpu::{GpuFrameStats, TARGET_FORMAT, WgpuRenderer};
