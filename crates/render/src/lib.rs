//! Frame pipeline between a scene producer and a render thread.
//!
//! The producer records passes, batches, matrices, uniforms and meshes into a
//! [`RenderBackendService`]. Each [`RenderBackendService::commit_next_frame`]
//! turns what changed into a [`Frame`] of [`FrameSubmitCmd`]s, which the
//! consumer applies to its [`RenderScene`] mirror and renders.
//!
//! # Invariants
//! - A frame is owned by exactly one side at a time; it moves by value.
//! - Commands are applied in the order they were enqueued.
//! - Producer dirty bits are cleared only for work queued into a committed frame.
//! - At most `frames_in_flight` frames are outstanding.

mod batch;
mod config;
mod frame;
mod pass;
mod pipeline;
mod renderer;
mod scene;
mod service;
mod submit;
mod thread;

use framepipe_common::{Guid, NameError, PoolError};
use framepipe_uniform::UniformError;

pub use batch::{DirtyFlags, MatrixBuffer, MatrixType, MeshEntry, RenderBatchData};
pub use config::{ConfigError, FrameConfig};
pub use frame::Frame;
pub use pass::{FrameBuffer, PassData, PassSnapshot};
pub use pipeline::{CullMode, DEFAULT_2D_PIPELINE, DEFAULT_3D_PIPELINE, Pipeline, PipelinePass};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{ApplyStats, RenderScene, SceneBatch, ScenePass};
pub use service::RenderBackendService;
pub use submit::{FrameSubmitCmd, MeshUpload, UpdateFlags};
pub use thread::{FrameReport, RenderThread};

/// Errors raised while recording, committing or applying frames.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("submit command pool: {0}")]
    CommandPool(#[from] PoolError),
    #[error("no pass is open")]
    NoActivePass,
    #[error("no render batch is open")]
    NoActiveBatch,
    #[error("all {in_flight} frames are in flight")]
    NoFreeFrame { in_flight: usize },
    #[error("name table: {0}")]
    Name(#[from] NameError),
    #[error("uniform: {0}")]
    Uniform(#[from] UniformError),
    #[error("unknown mesh {0}")]
    UnknownMesh(Guid),
    #[error("unknown pipeline `{0}`")]
    UnknownPipeline(String),
    #[error("failed to spawn render thread: {0}")]
    Spawn(std::io::Error),
    #[error("render thread is gone")]
    ThreadGone,
}

pub fn crate_info() -> &'static str {
    "framepipe-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
