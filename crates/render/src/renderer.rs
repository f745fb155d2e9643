use std::fmt::Write as _;

use crate::scene::RenderScene;

/// Backend-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the mirrored scene after a frame has been applied and
/// produces output. It never talks to the producer.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render the current state of `scene`.
    fn render(&mut self, scene: &RenderScene) -> Self::Output;
}

/// Text renderer listing passes, batches and meshes.
///
/// Useful for CLI output, logging, and testing the hand-off without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &RenderScene) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} (pipeline={}) ===",
            self.frames,
            scene.pipeline().unwrap_or("-")
        );
        let _ = writeln!(
            out,
            "Passes: {} Batches: {} Meshes: {}",
            scene.passes().len(),
            scene.num_batches(),
            scene.num_meshes()
        );

        for pass in scene.passes() {
            let vp = pass.snapshot.viewport;
            let _ = writeln!(
                out,
                "  pass {} viewport=({}, {}, {}, {}) target={}",
                scene.resolve(pass.id()).unwrap_or("?"),
                vp.x,
                vp.y,
                vp.width,
                vp.height,
                pass.snapshot
                    .render_target
                    .as_ref()
                    .map_or("screen", |t| t.name.as_str())
            );
            for batch in &pass.batches {
                let _ = writeln!(
                    out,
                    "    batch {} uniforms={} dirty={:#x}",
                    scene.resolve(batch.id).unwrap_or("?"),
                    batch.uniforms.len(),
                    batch.dirty.bits()
                );
                for mesh in &batch.meshes {
                    let _ = writeln!(
                        out,
                        "      mesh {} {} verts={} indices={} instances={}",
                        mesh.guid,
                        mesh.name,
                        mesh.num_vertices(),
                        mesh.num_indices(),
                        mesh.num_instances
                    );
                }
            }
        }
        out
    }
}
