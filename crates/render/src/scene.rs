use framepipe_common::{Guid, NameId, NameTable};
use framepipe_uniform::{UniformEntry, VarReader};
use serde::Serialize;

use crate::RenderError;
use crate::batch::{DirtyFlags, MatrixBuffer};
use crate::frame::Frame;
use crate::pass::PassSnapshot;
use crate::submit::{FrameSubmitCmd, MeshUpload, UpdateFlags};

/// Render-thread copy of one batch.
#[derive(Debug)]
pub struct SceneBatch {
    pub id: NameId,
    pub matrices: MatrixBuffer,
    pub uniforms: Vec<UniformEntry>,
    pub meshes: Vec<MeshUpload>,
    /// What changed since the renderer last looked.
    pub dirty: DirtyFlags,
}

impl SceneBatch {
    fn new(id: NameId) -> Self {
        Self {
            id,
            matrices: MatrixBuffer::default(),
            uniforms: Vec::new(),
            meshes: Vec::new(),
            dirty: DirtyFlags::ALL,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformEntry> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn mesh(&self, guid: Guid) -> Option<&MeshUpload> {
        self.meshes.iter().find(|m| m.guid == guid)
    }
}

/// Render-thread copy of one pass.
#[derive(Debug)]
pub struct ScenePass {
    pub snapshot: PassSnapshot,
    pub batches: Vec<SceneBatch>,
}

impl ScenePass {
    pub fn id(&self) -> NameId {
        self.snapshot.id
    }

    pub fn batch(&self, id: NameId) -> Option<&SceneBatch> {
        self.batches.iter().find(|b| b.id == id)
    }
}

/// Counters for one applied frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    pub sequence: u64,
    pub commands: usize,
    pub skipped: usize,
    pub passes_created: usize,
    pub meshes_uploaded: usize,
    /// The producer hit the command ceiling; more work follows.
    pub truncated: bool,
    pub dropped_uniforms: usize,
}

/// Consumer-side mirror of the producer's passes, rebuilt from frames.
#[derive(Debug, Default)]
pub struct RenderScene {
    names: NameTable,
    passes: Vec<ScenePass>,
    pipeline: Option<String>,
    frames_applied: u64,
}

impl RenderScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every command of `frame` into the mirror.
    ///
    /// Commands naming an unknown pass or batch are logged and skipped. The
    /// frame comes back empty and ready for recycling.
    pub fn apply(&mut self, frame: &mut Frame) -> Result<ApplyStats, RenderError> {
        let _span = tracing::debug_span!("apply_frame", sequence = frame.sequence()).entered();
        let mut stats = ApplyStats {
            sequence: frame.sequence(),
            truncated: frame.truncated,
            dropped_uniforms: frame.dropped_uniforms,
            ..ApplyStats::default()
        };

        if frame.clear_scene {
            tracing::debug!(passes = self.passes.len(), "clearing mirrored scene");
            self.passes.clear();
        }
        for (id, name) in &frame.names {
            self.names.adopt(*id, name)?;
        }
        if let Some(pipeline) = frame.pipeline.take() {
            self.pipeline = Some(pipeline);
        }

        let commands = frame.drain(|cmd| {
            if !self.apply_cmd(cmd, &mut stats) {
                stats.skipped += 1;
            }
        });
        stats.commands = commands;
        self.frames_applied += 1;
        tracing::trace!(?stats, "frame applied");
        Ok(stats)
    }

    fn apply_cmd(&mut self, cmd: &mut FrameSubmitCmd, stats: &mut ApplyStats) -> bool {
        let flags = cmd.update_flags;
        if flags.contains(UpdateFlags::CREATE_PASSES) {
            for snapshot in cmd.updated_passes.drain(..) {
                if self.upsert_pass(snapshot) {
                    stats.passes_created += 1;
                }
            }
            return true;
        }

        let Some(batch) = self.batch_mut(cmd.pass_id, cmd.batch_id) else {
            tracing::warn!(pass = ?cmd.pass_id, batch = ?cmd.batch_id, flags = flags.bits(), "command for unknown batch");
            return false;
        };

        if flags.contains(UpdateFlags::UPDATE_MATRIXES) {
            let Some(matrices) = MatrixBuffer::from_bytes(&cmd.data) else {
                tracing::warn!(len = cmd.data.len(), "malformed matrix payload");
                return false;
            };
            batch.matrices = matrices;
            batch.dirty.insert(DirtyFlags::MATRIX_BUFFER);
        } else if flags.contains(UpdateFlags::UPDATE_UNIFORMS) {
            let mut uniforms = Vec::new();
            for var in VarReader::new(&cmd.data) {
                match var {
                    Ok(v) => uniforms.push(v.to_owned_entry()),
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed uniform payload");
                        return false;
                    }
                }
            }
            // Merged by name: a var missing from the payload keeps its last value.
            for entry in uniforms {
                match batch.uniforms.iter_mut().find(|u| u.name == entry.name) {
                    Some(slot) => *slot = entry,
                    None => batch.uniforms.push(entry),
                }
            }
            batch.dirty.insert(DirtyFlags::UNIFORM_BUFFER);
        } else if flags.contains(UpdateFlags::ADD_RENDER_DATA) {
            stats.meshes_uploaded += cmd.new_meshes.len();
            batch.meshes.append(&mut cmd.new_meshes);
            batch.dirty.insert(DirtyFlags::MESH);
        } else if flags.contains(UpdateFlags::UPDATE_BUFFER) {
            let Some(upload) = cmd.new_meshes.pop() else {
                return false;
            };
            let Some(slot) = batch.meshes.iter_mut().find(|m| m.guid == cmd.mesh_id) else {
                tracing::warn!(mesh = %cmd.mesh_id, "update for unknown mesh");
                return false;
            };
            *slot = upload;
            stats.meshes_uploaded += 1;
            batch.dirty.insert(DirtyFlags::MESH_UPDATE);
        } else {
            return false;
        }
        true
    }

    /// Returns true when the pass was new.
    fn upsert_pass(&mut self, snapshot: PassSnapshot) -> bool {
        match self.passes.iter_mut().find(|p| p.id() == snapshot.id) {
            Some(pass) => {
                let mut old = std::mem::take(&mut pass.batches);
                pass.batches = snapshot
                    .batch_ids
                    .iter()
                    .map(|id| match old.iter().position(|b| b.id == *id) {
                        Some(i) => old.swap_remove(i),
                        None => SceneBatch::new(*id),
                    })
                    .collect();
                pass.snapshot = snapshot;
                false
            }
            None => {
                let batches = snapshot.batch_ids.iter().map(|id| SceneBatch::new(*id)).collect();
                self.passes.push(ScenePass { snapshot, batches });
                true
            }
        }
    }

    fn batch_mut(&mut self, pass: NameId, batch: NameId) -> Option<&mut SceneBatch> {
        self.passes
            .iter_mut()
            .find(|p| p.id() == pass)?
            .batches
            .iter_mut()
            .find(|b| b.id == batch)
    }

    /// Resets every batch's dirty bits once the renderer has consumed them.
    pub fn clear_dirty(&mut self) {
        for batch in self.passes.iter_mut().flat_map(|p| p.batches.iter_mut()) {
            batch.dirty = DirtyFlags::NONE;
        }
    }

    pub fn passes(&self) -> &[ScenePass] {
        &self.passes
    }

    pub fn pass(&self, name: &str) -> Option<&ScenePass> {
        let id = self.names.lookup(name)?;
        self.passes.iter().find(|p| p.id() == id)
    }

    /// Name of a pass or batch id sent by the producer.
    pub fn resolve(&self, id: NameId) -> Option<&str> {
        self.names.resolve(id)
    }

    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    pub fn num_batches(&self) -> usize {
        self.passes.iter().map(|p| p.batches.len()).sum()
    }

    pub fn num_meshes(&self) -> usize {
        self.passes
            .iter()
            .flat_map(|p| p.batches.iter())
            .map(|b| b.meshes.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MatrixType;
    use crate::service::RenderBackendService;
    use framepipe_buffers::BufferAccess;
    use framepipe_mesh::{MeshBuilder, ResourceContext, VertexType};
    use framepipe_uniform::UniformVar;
    use glam::{Mat4, Vec3};

    fn populated() -> (RenderBackendService, ResourceContext) {
        let mut ctx = ResourceContext::new();
        let mut svc = RenderBackendService::default();
        svc.create_default_3d_pipeline();
        svc.begin_pass("main").unwrap();
        svc.begin_render_batch("opaque").unwrap();
        svc.set_matrix(MatrixType::View, Mat4::from_translation(Vec3::Z)).unwrap();
        svc.set_uniform(UniformVar::float("exposure", 1.5).unwrap()).unwrap();
        let cube = MeshBuilder::new(&mut ctx)
            .create_cube(VertexType::ColorVertex, 1.0, 1.0, 1.0, BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();
        svc.add_mesh(cube, 1).unwrap();
        svc.end_render_batch().unwrap();
        svc.end_pass().unwrap();
        (svc, ctx)
    }

    #[test]
    fn mirror_matches_producer() {
        let (mut svc, _ctx) = populated();
        let mut frame = svc.commit_next_frame().unwrap();
        let mut scene = RenderScene::new();
        let stats = scene.apply(&mut frame).unwrap();

        assert_eq!(stats.commands, 4);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.passes_created, 1);
        assert_eq!(frame.num_cmds(), 0);

        let pass = scene.pass("main").unwrap();
        let batch = &pass.batches[0];
        assert_eq!(scene.resolve(batch.id), Some("opaque"));
        assert_eq!(batch.matrices.view, Mat4::from_translation(Vec3::Z));
        let exposure = batch.uniform("exposure").unwrap();
        assert_eq!(exposure.data, 1.5f32.to_le_bytes().to_vec());
        assert_eq!(batch.meshes[0].num_vertices(), 8);
        assert_eq!(scene.pipeline(), Some(crate::pipeline::DEFAULT_3D_PIPELINE));
    }

    #[test]
    fn mesh_update_replaces_upload() {
        let (mut svc, _ctx) = populated();
        let mut scene = RenderScene::new();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();
        svc.recycle_frame(f);
        scene.clear_dirty();

        let guid = scene.passes()[0].batches[0].meshes[0].guid;
        svc.mesh_mut(guid).unwrap().set_model_matrix(Some(Mat4::from_scale(Vec3::splat(3.0))));
        svc.update_mesh(guid).unwrap();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();

        let batch = &scene.passes()[0].batches[0];
        assert_eq!(batch.meshes.len(), 1);
        assert!(batch.mesh(guid).unwrap().model.is_some());
        assert_eq!(batch.dirty, DirtyFlags::MESH_UPDATE);
    }

    #[test]
    fn dropped_uniform_leaves_last_value() {
        let config = crate::config::FrameConfig {
            uniform_buffer_size: 80,
            ..crate::config::FrameConfig::default()
        };
        let mut svc = RenderBackendService::new(config);
        svc.begin_pass("main").unwrap();
        svc.begin_render_batch("a").unwrap();
        svc.end_render_batch().unwrap();
        svc.begin_render_batch("b").unwrap();
        svc.set_uniform(UniformVar::float("tint", 1.0).unwrap()).unwrap();
        svc.end_render_batch().unwrap();
        svc.end_pass().unwrap();

        let mut scene = RenderScene::new();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();
        svc.recycle_frame(f);

        // Batch "a" now fills the pass uniform buffer ahead of "b".
        svc.begin_pass("main").unwrap();
        svc.begin_render_batch("a").unwrap();
        svc.set_matrix_named("m", Mat4::IDENTITY).unwrap();
        svc.begin_render_batch("b").unwrap();
        svc.set_uniform(UniformVar::float("tint", 2.0).unwrap()).unwrap();
        let mut f = svc.commit_next_frame().unwrap();
        let stats = scene.apply(&mut f).unwrap();

        assert_eq!(stats.dropped_uniforms, 1);
        assert!(!stats.truncated);
        let pass = scene.pass("main").unwrap();
        assert!(pass.batches[0].uniform("m").is_some());
        let tint = pass.batches[1].uniform("tint").unwrap();
        assert_eq!(tint.data, 1.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn unknown_batch_is_skipped() {
        let mut frame = Frame::default();
        frame.init(1, Vec::new());
        frame.enqueue(NameId(4), NameId(5)).unwrap().update_flags = UpdateFlags::UPDATE_MATRIXES;
        let mut scene = RenderScene::new();
        let stats = scene.apply(&mut frame).unwrap();
        assert_eq!(stats.skipped, 1);
        assert!(scene.passes().is_empty());
    }

    #[test]
    fn new_batch_keeps_existing_batch_data() {
        let (mut svc, _ctx) = populated();
        let mut scene = RenderScene::new();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();
        svc.recycle_frame(f);

        svc.begin_pass("main").unwrap();
        svc.begin_render_batch("overlay").unwrap();
        svc.end_render_batch().unwrap();
        svc.end_pass().unwrap();
        let mut f = svc.commit_next_frame().unwrap();
        let stats = scene.apply(&mut f).unwrap();

        assert_eq!(stats.passes_created, 0);
        let pass = scene.pass("main").unwrap();
        assert_eq!(pass.batches.len(), 2);
        assert_eq!(pass.batches[0].meshes.len(), 1);
        assert_eq!(scene.resolve(pass.batches[1].id), Some("overlay"));
    }

    #[test]
    fn clear_scene_drops_mirror() {
        let (mut svc, _ctx) = populated();
        let mut scene = RenderScene::new();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();
        svc.recycle_frame(f);
        assert_eq!(scene.num_meshes(), 1);

        svc.clear_passes();
        let mut f = svc.commit_next_frame().unwrap();
        scene.apply(&mut f).unwrap();
        assert!(scene.passes().is_empty());
        assert_eq!(scene.frames_applied(), 2);
    }
}
