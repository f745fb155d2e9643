use framepipe_common::{Guid, NameId, NameTable, Viewport};
use framepipe_mesh::Mesh;
use framepipe_uniform::UniformVar;
use glam::Mat4;

use crate::RenderError;
use crate::batch::{DirtyFlags, MatrixType, RenderBatchData};
use crate::config::FrameConfig;
use crate::frame::Frame;
use crate::pass::{FrameBuffer, PassData, PassSnapshot};
use crate::pipeline::Pipeline;
use crate::submit::{MeshUpload, UpdateFlags};

/// Producer-side recorder of passes, batches and their contents.
///
/// Calls nest as `begin_pass -> begin_render_batch -> ... -> end_render_batch
/// -> end_pass`. Nothing reaches the render thread until
/// [`commit_next_frame`](Self::commit_next_frame) turns the accumulated dirty
/// state into submit commands.
#[derive(Debug)]
pub struct RenderBackendService {
    config: FrameConfig,
    names: NameTable,
    names_sent: usize,
    passes: Vec<PassData>,
    current_pass: Option<usize>,
    current_batch: Option<usize>,
    pipelines: Vec<Pipeline>,
    active_pipeline: Option<String>,
    pending_clear: bool,
    spare_frames: Vec<Frame>,
    in_flight: usize,
    sequence: u64,
}

impl Default for RenderBackendService {
    fn default() -> Self {
        Self::new(FrameConfig::default())
    }
}

impl RenderBackendService {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            names: NameTable::new(),
            names_sent: 0,
            passes: Vec::new(),
            current_pass: None,
            current_batch: None,
            pipelines: Vec::new(),
            active_pipeline: None,
            pending_clear: false,
            spare_frames: Vec::new(),
            in_flight: 0,
            sequence: 0,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    // -- pipelines --------------------------------------------------------

    fn register_pipeline(&mut self, pipeline: Pipeline) -> &Pipeline {
        let idx = match self.pipelines.iter().position(|p| p.name() == pipeline.name()) {
            Some(i) => i,
            None => {
                self.pipelines.push(pipeline);
                self.pipelines.len() - 1
            }
        };
        if self.active_pipeline.is_none() {
            self.active_pipeline = Some(self.pipelines[idx].name().to_owned());
        }
        &self.pipelines[idx]
    }

    /// Registers the default 3D pipeline; the first registered pipeline
    /// becomes active.
    pub fn create_default_3d_pipeline(&mut self) -> &Pipeline {
        self.register_pipeline(Pipeline::default_3d())
    }

    pub fn create_default_2d_pipeline(&mut self) -> &Pipeline {
        self.register_pipeline(Pipeline::default_2d())
    }

    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> &Pipeline {
        self.register_pipeline(pipeline)
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name() == name)
    }

    pub fn set_active_pipeline(&mut self, name: &str) -> Result<(), RenderError> {
        if self.pipeline(name).is_none() {
            return Err(RenderError::UnknownPipeline(name.to_owned()));
        }
        self.active_pipeline = Some(name.to_owned());
        Ok(())
    }

    pub fn active_pipeline(&self) -> Option<&str> {
        self.active_pipeline.as_deref()
    }

    // -- passes and batches ----------------------------------------------

    /// Opens pass `name`, creating it on first use.
    pub fn begin_pass(&mut self, name: &str) -> Result<NameId, RenderError> {
        let id = self.names.intern(name)?;
        let idx = match self.passes.iter().position(|p| p.id() == id) {
            Some(i) => i,
            None => {
                tracing::debug!(pass = name, "creating pass");
                self.passes.push(PassData::new(id));
                self.passes.len() - 1
            }
        };
        self.current_pass = Some(idx);
        self.current_batch = None;
        Ok(id)
    }

    pub fn end_pass(&mut self) -> Result<(), RenderError> {
        if self.current_pass.take().is_none() {
            return Err(RenderError::NoActivePass);
        }
        self.current_batch = None;
        Ok(())
    }

    pub fn pass_by_id(&self, name: &str) -> Option<&PassData> {
        let id = self.names.lookup(name)?;
        self.passes.iter().find(|p| p.id() == id)
    }

    pub fn passes(&self) -> &[PassData] {
        &self.passes
    }

    fn active_pass(&mut self) -> Result<&mut PassData, RenderError> {
        let idx = self.current_pass.ok_or(RenderError::NoActivePass)?;
        Ok(&mut self.passes[idx])
    }

    fn active_batch(&mut self) -> Result<&mut RenderBatchData, RenderError> {
        let batch = self.current_batch.ok_or(RenderError::NoActiveBatch)?;
        let pass = self.active_pass()?;
        Ok(&mut pass.batches[batch])
    }

    pub fn set_render_target(&mut self, target: FrameBuffer) -> Result<(), RenderError> {
        let pass = self.active_pass()?;
        pass.render_target = Some(target);
        pass.is_dirty = true;
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        let pass = self.active_pass()?;
        pass.viewport = viewport;
        pass.is_dirty = true;
        Ok(())
    }

    /// Camera of the active pass.
    pub fn set_pass_camera(&mut self, view: Mat4, proj: Mat4) -> Result<(), RenderError> {
        let pass = self.active_pass()?;
        pass.view = view;
        pass.proj = proj;
        pass.is_dirty = true;
        Ok(())
    }

    /// Opens batch `name` inside the active pass, creating it on first use.
    pub fn begin_render_batch(&mut self, name: &str) -> Result<NameId, RenderError> {
        if self.current_pass.is_none() {
            return Err(RenderError::NoActivePass);
        }
        let id = self.names.intern(name)?;
        let idx = self.active_pass()?.ensure_batch(id);
        self.current_batch = Some(idx);
        Ok(id)
    }

    pub fn end_render_batch(&mut self) -> Result<(), RenderError> {
        if self.current_batch.take().is_none() {
            return Err(RenderError::NoActiveBatch);
        }
        Ok(())
    }

    // -- batch contents ---------------------------------------------------

    pub fn set_matrix(&mut self, ty: MatrixType, m: Mat4) -> Result<(), RenderError> {
        self.active_batch()?.set_matrix(ty, m);
        Ok(())
    }

    /// Stores `m` as a named `Mat4` uniform of the active batch.
    pub fn set_matrix_named(&mut self, name: &str, m: Mat4) -> Result<(), RenderError> {
        let var = UniformVar::mat4(name, m)?;
        self.active_batch()?.set_uniform(var);
        Ok(())
    }

    pub fn set_matrix_array(&mut self, name: &str, matrices: &[Mat4]) -> Result<(), RenderError> {
        self.active_batch()?.set_matrix_array(name, matrices)?;
        Ok(())
    }

    pub fn set_uniform(&mut self, var: UniformVar) -> Result<(), RenderError> {
        self.active_batch()?.set_uniform(var);
        Ok(())
    }

    /// Hands `mesh` to the active batch. Returns its guid for later updates.
    pub fn add_mesh(&mut self, mesh: Mesh, num_instances: u32) -> Result<Guid, RenderError> {
        let guid = mesh.guid();
        self.active_batch()?.add_mesh(mesh, num_instances);
        Ok(guid)
    }

    pub fn add_meshes(&mut self, meshes: Vec<Mesh>, num_instances: u32) -> Result<(), RenderError> {
        if meshes.is_empty() {
            return Ok(());
        }
        self.active_batch()?.add_meshes(meshes, num_instances);
        Ok(())
    }

    /// Mutable access to a mesh owned by any batch. Call
    /// [`update_mesh`](Self::update_mesh) afterwards to re-upload it.
    pub fn mesh_mut(&mut self, guid: Guid) -> Option<&mut Mesh> {
        self.passes
            .iter_mut()
            .flat_map(|p| p.batches.iter_mut())
            .find_map(|b| b.mesh_mut(guid))
    }

    /// Schedules mesh `guid` for re-upload with the next frame.
    pub fn update_mesh(&mut self, guid: Guid) -> Result<(), RenderError> {
        let found = self
            .passes
            .iter_mut()
            .flat_map(|p| p.batches.iter_mut())
            .any(|b| b.update_mesh(guid));
        if found {
            Ok(())
        } else {
            tracing::debug!(%guid, "update for unknown mesh");
            Err(RenderError::UnknownMesh(guid))
        }
    }

    /// Drops every pass. The next frame tells the consumer to do the same.
    pub fn clear_passes(&mut self) {
        tracing::debug!(passes = self.passes.len(), "clearing passes");
        self.passes.clear();
        self.current_pass = None;
        self.current_batch = None;
        self.pending_clear = true;
    }

    /// Applies a new viewport to every pass.
    pub fn resize(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let viewport = Viewport::new(x, y, width, height);
        for pass in &mut self.passes {
            pass.viewport = viewport;
            pass.is_dirty = true;
        }
    }

    // -- hand-off ---------------------------------------------------------

    /// Frames handed out and not yet returned through
    /// [`recycle_frame`](Self::recycle_frame).
    pub fn frames_in_flight(&self) -> usize {
        self.in_flight
    }

    /// Gives a consumed frame back for reuse.
    pub fn recycle_frame(&mut self, mut frame: Frame) {
        frame.reset();
        self.spare_frames.push(frame);
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Turns pending changes into the next frame.
    ///
    /// Producer dirty state is cleared for exactly the work that made it into
    /// the frame. When the command ceiling is reached the frame is marked
    /// [`truncated`](Frame::truncated) and the rest goes out with a later
    /// frame. Uniforms that do not fit the pass uniform buffer are dropped
    /// and counted, leaving the consumer with the previous values.
    pub fn commit_next_frame(&mut self) -> Result<Frame, RenderError> {
        let sequence = self.sequence + 1;
        let _span = tracing::info_span!("commit_next_frame", sequence).entered();

        if self.in_flight >= self.config.frames_in_flight {
            tracing::warn!(in_flight = self.in_flight, "no free frame");
            return Err(RenderError::NoFreeFrame {
                in_flight: self.in_flight,
            });
        }

        let mut frame = self
            .spare_frames
            .pop()
            .unwrap_or_else(|| Frame::new(&self.config));
        let sent = match self.record(sequence, &mut frame) {
            Ok(sent) => sent,
            Err(e) => {
                tracing::warn!(error = %e, "frame recording failed");
                frame.reset();
                self.spare_frames.push(frame);
                return Err(e);
            }
        };

        self.mark_committed(&sent);
        self.sequence = sequence;
        self.in_flight += 1;
        tracing::debug!(
            commands = frame.num_cmds(),
            new_passes = frame.new_passes.len(),
            truncated = frame.truncated,
            dropped_uniforms = frame.dropped_uniforms,
            "frame committed"
        );
        Ok(frame)
    }

    fn record(&self, sequence: u64, frame: &mut Frame) -> Result<Vec<BatchSent>, RenderError> {
        let new_passes: Vec<PassSnapshot> = self
            .passes
            .iter()
            .filter(|p| p.is_dirty)
            .map(PassData::snapshot)
            .collect();
        frame.init(sequence, new_passes);
        frame.clear_scene = self.pending_clear;
        frame.pipeline = self.active_pipeline.clone();
        frame.names = self
            .names
            .entries_since(self.names_sent)
            .map(|(id, name)| (id, name.to_owned()))
            .collect();

        if let Some(first) = frame.new_passes.first().map(|p| p.id) {
            let snapshots = frame.new_passes.clone();
            let cmd = frame.enqueue(first, NameId::NONE)?;
            cmd.update_flags = UpdateFlags::CREATE_PASSES;
            cmd.updated_passes = snapshots;
        }

        let mut sent = Vec::new();
        for (p, pass) in self.passes.iter().enumerate() {
            for (b, batch) in pass.batches.iter().enumerate() {
                if batch.dirty().is_empty() {
                    continue;
                }
                let mut progress = BatchSent::new(p, b);
                let result = record_batch(pass.id(), batch, frame, &mut progress);
                sent.push(progress);
                match result {
                    Ok(()) => {}
                    Err(RenderError::CommandPool(e)) => {
                        tracing::warn!(
                            error = %e,
                            queued = frame.num_cmds(),
                            "command ceiling reached, deferring remaining work"
                        );
                        frame.truncated = true;
                        return Ok(sent);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(sent)
    }

    fn mark_committed(&mut self, sent: &[BatchSent]) {
        for pass in &mut self.passes {
            pass.is_dirty = false;
        }
        for progress in sent {
            let batch = &mut self.passes[progress.pass].batches[progress.batch];
            for &i in &progress.entries {
                batch.mesh_entries[i].is_dirty = false;
            }
            batch.updated_meshes.drain(..progress.updates);
            batch.clear_dirty(progress.flags);
        }
        self.names_sent = self.names.len();
        self.pending_clear = false;
    }
}

/// Which parts of one dirty batch made it into a frame.
#[derive(Debug)]
struct BatchSent {
    pass: usize,
    batch: usize,
    /// Dirty bits whose work went out completely.
    flags: DirtyFlags,
    /// Mesh entries sent as render data.
    entries: Vec<usize>,
    /// Leading `updated_meshes` handled.
    updates: usize,
}

impl BatchSent {
    fn new(pass: usize, batch: usize) -> Self {
        Self {
            pass,
            batch,
            flags: DirtyFlags::NONE,
            entries: Vec::new(),
            updates: 0,
        }
    }
}

/// Enqueues the commands for one batch, noting each part in `sent` as soon
/// as it is queued so a pool rejection leaves an accurate record.
fn record_batch(
    pass: NameId,
    batch: &RenderBatchData,
    frame: &mut Frame,
    sent: &mut BatchSent,
) -> Result<(), RenderError> {
    let dirty = batch.dirty();
    let id = batch.id();

    if dirty.contains(DirtyFlags::MATRIX_BUFFER) {
        let cmd = frame.enqueue(pass, id)?;
        cmd.update_flags = UpdateFlags::UPDATE_MATRIXES;
        cmd.data.extend_from_slice(&batch.matrices.to_bytes());
        sent.flags.insert(DirtyFlags::MATRIX_BUFFER);
    }

    if dirty.contains(DirtyFlags::UNIFORM_BUFFER) {
        let ub = frame.uniform_buffer(pass);
        let start = ub.pos();
        let mut dropped = 0;
        for var in &batch.uniforms {
            if let Err(e) = ub.write_var(var) {
                tracing::warn!(error = %e, pass = ?pass, batch = ?id, uniform = var.name(), "uniform dropped");
                dropped += 1;
            }
        }
        let bytes = ub.written_since(start).to_vec();
        frame.dropped_uniforms += dropped;
        let cmd = frame.enqueue(pass, id)?;
        cmd.update_flags = UpdateFlags::UPDATE_UNIFORMS;
        cmd.data = bytes;
        sent.flags.insert(DirtyFlags::UNIFORM_BUFFER);
    }

    if dirty.contains(DirtyFlags::MESH) {
        for (i, entry) in batch.mesh_entries.iter().enumerate() {
            if !entry.is_dirty {
                continue;
            }
            let cmd = frame.enqueue(pass, id)?;
            cmd.update_flags = UpdateFlags::ADD_RENDER_DATA;
            cmd.new_meshes.extend(
                entry
                    .meshes
                    .iter()
                    .map(|m| MeshUpload::from_mesh(m, entry.num_instances)),
            );
            sent.entries.push(i);
        }
        sent.flags.insert(DirtyFlags::MESH);
    }

    if dirty.contains(DirtyFlags::MESH_UPDATE) {
        for guid in &batch.updated_meshes {
            let found = batch.mesh_entries.iter().find_map(|e| {
                e.meshes
                    .iter()
                    .find(|m| m.guid() == *guid)
                    .map(|m| MeshUpload::from_mesh(m, e.num_instances))
            });
            if let Some(upload) = found {
                let cmd = frame.enqueue(pass, id)?;
                cmd.update_flags = UpdateFlags::UPDATE_BUFFER;
                cmd.mesh_id = *guid;
                cmd.new_meshes.push(upload);
            }
            sent.updates += 1;
        }
        sent.flags.insert(DirtyFlags::MESH_UPDATE);
    }
    Ok(())
}
