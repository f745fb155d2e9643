use framepipe_common::{BlockPool, NameId, PoolStats};
use framepipe_uniform::UniformBuffer;

use crate::RenderError;
use crate::config::FrameConfig;
use crate::pass::PassSnapshot;
use crate::submit::FrameSubmitCmd;

/// Everything the render thread needs for one frame, handed over by value.
#[derive(Debug)]
pub struct Frame {
    /// Passes created or changed since the previous frame.
    pub new_passes: Vec<PassSnapshot>,
    /// Names interned on the producer since the previous frame.
    pub names: Vec<(NameId, String)>,
    /// Pipeline the consumer should run the passes through.
    pub pipeline: Option<String>,
    /// Consumer drops every mirrored pass before applying this frame.
    pub clear_scene: bool,
    /// The command ceiling was hit while recording. Work that did not fit
    /// stays dirty on the producer and goes out with a later frame.
    pub truncated: bool,
    /// Uniform writes refused by a full pass uniform buffer.
    pub dropped_uniforms: usize,
    submit_cmds: Vec<FrameSubmitCmd>,
    cmd_pool: BlockPool<FrameSubmitCmd>,
    uniform_buffers: Vec<(NameId, UniformBuffer)>,
    uniform_buffer_size: usize,
    sequence: u64,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(&FrameConfig::default())
    }
}

impl Frame {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            new_passes: Vec::new(),
            names: Vec::new(),
            pipeline: None,
            clear_scene: false,
            truncated: false,
            dropped_uniforms: 0,
            submit_cmds: Vec::new(),
            cmd_pool: BlockPool::new(config.command_capacity, config.command_policy),
            uniform_buffers: Vec::new(),
            uniform_buffer_size: config.uniform_buffer_size,
            sequence: 0,
        }
    }

    /// Starts a new frame. Stale commands are dropped and every pass in
    /// `new_passes` gets a cleared uniform buffer.
    pub fn init(&mut self, sequence: u64, new_passes: Vec<PassSnapshot>) {
        self.reset();
        self.sequence = sequence;
        for pass in &new_passes {
            self.uniform_buffer(pass.id);
        }
        self.new_passes = new_passes;
    }

    /// Drops queued commands and frame metadata. Uniform buffers are kept
    /// but rewound.
    pub fn reset(&mut self) {
        if !self.submit_cmds.is_empty() {
            tracing::debug!(
                dropped = self.submit_cmds.len(),
                sequence = self.sequence,
                "dropping undrained submit commands"
            );
        }
        for mut cmd in self.submit_cmds.drain(..) {
            cmd.reset();
            self.cmd_pool.release(cmd);
        }
        for (_, ub) in &mut self.uniform_buffers {
            ub.clear();
        }
        self.new_passes.clear();
        self.names.clear();
        self.pipeline = None;
        self.clear_scene = false;
        self.truncated = false;
        self.dropped_uniforms = 0;
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Queues a fresh command for `pass`/`batch` and returns it for filling.
    pub fn enqueue(
        &mut self,
        pass: NameId,
        batch: NameId,
    ) -> Result<&mut FrameSubmitCmd, RenderError> {
        let mut cmd = self.cmd_pool.acquire_with(FrameSubmitCmd::default)?;
        cmd.reset();
        cmd.pass_id = pass;
        cmd.batch_id = batch;
        self.submit_cmds.push(cmd);
        tracing::trace!(?pass, ?batch, queued = self.submit_cmds.len(), "submit command queued");
        let last = self.submit_cmds.len() - 1;
        Ok(&mut self.submit_cmds[last])
    }

    pub fn submit_cmds(&self) -> &[FrameSubmitCmd] {
        &self.submit_cmds
    }

    pub fn num_cmds(&self) -> usize {
        self.submit_cmds.len()
    }

    /// Hands every queued command to `f` in enqueue order, then recycles it.
    pub fn drain(&mut self, mut f: impl FnMut(&mut FrameSubmitCmd)) -> usize {
        let count = self.submit_cmds.len();
        for mut cmd in self.submit_cmds.drain(..) {
            f(&mut cmd);
            cmd.reset();
            self.cmd_pool.release(cmd);
        }
        count
    }

    /// Uniform buffer of `pass`, allocated on first use.
    pub fn uniform_buffer(&mut self, pass: NameId) -> &mut UniformBuffer {
        let idx = match self.uniform_buffers.iter().position(|(id, _)| *id == pass) {
            Some(i) => i,
            None => {
                self.uniform_buffers
                    .push((pass, UniformBuffer::create(self.uniform_buffer_size)));
                self.uniform_buffers.len() - 1
            }
        };
        &mut self.uniform_buffers[idx].1
    }

    pub fn num_uniform_buffers(&self) -> usize {
        self.uniform_buffers.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.cmd_pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::UpdateFlags;
    use framepipe_common::{PoolError, PoolPolicy, Viewport};
    use glam::Mat4;

    fn config(capacity: usize, policy: PoolPolicy) -> FrameConfig {
        FrameConfig {
            command_capacity: capacity,
            command_policy: policy,
            uniform_buffer_size: 1024,
            ..FrameConfig::default()
        }
    }

    fn snapshot(id: u32) -> PassSnapshot {
        PassSnapshot {
            id: NameId(id),
            render_target: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            viewport: Viewport::default(),
            batch_ids: Vec::new(),
        }
    }

    #[test]
    fn init_allocates_uniform_buffer_per_pass() {
        let mut frame = Frame::new(&config(8, PoolPolicy::Reject));
        frame.init(1, vec![snapshot(0), snapshot(1)]);
        assert_eq!(frame.num_uniform_buffers(), 2);
        assert_eq!(frame.uniform_buffer(NameId(1)).capacity(), 1024);
        assert_eq!(frame.sequence(), 1);
    }

    #[test]
    fn drain_preserves_enqueue_order() {
        let mut frame = Frame::new(&config(8, PoolPolicy::Reject));
        for i in 0..4 {
            frame.enqueue(NameId(0), NameId(i)).unwrap().update_flags = UpdateFlags::UPDATE_MATRIXES;
        }
        let mut seen = Vec::new();
        let n = frame.drain(|cmd| seen.push(cmd.batch_id));
        assert_eq!(n, 4);
        assert_eq!(seen, vec![NameId(0), NameId(1), NameId(2), NameId(3)]);
        assert_eq!(frame.num_cmds(), 0);
        assert_eq!(frame.stats().in_use, 0);
    }

    #[test]
    fn reject_past_ceiling() {
        let mut frame = Frame::new(&config(500, PoolPolicy::Reject));
        for i in 0..500 {
            frame.enqueue(NameId(0), NameId(i)).unwrap();
        }
        let err = frame.enqueue(NameId(0), NameId(500)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::CommandPool(PoolError::Exhausted { capacity: 500 })
        ));
        assert_eq!(frame.num_cmds(), 500);
    }

    #[test]
    fn grow_past_ceiling_is_counted() {
        let mut frame = Frame::new(&config(2, PoolPolicy::Grow));
        for i in 0..3 {
            frame.enqueue(NameId(0), NameId(i)).unwrap();
        }
        let stats = frame.stats();
        assert_eq!(stats.grow_count, 1);
        assert_eq!(stats.high_water, 3);
    }

    #[test]
    fn reset_clears_truncation_marks() {
        let mut frame = Frame::new(&config(4, PoolPolicy::Reject));
        frame.truncated = true;
        frame.dropped_uniforms = 3;
        frame.reset();
        assert!(!frame.truncated);
        assert_eq!(frame.dropped_uniforms, 0);
    }

    #[test]
    fn init_drops_stale_commands() {
        let mut frame = Frame::new(&config(4, PoolPolicy::Reject));
        frame.enqueue(NameId(0), NameId(0)).unwrap();
        frame.uniform_buffer(NameId(0)).write(&[1, 2, 3]);
        frame.init(2, Vec::new());
        assert_eq!(frame.num_cmds(), 0);
        assert_eq!(frame.stats().in_use, 0);
        assert_eq!(frame.uniform_buffer(NameId(0)).pos(), 0);
    }

    #[test]
    fn recycled_commands_come_back_clean() {
        let mut frame = Frame::new(&config(1, PoolPolicy::Reject));
        let cmd = frame.enqueue(NameId(1), NameId(2)).unwrap();
        cmd.data.extend_from_slice(&[9; 16]);
        cmd.update_flags = UpdateFlags::UPDATE_UNIFORMS;
        frame.drain(|_| {});

        let cmd = frame.enqueue(NameId(3), NameId(4)).unwrap();
        assert!(cmd.data.is_empty());
        assert_eq!(cmd.update_flags, UpdateFlags::NONE);
        assert_eq!(cmd.pass_id, NameId(3));
    }
}
