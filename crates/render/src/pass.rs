use framepipe_common::{NameId, Viewport};
use glam::Mat4;

use crate::batch::RenderBatchData;

/// Offscreen render target description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
}

impl FrameBuffer {
    pub fn new(name: &str, width: u32, height: u32, depth: bool) -> Self {
        Self {
            name: name.to_owned(),
            width,
            height,
            depth,
        }
    }
}

/// Batches rendered into one target with one camera and viewport.
#[derive(Debug)]
pub struct PassData {
    id: NameId,
    pub render_target: Option<FrameBuffer>,
    pub batches: Vec<RenderBatchData>,
    pub view: Mat4,
    pub proj: Mat4,
    pub viewport: Viewport,
    /// Pass description changed since it was last sent.
    pub is_dirty: bool,
}

impl PassData {
    pub fn new(id: NameId) -> Self {
        Self {
            id,
            render_target: None,
            batches: Vec::new(),
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            viewport: Viewport::default(),
            is_dirty: true,
        }
    }

    pub fn id(&self) -> NameId {
        self.id
    }

    pub fn batch_by_id(&self, id: NameId) -> Option<&RenderBatchData> {
        self.batches.iter().find(|b| b.id() == id)
    }

    pub fn batch_by_id_mut(&mut self, id: NameId) -> Option<&mut RenderBatchData> {
        self.batches.iter_mut().find(|b| b.id() == id)
    }

    /// Index of batch `id`, creating it at the end when missing.
    pub fn ensure_batch(&mut self, id: NameId) -> usize {
        match self.batches.iter().position(|b| b.id() == id) {
            Some(i) => i,
            None => {
                self.batches.push(RenderBatchData::new(id));
                self.is_dirty = true;
                self.batches.len() - 1
            }
        }
    }

    /// Value copy of the pass description for the render thread.
    pub fn snapshot(&self) -> PassSnapshot {
        PassSnapshot {
            id: self.id,
            render_target: self.render_target.clone(),
            view: self.view,
            proj: self.proj,
            viewport: self.viewport,
            batch_ids: self.batches.iter().map(RenderBatchData::id).collect(),
        }
    }
}

/// Pass description as carried by a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSnapshot {
    pub id: NameId,
    pub render_target: Option<FrameBuffer>,
    pub view: Mat4,
    pub proj: Mat4,
    pub viewport: Viewport,
    pub batch_ids: Vec<NameId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pass_is_dirty_with_default_viewport() {
        let p = PassData::new(NameId(3));
        assert!(p.is_dirty);
        assert_eq!(p.viewport, Viewport::new(-1, -1, -1, -1));
        assert!(p.render_target.is_none());
    }

    #[test]
    fn ensure_batch_is_idempotent() {
        let mut p = PassData::new(NameId(0));
        p.is_dirty = false;
        let a = p.ensure_batch(NameId(1));
        assert!(p.is_dirty);
        p.is_dirty = false;
        let b = p.ensure_batch(NameId(1));
        assert_eq!(a, b);
        assert!(!p.is_dirty);
        assert_eq!(p.batches.len(), 1);
    }

    #[test]
    fn batch_lookup() {
        let mut p = PassData::new(NameId(0));
        p.ensure_batch(NameId(5));
        p.ensure_batch(NameId(6));
        assert_eq!(p.batch_by_id(NameId(6)).map(|b| b.id()), Some(NameId(6)));
        assert!(p.batch_by_id(NameId(7)).is_none());
    }

    #[test]
    fn snapshot_lists_batches_in_order() {
        let mut p = PassData::new(NameId(0));
        p.ensure_batch(NameId(2));
        p.ensure_batch(NameId(1));
        p.render_target = Some(FrameBuffer::new("shadow", 512, 512, true));
        let s = p.snapshot();
        assert_eq!(s.batch_ids, vec![NameId(2), NameId(1)]);
        assert_eq!(s.render_target.unwrap().width, 512);
    }
}
