use glam::Vec4;

pub const DEFAULT_3D_PIPELINE: &str = "pipeline.default.3d";
pub const DEFAULT_2D_PIPELINE: &str = "pipeline.default.2d";

/// Face culling mode of a pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

/// Fixed-function state for one stage of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePass {
    pub name: String,
    pub clear_color: Option<Vec4>,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull: CullMode,
    pub alpha_blend: bool,
}

impl PipelinePass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            clear_color: Some(Vec4::new(0.1, 0.1, 0.15, 1.0)),
            depth_test: true,
            depth_write: true,
            cull: CullMode::Back,
            alpha_blend: false,
        }
    }
}

/// Ordered stages every frame runs through.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    name: String,
    passes: Vec<PipelinePass>,
    current: Option<usize>,
    in_frame: bool,
}

impl Pipeline {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            passes: Vec::new(),
            current: None,
            in_frame: false,
        }
    }

    /// Single depth-tested, back-face-culled stage.
    pub fn default_3d() -> Self {
        let mut p = Self::new(DEFAULT_3D_PIPELINE);
        p.add_pass(PipelinePass::new("render_pass.3d"));
        p
    }

    /// Single blended stage without depth, for overlays.
    pub fn default_2d() -> Self {
        let mut p = Self::new(DEFAULT_2D_PIPELINE);
        p.add_pass(PipelinePass {
            clear_color: None,
            depth_test: false,
            depth_write: false,
            cull: CullMode::None,
            alpha_blend: true,
            ..PipelinePass::new("render_pass.2d")
        });
        p
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_pass(&mut self, pass: PipelinePass) {
        self.passes.push(pass);
    }

    pub fn passes(&self) -> &[PipelinePass] {
        &self.passes
    }

    /// Starts a frame; returns the number of stages to run.
    pub fn begin_frame(&mut self) -> usize {
        self.in_frame = true;
        self.current = None;
        self.passes.len()
    }

    pub fn begin_pass(&mut self, index: usize) -> Option<&PipelinePass> {
        if !self.in_frame || index >= self.passes.len() {
            return None;
        }
        self.current = Some(index);
        self.passes.get(index)
    }

    /// Ends stage `index`. False when it was not the active stage.
    pub fn end_pass(&mut self, index: usize) -> bool {
        if self.current != Some(index) {
            return false;
        }
        self.current = None;
        true
    }

    pub fn end_frame(&mut self) -> bool {
        let was = self.in_frame && self.current.is_none();
        self.in_frame = false;
        self.current = None;
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p3 = Pipeline::default_3d();
        assert_eq!(p3.name(), DEFAULT_3D_PIPELINE);
        assert!(p3.passes()[0].depth_test);

        let p2 = Pipeline::default_2d();
        assert!(!p2.passes()[0].depth_test);
        assert!(p2.passes()[0].alpha_blend);
    }

    #[test]
    fn pass_outside_frame_refused() {
        let mut p = Pipeline::default_3d();
        assert!(p.begin_pass(0).is_none());
        assert_eq!(p.begin_frame(), 1);
        assert!(p.begin_pass(1).is_none());
        assert!(p.begin_pass(0).is_some());
        // ending the frame with a stage still open reports the imbalance
        assert!(!p.end_frame());
    }

    #[test]
    fn balanced_frame() {
        let mut p = Pipeline::default_3d();
        let n = p.begin_frame();
        for i in 0..n {
            assert!(p.begin_pass(i).is_some());
            assert!(p.end_pass(i));
        }
        assert!(p.end_frame());
        assert!(!p.end_pass(0));
    }
}
