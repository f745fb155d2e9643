use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use framepipe_buffers::{IndexType, PrimitiveGroup, PrimitiveType};
use framepipe_common::{Guid, Viewport};
use framepipe_mesh::VertexType;
use framepipe_render::{
    CullMode, DirtyFlags, MeshUpload, Pipeline, PipelinePass, Renderer, RenderScene, SceneBatch,
    ScenePass,
};
use glam::{Mat4, Vec4};
use serde::Serialize;
use wgpu::util::DeviceExt;

use crate::context::{GpuContext, GpuError};
use crate::shaders;

/// Color format of every render target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const COLOR_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
const TEXTURED_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3, 3 => Float32x2];
const UI_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshUniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

impl MeshUniforms {
    fn new(model: Mat4, view: Mat4, proj: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
        }
    }
}

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GpuFrameStats {
    pub frame: u64,
    pub passes: usize,
    pub draw_calls: usize,
    pub meshes_uploaded: usize,
    pub meshes_resident: usize,
    pub skipped_draws: usize,
}

/// Everything that selects a distinct `wgpu::RenderPipeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    vertex_type: VertexType,
    topology: PrimitiveType,
    strip_index: Option<wgpu::IndexFormat>,
    blend: bool,
    has_depth: bool,
    depth_test: bool,
    depth_write: bool,
    cull: CullMode,
}

struct GpuMesh {
    vertex_type: VertexType,
    vertex_buffer: wgpu::Buffer,
    num_vertices: u32,
    index_buffer: Option<(wgpu::Buffer, wgpu::IndexFormat)>,
    groups: Vec<PrimitiveGroup>,
    num_instances: u32,
    model: Mat4,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct RenderTarget {
    width: u32,
    height: u32,
    color: wgpu::TextureView,
    depth: Option<wgpu::TextureView>,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, depth: bool) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = depth.then(|| create_depth_texture(device, width, height));
        Self {
            width: size.width,
            height: size.height,
            color: color.create_view(&Default::default()),
            depth,
        }
    }
}

/// Headless wgpu renderer for a mirrored [`RenderScene`].
///
/// Meshes are uploaded once and kept by guid until the scene drops them or
/// marks them updated. Output goes to an offscreen color target, or to the
/// named [`framepipe_render::FrameBuffer`] a pass asks for.
pub struct WgpuRenderer {
    ctx: GpuContext,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    color_shader: wgpu::ShaderModule,
    textured_shader: wgpu::ShaderModule,
    ui_shader: wgpu::ShaderModule,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    stages: Vec<Pipeline>,
    meshes: HashMap<Guid, GpuMesh>,
    main_target: RenderTarget,
    targets: HashMap<String, RenderTarget>,
    frames: u64,
}

impl WgpuRenderer {
    pub fn new(ctx: GpuContext, width: u32, height: u32) -> Self {
        let device = &ctx.device;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = |label: &str, source: &'static str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let color_shader = shader("color_shader", shaders::COLOR_SHADER);
        let textured_shader = shader("textured_shader", shaders::TEXTURED_SHADER);
        let ui_shader = shader("ui_shader", shaders::UI_SHADER);

        let main_target = RenderTarget::new(device, "main_target", width, height, true);

        Self {
            bind_group_layout,
            pipeline_layout,
            color_shader,
            textured_shader,
            ui_shader,
            pipelines: HashMap::new(),
            stages: vec![Pipeline::default_3d(), Pipeline::default_2d()],
            meshes: HashMap::new(),
            main_target,
            targets: HashMap::new(),
            frames: 0,
            ctx,
        }
    }

    /// Brings up a headless device and a `width` x `height` main target.
    pub fn headless(width: u32, height: u32) -> Result<Self, GpuError> {
        Ok(Self::new(GpuContext::headless()?, width, height))
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.main_target = RenderTarget::new(&self.ctx.device, "main_target", width, height, true);
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.main_target.width, self.main_target.height)
    }

    /// Makes `pipeline` selectable by name from the scene.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) {
        self.stages.retain(|p| p.name() != pipeline.name());
        self.stages.push(pipeline);
    }

    pub fn num_resident_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn num_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Uploads new or updated meshes and drops the ones the scene no longer has.
    fn sync_meshes(&mut self, scene: &RenderScene, stats: &mut GpuFrameStats) {
        let mut live = HashSet::new();
        for batch in scene.passes().iter().flat_map(|p| p.batches.iter()) {
            let refresh = batch.dirty.contains(DirtyFlags::MESH_UPDATE);
            for upload in &batch.meshes {
                live.insert(upload.guid);
                if !refresh && self.meshes.contains_key(&upload.guid) {
                    continue;
                }
                match self.upload_mesh(upload) {
                    Some(mesh) => {
                        self.meshes.insert(upload.guid, mesh);
                        stats.meshes_uploaded += 1;
                    }
                    None => {
                        self.meshes.remove(&upload.guid);
                    }
                }
            }
        }
        let before = self.meshes.len();
        self.meshes.retain(|guid, _| live.contains(guid));
        if self.meshes.len() != before {
            tracing::debug!(dropped = before - self.meshes.len(), "released gpu meshes");
        }
        stats.meshes_resident = self.meshes.len();
    }

    fn upload_mesh(&self, upload: &MeshUpload) -> Option<GpuMesh> {
        let device = &self.ctx.device;
        let num_vertices = upload.num_vertices() as u32;
        if num_vertices == 0 {
            tracing::debug!(mesh = %upload.guid, "mesh has no vertices, not uploading");
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: &upload.vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = index_data(upload.index_type, &upload.indices).map(|(bytes, format)| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: &bytes,
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, format)
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_uniform_buffer"),
            contents: bytemuck::bytes_of(&MeshUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_uniform_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        tracing::trace!(mesh = %upload.guid, name = %upload.name, num_vertices, "uploaded mesh");
        Some(GpuMesh {
            vertex_type: upload.vertex_type,
            vertex_buffer,
            num_vertices,
            index_buffer,
            groups: upload.groups.clone(),
            num_instances: upload.num_instances.max(1),
            model: upload.model.unwrap_or(Mat4::IDENTITY),
            uniform_buffer,
            bind_group,
        })
    }

    fn ensure_pass_target(&mut self, pass: &ScenePass) {
        let Some(fb) = &pass.snapshot.render_target else {
            return;
        };
        let stale = self
            .targets
            .get(&fb.name)
            .is_none_or(|t| t.width != fb.width.max(1) || t.height != fb.height.max(1) || t.depth.is_some() != fb.depth);
        if stale {
            tracing::debug!(target = %fb.name, width = fb.width, height = fb.height, "creating render target");
            let target = RenderTarget::new(&self.ctx.device, &fb.name, fb.width, fb.height, fb.depth);
            self.targets.insert(fb.name.clone(), target);
        }
    }

    fn target_for(&self, pass: &ScenePass) -> &RenderTarget {
        pass.snapshot
            .render_target
            .as_ref()
            .and_then(|fb| self.targets.get(&fb.name))
            .unwrap_or(&self.main_target)
    }

    fn pipeline_key(&self, mesh: &GpuMesh, group: &PrimitiveGroup, stage: &PipelinePass, has_depth: bool) -> PipelineKey {
        let strip = matches!(group.primitive(), PrimitiveType::LineStrip | PrimitiveType::TriangleStrip);
        PipelineKey {
            vertex_type: mesh.vertex_type,
            topology: group.primitive(),
            strip_index: if strip { mesh.index_buffer.as_ref().map(|(_, f)| *f) } else { None },
            blend: stage.alpha_blend,
            has_depth,
            depth_test: stage.depth_test,
            depth_write: stage.depth_write,
            cull: stage.cull,
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(topology) = topology(key.topology) else {
            return;
        };
        let (module, stride, attributes): (_, _, &[wgpu::VertexAttribute]) = match key.vertex_type {
            VertexType::ColorVertex => (&self.color_shader, VertexType::ColorVertex.size(), &COLOR_ATTRS),
            VertexType::RenderVertex => (&self.textured_shader, VertexType::RenderVertex.size(), &TEXTURED_ATTRS),
            VertexType::UiVertex => (&self.ui_shader, VertexType::UiVertex.size(), &UI_ATTRS),
        };
        tracing::debug!(?key, "creating render pipeline");

        let pipeline = self.ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(if key.blend {
                        wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        wgpu::BlendState::REPLACE
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: key.strip_index,
                cull_mode: match key.cull {
                    CullMode::None => None,
                    CullMode::Back => Some(wgpu::Face::Back),
                    CullMode::Front => Some(wgpu::Face::Front),
                },
                ..Default::default()
            },
            depth_stencil: key.has_depth.then(|| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_write,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline);
    }

    fn stage_pipeline(&self, name: Option<&str>) -> Option<Pipeline> {
        let by_name = name.and_then(|n| self.stages.iter().find(|p| p.name() == n));
        if by_name.is_none() && name.is_some() {
            tracing::warn!(pipeline = name, "unknown pipeline, using default");
        }
        by_name.or_else(|| self.stages.first()).cloned()
    }

    /// Render one frame of `scene` through the pipeline it names.
    pub fn render_scene(&mut self, scene: &RenderScene) -> GpuFrameStats {
        self.frames += 1;
        let _span = tracing::debug_span!("wgpu_render", frame = self.frames).entered();
        let mut stats = GpuFrameStats {
            frame: self.frames,
            passes: scene.passes().len(),
            ..GpuFrameStats::default()
        };

        self.sync_meshes(scene, &mut stats);
        let Some(mut pipeline) = self.stage_pipeline(scene.pipeline()) else {
            return stats;
        };
        let stages: Vec<PipelinePass> = pipeline.passes().to_vec();

        // Everything below only reads `self`, so targets and pipelines come first.
        for pass in scene.passes() {
            self.ensure_pass_target(pass);
        }
        for stage in &stages {
            for pass in scene.passes() {
                let has_depth = self.target_for(pass).depth.is_some();
                for batch in &pass.batches {
                    for upload in &batch.meshes {
                        let Some(mesh) = self.meshes.get(&upload.guid) else {
                            continue;
                        };
                        let keys: Vec<PipelineKey> = mesh
                            .groups
                            .iter()
                            .map(|g| self.pipeline_key(mesh, g, stage, has_depth))
                            .collect();
                        for key in keys {
                            self.ensure_pipeline(key);
                        }
                    }
                }
            }
        }
        for pass in scene.passes() {
            for batch in &pass.batches {
                self.write_uniforms(pass, batch);
            }
        }

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        let mut cleared: HashSet<Option<&str>> = HashSet::new();

        let count = pipeline.begin_frame();
        for i in 0..count {
            let Some(stage) = pipeline.begin_pass(i).cloned() else {
                continue;
            };
            for pass in scene.passes() {
                let key = pass.snapshot.render_target.as_ref().map(|fb| fb.name.as_str());
                let first_use = cleared.insert(key);
                self.encode_pass(&mut encoder, pass, &stage, first_use, &mut stats);
            }
            pipeline.end_pass(i);
        }
        if !pipeline.end_frame() {
            tracing::warn!(pipeline = pipeline.name(), "pipeline stages left unbalanced");
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        let _ = self.ctx.device.poll(wgpu::Maintain::Wait);
        tracing::trace!(?stats, "frame rendered");
        stats
    }

    fn write_uniforms(&self, pass: &ScenePass, batch: &SceneBatch) {
        let (view, proj) = resolve_camera(pass, batch);
        for upload in &batch.meshes {
            if let Some(mesh) = self.meshes.get(&upload.guid) {
                let uniforms = MeshUniforms::new(batch.matrices.model * mesh.model, view, proj);
                self.ctx
                    .queue
                    .write_buffer(&mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
            }
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &ScenePass,
        stage: &PipelinePass,
        first_use: bool,
        stats: &mut GpuFrameStats,
    ) {
        let target = self.target_for(pass);
        let color_load = if first_use {
            let c = stage.clear_color.unwrap_or(Vec4::new(0.0, 0.0, 0.0, 1.0));
            wgpu::LoadOp::Clear(wgpu::Color {
                r: c.x as f64,
                g: c.y as f64,
                b: c.z as f64,
                a: c.w as f64,
            })
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if first_use {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: target.depth.as_ref().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            ..Default::default()
        });

        if let Some((x, y, w, h)) = clamp_viewport(pass.snapshot.viewport, target.width, target.height) {
            rpass.set_viewport(x, y, w, h, 0.0, 1.0);
        }

        let has_depth = target.depth.is_some();
        for batch in &pass.batches {
            for upload in &batch.meshes {
                let Some(mesh) = self.meshes.get(&upload.guid) else {
                    continue;
                };
                rpass.set_bind_group(0, &mesh.bind_group, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                if let Some((buffer, format)) = &mesh.index_buffer {
                    rpass.set_index_buffer(buffer.slice(..), *format);
                }
                for group in &mesh.groups {
                    let key = self.pipeline_key(mesh, group, stage, has_depth);
                    let Some(pipeline) = self.pipelines.get(&key) else {
                        tracing::warn!(primitive = ?group.primitive(), "no pipeline for primitive, skipping draw");
                        stats.skipped_draws += 1;
                        continue;
                    };
                    rpass.set_pipeline(pipeline);
                    let instances = 0..mesh.num_instances;
                    if mesh.index_buffer.is_some() {
                        rpass.draw_indexed(group.start_index()..group.end_index(), 0, instances);
                    } else {
                        let end = group.end_index().min(mesh.num_vertices);
                        rpass.draw(group.start_index()..end, instances);
                    }
                    stats.draw_calls += 1;
                }
            }
        }
    }
}

impl Renderer for WgpuRenderer {
    type Output = GpuFrameStats;

    fn render(&mut self, scene: &RenderScene) -> GpuFrameStats {
        self.render_scene(scene)
    }
}

impl std::fmt::Debug for WgpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuRenderer")
            .field("ctx", &self.ctx)
            .field("meshes", &self.meshes.len())
            .field("pipelines", &self.pipelines.len())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

/// wgpu has no fans.
fn topology(primitive: PrimitiveType) -> Option<wgpu::PrimitiveTopology> {
    match primitive {
        PrimitiveType::PointList => Some(wgpu::PrimitiveTopology::PointList),
        PrimitiveType::LineList => Some(wgpu::PrimitiveTopology::LineList),
        PrimitiveType::LineStrip => Some(wgpu::PrimitiveTopology::LineStrip),
        PrimitiveType::TriangleList => Some(wgpu::PrimitiveTopology::TriangleList),
        PrimitiveType::TriangleStrip => Some(wgpu::PrimitiveTopology::TriangleStrip),
        PrimitiveType::TriangleFan => None,
    }
}

/// Index bytes in a width wgpu accepts. Byte indices are widened to 16 bits.
fn index_data(index_type: IndexType, bytes: &[u8]) -> Option<(Vec<u8>, wgpu::IndexFormat)> {
    if bytes.is_empty() {
        return None;
    }
    match index_type {
        IndexType::UnsignedByte => {
            let widened = bytes.iter().flat_map(|b| u16::from(*b).to_le_bytes()).collect();
            Some((widened, wgpu::IndexFormat::Uint16))
        }
        IndexType::UnsignedShort => Some((bytes.to_vec(), wgpu::IndexFormat::Uint16)),
        IndexType::UnsignedInt => Some((bytes.to_vec(), wgpu::IndexFormat::Uint32)),
    }
}

/// A batch's own view or projection wins over the pass camera once set.
fn resolve_camera(pass: &ScenePass, batch: &SceneBatch) -> (Mat4, Mat4) {
    let view = if batch.matrices.view != Mat4::IDENTITY {
        batch.matrices.view
    } else {
        pass.snapshot.view
    };
    let proj = if batch.matrices.proj != Mat4::IDENTITY {
        batch.matrices.proj
    } else {
        pass.snapshot.proj
    };
    (view, proj)
}

/// Viewport clipped to the target; `None` means the whole target.
fn clamp_viewport(vp: Viewport, width: u32, height: u32) -> Option<(f32, f32, f32, f32)> {
    if vp.is_full_target() {
        return None;
    }
    let x = vp.x.clamp(0, width as i32 - 1);
    let y = vp.y.clamp(0, height as i32 - 1);
    let w = vp.width.min(width as i32 - x).max(1);
    let h = vp.height.min(height as i32 - y).max(1);
    Some((x as f32, y as f32, w as f32, h as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepipe_buffers::BufferAccess;
    use framepipe_mesh::{MeshBuilder, ResourceContext};
    use framepipe_render::{MatrixType, RenderBackendService};
    use glam::Vec3;

    #[test]
    fn fans_have_no_topology() {
        assert!(topology(PrimitiveType::TriangleFan).is_none());
        assert_eq!(
            topology(PrimitiveType::LineStrip),
            Some(wgpu::PrimitiveTopology::LineStrip)
        );
    }

    #[test]
    fn byte_indices_widen() {
        let (bytes, format) = index_data(IndexType::UnsignedByte, &[0, 1, 255]).unwrap();
        assert_eq!(format, wgpu::IndexFormat::Uint16);
        assert_eq!(bytes, vec![0, 0, 1, 0, 255, 0]);
        assert!(index_data(IndexType::UnsignedInt, &[]).is_none());
    }

    #[test]
    fn viewport_clamped_to_target() {
        assert_eq!(clamp_viewport(Viewport::default(), 100, 100), None);
        assert_eq!(
            clamp_viewport(Viewport::new(50, 50, 200, 200), 100, 100),
            Some((50.0, 50.0, 50.0, 50.0))
        );
    }

    #[test]
    fn uniforms_are_three_matrices() {
        assert_eq!(std::mem::size_of::<MeshUniforms>(), 192);
    }

    fn scene_with_cube() -> RenderScene {
        let mut ctx = ResourceContext::new();
        let mut svc = RenderBackendService::default();
        svc.create_default_3d_pipeline();
        svc.begin_pass("main").unwrap();
        svc.set_pass_camera(
            Mat4::look_at_rh(Vec3::new(2.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
            Mat4::perspective_rh(1.0, 1.0, 0.1, 50.0),
        )
        .unwrap();
        svc.begin_render_batch("opaque").unwrap();
        svc.set_matrix(MatrixType::Model, Mat4::IDENTITY).unwrap();
        let cube = MeshBuilder::new(&mut ctx)
            .create_cube(VertexType::ColorVertex, 1.0, 1.0, 1.0, BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();
        svc.add_mesh(cube, 1).unwrap();
        let mut frame = svc.commit_next_frame().unwrap();
        let mut scene = RenderScene::new();
        scene.apply(&mut frame).unwrap();
        scene
    }

    #[test]
    fn pass_camera_used_without_batch_override() {
        let scene = scene_with_cube();
        let pass = &scene.passes()[0];
        let (view, _) = resolve_camera(pass, &pass.batches[0]);
        assert_eq!(view, pass.snapshot.view);
    }

    // Needs a GPU adapter; passes trivially on machines without one.
    #[test]
    fn headless_frame_draws_cube() {
        let Ok(mut renderer) = WgpuRenderer::headless(64, 64) else {
            return;
        };
        let mut scene = scene_with_cube();
        let stats = renderer.render(&scene);
        assert_eq!(stats.meshes_uploaded, 1);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(renderer.num_resident_meshes(), 1);

        scene.clear_dirty();
        let stats = renderer.render(&scene);
        assert_eq!(stats.meshes_uploaded, 0);
        assert_eq!(stats.frame, 2);
    }
}
