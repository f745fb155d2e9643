use bytemuck::{Pod, Zeroable};
use framepipe_buffers::{VertComponent, VertexAttribute, VertexFormat, VertexLayout};
use glam::{Vec2, Vec3, Vec4};

/// Interleaved vertex formats understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexType {
    /// Position, normal, color.
    #[default]
    ColorVertex,
    /// Position, normal, color, one texture coordinate.
    RenderVertex,
    /// 2D position and RGBA color.
    UiVertex,
}

impl VertexType {
    /// Bytes per vertex.
    pub fn size(self) -> usize {
        match self {
            Self::ColorVertex => std::mem::size_of::<ColorVert>(),
            Self::RenderVertex => std::mem::size_of::<RenderVert>(),
            Self::UiVertex => std::mem::size_of::<UiVert>(),
        }
    }

    pub fn layout(self) -> VertexLayout {
        let comps: &[VertComponent] = match self {
            Self::ColorVertex => &ColorVert::COMPONENTS,
            Self::RenderVertex => &RenderVert::COMPONENTS,
            Self::UiVertex => &UiVert::COMPONENTS,
        };
        let mut layout = VertexLayout::new();
        for c in comps {
            layout.add(*c);
        }
        layout
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVert {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color0: [f32; 3],
}

impl ColorVert {
    pub const COMPONENTS: [VertComponent; 3] = [
        VertComponent::new(VertexAttribute::Position, VertexFormat::Float3),
        VertComponent::new(VertexAttribute::Normal, VertexFormat::Float3),
        VertComponent::new(VertexAttribute::Color0, VertexFormat::Float3),
    ];

    pub fn new(position: Vec3, normal: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color0: color.to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct RenderVert {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color0: [f32; 3],
    pub tex0: [f32; 2],
}

impl RenderVert {
    pub const COMPONENTS: [VertComponent; 4] = [
        VertComponent::new(VertexAttribute::Position, VertexFormat::Float3),
        VertComponent::new(VertexAttribute::Normal, VertexFormat::Float3),
        VertComponent::new(VertexAttribute::Color0, VertexFormat::Float3),
        VertComponent::new(VertexAttribute::TexCoord0, VertexFormat::Float2),
    ];

    pub fn new(position: Vec3, normal: Vec3, color: Vec3, tex0: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color0: color.to_array(),
            tex0: tex0.to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UiVert {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl UiVert {
    pub const COMPONENTS: [VertComponent; 2] = [
        VertComponent::new(VertexAttribute::Position, VertexFormat::Float2),
        VertComponent::new(VertexAttribute::Color0, VertexFormat::Float4),
    ];

    pub fn new(position: Vec2, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}
