use std::sync::Arc;

use framepipe_buffers::{IndexType, PrimitiveGroup};
use framepipe_common::{Guid, NameId};
use framepipe_mesh::{Material, Mesh, VertexType};
use glam::Mat4;

use crate::pass::PassSnapshot;

/// What a submit command asks the render thread to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UpdateFlags(u32);

impl UpdateFlags {
    pub const NONE: Self = Self(0);
    pub const CREATE_PASSES: Self = Self(1);
    pub const UPDATE_BUFFER: Self = Self(2);
    pub const UPDATE_MATRIXES: Self = Self(4);
    pub const UPDATE_UNIFORMS: Self = Self(8);
    pub const ADD_RENDER_DATA: Self = Self(16);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for UpdateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Value copy of a mesh, detached from the producer's buffers.
#[derive(Debug, Clone)]
pub struct MeshUpload {
    pub guid: Guid,
    pub name: String,
    pub vertex_type: VertexType,
    pub index_type: IndexType,
    pub vertices: Vec<u8>,
    pub indices: Vec<u8>,
    pub groups: Vec<PrimitiveGroup>,
    pub material: Option<Arc<Material>>,
    pub model: Option<Mat4>,
    pub num_instances: u32,
}

impl MeshUpload {
    pub fn from_mesh(mesh: &Mesh, num_instances: u32) -> Self {
        Self {
            guid: mesh.guid(),
            name: mesh.name().to_owned(),
            vertex_type: mesh.vertex_type(),
            index_type: mesh.index_type(),
            vertices: mesh.vertices().map(|b| b.data().to_vec()).unwrap_or_default(),
            indices: mesh.indices().map(|b| b.data().to_vec()).unwrap_or_default(),
            groups: mesh.primitive_groups().to_vec(),
            material: mesh.material().cloned(),
            model: mesh.model_matrix(),
            num_instances,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / self.vertex_type.size()
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len() / self.index_type.size()
    }
}

/// One unit of work for the render thread.
///
/// Moved from the frame's pool into its queue, drained by the consumer and
/// handed back to the pool; never copied.
#[derive(Debug, Default)]
pub struct FrameSubmitCmd {
    pub pass_id: NameId,
    pub batch_id: NameId,
    /// Target mesh for [`UpdateFlags::UPDATE_BUFFER`]; invalid otherwise.
    pub mesh_id: Guid,
    pub update_flags: UpdateFlags,
    /// Encoded matrices or uniforms, depending on the flags.
    pub data: Vec<u8>,
    pub new_meshes: Vec<MeshUpload>,
    pub updated_passes: Vec<PassSnapshot>,
}

impl FrameSubmitCmd {
    /// Empties the command, keeping its allocations for reuse.
    pub fn reset(&mut self) {
        self.pass_id = NameId::NONE;
        self.batch_id = NameId::NONE;
        self.mesh_id = Guid::INVALID;
        self.update_flags = UpdateFlags::NONE;
        self.data.clear();
        self.new_meshes.clear();
        self.updated_passes.clear();
    }
}
