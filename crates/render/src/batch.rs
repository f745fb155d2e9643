use framepipe_common::{Guid, NameId};
use framepipe_mesh::Mesh;
use framepipe_uniform::{UniformError, UniformVar, floats_to_le, mats_from_le};
use glam::Mat4;

/// Which transform slot a matrix goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixType {
    Model,
    View,
    Projection,
}

/// Pending-work bits of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirtyFlags(u32);

impl DirtyFlags {
    pub const NONE: Self = Self(0);
    pub const MATRIX_BUFFER: Self = Self(1);
    pub const UNIFORM_BUFFER: Self = Self(2);
    pub const MESH: Self = Self(4);
    pub const MESH_UPDATE: Self = Self(8);
    pub const ALL: Self = Self(1 | 2 | 4 | 8);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for DirtyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DirtyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Model, view and projection transforms of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixBuffer {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl Default for MatrixBuffer {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }
}

impl MatrixBuffer {
    /// Encoded size: three column-major 4x4 float matrices.
    pub const BYTES: usize = 3 * 64;

    pub fn set(&mut self, ty: MatrixType, m: Mat4) {
        match ty {
            MatrixType::Model => self.model = m,
            MatrixType::View => self.view = m,
            MatrixType::Projection => self.proj = m,
        }
    }

    pub fn get(&self, ty: MatrixType) -> Mat4 {
        match ty {
            MatrixType::Model => self.model,
            MatrixType::View => self.view,
            MatrixType::Projection => self.proj,
        }
    }

    /// `model | view | proj`, each column-major little-endian f32.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut floats = Vec::with_capacity(48);
        floats.extend_from_slice(&self.model.to_cols_array());
        floats.extend_from_slice(&self.view.to_cols_array());
        floats.extend_from_slice(&self.proj.to_cols_array());
        floats_to_le(&floats)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::BYTES {
            return None;
        }
        match mats_from_le(bytes)[..] {
            [model, view, proj] => Some(Self { model, view, proj }),
            _ => None,
        }
    }
}

/// Meshes drawn together with a shared instance count.
#[derive(Debug, Default)]
pub struct MeshEntry {
    pub num_instances: u32,
    pub meshes: Vec<Mesh>,
    /// Not yet sent to the render thread.
    pub is_dirty: bool,
}

/// Meshes, transforms and uniforms drawn with one state setup.
#[derive(Debug, Default)]
pub struct RenderBatchData {
    id: NameId,
    pub matrices: MatrixBuffer,
    pub uniforms: Vec<UniformVar>,
    pub mesh_entries: Vec<MeshEntry>,
    /// Meshes whose contents changed since the last commit.
    pub updated_meshes: Vec<Guid>,
    dirty: DirtyFlags,
}

impl RenderBatchData {
    pub fn new(id: NameId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> NameId {
        self.id
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn is_dirty(&self, flags: DirtyFlags) -> bool {
        self.dirty.intersects(flags)
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    /// Clears `flags` once the matching work has been handed off.
    pub fn clear_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.remove(flags);
    }

    pub fn set_matrix(&mut self, ty: MatrixType, m: Mat4) {
        self.matrices.set(ty, m);
        self.mark_dirty(DirtyFlags::MATRIX_BUFFER);
    }

    /// Adds `var`, replacing a uniform of the same name.
    pub fn set_uniform(&mut self, var: UniformVar) {
        match self.uniforms.iter_mut().find(|u| u.name() == var.name()) {
            Some(slot) => *slot = var,
            None => self.uniforms.push(var),
        }
        self.mark_dirty(DirtyFlags::UNIFORM_BUFFER);
    }

    pub fn set_matrix_array(&mut self, name: &str, matrices: &[Mat4]) -> Result<(), UniformError> {
        let var = UniformVar::mat4_array(name, matrices)?;
        self.set_uniform(var);
        Ok(())
    }

    pub fn add_meshes(&mut self, meshes: Vec<Mesh>, num_instances: u32) {
        self.mesh_entries.push(MeshEntry {
            num_instances,
            meshes,
            is_dirty: true,
        });
        self.mark_dirty(DirtyFlags::MESH);
    }

    pub fn add_mesh(&mut self, mesh: Mesh, num_instances: u32) {
        self.add_meshes(vec![mesh], num_instances);
    }

    pub fn mesh_mut(&mut self, guid: Guid) -> Option<&mut Mesh> {
        self.mesh_entries
            .iter_mut()
            .flat_map(|e| e.meshes.iter_mut())
            .find(|m| m.guid() == guid)
    }

    pub fn contains_mesh(&self, guid: Guid) -> bool {
        self.mesh_entries
            .iter()
            .flat_map(|e| e.meshes.iter())
            .any(|m| m.guid() == guid)
    }

    /// Flags a mesh of this batch for re-upload. False when it is not here.
    pub fn update_mesh(&mut self, guid: Guid) -> bool {
        if !self.contains_mesh(guid) {
            return false;
        }
        if !self.updated_meshes.contains(&guid) {
            self.updated_meshes.push(guid);
        }
        self.mark_dirty(DirtyFlags::MESH_UPDATE);
        true
    }

    /// Entry holding a mesh called `name`.
    pub fn mesh_entry_by_name(&self, name: &str) -> Option<&MeshEntry> {
        self.mesh_entries
            .iter()
            .find(|e| e.meshes.iter().any(|m| m.name() == name))
    }

    pub fn var_by_name(&self, name: &str) -> Option<&UniformVar> {
        self.uniforms.iter().find(|u| u.name() == name)
    }
}
