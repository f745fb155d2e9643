use std::sync::Arc;

use framepipe_buffers::{
    BufferAccess, BufferData, BufferKind, BufferPool, IndexType, PrimitiveGroup,
};
use framepipe_common::Guid;
use glam::Mat4;

use crate::MeshError;
use crate::material::Material;
use crate::vertex::VertexType;

/// Geometry plus the state needed to draw it: vertex and index buffers,
/// primitive groups, material and an optional local transform.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    guid: Guid,
    vertex_type: VertexType,
    index_type: IndexType,
    vertices: Option<BufferData>,
    indices: Option<BufferData>,
    groups: Vec<PrimitiveGroup>,
    material: Option<Arc<Material>>,
    model: Option<Mat4>,
    last_index: u32,
}

impl Mesh {
    pub fn new(name: &str, guid: Guid, vertex_type: VertexType, index_type: IndexType) -> Self {
        Self {
            name: name.to_owned(),
            guid,
            vertex_type,
            index_type,
            vertices: None,
            indices: None,
            groups: Vec::new(),
            material: None,
            model: None,
            last_index: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn vertex_type(&self) -> VertexType {
        self.vertex_type
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn vertices(&self) -> Option<&BufferData> {
        self.vertices.as_ref()
    }

    pub fn vertices_mut(&mut self) -> Option<&mut BufferData> {
        self.vertices.as_mut()
    }

    pub fn indices(&self) -> Option<&BufferData> {
        self.indices.as_ref()
    }

    pub fn indices_mut(&mut self) -> Option<&mut BufferData> {
        self.indices.as_mut()
    }

    pub fn set_vertices(&mut self, buffer: BufferData) {
        self.vertices = Some(buffer);
    }

    pub fn set_indices(&mut self, buffer: BufferData, index_type: IndexType) {
        self.indices = Some(buffer);
        self.index_type = index_type;
    }

    /// Appends raw vertex bytes, allocating the buffer on first use.
    pub fn attach_vertices(
        &mut self,
        pool: &BufferPool,
        bytes: &[u8],
        access: BufferAccess,
    ) -> Result<(), MeshError> {
        match self.vertices.as_mut() {
            Some(buf) => buf.attach(bytes),
            None => self.vertices = Some(pool.alloc_from(BufferKind::Vertex, bytes, access)?),
        }
        Ok(())
    }

    /// Appends indices encoded at the mesh's index width.
    pub fn attach_indices(
        &mut self,
        pool: &BufferPool,
        indices: &[u32],
        access: BufferAccess,
    ) -> Result<(), MeshError> {
        let bytes = self.index_type.encode(indices);
        match self.indices.as_mut() {
            Some(buf) => buf.attach(&bytes),
            None => self.indices = Some(pool.alloc_from(BufferKind::Index, &bytes, access)?),
        }
        if let Some(max) = indices.iter().max() {
            self.last_index = self.last_index.max(max + 1);
        }
        Ok(())
    }

    pub fn primitive_groups(&self) -> &[PrimitiveGroup] {
        &self.groups
    }

    pub fn add_primitive_group(&mut self, group: PrimitiveGroup) {
        self.groups.push(group);
    }

    pub fn add_primitive_groups(&mut self, groups: &[PrimitiveGroup]) {
        self.groups.extend_from_slice(groups);
    }

    pub fn replace_primitive_groups(&mut self, groups: Vec<PrimitiveGroup>) {
        self.groups = groups;
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = Some(material);
    }

    /// Local transform applied on top of the batch model matrix.
    pub fn model_matrix(&self) -> Option<Mat4> {
        self.model
    }

    pub fn set_model_matrix(&mut self, model: Option<Mat4>) {
        self.model = model;
    }

    /// One past the highest vertex index referenced so far.
    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    pub fn set_last_index(&mut self, last_index: u32) {
        self.last_index = last_index;
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices
            .as_ref()
            .map_or(0, |b| b.len() / self.vertex_type.size())
    }

    pub fn num_indices(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(0, |b| b.len() / self.index_type.size())
    }
}
