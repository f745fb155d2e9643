use framepipe_buffers::{
    BufferAccess, BufferData, BufferKind, IndexType, PrimitiveGroup, PrimitiveType,
};
use glam::{Vec2, Vec3, Vec4};

use crate::MeshError;
use crate::context::ResourceContext;
use crate::mesh::Mesh;
use crate::text::{self, INDICES_PER_GLYPH, VERTS_PER_GLYPH};
use crate::vertex::{ColorVert, RenderVert, UiVert, VertexType};

/// Screen-space rectangle for UI quads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl UiRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const QUAD_INDICES: [u32; 6] = [0, 2, 1, 1, 2, 3];

/// Assembles meshes for primitive shapes, point clouds, line lists and text.
///
/// Each `alloc*`/`create*` call replaces the mesh under construction;
/// [`finish`](Self::finish) hands it to the caller.
pub struct MeshBuilder<'a> {
    ctx: &'a mut ResourceContext,
    active: Option<Mesh>,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(ctx: &'a mut ResourceContext) -> Self {
        Self { ctx, active: None }
    }

    /// The mesh under construction, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.active.as_ref()
    }

    pub fn finish(&mut self) -> Result<Mesh, MeshError> {
        self.active.take().ok_or(MeshError::NothingBuilt)
    }

    fn start(&mut self, name: &str, vertex_type: VertexType) -> Mesh {
        let guid = self.ctx.next_guid();
        tracing::trace!(name, %guid, ?vertex_type, "building mesh");
        Mesh::new(name, guid, vertex_type, IndexType::UnsignedShort)
    }

    /// Starts a mesh with no geometry. Buffers can be attached afterwards.
    pub fn alloc_empty_mesh(&mut self, name: &str, vertex_type: VertexType) -> &mut Self {
        let mut mesh = self.start(name, vertex_type);
        mesh.set_material(self.ctx.materials.builtin(vertex_type));
        self.active = Some(mesh);
        self
    }

    pub fn create_triangle(
        &mut self,
        vertex_type: VertexType,
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        let pos = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ];
        let col = [RED, GREEN, BLUE];
        self.build_shape(
            "triangle",
            vertex_type,
            &pos,
            Some(&col[..]),
            None,
            &[0, 2, 1],
            PrimitiveType::TriangleList,
            access,
        )
    }

    /// One quad spanning -1..1 in x and y.
    pub fn alloc_quads(
        &mut self,
        vertex_type: VertexType,
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        let pos = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let col = [RED, GREEN, BLUE, RED];
        let tex = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        self.build_shape(
            "quad",
            vertex_type,
            &pos,
            Some(&col[..]),
            Some(&tex[..]),
            &QUAD_INDICES,
            PrimitiveType::TriangleList,
            access,
        )
    }

    /// Axis-aligned box with one corner at the origin, spanning `w` in x,
    /// `d` in y and `h` in z.
    pub fn create_cube(
        &mut self,
        vertex_type: VertexType,
        w: f32,
        h: f32,
        d: f32,
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        let pos = [
            Vec3::new(0.0, 0.0, h),
            Vec3::new(w, 0.0, h),
            Vec3::new(0.0, d, h),
            Vec3::new(w, d, h),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(w, 0.0, 0.0),
            Vec3::new(0.0, d, 0.0),
            Vec3::new(w, d, 0.0),
        ];
        let col = [Vec3::splat(0.5); 8];
        #[rustfmt::skip]
        let indices: [u32; 36] = [
            2, 6, 7, 2, 7, 3, // top
            0, 4, 5, 0, 5, 1, // bottom
            0, 2, 6, 0, 6, 4, // left
            1, 3, 7, 1, 7, 5, // right
            0, 3, 2, 0, 1, 3, // front
            4, 6, 7, 4, 7, 5, // back
        ];
        self.build_shape(
            "cube",
            vertex_type,
            &pos,
            Some(&col[..]),
            None,
            &indices,
            PrimitiveType::TriangleList,
            access,
        )
    }

    /// Line segments; `indices` holds pairs of vertex indices.
    pub fn alloc_line_list(
        &mut self,
        vertex_type: VertexType,
        access: BufferAccess,
        positions: &[Vec3],
        colors: &[Vec3],
        indices: &[u32],
    ) -> Result<&mut Self, MeshError> {
        if indices.is_empty() || indices.len() % 2 != 0 {
            tracing::debug!(len = indices.len(), "line list needs index pairs");
            return Err(MeshError::OddLineIndices(indices.len()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index: bad,
                num_vertices: positions.len(),
            });
        }
        self.build_shape(
            "lines",
            vertex_type,
            positions,
            Some(colors),
            None,
            indices,
            PrimitiveType::LineList,
            access,
        )
    }

    /// Point cloud drawn with indices `0..n`.
    pub fn alloc_points(
        &mut self,
        vertex_type: VertexType,
        access: BufferAccess,
        positions: &[Vec3],
        colors: &[Vec3],
    ) -> Result<&mut Self, MeshError> {
        let indices: Vec<u32> = (0..positions.len() as u32).collect();
        self.build_shape(
            "points",
            vertex_type,
            positions,
            Some(colors),
            None,
            &indices,
            PrimitiveType::PointList,
            access,
        )
    }

    /// One glyph quad per character of `text`, laid out from (`x`, `y`) in
    /// cells of `size`. Empty text leaves the builder unchanged.
    pub fn alloc_text_box(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        text: &str,
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        if text.is_empty() {
            return Ok(self);
        }
        let mut mesh = self.start("text", VertexType::RenderVertex);
        self.fill_text(&mut mesh, x, y, size, text, access)?;
        mesh.set_material(self.ctx.materials.font());
        self.active = Some(mesh);
        Ok(self)
    }

    /// Rewrites `mesh` to show `text`. Reuses the buffers in place when the
    /// text fits in the existing allocation, otherwise reallocates.
    pub fn update_text_box(
        &mut self,
        mesh: &mut Mesh,
        size: f32,
        text: &str,
    ) -> Result<(), MeshError> {
        if Self::update_text_vertices(mesh, size, text)? {
            return Ok(());
        }
        let origin = text_origin(mesh)?;
        tracing::debug!(
            mesh = mesh.name(),
            glyphs = text.chars().count(),
            "text box outgrew its buffers, rebuilding"
        );
        self.fill_text(mesh, origin.x, origin.y, size, text, BufferAccess::ReadWrite)
    }

    /// In-place rewrite of a text mesh's vertices. Returns `Ok(false)` when
    /// `text` needs more glyph slots than the mesh holds; nothing changes then.
    pub fn update_text_vertices(mesh: &mut Mesh, size: f32, text: &str) -> Result<bool, MeshError> {
        let origin = text_origin(mesh)?;
        let glyphs = text.chars().count();
        let slots = mesh.num_vertices() / VERTS_PER_GLYPH;
        if glyphs > slots {
            return Ok(false);
        }

        let layout = text::layout_text(origin.x, origin.y, size, text);
        let verts = render_verts(&layout.positions, None, Some(layout.uvs.as_slice()), Vec3::ZERO);
        let index_type = mesh.index_type();
        let vb = mesh.vertices_mut().ok_or(MeshError::NotATextMesh)?;
        vb.copy_from(bytemuck::cast_slice(&verts))?;
        mesh.replace_primitive_groups(vec![PrimitiveGroup::new(
            index_type,
            (glyphs * INDICES_PER_GLYPH) as u32,
            PrimitiveType::TriangleList,
            0,
        )]);
        Ok(true)
    }

    /// UI overlay quads, one primitive group for all of them.
    pub fn alloc_ui_quads(
        &mut self,
        quads: &[(UiRect, Vec4)],
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        if quads.is_empty() {
            return Err(MeshError::Empty("ui quads"));
        }
        let mut verts = Vec::with_capacity(quads.len() * 4);
        let mut indices = Vec::with_capacity(quads.len() * 6);
        for (i, (r, color)) in quads.iter().enumerate() {
            let base = (i * 4) as u32;
            verts.extend([
                UiVert::new(Vec2::new(r.x, r.y), *color),
                UiVert::new(Vec2::new(r.x, r.y + r.height), *color),
                UiVert::new(Vec2::new(r.x + r.width, r.y), *color),
                UiVert::new(Vec2::new(r.x + r.width, r.y + r.height), *color),
            ]);
            indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        }

        let mut mesh = self.start("ui", VertexType::UiVertex);
        let vb = self
            .ctx
            .buffers
            .alloc_from(BufferKind::Vertex, bytemuck::cast_slice(&verts), access)?;
        mesh.set_vertices(vb);
        self.attach_index_group(&mut mesh, &indices, verts.len(), PrimitiveType::TriangleList, access)?;
        mesh.set_material(self.ctx.materials.builtin(VertexType::UiVertex));
        self.active = Some(mesh);
        Ok(self)
    }

    /// Interleaves the attribute arrays into `vertex_type` vertices and
    /// allocates a vertex buffer of `positions.len() * vertex_type.size()` bytes.
    pub fn alloc_vertices(
        &mut self,
        vertex_type: VertexType,
        positions: &[Vec3],
        colors: Option<&[Vec3]>,
        tex0: Option<&[Vec2]>,
        access: BufferAccess,
    ) -> Result<BufferData, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::Empty("positions"));
        }
        check_len("colors", positions.len(), colors.map(<[Vec3]>::len))?;
        check_len("tex0", positions.len(), tex0.map(<[Vec2]>::len))?;

        let bytes: Vec<u8> = match vertex_type {
            VertexType::ColorVertex => {
                let verts: Vec<ColorVert> = positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let c = colors.map_or(Vec3::ZERO, |c| c[i]);
                        ColorVert::new(*p, Vec3::ZERO, c)
                    })
                    .collect();
                bytemuck::cast_slice(&verts).to_vec()
            }
            VertexType::RenderVertex => {
                let verts = render_verts(positions, colors, tex0, Vec3::ZERO);
                bytemuck::cast_slice(&verts).to_vec()
            }
            VertexType::UiVertex => {
                tracing::debug!("ui vertices need 2D positions, use alloc_ui_quads");
                return Err(MeshError::UnsupportedVertexType(vertex_type));
            }
        };
        Ok(self.ctx.buffers.alloc_from(BufferKind::Vertex, &bytes, access)?)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_shape(
        &mut self,
        name: &str,
        vertex_type: VertexType,
        positions: &[Vec3],
        colors: Option<&[Vec3]>,
        tex0: Option<&[Vec2]>,
        indices: &[u32],
        primitive: PrimitiveType,
        access: BufferAccess,
    ) -> Result<&mut Self, MeshError> {
        let tex0 = if vertex_type == VertexType::RenderVertex {
            tex0
        } else {
            None
        };
        let vb = self.alloc_vertices(vertex_type, positions, colors, tex0, access)?;
        let mut mesh = self.start(name, vertex_type);
        mesh.set_vertices(vb);
        self.attach_index_group(&mut mesh, indices, positions.len(), primitive, access)?;
        mesh.set_material(self.ctx.materials.builtin(vertex_type));
        self.active = Some(mesh);
        Ok(self)
    }

    fn attach_index_group(
        &mut self,
        mesh: &mut Mesh,
        indices: &[u32],
        num_vertices: usize,
        primitive: PrimitiveType,
        access: BufferAccess,
    ) -> Result<(), MeshError> {
        let index_type = IndexType::for_vertex_count(num_vertices);
        let ib = self
            .ctx
            .buffers
            .alloc_from(BufferKind::Index, &index_type.encode(indices), access)?;
        mesh.set_indices(ib, index_type);
        mesh.set_last_index(num_vertices as u32);
        mesh.replace_primitive_groups(vec![PrimitiveGroup::new(
            index_type,
            indices.len() as u32,
            primitive,
            0,
        )]);
        Ok(())
    }

    fn fill_text(
        &mut self,
        mesh: &mut Mesh,
        x: f32,
        y: f32,
        size: f32,
        text: &str,
        access: BufferAccess,
    ) -> Result<(), MeshError> {
        let layout = text::layout_text(x, y, size, text);
        let verts = render_verts(&layout.positions, None, Some(layout.uvs.as_slice()), Vec3::ZERO);
        let vb = self
            .ctx
            .buffers
            .alloc_from(BufferKind::Vertex, bytemuck::cast_slice(&verts), access)?;
        mesh.set_vertices(vb);
        self.attach_index_group(
            mesh,
            &layout.indices(),
            layout.positions.len(),
            PrimitiveType::TriangleList,
            access,
        )
    }
}

fn check_len(what: &'static str, expected: usize, got: Option<usize>) -> Result<(), MeshError> {
    match got {
        Some(got) if got != expected => {
            tracing::debug!(what, expected, got, "attribute array length mismatch");
            Err(MeshError::LengthMismatch {
                what,
                expected,
                got,
            })
        }
        _ => Ok(()),
    }
}

fn render_verts(
    positions: &[Vec3],
    colors: Option<&[Vec3]>,
    tex0: Option<&[Vec2]>,
    default_color: Vec3,
) -> Vec<RenderVert> {
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let c = colors.map_or(default_color, |c| c[i]);
            let t = tex0.map_or(Vec2::ZERO, |t| t[i]);
            RenderVert::new(*p, Vec3::ZERO, c, t)
        })
        .collect()
}

/// Layout origin of a text mesh: the first corner of its first glyph slot.
fn text_origin(mesh: &Mesh) -> Result<Vec2, MeshError> {
    if mesh.vertex_type() != VertexType::RenderVertex {
        return Err(MeshError::NotATextMesh);
    }
    let vb = mesh.vertices().ok_or(MeshError::NotATextMesh)?;
    let first = vb
        .data()
        .get(..std::mem::size_of::<RenderVert>())
        .ok_or(MeshError::NotATextMesh)?;
    let vert: RenderVert = bytemuck::pod_read_unaligned(first);
    Ok(Vec2::new(vert.position[0], vert.position[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{DEFAULT_FONT_MATERIAL, MaterialType};

    fn decode<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
        bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    fn verts_of(mesh: &Mesh) -> Vec<RenderVert> {
        decode(mesh.vertices().unwrap().data())
    }

    #[test]
    fn quad_shape() {
        let mut ctx = ResourceContext::new();
        let mesh = MeshBuilder::new(&mut ctx)
            .alloc_quads(VertexType::RenderVertex, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_indices(), 6);
        assert_eq!(
            mesh.primitive_groups(),
            &[PrimitiveGroup::new(
                IndexType::UnsignedShort,
                6,
                PrimitiveType::TriangleList,
                0
            )]
        );
        assert_eq!(
            mesh.indices().unwrap().data(),
            IndexType::UnsignedShort.encode(&[0, 2, 1, 1, 2, 3]).as_slice()
        );
        assert_eq!(verts_of(&mesh)[3].tex0, [1.0, 1.0]);
    }

    #[test]
    fn triangle_has_builtin_material() {
        let mut ctx = ResourceContext::new();
        let mesh = MeshBuilder::new(&mut ctx)
            .create_triangle(VertexType::ColorVertex, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.material().unwrap().ty, MaterialType::Flat);
        let verts: Vec<ColorVert> = decode(mesh.vertices().unwrap().data());
        assert_eq!(verts[1].color0, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn cube_counts() {
        let mut ctx = ResourceContext::new();
        let mesh = MeshBuilder::new(&mut ctx)
            .create_cube(VertexType::ColorVertex, 1.0, 2.0, 3.0, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_indices(), 36);
        assert_eq!(mesh.last_index(), 8);
    }

    #[test]
    fn text_box_ab() {
        let mut ctx = ResourceContext::new();
        let mesh = MeshBuilder::new(&mut ctx)
            .alloc_text_box(0.0, 0.0, 0.1, "AB", BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_indices(), 12);
        assert_eq!(mesh.primitive_groups()[0].num_indices(), 12);
        assert_eq!(mesh.material().unwrap().name, DEFAULT_FONT_MATERIAL);

        let verts = verts_of(&mesh);
        let a = verts[0].tex0;
        let b = verts[4].tex0;
        assert!((a[0] - ('A' as u32 % 16) as f32 / 16.0).abs() < 1e-6);
        assert!((b[0] - ('B' as u32 % 16) as f32 / 16.0).abs() < 1e-6);
        assert_eq!(a[1], b[1]);
        assert!(verts.iter().all(|v| v.color0 == [0.0, 0.0, 0.0]));
    }

    #[test]
    fn empty_text_is_noop() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        builder
            .alloc_text_box(0.0, 0.0, 0.1, "", BufferAccess::ReadWrite)
            .unwrap();
        assert!(builder.mesh().is_none());
        assert!(matches!(builder.finish(), Err(MeshError::NothingBuilt)));
    }

    #[test]
    fn update_text_in_place_when_shorter() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let mut mesh = builder
            .alloc_text_box(0.5, 0.5, 0.1, "Hello", BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();
        let before = mesh.vertices().unwrap().data().as_ptr();

        builder.update_text_box(&mut mesh, 0.1, "Hi").unwrap();
        assert_eq!(mesh.vertices().unwrap().data().as_ptr(), before);
        assert_eq!(mesh.num_vertices(), 20);
        assert_eq!(mesh.primitive_groups()[0].num_indices(), 12);
        let verts = verts_of(&mesh);
        assert_eq!(verts[4].tex0, text::glyph_uvs('i')[0].to_array());
        assert_eq!(verts[0].position, [0.5, 0.5, 0.0]);
    }

    #[test]
    fn update_text_in_place_relays_out_line_breaks() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let mut mesh = builder
            .alloc_text_box(0.5, 0.5, 0.1, "Hello", BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();
        let before = mesh.vertices().unwrap().data().as_ptr();

        assert!(MeshBuilder::update_text_vertices(&mut mesh, 0.1, "H\ni").unwrap());
        assert_eq!(mesh.vertices().unwrap().data().as_ptr(), before);
        let verts = verts_of(&mesh);
        // 'i' starts the second row
        assert!((verts[8].position[0] - 0.5).abs() < 1e-6);
        assert!((verts[8].position[1] - 0.4).abs() < 1e-6);
        assert_eq!(verts[8].tex0, text::glyph_uvs('i')[0].to_array());
        assert_eq!(mesh.primitive_groups()[0].num_indices(), 18);
    }

    #[test]
    fn update_text_rebuilds_when_longer() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let mut mesh = builder
            .alloc_text_box(0.5, 0.5, 0.1, "Hi", BufferAccess::ReadWrite)
            .unwrap()
            .finish()
            .unwrap();
        assert!(!MeshBuilder::update_text_vertices(&mut mesh, 0.1, "Hello").unwrap());

        builder.update_text_box(&mut mesh, 0.1, "Hello").unwrap();
        assert_eq!(mesh.num_vertices(), 20);
        assert_eq!(mesh.num_indices(), 30);
        assert_eq!(verts_of(&mesh)[0].position, [0.5, 0.5, 0.0]);
    }

    #[test]
    fn line_list_validates_pairs() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let pos = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let col = [Vec3::ONE; 3];
        assert!(matches!(
            builder.alloc_line_list(VertexType::ColorVertex, BufferAccess::ReadOnly, &pos, &col, &[0, 1, 2]),
            Err(MeshError::OddLineIndices(3))
        ));
        assert!(matches!(
            builder.alloc_line_list(VertexType::ColorVertex, BufferAccess::ReadOnly, &pos, &col, &[0, 5]),
            Err(MeshError::IndexOutOfRange { index: 5, .. })
        ));
        let mesh = builder
            .alloc_line_list(VertexType::ColorVertex, BufferAccess::ReadOnly, &pos, &col, &[0, 1, 1, 2])
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(mesh.primitive_groups()[0].primitive(), PrimitiveType::LineList);
        assert_eq!(mesh.num_indices(), 4);
    }

    #[test]
    fn points_index_every_vertex() {
        let mut ctx = ResourceContext::new();
        let pos = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        let col = [Vec3::ONE; 4];
        let mesh = MeshBuilder::new(&mut ctx)
            .alloc_points(VertexType::ColorVertex, BufferAccess::ReadOnly, &pos, &col)
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(mesh.primitive_groups()[0].primitive(), PrimitiveType::PointList);
        assert_eq!(
            mesh.indices().unwrap().data(),
            IndexType::UnsignedShort.encode(&[0, 1, 2, 3]).as_slice()
        );
    }

    #[test]
    fn alloc_vertices_checks_lengths() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let err = builder
            .alloc_vertices(
                VertexType::ColorVertex,
                &[Vec3::ZERO, Vec3::X],
                Some(&[Vec3::ONE][..]),
                None,
                BufferAccess::ReadOnly,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            MeshError::LengthMismatch {
                what: "colors",
                expected: 2,
                got: 1
            }
        ));

        let vb = builder
            .alloc_vertices(
                VertexType::RenderVertex,
                &[Vec3::ZERO, Vec3::X],
                None,
                Some(&[Vec2::ZERO, Vec2::ONE][..]),
                BufferAccess::ReadOnly,
            )
            .unwrap();
        assert_eq!(vb.len(), 2 * VertexType::RenderVertex.size());
    }

    #[test]
    fn ui_quads_share_one_group() {
        let mut ctx = ResourceContext::new();
        let quads = [
            (UiRect::new(0.0, 0.0, 10.0, 10.0), Vec4::ONE),
            (UiRect::new(20.0, 0.0, 5.0, 5.0), Vec4::X),
        ];
        let mesh = MeshBuilder::new(&mut ctx)
            .alloc_ui_quads(&quads, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.primitive_groups().len(), 1);
        assert_eq!(mesh.primitive_groups()[0].num_indices(), 12);
    }

    #[test]
    fn guids_are_unique() {
        let mut ctx = ResourceContext::new();
        let mut builder = MeshBuilder::new(&mut ctx);
        let a = builder
            .alloc_quads(VertexType::ColorVertex, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();
        let b = builder
            .alloc_quads(VertexType::ColorVertex, BufferAccess::ReadOnly)
            .unwrap()
            .finish()
            .unwrap();
        assert_ne!(a.guid(), b.guid());
    }
}
