use std::sync::Arc;

use framepipe_uniform::UniformVar;
use glam::Vec4;

use crate::vertex::VertexType;

/// Shading model a material asks the backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    /// Vertex colors only.
    #[default]
    Flat,
    /// Vertex colors modulated by the first texture.
    Textured,
    /// Glyph atlas sampling for text boxes.
    Text,
    /// 2D overlay.
    Ui,
}

/// Named color slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    Diffuse = 0,
    Specular = 1,
    Ambient = 2,
    Emission = 3,
}

/// Surface description shared by every mesh that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ty: MaterialType,
    /// Texture names, resolved by the backend.
    pub textures: Vec<String>,
    pub colors: [Vec4; 4],
    pub shininess: f32,
    pub shininess_strength: f32,
    /// Extra uniforms bound with this material.
    pub parameters: Vec<UniformVar>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            ty: MaterialType::Flat,
            textures: Vec::new(),
            colors: [Vec4::ONE, Vec4::ZERO, Vec4::new(0.1, 0.1, 0.1, 1.0), Vec4::ZERO],
            shininess: 0.0,
            shininess_strength: 0.0,
            parameters: Vec::new(),
        }
    }
}

impl Material {
    pub fn new(name: &str, ty: MaterialType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            ..Self::default()
        }
    }

    pub fn color(&self, slot: ColorSlot) -> Vec4 {
        self.colors[slot as usize]
    }

    pub fn set_color(&mut self, slot: ColorSlot, color: Vec4) {
        self.colors[slot as usize] = color;
    }
}

pub const DEFAULT_COLOR_MATERIAL: &str = "default_color";
pub const DEFAULT_TEXTURE_MATERIAL: &str = "default_texture";
pub const DEFAULT_UI_MATERIAL: &str = "default_ui";
pub const DEFAULT_FONT_MATERIAL: &str = "default_font";
pub const DEFAULT_FONT_TEXTURE: &str = "default_font_atlas";

/// Materials keyed by name. Looked up linearly; the set stays small.
#[derive(Debug, Clone, Default)]
pub struct MaterialCache {
    materials: Vec<Arc<Material>>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Material>> {
        self.materials.iter().find(|m| m.name == name).cloned()
    }

    /// Stores `material`, replacing one with the same name. Meshes holding the
    /// old one keep it alive until they drop.
    pub fn insert(&mut self, material: Material) -> Arc<Material> {
        let shared = Arc::new(material);
        match self.materials.iter_mut().find(|m| m.name == shared.name) {
            Some(slot) => *slot = Arc::clone(&shared),
            None => self.materials.push(Arc::clone(&shared)),
        }
        shared
    }

    pub fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> Material) -> Arc<Material> {
        match self.get(name) {
            Some(m) => m,
            None => self.insert(make()),
        }
    }

    /// Built-in material for meshes of `vertex_type`.
    pub fn builtin(&mut self, vertex_type: VertexType) -> Arc<Material> {
        match vertex_type {
            VertexType::ColorVertex => self.get_or_insert_with(DEFAULT_COLOR_MATERIAL, || {
                Material::new(DEFAULT_COLOR_MATERIAL, MaterialType::Flat)
            }),
            VertexType::RenderVertex => self.get_or_insert_with(DEFAULT_TEXTURE_MATERIAL, || {
                Material::new(DEFAULT_TEXTURE_MATERIAL, MaterialType::Textured)
            }),
            VertexType::UiVertex => self.get_or_insert_with(DEFAULT_UI_MATERIAL, || {
                Material::new(DEFAULT_UI_MATERIAL, MaterialType::Ui)
            }),
        }
    }

    /// Built-in glyph atlas material.
    pub fn font(&mut self) -> Arc<Material> {
        self.get_or_insert_with(DEFAULT_FONT_MATERIAL, || {
            let mut m = Material::new(DEFAULT_FONT_MATERIAL, MaterialType::Text);
            m.textures.push(DEFAULT_FONT_TEXTURE.to_owned());
            m
        })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
