use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Semantic slot of a vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexAttribute {
    Position,
    Normal,
    TexCoord0,
    TexCoord1,
    TexCoord2,
    TexCoord3,
    Tangent,
    Binormal,
    Weights,
    Indices,
    Color0,
    Color1,
    Instance0,
    Instance1,
    Instance2,
    Instance3,
    /// Marker returned for out-of-range lookups.
    Invalid,
}

impl VertexAttribute {
    /// Attribute name as bound in shaders.
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::TexCoord0 => "texcoord0",
            Self::TexCoord1 => "texcoord1",
            Self::TexCoord2 => "texcoord2",
            Self::TexCoord3 => "texcoord3",
            Self::Tangent => "tangent",
            Self::Binormal => "binormal",
            Self::Weights => "weights",
            Self::Indices => "indices",
            Self::Color0 => "color0",
            Self::Color1 => "color1",
            Self::Instance0 => "instance0",
            Self::Instance1 => "instance1",
            Self::Instance2 => "instance2",
            Self::Instance3 => "instance3",
            Self::Invalid => "invalid",
        }
    }
}

/// Storage format of one vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    Float,
    Float2,
    Float3,
    Float4,
    Byte4,
    UByte4,
    Short2,
    Short4,
    Invalid,
}

impl VertexFormat {
    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Byte4 => 4,
            Self::UByte4 => 4,
            Self::Short2 => 4,
            Self::Short4 => 8,
            Self::Invalid => 0,
        }
    }
}

/// One attribute of an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertComponent {
    pub attribute: VertexAttribute,
    pub format: VertexFormat,
}

impl VertComponent {
    pub const fn new(attribute: VertexAttribute, format: VertexFormat) -> Self {
        Self { attribute, format }
    }

    pub fn is_error(&self) -> bool {
        self.attribute == VertexAttribute::Invalid || self.format == VertexFormat::Invalid
    }
}

/// Ordered description of an interleaved vertex.
///
/// Each component's offset is the running sum of the sizes before it. The
/// stride is summed on first use and cached until the layout changes.
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    components: Vec<VertComponent>,
    offsets: Vec<usize>,
    stride: OnceLock<usize>,
}

impl PartialEq for VertexLayout {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for VertexLayout {}

impl VertexLayout {
    /// Shared sentinel for lookups past the end.
    pub const ERROR_COMP: VertComponent =
        VertComponent::new(VertexAttribute::Invalid, VertexFormat::Invalid);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: VertComponent) -> &mut Self {
        let offset = self
            .offsets
            .last()
            .zip(self.components.last())
            .map_or(0, |(offset, prev)| offset + prev.format.size());
        self.offsets.push(offset);
        self.components.push(component);
        self.stride = OnceLock::new();
        self
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.offsets.clear();
        self.stride = OnceLock::new();
    }

    /// Bytes per vertex.
    pub fn size_in_bytes(&self) -> usize {
        *self
            .stride
            .get_or_init(|| self.components.iter().map(|c| c.format.size()).sum())
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Component at `idx`, or [`Self::ERROR_COMP`] when out of range.
    pub fn get_at(&self, idx: usize) -> &VertComponent {
        self.components.get(idx).unwrap_or(&Self::ERROR_COMP)
    }

    pub fn offset_at(&self, idx: usize) -> Option<usize> {
        self.offsets.get(idx).copied()
    }

    pub fn components(&self) -> &[VertComponent] {
        &self.components
    }

    /// Shader attribute names in component order.
    pub fn attribute_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.attribute.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(a: VertexAttribute, f: VertexFormat) -> VertComponent {
        VertComponent::new(a, f)
    }

    #[test]
    fn format_sizes() {
        assert_eq!(VertexFormat::Float.size(), 4);
        assert_eq!(VertexFormat::Float2.size(), 8);
        assert_eq!(VertexFormat::Float3.size(), 12);
        assert_eq!(VertexFormat::Float4.size(), 16);
        assert_eq!(VertexFormat::Byte4.size(), 4);
        assert_eq!(VertexFormat::UByte4.size(), 4);
        assert_eq!(VertexFormat::Short2.size(), 4);
        assert_eq!(VertexFormat::Short4.size(), 8);
    }

    #[test]
    fn offsets_are_running_sums() {
        let mut layout = VertexLayout::new();
        layout
            .add(comp(VertexAttribute::Position, VertexFormat::Float3))
            .add(comp(VertexAttribute::Normal, VertexFormat::Float3))
            .add(comp(VertexAttribute::Color0, VertexFormat::Float3))
            .add(comp(VertexAttribute::TexCoord0, VertexFormat::Float2));

        assert_eq!(layout.offset_at(0), Some(0));
        assert_eq!(layout.offset_at(1), Some(12));
        assert_eq!(layout.offset_at(2), Some(24));
        assert_eq!(layout.offset_at(3), Some(36));
        assert_eq!(layout.size_in_bytes(), 44);
    }

    #[test]
    fn stride_is_order_independent() {
        let parts = [
            comp(VertexAttribute::Position, VertexFormat::Float3),
            comp(VertexAttribute::Color0, VertexFormat::UByte4),
            comp(VertexAttribute::TexCoord0, VertexFormat::Short2),
            comp(VertexAttribute::Weights, VertexFormat::Float4),
        ];
        let mut forward = VertexLayout::new();
        for p in parts {
            forward.add(p);
        }
        let mut backward = VertexLayout::new();
        for p in parts.iter().rev() {
            backward.add(*p);
        }
        let sum: usize = parts.iter().map(|p| p.format.size()).sum();
        assert_eq!(forward.size_in_bytes(), sum);
        assert_eq!(backward.size_in_bytes(), sum);
    }

    #[test]
    fn out_of_range_returns_sentinel() {
        let mut layout = VertexLayout::new();
        layout.add(comp(VertexAttribute::Position, VertexFormat::Float3));
        assert!(!layout.get_at(0).is_error());
        assert!(layout.get_at(1).is_error());
        assert_eq!(*layout.get_at(7), VertexLayout::ERROR_COMP);
    }

    #[test]
    fn clear_resets_stride() {
        let mut layout = VertexLayout::new();
        layout.add(comp(VertexAttribute::Position, VertexFormat::Float3));
        layout.clear();
        assert_eq!(layout.size_in_bytes(), 0);
        assert_eq!(layout.num_components(), 0);
        layout.add(comp(VertexAttribute::Position, VertexFormat::Float2));
        assert_eq!(layout.size_in_bytes(), 8);
    }

    #[test]
    fn cached_stride_follows_later_adds() {
        let mut layout = VertexLayout::new();
        layout.add(comp(VertexAttribute::Position, VertexFormat::Float3));
        assert_eq!(layout.size_in_bytes(), 12);
        layout.add(comp(VertexAttribute::Color0, VertexFormat::UByte4));
        assert_eq!(layout.size_in_bytes(), 16);
        assert_eq!(layout.offset_at(1), Some(12));

        let copy = layout.clone();
        assert_eq!(copy, layout);
        assert_eq!(copy.size_in_bytes(), 16);
    }

    #[test]
    fn attribute_names_follow_components() {
        let mut layout = VertexLayout::new();
        layout
            .add(comp(VertexAttribute::Position, VertexFormat::Float3))
            .add(comp(VertexAttribute::TexCoord0, VertexFormat::Float2))
            .add(comp(VertexAttribute::Instance3, VertexFormat::Float4));
        assert_eq!(
            layout.attribute_names(),
            vec!["position", "texcoord0", "instance3"]
        );
    }
}
