use serde::{Deserialize, Serialize};

/// Topology of a draw range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// Width of the entries in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    UnsignedByte,
    #[default]
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    /// Bytes per index.
    pub fn size(self) -> usize {
        match self {
            Self::UnsignedByte => 1,
            Self::UnsignedShort => 2,
            Self::UnsignedInt => 4,
        }
    }

    /// Narrowest type able to address `num_vertices` vertices.
    pub fn for_vertex_count(num_vertices: usize) -> Self {
        if num_vertices <= u16::MAX as usize + 1 {
            Self::UnsignedShort
        } else {
            Self::UnsignedInt
        }
    }

    /// Encodes `indices` little-endian at this width. Values are truncated to fit.
    pub fn encode(self, indices: &[u32]) -> Vec<u8> {
        let mut out = Vec::with_capacity(indices.len() * self.size());
        for &i in indices {
            match self {
                Self::UnsignedByte => out.push(i as u8),
                Self::UnsignedShort => out.extend_from_slice(&(i as u16).to_le_bytes()),
                Self::UnsignedInt => out.extend_from_slice(&i.to_le_bytes()),
            }
        }
        out
    }
}

/// A contiguous run of indices drawn with one topology. Fixed once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveGroup {
    primitive: PrimitiveType,
    index_type: IndexType,
    start_index: u32,
    num_indices: u32,
}

impl PrimitiveGroup {
    pub fn new(
        index_type: IndexType,
        num_indices: u32,
        primitive: PrimitiveType,
        start_index: u32,
    ) -> Self {
        Self {
            primitive,
            index_type,
            start_index,
            num_indices,
        }
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    /// One past the last index of the group.
    pub fn end_index(&self) -> u32 {
        self.start_index.saturating_add(self.num_indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_keeps_construction_values() {
        let g = PrimitiveGroup::new(IndexType::UnsignedShort, 6, PrimitiveType::TriangleList, 12);
        assert_eq!(g.primitive(), PrimitiveType::TriangleList);
        assert_eq!(g.index_type(), IndexType::UnsignedShort);
        assert_eq!(g.start_index(), 12);
        assert_eq!(g.num_indices(), 6);
        assert_eq!(g.end_index(), 18);
    }

    #[test]
    fn end_index_saturates() {
        let g = PrimitiveGroup::new(IndexType::UnsignedInt, u32::MAX, PrimitiveType::PointList, 10);
        assert_eq!(g.end_index(), u32::MAX);
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexType::UnsignedByte.size(), 1);
        assert_eq!(IndexType::UnsignedShort.size(), 2);
        assert_eq!(IndexType::UnsignedInt.size(), 4);
    }

    #[test]
    fn narrowest_index_type() {
        assert_eq!(IndexType::for_vertex_count(4), IndexType::UnsignedShort);
        assert_eq!(IndexType::for_vertex_count(65_536), IndexType::UnsignedShort);
        assert_eq!(IndexType::for_vertex_count(65_537), IndexType::UnsignedInt);
    }

    #[test]
    fn encode_is_little_endian() {
        assert_eq!(IndexType::UnsignedShort.encode(&[1, 258]), vec![1, 0, 2, 1]);
        assert_eq!(IndexType::UnsignedInt.encode(&[1]), vec![1, 0, 0, 0]);
        assert_eq!(IndexType::UnsignedByte.encode(&[3, 4]), vec![3, 4]);
    }
}
