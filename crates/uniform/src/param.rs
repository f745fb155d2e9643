use serde::{Deserialize, Serialize};

/// Value type of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    None,
    Int,
    IntArray,
    Float,
    FloatArray,
    Float2,
    Float2Array,
    Float3,
    Float3Array,
    Mat4,
    Mat4Array,
}

impl ParameterType {
    /// Byte size of one element.
    pub fn element_size(self) -> usize {
        match self {
            Self::None => 0,
            Self::Int | Self::IntArray | Self::Float | Self::FloatArray => 4,
            Self::Float2 | Self::Float2Array => 8,
            Self::Float3 | Self::Float3Array => 12,
            Self::Mat4 | Self::Mat4Array => 64,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::IntArray | Self::FloatArray | Self::Float2Array | Self::Float3Array | Self::Mat4Array
        )
    }

    /// Payload size for `num_items` elements. Scalar types ignore the count.
    pub fn data_size(self, num_items: usize) -> usize {
        if self.is_array() {
            self.element_size() * num_items
        } else {
            self.element_size()
        }
    }
}
