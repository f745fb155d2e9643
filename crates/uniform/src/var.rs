use glam::{Mat4, Vec2, Vec3};

use crate::UniformError;
use crate::param::ParameterType;

/// Zero-initialised payload of a uniform, sized by its type and item count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformDataBlob {
    bytes: Vec<u8>,
}

impl UniformDataBlob {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A named, typed shader value.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformVar {
    name: String,
    ty: ParameterType,
    num_items: usize,
    data: UniformDataBlob,
}

impl UniformVar {
    /// Creates a zero-filled variable of `data_size(ty, num_items)` bytes.
    pub fn create(name: &str, ty: ParameterType, num_items: usize) -> Result<Self, UniformError> {
        if name.is_empty() {
            tracing::debug!(?ty, "uniform with empty name rejected");
            return Err(UniformError::EmptyName);
        }
        if ty.is_array() && num_items == 0 {
            tracing::debug!(name, ?ty, "uniform array with no items rejected");
            return Err(UniformError::NoItems);
        }
        let num_items = if ty.is_array() { num_items } else { 1 };
        Ok(Self {
            name: name.to_owned(),
            ty,
            num_items,
            data: UniformDataBlob::new(ty.data_size(num_items)),
        })
    }

    pub fn float(name: &str, value: f32) -> Result<Self, UniformError> {
        let mut var = Self::create(name, ParameterType::Float, 1)?;
        var.set_f32(value)?;
        Ok(var)
    }

    pub fn int(name: &str, value: i32) -> Result<Self, UniformError> {
        let mut var = Self::create(name, ParameterType::Int, 1)?;
        var.set_i32(value)?;
        Ok(var)
    }

    pub fn mat4(name: &str, value: Mat4) -> Result<Self, UniformError> {
        let mut var = Self::create(name, ParameterType::Mat4, 1)?;
        var.set_mat4(value)?;
        Ok(var)
    }

    pub fn mat4_array(name: &str, values: &[Mat4]) -> Result<Self, UniformError> {
        let mut var = Self::create(name, ParameterType::Mat4Array, values.len())?;
        var.set_mat4_array(values)?;
        Ok(var)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ParameterType {
        self.ty
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Replaces the payload. `bytes` must match the blob size exactly.
    pub fn set_data(&mut self, bytes: &[u8]) -> Result<(), UniformError> {
        if bytes.len() != self.data.len() {
            tracing::debug!(
                name = %self.name,
                expected = self.data.len(),
                got = bytes.len(),
                "uniform payload size mismatch"
            );
            return Err(UniformError::SizeMismatch {
                expected: self.data.len(),
                got: bytes.len(),
            });
        }
        self.data.bytes.copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_f32(&mut self, value: f32) -> Result<(), UniformError> {
        self.set_data(&value.to_le_bytes())
    }

    pub fn set_i32(&mut self, value: i32) -> Result<(), UniformError> {
        self.set_data(&value.to_le_bytes())
    }

    pub fn set_vec2(&mut self, value: Vec2) -> Result<(), UniformError> {
        self.set_data(&floats_to_le(&value.to_array()))
    }

    pub fn set_vec3(&mut self, value: Vec3) -> Result<(), UniformError> {
        self.set_data(&floats_to_le(&value.to_array()))
    }

    pub fn set_mat4(&mut self, value: Mat4) -> Result<(), UniformError> {
        self.set_data(&floats_to_le(&value.to_cols_array()))
    }

    pub fn set_mat4_array(&mut self, values: &[Mat4]) -> Result<(), UniformError> {
        let floats: Vec<f32> = values.iter().flat_map(|m| m.to_cols_array()).collect();
        self.set_data(&floats_to_le(&floats))
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self.ty {
            ParameterType::Float => le_to_floats(self.data()).first().copied(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.ty {
            ParameterType::Int => self
                .data()
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .map(i32::from_le_bytes),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self.ty {
            ParameterType::Mat4 => mats_from_le(self.data()).into_iter().next(),
            _ => None,
        }
    }

    pub fn as_mat4_array(&self) -> Option<Vec<Mat4>> {
        match self.ty {
            ParameterType::Mat4Array => Some(mats_from_le(self.data())),
            _ => None,
        }
    }
}

/// Packs 32-bit floats little-endian.
pub fn floats_to_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Unpacks little-endian 32-bit floats, ignoring a trailing partial value.
pub fn le_to_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Unpacks column-major matrices, ignoring a trailing partial matrix.
pub fn mats_from_le(bytes: &[u8]) -> Vec<Mat4> {
    le_to_floats(bytes)
        .chunks_exact(16)
        .map(Mat4::from_cols_slice)
        .collect()
}
