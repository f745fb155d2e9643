use serde::{Deserialize, Serialize};

use crate::pool::BufferPool;

/// What a buffer holds on the GPU side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferKind {
    #[default]
    Empty,
    Vertex,
    Index,
    Instance,
    Uniform,
}

/// How the owner intends to touch a buffer after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadWrite,
}

/// Errors from buffer allocation and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("buffer size must be non-zero")]
    ZeroSize,
    #[error("write of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    Overflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error(transparent)]
    Pool(#[from] framepipe_common::PoolError),
}

/// Owned byte payload destined for a GPU buffer.
///
/// Capacity always equals the length of the backing storage. Storage drawn
/// from a [`BufferPool`] goes back to that pool when the buffer is dropped.
#[derive(Debug)]
pub struct BufferData {
    kind: BufferKind,
    access: BufferAccess,
    bytes: Vec<u8>,
    home: Option<BufferPool>,
}

impl BufferData {
    pub(crate) fn from_pool(
        kind: BufferKind,
        access: BufferAccess,
        bytes: Vec<u8>,
        home: BufferPool,
    ) -> Self {
        Self {
            kind,
            access,
            bytes,
            home: Some(home),
        }
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn access(&self) -> BufferAccess {
        self.access
    }

    /// Size in bytes. Same as the capacity.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Copies `src` into the front of the buffer.
    ///
    /// Oversized input is rejected and leaves the buffer untouched.
    pub fn copy_from(&mut self, src: &[u8]) -> Result<(), BufferError> {
        self.write_at(0, src)
    }

    /// Copies `src` into the buffer starting at `offset`.
    pub fn write_at(&mut self, offset: usize, src: &[u8]) -> Result<(), BufferError> {
        let capacity = self.bytes.len();
        let end = offset.checked_add(src.len());
        match end {
            Some(end) if end <= capacity => {
                self.bytes[offset..end].copy_from_slice(src);
                Ok(())
            }
            _ => {
                tracing::warn!(
                    kind = ?self.kind,
                    offset,
                    len = src.len(),
                    capacity,
                    "buffer write rejected"
                );
                Err(BufferError::Overflow {
                    offset,
                    len: src.len(),
                    capacity,
                })
            }
        }
    }

    /// Appends `src`, growing the buffer. Used for incremental vertex streams.
    pub fn attach(&mut self, src: &[u8]) {
        self.bytes.extend_from_slice(src);
    }
}

impl Drop for BufferData {
    fn drop(&mut self) {
        if let Some(home) = self.home.take() {
            home.recycle(std::mem::take(&mut self.bytes));
        }
    }
}
