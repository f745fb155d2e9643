use std::sync::Arc;

use framepipe_common::{BlockPool, PoolPolicy, PoolStats};
use parking_lot::Mutex;

use crate::buffer::{BufferAccess, BufferData, BufferError, BufferKind};

/// Shared allocator for [`BufferData`] storage.
///
/// Cloning the pool clones a handle; all clones draw from the same blocks.
/// A block counts as in use from `alloc` until the buffer is dropped.
#[derive(Debug, Clone)]
pub struct BufferPool {
    blocks: Arc<Mutex<BlockPool<Vec<u8>>>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(4096, PoolPolicy::Grow)
    }
}

impl BufferPool {
    pub fn new(capacity: usize, policy: PoolPolicy) -> Self {
        Self {
            blocks: Arc::new(Mutex::new(BlockPool::new(capacity, policy))),
        }
    }

    /// Allocates a zero-filled buffer of exactly `size` bytes.
    pub fn alloc(
        &self,
        kind: BufferKind,
        size: usize,
        access: BufferAccess,
    ) -> Result<BufferData, BufferError> {
        if size == 0 {
            tracing::debug!(?kind, "zero-sized buffer requested");
            return Err(BufferError::ZeroSize);
        }
        let mut bytes = self.blocks.lock().acquire_with(Vec::new)?;
        bytes.clear();
        bytes.resize(size, 0);
        tracing::trace!(?kind, size, "buffer allocated");
        Ok(BufferData::from_pool(kind, access, bytes, self.clone()))
    }

    /// Allocates a buffer holding a copy of `src`.
    pub fn alloc_from(
        &self,
        kind: BufferKind,
        src: &[u8],
        access: BufferAccess,
    ) -> Result<BufferData, BufferError> {
        let mut buf = self.alloc(kind, src.len(), access)?;
        buf.copy_from(src)?;
        Ok(buf)
    }

    pub(crate) fn recycle(&self, bytes: Vec<u8>) {
        self.blocks.lock().release(bytes);
    }

    pub fn stats(&self) -> PoolStats {
        self.blocks.lock().stats()
    }

    pub fn policy(&self) -> PoolPolicy {
        self.blocks.lock().policy()
    }
}
