use framepipe_buffers::BufferPool;
use framepipe_common::{Guid, GuidAllocator};

use crate::material::MaterialCache;

/// Everything mesh construction needs from the outside world, owned by the
/// caller and passed in explicitly.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    pub buffers: BufferPool,
    pub materials: MaterialCache,
    pub guids: GuidAllocator,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(buffers: BufferPool) -> Self {
        Self {
            buffers,
            ..Self::default()
        }
    }

    pub fn next_guid(&mut self) -> Guid {
        self.guids.next_guid()
    }
}
