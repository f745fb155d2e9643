use serde::{Deserialize, Serialize};

/// Unique identifier for a mesh or other GPU-side resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid(pub u64);

impl Guid {
    /// Placeholder id carried by commands that do not target a mesh.
    pub const INVALID: Guid = Guid(999_999);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing guids, skipping the invalid marker.
#[derive(Debug, Clone, Default)]
pub struct GuidAllocator {
    next: u64,
}

impl GuidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_guid(&mut self) -> Guid {
        if self.next == Guid::INVALID.0 {
            self.next += 1;
        }
        let id = Guid(self.next);
        self.next += 1;
        id
    }

    /// Number of guids handed out so far.
    pub fn issued(&self) -> u64 {
        if self.next > Guid::INVALID.0 {
            self.next - 1
        } else {
            self.next
        }
    }
}

/// Pixel rectangle of a pass. Negative extents mean "use the full target".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the viewport was never set and the full target applies.
    pub fn is_full_target(&self) -> bool {
        self.width < 0 || self.height < 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: -1,
            y: -1,
            width: -1,
            height: -1,
        }
    }
}
