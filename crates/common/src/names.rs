use serde::{Deserialize, Serialize};

/// Interned name handle. Compared by value, resolved through a [`NameTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameId(pub u32);

impl NameId {
    /// Marker for commands that carry no pass or batch.
    pub const NONE: NameId = NameId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for NameId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Errors raised when mirroring a name table on another thread.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("names must not be empty")]
    Empty,
    #[error("name id {got} out of order, expected {expected}")]
    OutOfOrder { expected: u32, got: u32 },
    #[error("name id {0} already bound to a different name")]
    Conflict(u32),
}

/// Append-only string interner.
///
/// Ids are dense indices in insertion order, which lets a consumer rebuild an
/// identical table from the entries added since its last sync.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, adding it when unseen.
    pub fn intern(&mut self, name: &str) -> Result<NameId, NameError> {
        if name.is_empty() {
            tracing::debug!("rejecting empty name");
            return Err(NameError::Empty);
        }
        if let Some(id) = self.lookup(name) {
            return Ok(id);
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_owned());
        Ok(id)
    }

    /// Exact-match lookup. Linear; tables stay small.
    pub fn lookup(&self, name: &str) -> Option<NameId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| NameId(i as u32))
    }

    pub fn resolve(&self, id: NameId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries added at or after index `start`.
    pub fn entries_since(&self, start: usize) -> impl Iterator<Item = (NameId, &str)> {
        self.names
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, n)| (NameId(i as u32), n.as_str()))
    }

    /// Binds `id` to `name` on a mirror table. Re-adopting a known pair is a no-op.
    pub fn adopt(&mut self, id: NameId, name: &str) -> Result<(), NameError> {
        let expected = self.names.len() as u32;
        if id.0 < expected {
            return match self.resolve(id) {
                Some(existing) if existing == name => Ok(()),
                _ => Err(NameError::Conflict(id.0)),
            };
        }
        if id.0 != expected {
            return Err(NameError::OutOfOrder {
                expected,
                got: id.0,
            });
        }
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        self.names.push(name.to_owned());
        Ok(())
    }
}
