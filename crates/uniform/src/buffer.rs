use crate::UniformError;
use crate::var::UniformVar;
use crate::wire::{self, UniformEntry};

/// Default arena size: 1 MiB.
pub const DEFAULT_UNIFORM_BUFFER_SIZE: usize = 1024 * 1024;

/// Fixed-capacity byte arena with a single read/write cursor.
///
/// Every access satisfies `pos + size <= capacity`; anything else is refused
/// whole, never written or read in part.
#[derive(Debug, Clone)]
pub struct UniformBuffer {
    data: Vec<u8>,
    pos: usize,
    num_vars: usize,
}

impl Default for UniformBuffer {
    fn default() -> Self {
        Self::create(DEFAULT_UNIFORM_BUFFER_SIZE)
    }
}

impl UniformBuffer {
    pub fn create(size: usize) -> Self {
        Self {
            data: vec![0; size],
            pos: 0,
            num_vars: 0,
        }
    }

    /// Releases the arena. Capacity drops to zero.
    pub fn destroy(&mut self) {
        self.data = Vec::new();
        self.pos = 0;
        self.num_vars = 0;
    }

    /// Rewinds the cursor. Contents stay in place.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Rewinds the cursor and forgets the variable count, ready for a new frame.
    pub fn clear(&mut self) {
        self.pos = 0;
        self.num_vars = 0;
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn fits(&self, size: usize) -> bool {
        size != 0 && self.pos.checked_add(size).is_some_and(|end| end <= self.data.len())
    }

    /// Copies `bytes` at the cursor and advances. Returns false and does
    /// nothing on empty input or overflow.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        if !self.fits(bytes.len()) {
            if !bytes.is_empty() {
                tracing::warn!(
                    pos = self.pos,
                    len = bytes.len(),
                    capacity = self.data.len(),
                    "uniform buffer write rejected"
                );
            }
            return false;
        }
        let end = self.pos + bytes.len();
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        true
    }

    /// Reads `len` bytes at the cursor and advances. `None` on zero length
    /// or overflow.
    pub fn read(&mut self, len: usize) -> Option<&[u8]> {
        if !self.fits(len) {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(&self.data[start..self.pos])
    }

    /// Serializes `var` at the cursor. All or nothing.
    pub fn write_var(&mut self, var: &UniformVar) -> Result<(), UniformError> {
        let header = wire::encode_header(var.name().len(), var.data().len())?;
        let needed = wire::encoded_len(var);
        if !self.fits(needed) {
            tracing::warn!(
                name = var.name(),
                needed,
                remaining = self.remaining(),
                "uniform var does not fit"
            );
            return Err(UniformError::BufferFull {
                needed,
                remaining: self.remaining(),
            });
        }
        self.write(&header.to_le_bytes());
        self.write(var.name().as_bytes());
        if !var.data().is_empty() {
            self.write(var.data());
        }
        self.num_vars += 1;
        Ok(())
    }

    /// Decodes the entry at the cursor and advances past it. The cursor does
    /// not move when the entry is truncated or malformed.
    pub fn read_var(&mut self) -> Option<UniformEntry> {
        let (var, len) = wire::decode_var(&self.data[self.pos..]).ok()?;
        let entry = var.to_owned_entry();
        self.pos += len;
        Some(entry)
    }

    /// Bytes written so far, from the start of the arena to the cursor.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// Bytes between `start` and the cursor.
    pub fn written_since(&self, start: usize) -> &[u8] {
        &self.data[start.min(self.pos)..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParameterType;
    use glam::Mat4;

    #[test]
    fn default_is_one_mib() {
        let buf = UniformBuffer::default();
        assert_eq!(buf.capacity(), 1024 * 1024);
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn round_trip_var() {
        let mut buf = UniformBuffer::create(256);
        let m = Mat4::from_scale(glam::Vec3::splat(2.0));
        let var = UniformVar::mat4("model", m).unwrap();
        buf.write_var(&var).unwrap();
        assert_eq!(buf.pos(), 4 + 5 + 64);
        assert_eq!(buf.num_vars(), 1);

        buf.reset();
        let entry = buf.read_var().unwrap();
        assert_eq!(entry.name, "model");
        assert_eq!(entry.data, var.data());
        assert_eq!(buf.pos(), 4 + 5 + 64);
    }

    #[test]
    fn many_vars_read_back_in_order() {
        let vars = [
            UniformVar::float("time", 0.25).unwrap(),
            UniformVar::int("frame", -7).unwrap(),
            UniformVar::mat4("view", Mat4::from_rotation_x(1.0)).unwrap(),
            UniformVar::mat4_array("bones", &[Mat4::IDENTITY, Mat4::from_scale(glam::Vec3::ONE * 3.0)])
                .unwrap(),
            UniformVar::create("tint", ParameterType::Float3Array, 2).unwrap(),
        ];
        let mut buf = UniformBuffer::create(1024);
        for v in &vars {
            buf.write_var(v).unwrap();
        }
        let end = buf.pos();
        assert_eq!(buf.num_vars(), vars.len());

        buf.reset();
        for v in &vars {
            let entry = buf.read_var().unwrap();
            assert_eq!(entry.name, v.name());
            assert_eq!(entry.data, v.data());
        }
        assert_eq!(buf.pos(), end);
    }

    #[test]
    fn reset_and_replay_is_idempotent() {
        let vars = [
            UniformVar::float("a", 1.0).unwrap(),
            UniformVar::int("b", 2).unwrap(),
            UniformVar::create("c", ParameterType::Float3Array, 3).unwrap(),
        ];
        let mut buf = UniformBuffer::create(512);
        for v in &vars {
            buf.write_var(v).unwrap();
        }
        let first = buf.written().to_vec();

        buf.reset();
        for v in &vars {
            buf.write_var(v).unwrap();
        }
        assert_eq!(buf.written(), first.as_slice());
    }

    #[test]
    fn overflowing_write_is_noop() {
        let mut buf = UniformBuffer::create(8);
        assert!(buf.write(&[1, 2, 3, 4, 5, 6]));
        assert!(!buf.write(&[7, 8, 9]));
        assert_eq!(buf.pos(), 6);
        assert!(buf.write(&[7, 8]));
        assert_eq!(buf.pos(), 8);
        assert!(!buf.write(&[1]));
    }

    #[test]
    fn zero_size_is_noop() {
        let mut buf = UniformBuffer::create(8);
        assert!(!buf.write(&[]));
        assert!(buf.read(0).is_none());
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn read_past_end_is_refused() {
        let mut buf = UniformBuffer::create(4);
        assert!(buf.read(5).is_none());
        assert_eq!(buf.pos(), 0);
        assert_eq!(buf.read(4), Some(&[0u8; 4][..]));
    }

    #[test]
    fn no_partial_var_write() {
        let var = UniformVar::mat4("model", Mat4::IDENTITY).unwrap();
        let mut buf = UniformBuffer::create(wire::encoded_len(&var) - 1);
        let err = buf.write_var(&var).unwrap_err();
        assert!(matches!(err, UniformError::BufferFull { .. }));
        assert_eq!(buf.pos(), 0);
        assert_eq!(buf.num_vars(), 0);
        assert!(buf.written().is_empty());
    }

    #[test]
    fn read_var_on_garbage_keeps_cursor() {
        let mut buf = UniformBuffer::create(8);
        buf.write(&wire::encode_header(100, 0).unwrap().to_le_bytes());
        buf.reset();
        assert!(buf.read_var().is_none());
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn destroyed_buffer_refuses_everything() {
        let mut buf = UniformBuffer::create(64);
        buf.destroy();
        assert_eq!(buf.capacity(), 0);
        assert!(!buf.write(&[1]));
        assert!(buf.write_var(&UniformVar::float("x", 0.0).unwrap()).is_err());
    }

    #[test]
    fn written_since_slices_tail() {
        let mut buf = UniformBuffer::create(64);
        buf.write_var(&UniformVar::float("a", 1.0).unwrap()).unwrap();
        let mark = buf.pos();
        buf.write_var(&UniformVar::float("b", 2.0).unwrap()).unwrap();
        let tail = buf.written_since(mark);
        let (var, _) = wire::decode_var(tail).unwrap();
        assert_eq!(var.name, "b");
    }
}
