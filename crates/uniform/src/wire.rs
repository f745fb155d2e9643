//! Wire encoding of one uniform entry.
//!
//! ```text
//! [u32 header, little-endian][name bytes][data bytes]
//! header = (name_len << 16) | data_len
//! ```
//!
//! Both lengths must fit in 16 bits.

use crate::UniformError;
use crate::var::UniformVar;

/// Bytes taken by the entry header.
pub const HEADER_SIZE: usize = 4;

/// Largest name or payload an entry can carry.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

pub fn encode_header(name_len: usize, data_len: usize) -> Result<u32, UniformError> {
    if name_len > MAX_FIELD_LEN || data_len > MAX_FIELD_LEN {
        return Err(UniformError::FieldTooLong { name_len, data_len });
    }
    Ok(((name_len as u32) << 16) | data_len as u32)
}

/// Splits a header into `(name_len, data_len)`.
pub fn decode_header(header: u32) -> (usize, usize) {
    ((header >> 16) as usize, (header & 0xFFFF) as usize)
}

/// Total encoded size of `var`.
pub fn encoded_len(var: &UniformVar) -> usize {
    HEADER_SIZE + var.name().len() + var.data().len()
}

/// Appends the encoding of `var` to `out`.
pub fn encode_var(var: &UniformVar, out: &mut Vec<u8>) -> Result<(), UniformError> {
    let header = encode_header(var.name().len(), var.data().len())?;
    out.extend_from_slice(&header.to_le_bytes());
    out.extend_from_slice(var.name().as_bytes());
    out.extend_from_slice(var.data());
    Ok(())
}

/// One decoded entry borrowing from the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedVar<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

impl DecodedVar<'_> {
    pub fn to_owned_entry(&self) -> UniformEntry {
        UniformEntry {
            name: self.name.to_owned(),
            data: self.data.to_vec(),
        }
    }
}

/// Owned form of a decoded entry. The parameter type is not on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Decodes one entry at the start of `bytes`; returns it and its encoded length.
pub fn decode_var(bytes: &[u8]) -> Result<(DecodedVar<'_>, usize), UniformError> {
    let header_bytes: [u8; HEADER_SIZE] = bytes
        .get(..HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or(UniformError::Truncated)?;
    let (name_len, data_len) = decode_header(u32::from_le_bytes(header_bytes));
    let name_end = HEADER_SIZE + name_len;
    let end = name_end + data_len;
    if bytes.len() < end {
        return Err(UniformError::Truncated);
    }
    let name = std::str::from_utf8(&bytes[HEADER_SIZE..name_end])
        .map_err(|_| UniformError::InvalidName)?;
    Ok((
        DecodedVar {
            name,
            data: &bytes[name_end..end],
        },
        end,
    ))
}

/// Iterates entries packed back to back. Stops after the first error.
#[derive(Debug, Clone)]
pub struct VarReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> VarReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for VarReader<'a> {
    type Item = Result<DecodedVar<'a>, UniformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        match decode_var(&self.bytes[self.pos..]) {
            Ok((var, len)) => {
                self.pos += len;
                Some(Ok(var))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParameterType;

    #[test]
    fn header_packs_lengths() {
        let h = encode_header(5, 64).unwrap();
        assert_eq!(h, (5 << 16) | 64);
        assert_eq!(decode_header(h), (5, 64));
    }

    #[test]
    fn header_limits() {
        assert!(encode_header(MAX_FIELD_LEN, MAX_FIELD_LEN).is_ok());
        assert!(encode_header(MAX_FIELD_LEN + 1, 0).is_err());
        assert!(encode_header(0, MAX_FIELD_LEN + 1).is_err());
    }

    #[test]
    fn encode_layout() {
        let var = UniformVar::float("t", 1.0).unwrap();
        let mut out = Vec::new();
        encode_var(&var, &mut out).unwrap();
        assert_eq!(out.len(), encoded_len(&var));
        assert_eq!(&out[..4], &((1u32 << 16) | 4).to_le_bytes());
        assert_eq!(out[4], b't');
        assert_eq!(&out[5..], &1.0f32.to_le_bytes());
    }

    #[test]
    fn reader_walks_entries() {
        let a = UniformVar::float("alpha", 0.5).unwrap();
        let b = UniformVar::create("bones", ParameterType::Mat4Array, 2).unwrap();
        let mut out = Vec::new();
        encode_var(&a, &mut out).unwrap();
        encode_var(&b, &mut out).unwrap();

        let decoded: Vec<_> = VarReader::new(&out).collect::<Result<_, _>>().unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "alpha");
        assert_eq!(decoded[0].data, a.data());
        assert_eq!(decoded[1].name, "bones");
        assert_eq!(decoded[1].data.len(), 128);
    }

    #[test]
    fn truncated_entry_reports_error_once() {
        let var = UniformVar::float("alpha", 0.5).unwrap();
        let mut out = Vec::new();
        encode_var(&var, &mut out).unwrap();
        out.truncate(out.len() - 1);

        let mut reader = VarReader::new(&out);
        assert_eq!(reader.next(), Some(Err(UniformError::Truncated)));
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn invalid_utf8_name() {
        let mut out = encode_header(1, 0).unwrap().to_le_bytes().to_vec();
        out.push(0xFF);
        assert_eq!(decode_var(&out), Err(UniformError::InvalidName));
    }
}
