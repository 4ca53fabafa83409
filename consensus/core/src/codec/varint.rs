use super::{CodecError, CodecResult, WireReader, WireWrite};

/// Returns the number of bytes `value` occupies when encoded as a varint
pub fn varint_size(value: u64) -> usize {
    match value {
        0..0xfd => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Writes `value` using the shortest varint encoding: a single byte below `0xfd`,
/// otherwise a `0xfd`/`0xfe`/`0xff` prefix followed by 2/4/8 little-endian bytes
pub fn write_varint<W: WireWrite>(w: &mut W, value: u64) {
    match value {
        0..0xfd => w.write_bytes(&[value as u8]),
        0xfd..=0xffff => {
            w.write_bytes(&[0xfd]);
            w.write_bytes(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            w.write_bytes(&[0xfe]);
            w.write_bytes(&(value as u32).to_le_bytes());
        }
        _ => {
            w.write_bytes(&[0xff]);
            w.write_bytes(&value.to_le_bytes());
        }
    }
}

/// Writes a varint length prefix followed by the bytes themselves
pub fn write_var_bytes<W: WireWrite>(w: &mut W, bytes: &[u8]) {
    write_varint(w, bytes.len() as u64);
    w.write_bytes(bytes);
}

impl<'a> WireReader<'a> {
    /// Reads a varint, rejecting encodings which are longer than necessary
    pub fn read_varint(&mut self) -> CodecResult<u64> {
        let prefix = self.read_array::<1>()?[0];
        let (value, min) = match prefix {
            0xff => (u64::from_le_bytes(self.read_array()?), 0x1_0000_0000),
            0xfe => (u32::from_le_bytes(self.read_array()?) as u64, 0x10000),
            0xfd => (u16::from_le_bytes(self.read_array()?) as u64, 0xfd),
            _ => return Ok(prefix as u64),
        };
        if value < min {
            return Err(CodecError::NonCanonicalVarInt { prefix, value });
        }
        Ok(value)
    }

    /// Reads a varint-prefixed byte array of at most `max_len` bytes
    pub fn read_var_bytes(&mut self, max_len: u64) -> CodecResult<&'a [u8]> {
        let len = self.read_varint()?;
        if len > max_len {
            return Err(CodecError::VarBytesTooLong(len, max_len));
        }
        self.read_bytes(len as usize)
    }

    /// Reads a varint collection length of at most `max_len` items
    pub fn read_collection_len(&mut self, max_len: u64) -> CodecResult<usize> {
        let len = self.read_varint()?;
        if len > max_len {
            return Err(CodecError::CollectionTooLong(len, max_len));
        }
        Ok(len as usize)
    }
}
