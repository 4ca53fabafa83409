use super::{CodecError, CodecResult, WireReader, WireWrite};
use crate::subnets::{SUBNETWORK_ID_SIZE, SubnetworkId};
use utxodag_hashes::{HASH_SIZE, Hash};

/// The closed set of fixed-width field kinds the codec knows how to encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    U8,
    U16,
    U32,
    U64,
    Bool,
    Hash,
    SubnetworkId,
}

impl ElementKind {
    /// The encoded size of elements of this kind
    pub const fn size(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::Bool => 1,
            ElementKind::U16 => 2,
            ElementKind::U32 => 4,
            ElementKind::U64 => 8,
            ElementKind::Hash => HASH_SIZE,
            ElementKind::SubnetworkId => SUBNETWORK_ID_SIZE,
        }
    }
}

/// A fixed-width field value. Integers are encoded little-endian, booleans as a
/// single `0`/`1` byte and hashes/ids as their raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireElement {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    Hash(Hash),
    SubnetworkId(SubnetworkId),
}

impl WireElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            WireElement::U8(_) => ElementKind::U8,
            WireElement::U16(_) => ElementKind::U16,
            WireElement::U32(_) => ElementKind::U32,
            WireElement::U64(_) => ElementKind::U64,
            WireElement::Bool(_) => ElementKind::Bool,
            WireElement::Hash(_) => ElementKind::Hash,
            WireElement::SubnetworkId(_) => ElementKind::SubnetworkId,
        }
    }

    pub fn write<W: WireWrite>(&self, w: &mut W) {
        match self {
            WireElement::U8(v) => w.write_bytes(&[*v]),
            WireElement::U16(v) => w.write_bytes(&v.to_le_bytes()),
            WireElement::U32(v) => w.write_bytes(&v.to_le_bytes()),
            WireElement::U64(v) => w.write_bytes(&v.to_le_bytes()),
            WireElement::Bool(v) => w.write_bytes(&[*v as u8]),
            WireElement::Hash(v) => w.write_bytes(&v.as_bytes()),
            WireElement::SubnetworkId(v) => w.write_bytes(v.as_ref()),
        }
    }

    pub fn read(r: &mut WireReader<'_>, kind: ElementKind) -> CodecResult<Self> {
        Ok(match kind {
            ElementKind::U8 => WireElement::U8(r.read_u8()?),
            ElementKind::U16 => WireElement::U16(r.read_u16()?),
            ElementKind::U32 => WireElement::U32(r.read_u32()?),
            ElementKind::U64 => WireElement::U64(r.read_u64()?),
            ElementKind::Bool => WireElement::Bool(r.read_bool()?),
            ElementKind::Hash => WireElement::Hash(r.read_hash()?),
            ElementKind::SubnetworkId => WireElement::SubnetworkId(r.read_subnetwork_id()?),
        })
    }
}

impl WireReader<'_> {
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(CodecError::InvalidBool(b)),
        }
    }

    pub fn read_hash(&mut self) -> CodecResult<Hash> {
        Ok(Hash::from_bytes(self.read_array()?))
    }

    pub fn read_subnetwork_id(&mut self) -> CodecResult<SubnetworkId> {
        Ok(SubnetworkId::from_bytes(self.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets::SUBNETWORK_ID_COINBASE;

    #[test]
    fn test_elements() {
        let elements = [
            WireElement::U8(0xab),
            WireElement::U16(0x0102),
            WireElement::U32(0x01020304),
            WireElement::U64(u64::MAX - 1),
            WireElement::Bool(true),
            WireElement::Hash(Hash::from_u64_word(42)),
            WireElement::SubnetworkId(SUBNETWORK_ID_COINBASE),
        ];
        let mut bytes = Vec::new();
        for element in elements.iter() {
            bytes.write_element(*element);
        }
        assert_eq!(bytes.len(), elements.iter().map(|e| e.kind().size()).sum::<usize>());
        assert_eq!(&bytes[1..3], &[0x02, 0x01]);

        let mut reader = WireReader::new(&bytes);
        for element in elements.iter() {
            assert_eq!(WireElement::read(&mut reader, element.kind()).unwrap(), *element);
        }
        reader.finish().unwrap();

        assert_eq!(WireReader::new(&[2]).read_bool(), Err(CodecError::InvalidBool(2)));
    }
}
