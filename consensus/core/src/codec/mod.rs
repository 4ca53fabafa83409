//! Binary encoding of UTXO records and wire transactions.
//!
//! Encoders write into any [`WireWrite`] sink and cannot fail (apart from records which
//! cannot be represented at all). Decoders read from a [`WireReader`] over a borrowed
//! byte slice and return [`CodecError`] on malformed input.

mod element;
mod errors;
pub mod tx;
pub mod utxo;
mod varint;

pub use element::{ElementKind, WireElement};
pub use errors::{CodecError, CodecResult};
pub use varint::{varint_size, write_var_bytes, write_varint};

/// An infallible byte sink
pub trait WireWrite {
    fn write_bytes(&mut self, bytes: &[u8]);

    fn write_element(&mut self, element: WireElement)
    where
        Self: Sized,
    {
        element.write(self)
    }
}

impl WireWrite for Vec<u8> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl<W: WireWrite> WireWrite for &mut W {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        (*self).write_bytes(bytes)
    }
}

/// A forward-only cursor over an encoded byte slice
pub struct WireReader<'a> {
    bytes: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    /// Consumes and returns the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.bytes.len() < len {
            return Err(CodecError::UnexpectedEof { needed: len, remaining: self.bytes.len() });
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Asserts the whole input was consumed
    pub fn finish(self) -> CodecResult<()> {
        match self.bytes.len() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
