use crate::codec::WireWrite;
use utxodag_hashes::HasherBase;

pub mod tx;

/// Adapts a hasher into a codec sink, so records are hashed in their encoded form
/// without an intermediate buffer
pub struct HashWriter<'a, H: HasherBase>(&'a mut H);

impl<'a, H: HasherBase> HashWriter<'a, H> {
    pub fn new(hasher: &'a mut H) -> Self {
        Self(hasher)
    }
}

impl<H: HasherBase> WireWrite for HashWriter<'_, H> {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}
