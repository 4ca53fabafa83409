use std::fmt::{Debug, Display};

/// A full DB key: a store prefix followed by the store-level key bytes
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DbKey {
    path: Vec<u8>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<TKey>(prefix: &[u8], key: TKey) -> Self
    where
        TKey: AsRef<[u8]>,
    {
        Self { path: prefix.iter().chain(key.as_ref().iter()).copied().collect(), prefix_len: prefix.len() }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [])
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// The store-level part of the key, i.e., without the prefix
    pub fn key(&self) -> &[u8] {
        &self.path[self.prefix_len..]
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, key) = self.path.split_at(self.prefix_len);
        f.write_str(&faster_hex::hex_string(prefix))?;
        f.write_str("/")?;
        f.write_str(&faster_hex::hex_string(key))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = DbKey::new(&[25], [0xab, 0xcd]);
        assert_eq!(key.to_string(), "19/abcd");
        assert_eq!(key.as_ref(), &[25, 0xab, 0xcd]);
        assert_eq!(key.key(), &[0xab, 0xcd]);
        assert_eq!(DbKey::prefix_only(&[27]).to_string(), "1b/");
    }
}
