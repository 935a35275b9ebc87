/// Dense byte buffer backing a literal.
///
/// The buffer never changes length after allocation; elements are addressed
/// by byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralStorage {
    bytes: Vec<u8>,
}

impl LiteralStorage {
    /// Allocate `len` zero-filled bytes.
    pub fn zeroed(len: usize) -> Self {
        LiteralStorage {
            bytes: vec![0u8; len],
        }
    }

    /// Number of bytes in this storage.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the storage holds no bytes (a zero-element shape).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes of the element at `index` for elements `width` bytes wide.
    ///
    /// Callers guarantee the range is in bounds.
    pub(crate) fn element(&self, index: usize, width: usize) -> &[u8] {
        let start = index * width;
        &self.bytes[start..start + width]
    }

    pub(crate) fn element_mut(&mut self, index: usize, width: usize) -> &mut [u8] {
        let start = index * width;
        &mut self.bytes[start..start + width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let s = LiteralStorage::zeroed(16);
        assert_eq!(s.len(), 16);
        assert!(!s.is_empty());
        assert!(s.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty() {
        let s = LiteralStorage::zeroed(0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_element_slices() {
        let mut s = LiteralStorage::zeroed(8);
        s.element_mut(1, 4).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(s.element(1, 4), &[1, 2, 3, 4]);
        assert_eq!(s.element(0, 4), &[0, 0, 0, 0]);
    }
}
