use super::Bitmap;
use crate::error::{FilterError, Result};
use bitvec::{bitvec, order::Lsb0, vec::BitVec};
use std::sync::RwLock;

/// Process-local bitmap over a `bitvec` bit vector.
///
/// The bits sit behind an `RwLock` so `set_bits` works through `&self`;
/// filters are shared between caller threads and the rotator's background
/// thread, which only ever hold shared references to them.
pub struct InMemoryBitmap {
    bits: RwLock<BitVec<usize, Lsb0>>,
    size: u64,
}

impl InMemoryBitmap {
    /// Creates a bitmap of `size` bits. Locations are reduced modulo
    /// `size`, so `size` must be greater than zero.
    pub fn new(size: u64) -> Self {
        debug_assert!(size > 0, "bitmap size must be > 0");
        Self {
            bits: RwLock::new(bitvec![0; size as usize]),
            size,
        }
    }

    /// Declared size in bits.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Bitmap for InMemoryBitmap {
    fn check_bits(&self, locations: &[u64]) -> Result<bool> {
        let bits = self
            .bits
            .read()
            .map_err(|e| FilterError::StorageError(format!("bitmap lock poisoned: {e}")))?;
        for &loc in locations {
            if !bits[(loc % self.size) as usize] {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn set_bits(&self, locations: &[u64]) -> Result<()> {
        let mut bits = self
            .bits
            .write()
            .map_err(|e| FilterError::StorageError(format!("bitmap lock poisoned: {e}")))?;
        for &loc in locations {
            bits.set((loc % self.size) as usize, true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bits_on_empty_bitmap() {
        let bitmap = InMemoryBitmap::new(500);
        let exist = bitmap.check_bits(&[12345, 67890, 13579]).unwrap();
        assert!(!exist);
    }

    #[test]
    fn test_set_then_check_bits() {
        let bitmap = InMemoryBitmap::new(500);
        let locs = [12345, 67890, 13579];
        bitmap.set_bits(&locs).unwrap();
        assert!(bitmap.check_bits(&locs).unwrap());
    }

    #[test]
    fn test_check_fails_on_single_unset_bit() {
        let bitmap = InMemoryBitmap::new(100);
        bitmap.set_bits(&[1, 2]).unwrap();
        assert!(!bitmap.check_bits(&[1, 2, 3]).unwrap());
    }

    #[test]
    fn test_modulo_addressing() {
        let bitmap = InMemoryBitmap::new(100);
        bitmap.set_bits(&[250]).unwrap();
        // 250 % 100 == 50, both views must agree
        assert!(bitmap.check_bits(&[50]).unwrap());
        assert!(bitmap.check_bits(&[250]).unwrap());
        assert!(bitmap.check_bits(&[150]).unwrap());
    }

    #[test]
    fn test_set_bits_is_idempotent() {
        let bitmap = InMemoryBitmap::new(100);
        bitmap.set_bits(&[7, 7, 7]).unwrap();
        bitmap.set_bits(&[7]).unwrap();
        assert!(bitmap.check_bits(&[7]).unwrap());
        assert!(!bitmap.check_bits(&[8]).unwrap());
    }

    #[test]
    #[should_panic(expected = "bitmap size must be > 0")]
    fn test_zero_size_rejected() {
        let _ = InMemoryBitmap::new(0);
    }

    #[test]
    fn test_no_expiry_capability() {
        let bitmap = InMemoryBitmap::new(100);
        assert!(bitmap.as_expiring().is_none());
    }
}
