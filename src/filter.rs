//! Bloom filter logic on top of the [`Bitmap`] abstraction.

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::hash::{LocationFn, default_locations};

/// Membership operations shared by plain filters and the rotator.
pub trait FilterOps: Send + Sync {
    /// Inserts `data`. Insertion is unconditional and idempotent; there is
    /// no "already present" signal.
    fn add(&self, data: &[u8]) -> Result<()>;

    /// Tests membership. False positives are possible; false negatives are
    /// not, for elements actually added and not yet rotated out. On error
    /// the answer is indeterminate.
    fn exist(&self, data: &[u8]) -> Result<bool>;
}

/// A single filter generation bound to exactly one bitmap.
pub trait Filter: FilterOps {
    /// The bitmap backing this generation, for capability probing.
    fn bitmap(&self) -> &dyn Bitmap;
}

pub struct BloomFilter {
    bitmap: Box<dyn Bitmap>,
    /// Number of bits in the filter.
    bits: u64,
    /// Number of hash locations per element.
    hashes: u64,
    locate: LocationFn,
}

impl BloomFilter {
    pub fn new(bitmap: Box<dyn Bitmap>, bits: u64, hashes: u64) -> Self {
        Self::with_locations(bitmap, bits, hashes, default_locations)
    }

    pub fn with_locations(
        bitmap: Box<dyn Bitmap>,
        bits: u64,
        hashes: u64,
        locate: LocationFn,
    ) -> Self {
        Self {
            bitmap,
            bits,
            hashes,
            locate,
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn hashes(&self) -> u64 {
        self.hashes
    }
}

impl FilterOps for BloomFilter {
    fn add(&self, data: &[u8]) -> Result<()> {
        let locations = (self.locate)(data, self.hashes);
        self.bitmap.set_bits(&locations)
    }

    fn exist(&self, data: &[u8]) -> Result<bool> {
        let locations = (self.locate)(data, self.hashes);
        self.bitmap.check_bits(&locations)
    }
}

impl Filter for BloomFilter {
    fn bitmap(&self) -> &dyn Bitmap {
        self.bitmap.as_ref()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter {{ bits: {}, hashes: {} }}",
            self.bits, self.hashes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::InMemoryBitmap;
    use crate::error::FilterError;
    use std::sync::{Arc, Mutex};

    /// Bitmap double that records calls and can be switched to fail. The
    /// call log is shared so tests can inspect it after boxing the stub.
    struct StubBitmap {
        set_calls: Arc<Mutex<Vec<Vec<u64>>>>,
        check_calls: Arc<Mutex<Vec<Vec<u64>>>>,
        check_answer: bool,
        fail: bool,
    }

    impl StubBitmap {
        fn new(check_answer: bool, fail: bool) -> Self {
            Self {
                set_calls: Arc::new(Mutex::new(Vec::new())),
                check_calls: Arc::new(Mutex::new(Vec::new())),
                check_answer,
                fail,
            }
        }
    }

    impl Bitmap for StubBitmap {
        fn check_bits(&self, locations: &[u64]) -> Result<bool> {
            self.check_calls.lock().unwrap().push(locations.to_vec());
            if self.fail {
                return Err(FilterError::StorageError("internal error".into()));
            }
            Ok(self.check_answer)
        }

        fn set_bits(&self, locations: &[u64]) -> Result<()> {
            self.set_calls.lock().unwrap().push(locations.to_vec());
            if self.fail {
                return Err(FilterError::StorageError("internal error".into()));
            }
            Ok(())
        }
    }

    fn stub_locations(data: &[u8], _k: u64) -> Vec<u64> {
        if data == b"hello" { vec![1] } else { vec![0] }
    }

    #[test]
    fn test_exist_delegates_to_bitmap() {
        let filter = BloomFilter::with_locations(
            Box::new(StubBitmap::new(true, false)),
            100,
            3,
            stub_locations,
        );
        assert!(filter.exist(b"hello").unwrap());

        let filter = BloomFilter::with_locations(
            Box::new(StubBitmap::new(false, false)),
            100,
            3,
            stub_locations,
        );
        assert!(!filter.exist(b"hello").unwrap());
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let filter = BloomFilter::with_locations(
            Box::new(StubBitmap::new(false, true)),
            100,
            3,
            stub_locations,
        );
        assert!(filter.exist(b"hello").is_err());
        assert!(filter.add(b"hello").is_err());
    }

    #[test]
    fn test_add_and_exist_use_located_bits() {
        let bitmap = StubBitmap::new(true, false);
        let set_calls = Arc::clone(&bitmap.set_calls);
        let check_calls = Arc::clone(&bitmap.check_calls);
        let filter =
            BloomFilter::with_locations(Box::new(bitmap), 100, 3, stub_locations);

        filter.add(b"hello").unwrap();
        filter.exist(b"other").unwrap();

        assert_eq!(*set_calls.lock().unwrap(), vec![vec![1]]);
        assert_eq!(*check_calls.lock().unwrap(), vec![vec![0]]);
    }

    #[test]
    fn test_hello_world_scenario() {
        let filter =
            BloomFilter::new(Box::new(InMemoryBitmap::new(100)), 100, 3);
        filter.add(b"hello").unwrap();
        assert!(filter.exist(b"hello").unwrap());
        assert!(!filter.exist(b"world").unwrap());
    }

    #[test]
    fn test_no_false_negatives() {
        let filter =
            BloomFilter::new(Box::new(InMemoryBitmap::new(10_000)), 10_000, 4);
        let items: Vec<Vec<u8>> = (0..100)
            .map(|i| format!("item_{i:04}").into_bytes())
            .collect();
        for item in &items {
            filter.add(item).unwrap();
        }
        for item in &items {
            assert!(filter.exist(item).unwrap());
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let filter =
            BloomFilter::new(Box::new(InMemoryBitmap::new(100)), 100, 3);
        filter.add(b"hello").unwrap();
        filter.add(b"hello").unwrap();
        assert!(filter.exist(b"hello").unwrap());
    }
}
