use fnv::FnvHasher;
use murmur3::murmur3_32;
use std::hash::Hasher;
use std::io::Cursor;

/// A type alias for the location function used by the Bloom filter.
///
/// Maps an input byte string and a hash count `k` to `k` bit locations.
/// Locations are raw `u64` values; the bitmap reduces them modulo its own
/// size, so the same function works for any backend capacity.
///
/// The function must be deterministic: the same input and `k` always yield
/// the same location set.
pub type LocationFn = fn(&[u8], u64) -> Vec<u64>;

pub(crate) fn hash_murmur32(key: &[u8]) -> u32 {
    let mut cursor = Cursor::new(key);
    murmur3_32(&mut cursor, 0).expect("Failed to compute Murmur3 hash")
}

pub(crate) fn hash_fnv64(key: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish()
}

/// Default location function using the standard double-hashing scheme:
/// `location_i = h1 + i * h2` with murmur3 and FNV-1a as the two hashes.
pub fn default_locations(data: &[u8], k: u64) -> Vec<u64> {
    let h1 = u64::from(hash_murmur32(data));
    let h2 = hash_fnv64(data);
    (0..k).map(|i| h1.wrapping_add(i.wrapping_mul(h2))).collect()
}

/// Bit array size for `n` expected elements at false positive rate `fpr`.
pub fn optimal_bits(n: u64, fpr: f64) -> u64 {
    let ln2 = std::f64::consts::LN_2;
    ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil() as u64
}

/// Hash count for `n` expected elements in an `m`-bit array.
pub fn optimal_hashes(n: u64, m: u64) -> u64 {
    ((m as f64 / n as f64) * std::f64::consts::LN_2).round() as u64
}
