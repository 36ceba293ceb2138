use num_bigint::BigUint;
use num_traits::Zero;

/// Inverse of `a` modulo the prime `q`, via Fermat's little theorem.
///
/// Returns `None` when `a ≡ 0 (mod q)`.
pub fn mod_inverse_prime(a: &BigUint, q: &BigUint) -> Option<BigUint> {
    let reduced = a % q;
    if reduced.is_zero() {
        return None;
    }
    let exponent = q - 2u32;
    Some(reduced.modpow(&exponent, q))
}

/// Magnitude of the centred representative of `value mod q`, i.e.
/// `min(value, q - value)` for `value` in `[0, q)`.
pub fn centered_abs(value: &BigUint, q: &BigUint) -> BigUint {
    let reduced = value % q;
    let complement = q - &reduced;
    if reduced <= complement {
        reduced
    } else {
        complement
    }
}

/// Most significant `count` bits of `value`, read as a `width`-bit number,
/// returned big-endian and left-padded to whole bytes.
///
/// # Panics
///
/// Panics if `count > width` or `value` needs more than `width` bits.
pub fn top_bits(value: &BigUint, width: u64, count: u64) -> Vec<u8> {
    assert!(count <= width, "top_bits: count {count} exceeds width {width}");
    assert!(
        value.bits() <= width,
        "top_bits: value has {} bits, width is {width}",
        value.bits()
    );
    let shifted = value >> (width - count);
    let byte_len = count.div_ceil(8) as usize;
    let raw = shifted.to_bytes_be();
    let mut out = vec![0u8; byte_len.saturating_sub(raw.len())];
    out.extend_from_slice(&raw);
    out
}
