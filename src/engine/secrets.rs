use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Trapdoor values that exist only during parameter generation.
///
/// Dropping the holder overwrites every limb in place, so the secrets are
/// cleared on the success path and on every early return alike.
#[derive(Default)]
pub(crate) struct TrapdoorSecrets {
    /// Level denominators `z_i`.
    pub z: Vec<BigUint>,
    /// Their inverses modulo `q`.
    pub z_inv: Vec<BigUint>,
    /// Zero-test multiplier `h`.
    pub h: BigUint,
    /// `Π z_i`, or `z^κ` under symmetric grading.
    pub z_product: BigUint,
}

/// Overwrites the limbs of `value` with zeros, keeping the allocation.
pub(crate) fn wipe(value: &mut BigUint) {
    let digits = value.bits().div_ceil(32) as usize;
    // `assign_from_slice` clears and refills the existing limb buffer.
    value.assign_from_slice(&vec![0u32; digits.max(1)]);
}

/// `acc ← acc · factor mod q`, wiping the unreduced product and the previous
/// value of `acc`.
pub(crate) fn mul_mod_assign(acc: &mut BigUint, factor: &BigUint, q: &BigUint) {
    let mut product = &*acc * factor;
    let reduced = &product % q;
    wipe(&mut product);
    wipe(acc);
    *acc = reduced;
}

impl Zeroize for TrapdoorSecrets {
    fn zeroize(&mut self) {
        for value in self.z.iter_mut().chain(self.z_inv.iter_mut()) {
            wipe(value);
        }
        wipe(&mut self.h);
        wipe(&mut self.z_product);
        self.z.clear();
        self.z_inv.clear();
    }
}

impl Drop for TrapdoorSecrets {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for TrapdoorSecrets {}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn wipe_zeroes_in_place() {
        let mut value = (BigUint::from(1u32) << 300u32) + 12345u32;
        wipe(&mut value);
        assert!(value.is_zero());
    }

    #[test]
    fn zeroize_clears_all_fields() {
        let mut secrets = TrapdoorSecrets {
            z: vec![BigUint::from(7u32), BigUint::from(u64::MAX)],
            z_inv: vec![BigUint::from(11u32)],
            h: BigUint::from(99u32),
            z_product: BigUint::from(77u32),
        };
        secrets.zeroize();
        assert!(secrets.z.is_empty());
        assert!(secrets.z_inv.is_empty());
        assert!(secrets.h.is_zero());
        assert!(secrets.z_product.is_zero());
    }

    #[test]
    fn mul_mod_assign_reduces_in_place() {
        let q = BigUint::from(101u32);
        let mut acc = BigUint::from(50u32);
        mul_mod_assign(&mut acc, &BigUint::from(3u32), &q);
        assert_eq!(acc, BigUint::from(150u32 % 101));
        mul_mod_assign(&mut acc, &BigUint::from(0u32), &q);
        assert!(acc.is_zero());
    }
}
