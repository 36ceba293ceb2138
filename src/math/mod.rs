pub mod primes;
pub mod sampling;
pub mod utils;

pub use primes::{BIG_PRIME_ROUNDS, is_prime, is_probable_prime, random_prime};
pub use sampling::{
    random_biguint_below, random_biguint_bits, random_biguint_with_bits,
    random_nonzero_residue, small_error,
};
pub use utils::{centered_abs, mod_inverse_prime, top_bits};
