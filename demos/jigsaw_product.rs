//! Multiplies one encoding per asymmetric slot and checks the result against
//! an encoding of the plaintext product. `--verbose` sets the verbose
//! diagnostics flag on the context.

use num_bigint::BigUint;
use toy_ggh_graded::{Context, Flags, GradedResult, Level};

const KAPPA: usize = 5;

fn main() -> GradedResult<()> {
    let verbose = std::env::args().any(|arg| arg == "--verbose");
    let mut flags = Flags::ASYMMETRIC | Flags::HARDENED_INVERSE_SAMPLING;
    if verbose {
        flags |= Flags::VERBOSE;
    }

    let ctx = Context::builder().kappa(KAPPA).lambda(20).seed(7).flags(flags).build()?;
    println!("{ctx}");
    println!("plaintext ring: {}", ctx.plaintext_ring());
    if ctx.is_seed_insecure() {
        println!("warning: running on the insecure default seed");
    }

    let ring = ctx.plaintext_ring();
    let xs: Vec<BigUint> = (0..KAPPA)
        .map(|_| ring.random(&mut rand::rng()))
        .collect();
    for (slot, x) in xs.iter().enumerate() {
        println!("x{slot} = {x}");
    }

    let factors = xs
        .iter()
        .enumerate()
        .map(|(slot, x)| ctx.encode(x, Level::slot(slot)))
        .collect::<GradedResult<Vec<_>>>()?;
    let value1 = ctx.product(&factors)?;

    let mut value2 = ctx.encode(&ring.product(&xs), Level::slot(0))?;
    for slot in 1..KAPPA {
        value2 = value2.multiply(&ctx.encode(&BigUint::from(1u32), Level::slot(slot))?)?;
    }

    let difference = value1.sub(&value2)?;
    println!(
        "zero test: {} (norm {} bits, threshold {} bits)",
        difference.is_zero()?,
        difference.zero_test_norm_bits()?,
        ctx.zero_test_threshold_bits()
    );
    println!(
        "canonical values agree: {}",
        value1.extract_canonical()? == value2.extract_canonical()?
    );

    ctx.dispose();
    match value1.is_zero() {
        Err(err) => println!("after dispose: {err}"),
        Ok(_) => println!("after dispose: unexpectedly usable"),
    }
    Ok(())
}
