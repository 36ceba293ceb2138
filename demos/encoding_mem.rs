#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use num_bigint::BigUint;
use toy_ggh_graded::{Context, GradedResult, Level};

fn main() -> GradedResult<()> {
    #[cfg(feature = "dhat-heap")]
    let _dhat = dhat::Profiler::new_heap();

    let kappa = 12;
    println!("Setting up an asymmetric context with kappa = {kappa}");
    let ctx = Context::builder().kappa(kappa).lambda(40).seed(99).asymmetric().build()?;
    println!("{ctx}");

    println!("Encoding a 64 x 64 matrix per slot...");
    let rows: Vec<Vec<BigUint>> = (0..64u32)
        .map(|i| (0..64u32).map(|j| BigUint::from(i * 64 + j)).collect())
        .collect();
    let mut matrices = Vec::with_capacity(kappa);
    for slot in 0..kappa {
        matrices.push(ctx.encode_matrix(&rows, Level::slot(slot))?);
    }

    println!("Multiplying one entry across all slots...");
    let diagonal: Vec<_> = matrices.iter().map(|m| &m[1][1]).collect();
    let product = ctx.product(diagonal)?;
    println!("top level: {}", product.is_top_level());
    println!("zero: {}", product.is_zero()?);

    ctx.dispose();
    Ok(())
}
