use std::collections::HashSet;
use std::sync::LazyLock;

use paste::paste;
use proptest::prelude::*;
use toy_ggh_graded::{Context, GghContext, Level};

static SYMMETRIC: LazyLock<GghContext> = LazyLock::new(|| {
    Context::builder()
        .kappa(3)
        .lambda(16)
        .seed(11)
        .build()
        .unwrap()
});

static ASYMMETRIC: LazyLock<GghContext> = LazyLock::new(|| {
    Context::builder()
        .kappa(3)
        .lambda(16)
        .seed(12)
        .asymmetric()
        .build()
        .unwrap()
});

// Generates the same property suite for a context and a pair of factor
// levels whose product is the top level.
macro_rules! homomorphism_tests {
    ($mode:ident, $ctx:ident, $left:expr, $right:expr) => {
        paste! {
            proptest! {
                #![proptest_config(ProptestConfig::with_cases(24))]

                #[test]
                fn [<$mode _addition_matches_plaintext_sum>](x in any::<u64>(), y in any::<u64>()) {
                    let ctx = &*$ctx;
                    let ring = ctx.plaintext_ring();
                    let top = ctx.top_level();
                    let (x, y) = (ring.element(x), ring.element(y));

                    let sum = ctx.encode(&x, &top).unwrap().add(&ctx.encode(&y, &top).unwrap()).unwrap();
                    let expected = ctx.encode(&ring.add(&x, &y), &top).unwrap();
                    prop_assert_eq!(sum.level(), &top);
                    prop_assert!(sum.sub(&expected).unwrap().is_zero().unwrap());
                }

                #[test]
                fn [<$mode _subtraction_detects_equality>](x in any::<u64>(), y in any::<u64>()) {
                    let ctx = &*$ctx;
                    let ring = ctx.plaintext_ring();
                    let top = ctx.top_level();
                    let (x, y) = (ring.element(x), ring.element(y));

                    let diff = ctx.encode(&x, &top).unwrap().sub(&ctx.encode(&y, &top).unwrap()).unwrap();
                    prop_assert_eq!(diff.is_zero().unwrap(), x == y);
                    let same = ctx.encode(&x, &top).unwrap().sub(&ctx.encode(&x, &top).unwrap()).unwrap();
                    prop_assert!(same.is_zero().unwrap());
                }

                #[test]
                fn [<$mode _multiplication_matches_plaintext_product>](x in any::<u64>(), y in any::<u64>()) {
                    let ctx = &*$ctx;
                    let ring = ctx.plaintext_ring();
                    let (x, y) = (ring.element(x), ring.element(y));

                    let product = ctx.encode(&x, $left).unwrap().multiply(&ctx.encode(&y, $right).unwrap()).unwrap();
                    prop_assert!(product.is_top_level());
                    let expected = ctx.encode(&ring.mul(&x, &y), ctx.top_level()).unwrap();
                    prop_assert!(product.sub(&expected).unwrap().is_zero().unwrap());
                }

                #[test]
                fn [<$mode _nonzero_values_fail_the_zero_test>](x in any::<u64>()) {
                    let ctx = &*$ctx;
                    let x = ctx.plaintext_ring().element(x);
                    prop_assume!(x != num_bigint::BigUint::ZERO);
                    prop_assert!(!ctx.encode(&x, ctx.top_level()).unwrap().is_zero().unwrap());
                }

                #[test]
                fn [<$mode _elevation_preserves_value>](x in any::<u64>(), rerandomize in any::<bool>()) {
                    let ctx = &*$ctx;
                    let x = ctx.plaintext_ring().element(x);
                    let low = ctx.encode(&x, $left).unwrap();
                    let raised = low.elevate(ctx.top_level(), rerandomize).unwrap();
                    let direct = ctx.encode(&x, ctx.top_level()).unwrap();
                    prop_assert!(raised.sub(&direct).unwrap().is_zero().unwrap());
                }

                #[test]
                fn [<$mode _extraction_is_canonical>](x in any::<u64>()) {
                    let ctx = &*$ctx;
                    let x = ctx.plaintext_ring().element(x);
                    let encodings: Vec<_> = (0..4)
                        .map(|_| ctx.encode(&x, ctx.top_level()).unwrap())
                        .collect();
                    let representations: HashSet<_> =
                        encodings.iter().map(|e| e.representation()).collect();
                    prop_assert!(representations.len() > 1);
                    let expected = encodings[0].extract_canonical().unwrap();
                    for enc in &encodings[1..] {
                        prop_assert_eq!(enc.extract_canonical().unwrap(), expected.clone());
                    }
                }

                #[test]
                fn [<$mode _zeros_extract_alike>](x in any::<u64>()) {
                    let ctx = &*$ctx;
                    let x = ctx.plaintext_ring().element(x);
                    let top = ctx.top_level();
                    let difference = ctx.encode(&x, &top).unwrap().sub(&ctx.encode(&x, &top).unwrap()).unwrap();
                    let zero = ctx.encode(&num_bigint::BigUint::ZERO, &top).unwrap();
                    prop_assert_eq!(difference.extract_canonical().unwrap(), zero.extract_canonical().unwrap());
                }
            }
        }
    };
}

homomorphism_tests!(symmetric, SYMMETRIC, Level::degree(1), Level::degree(2));
homomorphism_tests!(asymmetric, ASYMMETRIC, Level::slot(0), Level::slots([1, 2]));
