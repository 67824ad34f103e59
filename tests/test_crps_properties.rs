//! Property-based tests for the piecewise CRPS evaluator.

use proptest::prelude::*;

use market_calibration::crps::{crps, crps_step, Knot, PiecewiseCdf};

/// Strategy: a valid piecewise-linear CDF with 2 to 12 knots.
fn cdf_strategy() -> impl Strategy<Value = PiecewiseCdf> {
    (
        -50.0f64..50.0,
        prop::collection::vec((0.01f64..5.0, 0.001f64..1.0), 1..11),
    )
        .prop_map(|(start, steps)| {
            let total: f64 = steps.iter().map(|(_, w)| w).sum();
            let mut knots = vec![Knot::new(start, 0.0)];
            let mut x = start;
            let mut mass = 0.0;
            for (i, (dx, w)) in steps.iter().enumerate() {
                x += dx;
                mass += w;
                let f = if i + 1 == steps.len() { 1.0 } else { (mass / total).min(1.0) };
                knots.push(Knot::new(x, f));
            }
            PiecewiseCdf::new(knots).unwrap()
        })
}

/// Point inside the support at relative position `t`
fn inside(cdf: &PiecewiseCdf, t: f64) -> f64 {
    let (lo, hi) = cdf.support();
    (lo + t * (hi - lo)).clamp(lo, hi)
}

proptest! {
    // 1. Step-function null reproduces |m - y|
    #[test]
    fn step_identity(m in -1000.0f64..1000.0, y in -1000.0f64..1000.0) {
        let score = crps_step(m, y).unwrap();
        let expected = (m - y).abs();
        prop_assert!(
            (score - expected).abs() <= 1e-12 * (1.0 + expected),
            "m={m} y={y} score={score} expected={expected}"
        );
    }

    // 2. Step identity through an explicit step CDF with arbitrary outer bounds
    #[test]
    fn step_identity_wide_bounds(m in -100.0f64..100.0, t in 0.0f64..=1.0, pad_lo in 0.0f64..50.0, pad_hi in 0.0f64..50.0) {
        let lower = m - 100.0 - pad_lo;
        let upper = m + 100.0 + pad_hi;
        let y = (lower + t * (upper - lower)).clamp(lower, upper);
        let step = PiecewiseCdf::step(m, lower, upper).unwrap();
        let score = crps(&step, y).unwrap();
        prop_assert!((score - (m - y).abs()).abs() <= 1e-10);
    }

    // 3. Scores are never negative
    #[test]
    fn score_non_negative(cdf in cdf_strategy(), t in 0.0f64..=1.0) {
        let score = crps(&cdf, inside(&cdf, t)).unwrap();
        prop_assert!(score >= 0.0, "score={score}");
    }

    // 4. Refining on the interpolant leaves the score unchanged
    #[test]
    fn refinement_invariance(cdf in cdf_strategy(), t in 0.0f64..=1.0, s in 0.0f64..=1.0) {
        let y = inside(&cdf, t);
        let refined = cdf.refine(inside(&cdf, s)).unwrap();
        let a = crps(&cdf, y).unwrap();
        let b = crps(&refined, y).unwrap();
        prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a), "a={a} b={b}");
    }

    // 5. An outcome on a knot matches the limits from both sides
    #[test]
    fn knot_boundary_continuity(cdf in cdf_strategy(), pick in any::<prop::sample::Index>()) {
        let knots = cdf.knots();
        prop_assume!(knots.len() > 2);
        let i = 1 + pick.index(knots.len() - 2);
        let y = knots[i].x;
        let eps = 1e-7;

        let at = crps(&cdf, y).unwrap();
        let left = crps(&cdf, y - eps).unwrap();
        let right = crps(&cdf, y + eps).unwrap();
        // |d CRPS / dy| = |2F(y) - 1| <= 1
        prop_assert!((at - left).abs() <= 2.0 * eps, "at={at} left={left}");
        prop_assert!((at - right).abs() <= 2.0 * eps, "at={at} right={right}");
    }

    // 6. The null at the implied mean scores the implied mean's absolute error
    #[test]
    fn null_at_implied_mean(cdf in cdf_strategy(), t in 0.0f64..=1.0) {
        let y = inside(&cdf, t);
        let mean = cdf.mean();
        let (lo, hi) = cdf.support();
        prop_assert!(mean >= lo - 1e-9 && mean <= hi + 1e-9);
        let null = crps_step(mean, y).unwrap();
        prop_assert!((null - (mean - y).abs()).abs() <= 1e-10 * (1.0 + null));
    }

    // 7. CDF evaluation is monotone and bounded
    #[test]
    fn cdf_monotone(cdf in cdf_strategy(), a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (x1, x2) = {
            let (p, q) = (inside(&cdf, a), inside(&cdf, b));
            if p <= q { (p, q) } else { (q, p) }
        };
        let (f1, f2) = (cdf.cdf(x1), cdf.cdf(x2));
        prop_assert!((0.0..=1.0).contains(&f1) && (0.0..=1.0).contains(&f2));
        prop_assert!(f1 <= f2 + 1e-15);
    }
}
