// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

/// Quadratic coefficient contributed by a second-order one-sided difference.
const SECOND_ORDER_COEFF: f64 = 9.0 / 4.0;

/// Fraction of the edge from node `i` to its neighbour `j` at which the
/// linearly interpolated level set crosses zero.
///
/// Returns `None` unless the two values have strictly opposite signs.
#[inline]
pub fn crossing_fraction(phi_i: f64, phi_j: f64) -> Option<f64> {
    if phi_i * phi_j < 0.0 {
        Some(phi_i / (phi_i - phi_j))
    } else {
        None
    }
}

/// The smallest crossing fraction and the per-axis weights `(d_min / d)^2`.
///
/// Weights lie in `[0, 1]`, so fractions close to zero cannot overflow. A
/// zero fraction takes all of the weight. Returns `None` if no axis has a
/// crossing.
fn crossing_weights(fractions: [Option<f64>; 2]) -> Option<(f64, [f64; 2])> {
    let d_min = fractions
        .iter()
        .flatten()
        .copied()
        .filter(|d| *d >= 0.0)
        .reduce(f64::min)?;
    let mut weights = [0.0; 2];
    for (w, d) in weights.iter_mut().zip(fractions) {
        let Some(d) = d.filter(|d| *d >= 0.0) else {
            continue;
        };
        *w = if d_min == 0.0 {
            if d == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            (d_min / d).powi(2)
        };
    }
    Some((d_min, weights))
}

/// Distance to the front from per-axis crossing fractions.
///
/// Treats the crossings along orthogonal axes as intercepts of a straight
/// front, so the distance is `1 / sqrt(sum(1 / d^2))`, evaluated as
/// `d_min / sqrt(sum((d_min / d)^2))`. Returns `None` if no axis has a
/// crossing.
pub fn front_distance(crossings: [Option<f64>; 2]) -> Option<f64> {
    let (d_min, weights) = crossing_weights(crossings)?;
    Some(d_min / (weights[0] + weights[1]).sqrt())
}

/// Velocity of a front node from per-axis `(fraction, velocity)` crossings,
/// weighted by `1 / d^2` to match [`front_distance`].
///
/// Returns `None` if the total weight is zero.
pub fn front_velocity(crossings: [Option<(f64, f64)>; 2]) -> Option<f64> {
    let (_, weights) = crossing_weights(crossings.map(|c| c.map(|(d, _)| d)))?;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&w, crossing) in weights.iter().zip(crossings) {
        if let Some((_, v)) = crossing {
            if w > 0.0 {
                numerator += w * v;
                denominator += w;
            }
        }
    }
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Upwind data available along one axis of the stencil.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisTerm {
    /// One frozen neighbour at distance `dist1`.
    FirstOrder(f64),
    /// A frozen neighbour at `dist1` backed by a second frozen node at
    /// `dist2` further out in the same direction.
    SecondOrder(f64, f64),
}

/// Coefficients of `a*r^2 + b*r + c = 0` for the discrete `|grad(phi)| = 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadratic {
    /// Coefficient of `r^2`.
    pub a: f64,
    /// Coefficient of `r`.
    pub b: f64,
    /// Constant term, before the unit gradient is subtracted.
    pub c: f64,
}

impl Quadratic {
    /// Accumulate the contribution of one axis.
    pub fn add(&mut self, term: AxisTerm) {
        match term {
            AxisTerm::SecondOrder(dist1, dist2) => {
                let tp = (4.0 * dist1 - dist2) / 3.0;
                self.a += SECOND_ORDER_COEFF;
                self.b -= 2.0 * SECOND_ORDER_COEFF * tp;
                self.c += SECOND_ORDER_COEFF * tp * tp;
            }
            AxisTerm::FirstOrder(dist1) => {
                self.a += 1.0;
                self.b -= 2.0 * dist1;
                self.c += dist1 * dist1;
            }
        }
    }

    /// Solve for the updated distance.
    ///
    /// `positive` selects the root on the positive side of the front
    /// (`(-b + sqrt(det)) / 2a`); otherwise the other root is returned.
    /// Returns `None` if the discriminant is not positive.
    pub fn solve(&self, positive: bool) -> Option<f64> {
        let c = self.c - 1.0;
        let det = self.b * self.b - 4.0 * self.a * c;
        if det <= 0.0 {
            return None;
        }
        let sqrt_det = det.sqrt();
        let r = if positive {
            (-self.b + sqrt_det) / (2.0 * self.a)
        } else {
            (-self.b - sqrt_det) / (2.0 * self.a)
        };
        Some(r)
    }
}

/// Solve the local eikonal update from the terms available on each axis.
///
/// Returns `None` when neither axis has data or no real root exists.
pub fn solve_stencil(terms: [Option<AxisTerm>; 2], positive: bool) -> Option<f64> {
    let mut q = Quadratic::default();
    let mut any = false;
    for term in terms.into_iter().flatten() {
        q.add(term);
        any = true;
    }
    if !any {
        return None;
    }
    q.solve(positive)
}

/// Extension velocity from per-axis `(|dphi|, velocity)` upwind samples,
/// weighted by the distance difference so that `grad(v) . grad(phi) = 0`.
///
/// Returns `None` if the total weight is zero.
pub fn extension_velocity(samples: [Option<(f64, f64)>; 2]) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for &(dphi, v) in samples.iter().flatten() {
        numerator += dphi.abs() * v;
        denominator += dphi.abs();
    }
    if denominator != 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_fraction_opposite_signs() {
        let d = crossing_fraction(0.25, -0.75).unwrap();
        assert!((d - 0.25).abs() < 1e-12);
        let d = crossing_fraction(-0.6, 0.2).unwrap();
        assert!((d - 0.75).abs() < 1e-12);
    }

    #[test]
    fn crossing_fraction_same_sign_or_zero() {
        assert_eq!(crossing_fraction(0.5, 0.2), None);
        assert_eq!(crossing_fraction(-0.5, -0.2), None);
        assert_eq!(crossing_fraction(0.5, 0.0), None);
    }

    #[test]
    fn front_distance_single_axis() {
        let d = front_distance([Some(0.4), None]).unwrap();
        assert!((d - 0.4).abs() < 1e-12);
    }

    #[test]
    fn front_distance_both_axes() {
        // Diagonal front crossing both axes at 0.5: distance = 0.5 / sqrt(2).
        let d = front_distance([Some(0.5), Some(0.5)]).unwrap();
        assert!((d - 0.5 * std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn front_distance_none() {
        assert_eq!(front_distance([None, None]), None);
    }

    #[test]
    fn front_velocity_weighting() {
        // Equal fractions give a plain average.
        let v = front_velocity([Some((0.5, 1.0)), Some((0.5, 3.0))]).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
        // The nearer crossing dominates.
        let v = front_velocity([Some((0.1, 1.0)), Some((0.9, 3.0))]).unwrap();
        assert!(v < 1.1);
        assert_eq!(front_velocity([None, None]), None);
    }

    #[test]
    fn tiny_fractions_stay_finite() {
        let d = front_distance([Some(1e-170), Some(0.5)]).unwrap();
        assert!((d / 1e-170 - 1.0).abs() < 1e-12);

        let d = front_distance([Some(1e-170), Some(1e-170)]).unwrap();
        assert!((d / 1e-170 - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);

        let v = front_velocity([Some((1e-170, 2.0)), Some((0.5, 4.0))]).unwrap();
        assert!((v - 2.0).abs() < 1e-12);

        let v = front_velocity([Some((1e-170, 2.0)), Some((1e-170, 4.0))]).unwrap();
        assert!((v - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_fraction_sits_on_the_front() {
        assert_eq!(front_distance([Some(0.0), Some(0.5)]), Some(0.0));
        let v = front_velocity([Some((0.0, 7.0)), Some((0.5, 4.0))]).unwrap();
        assert_eq!(v, 7.0);
    }

    #[test]
    fn first_order_one_axis() {
        // (r - 0.5)^2 = 1 -> r = 1.5 or -0.5
        let r = solve_stencil([Some(AxisTerm::FirstOrder(0.5)), None], true).unwrap();
        assert!((r - 1.5).abs() < 1e-12);
        let r = solve_stencil([Some(AxisTerm::FirstOrder(-0.5)), None], false).unwrap();
        assert!((r + 1.5).abs() < 1e-12);
    }

    #[test]
    fn first_order_two_axes() {
        // Both neighbours at 0: 2 r^2 = 1
        let r = solve_stencil(
            [Some(AxisTerm::FirstOrder(0.0)), Some(AxisTerm::FirstOrder(0.0))],
            true,
        )
        .unwrap();
        assert!((r - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn second_order_exact_for_linear_field() {
        // phi = x: neighbours at 2 and 1, node should be 3.
        let r = solve_stencil([Some(AxisTerm::SecondOrder(2.0, 1.0)), None], true).unwrap();
        assert!((r - 3.0).abs() < 1e-12);
        let r = solve_stencil([Some(AxisTerm::SecondOrder(-2.0, -1.0)), None], false).unwrap();
        assert!((r + 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_real_root() {
        // Neighbours far apart on the two axes: 2r^2 - 2(0+10)r + 100 - 1 = 0
        // det = 400 - 8 * 99 < 0
        assert_eq!(
            solve_stencil(
                [Some(AxisTerm::FirstOrder(0.0)), Some(AxisTerm::FirstOrder(10.0))],
                true
            ),
            None
        );
        assert_eq!(solve_stencil([None, None], true), None);
    }

    #[test]
    fn extension_velocity_weighting() {
        let v = extension_velocity([Some((1.0, 2.0)), Some((-3.0, 6.0))]).unwrap();
        assert!((v - 5.0).abs() < 1e-12);
        let v = extension_velocity([Some((0.7, 4.0)), None]).unwrap();
        assert!((v - 4.0).abs() < 1e-12);
        assert_eq!(extension_velocity([Some((0.0, 4.0)), None]), None);
        assert_eq!(extension_velocity([None, None]), None);
    }

    #[test]
    fn no_nan_produced() {
        let cases = [
            [Some(AxisTerm::FirstOrder(0.0)), None],
            [Some(AxisTerm::FirstOrder(1.0)), Some(AxisTerm::FirstOrder(1.0))],
            [Some(AxisTerm::SecondOrder(1.0, 0.0)), Some(AxisTerm::FirstOrder(0.5))],
            [Some(AxisTerm::SecondOrder(-1.0, 0.0)), Some(AxisTerm::SecondOrder(-1.0, 0.0))],
        ];
        for terms in cases {
            for positive in [true, false] {
                if let Some(r) = solve_stencil(terms, positive) {
                    assert!(!r.is_nan(), "NaN for {:?} positive={}", terms, positive);
                }
            }
        }
    }
}
