//! Bounded ↔ unbounded parameter transforms and shared numeric tolerances.
//!
//! The optimizer works on unconstrained internal coordinates; model
//! parameters live inside `[min, max]` with either side possibly infinite.
//! [`BoundTransform`] maps between the two the way classic minimizers do:
//!
//! - both sides finite: `x = a + (b − a)/2 · (sin u + 1)`,
//! - lower only: `x = a − 1 + √(u² + 1)`,
//! - upper only: `x = b + 1 − √(u² + 1)`,
//! - neither: `x = u`.
//!
//! Every internal value maps into the closed interval, so the line search
//! can roam freely without producing inadmissible parameter values.

/// Eigenvalues at or below this threshold are treated as zero when
/// inverting curvature matrices.
pub const EIGEN_EPS: f64 = 1e-12;

/// Generic small tolerance for clamping near-boundary values.
pub const GENERAL_TOL: f64 = 1e-10;

/// Mapping between an external bounded value and an internal unbounded one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundTransform {
    Unbounded,
    Lower(f64),
    Upper(f64),
    Double(f64, f64),
}

impl BoundTransform {
    /// Transform for limits `[min, max]`; infinite sides are open.
    pub fn for_limits(min: f64, max: f64) -> Self {
        match (min.is_finite(), max.is_finite()) {
            (true, true) => BoundTransform::Double(min, max),
            (true, false) => BoundTransform::Lower(min),
            (false, true) => BoundTransform::Upper(max),
            (false, false) => BoundTransform::Unbounded,
        }
    }

    /// External value for internal coordinate `u`.
    pub fn to_external(&self, u: f64) -> f64 {
        match *self {
            BoundTransform::Unbounded => u,
            BoundTransform::Lower(a) => a - 1.0 + (u * u + 1.0).sqrt(),
            BoundTransform::Upper(b) => b + 1.0 - (u * u + 1.0).sqrt(),
            BoundTransform::Double(a, b) => {
                let x = a + 0.5 * (b - a) * (u.sin() + 1.0);
                x.clamp(a, b)
            }
        }
    }

    /// Internal coordinate for external value `x` (clamped into the limits).
    ///
    /// Single-sided transforms return the non-negative branch.
    pub fn to_internal(&self, x: f64) -> f64 {
        match *self {
            BoundTransform::Unbounded => x,
            BoundTransform::Lower(a) => {
                let t = (x - a).max(0.0) + 1.0;
                (t * t - 1.0).sqrt()
            }
            BoundTransform::Upper(b) => {
                let t = (b - x).max(0.0) + 1.0;
                (t * t - 1.0).sqrt()
            }
            BoundTransform::Double(a, b) => {
                let s = (2.0 * (x - a) / (b - a) - 1.0).clamp(-1.0, 1.0);
                s.asin()
            }
        }
    }

    /// Nudge `x` off an exact limit so the internal derivative is non-zero.
    ///
    /// Starting exactly on a sine or square-root boundary gives a vanishing
    /// gradient in internal space and the solver cannot move the parameter.
    pub fn interior_start(&self, x: f64) -> f64 {
        match *self {
            BoundTransform::Unbounded => x,
            BoundTransform::Lower(a) => x.max(a + GENERAL_TOL.max(1e-8 * a.abs())),
            BoundTransform::Upper(b) => x.min(b - GENERAL_TOL.max(1e-8 * b.abs())),
            BoundTransform::Double(a, b) => {
                let margin = 1e-6 * (b - a);
                x.clamp(a + margin, b - margin)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Round trips external → internal → external for every limit kind.
    // - Images of arbitrary internal values stay inside the limits.
    // - Boundary nudging of start values.
    // -------------------------------------------------------------------------

    fn all() -> [BoundTransform; 4] {
        [
            BoundTransform::for_limits(f64::NEG_INFINITY, f64::INFINITY),
            BoundTransform::for_limits(0.0, f64::INFINITY),
            BoundTransform::for_limits(f64::NEG_INFINITY, 5.3),
            BoundTransform::for_limits(5.2, 5.3),
        ]
    }

    #[test]
    fn for_limits_selects_kind_from_finite_sides() {
        assert_eq!(all()[0], BoundTransform::Unbounded);
        assert_eq!(all()[1], BoundTransform::Lower(0.0));
        assert_eq!(all()[2], BoundTransform::Upper(5.3));
        assert_eq!(all()[3], BoundTransform::Double(5.2, 5.3));
    }

    #[test]
    // Purpose
    // -------
    // Interior values survive the round trip through internal space.
    //
    // Given
    // -----
    // - x = 5.25, admissible for every transform in `all()`.
    //
    // Expect
    // ------
    // - `to_external(to_internal(x)) == x` to 1e-12 relative.
    fn round_trip_recovers_interior_values() {
        for t in all() {
            let x = 5.25;
            assert_relative_eq!(t.to_external(t.to_internal(x)), x, max_relative = 1e-12);
        }
    }

    #[test]
    fn images_stay_within_limits() {
        let double = BoundTransform::Double(5.2, 5.3);
        let lower = BoundTransform::Lower(0.0);
        for u in [-1e6, -3.0, -0.1, 0.0, 0.7, 2.0, 1e6] {
            let x = double.to_external(u);
            assert!((5.2..=5.3).contains(&x));
            assert!(lower.to_external(u) >= 0.0);
        }
    }

    #[test]
    fn interior_start_moves_off_exact_limits() {
        let t = BoundTransform::Double(0.0, 1.0);
        let x = t.interior_start(0.0);
        assert!(x > 0.0);
        let u = t.to_internal(x);
        assert!(t.to_external(u + 1e-3) - t.to_external(u - 1e-3) > 0.0);
        assert_eq!(t.interior_start(0.5), 0.5);
    }
}
