//! Easing curves.
//!
//! The engine does not ship a curve library. An [`Easing`] wraps any function
//! that maps normalized time `t` in `[0, 1]` to normalized progress. The
//! output is not clamped: overshooting curves (back, elastic, springs) are
//! legal and push progress briefly outside `[0, 1]`.

use std::fmt;
use std::sync::Arc;

type EasingFn = dyn Fn(f64) -> f64 + Send + Sync;

/// A shared, opaque easing curve.
///
/// Cloning is cheap; clones share the same function.
///
/// # Example
///
/// ```
/// use horizon_lattice_tween::Easing;
///
/// let ease_in = Easing::new(|t| t * t);
/// assert_eq!(ease_in.apply(0.5), 0.25);
/// assert_eq!(Easing::linear().apply(0.5), 0.5);
/// ```
#[derive(Clone)]
pub struct Easing {
    curve: Option<Arc<EasingFn>>,
}

impl Easing {
    /// The identity curve.
    pub fn linear() -> Self {
        Self { curve: None }
    }

    /// Wrap a caller-supplied curve.
    pub fn new<F>(curve: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            curve: Some(Arc::new(curve)),
        }
    }

    /// Whether this is the identity curve.
    pub fn is_linear(&self) -> bool {
        self.curve.is_none()
    }

    /// Map normalized time to normalized progress.
    ///
    /// `t` is clamped to `[0, 1]` before the curve sees it; the result is
    /// passed through unchanged.
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match &self.curve {
            Some(curve) => curve(t),
            None => t,
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::linear()
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_linear() {
            write!(f, "Easing::Linear")
        } else {
            write!(f, "Easing::Custom")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let easing = Easing::default();
        assert!(easing.is_linear());
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.3), 0.3);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_input_is_clamped() {
        let easing = Easing::linear();
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_overshoot_passes_through() {
        let back = Easing::new(|t| t * t * (2.70158 * t - 1.70158));
        assert!(back.apply(0.2) < 0.0);
        assert!((back.apply(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clones_share_curve() {
        let easing = Easing::new(|t| t * t);
        let clone = easing.clone();
        assert!(!clone.is_linear());
        assert_eq!(clone.apply(0.5), easing.apply(0.5));
    }
}
