//! Animation descriptors.
//!
//! [`AnimationSpec`] is the immutable input to [`TweenEngine::build`]: named
//! `from`/`to` endpoint pairs, a duration, an easing curve and the resting
//! position. [`TweenConfig`] is its declarative, serde-backed twin that can be
//! loaded from TOML.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_lattice_tween::AnimationSpec;
//!
//! let spec = AnimationSpec::new(Duration::from_millis(250))
//!     .property("height", 116.0, 72.0)
//!     .property("cancel_opacity", 0.0, 1.0);
//!
//! assert!(spec.validate().is_ok());
//! assert_eq!(spec.endpoints("height"), Some((116.0, 72.0)));
//! ```
//!
//! [`TweenEngine::build`]: crate::TweenEngine::build

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{Endpoint, Result, TweenError};

/// Declarative description of a multi-property tween.
#[derive(Debug, Clone)]
pub struct AnimationSpec {
    from: BTreeMap<String, f64>,
    to: BTreeMap<String, f64>,
    duration: Duration,
    easing: Easing,
    initially_active: bool,
}

impl AnimationSpec {
    /// Create an empty spec with the given duration and a linear curve.
    pub fn new(duration: Duration) -> Self {
        Self {
            from: BTreeMap::new(),
            to: BTreeMap::new(),
            duration,
            easing: Easing::linear(),
            initially_active: false,
        }
    }

    /// Create a spec from complete `from` and `to` tables.
    pub fn from_tables<K, F, T>(duration: Duration, from: F, to: T) -> Self
    where
        K: Into<String>,
        F: IntoIterator<Item = (K, f64)>,
        T: IntoIterator<Item = (K, f64)>,
    {
        Self {
            from: from.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            to: to.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::new(duration)
        }
    }

    /// Declare a property with both endpoints.
    pub fn property(mut self, name: impl Into<String>, from: f64, to: f64) -> Self {
        let name = name.into();
        self.from.insert(name.clone(), from);
        self.to.insert(name, to);
        self
    }

    /// Set only the `from` endpoint of a property.
    pub fn from_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.from.insert(name.into(), value);
        self
    }

    /// Set only the `to` endpoint of a property.
    pub fn to_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.to.insert(name.into(), value);
        self
    }

    /// Set the easing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the resting position before any play call.
    ///
    /// An initially active animation rests at progress `1.0` (its `to` values).
    pub fn initially_active(mut self, active: bool) -> Self {
        self.initially_active = active;
        self
    }

    /// Replace the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// The `from` table.
    pub fn from_table(&self) -> &BTreeMap<String, f64> {
        &self.from
    }

    /// The `to` table.
    pub fn to_table(&self) -> &BTreeMap<String, f64> {
        &self.to
    }

    /// The duration of one full run.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The easing curve.
    #[inline]
    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    /// Whether the animation rests at its `to` values.
    #[inline]
    pub fn is_initially_active(&self) -> bool {
        self.initially_active
    }

    /// The resting progress value: `1.0` if initially active, else `0.0`.
    pub fn resting_progress(&self) -> f64 {
        if self.initially_active { 1.0 } else { 0.0 }
    }

    /// Property names in sorted order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.from.keys().map(String::as_str)
    }

    /// Both endpoints of a property, if declared on both sides.
    pub fn endpoints(&self, name: &str) -> Option<(f64, f64)> {
        Some((*self.from.get(name)?, *self.to.get(name)?))
    }

    /// Check that the spec can drive an engine.
    ///
    /// Fails if the duration is zero, if the `from` and `to` tables declare
    /// different properties, or if any endpoint is NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(TweenError::invalid_duration(0.0));
        }

        let missing_in_to: Vec<String> = self
            .from
            .keys()
            .filter(|k| !self.to.contains_key(*k))
            .cloned()
            .collect();
        let missing_in_from: Vec<String> = self
            .to
            .keys()
            .filter(|k| !self.from.contains_key(*k))
            .cloned()
            .collect();
        if !missing_in_from.is_empty() || !missing_in_to.is_empty() {
            return Err(TweenError::mismatched(missing_in_from, missing_in_to));
        }

        for (side, table) in [(Endpoint::From, &self.from), (Endpoint::To, &self.to)] {
            if let Some((name, value)) = table.iter().find(|(_, v)| !v.is_finite()) {
                return Err(TweenError::non_finite(name.clone(), side, *value));
            }
        }

        Ok(())
    }
}

/// Serializable tween descriptor.
///
/// ```
/// use horizon_lattice_tween::{AnimationSpec, TweenConfig};
///
/// let config = TweenConfig::from_toml_str(r#"
///     duration_ms = 250
///     initially_active = true
///
///     [from]
///     height = 116
///
///     [to]
///     height = 72
/// "#).unwrap();
///
/// let spec = AnimationSpec::try_from(config).unwrap();
/// assert!(spec.is_initially_active());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweenConfig {
    /// Duration of one full run in milliseconds.
    pub duration_ms: f64,
    /// Whether the animation rests at its `to` values.
    #[serde(default)]
    pub initially_active: bool,
    /// Values at progress `0.0`.
    pub from: BTreeMap<String, f64>,
    /// Values at progress `1.0`.
    pub to: BTreeMap<String, f64>,
}

impl TweenConfig {
    /// Parse a descriptor from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

impl TryFrom<TweenConfig> for AnimationSpec {
    type Error = TweenError;

    fn try_from(config: TweenConfig) -> Result<Self> {
        if !config.duration_ms.is_finite() || config.duration_ms <= 0.0 {
            return Err(TweenError::invalid_duration(config.duration_ms));
        }
        let duration = Duration::try_from_secs_f64(config.duration_ms / 1000.0)
            .map_err(|_| TweenError::invalid_duration(config.duration_ms))?;

        let spec = Self {
            from: config.from,
            to: config.to,
            ..Self::new(duration)
        }
        .initially_active(config.initially_active);
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_builder_collects_properties() {
        let spec = AnimationSpec::new(ms(250))
            .property("y", 0.0, -52.0)
            .property("opacity", 1.0, 0.0);

        let names: Vec<&str> = spec.property_names().collect();
        assert_eq!(names, vec!["opacity", "y"]);
        assert_eq!(spec.endpoints("y"), Some((0.0, -52.0)));
        assert_eq!(spec.endpoints("missing"), None);
        assert_eq!(spec.resting_progress(), 0.0);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_mismatched_keys_rejected() {
        let spec = AnimationSpec::from_tables(ms(100), [("x", 0.0)], [("x", 1.0), ("y", 2.0)]);

        match spec.validate() {
            Err(TweenError::MismatchedProperties {
                missing_in_from,
                missing_in_to,
            }) => {
                assert_eq!(missing_in_from, vec!["y".to_string()]);
                assert!(missing_in_to.is_empty());
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let spec = AnimationSpec::new(ms(100)).property("x", 0.0, f64::INFINITY);
        assert!(matches!(
            spec.validate(),
            Err(TweenError::NonFiniteValue { side: Endpoint::To, .. })
        ));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let spec = AnimationSpec::new(Duration::ZERO).property("x", 0.0, 1.0);
        assert!(matches!(
            spec.validate(),
            Err(TweenError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_empty_spec_is_valid() {
        assert!(AnimationSpec::new(ms(100)).validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = TweenConfig::from_toml_str(
            r#"
            duration_ms = 250.0

            [from]
            height = 116.0
            opacity = 0.0

            [to]
            height = 72.0
            opacity = 1.0
            "#,
        )
        .unwrap();

        assert!(!config.initially_active);
        let spec = AnimationSpec::try_from(config).unwrap();
        assert_eq!(spec.duration(), ms(250));
        assert_eq!(spec.endpoints("opacity"), Some((0.0, 1.0)));
        assert!(spec.easing().is_linear());
    }

    #[test]
    fn test_config_rejects_non_numeric() {
        let result = TweenConfig::from_toml_str(
            r#"
            duration_ms = 250.0
            [from]
            height = "tall"
            [to]
            height = 72.0
            "#,
        );
        assert!(matches!(result, Err(TweenError::Parse(_))));
    }

    #[test]
    fn test_config_rejects_bad_duration() {
        for duration_ms in [0.0, -5.0, f64::NAN] {
            let config = TweenConfig {
                duration_ms,
                initially_active: false,
                from: BTreeMap::new(),
                to: BTreeMap::new(),
            };
            assert!(matches!(
                AnimationSpec::try_from(config),
                Err(TweenError::InvalidDuration { .. })
            ));
        }
    }
}
