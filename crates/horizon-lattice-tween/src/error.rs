//! Error types for the tween engine.
//!
//! Every error here is raised while an animation is being constructed. A
//! running animation never fails; cancellation and stale completions are
//! handled silently by the engine.

/// Result type alias for tween operations.
pub type Result<T> = std::result::Result<T, TweenError>;

/// Which endpoint of a property an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The resting value at progress `0.0`.
    From,
    /// The resting value at progress `1.0`.
    To,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::From => write!(f, "from"),
            Self::To => write!(f, "to"),
        }
    }
}

/// Errors that can occur while building an animation.
#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    /// The `from` and `to` tables do not declare the same properties.
    #[error(
        "Mismatched animation properties: missing in 'from' {missing_in_from:?}, missing in 'to' {missing_in_to:?}"
    )]
    MismatchedProperties {
        missing_in_from: Vec<String>,
        missing_in_to: Vec<String>,
    },

    /// A property endpoint is NaN or infinite.
    #[error("Unsupported value '{side}: {value}' of property '{property}'")]
    NonFiniteValue {
        property: String,
        side: Endpoint,
        value: f64,
    },

    /// The duration is zero, negative, or not a number.
    #[error("Animation duration must be positive, got {millis} ms")]
    InvalidDuration { millis: f64 },

    /// A declarative tween descriptor could not be parsed.
    #[error("Failed to parse tween descriptor: {0}")]
    Parse(#[from] toml::de::Error),
}

impl TweenError {
    /// Create a mismatched-properties error.
    pub fn mismatched(missing_in_from: Vec<String>, missing_in_to: Vec<String>) -> Self {
        Self::MismatchedProperties {
            missing_in_from,
            missing_in_to,
        }
    }

    /// Create a non-finite value error.
    pub fn non_finite(property: impl Into<String>, side: Endpoint, value: f64) -> Self {
        Self::NonFiniteValue {
            property: property.into(),
            side,
            value,
        }
    }

    /// Create an invalid duration error.
    pub fn invalid_duration(millis: f64) -> Self {
        Self::InvalidDuration { millis }
    }
}
