//! Debug-view error types.
//!
//! Only setup and lifecycle operations are fallible.  Rendering and stepping
//! never return errors: unsupported geometry, a full contact buffer or a short
//! sample window degrade the frame's visualization instead.
//!
//! ## Usage
//!
//! ```rust
//! use physview::error::{validate_positive, DebugResult};
//!
//! fn apply_scale(scale: f32) -> DebugResult<f32> {
//!     validate_positive("display_per_sim", scale)?;
//!     Ok(scale)
//! }
//! ```

use std::fmt;

/// Top-level error enum for the debug view and its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugViewError {
    /// The configuration file exists but could not be read.
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error, rendered.
        reason: String,
    },

    /// The configuration file is not valid TOML for [`crate::config::DebugViewConfig`].
    ConfigParse {
        /// Path that was parsed (or `"<inline>"` for string input).
        path: String,
        /// Underlying parse error, rendered.
        reason: String,
    },

    /// A configuration value is outside its accepted range.
    InvalidSetting {
        /// Name of the setting (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// A flag name in the configuration does not match any [`crate::debug_view::DebugViewFlags`].
    UnknownFlag {
        /// The name as written in the configuration.
        name: String,
    },

    /// The debug view already holds a presolve subscription.
    AlreadyAttached,

    /// The debug view has no presolve subscription to release.
    NotAttached,
}

impl fmt::Display for DebugViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugViewError::ConfigIo { path, reason } => {
                write!(f, "failed to read '{}': {}", path, reason)
            }
            DebugViewError::ConfigParse { path, reason } => {
                write!(f, "failed to parse '{}': {}", path, reason)
            }
            DebugViewError::InvalidSetting {
                name,
                value,
                expected,
            } => write!(
                f,
                "setting '{}' = {} is outside accepted range {}",
                name, value, expected
            ),
            DebugViewError::UnknownFlag { name } => {
                write!(f, "unknown debug view flag '{}'", name)
            }
            DebugViewError::AlreadyAttached => {
                write!(f, "debug view is already subscribed to a world")
            }
            DebugViewError::NotAttached => {
                write!(f, "debug view is not subscribed to a world")
            }
        }
    }
}

impl std::error::Error for DebugViewError {}

/// Convenience alias: a `Result` using `DebugViewError` as the error type.
pub type DebugResult<T> = Result<T, DebugViewError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `value` is strictly positive and finite.
pub fn validate_positive(name: &'static str, value: f32) -> DebugResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DebugViewError::InvalidSetting {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` is at least `min`.
///
/// Used for counts (segments, capacities) where zero or tiny values would make
/// the overlay degenerate.
pub fn validate_min_count(
    name: &'static str,
    value: usize,
    min: usize,
    expected: &'static str,
) -> DebugResult<()> {
    if value >= min {
        Ok(())
    } else {
        Err(DebugViewError::InvalidSetting {
            name,
            value: value as f32,
            expected,
        })
    }
}

/// Returns an error unless `minimum < maximum`.
pub fn validate_range(name: &'static str, minimum: f32, maximum: f32) -> DebugResult<()> {
    if minimum < maximum {
        Ok(())
    } else {
        Err(DebugViewError::InvalidSetting {
            name,
            value: maximum,
            expected: "maximum > minimum",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(validate_positive("scale", 1.0).is_ok());
        assert!(validate_positive("scale", 0.0).is_err());
        assert!(validate_positive("scale", f32::NAN).is_err());
    }

    #[test]
    fn min_count_reports_value() {
        let err = validate_min_count("circle_segments", 2, 3, "[3, ∞)").unwrap_err();
        assert_eq!(
            err,
            DebugViewError::InvalidSetting {
                name: "circle_segments",
                value: 2.0,
                expected: "[3, ∞)",
            }
        );
    }

    #[test]
    fn display_mentions_flag_name() {
        let err = DebugViewError::UnknownFlag {
            name: "wireframe".into(),
        };
        assert!(err.to_string().contains("wireframe"));
    }
}
