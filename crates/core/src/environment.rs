//! Execution environment: the permitted time window for a reduction.

use std::fmt;

use num_bigint::BigInt;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors constructing a time interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// The interval's lower bound is after its upper bound.
    InvalidInterval { from: BigInt, to: BigInt },
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalError::InvalidInterval { from, to } => {
                write!(f, "invalid time interval: from {} is after to {}", from, to)
            }
        }
    }
}

impl std::error::Error for IntervalError {}

// ──────────────────────────────────────────────
// Time interval and environment
// ──────────────────────────────────────────────

/// An inclusive millisecond-resolution window. Invariant: `from <= to`,
/// enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeInterval {
    from: BigInt,
    to: BigInt,
}

impl TimeInterval {
    pub fn new(from: impl Into<BigInt>, to: impl Into<BigInt>) -> Result<TimeInterval, IntervalError> {
        let from = from.into();
        let to = to.into();
        if from > to {
            return Err(IntervalError::InvalidInterval { from, to });
        }
        Ok(TimeInterval { from, to })
    }

    pub fn from(&self) -> &BigInt {
        &self.from
    }

    pub fn to(&self) -> &BigInt {
        &self.to
    }
}

/// The environment a contract step executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub time_interval: TimeInterval,
}

impl Environment {
    pub fn new(time_interval: TimeInterval) -> Environment {
        Environment { time_interval }
    }

    /// Shorthand for an environment over `[from, to]`.
    pub fn over(
        from: impl Into<BigInt>,
        to: impl Into<BigInt>,
    ) -> Result<Environment, IntervalError> {
        Ok(Environment {
            time_interval: TimeInterval::new(from, to)?,
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_interval() {
        let err = TimeInterval::new(10, 5).unwrap_err();
        assert_eq!(
            err,
            IntervalError::InvalidInterval {
                from: BigInt::from(10),
                to: BigInt::from(5),
            }
        );
    }

    #[test]
    fn accepts_point_interval() {
        let ti = TimeInterval::new(7, 7).unwrap();
        assert_eq!(ti.from(), ti.to());
    }
}
