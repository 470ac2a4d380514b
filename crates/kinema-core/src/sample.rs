//! Sample vector primitives.

use crate::{Error, Result};

/// A single input vector.
///
/// Dimensionality is fixed per pipeline configuration: once a stage has been
/// initialized with dimension `D`, every sample passed to it must have
/// exactly `D` elements.
pub type Sample = Vec<f64>;

/// Checks that `input` has exactly `expected` elements.
#[inline]
pub fn check_dimensions(expected: usize, input: &[f64]) -> Result<()> {
    if input.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: input.len(),
        });
    }
    Ok(())
}
