//! Raw-value range checks
//!
//! A declared physical `[min, max]` is turned into raw bounds once; the
//! check itself is two comparisons. Pack and unpack never call it.

use crate::codec::scaling::ScalingCodec;
use crate::signals::database::PhysicalRange;
use crate::types::RawValue;
use serde::{Deserialize, Serialize};

/// Inclusive raw bounds of a signal, `None` for an open signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValidator {
    bounds: Option<(RawValue, RawValue)>,
}

impl RangeValidator {
    /// Validator that accepts every raw value
    pub fn open() -> Self {
        Self { bounds: None }
    }

    /// Validator for explicit raw bounds, in either order
    pub fn with_raw_bounds(a: RawValue, b: RawValue) -> Self {
        Self {
            bounds: Some((a.min(b), a.max(b))),
        }
    }

    /// Convert a physical range through the signal's scaling law. A negative
    /// factor swaps the ends.
    ///
    /// Bounds that fall between two raw steps move inwards (the low bound up,
    /// the high bound down), so every accepted raw value decodes inside the
    /// declared physical range.
    pub fn from_physical(range: Option<PhysicalRange>, scaling: &ScalingCodec) -> Self {
        let Some(range) = range else {
            return Self::open();
        };

        let a = scaling.raw_quotient(range.min);
        let b = scaling.raw_quotient(range.max);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        Self {
            bounds: Some((
                scaling.kind.narrow(snap(low).unwrap_or_else(|| low.ceil())),
                scaling.kind.narrow(snap(high).unwrap_or_else(|| high.floor())),
            )),
        }
    }

    pub fn raw_min(&self) -> Option<RawValue> {
        self.bounds.map(|(min, _)| min)
    }

    pub fn raw_max(&self) -> Option<RawValue> {
        self.bounds.map(|(_, max)| max)
    }

    pub fn is_open(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn is_in_range(&self, raw: RawValue) -> bool {
        match self.bounds {
            Some((min, max)) => min <= raw && raw <= max,
            None => true,
        }
    }
}

/// Nearest integer when `value` only misses it by floating point noise,
/// e.g. `(229.53 - 250.0) / 0.01 = -2046.9999999999998`
fn snap(value: f64) -> Option<f64> {
    let nearest = value.round();
    ((value - nearest).abs() <= SNAP_TOLERANCE * value.abs().max(1.0)).then_some(nearest)
}

const SNAP_TOLERANCE: f64 = 1e-9;
