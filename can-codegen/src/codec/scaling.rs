//! Physical/raw conversion
//!
//! `raw = (physical - offset) / factor` and `physical = raw * factor + offset`,
//! with the raw side narrowed to the signal's storage kind.

use crate::signals::database::SignalDefinition;
use crate::types::{RawKind, RawValue};
use serde::{Deserialize, Serialize};

/// Scaling law of one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingCodec {
    pub factor: f64,
    pub offset: f64,
    pub kind: RawKind,
}

impl ScalingCodec {
    pub fn new(factor: f64, offset: f64, kind: RawKind) -> Self {
        Self {
            factor,
            offset,
            kind,
        }
    }

    pub fn from_signal(signal: &SignalDefinition) -> Self {
        Self::new(signal.factor, signal.offset, signal.raw_kind())
    }

    /// True when encode/decode are plain casts
    pub fn is_identity(&self) -> bool {
        self.factor == 1.0 && self.offset == 0.0
    }

    /// Physical value to raw value.
    ///
    /// The quotient is narrowed to the raw kind with a plain numeric cast:
    /// fractions truncate toward zero and out-of-range values saturate.
    pub fn encode(&self, physical: f64) -> RawValue {
        self.kind.narrow(self.raw_quotient(physical))
    }

    /// Unnarrowed `(physical - offset) / factor`
    pub fn raw_quotient(&self, physical: f64) -> f64 {
        if self.is_identity() {
            physical
        } else {
            (physical - self.offset) / self.factor
        }
    }

    /// Raw value to physical value
    pub fn decode(&self, raw: RawValue) -> f64 {
        if self.is_identity() {
            raw.as_f64()
        } else {
            raw.as_f64() * self.factor + self.offset
        }
    }
}
