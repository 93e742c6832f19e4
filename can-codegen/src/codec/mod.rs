//! Per-signal value codecs
//!
//! A `SignalCodec` bundles the scaling law and the range check generated for
//! one signal. Callers use it around pack/unpack: encode and validate before
//! packing, decode after unpacking.

pub mod range;
pub mod scaling;

pub use range::RangeValidator;
pub use scaling::ScalingCodec;

use crate::signals::database::SignalDefinition;
use crate::types::{RawKind, RawValue};
use std::collections::HashMap;

/// Encode/decode/range functions of one signal
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCodec {
    name: String,
    scaling: ScalingCodec,
    range: RangeValidator,
    unit: Option<String>,
    value_table: Option<HashMap<i64, String>>,
}

impl SignalCodec {
    pub fn from_signal(signal: &SignalDefinition) -> Self {
        let scaling = ScalingCodec::from_signal(signal);
        let range = RangeValidator::from_physical(signal.range, &scaling);
        Self {
            name: signal.name.clone(),
            scaling,
            range,
            unit: signal.unit.clone(),
            value_table: signal.value_table.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn raw_kind(&self) -> RawKind {
        self.scaling.kind
    }

    pub fn scaling(&self) -> &ScalingCodec {
        &self.scaling
    }

    pub fn range(&self) -> &RangeValidator {
        &self.range
    }

    pub fn encode(&self, physical: f64) -> RawValue {
        self.scaling.encode(physical)
    }

    pub fn decode(&self, raw: RawValue) -> f64 {
        self.scaling.decode(raw)
    }

    pub fn is_in_range(&self, raw: RawValue) -> bool {
        self.range.is_in_range(raw)
    }

    /// Value description of a raw value, if the signal has a value table
    pub fn describe(&self, raw: RawValue) -> Option<&str> {
        let key = match raw {
            RawValue::Unsigned(v) => i64::try_from(v).ok()?,
            RawValue::Signed(v) => v,
        };
        self.value_table
            .as_ref()
            .and_then(|table| table.get(&key))
            .map(String::as_str)
    }
}
