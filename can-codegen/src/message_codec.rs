//! Message packing engine
//!
//! Compiles a message definition into an immutable `MessageCodec`: one chunk
//! plan per signal, computed and validated once. `pack` and `unpack` only
//! iterate those plans, so they cannot hit a layout error at run time.

use crate::codec::SignalCodec;
use crate::layout::{plan_message, BitChunk};
use crate::signals::database::{ByteOrder, MessageDefinition};
use crate::types::{CodecError, RawValue, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Raw values of every signal of a message, in signal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: Vec<RawValue>,
}

impl RawRecord {
    pub fn from_values(values: Vec<RawValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RawValue> {
        self.values.get(index).copied()
    }

    /// Set a value, growing the record with zeros if needed
    pub fn set(&mut self, index: usize, value: RawValue) {
        if index >= self.values.len() {
            self.values.resize(index + 1, RawValue::default());
        }
        self.values[index] = value;
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }
}

/// Planned layout of one signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalPlan {
    pub name: String,
    pub start_bit: u16,
    pub length: u16,
    pub byte_order: ByteOrder,
    pub signed: bool,
    pub chunks: Vec<BitChunk>,
}

/// A signal value after unpacking and scaling
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    pub name: String,
    pub raw_value: RawValue,
    pub physical: f64,
    pub unit: Option<String>,
    /// Result of the signal's range check on `raw_value`
    pub in_range: bool,
    /// Value table entry for `raw_value`
    pub description: Option<String>,
}

/// Generated pack/unpack routines of one message
#[derive(Debug, Clone)]
pub struct MessageCodec {
    id: u32,
    name: String,
    byte_length: usize,
    plans: Vec<SignalPlan>,
    codecs: Vec<SignalCodec>,
    index: HashMap<String, usize>,
}

impl MessageCodec {
    /// Plan and validate every signal of `message`.
    ///
    /// # Returns
    /// * `Err(CodecError::InvalidSchema)` if any signal does not fit the
    ///   message or collides with another one
    pub fn new(message: &MessageDefinition) -> Result<Self> {
        let chunk_plans = plan_message(message)?;

        let plans: Vec<SignalPlan> = message
            .signals
            .iter()
            .zip(chunk_plans)
            .map(|(signal, chunks)| SignalPlan {
                name: signal.name.clone(),
                start_bit: signal.start_bit,
                length: signal.length,
                byte_order: signal.byte_order,
                signed: signal.raw_kind().signed,
                chunks,
            })
            .collect();

        let codecs = message.signals.iter().map(SignalCodec::from_signal).collect();

        let index = plans
            .iter()
            .enumerate()
            .map(|(idx, plan)| (plan.name.clone(), idx))
            .collect();

        log::debug!(
            "Generated codec for {} (ID 0x{:X}): {} signal(s), {} chunk(s)",
            message.name,
            message.id,
            plans.len(),
            plans.iter().map(|p| p.chunks.len()).sum::<usize>()
        );

        Ok(Self {
            id: message.id,
            name: message.name.clone(),
            byte_length: message.size,
            plans,
            codecs,
            index,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn plans(&self) -> &[SignalPlan] {
        &self.plans
    }

    pub fn signal_codecs(&self) -> &[SignalCodec] {
        &self.codecs
    }

    /// Position of a signal in records and plans
    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Encode/decode/range functions of a signal
    pub fn signal_codec(&self, name: &str) -> Result<&SignalCodec> {
        self.signal_index(name)
            .map(|idx| &self.codecs[idx])
            .ok_or_else(|| CodecError::SignalNotFound(format!("{}.{}", self.name, name)))
    }

    /// A record with every signal at raw zero
    pub fn new_record(&self) -> RawRecord {
        RawRecord::from_values(
            self.codecs
                .iter()
                .map(|codec| codec.raw_kind().zero())
                .collect(),
        )
    }

    /// Set a signal's raw value by name
    pub fn set_raw(&self, record: &mut RawRecord, name: &str, value: RawValue) -> Result<()> {
        let idx = self
            .signal_index(name)
            .ok_or_else(|| CodecError::SignalNotFound(format!("{}.{}", self.name, name)))?;
        record.set(idx, value);
        Ok(())
    }

    /// Read a signal's raw value by name
    pub fn raw(&self, record: &RawRecord, name: &str) -> Result<RawValue> {
        let idx = self
            .signal_index(name)
            .ok_or_else(|| CodecError::SignalNotFound(format!("{}.{}", self.name, name)))?;
        Ok(record.get(idx).unwrap_or_else(|| self.codecs[idx].raw_kind().zero()))
    }

    fn check_size(&self, actual: usize) -> Result<()> {
        if actual < self.byte_length {
            return Err(CodecError::BufferTooSmall {
                required: self.byte_length,
                actual,
            });
        }
        Ok(())
    }

    /// Pack `record` into `dst`.
    ///
    /// The first `byte_length` bytes of `dst` are zeroed, then every chunk of
    /// every signal is OR-ed in. Signals missing from a short record pack as
    /// zero.
    ///
    /// # Returns
    /// * `Ok(byte_length)` on success
    /// * `Err(CodecError::BufferTooSmall)` if `dst` is too short; `dst` is
    ///   left untouched
    pub fn pack(&self, dst: &mut [u8], record: &RawRecord) -> Result<usize> {
        self.check_size(dst.len())?;

        let frame = &mut dst[..self.byte_length];
        frame.fill(0);

        for (idx, plan) in self.plans.iter().enumerate() {
            let raw = record.get(idx).unwrap_or_default().to_bits(plan.length);
            for chunk in &plan.chunks {
                frame[chunk.byte_index] |= chunk.pack_bits(raw);
            }
        }

        Ok(self.byte_length)
    }

    /// Unpack `src` into `record`, replacing all its values.
    ///
    /// Signed signals are sign-extended from their bit length.
    ///
    /// # Returns
    /// * `Err(CodecError::BufferTooSmall)` if `src` is too short; `record` is
    ///   left untouched
    pub fn unpack(&self, record: &mut RawRecord, src: &[u8]) -> Result<()> {
        self.check_size(src.len())?;

        let values = self
            .plans
            .iter()
            .map(|plan| {
                let bits = plan
                    .chunks
                    .iter()
                    .fold(0u64, |acc, chunk| acc | chunk.unpack_bits(src[chunk.byte_index]));
                RawValue::from_bits(bits, plan.length, plan.signed)
            })
            .collect();

        record.values = values;
        Ok(())
    }

    /// Encode physical values and pack them. Unlisted signals pack as zero.
    pub fn pack_physical(&self, dst: &mut [u8], signals: &[(&str, f64)]) -> Result<usize> {
        let mut record = self.new_record();
        for (name, physical) in signals {
            let raw = self.signal_codec(name)?.encode(*physical);
            self.set_raw(&mut record, name, raw)?;
        }
        self.pack(dst, &record)
    }

    /// Unpack `src` and decode every signal to its physical value
    pub fn unpack_physical(&self, src: &[u8]) -> Result<Vec<DecodedSignal>> {
        let mut record = self.new_record();
        self.unpack(&mut record, src)?;

        Ok(self
            .codecs
            .iter()
            .zip(record.values())
            .map(|(codec, raw)| DecodedSignal {
                name: codec.name().to_string(),
                raw_value: *raw,
                physical: codec.decode(*raw),
                unit: codec.unit().map(str::to_string),
                in_range: codec.is_in_range(*raw),
                description: codec.describe(*raw).map(str::to_string),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::SignalDefinition;

    fn std_mux_message() -> MessageDefinition {
        MessageDefinition::new(0x100, "StdMux", 8)
            .with_signal(SignalDefinition::new("std", 0, 4))
            .with_signal(SignalDefinition::new("mux", 4, 18))
    }

    #[test]
    fn test_pack_spanning_signal_golden_bytes() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let mut record = codec.new_record();
        codec.set_raw(&mut record, "std", RawValue::Unsigned(0xA)).unwrap();
        codec.set_raw(&mut record, "mux", RawValue::Unsigned(0x1FFFF)).unwrap();

        let mut buffer = [0u8; 8];
        assert_eq!(codec.pack(&mut buffer, &record).unwrap(), 8);
        assert_eq!(buffer, [0xFA, 0xFF, 0x1F, 0, 0, 0, 0, 0]);

        let mut decoded = RawRecord::default();
        codec.unpack(&mut decoded, &buffer).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_pack_all_ones_fills_spanned_bits() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let record =
            RawRecord::from_values(vec![RawValue::Unsigned(0xA), RawValue::Unsigned(0x3FFFF)]);

        let mut buffer = [0u8; 8];
        codec.pack(&mut buffer, &record).unwrap();
        assert_eq!(buffer[0], 0xFA);
        assert_eq!(buffer[1], 0xFF);
        assert_eq!(buffer[2] & 0x3F, 0x3F);
        assert!(buffer[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_pack_zero_fills_destination() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let mut buffer = [0xEEu8; 10];
        codec.pack(&mut buffer, &codec.new_record()).unwrap();
        assert_eq!(&buffer[..8], &[0u8; 8]);
        // Bytes past the message are not ours
        assert_eq!(&buffer[8..], &[0xEE, 0xEE]);
    }

    #[test]
    fn test_size_guard_leaves_buffers_untouched() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let record =
            RawRecord::from_values(vec![RawValue::Unsigned(1), RawValue::Unsigned(2)]);

        let mut short = [0x55u8; 7];
        let err = codec.pack(&mut short, &record).unwrap_err();
        assert!(matches!(err, CodecError::BufferTooSmall { required: 8, actual: 7 }));
        assert_eq!(short, [0x55u8; 7]);

        let mut target = record.clone();
        let err = codec.unpack(&mut target, &short).unwrap_err();
        assert!(err.is_size_error());
        assert_eq!(target, record);
    }

    #[test]
    fn test_signed_big_endian_round_trip() {
        // Motohawk-style layout in MSB-first numbering
        let message = MessageDefinition::new(0x1F0, "ExampleMessage", 8)
            .with_signal(SignalDefinition::new("Enable", 0, 1).big_endian())
            .with_signal(SignalDefinition::new("AverageRadius", 1, 6).big_endian().with_scaling(0.1, 0.0))
            .with_signal(
                SignalDefinition::new("Temperature", 7, 12)
                    .big_endian()
                    .signed()
                    .with_scaling(0.01, 250.0),
            );
        let codec = MessageCodec::new(&message).unwrap();

        let mut buffer = [0u8; 8];
        codec
            .pack_physical(
                &mut buffer,
                &[("Temperature", 244.14), ("AverageRadius", 1.8), ("Enable", 1.0)],
            )
            .unwrap();
        assert_eq!(&buffer[..3], &[0xA5, 0xB6, 0xC0]);

        let decoded = codec.unpack_physical(&buffer).unwrap();
        assert_eq!(decoded[0].raw_value, RawValue::Unsigned(1));
        assert_eq!(decoded[1].raw_value, RawValue::Unsigned(18));
        assert_eq!(decoded[2].raw_value, RawValue::Signed(-586));
        assert!((decoded[2].physical - 244.14).abs() < 1e-9);
    }

    #[test]
    fn test_unpack_physical_describes_values() {
        let message = MessageDefinition::new(0x12C, "Gearbox", 1)
            .with_signal(
                SignalDefinition::new("Gear", 0, 3)
                    .with_value_description(0, "Park")
                    .with_value_description(3, "Drive"),
            )
            .with_signal(SignalDefinition::new("Spare", 3, 5));
        let codec = MessageCodec::new(&message).unwrap();

        let decoded = codec.unpack_physical(&[0x03]).unwrap();
        assert_eq!(decoded[0].description.as_deref(), Some("Drive"));
        assert_eq!(decoded[1].description, None);

        let decoded = codec.unpack_physical(&[0x05]).unwrap();
        assert_eq!(decoded[0].description, None);
    }

    #[test]
    fn test_unknown_signal() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let mut buffer = [0u8; 8];
        let err = codec.pack_physical(&mut buffer, &[("nope", 1.0)]).unwrap_err();
        assert!(matches!(err, CodecError::SignalNotFound(name) if name == "StdMux.nope"));
    }

    #[test]
    fn test_schema_error_blocks_codec() {
        let message = MessageDefinition::new(0x1, "TooShort", 2)
            .with_signal(SignalDefinition::new("mux", 4, 18));
        let err = MessageCodec::new(&message).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_short_record_packs_zero() {
        let codec = MessageCodec::new(&std_mux_message()).unwrap();
        let record = RawRecord::from_values(vec![RawValue::Unsigned(0x3)]);
        let mut buffer = [0xFFu8; 8];
        codec.pack(&mut buffer, &record).unwrap();
        assert_eq!(buffer, [0x03, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(codec.raw(&record, "mux").unwrap(), RawValue::Unsigned(0));
    }
}
