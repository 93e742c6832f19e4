//! Layout validation
//!
//! Runs once per message, before any codec is built. Every check here turns
//! into a `CodecError::InvalidSchema`, so pack/unpack never see a layout
//! that does not fit its buffer.

use crate::layout::planner::{plan_signal, BitChunk};
use crate::signals::database::{MessageDefinition, MuxRole, SignalDefinition};
use crate::types::{CodecError, Result, SchemaViolation};
use std::collections::HashSet;

/// Validate a message and return the chunk plan of every signal, indexed
/// like `message.signals`.
pub fn plan_message(message: &MessageDefinition) -> Result<Vec<Vec<BitChunk>>> {
    let fail = |violation: SchemaViolation| CodecError::InvalidSchema {
        message: message.name.clone(),
        violation,
    };

    if message.size == 0 {
        return Err(fail(SchemaViolation::EmptyMessage));
    }

    let mut names = HashSet::with_capacity(message.signals.len());
    // Per byte: (signal index, occupied mask)
    let mut occupancy: Vec<Vec<(usize, u8)>> = vec![Vec::new(); message.size];
    let mut plans = Vec::with_capacity(message.signals.len());

    for (sig_idx, signal) in message.signals.iter().enumerate() {
        if !names.insert(signal.name.as_str()) {
            return Err(fail(SchemaViolation::DuplicateSignal(signal.name.clone())));
        }
        if signal.length == 0 || signal.length > 64 {
            return Err(fail(SchemaViolation::InvalidLength {
                signal: signal.name.clone(),
                length: signal.length,
            }));
        }
        if signal.factor == 0.0 {
            return Err(fail(SchemaViolation::ZeroFactor {
                signal: signal.name.clone(),
            }));
        }

        let chunks = plan_signal(signal);
        for chunk in &chunks {
            let Some(slot) = occupancy.get_mut(chunk.byte_index) else {
                return Err(fail(SchemaViolation::OutOfBounds {
                    signal: signal.name.clone(),
                    byte_index: chunk.byte_index,
                    byte_length: message.size,
                }));
            };

            for (other_idx, other_mask) in slot.iter() {
                let shared = other_mask & chunk.mask;
                if shared == 0 {
                    continue;
                }
                let other = &message.signals[*other_idx];
                if mutually_exclusive(other, signal) {
                    continue;
                }
                return Err(fail(SchemaViolation::Overlap {
                    first: other.name.clone(),
                    second: signal.name.clone(),
                    byte_index: chunk.byte_index,
                    mask: shared,
                }));
            }
            slot.push((sig_idx, chunk.mask));
        }

        plans.push(chunks);
    }

    log::debug!(
        "Validated layout of '{}': {} signal(s) in {} byte(s)",
        message.name,
        plans.len(),
        message.size
    );

    Ok(plans)
}

/// Check a message layout without keeping the plans
pub fn validate(message: &MessageDefinition) -> Result<()> {
    plan_message(message).map(|_| ())
}

/// Two multiplexed signals behind the same multiplexor with different
/// selector values are never valid in the same frame, so they may share bits.
fn mutually_exclusive(a: &SignalDefinition, b: &SignalDefinition) -> bool {
    fn selected(signal: &SignalDefinition) -> Option<(&str, u64)> {
        signal.mux_role.as_ref().and_then(MuxRole::selected_by)
    }
    match (selected(a), selected(b)) {
        (Some((mux_a, sel_a)), Some((mux_b, sel_b))) => mux_a == mux_b && sel_a != sel_b,
        _ => false,
    }
}
