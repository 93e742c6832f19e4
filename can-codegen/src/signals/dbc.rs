//! DBC file parser
//!
//! Parses Vector DBC files with `can-dbc` and converts them into our message
//! model. DBC numbers Motorola start bits in sawtooth order (MSB of the
//! signal, bit 7 = MSB of byte 0); they are converted here to the linear
//! MSB-first numbering the planner uses.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MuxRole, PhysicalRange, SignalDefinition, ValueType,
};
use crate::types::{CodecError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        CodecError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            // Latin-1 maps every byte to the code point of the same value
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_str(&dbc_content, source_filename)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC text. `source` is recorded on every message.
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        CodecError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    dbc.messages()
        .iter()
        .map(|dbc_msg| convert_message(&dbc, dbc_msg, source))
        .collect()
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    source: &str,
) -> Result<MessageDefinition> {
    let message_id = *dbc_msg.message_id();

    // The multiplexor is needed before any multiplexed signal can name it
    let multiplexor_name = dbc_msg
        .signals()
        .iter()
        .find(|s| matches!(s.multiplexer_indicator(), can_dbc::MultiplexIndicator::Multiplexor))
        .map(|s| s.name().to_string());

    // Extended multiplexing (SG_MUL_VAL_) names the multiplexor per signal
    let extended_multiplexors: HashMap<&str, &str> = dbc
        .extended_multiplex()
        .iter()
        .filter(|ext| *ext.message_id() == message_id)
        .map(|ext| (ext.signal_name().as_str(), ext.multiplexor_signal_name().as_str()))
        .collect();

    let has_nested = dbc_msg.signals().iter().any(|s| {
        matches!(
            s.multiplexer_indicator(),
            can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(_)
        )
    });
    if has_nested && extended_multiplexors.is_empty() {
        log::warn!(
            "Message {} uses extended multiplexing without SG_MUL_VAL_, assuming every multiplexed signal depends on {:?}",
            dbc_msg.message_name(),
            multiplexor_name
        );
    }

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            let multiplexor = extended_multiplexors
                .get(dbc_sig.name().as_str())
                .copied()
                .or(multiplexor_name.as_deref());
            let mut signal = convert_signal(dbc_sig, dbc_msg.message_name(), multiplexor)?;
            signal.value_table = value_table(dbc, message_id, dbc_sig.name());
            Ok(signal)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageDefinition {
        id: dbc_msg.message_id().0, // Extract raw ID from MessageId tuple struct
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        source: source.to_string(),
    })
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    message_name: &str,
    multiplexor_name: Option<&str>,
) -> Result<SignalDefinition> {
    let dbc_start = u16::try_from(*dbc_sig.start_bit()).map_err(|_| {
        CodecError::DbcParseError(format!(
            "Signal '{}.{}' has start bit {} out of range",
            message_name,
            dbc_sig.name(),
            dbc_sig.start_bit()
        ))
    })?;
    let length = u16::try_from(*dbc_sig.signal_size()).map_err(|_| {
        CodecError::DbcParseError(format!(
            "Signal '{}.{}' has size {} out of range",
            message_name,
            dbc_sig.name(),
            dbc_sig.signal_size()
        ))
    })?;

    let (byte_order, start_bit) = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => (ByteOrder::LittleEndian, dbc_start),
        can_dbc::ByteOrder::BigEndian => (ByteOrder::BigEndian, motorola_to_linear(dbc_start)),
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    // DBC writes [0|0] for "no range"
    let (min, max) = (*dbc_sig.min(), *dbc_sig.max());
    let range = if min == 0.0 && max == 0.0 {
        None
    } else {
        Some(PhysicalRange { min, max })
    };

    let missing_multiplexor = || {
        CodecError::DbcParseError(format!(
            "Multiplexed signal '{}.{}' but no multiplexer found",
            message_name,
            dbc_sig.name()
        ))
    };

    let mux_role = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Multiplexor => Some(MuxRole::Multiplexor),
        can_dbc::MultiplexIndicator::MultiplexedSignal(selector) => Some(MuxRole::Multiplexed {
            multiplexor: multiplexor_name.ok_or_else(missing_multiplexor)?.to_string(),
            selector,
        }),
        can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(selector) => {
            log::debug!(
                "Signal {}.{} is a nested multiplexor (extended multiplexing)",
                message_name,
                dbc_sig.name()
            );
            Some(MuxRole::NestedMultiplexor {
                multiplexor: multiplexor_name.ok_or_else(missing_multiplexor)?.to_string(),
                selector,
            })
        }
        can_dbc::MultiplexIndicator::Plain => None,
    };

    log::trace!(
        "Signal {}.{}: start={} (dbc {}) len={} {:?}",
        message_name,
        dbc_sig.name(),
        start_bit,
        dbc_start,
        length,
        byte_order
    );

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit,
        length,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        range,
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        mux_role,
        value_table: None,
    })
}

/// Value descriptions (`VAL_`) of a signal, keyed by raw value
fn value_table(
    dbc: &can_dbc::DBC,
    message_id: can_dbc::MessageId,
    signal_name: &str,
) -> Option<HashMap<i64, String>> {
    let descriptions = dbc.value_descriptions_for_signal(message_id, signal_name)?;
    let table: HashMap<i64, String> = descriptions
        .iter()
        .map(|desc| (*desc.a() as i64, desc.b().clone()))
        .collect();
    (!table.is_empty()).then_some(table)
}

/// DBC Motorola start bit (sawtooth, bit 7 = MSB of byte 0) to MSB-first
/// linear numbering (bit 0 = MSB of byte 0)
pub fn motorola_to_linear(start_bit: u16) -> u16 {
    (start_bit / 8) * 8 + (7 - start_bit % 8)
}
