//! Message and signal model
//!
//! The in-memory schema every codec is generated from, plus a small
//! database that collects messages from one or more DBC files.

use crate::types::RawKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// CAN message ID (bit 31 set for extended IDs, as in DBC)
    pub id: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// All signals in this message, in declaration order
    pub signals: Vec<SignalDefinition>,
    /// Source file (DBC filename)
    pub source: String,
}

impl MessageDefinition {
    /// Create an empty message
    pub fn new(id: u32, name: impl Into<String>, size: usize) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            sender: None,
            signals: Vec::new(),
            source: String::new(),
        }
    }

    /// Builder method: append a signal
    pub fn with_signal(mut self, signal: SignalDefinition) -> Self {
        self.signals.push(signal);
        self
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// The top-level multiplexor signal, if the message has one
    pub fn multiplexor(&self) -> Option<&SignalDefinition> {
        self.signals
            .iter()
            .find(|s| matches!(s.mux_role, Some(MuxRole::Multiplexor)))
    }

    /// True if any signal takes part in multiplexing
    pub fn is_multiplexed(&self) -> bool {
        self.signals.iter().any(|s| s.mux_role.is_some())
    }

    /// True if the ID is a 29-bit extended identifier
    pub fn is_extended(&self) -> bool {
        self.id & 0x8000_0000 != 0
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit. Little-endian: LSB position, bit 0 = LSB of byte 0.
    /// Big-endian: MSB position, bit 0 = MSB of byte 0.
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Valid physical range, `None` for an open signal
    pub range: Option<PhysicalRange>,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: Option<String>,
    /// Multiplexing role (None for plain signals)
    pub mux_role: Option<MuxRole>,
    /// Value descriptions (DBC `VAL_`): raw value -> text
    #[serde(default)]
    pub value_table: Option<HashMap<i64, String>>,
}

impl SignalDefinition {
    /// Create an unsigned, unscaled little-endian signal
    pub fn new(name: impl Into<String>, start_bit: u16, length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            range: None,
            unit: None,
            mux_role: None,
            value_table: None,
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.byte_order = ByteOrder::BigEndian;
        self
    }

    pub fn signed(mut self) -> Self {
        self.value_type = ValueType::Signed;
        self
    }

    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(PhysicalRange { min, max });
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_mux_role(mut self, role: MuxRole) -> Self {
        self.mux_role = Some(role);
        self
    }

    /// Builder method: describe one raw value
    pub fn with_value_description(mut self, raw: i64, description: impl Into<String>) -> Self {
        self.value_table
            .get_or_insert_with(HashMap::new)
            .insert(raw, description.into());
        self
    }

    /// Raw storage kind implied by signedness and length
    pub fn raw_kind(&self) -> RawKind {
        RawKind::new(self.value_type == ValueType::Signed, self.length)
    }
}

/// Byte order for signal packing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Signed,
    Unsigned,
}

/// Inclusive physical range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalRange {
    pub min: f64,
    pub max: f64,
}

/// Multiplexing role of a signal. Packing treats every role the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MuxRole {
    /// Selects which multiplexed signals are valid
    Multiplexor,
    /// Valid when `multiplexor` carries the raw value `selector`
    Multiplexed { multiplexor: String, selector: u64 },
    /// Extended multiplexing: valid when `multiplexor` carries `selector`,
    /// and itself selects further signals
    NestedMultiplexor { multiplexor: String, selector: u64 },
}

impl MuxRole {
    /// Multiplexor name and selector value the signal depends on
    pub fn selected_by(&self) -> Option<(&str, u64)> {
        match self {
            MuxRole::Multiplexor => None,
            MuxRole::Multiplexed {
                multiplexor,
                selector,
            }
            | MuxRole::NestedMultiplexor {
                multiplexor,
                selector,
            } => Some((multiplexor.as_str(), *selector)),
        }
    }

    /// True if other signals are selected by this one
    pub fn is_multiplexor(&self) -> bool {
        matches!(self, MuxRole::Multiplexor | MuxRole::NestedMultiplexor { .. })
    }
}

/// Signal definitions collected from one or more sources
pub struct SignalDatabase {
    /// Message definitions in load order
    messages: Vec<MessageDefinition>,

    /// Key: message name, Value: index into `messages`
    name_lookup: HashMap<String, usize>,

    /// Key: CAN ID, Value: indices into `messages` (several files may reuse an ID)
    id_lookup: HashMap<u32, Vec<usize>>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            name_lookup: HashMap::new(),
            id_lookup: HashMap::new(),
        }
    }

    /// Add a message definition to the database
    pub fn add_message(&mut self, message: MessageDefinition) {
        let idx = self.messages.len();

        if self.name_lookup.insert(message.name.clone(), idx).is_some() {
            log::warn!(
                "Message '{}' redefined by {}, later definition wins name lookups",
                message.name,
                message.source
            );
        }
        self.id_lookup.entry(message.id).or_default().push(idx);
        self.messages.push(message);
    }

    /// All messages in load order
    pub fn messages(&self) -> &[MessageDefinition] {
        &self.messages
    }

    /// Get the first message definition loaded for a CAN ID
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.id_lookup
            .get(&can_id)
            .and_then(|indices| indices.first())
            .map(|idx| &self.messages[*idx])
    }

    /// Get message definition by name
    pub fn get_message_by_name(&self, message_name: &str) -> Option<&MessageDefinition> {
        self.name_lookup
            .get(message_name)
            .map(|idx| &self.messages[*idx])
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|m| m.signals.len()).sum(),
            num_multiplexed: self.messages.iter().filter(|m| m.is_multiplexed()).count(),
        }
    }

    /// Get all unique CAN IDs in the database
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.id_lookup.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Messages that contain multiplexed signals
    pub num_multiplexed: usize,
}

impl Default for SignalDatabase {
    fn default() -> Self {
        Self::new()
    }
}
