//! Signal database and DBC parser
//!
//! This module contains the message/signal model and the DBC import that
//! fills it.

pub mod database;
pub mod dbc;

// Re-export key types for convenience
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, MuxRole, PhysicalRange, SignalDatabase,
    SignalDefinition, ValueType,
};
