//! CAN Codec Generator Library
//!
//! Turns declarative CAN message definitions into pack/unpack routines and
//! per-signal scaling and range-check functions.
//!
//! # Architecture
//!
//! Generation is data-driven:
//! - Each signal's start bit, length and byte order are planned once into an
//!   ordered list of byte-level [`BitChunk`]s
//! - A message's plans are validated together (bounds, overlaps) and compiled
//!   into an immutable [`MessageCodec`]
//! - `pack`/`unpack` only walk those plans, so a layout problem is always a
//!   generation-time [`CodecError::InvalidSchema`], never a runtime failure
//! - Every signal gets a [`SignalCodec`] with `encode`, `decode` and
//!   `is_in_range`
//!
//! The library does NOT:
//! - Send or receive frames
//! - Select multiplexed signals (a multiplexor is packed like any signal)
//! - Call range checks during pack/unpack
//!
//! # Example Usage
//!
//! ```no_run
//! use can_codegen::{CodegenConfig, Generator};
//! use std::path::Path;
//!
//! let mut generator = Generator::new();
//! generator.add_dbc(Path::new("powertrain.dbc")).unwrap();
//!
//! let report = generator.generate(&CodegenConfig::new()).unwrap();
//! let engine = report.message("EngineData").unwrap();
//!
//! let mut frame = [0u8; 8];
//! engine
//!     .codec
//!     .pack_physical(&mut frame, &[("EngineSpeed", 1500.0)])
//!     .unwrap();
//!
//! for signal in engine.codec.unpack_physical(&frame).unwrap() {
//!     println!("{} = {}", signal.name, signal.physical);
//! }
//! ```

// Public modules
pub mod codec;
pub mod config;
pub mod generator;
pub mod layout;
pub mod message_codec;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use codec::{RangeValidator, ScalingCodec, SignalCodec};
pub use config::CodegenConfig;
pub use generator::{GeneratedMessage, GenerationReport, Generator, SkippedMessage};
pub use layout::BitChunk;
pub use message_codec::{DecodedSignal, MessageCodec, RawRecord, SignalPlan};
pub use signals::{
    ByteOrder, DatabaseStats, MessageDefinition, MuxRole, PhysicalRange, SignalDefinition,
    ValueType,
};
pub use types::{CodecError, RawKind, RawValue, RawWidth, Result, SchemaViolation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
