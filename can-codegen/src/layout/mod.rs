//! Signal bit layouts
//!
//! `planner` computes per-signal byte chunks, `schema` checks that a whole
//! message's chunks fit its byte length without colliding.

pub mod planner;
pub mod schema;

pub use planner::{plan, plan_signal, required_bytes, BitChunk};
pub use schema::{plan_message, validate};
