//! Text and JSON rendering of layouts, check results and decoded frames

use can_codegen::{BitChunk, ByteOrder, DecodedSignal, MessageCodec, RawValue};
use serde::Serialize;
use std::fmt::Write;

/// Layout of one generated message
#[derive(Debug, Serialize)]
pub struct MessageLayout {
    pub id: u32,
    pub name: String,
    pub byte_length: usize,
    pub signals: Vec<SignalLayout>,
}

#[derive(Debug, Serialize)]
pub struct SignalLayout {
    pub name: String,
    pub start_bit: u16,
    pub length: u16,
    pub byte_order: ByteOrder,
    pub raw_type: String,
    pub factor: f64,
    pub offset: f64,
    pub raw_min: Option<RawValue>,
    pub raw_max: Option<RawValue>,
    pub unit: Option<String>,
    pub chunks: Vec<BitChunk>,
}

impl MessageLayout {
    pub fn from_codec(codec: &MessageCodec) -> Self {
        let signals = codec
            .plans()
            .iter()
            .zip(codec.signal_codecs())
            .map(|(plan, signal)| SignalLayout {
                name: plan.name.clone(),
                start_bit: plan.start_bit,
                length: plan.length,
                byte_order: plan.byte_order,
                raw_type: signal.raw_kind().to_string(),
                factor: signal.scaling().factor,
                offset: signal.scaling().offset,
                raw_min: signal.range().raw_min(),
                raw_max: signal.range().raw_max(),
                unit: signal.unit().map(str::to_string),
                chunks: plan.chunks.clone(),
            })
            .collect();

        Self {
            id: codec.id(),
            name: codec.name().to_string(),
            byte_length: codec.byte_length(),
            signals,
        }
    }
}

/// Outcome of building every selected codec
#[derive(Debug, Default, Serialize)]
pub struct CheckSummary {
    pub generated: usize,
    pub filtered: usize,
    pub failures: Vec<CheckFailure>,
}

#[derive(Debug, Serialize)]
pub struct CheckFailure {
    pub id: u32,
    pub name: String,
    pub error: String,
}

/// Decoded view of one frame
#[derive(Debug, Serialize)]
pub struct DecodedFrame {
    pub id: u32,
    pub name: String,
    pub signals: Vec<DecodedRow>,
}

#[derive(Debug, Serialize)]
pub struct DecodedRow {
    pub name: String,
    pub raw: RawValue,
    pub physical: f64,
    pub unit: Option<String>,
    pub in_range: bool,
    pub description: Option<String>,
}

impl DecodedFrame {
    pub fn new(codec: &MessageCodec, signals: Vec<DecodedSignal>) -> Self {
        Self {
            id: codec.id(),
            name: codec.name().to_string(),
            signals: signals
                .into_iter()
                .map(|s| DecodedRow {
                    name: s.name,
                    raw: s.raw_value,
                    physical: s.physical,
                    unit: s.unit,
                    in_range: s.in_range,
                    description: s.description,
                })
                .collect(),
        }
    }
}

fn byte_order_label(order: ByteOrder) -> &'static str {
    match order {
        ByteOrder::LittleEndian => "LE",
        ByteOrder::BigEndian => "BE",
    }
}

fn format_range(min: Option<RawValue>, max: Option<RawValue>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("[{}..{}]", min, max),
        _ => "-".to_string(),
    }
}

pub fn render_layouts_text(layouts: &[MessageLayout]) -> String {
    let mut out = String::new();

    for layout in layouts {
        let _ = writeln!(
            out,
            "{} (ID 0x{:X}, {} byte(s))",
            layout.name, layout.id, layout.byte_length
        );
        for signal in &layout.signals {
            let _ = writeln!(
                out,
                "  {:<24} start={:<3} len={:<2} {} {:<4} factor={} offset={} raw={} {}",
                signal.name,
                signal.start_bit,
                signal.length,
                byte_order_label(signal.byte_order),
                signal.raw_type,
                signal.factor,
                signal.offset,
                format_range(signal.raw_min, signal.raw_max),
                signal.unit.as_deref().unwrap_or("")
            );
            for chunk in &signal.chunks {
                let _ = writeln!(
                    out,
                    "      byte {:<2} mask 0x{:02X} shift {} <- value bits {}..{}",
                    chunk.byte_index,
                    chunk.mask,
                    chunk.shift,
                    chunk.value_shift,
                    u16::from(chunk.value_shift) + u16::from(chunk.bits) - 1
                );
            }
        }
        out.push('\n');
    }

    out
}

pub fn render_check_text(summary: &CheckSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generated: {}  Failed: {}  Filtered: {}",
        summary.generated,
        summary.failures.len(),
        summary.filtered
    );
    for failure in &summary.failures {
        let _ = writeln!(out, "  0x{:X} {}: {}", failure.id, failure.name, failure.error);
    }
    out
}

pub fn render_decoded_text(frame: &DecodedFrame) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (ID 0x{:X})", frame.name, frame.id);
    for row in &frame.signals {
        let _ = writeln!(
            out,
            "  {:<24} {:>14} {:<8} raw={}{}{}",
            row.name,
            row.physical,
            row.unit.as_deref().unwrap_or(""),
            row.raw,
            row.description
                .as_deref()
                .map(|d| format!(" \"{}\"", d))
                .unwrap_or_default(),
            if row.in_range { "" } else { "  OUT OF RANGE" }
        );
    }
    out
}
