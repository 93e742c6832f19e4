//! Build a codec by hand, pack a frame and decode it again
//!
//! Run with: cargo run --example pack_frame

use can_codegen::{MessageCodec, MessageDefinition, SignalDefinition};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let message = MessageDefinition::new(0x1F0, "EngineData", 8)
        .with_signal(SignalDefinition::new("Counter", 0, 4).with_range(0.0, 15.0))
        .with_signal(
            SignalDefinition::new("EngineSpeed", 4, 18)
                .with_scaling(0.25, 0.0)
                .with_range(0.0, 16000.0)
                .with_unit("rpm"),
        )
        .with_signal(
            SignalDefinition::new("CoolantTemp", 32, 12)
                .big_endian()
                .signed()
                .with_scaling(0.1, 0.0)
                .with_range(-40.0, 150.0)
                .with_unit("degC"),
        );

    let codec = MessageCodec::new(&message)?;

    println!("Layout of {}:", codec.name());
    for plan in codec.plans() {
        let masks: Vec<String> = plan
            .chunks
            .iter()
            .map(|c| format!("byte {} & 0x{:02X}", c.byte_index, c.mask))
            .collect();
        println!("  {:<12} {}", plan.name, masks.join(", "));
    }

    let mut frame = [0u8; 8];
    codec.pack_physical(
        &mut frame,
        &[("Counter", 3.0), ("EngineSpeed", 2750.5), ("CoolantTemp", -12.3)],
    )?;
    println!("\nPacked: {:02X?}", frame);

    println!("\nDecoded:");
    for signal in codec.unpack_physical(&frame)? {
        println!(
            "  {:<12} = {} {} (raw {}, in range: {})",
            signal.name,
            signal.physical,
            signal.unit.as_deref().unwrap_or(""),
            signal.raw_value,
            signal.in_range
        );
    }

    Ok(())
}
