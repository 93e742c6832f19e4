// DBC file -> generator -> codec, checked against known frames
use can_codegen::{CodegenConfig, Generator, RawValue};
use std::io::Write;
use tempfile::NamedTempFile;

const MOTOHAWK_DBC: &str = r#"
VERSION "1.0"

NS_ :

BS_:

BU_: PCM1 FOO

BO_ 496 ExampleMessage: 8 PCM1
 SG_ Enable : 7|1@0+ (1,0) [0|0] "-" Vector__XXX
 SG_ AverageRadius : 6|6@0+ (0.1,0) [0|5] "m" Vector__XXX
 SG_ Temperature : 0|12@0- (0.01,250) [229.53|270.47] "degK" PCM1

BO_ 512 Mixed: 4 PCM1
 SG_ Counter : 0|4@1+ (1,0) [0|15] "" FOO
 SG_ Speed : 4|18@1+ (0.5,-100) [-100|1000] "km/h" FOO
"#;

fn write_dbc(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn load() -> Generator {
    let _ = env_logger::builder().is_test(true).try_init();

    let dbc = write_dbc(MOTOHAWK_DBC);
    let mut generator = Generator::new();
    generator.add_dbc(dbc.path()).unwrap();
    generator
}

#[test]
fn test_motorola_golden_frame() {
    let generator = load();
    let report = generator.generate(&CodegenConfig::new()).unwrap();
    assert!(report.is_clean());

    let example = report.message("ExampleMessage").unwrap();
    let mut frame = [0u8; 8];
    example
        .codec
        .pack_physical(
            &mut frame,
            &[("Temperature", 250.55), ("AverageRadius", 3.2), ("Enable", 1.0)],
        )
        .unwrap();
    assert_eq!(frame, [0xC0, 0x06, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x00]);

    let decoded = example.codec.unpack_physical(&frame).unwrap();
    let temperature = decoded.iter().find(|s| s.name == "Temperature").unwrap();
    assert_eq!(temperature.raw_value, RawValue::Signed(55));
    assert!((temperature.physical - 250.55).abs() < 1e-6);
    assert!(temperature.in_range);
    assert_eq!(temperature.unit.as_deref(), Some("degK"));

    let radius = decoded.iter().find(|s| s.name == "AverageRadius").unwrap();
    assert_eq!(radius.raw_value, RawValue::Unsigned(32));
    assert!(radius.in_range);
}

#[test]
fn test_out_of_range_is_reported_not_rejected() {
    let generator = load();
    let example = generator.generate_message("ExampleMessage").unwrap();

    // 6.3 / 0.1 truncates to raw 62, above the declared [0|5]
    let mut frame = [0u8; 8];
    example
        .codec
        .pack_physical(&mut frame, &[("AverageRadius", 6.3)])
        .unwrap();

    let decoded = example.codec.unpack_physical(&frame).unwrap();
    let radius = decoded.iter().find(|s| s.name == "AverageRadius").unwrap();
    assert_eq!(radius.raw_value, RawValue::Unsigned(62));
    assert!(!radius.in_range);

    // Enable declares [0|0]: no range, always valid
    let enable = example.codec.signal_codec("Enable").unwrap();
    assert!(enable.range().is_open());
}

#[test]
fn test_little_endian_spanning_signal_from_dbc() {
    let generator = load();
    let mixed = generator.generate_message("Mixed").unwrap();
    assert_eq!(mixed.codec.byte_length(), 4);

    // Speed 0 km/h -> raw 200, Counter 0xA
    let mut frame = [0u8; 4];
    mixed
        .codec
        .pack_physical(&mut frame, &[("Counter", 10.0), ("Speed", 0.0)])
        .unwrap();
    assert_eq!(frame, [0x8A, 0x0C, 0x00, 0x00]);

    let mut record = mixed.codec.new_record();
    mixed.codec.unpack(&mut record, &frame).unwrap();
    assert_eq!(mixed.codec.raw(&record, "Counter").unwrap(), RawValue::Unsigned(10));
    assert_eq!(mixed.codec.raw(&record, "Speed").unwrap(), RawValue::Unsigned(200));

    let spans: Vec<usize> = mixed.codec.plans().iter().map(|p| p.chunks.len()).collect();
    assert_eq!(spans, vec![1, 3]);
}

#[test]
fn test_schema_error_from_dbc_is_skipped() {
    let broken = format!(
        "{}{}",
        MOTOHAWK_DBC,
        r#"
BO_ 768 TooShort: 2 PCM1
 SG_ Wide : 4|18@1+ (1,0) [0|0] "" FOO
"#
    );
    let dbc = write_dbc(&broken);

    let mut generator = Generator::new();
    generator.add_dbc(dbc.path()).unwrap();
    assert_eq!(generator.database_stats().num_messages, 3);

    let report = generator.generate(&CodegenConfig::new()).unwrap();
    assert_eq!(report.generated.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, 768);
    assert!(report.skipped[0].error.is_schema_error());
}
