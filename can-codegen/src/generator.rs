//! Main generator API
//!
//! The `Generator` is the entry point of the library: it collects message
//! definitions (directly or from DBC files) and turns each one into a
//! `GeneratedMessage` holding its pack/unpack codec and per-signal codecs.

use crate::config::CodegenConfig;
use crate::message_codec::MessageCodec;
use crate::signals::{DatabaseStats, MessageDefinition, SignalDatabase};
use crate::types::{CodecError, Result};
use std::path::Path;

/// Everything generated for one message
#[derive(Debug, Clone)]
pub struct GeneratedMessage {
    pub definition: MessageDefinition,
    pub codec: MessageCodec,
}

/// A message that was skipped because its layout is invalid
#[derive(Debug)]
pub struct SkippedMessage {
    pub name: String,
    pub id: u32,
    pub error: CodecError,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub generated: Vec<GeneratedMessage>,
    pub skipped: Vec<SkippedMessage>,
    /// Messages excluded by the configuration filters
    pub filtered: usize,
}

impl GenerationReport {
    /// Find a generated message by name
    pub fn message(&self, name: &str) -> Option<&GeneratedMessage> {
        self.generated.iter().find(|m| m.definition.name == name)
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// The main generator struct - entry point for all generation operations
pub struct Generator {
    /// Message definitions to generate codecs for
    signal_db: SignalDatabase,
}

impl Generator {
    /// Create a new generator instance
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Create a generator from already parsed message definitions
    pub fn from_messages(messages: impl IntoIterator<Item = MessageDefinition>) -> Self {
        let mut generator = Self::new();
        for message in messages {
            generator.add_message(message);
        }
        generator
    }

    /// Add a single message definition
    pub fn add_message(&mut self, message: MessageDefinition) {
        self.signal_db.add_message(message);
    }

    /// Load a DBC file and add its definitions to the signal database
    ///
    /// # Example
    /// ```no_run
    /// use can_codegen::Generator;
    /// use std::path::Path;
    ///
    /// let mut generator = Generator::new();
    /// generator.add_dbc(Path::new("powertrain.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        for message in messages {
            self.signal_db.add_message(message);
        }

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Underlying signal database
    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// Generate the codec of a single message by name
    pub fn generate_message(&self, name: &str) -> Result<GeneratedMessage> {
        let definition = self
            .signal_db
            .get_message_by_name(name)
            .ok_or_else(|| CodecError::MessageNotFound(name.to_string()))?;
        Self::build(definition)
    }

    /// Generate codecs for every message that passes the configured filters.
    ///
    /// A message with an invalid layout gets no codec. It is recorded in the
    /// report's `skipped` list, or aborts the run when `fail_fast` is set.
    pub fn generate(&self, config: &CodegenConfig) -> Result<GenerationReport> {
        let mut report = GenerationReport::default();

        for definition in self.signal_db.messages() {
            if !config.should_generate(definition) {
                log::trace!("Filtered out message {}", definition.name);
                report.filtered += 1;
                continue;
            }

            match Self::build(definition) {
                Ok(generated) => report.generated.push(generated),
                Err(error) if config.fail_fast => return Err(error),
                Err(error) => {
                    log::warn!("Skipping message {}: {}", definition.name, error);
                    report.skipped.push(SkippedMessage {
                        name: definition.name.clone(),
                        id: definition.id,
                        error,
                    });
                }
            }
        }

        log::info!(
            "Generated {} codec(s), skipped {}, filtered {}",
            report.generated.len(),
            report.skipped.len(),
            report.filtered
        );

        Ok(report)
    }

    fn build(definition: &MessageDefinition) -> Result<GeneratedMessage> {
        let codec = MessageCodec::new(definition)?;
        Ok(GeneratedMessage {
            definition: definition.clone(),
            codec,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalDefinition;

    fn messages() -> Vec<MessageDefinition> {
        vec![
            MessageDefinition::new(0x100, "Good", 8)
                .with_signal(SignalDefinition::new("a", 0, 16)),
            MessageDefinition::new(0x101, "Broken", 1)
                .with_signal(SignalDefinition::new("b", 0, 16)),
            MessageDefinition::new(0x102, "AlsoGood", 2)
                .with_signal(SignalDefinition::new("c", 0, 8).big_endian()),
        ]
    }

    #[test]
    fn test_generator_creation() {
        let generator = Generator::new();
        let stats = generator.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
    }

    #[test]
    fn test_generate_skips_invalid_messages() {
        let generator = Generator::from_messages(messages());
        let report = generator.generate(&CodegenConfig::new()).unwrap();

        assert_eq!(report.generated.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "Broken");
        assert!(report.skipped[0].error.is_schema_error());
        assert!(report.message("Broken").is_none());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_fail_fast_aborts() {
        let generator = Generator::from_messages(messages());
        let err = generator
            .generate(&CodegenConfig::new().with_fail_fast(true))
            .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_filters_apply() {
        let generator = Generator::from_messages(messages());
        let config = CodegenConfig::new().with_message_filter(vec!["AlsoGood".to_string()]);
        let report = generator.generate(&config).unwrap();

        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.filtered, 2);
        assert!(report.is_clean());
        assert_eq!(report.message("AlsoGood").unwrap().codec.byte_length(), 2);
    }

    #[test]
    fn test_generate_message_by_name() {
        let generator = Generator::from_messages(messages());
        assert!(generator.generate_message("Good").is_ok());
        assert!(matches!(
            generator.generate_message("Missing"),
            Err(CodecError::MessageNotFound(_))
        ));
        assert!(generator.generate_message("Broken").unwrap_err().is_schema_error());
    }
}
