//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_codegen::CodegenConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Only generate these messages (by name)
    pub messages: Option<Vec<String>>,
    /// Only generate these CAN IDs
    pub ids: Option<Vec<u32>>,
    #[serde(default)]
    pub fail_fast: bool,
}

impl GenerationConfig {
    pub fn to_codegen_config(&self) -> CodegenConfig {
        let mut config = CodegenConfig::new().with_fail_fast(self.fail_fast);
        if let Some(messages) = &self.messages {
            config = config.with_message_filter(messages.clone());
        }
        if let Some(ids) = &self.ids {
            config = config.with_id_filter(ids.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    // Relative DBC paths are relative to the config file
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.input.dbc_files = config
        .input
        .dbc_files
        .iter()
        .map(|p| if p.is_absolute() { p.clone() } else { base.join(p) })
        .collect();

    log::debug!(
        "Config {:?}: {} DBC file(s), format {:?}",
        path,
        config.input.dbc_files.len(),
        config.output.format
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            dbc_files = ["powertrain.dbc", "body.dbc"]

            [generation]
            messages = ["EngineData"]
            ids = [291, 0x200]
            fail_fast = true

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.dbc_files.len(), 2);
        assert_eq!(config.output.format, OutputFormat::Json);

        let codegen = config.generation.to_codegen_config();
        assert_eq!(codegen.message_filter, Some(vec!["EngineData".to_string()]));
        assert_eq!(codegen.id_filter, Some(vec![291, 0x200]));
        assert!(codegen.fail_fast);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.dbc_files.is_empty());
        assert_eq!(config.output.format, OutputFormat::Text);

        let codegen = config.generation.to_codegen_config();
        assert!(codegen.message_filter.is_none());
        assert!(!codegen.fail_fast);
    }

    #[test]
    fn test_load_config_resolves_relative_paths() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[input]\ndbc_files = [\"signals.dbc\"]").unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        let expected = file.path().parent().unwrap().join("signals.dbc");
        assert_eq!(config.input.dbc_files, vec![expected]);
    }

    #[test]
    fn test_load_config_reports_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"html\"").unwrap();
        file.flush().unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
