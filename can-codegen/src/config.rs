//! Generator configuration types
//!
//! This module defines the configuration the generator needs: which messages
//! to generate codecs for and how to react to schema errors.

use crate::signals::database::MessageDefinition;
use serde::{Deserialize, Serialize};

/// Configuration for the code generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Optional: only generate these messages (by name)
    #[serde(default)]
    pub message_filter: Option<Vec<String>>,

    /// Optional: only generate these CAN message IDs
    #[serde(default)]
    pub id_filter: Option<Vec<u32>>,

    /// Abort the whole run on the first schema error instead of skipping the
    /// offending message
    #[serde(default)]
    pub fail_fast: bool,
}

impl CodegenConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set message name filter
    pub fn with_message_filter(mut self, names: Vec<String>) -> Self {
        self.message_filter = Some(names);
        self
    }

    /// Builder method: set CAN ID filter
    pub fn with_id_filter(mut self, ids: Vec<u32>) -> Self {
        self.id_filter = Some(ids);
        self
    }

    /// Builder method: stop at the first invalid message
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Check if a message name passes the name filter
    pub fn should_generate_name(&self, name: &str) -> bool {
        match &self.message_filter {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }

    /// Check if a CAN ID passes the ID filter
    pub fn should_generate_id(&self, can_id: u32) -> bool {
        match &self.id_filter {
            Some(ids) => ids.contains(&can_id),
            None => true,
        }
    }

    /// Check if a message should get a codec
    pub fn should_generate(&self, message: &MessageDefinition) -> bool {
        self.should_generate_name(&message.name) && self.should_generate_id(message.id)
    }
}
