//! User settings types and serialization.
//!
//! This module defines the typed user settings enum and handles
//! serialization to/from string values for database storage.

use serde::{Deserialize, Serialize};

/// All supported user settings with their typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum UserSetting {
    /// Whether the user has enabled external search.
    /// When enabled, searches will also query external providers for content
    /// that can be requested for download.
    #[serde(rename = "enable_external_search")]
    ExternalSearchEnabled(bool),
}

impl UserSetting {
    /// Get the storage key for this setting.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExternalSearchEnabled(_) => "enable_external_search",
        }
    }

    /// Serialize the value to a string for database storage.
    pub fn value_to_string(&self) -> String {
        match self {
            Self::ExternalSearchEnabled(enabled) => enabled.to_string(),
        }
    }

    /// Deserialize from key-value strings (used by store implementation).
    ///
    /// Returns `Ok(setting)` if the key is known and value is valid,
    /// `Err` with a description if the key is unknown or value is invalid.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        match key {
            "enable_external_search" => {
                let enabled = value
                    .parse::<bool>()
                    .map_err(|_| format!("Invalid boolean value for {}: {}", key, value))?;
                Ok(Self::ExternalSearchEnabled(enabled))
            }
            _ => Err(format!("Unknown setting key: {}", key)),
        }
    }

    /// Check if a key is a known setting key.
    pub fn is_known_key(key: &str) -> bool {
        matches!(key, "enable_external_search")
    }

    /// Get the default value for a setting by key.
    pub fn default_for_key(key: &str) -> Option<Self> {
        match key {
            "enable_external_search" => Some(Self::ExternalSearchEnabled(false)),
            _ => None,
        }
    }
}
