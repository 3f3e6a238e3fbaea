use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MedBridgeError, Result};

/// Top-level configuration for MedBridge.
///
/// Loaded from a TOML file; each section corresponds to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedBridgeConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl MedBridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MedBridgeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MedBridgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Interpretation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Clinician-side language code (BCP 47).
    pub primary_language: String,
    /// Patient-side language code.
    pub secondary_language: String,
    /// Endpoint that mints short-lived transport credentials.
    pub token_endpoint: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            primary_language: "en".to_string(),
            secondary_language: "es".to_string(),
            token_endpoint: "http://localhost:3000/api/realtime/token".to_string(),
        }
    }
}

/// Action detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Master switch for rule-based detection.
    pub enabled: bool,
    /// Minimum composed confidence for a prescription to be reported.
    pub min_prescription_confidence: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_prescription_confidence: 0.5,
        }
    }
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret for HMAC-SHA256 payload signing.
    pub secret: String,
    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts before a delivery is marked failed.
    pub max_attempts: u32,
    /// Base delay in seconds; attempt n waits base * 2^(n-1).
    pub base_delay_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            timeout_secs: 30,
            max_attempts: 3,
            base_delay_secs: 2,
        }
    }
}
