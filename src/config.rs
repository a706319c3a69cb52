//! Kernel configuration.
//!
//! All settings can be configured via environment variables:
//! - `VGK_BASE_LAYER_KEY`: annotation key of the base witness layer (default: `witnesses`)
//! - `VGK_BASE_LAYER_LABEL`: layer name reported for base rows (default: `base`)
//! - `VGK_FILL_LACUNA_GAPS`: fill skipped columns after a lacuna with the lacuna (default: `true`)

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;

/// Default annotation key for the base layer on sequence edges.
pub const DEFAULT_BASE_LAYER_KEY: &str = "witnesses";

/// Default name of the base layer.
pub const DEFAULT_BASE_LAYER_LABEL: &str = "base";

/// Configuration shared by the collation algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Annotation key under which sequence edges store base-layer witnesses.
    pub base_layer_key: String,
    /// Layer name used for base rows.
    pub base_layer_label: String,
    /// Whether columns skipped after a lacuna repeat the lacuna token.
    pub fill_lacuna_gaps: bool,
}

impl KernelConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_layer_key: std::env::var("VGK_BASE_LAYER_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.base_layer_key),
            base_layer_label: std::env::var("VGK_BASE_LAYER_LABEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.base_layer_label),
            fill_lacuna_gaps: std::env::var("VGK_FILL_LACUNA_GAPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fill_lacuna_gaps),
        }
    }

    /// Whether `layer` names the base layer, by key or by label.
    pub fn is_base_layer(&self, layer: &str) -> bool {
        layer == self.base_layer_key || layer == self.base_layer_label
    }

    /// Stable hash of the configuration.
    pub fn config_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            base_layer_key: DEFAULT_BASE_LAYER_KEY.to_string(),
            base_layer_label: DEFAULT_BASE_LAYER_LABEL.to_string(),
            fill_lacuna_gaps: true,
        }
    }
}
