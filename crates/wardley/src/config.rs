//! Configuration types for the Wardley map engine.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! partial or empty configuration file is always valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`ReconcileConfig`] - Controls how parsed text is matched against stored records.
//!
//! # Example
//!
//! ```
//! # use wardley::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.reconcile().position_tolerance(), 0.5);
//! ```

use serde::Deserialize;

/// Drift, in percentage points, under which a node is left where it is.
const DEFAULT_POSITION_TOLERANCE: f64 = 0.5;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Reconciliation configuration section.
    #[serde(default)]
    reconcile: ReconcileConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(reconcile: ReconcileConfig) -> Self {
        Self { reconcile }
    }

    /// Returns the reconciliation configuration.
    pub fn reconcile(&self) -> &ReconcileConfig {
        &self.reconcile
    }
}

/// Settings for planning record changes from parsed text.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Largest per-axis difference between a parsed and a stored position
    /// that does not trigger an update.
    #[serde(default = "default_position_tolerance")]
    position_tolerance: f64,
}

fn default_position_tolerance() -> f64 {
    DEFAULT_POSITION_TOLERANCE
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
        }
    }
}

impl ReconcileConfig {
    /// Creates a new [`ReconcileConfig`].
    ///
    /// # Arguments
    ///
    /// * `position_tolerance` - Per-axis drift in percentage points that is ignored.
    pub fn new(position_tolerance: f64) -> Self {
        Self { position_tolerance }
    }

    /// Returns the position tolerance in percentage points.
    pub fn position_tolerance(&self) -> f64 {
        self.position_tolerance
    }
}
