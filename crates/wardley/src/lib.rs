//! Wardley - Text and record conversion for Wardley maps.
//!
//! A Wardley map is edited two ways: by dragging nodes around, which produces
//! stored records, and by typing map text. This crate converts between the
//! two and works out which record changes an edit to the text implies.

pub mod config;
pub mod reconcile;
pub mod store;

mod error;
mod snapshot;

pub use wardley_core::{record, semantic};
pub use wardley_parser::{CheckedMap, ParseResult};

pub use error::WardleyError;
pub use snapshot::snapshot_from_parse;

use log::{debug, info, trace};

use config::AppConfig;
use reconcile::ReconcilePlan;
use record::MapSnapshot;

/// Entry point for converting Wardley maps.
///
/// # Examples
///
/// ```
/// use wardley::{Engine, config::AppConfig};
///
/// let source = "anchor Customer [0.95, 0.65]\ncomponent Tea [0.63, 0.81]\nCustomer->Tea";
///
/// let engine = Engine::new(AppConfig::default());
///
/// // Strict parse: fails on any syntax or reference error
/// let checked = engine.check(source).expect("valid map");
/// assert_eq!(checked.parsed().edges().len(), 1);
///
/// // Canonical text
/// let canonical = engine.format(source).expect("valid map");
/// assert!(canonical.starts_with("anchor Customer [0.95, 0.65]"));
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    config: AppConfig,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse map text, recovering from bad lines.
    ///
    /// Never fails; problems are listed in [`ParseResult::errors`].
    pub fn parse(&self, source: &str) -> ParseResult {
        let parsed = wardley_parser::parse(source);
        trace!(parsed:?; "Parsed map");
        parsed
    }

    /// Parse and validate map text.
    ///
    /// # Errors
    ///
    /// Returns `WardleyError::Parse` with every syntax and validation
    /// diagnostic when the text has any error.
    pub fn check(&self, source: &str) -> Result<CheckedMap, WardleyError> {
        info!("Checking map");
        wardley_parser::check(source).map_err(|err| WardleyError::new_parse_error(err, source))
    }

    /// Generate canonical map text from stored records.
    pub fn generate(&self, snapshot: &MapSnapshot) -> String {
        wardley_parser::generate(snapshot)
    }

    /// Rewrite map text into its canonical form.
    ///
    /// Comments and reserved statements are dropped, declarations are sorted
    /// by position and edges follow them.
    ///
    /// # Errors
    ///
    /// Returns `WardleyError::Parse` when the text does not check cleanly.
    pub fn format(&self, source: &str) -> Result<String, WardleyError> {
        let checked = self.check(source)?;
        let snapshot = snapshot_from_parse(checked.parsed());
        debug!(nodes = snapshot.nodes().len(); "Formatting map");
        Ok(self.generate(&snapshot))
    }

    /// Returns `true` when `source` is already in canonical form.
    ///
    /// Line endings are not part of the form: CRLF text whose lines match
    /// the canonical lines is formatted, as is a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `WardleyError::Parse` when the text does not check cleanly.
    pub fn is_formatted(&self, source: &str) -> Result<bool, WardleyError> {
        let formatted = self.format(source)?;
        let normalized = source.replace("\r\n", "\n");
        Ok(formatted == normalized.trim_end_matches('\n'))
    }

    /// Plan the record changes that bring `current` in line with `source`.
    ///
    /// # Errors
    ///
    /// Returns `WardleyError::Parse` when the text does not check cleanly and
    /// `WardleyError::Reconcile` when it declares no components.
    pub fn plan(&self, source: &str, current: &MapSnapshot) -> Result<ReconcilePlan, WardleyError> {
        let checked = self.check(source)?;
        let plan = reconcile::plan(checked.parsed(), current, self.config.reconcile())?;
        info!(empty = plan.is_empty(); "Reconciliation planned");
        Ok(plan)
    }
}
