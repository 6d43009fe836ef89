//! Name-keyed map model produced by parsing Wardley DSL text.
//!
//! These values are transient: a parse builds them fresh, the caller consumes
//! them (usually to reconcile against persisted [`records`](crate::record)),
//! and they are dropped. Edges refer to components by display name and are
//! only resolved during validation.
//!
//! Positions are stored on the DSL's unit scale (`0.0..=1.0` by convention,
//! never range-checked). The persisted percentage scale is available through
//! [`Component::x_pct`] and [`Component::y_pct`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Factor between the DSL unit scale and the persisted percentage scale.
pub const PERCENT_SCALE: f64 = 100.0;

/// Metadata key that marks a persisted node as an anchor.
pub const KIND_METADATA_KEY: &str = "type";

/// The kind of a declared map component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// An end-user or demand-side actor.
    Anchor,
    /// A value-chain element.
    #[default]
    Component,
}

impl ComponentKind {
    /// Returns the DSL keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Anchor => "anchor",
            ComponentKind::Component => "component",
        }
    }

    /// Returns `true` for [`ComponentKind::Anchor`].
    pub fn is_anchor(&self) -> bool {
        matches!(self, ComponentKind::Anchor)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a [`ComponentKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown component kind `{0}`")]
pub struct UnknownKindError(String);

impl FromStr for ComponentKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anchor" => Ok(ComponentKind::Anchor),
            "component" => Ok(ComponentKind::Component),
            _ => Err(UnknownKindError(s.to_string())),
        }
    }
}

/// Explicit label placement relative to the component's default label position.
///
/// Offsets may be negative, unlike component positions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelOffset {
    #[serde(rename = "x")]
    dx: f64,
    #[serde(rename = "y")]
    dy: f64,
}

impl LabelOffset {
    /// Create a new label offset.
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Horizontal offset.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Vertical offset.
    pub fn dy(&self) -> f64 {
        self.dy
    }
}

/// A component or anchor declared in a map document.
///
/// Serializes to the engine boundary shape
/// `{ name, type, y_pct, x_pct, label }`, with positions on the percentage scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ComponentRepr", from = "ComponentRepr")]
pub struct Component {
    name: String,
    kind: ComponentKind,
    visibility: f64,
    evolution: f64,
    label_offset: Option<LabelOffset>,
}

impl Component {
    /// Create a component positioned on the unit scale.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, used as the edge-resolution key
    /// * `kind` - Anchor or component
    /// * `visibility` - Vertical axis, `1.0` is fully visible
    /// * `evolution` - Horizontal axis, `0.0` is genesis and `1.0` commodity
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        visibility: f64,
        evolution: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility,
            evolution,
            label_offset: None,
        }
    }

    /// Attach an explicit label offset.
    pub fn with_label_offset(mut self, label_offset: LabelOffset) -> Self {
        self.label_offset = Some(label_offset);
        self
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the component kind.
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Visibility on the unit scale.
    pub fn visibility(&self) -> f64 {
        self.visibility
    }

    /// Evolution on the unit scale.
    pub fn evolution(&self) -> f64 {
        self.evolution
    }

    /// Evolution on the persisted percentage scale.
    pub fn x_pct(&self) -> f64 {
        self.evolution * PERCENT_SCALE
    }

    /// Visibility on the persisted percentage scale.
    pub fn y_pct(&self) -> f64 {
        self.visibility * PERCENT_SCALE
    }

    /// Get the label offset, present only when the source supplied one.
    pub fn label_offset(&self) -> Option<LabelOffset> {
        self.label_offset
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Wire shape of [`Component`].
#[derive(Serialize, Deserialize)]
struct ComponentRepr {
    name: String,
    #[serde(rename = "type")]
    kind: ComponentKind,
    y_pct: f64,
    x_pct: f64,
    label: Option<LabelOffset>,
}

impl From<Component> for ComponentRepr {
    fn from(component: Component) -> Self {
        Self {
            y_pct: component.y_pct(),
            x_pct: component.x_pct(),
            name: component.name,
            kind: component.kind,
            label: component.label_offset,
        }
    }
}

impl From<ComponentRepr> for Component {
    fn from(repr: ComponentRepr) -> Self {
        Self {
            name: repr.name,
            kind: repr.kind,
            visibility: repr.y_pct / PERCENT_SCALE,
            evolution: repr.x_pct / PERCENT_SCALE,
            label_offset: repr.label,
        }
    }
}

/// A directed dependency between two components, by display name.
///
/// `source` sits above `target` in the value chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    source: String,
    target: String,
}

impl Edge {
    /// Create a new edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Get the source component name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the target component name.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}
