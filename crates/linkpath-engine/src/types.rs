//! Shared types for the linkpath chaining engine.

use serde::{Deserialize, Serialize};

use crate::diagnostics::ChainDiagnostics;

/// A 2D point in the caller's coordinate space.
///
/// No unit is carried: coordinates and the chaining tolerance only need to
/// agree with each other (see [`ChainConfig::unit_scale`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes. Computed as
    /// `dx * dx + dy * dy` with two roundings, so tolerance decisions at the
    /// boundary do not depend on fused multiply-add support.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Arithmetic mean of two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// One on-curve anchor together with its two Bézier handles.
///
/// `handle_in` shapes the curve arriving at the anchor, `handle_out` the
/// curve leaving it. A straight-line vertex has both handles on the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlTriple {
    /// Control point of the incoming curve segment.
    pub handle_in: Point,
    /// The on-curve point.
    pub anchor: Point,
    /// Control point of the outgoing curve segment.
    pub handle_out: Point,
}

impl ControlTriple {
    /// Create a new control triple.
    #[must_use]
    pub const fn new(handle_in: Point, anchor: Point, handle_out: Point) -> Self {
        Self {
            handle_in,
            anchor,
            handle_out,
        }
    }

    /// A triple whose handles coincide with the anchor.
    #[must_use]
    pub const fn corner(anchor: Point) -> Self {
        Self::new(anchor, anchor, anchor)
    }

    /// The same anchor traversed in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.handle_out, self.anchor, self.handle_in)
    }
}

/// One original path as handed over by the collaborator.
///
/// Each subpath becomes at least one fragment in the chaining pool. The
/// owner identifier is opaque to the engine; it is only compared for
/// equality and handed back with the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePath<K> {
    /// Identifier of the originating path.
    pub owner: K,
    /// Subpaths in document order.
    pub subpaths: Vec<Vec<ControlTriple>>,
}

impl<K> SourcePath<K> {
    /// Create a new source path.
    #[must_use]
    pub const fn new(owner: K, subpaths: Vec<Vec<ControlTriple>>) -> Self {
        Self { owner, subpaths }
    }
}

/// An output path assembled by linking fragments end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain(Vec<ControlTriple>);

impl Chain {
    /// Create a chain from a sequence of control triples.
    #[must_use]
    pub const fn new(triples: Vec<ControlTriple>) -> Self {
        Self(triples)
    }

    /// Returns `true` if the chain has no triples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of control triples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all control triples.
    #[must_use]
    pub fn triples(&self) -> &[ControlTriple] {
        &self.0
    }

    /// Anchor of the first triple, if any.
    #[must_use]
    pub fn start(&self) -> Option<Point> {
        self.0.first().map(|t| t.anchor)
    }

    /// Anchor of the last triple, if any.
    #[must_use]
    pub fn end(&self) -> Option<Point> {
        self.0.last().map(|t| t.anchor)
    }
}

/// The chains finalized for one owner.
///
/// An empty `chains` vector means every fragment of this owner was absorbed
/// into chains grown from other fragments; the collaborator is expected to
/// delete the owner's object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerChains<K> {
    /// Identifier of the originating path.
    pub owner: K,
    /// Finalized chains, in the order their seed fragments were visited.
    pub chains: Vec<Chain>,
}

/// Result of one chaining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResult<K> {
    /// Output per owner, in first-seen owner order.
    pub owners: Vec<OwnerChains<K>>,
    /// Counters and near-miss statistics collected during the run.
    pub diagnostics: ChainDiagnostics,
}

impl<K: PartialEq> ChainResult<K> {
    /// Chains finalized for `owner`, or `None` if the owner was never seen.
    #[must_use]
    pub fn get(&self, owner: &K) -> Option<&[Chain]> {
        self.owners
            .iter()
            .find(|o| &o.owner == owner)
            .map(|o| o.chains.as_slice())
    }
}

impl<K> ChainResult<K> {
    /// Owners that produced no chain and should be deleted.
    pub fn obsoleted(&self) -> impl Iterator<Item = &K> {
        self.owners
            .iter()
            .filter(|o| o.chains.is_empty())
            .map(|o| &o.owner)
    }

    /// Owners that produced at least one chain.
    pub fn remaining(&self) -> impl Iterator<Item = &OwnerChains<K>> {
        self.owners.iter().filter(|o| !o.chains.is_empty())
    }
}

/// Linear unit in which the chaining tolerance is expressed.
///
/// Conversion factors follow the CSS reference of 96 user units per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// CSS pixels (user units).
    Px,
    /// Millimetres.
    #[default]
    Mm,
    /// Centimetres.
    Cm,
    /// Inches.
    In,
    /// Points (1/72 inch).
    Pt,
    /// Picas (1/6 inch).
    Pc,
}

impl Unit {
    /// Number of user units (CSS pixels) in one of this unit.
    #[must_use]
    pub const fn user_units_per_unit(self) -> f64 {
        match self {
            Self::Px => 1.0,
            Self::Mm => 96.0 / 25.4,
            Self::Cm => 96.0 / 2.54,
            Self::In => 96.0,
            Self::Pt => 96.0 / 72.0,
            Self::Pc => 16.0,
        }
    }

    /// Short lowercase name, as used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::In => "in",
            Self::Pt => "pt",
            Self::Pc => "pc",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a chaining run.
///
/// `epsilon` is the maximum endpoint distance in the caller's unit;
/// `unit_scale` converts it into the coordinate space of the fragments.
/// An `epsilon` below [`Self::MIN_EPSILON`] (including zero and negative
/// values) is floored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum distance between two endpoints for them to be linked.
    pub epsilon: f64,

    /// Multiplier from the tolerance unit to fragment coordinates.
    pub unit_scale: f64,

    /// Fuse matched endpoints into one averaged anchor when linking.
    pub snap_ends: bool,

    /// Unit `epsilon` is expressed in, for reporting only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl ChainConfig {
    /// Default chaining tolerance.
    pub const DEFAULT_EPSILON: f64 = 0.01;
    /// Default unit scale (tolerance already in fragment coordinates).
    pub const DEFAULT_UNIT_SCALE: f64 = 1.0;
    /// Default for [`Self::snap_ends`].
    pub const DEFAULT_SNAP_ENDS: bool = true;
    /// Smallest tolerance ever used.
    pub const MIN_EPSILON: f64 = 0.001;

    /// Config with the tolerance given in `unit`, for fragments in user units.
    #[must_use]
    pub fn with_unit(epsilon: f64, unit: Unit) -> Self {
        Self {
            epsilon,
            unit_scale: unit.user_units_per_unit(),
            unit: Some(unit),
            ..Self::default()
        }
    }

    /// Tolerance after flooring, in the caller's unit.
    #[must_use]
    pub fn effective_epsilon(&self) -> f64 {
        self.epsilon.max(Self::MIN_EPSILON)
    }

    /// Squared tolerance in fragment coordinates.
    #[must_use]
    pub fn epsilon_sq(&self) -> f64 {
        let eps = self.effective_epsilon() * self.unit_scale;
        eps * eps
    }

    /// Check that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidConfig`] if `epsilon` is not finite or
    /// `unit_scale` is not a finite positive number.
    pub fn validate(&self) -> Result<(), ChainError> {
        if !self.epsilon.is_finite() {
            return Err(ChainError::InvalidConfig(format!(
                "epsilon must be finite, got {}",
                self.epsilon
            )));
        }
        if !self.unit_scale.is_finite() || self.unit_scale <= 0.0 {
            return Err(ChainError::InvalidConfig(format!(
                "unit_scale must be finite and positive, got {}",
                self.unit_scale
            )));
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            unit_scale: Self::DEFAULT_UNIT_SCALE,
            snap_ends: Self::DEFAULT_SNAP_ENDS,
            unit: None,
        }
    }
}

/// Errors that can occur while chaining.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// A subpath with no control triples was submitted.
    #[error("subpath {subpath} of source path {owner_position} has no control points")]
    MalformedFragment {
        /// Position of the source path in the input.
        owner_position: usize,
        /// Position of the subpath within its source path.
        subpath: usize,
    },

    /// The input contained no subpaths at all.
    #[error("nothing to chain: no path fragments were supplied")]
    NothingToChain,

    /// The configuration cannot drive a run.
    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
}
