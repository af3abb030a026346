//! Run diagnostics: link counts and near-miss statistics.
//!
//! Collected as a side effect of every [`chain_paths`](crate::chain_paths)
//! call. None of these values influence the chaining itself; they exist so
//! the caller can report what happened and tune the tolerance.

use serde::{Deserialize, Serialize};

use crate::types::Unit;

/// Diagnostics collected from a single chaining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDiagnostics {
    /// Tolerance in the caller's unit, after flooring.
    pub epsilon: f64,
    /// Scale from the caller's unit to fragment coordinates.
    pub unit_scale: f64,
    /// Unit of `epsilon`, if the caller named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    /// Whether matched endpoints were fused.
    pub snap_ends: bool,
    /// Number of distinct owners in the input.
    pub owner_count: usize,
    /// Number of fragments in the pool after splitting.
    pub fragment_count: usize,
    /// Number of two-triple pieces peeled off self-closing fragments.
    pub split_count: usize,
    /// Number of successful link operations.
    pub link_count: usize,
    /// Number of finalized output chains.
    pub chain_count: usize,
    /// Owners that produced no chain.
    pub owners_obsoleted: usize,
    /// Owners that produced at least one chain.
    pub owners_remaining: usize,
    /// Smallest squared distance (fragment coordinates) among rejected
    /// endpoint comparisons, `None` if nothing was rejected.
    pub min_near_miss_sq: Option<f64>,
}

impl ChainDiagnostics {
    /// Distance of the closest rejected endpoint pair, in the caller's unit.
    #[must_use]
    pub fn min_near_miss_distance(&self) -> Option<f64> {
        self.min_near_miss_sq
            .map(|d_sq| d_sq.sqrt() / self.unit_scale)
    }

    fn unit_label(&self) -> &'static str {
        self.unit.map_or("units", Unit::as_str)
    }

    /// Produce a human-readable summary of the run.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Chain Diagnostics Report\n{}", "=".repeat(40)));
        lines.push(format!(
            "Fragments: {} ({} split off)  |  Sources: {}",
            self.fragment_count, self.split_count, self.owner_count,
        ));
        lines.push(format!(
            "Epsilon: {} {}  |  Snap ends: {}",
            self.epsilon,
            self.unit_label(),
            if self.snap_ends { "on" } else { "off" },
        ));
        lines.push(format!("Path nodes obsoleted: {}", self.owners_obsoleted));
        lines.push(format!("Path nodes remaining: {}", self.owners_remaining));
        lines.push(format!("Output chains: {}", self.chain_count));
        lines.push(format!("Successful link operations: {}", self.link_count));

        match self.min_near_miss_distance() {
            Some(d) => lines.push(format!(
                "Closest rejected distance: {d:.6} > {} {}",
                self.epsilon,
                self.unit_label(),
            )),
            None => lines.push("Closest rejected distance: none".to_owned()),
        }

        lines.join("\n")
    }
}
