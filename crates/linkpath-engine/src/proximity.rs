//! Endpoint proximity test with near-miss tracking.
//!
//! Every endpoint comparison in a run goes through one [`Proximity`]
//! instance. Comparisons are done on squared distances only. Rejected
//! comparisons feed the smallest observed squared distance, which lets the
//! caller report how close the closest rejected pair was after the run.

use crate::types::{ChainConfig, Point};

/// Tolerance test shared by the splitter and the chaining engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Proximity {
    epsilon_sq: f64,
    min_near_miss_sq: Option<f64>,
}

impl Proximity {
    /// Create a tester for an already squared tolerance.
    #[must_use]
    pub const fn new(epsilon_sq: f64) -> Self {
        Self {
            epsilon_sq,
            min_near_miss_sq: None,
        }
    }

    /// Create a tester from a chaining configuration.
    #[must_use]
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.epsilon_sq())
    }

    /// Squared tolerance in effect.
    #[must_use]
    pub const fn epsilon_sq(&self) -> f64 {
        self.epsilon_sq
    }

    /// Smallest squared distance among rejected comparisons so far.
    #[must_use]
    pub const fn min_near_miss_sq(&self) -> Option<f64> {
        self.min_near_miss_sq
    }

    /// Returns `true` if `p` and `q` are within tolerance.
    ///
    /// A rejected pair updates the near-miss minimum; the result of the
    /// test never depends on that bookkeeping.
    pub fn near(&mut self, p: Point, q: Point) -> bool {
        let d_sq = p.distance_squared(q);
        if d_sq > self.epsilon_sq {
            self.min_near_miss_sq = Some(
                self.min_near_miss_sq
                    .map_or(d_sq, |current| current.min(d_sq)),
            );
            false
        } else {
            true
        }
    }
}
