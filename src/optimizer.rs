//! 2-opt local search over an open path.
//!
//! A move picks positions `i < j` with `j >= i + 2` and reverses the segment
//! `[i + 1, j]`. This removes the edges `(r[i], r[i+1])` and `(r[j], r[j+1])`
//! (the latter does not exist when `j` is the last position) and reconnects
//! the path through the reversed segment. Position 0 never moves.
//!
//! The objective is the sum of the `n - 1` consecutive edges. There is no
//! closing edge back to the first waypoint.
//!
//! # Scan order
//!
//! With [`ImprovementPolicy::FirstImprovement`] every scan walks `i` from 0 and
//! `j` from `i + 2`, applies the first candidate that is strictly shorter than
//! the current path and ends the scan there. The next scan restarts at
//! `i = 0`. Every scan, improving or not, counts against `max_iterations`.
//! Candidate lengths are recomputed over the whole path rather than from an
//! edge delta, which keeps the floating point comparison, and therefore the
//! chosen move, reproducible.
//!
//! # Complexity
//!
//! O(n²) candidates per scan, O(n) per candidate, at most `max_iterations`
//! scans. Intended for interactive waypoint counts (tens, not thousands).

use crate::matrix::DistanceMatrix;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default cap on the number of scans
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// How an improving move is chosen within a scan
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImprovementPolicy {
    /// Apply the first strictly improving move, then restart the scan
    #[default]
    FirstImprovement,
    /// Evaluate every move and apply the shortest (earliest on ties)
    BestImprovement,
}

/// Why the search stopped
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// Fewer than three waypoints, no move exists
    Trivial,
    /// A full scan found no improving move
    LocalOptimum,
    /// The scan budget ran out while moves were still being found
    IterationLimit,
    /// A cancellation request was observed between scans
    Cancelled,
}

/// Cooperative cancellation, polled before each scan
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Cancellation source that never fires
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Result of one optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    /// Visiting order as indices into the matrix
    pub order: Vec<usize>,
    /// Length of the starting order
    pub initial_length: f64,
    /// Length of `order`
    pub length: f64,
    /// Scans performed
    pub iterations: usize,
    /// Moves applied
    pub improvements: usize,
    pub stop: StopReason,
}

impl Optimization {
    /// Relative reduction of the path length, in percent
    pub fn improvement_percent(&self) -> f64 {
        if self.initial_length > 0.0 {
            (self.initial_length - self.length) / self.initial_length * 100.0
        } else {
            0.0
        }
    }
}

/// 2-opt path optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoOptOptimizer {
    pub policy: ImprovementPolicy,
    pub max_iterations: usize,
}

impl TwoOptOptimizer {
    pub fn new() -> Self {
        TwoOptOptimizer {
            policy: ImprovementPolicy::FirstImprovement,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn best_improvement() -> Self {
        TwoOptOptimizer {
            policy: ImprovementPolicy::BestImprovement,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn name(&self) -> &str {
        match self.policy {
            ImprovementPolicy::FirstImprovement => "2-Opt-FI",
            ImprovementPolicy::BestImprovement => "2-Opt-BI",
        }
    }

    /// Optimize starting from the identity order `0..n`
    pub fn optimize_identity(&self, matrix: &DistanceMatrix) -> Optimization {
        self.optimize(matrix, (0..matrix.size()).collect())
    }

    /// Optimize starting from `initial`, which must be a permutation of
    /// `0..matrix.size()`
    pub fn optimize(&self, matrix: &DistanceMatrix, initial: Vec<usize>) -> Optimization {
        self.optimize_with_cancel(matrix, initial, &NeverCancel)
    }

    /// Like [`optimize`](Self::optimize), polling `cancel` before each scan.
    ///
    /// On cancellation the best order found so far is returned. A run that is
    /// never cancelled gives exactly the output of `optimize`.
    pub fn optimize_with_cancel(
        &self,
        matrix: &DistanceMatrix,
        initial: Vec<usize>,
        cancel: &dyn Cancellation,
    ) -> Optimization {
        debug_assert!(initial.iter().all(|&i| i < matrix.size()));

        let mut route = initial;
        let mut length = matrix.path_length(&route);
        let initial_length = length;

        if route.len() < 3 {
            return Optimization {
                order: route,
                initial_length,
                length,
                iterations: 0,
                improvements: 0,
                stop: StopReason::Trivial,
            };
        }

        let mut scratch = route.clone();
        let mut iterations = 0;
        let mut improvements = 0;
        let mut improved = true;
        let mut cancelled = false;

        while improved && iterations < self.max_iterations {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            iterations += 1;

            let found = match self.policy {
                ImprovementPolicy::FirstImprovement => {
                    first_improvement_scan(matrix, &route, &mut scratch, length)
                }
                ImprovementPolicy::BestImprovement => {
                    best_improvement_scan(matrix, &route, &mut scratch, length)
                }
            };

            improved = match found {
                Some((i, j, new_length)) => {
                    route[i + 1..=j].reverse();
                    length = new_length;
                    improvements += 1;
                    true
                }
                None => false,
            };
        }

        let stop = if cancelled {
            StopReason::Cancelled
        } else if improved {
            StopReason::IterationLimit
        } else {
            StopReason::LocalOptimum
        };

        log::debug!(
            "{}: {} waypoints, {:.4} -> {:.4} km in {} scans ({} moves, {:?})",
            self.name(),
            route.len(),
            initial_length,
            length,
            iterations,
            improvements,
            stop
        );

        Optimization {
            order: route,
            initial_length,
            length,
            iterations,
            improvements,
            stop,
        }
    }
}

impl Default for TwoOptOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of `route` with positions `[i + 1, j]` reversed, computed in
/// `scratch`
#[inline]
fn reversed_length(matrix: &DistanceMatrix, route: &[usize], scratch: &mut [usize], i: usize, j: usize) -> f64 {
    scratch.copy_from_slice(route);
    scratch[i + 1..=j].reverse();
    matrix.path_length(scratch)
}

fn first_improvement_scan(
    matrix: &DistanceMatrix,
    route: &[usize],
    scratch: &mut [usize],
    current: f64,
) -> Option<(usize, usize, f64)> {
    let n = route.len();
    for i in 0..n - 2 {
        for j in i + 2..n {
            let candidate = reversed_length(matrix, route, scratch, i, j);
            if candidate < current {
                return Some((i, j, candidate));
            }
        }
    }
    None
}

fn best_improvement_scan(
    matrix: &DistanceMatrix,
    route: &[usize],
    scratch: &mut [usize],
    current: f64,
) -> Option<(usize, usize, f64)> {
    let n = route.len();
    let mut best: Option<(usize, usize, f64)> = None;
    let mut best_length = current;

    for i in 0..n - 2 {
        for j in i + 2..n {
            let candidate = reversed_length(matrix, route, scratch, i, j);
            if candidate < best_length {
                best_length = candidate;
                best = Some((i, j, candidate));
            }
        }
    }
    best
}
