//! Seed cost-function estimation and the iterative refinement loop that
//! alternates between aligning the corpus and re-estimating substitution
//! costs until the average alignment cost stops improving.
use crate::cost::{CostModel, Scoring};
use crate::edit::{self, Alignment, GAP};
use crate::error::AutoalignError;
use crate::stats::{joint_stats_from_alignment, smoothed_stats, vocab_sizes, Duo, Stats};
use crate::Pair;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bootstrap strategy for the joint counts that seed the first cost
/// function, before any alignment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seed {
    /// Right-pads the shorter sequence with GAP and counts exact
    /// positional co-occurrence. Adequate when length mismatch is rare.
    Padding,
    /// Maps positions of the shorter sequence onto the longer one by
    /// linear scaling and spreads fractional co-occurrence mass by
    /// inverse-square distance, plus a GAP credit for the length
    /// difference. A smoother prior when lengths differ substantially.
    Uniform,
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Uniform
    }
}

/// Observer notified while the refinement loop runs. Calls are advisory
/// and may arrive from worker threads; implementations must not block.
pub trait Progress: Sync {
    fn alignment(&self, _alignment: &Alignment) {}
    fn average_cost(&self, _average: f64) {}
}

/// The do-nothing observer.
impl Progress for () {}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimateConfig {
    pub seed: Seed,
    pub scoring: Scoring,
    /// Refinement runs until the first non-improving iteration, which on a
    /// perfectly flat cost trajectory never happens; a cap turns that into
    /// an [`AutoalignError::IterationLimit`] instead of a hang.
    pub max_iterations: Option<usize>,
    /// Bounds the tied-optimal alignments enumerated per pair. Tie counts
    /// can grow factorially in sequence length; per-pair stats are then
    /// computed from the first `n` alignments in canonical order.
    pub max_alignments: Option<usize>,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            scoring: Scoring::default(),
            max_iterations: None,
            max_alignments: None,
        }
    }
}

/// A converged cost model together with the largest single-operation cost
/// it produced while driving refinement, kept for score normalisation.
#[derive(Debug, Clone)]
pub struct Estimated {
    pub model: CostModel,
    pub max_cost: f64,
}

/// Builds the seed cost model for a corpus with the given strategy.
pub fn seed_model(pairs: &[Pair], seed: Seed, scoring: Scoring) -> CostModel {
    let counts = match seed {
        Seed::Padding => padding_counts(pairs),
        Seed::Uniform => uniform_counts(pairs),
    };
    let sizes = vocab_sizes(pairs);
    CostModel::from_stats(&smoothed_stats(&counts, sizes), sizes, scoring)
}

fn padding_counts(pairs: &[Pair]) -> Stats<Duo> {
    let mut stats = Stats::new();
    for pair in pairs {
        let mut left = pair.left.clone();
        let mut right = pair.right.clone();
        if left.len() < right.len() {
            left.resize(right.len(), GAP.to_string());
        } else if right.len() < left.len() {
            right.resize(left.len(), GAP.to_string());
        }
        joint_stats_from_alignment(&Alignment { left, right }, &mut stats, 1);
    }
    stats
}

fn uniform_counts(pairs: &[Pair]) -> Stats<Duo> {
    let mut stats = Stats::new();
    for pair in pairs {
        let (l_len, r_len) = (pair.left.len(), pair.right.len());
        if l_len >= r_len {
            let delta = l_len as f64 / r_len as f64;
            let half_delta = delta * 0.5;
            for (l, left) in pair.left.iter().enumerate() {
                let l_center = l as f64 + 0.5;
                for (r, right) in pair.right.iter().enumerate() {
                    let r_center = r as f64 * delta + half_delta;
                    let mass = 1.0 / ((l_center - r_center).abs() + 1.0).powi(2);
                    stats.inc(Duo::new(left.clone(), right.clone()), mass);
                }
                if l_len > r_len {
                    let credit = (l_len - r_len) as f64 / l_len as f64;
                    stats.set(Duo::new(left.clone(), GAP), credit);
                }
            }
        } else {
            let delta = r_len as f64 / l_len as f64;
            let half_delta = delta * 0.5;
            for (r, right) in pair.right.iter().enumerate() {
                let r_center = r as f64 + 0.5;
                for (l, left) in pair.left.iter().enumerate() {
                    let l_center = l as f64 * delta + half_delta;
                    let mass = 1.0 / ((l_center - r_center).abs() + 1.0).powi(2);
                    stats.inc(Duo::new(left.clone(), right.clone()), mass);
                    let credit = (r_len - l_len) as f64 / r_len as f64;
                    stats.set(Duo::new(GAP, left.clone()), credit);
                }
            }
        }
    }
    stats
}

/// Estimates a cost model for the corpus: seed, then refine until the
/// average alignment cost stops improving.
pub fn estimate<P: Progress>(
    pairs: &[Pair],
    config: &EstimateConfig,
    progress: &P,
) -> Result<Estimated, AutoalignError> {
    crate::validate(pairs)?;
    let seed = seed_model(pairs, config.seed, config.scoring);
    refine(pairs, seed, config, progress)
}

/// One corpus pass per iteration: align every pair under the current
/// model, accumulate tie-weighted co-occurrence counts, then smooth and
/// rebuild. Stops at the first iteration whose average cost fails to beat
/// the previous one and returns the *previous* model, so the result is
/// always the cheapest model evaluated so far. Without an iteration cap
/// the loop inherits the estimator's non-termination risk on a flat cost
/// plateau.
fn refine<P: Progress>(
    pairs: &[Pair],
    seed: CostModel,
    config: &EstimateConfig,
    progress: &P,
) -> Result<Estimated, AutoalignError> {
    let sizes = vocab_sizes(pairs);
    let mut old_model = seed.clone();
    let mut model = seed;
    let mut old_max = f64::NEG_INFINITY;
    let mut max_cost = f64::NEG_INFINITY;
    let mut old_average = f64::INFINITY;
    let mut iteration = 0usize;
    loop {
        if let Some(limit) = config.max_iterations {
            if iteration >= limit {
                return Err(AutoalignError::IterationLimit { limit });
            }
        }
        iteration += 1;
        let per_pair = corpus_pass(pairs, &model, config.max_alignments, progress)?;
        let mut cost_sum = 0.0;
        let mut joint_stats: Stats<Duo> = Stats::new();
        for (cost, max_step, stats) in per_pair {
            cost_sum += cost;
            if max_step > max_cost {
                max_cost = max_step;
            }
            joint_stats.merge(stats);
        }
        let average = cost_sum / pairs.len() as f64;
        progress.average_cost(average);
        debug!("iteration:{}\taverage_cost:{:.6}", iteration, average);
        if average >= old_average {
            return Ok(Estimated {
                model: old_model,
                max_cost: old_max,
            });
        }
        let next = CostModel::from_stats(&smoothed_stats(&joint_stats, sizes), sizes, config.scoring);
        old_model = model;
        old_max = max_cost;
        model = next;
        max_cost = f64::NEG_INFINITY;
        old_average = average;
    }
}

// Pairs are independent within an iteration; the per-pair partial stats
// are merged by the caller once the whole pass has finished.
fn corpus_pass<P: Progress>(
    pairs: &[Pair],
    model: &CostModel,
    max_alignments: Option<usize>,
    progress: &P,
) -> Result<Vec<(f64, f64, Stats<Duo>)>, AutoalignError> {
    pairs
        .par_iter()
        .map(|pair| {
            let grid = edit::grid(&pair.left, &pair.right, model);
            let tied = edit::alignments(&pair.left, &pair.right, model, &grid, max_alignments)?;
            let mut stats = Stats::new();
            for alignment in &tied {
                joint_stats_from_alignment(alignment, &mut stats, tied.len());
            }
            if let Some(first) = tied.first() {
                progress.alignment(first);
            }
            Ok((grid.total(), grid.max_step(), stats))
        })
        .collect()
}
