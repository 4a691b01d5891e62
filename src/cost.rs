//! PMI-based cost functions built from smoothed co-occurrence statistics.
use crate::edit::CostFn;
use crate::stats::{SmoothedStats, VocabSizes};
use crate::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a (log joint, log left, log right) probability triple turns into an
/// edit-operation cost. Higher cost means the two symbols are less
/// associated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scoring {
    /// Shifted normalised pointwise mutual information, in [0, 1].
    Npmi,
    /// Negative pointwise mutual information with the joint term raised to
    /// the k-th power; `k = 1` is plain negative PMI, `k >= 2` keeps the
    /// cost non-negative.
    Pmi { k: f64 },
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::Npmi
    }
}

impl Scoring {
    pub fn score(self, log_joint: f64, log_left: f64, log_right: f64) -> f64 {
        match self {
            Scoring::Npmi => ((log_joint - log_left - log_right) / log_joint + 1.0) * 0.5,
            Scoring::Pmi { k } => -(k * log_joint - log_left - log_right),
        }
    }
}

/// A substitution cost function learned from a corpus: log-probability
/// tables for every smoothed joint and marginal count, plus fallback
/// log-probabilities for out-of-vocabulary symbols and combinations.
/// Evaluation is pure; the running maximum cost lives with the caller
/// (see [`crate::estimate::Estimated`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    log_joints: HashMap<Symbol, HashMap<Symbol, f64>>,
    log_lefts: HashMap<Symbol, f64>,
    log_rights: HashMap<Symbol, f64>,
    oov_joint: f64,
    oov_left: f64,
    oov_right: f64,
    scoring: Scoring,
}

impl CostModel {
    /// Precomputes the log-probability tables from smoothed statistics.
    ///
    /// The marginal fallbacks spread the per-pair unseen mass over the
    /// opposite vocabulary. Strictly they over-count by the one impossible
    /// GAP pairing when GAP itself was never seen, a case rare enough that
    /// the effect is negligible.
    pub fn from_stats(stats: &SmoothedStats, sizes: VocabSizes, scoring: Scoring) -> Self {
        let n = stats.total;
        let mut log_joints: HashMap<Symbol, HashMap<Symbol, f64>> = HashMap::new();
        for (duo, &count) in stats.joints.iter() {
            log_joints
                .entry(duo.left.clone())
                .or_default()
                .insert(duo.right.clone(), (count / n).ln());
        }
        let log_lefts = stats
            .lefts
            .iter()
            .map(|(symbol, &count)| (symbol.clone(), (count / n).ln()))
            .collect();
        let log_rights = stats
            .rights
            .iter()
            .map(|(symbol, &count)| (symbol.clone(), (count / n).ln()))
            .collect();
        Self {
            log_joints,
            log_lefts,
            log_rights,
            oov_joint: (stats.unseen / n).ln(),
            oov_left: (stats.unseen / n * sizes.right as f64).ln(),
            oov_right: (stats.unseen / n * sizes.left as f64).ln(),
            scoring,
        }
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub fn cost(&self, left: &str, right: &str) -> f64 {
        let log_joint = self
            .log_joints
            .get(left)
            .and_then(|row| row.get(right))
            .copied()
            .unwrap_or(self.oov_joint);
        let log_left = self.log_lefts.get(left).copied().unwrap_or(self.oov_left);
        let log_right = self
            .log_rights
            .get(right)
            .copied()
            .unwrap_or(self.oov_right);
        self.scoring.score(log_joint, log_left, log_right)
    }
}

impl CostFn for CostModel {
    fn cost(&self, left: &str, right: &str) -> f64 {
        CostModel::cost(self, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::GAP;
    use crate::stats::{smoothed_stats, Duo, Stats};

    fn sample_stats() -> (SmoothedStats, VocabSizes) {
        let mut emp: Stats<Duo> = Stats::new();
        emp.inc(Duo::new("a", "x"), 5.0);
        emp.inc(Duo::new("b", "y"), 3.0);
        emp.inc(Duo::new("a", "y"), 1.0);
        emp.inc(Duo::new("b", GAP), 1.0);
        emp.inc(Duo::new(GAP, "x"), 1.0);
        let sizes = VocabSizes {
            duos: 8,
            left: 3,
            right: 3,
        };
        (smoothed_stats(&emp, sizes), sizes)
    }

    #[test]
    fn npmi_is_a_shifted_ratio() {
        let score = Scoring::Npmi.score(-2.0, -1.0, -1.5);
        let expected = ((-2.0 - -1.0 - -1.5) / -2.0 + 1.0) * 0.5;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn pmi_k_one_is_negative_pmi() {
        let score = Scoring::Pmi { k: 1.0 }.score(-2.0, -1.0, -1.5);
        assert!((score - -(-2.0 + 1.0 + 1.5)).abs() < 1e-12);
    }

    #[test]
    fn npmi_costs_stay_in_unit_interval() {
        let (stats, sizes) = sample_stats();
        let model = CostModel::from_stats(&stats, sizes, Scoring::Npmi);
        for left in ["a", "b", GAP, "zz"] {
            for right in ["x", "y", GAP, "qq"] {
                if left == GAP && right == GAP {
                    continue;
                }
                let cost = model.cost(left, right);
                assert!(
                    (0.0..=1.0).contains(&cost),
                    "npmi cost {} out of range for ({}, {})",
                    cost,
                    left,
                    right
                );
            }
        }
    }

    #[test]
    fn frequent_pairs_cost_less_than_rare_ones() {
        let (stats, sizes) = sample_stats();
        let model = CostModel::from_stats(&stats, sizes, Scoring::Npmi);
        assert!(model.cost("a", "x") < model.cost("a", "y"));
        assert!(model.cost("b", "y") < model.cost("b", "x"));
    }

    #[test]
    fn oov_lookups_use_the_unseen_mass() {
        let (stats, sizes) = sample_stats();
        let model = CostModel::from_stats(&stats, sizes, Scoring::Npmi);
        let n = stats.total;
        let expected = Scoring::Npmi.score(
            (stats.unseen / n).ln(),
            (stats.unseen / n * sizes.right as f64).ln(),
            (stats.unseen / n * sizes.left as f64).ln(),
        );
        assert!((model.cost("zz", "qq") - expected).abs() < 1e-12);
    }

    #[test]
    fn seen_left_with_unseen_right_mixes_fallbacks() {
        let (stats, sizes) = sample_stats();
        let model = CostModel::from_stats(&stats, sizes, Scoring::Npmi);
        let n = stats.total;
        let expected = Scoring::Npmi.score(
            (stats.unseen / n).ln(),
            (stats.lefts.get(&"a".to_string()) / n).ln(),
            (stats.unseen / n * sizes.left as f64).ln(),
        );
        assert!((model.cost("a", "qq") - expected).abs() < 1e-12);
    }

    #[test]
    fn pmi_squared_costs_are_non_negative() {
        let (stats, sizes) = sample_stats();
        let model = CostModel::from_stats(&stats, sizes, Scoring::Pmi { k: 2.0 });
        for left in ["a", "b", GAP] {
            for right in ["x", "y"] {
                assert!(model.cost(left, right) >= 0.0);
            }
        }
    }
}
