//! Unsupervised alignment of paired symbol sequences.
//!
//! Takes a corpus of (left, right) sequence pairs, such as graphemes
//! against phonemes or words against morphs, learns a substitution cost
//! function from the corpus itself, and aligns every pair with it.
//! No gold alignments, phonetic features or language resources are
//! required; the only signal is co-occurrence inside the corpus.
//!
//! The pipeline bootstraps joint counts with a position-based estimator,
//! smooths them with Simple Good-Turing and turns them into PMI-based
//! costs. It then iterates, aligning the corpus and rebuilding the cost
//! function from the new counts, until the average alignment cost stops
//! improving.
//!
//! ```no_run
//! use autoalign::{autoalign, EstimateConfig, Pair};
//!
//! let sym = |s: &str| s.split(' ').map(str::to_string).collect::<Vec<_>>();
//! let pairs = vec![
//!     Pair::new(sym("c a t"), sym("k a t")),
//!     Pair::new(sym("c i t y"), sym("s i t i")),
//! ];
//! let aligned = autoalign(&pairs, &EstimateConfig::default(), &())?;
//! for row in &aligned {
//!     println!("{:.2} {:?} {:?}", row.score, row.alignment.left, row.alignment.right);
//! }
//! # Ok::<(), autoalign::AutoalignError>(())
//! ```
pub mod cost;
pub mod edit;
pub mod error;
pub mod estimate;
pub mod good_turing;
pub mod render;
pub mod stats;

use rayon::prelude::*;

pub use crate::cost::{CostModel, Scoring};
pub use crate::edit::{Alignment, CostFn, FnCost, Grid, GAP};
pub use crate::error::AutoalignError;
pub use crate::estimate::{estimate, EstimateConfig, Estimated, Progress, Seed};
pub use crate::stats::{Duo, Stats, VocabSizes, SEP, UNSEEN};

/// Sequences are slices of owned symbols; a symbol is any non-empty
/// string without whitespace or commas, a single grapheme as much as a
/// multi-character phone label.
pub type Symbol = String;

/// One corpus row: two descriptions of the same underlying item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub left: Vec<Symbol>,
    pub right: Vec<Symbol>,
}

impl Pair {
    pub fn new(left: Vec<Symbol>, right: Vec<Symbol>) -> Self {
        Self { left, right }
    }
}

/// An alignment of one corpus pair together with its normalised score.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned {
    pub alignment: Alignment,
    pub score: f64,
}

/// Learns a cost function from the whole corpus, then aligns every pair
/// with it and scores each alignment against the costliest edit operation
/// observed while the function was being refined.
pub fn autoalign<P: Progress>(
    pairs: &[Pair],
    config: &EstimateConfig,
    progress: &P,
) -> Result<Vec<Aligned>, AutoalignError> {
    let estimated = estimate(pairs, config, progress)?;
    let rows = align(pairs, &estimated.model)?;
    Ok(rows
        .into_iter()
        .map(|(alignment, cost)| {
            let score = normalised(alignment.len(), cost, estimated.max_cost);
            Aligned { alignment, score }
        })
        .collect())
}

/// Aligns every pair under a fixed cost model, returning each pair's
/// first optimal alignment and its unnormalised total cost.
pub fn align(
    pairs: &[Pair],
    model: &CostModel,
) -> Result<Vec<(Alignment, f64)>, AutoalignError> {
    validate(pairs)?;
    pairs
        .par_iter()
        .map(|pair| {
            let grid = edit::grid(&pair.left, &pair.right, model);
            let alignment = edit::first_alignment(&pair.left, &pair.right, model, &grid)?;
            Ok((alignment, grid.total()))
        })
        .collect()
}

// Scores in (-inf, 1]: 1 for a free alignment, and below 0 when a pair
// aligns worse than max-cost operations all the way along. Deliberately
// unclamped, a negative score is a useful outlier signal.
fn normalised(len: usize, cost: f64, max_cost: f64) -> f64 {
    1.0 - cost / (len as f64 * max_cost)
}

// Every public entry taking a corpus goes through here; the reserved
// symbols must never occur as data.
pub(crate) fn validate(pairs: &[Pair]) -> Result<(), AutoalignError> {
    if pairs.is_empty() {
        return Err(AutoalignError::EmptyCorpus);
    }
    for pair in pairs {
        for symbol in pair.left.iter().chain(&pair.right) {
            if symbol == GAP || symbol == SEP || symbol == UNSEEN {
                return Err(AutoalignError::ReservedSymbol {
                    symbol: symbol.clone(),
                });
            }
        }
    }
    Ok(())
}
