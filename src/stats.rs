//! Sparse co-occurrence statistics and Good-Turing-based smoothing of
//! joint symbol counts.
use crate::edit::{Alignment, GAP};
use crate::good_turing::Count;
use crate::{Pair, Symbol};
use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// Separator between the left and the right symbol of a joint key, the
/// plus-minus sign U+00B1. Display-only; joint keys are typed.
pub const SEP: &str = "±";

/// Reserved key holding the per-pair mass of unseen symbol combinations,
/// three diaereses U+00A8.
pub const UNSEEN: &str = "¨¨¨";

/// A sparse counter from keys to non-negative float counts. Missing keys
/// count as zero. No ordering is guaranteed over the keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats<K: Eq + Hash>(HashMap<K, f64>);

impl<K: Eq + Hash> Default for Stats<K> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<K: Eq + Hash> Stats<K> {
    pub fn new() -> Self {
        Self::default()
    }
    /// Increases `key`'s count by `n`.
    pub fn inc(&mut self, key: K, n: f64) {
        *self.0.entry(key).or_insert(0.0) += n;
    }
    /// Overwrites `key`'s count with `n`.
    pub fn set(&mut self, key: K, n: f64) {
        self.0.insert(key, n);
    }
    pub fn get(&self, key: &K) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.keys()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, &f64)> {
        self.0.iter()
    }
    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Removes all keys and their counts.
    pub fn reset(&mut self) {
        self.0.clear();
    }
    /// Adds every count of `other` into this counter.
    pub fn merge(&mut self, other: Stats<K>) {
        for (key, count) in other.0 {
            self.inc(key, count);
        }
    }
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl<K: Eq + Hash> std::iter::FromIterator<(K, f64)> for Stats<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut stats = Stats::new();
        for (key, count) in iter {
            stats.inc(key, count);
        }
        stats
    }
}

/// A left-right symbol combination used as a joint-count key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Duo {
    pub left: Symbol,
    pub right: Symbol,
}

impl Duo {
    pub fn new<L: Into<Symbol>, R: Into<Symbol>>(left: L, right: R) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl std::fmt::Display for Duo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.left, SEP, self.right)
    }
}

/// Sizes of the combined, left and right alphabets. Each side counts the
/// observed alphabet plus one slot for [`GAP`]; the combined size excludes
/// the impossible GAP-GAP pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabSizes {
    pub duos: usize,
    pub left: usize,
    pub right: usize,
}

/// Scans every pair's sequences and derives the alphabet sizes.
pub fn vocab_sizes(pairs: &[Pair]) -> VocabSizes {
    let mut left_vocab: HashSet<&Symbol> = HashSet::new();
    let mut right_vocab: HashSet<&Symbol> = HashSet::new();
    for pair in pairs {
        left_vocab.extend(pair.left.iter());
        right_vocab.extend(pair.right.iter());
    }
    let left = left_vocab.len() + 1;
    let right = right_vocab.len() + 1;
    VocabSizes {
        duos: left * right - 1,
        left,
        right,
    }
}

/// Adds the co-occurrence counts of `alignment` into `stats`, each position
/// weighted by `1/n` where `n` is the number of tied-optimal alignments of
/// the pair, so every pair contributes total mass one per position.
pub fn joint_stats_from_alignment(alignment: &Alignment, stats: &mut Stats<Duo>, n: usize) {
    let weight = 1.0 / n as f64;
    for (left, right) in alignment.left.iter().zip(alignment.right.iter()) {
        stats.inc(Duo::new(left.clone(), right.clone()), weight);
    }
}

/// How many distinct joint keys share each raw count.
pub fn freq_of_counts(counts: &Stats<Duo>) -> Stats<Count> {
    let mut freq = Stats::new();
    for (_, &count) in counts.iter() {
        freq.inc(Count(count), 1.0);
    }
    freq
}

/// Smoothed joint and marginal counts, the per-pair unseen mass and the
/// total count N. Rebuilt from scratch every refinement iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedStats {
    pub joints: Stats<Duo>,
    pub lefts: Stats<Symbol>,
    pub rights: Stats<Symbol>,
    /// Count mass assigned to each individual unseen left-right combination.
    pub unseen: f64,
    /// Total joint count after smoothing.
    pub total: f64,
}

/// Replaces each observed joint count with its Good-Turing-smoothed value
/// and recomputes the marginals and the total. The total starts from the
/// smoother's key-0 output, the mass reserved for unseen combinations.
pub fn non_zero_smoothed_stats(
    emp_joints: &Stats<Duo>,
    smooth_counts: &BTreeMap<Count, f64>,
) -> (Stats<Duo>, Stats<Symbol>, Stats<Symbol>, f64) {
    let mut joints = Stats::new();
    let mut lefts = Stats::new();
    let mut rights = Stats::new();
    let mut total = smooth_counts.get(&Count(0.0)).copied().unwrap_or(0.0);
    for (duo, &raw) in emp_joints.iter() {
        let smooth = smooth_counts.get(&Count(raw)).copied().unwrap_or(raw);
        joints.set(duo.clone(), smooth);
        total += smooth;
        lefts.inc(duo.left.clone(), smooth);
        rights.inc(duo.right.clone(), smooth);
    }
    (joints, lefts, rights, total)
}

// Stand-in mass for the rare case with no singleton pairs, where
// Good-Turing reserves nothing for unseen combinations.
const MIN_TOTAL_COUNT: f64 = 1.0;

/// Distributes `counts_for_zero` evenly over the unseen left-right
/// combinations and inflates each observed marginal by the mass of the
/// partners it has never co-occurred with, so the marginal totals meet the
/// joint total. Returns the updated stats and the per-combination mass.
pub fn with_zero_smoothing(
    mut joints: Stats<Duo>,
    mut lefts: Stats<Symbol>,
    mut rights: Stats<Symbol>,
    sizes: VocabSizes,
    counts_for_zero: f64,
) -> (Stats<Duo>, Stats<Symbol>, Stats<Symbol>, f64) {
    let emp_duo_n = joints.size();
    let mass = if counts_for_zero > 0.0 {
        counts_for_zero
    } else {
        warn!("no mass reserved for unseen pairs; falling back to {}", MIN_TOTAL_COUNT);
        MIN_TOTAL_COUNT
    };
    // The bootstrap estimators can emit more distinct joint keys than the
    // vocabulary cross-product admits, so the open-slot count is signed;
    // a non-positive value degrades the unseen mass instead of panicking.
    let open_slots = sizes.duos as f64 - emp_duo_n as f64;
    if open_slots <= 0.0 {
        warn!(
            "{} observed joint keys exceed the {} vocabulary combinations; unseen mass degenerates",
            emp_duo_n, sizes.duos
        );
    }
    let unseen = mass / open_slots;

    let mut left_partners: HashMap<&Symbol, HashSet<&Symbol>> = HashMap::new();
    let mut right_partners: HashMap<&Symbol, HashSet<&Symbol>> = HashMap::new();
    for duo in joints.keys() {
        left_partners.entry(&duo.right).or_default().insert(&duo.left);
        right_partners.entry(&duo.left).or_default().insert(&duo.right);
    }

    let inflate = |vocab: usize, symbol: &Symbol, partners: &HashMap<&Symbol, HashSet<&Symbol>>| {
        let is_gap = (symbol == GAP) as usize as f64;
        let seen = partners.get(symbol).map_or(0, HashSet::len) as f64;
        (vocab as f64 - is_gap - seen) * unseen
    };
    let left_keys: Vec<Symbol> = lefts.keys().cloned().collect();
    for left in left_keys {
        let extra = inflate(sizes.right, &left, &right_partners);
        lefts.inc(left, extra);
    }
    let right_keys: Vec<Symbol> = rights.keys().cloned().collect();
    for right in right_keys {
        let extra = inflate(sizes.left, &right, &left_partners);
        rights.inc(right, extra);
    }
    drop(left_partners);
    drop(right_partners);

    joints.set(Duo::new(UNSEEN, UNSEEN), unseen);
    (joints, lefts, rights, unseen)
}

/// Full smoothing pipeline: frequency-of-counts, Good-Turing re-estimation,
/// marginal recomputation and zero-mass redistribution.
pub fn smoothed_stats(emp_joints: &Stats<Duo>, sizes: VocabSizes) -> SmoothedStats {
    let smooth_counts = crate::good_turing::simple(&freq_of_counts(emp_joints));
    let (joints, lefts, rights, total) = non_zero_smoothed_stats(emp_joints, &smooth_counts);
    let zero_mass = smooth_counts.get(&Count(0.0)).copied().unwrap_or(0.0);
    let (joints, lefts, rights, unseen) =
        with_zero_smoothing(joints, lefts, rights, sizes, zero_mass);
    SmoothedStats {
        joints,
        lefts,
        rights,
        unseen,
        total,
    }
}
