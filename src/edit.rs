//! Edit-distance grid construction and enumeration of tied-optimal
//! alignments under an arbitrary substitution cost function.
use crate::error::AutoalignError;
use crate::Symbol;

/// The symbol standing for an insertion or deletion in an alignment, the
/// middle dot U+00B7. Reserved; never valid inside an input sequence.
pub const GAP: &str = "·";

// Absolute tolerance for recognising which edit operation produced a cell.
const DELTA: f64 = 1e-5;

/// An edit-operation cost function. Exactly one of the two arguments may be
/// [`GAP`], never both; costs must be finite and non-negative.
pub trait CostFn {
    fn cost(&self, left: &str, right: &str) -> f64;
}

/// Wraps a closure as a [`CostFn`], mainly for fixed cost schemes in tests
/// and for callers bringing their own scoring.
pub struct FnCost<F>(pub F);

impl<F: Fn(&str, &str) -> f64> CostFn for FnCost<F> {
    fn cost(&self, left: &str, right: &str) -> f64 {
        (self.0)(left, right)
    }
}

/// Two equal-length gapped sequences; no position holds a gap on both
/// sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub left: Vec<Symbol>,
    pub right: Vec<Symbol>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.left.len()
    }
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// The cumulative-cost grid of a pair. Cell `(r, c)` holds the minimal cost
/// of aligning the first `c` left symbols against the first `r` right
/// symbols; the last cell is the pair's alignment cost.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
    max_step: f64,
}

impl Grid {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }
    /// Minimal cost of aligning the full pair.
    pub fn total(&self) -> f64 {
        self.cells[self.cells.len() - 1]
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    /// The largest single-operation cost evaluated while filling the grid.
    /// Negative infinity when both sequences were empty.
    pub fn max_step(&self) -> f64 {
        self.max_step
    }
}

/// Fills the `(|right|+1) x (|left|+1)` cost grid for the given pair with
/// the standard edit-distance recurrence. O(|left|·|right|) time and space.
pub fn grid<C: CostFn + ?Sized>(left: &[Symbol], right: &[Symbol], costs: &C) -> Grid {
    let cols = left.len() + 1;
    let rows = right.len() + 1;
    let mut cells = vec![0.0; rows * cols];
    let mut max_step = f64::NEG_INFINITY;
    let mut eval = |l: &str, r: &str| {
        let cost = costs.cost(l, r);
        if cost > max_step {
            max_step = cost;
        }
        cost
    };
    for r in 1..rows {
        cells[r * cols] = cells[(r - 1) * cols] + eval(GAP, &right[r - 1]);
    }
    for c in 1..cols {
        cells[c] = cells[c - 1] + eval(&left[c - 1], GAP);
        for r in 1..rows {
            let diagonal = cells[(r - 1) * cols + c - 1] + eval(&left[c - 1], &right[r - 1]);
            let up = cells[(r - 1) * cols + c] + eval(GAP, &right[r - 1]);
            let sideways = cells[r * cols + c - 1] + eval(&left[c - 1], GAP);
            cells[r * cols + c] = diagonal.min(up).min(sideways);
        }
    }
    Grid {
        rows,
        cols,
        cells,
        max_step,
    }
}

// A suspended traceback position together with the alignment suffix fixed
// so far, stored last-operation-first.
struct Branch {
    col: usize,
    row: usize,
    tail: Vec<(Symbol, Symbol)>,
}

/// Enumerates the tied-optimal alignments of a pair by walking the grid
/// back from the last cell with an explicit stack. At every cell each
/// incoming edge whose reconstructed cost matches the cell delta within
/// tolerance spawns a branch: diagonal first, then up (right-sequence
/// gap), then sideways (left-sequence gap), which fixes the output order.
///
/// Tie counts grow combinatorially for cost functions with many equal
/// weights, so `cap` bounds the enumeration; the returned list then holds
/// the first `cap` alignments in the canonical order. A cell no edge can
/// explain means the grid and the cost function disagree and is an error.
pub fn alignments<C: CostFn + ?Sized>(
    left: &[Symbol],
    right: &[Symbol],
    costs: &C,
    grid: &Grid,
    cap: Option<usize>,
) -> Result<Vec<Alignment>, AutoalignError> {
    let limit = cap.unwrap_or(usize::MAX);
    let mut found = Vec::new();
    if limit == 0 {
        return Ok(found);
    }
    let mut stack = vec![Branch {
        col: left.len(),
        row: right.len(),
        tail: Vec::new(),
    }];
    while let Some(Branch { col, row, mut tail }) = stack.pop() {
        if col == 0 && row == 0 {
            tail.reverse();
            let (left, right) = tail.into_iter().unzip();
            found.push(Alignment { left, right });
            if found.len() >= limit {
                break;
            }
            continue;
        }
        if col == 0 {
            // Only insertions remain.
            for k in (0..row).rev() {
                tail.push((GAP.to_string(), right[k].clone()));
            }
            stack.push(Branch { col: 0, row: 0, tail });
            continue;
        }
        if row == 0 {
            // Only deletions remain.
            for k in (0..col).rev() {
                tail.push((left[k].clone(), GAP.to_string()));
            }
            stack.push(Branch { col: 0, row: 0, tail });
            continue;
        }
        let here = grid.get(row, col);
        let diagonal =
            (here - grid.get(row - 1, col - 1) - costs.cost(&left[col - 1], &right[row - 1])).abs()
                < DELTA;
        let up = (here - grid.get(row - 1, col) - costs.cost(GAP, &right[row - 1])).abs() < DELTA;
        let sideways =
            (here - grid.get(row, col - 1) - costs.cost(&left[col - 1], GAP)).abs() < DELTA;
        if !(diagonal || up || sideways) {
            return Err(AutoalignError::Reconstruction { row, col });
        }
        // Pushed in reverse so the diagonal branch is explored first.
        if sideways {
            let mut tail = tail.clone();
            tail.push((left[col - 1].clone(), GAP.to_string()));
            stack.push(Branch { col: col - 1, row, tail });
        }
        if up {
            let mut tail = tail.clone();
            tail.push((GAP.to_string(), right[row - 1].clone()));
            stack.push(Branch { col, row: row - 1, tail });
        }
        if diagonal {
            tail.push((left[col - 1].clone(), right[row - 1].clone()));
            stack.push(Branch {
                col: col - 1,
                row: row - 1,
                tail,
            });
        }
    }
    Ok(found)
}

/// The first tied-optimal alignment in the canonical enumeration order,
/// for callers that only report one alignment per pair.
pub fn first_alignment<C: CostFn + ?Sized>(
    left: &[Symbol],
    right: &[Symbol],
    costs: &C,
    grid: &Grid,
) -> Result<Alignment, AutoalignError> {
    let mut found = alignments(left, right, costs, grid, Some(1))?;
    found.pop().ok_or(AutoalignError::Reconstruction {
        row: right.len(),
        col: left.len(),
    })
}
