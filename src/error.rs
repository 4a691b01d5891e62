use thiserror::Error;

/// Failures surfaced by the estimation and alignment entry points.
///
/// Degenerate smoothing (no singleton pairs, so the minimum-mass fallback
/// kicks in) is recoverable and only logged, never returned as an error.
#[derive(Debug, Error)]
pub enum AutoalignError {
    #[error("sequence contains the reserved symbol {symbol:?}")]
    ReservedSymbol { symbol: String },
    #[error("the corpus is empty; nothing to align")]
    EmptyCorpus,
    #[error("refinement did not converge within {limit} iterations")]
    IterationLimit { limit: usize },
    #[error("no edit operation reproduces grid cell ({row},{col}); grid and cost function disagree")]
    Reconstruction { row: usize, col: usize },
    #[error("invalid corpus row {line}: {text:?}")]
    InvalidRow { line: usize, text: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AutoalignError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}
