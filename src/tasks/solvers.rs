use std::fmt;

/// Solver strategies compared in the `morerooms` experiment. Each one has its
/// own result log.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SolverStrategy {
    Optimizing,
    Satisfying,
    OneByOne,
}

impl fmt::Display for SolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStrategy::Optimizing => write!(f, "optimizing"),
            SolverStrategy::Satisfying => write!(f, "satisfying"),
            SolverStrategy::OneByOne => write!(f, "onebyone"),
        }
    }
}

impl SolverStrategy {
    pub fn iter_variants() -> std::slice::Iter<'static, SolverStrategy> {
        static VARIANTS: [SolverStrategy; 3] = [
            SolverStrategy::Optimizing,
            SolverStrategy::Satisfying,
            SolverStrategy::OneByOne,
        ];
        VARIANTS.iter()
    }

    /// Label of the result log holding this strategy's runs.
    pub fn log_label(&self) -> String {
        format!("morerooms-{self}")
    }

    pub fn legend_label(&self) -> &'static str {
        match self {
            SolverStrategy::Optimizing => "Optimizing solver",
            SolverStrategy::Satisfying => "Satisfying solver",
            SolverStrategy::OneByOne => "One-by-one solver",
        }
    }
}
