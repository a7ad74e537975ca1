use crate::algebra::{CompileError, SolveError, SyntaxError};
use std::fmt;
use thiserror::Error;

/// Which sub-expression a parse failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    ParametricParts,
    Surface,
    Polar,
    Inequality,
    Implicit,
    Equation,
    Cartesian,
}

impl ParseContext {
    fn label(self) -> &'static str {
        match self {
            ParseContext::ParametricParts => " in parametric parts",
            ParseContext::Surface => " in surface expression",
            ParseContext::Polar => " in polar expression",
            ParseContext::Inequality => " in inequality",
            ParseContext::Implicit => " in implicit expression",
            ParseContext::Equation => " in equation",
            ParseContext::Cartesian => "",
        }
    }
}

impl fmt::Display for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_start_matches(" in "))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Parse error{}: {source}", .context.label())]
    Parse {
        context: ParseContext,
        #[source]
        source: SyntaxError,
    },

    #[error("{0}")]
    Evaluation(String),
}

impl Error {
    pub fn parse(context: ParseContext, source: SyntaxError) -> Self {
        Error::Parse { context, source }
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Evaluation(e.to_string())
    }
}

impl From<SolveError> for Error {
    fn from(e: SolveError) -> Self {
        Error::Evaluation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
