use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong during a synthesis run. Note that
/// "no program found" is not an error: strategies report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grammar has no productions for non-terminal `{0}`")]
    UndefinedNonTerminal(String),

    #[error("variable `{0}` is not defined by the example input")]
    UndefinedVariable(String),

    #[error("cannot evaluate operator `{0}`")]
    UnknownOperator(String),

    #[error("operator `{op}` expects {expected} arguments, got {found}")]
    Arity {
        op: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot evaluate incomplete term `{0}`")]
    IncompleteTerm(String),

    #[error("failed to parse example `{line}`: {reason}")]
    Parse {
        line: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
