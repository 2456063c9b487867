pub mod circuitgen;
pub mod equation;
pub mod minimize;
pub mod term;
pub mod truth_table;

use thiserror::Error;

pub use circuitgen::{synthesize, Fragment, PlacedFragment};
pub use equation::{render_equation, render_term, variable_name, variable_names};
pub use minimize::{minimize, MAX_VARIABLES};
pub use term::{Bit, Term};
pub use truth_table::TruthTable;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("a function needs at least one variable")]
    NoVariables,
    #[error("{num_vars} variables is too many, at most {max} are supported")]
    TooManyVariables { num_vars: usize, max: usize },
    #[error("minterm {minterm} does not fit in {num_vars} variables")]
    MintermOutOfRange { minterm: usize, num_vars: usize },
    #[error("invalid character {0:?} in term, expected '0', '1' or '-'")]
    InvalidTermCharacter(char),
    #[error("term {term} has {width} positions but the function has {num_vars} variables")]
    TermWidthMismatch { term: String, width: usize, num_vars: usize },
    #[error("a truth table needs a power of two rows (at least 2), got {0}")]
    BadTruthTableLength(usize),
    #[error("synthesized circuit was inconsistent: {0}")]
    Internal(String),
}

pub(crate) fn check_num_vars(num_vars: usize) -> Result<(), SynthesisError> {
    match num_vars {
        0 => Err(SynthesisError::NoVariables),
        n if n > MAX_VARIABLES => Err(SynthesisError::TooManyVariables { num_vars: n, max: MAX_VARIABLES }),
        _ => Ok(()),
    }
}
