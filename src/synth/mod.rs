pub mod enumerator;
pub mod top_down;
pub mod divide_conquer;
#[cfg(feature = "solver")]
pub mod constraint;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{cfg::Grammar, error::Result, example::Example, term::Program};

pub use divide_conquer::DivideAndConquer;
pub use enumerator::Enumerator;
pub use top_down::TopDown;
#[cfg(feature = "solver")]
pub use constraint::ConstraintBased;

/// A synthesis strategy. Given a grammar and a list of examples, it
/// searches for a program consistent with all the examples.
///
/// `Ok(None)` means the search gave up: either the (finite) search space
/// was exhausted, or the search got cancelled. Errors are reserved for
/// configuration problems, like a grammar missing productions.
pub trait Synthesizer {
    fn synthesize(
        &mut self,
        grammar: &Grammar,
        examples: &[Example],
    ) -> Result<Option<Program>>;

    /// The token this synthesizer polls between frontier pops.
    fn cancel_token(&self) -> CancelToken;
}

/// A shared flag to stop a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
