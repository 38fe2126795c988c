use std::collections::VecDeque;

use log::trace;

use crate::{
    cfg::{Grammar, Symbol},
    error::Result,
    term::Term,
};

use super::CancelToken;

pub const EXPR_SYMBOL: &str = "E";
pub const PRED_SYMBOL: &str = "B";

/// Breadth-first generator of complete terms derivable from one
/// non-terminal.
///
/// The frontier is a FIFO of partial terms. Each call pops terms until a
/// complete one shows up, expanding (one leftmost step) and requeueing the
/// incomplete ones. The order is breadth-first over expansion steps, not
/// over term size, but every finite derivation is eventually produced.
pub struct Enumerator<'g> {
    grammar: &'g Grammar,
    start: Symbol,
    frontier: VecDeque<Term>,
    max_depth: Option<usize>,
    cancel: CancelToken,
}

impl<'g> Enumerator<'g> {
    pub fn new(grammar: &'g Grammar, start: Symbol) -> Self {
        Self {
            grammar,
            frontier: VecDeque::from([Term::leaf(start.clone())]),
            start,
            max_depth: None,
            cancel: CancelToken::new(),
        }
    }

    /// Enumerates expressions, starting from `E`.
    pub fn expressions(grammar: &'g Grammar) -> Self {
        Self::new(grammar, Symbol::non_terminal(EXPR_SYMBOL))
    }

    /// Enumerates predicates, starting from `B`.
    pub fn predicates(grammar: &'g Grammar) -> Self {
        Self::new(grammar, Symbol::non_terminal(PRED_SYMBOL))
    }

    /// Drops every partial term deeper than `depth`, which makes the
    /// enumeration finite.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the next complete term, or `None` once the frontier is empty
    /// or the search was cancelled.
    pub fn enumerate(&mut self) -> Result<Option<Term>> {
        while let Some(term) = self.frontier.pop_front() {
            if self.cancel.is_cancelled() {
                trace!("Enumeration from {} cancelled", self.start);
                return Ok(None);
            }

            if term.is_complete() {
                trace!("Enumerated: {term}");
                return Ok(Some(term));
            }

            let expanded = term.expand(self.grammar)?;
            self.push_all(expanded);
        }

        Ok(None)
    }

    fn push_all(&mut self, terms: Vec<Term>) {
        match self.max_depth {
            None => self.frontier.extend(terms),
            Some(limit) => self.frontier.extend(
                terms.into_iter().filter(|x| x.depth() <= limit)
            ),
        }
    }
}

/// Expands `term` and keeps the results within `max_depth`. Shared by the
/// strategies that drive their own frontier.
pub(crate) fn expand_bounded(
    term: &Term,
    grammar: &Grammar,
    max_depth: Option<usize>,
) -> Result<Vec<Term>> {
    let mut res = term.expand(grammar)?;

    if let Some(limit) = max_depth {
        res.retain(|x| x.depth() <= limit);
    }

    Ok(res)
}
