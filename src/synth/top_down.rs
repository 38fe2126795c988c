use std::collections::VecDeque;

use log::{debug, info, trace};

use crate::{
    cfg::Grammar,
    error::Result,
    example::Example,
    interp::is_valid,
    term::{Program, Term},
};

use super::{enumerator::expand_bounded, CancelToken, Synthesizer};

/// Plain enumerate-and-test. Walks the grammar breadth-first from its start
/// symbol and returns the first complete term that agrees with every
/// example. Partial terms are never pruned.
#[derive(Debug, Clone, Default)]
pub struct TopDown {
    max_depth: Option<usize>,
    cancel: CancelToken,
}

impl TopDown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Synthesizer for TopDown {
    fn synthesize(
        &mut self,
        grammar: &Grammar,
        examples: &[Example],
    ) -> Result<Option<Program>> {
        let mut frontier = VecDeque::from([Term::leaf(grammar.start_symbol())]);
        let mut tried = 0usize;

        while let Some(term) = frontier.pop_front() {
            if self.cancel.is_cancelled() {
                info!("Top-down search cancelled after {tried} candidates");
                return Ok(None);
            }

            if !term.is_complete() {
                frontier.extend(expand_bounded(&term, grammar, self.max_depth)?);
                continue;
            }

            tried += 1;
            trace!("Try: {term}");

            let program = Program::new(term);
            if is_valid(&program, examples)? {
                debug!("Accepted {program} after {tried} candidates");
                return Ok(Some(program));
            }
        }

        info!("Top-down search space exhausted after {tried} candidates");

        Ok(None)
    }

    fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interpreter;

    #[test]
    fn finds_sum() {
        let grammar = Grammar::arithmetic();
        let examples = vec![
            Example::new([("x", 1), ("y", 2), ("z", 3)], 3),
            Example::new([("x", 2), ("y", 2), ("z", 2)], 4),
        ];

        let program = TopDown::new()
            .synthesize(&grammar, &examples)
            .unwrap()
            .unwrap();

        assert!(is_valid(&program, &examples).unwrap());
        assert_eq!(program.to_string(), "Add(x, y)");
    }

    #[test]
    fn finds_constant() {
        let grammar = Grammar::arithmetic();
        let examples = vec![Example::new([("x", 0), ("y", 0), ("z", 0)], 1)];

        let program = TopDown::new()
            .synthesize(&grammar, &examples)
            .unwrap()
            .unwrap();

        assert_eq!(program.to_string(), "1");
        assert_eq!(Interpreter::evaluate(&program, &examples[0].input).unwrap(), 1);
    }

    #[test]
    fn bounded_search_reports_failure() {
        let grammar = Grammar::arithmetic();
        let examples = vec![
            Example::new([("x", 1), ("y", 0), ("z", 0)], 1),
            Example::new([("x", 1), ("y", 0), ("z", 0)], 2),
        ];

        let res = TopDown::new()
            .with_max_depth(Some(2))
            .synthesize(&grammar, &examples)
            .unwrap();

        assert!(res.is_none());
    }

    #[test]
    fn cancelled_search_returns_nothing() {
        let grammar = Grammar::arithmetic();
        let examples = vec![Example::new([("x", 0), ("y", 0), ("z", 0)], 1)];
        let mut synth = TopDown::new();

        synth.cancel_token().cancel();
        assert!(synth.synthesize(&grammar, &examples).unwrap().is_none());
    }
}
