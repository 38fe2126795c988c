use std::collections::{BTreeSet, HashMap};

use log::{debug, error, info, trace};

use crate::{
    cfg::Grammar,
    error::Result,
    example::Example,
    interp::{holds, is_valid, produces},
    term::{Program, Term},
};

use super::{CancelToken, Enumerator, Synthesizer};

/// Indices into the (de-duplicated) example list.
pub type ExampleSet = BTreeSet<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolKind {
    Expr,
    Pred,
}

/// Terms together with the examples each of them satisfies, in the order
/// they were accepted. No two entries share the same example set.
#[derive(Debug)]
struct Pool {
    kind: PoolKind,
    entries: Vec<(Term, ExampleSet)>,
    covered: ExampleSet,
}

impl Pool {
    fn new(kind: PoolKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            covered: ExampleSet::new(),
        }
    }

    /// For expressions, the examples whose output the term reproduces.
    /// For predicates, the examples under which the term holds.
    fn satisfied(&self, term: &Term, examples: &[Example]) -> Result<ExampleSet> {
        let mut res = ExampleSet::new();

        for (idx, example) in examples.iter().enumerate() {
            let ok = match self.kind {
                PoolKind::Expr => produces(term, example)?,
                PoolKind::Pred => holds(term, example)?,
            };

            if ok {
                res.insert(idx);
            }
        }

        Ok(res)
    }

    /// Pulls terms from `enumerator` until one with a new, non-empty
    /// example set turns up. Returns `false` if the enumerator ran dry.
    fn grow(&mut self, enumerator: &mut Enumerator, examples: &[Example]) -> Result<bool> {
        while let Some(term) = enumerator.enumerate()? {
            let set = self.satisfied(&term, examples)?;
            trace!("{:?} {term} satisfies {set:?}", self.kind);

            if set.is_empty() || self.entries.iter().any(|(_, other)| *other == set) {
                continue;
            }

            debug!("Accepted {:?} {term} for examples {set:?}", self.kind);
            self.covered.extend(set.iter().copied());
            self.entries.push((term, set));

            return Ok(true);
        }

        Ok(false)
    }

    fn covers(&self, count: usize) -> bool {
        self.covered.len() == count
    }
}

/// Divide-and-conquer synthesis.
///
/// Keeps a pool of expressions and a pool of predicates, each entry
/// labelled with the examples it satisfies, and tries to stitch them into
/// a decision tree of `Ite` nodes: an expression handles the examples a
/// predicate selects, and the remaining examples are solved recursively
/// in the else-branch. When stitching fails, both pools grow by one entry
/// and the attempt is repeated.
///
/// If the examples cannot be covered by the grammar (for instance, two
/// examples with the same input and different outputs) and the grammar is
/// infinite, this never returns on its own. Bound it with
/// [`DivideAndConquer::with_max_depth`] or run it through
/// [`crate::task::run_with_timeout`].
#[derive(Debug, Clone, Default)]
pub struct DivideAndConquer {
    memoize: bool,
    max_depth: Option<usize>,
    cancel: CancelToken,
}

impl DivideAndConquer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches the stitching result of each example subset within one
    /// attempt. Changes running time only.
    pub fn with_memo(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Bounds the depth of pooled terms. With a bound both enumerators
    /// eventually run dry and an unsolvable run reports failure.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Synthesizer for DivideAndConquer {
    fn synthesize(
        &mut self,
        grammar: &Grammar,
        examples: &[Example],
    ) -> Result<Option<Program>> {
        let mut exprs = Enumerator::expressions(grammar)
            .with_max_depth(self.max_depth)
            .with_cancel(self.cancel.clone());
        let mut preds = Enumerator::predicates(grammar)
            .with_max_depth(self.max_depth)
            .with_cancel(self.cancel.clone());

        let examples = dedup(examples);
        if examples.is_empty() {
            // Anything goes
            return Ok(exprs.enumerate()?.map(Program::new));
        }

        let mut expr_pool = Pool::new(PoolKind::Expr);
        let mut pred_pool = Pool::new(PoolKind::Pred);
        let count = examples.len();

        while !expr_pool.covers(count) || !pred_pool.covers(count) {
            if !expr_pool.covers(count) && !expr_pool.grow(&mut exprs, &examples)? {
                info!("Expressions cannot cover all examples");
                return Ok(None);
            }
            if !pred_pool.covers(count) && !pred_pool.grow(&mut preds, &examples)? {
                info!("Predicates cannot cover all examples");
                return Ok(None);
            }
        }

        let all = (0..count).collect::<ExampleSet>();
        loop {
            if self.cancel.is_cancelled() {
                info!("Divide-and-conquer search cancelled");
                return Ok(None);
            }

            debug!(
                "Unifying {} expressions and {} predicates",
                expr_pool.entries.len(),
                pred_pool.entries.len(),
            );

            let unified = Unifier {
                exprs: &expr_pool.entries,
                preds: &pred_pool.entries,
                memo: self.memoize.then(HashMap::new),
                cancel: &self.cancel,
            }.unify(&all);

            if let Some(term) = unified {
                let program = Program::new(term);

                if !is_valid(&program, &examples)? {
                    error!("Unified program {program} fails the examples");
                    return Ok(None);
                }

                info!("Found {program}");
                return Ok(Some(program));
            }

            let grew_expr = expr_pool.grow(&mut exprs, &examples)?;
            let grew_pred = pred_pool.grow(&mut preds, &examples)?;
            if !grew_expr && !grew_pred && !self.cancel.is_cancelled() {
                info!("Both enumerators ran dry");
                return Ok(None);
            }
        }
    }

    fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

fn dedup(examples: &[Example]) -> Vec<Example> {
    let mut res: Vec<Example> = Vec::with_capacity(examples.len());

    for example in examples {
        if !res.contains(example) {
            res.push(example.clone());
        }
    }

    res
}

struct Unifier<'a> {
    exprs: &'a [(Term, ExampleSet)],
    preds: &'a [(Term, ExampleSet)],
    memo: Option<HashMap<ExampleSet, Option<Term>>>,
    cancel: &'a CancelToken,
}

impl Unifier<'_> {
    /// Builds a term that is correct on every example in `needed`, out of
    /// the pooled terms. Pools are scanned in insertion order.
    fn unify(&mut self, needed: &ExampleSet) -> Option<Term> {
        if let Some(hit) = self.memo.as_ref().and_then(|m| m.get(needed)) {
            return hit.clone();
        }

        let res = self.unify_uncached(needed);

        if let Some(memo) = &mut self.memo {
            memo.insert(needed.clone(), res.clone());
        }

        res
    }

    fn unify_uncached(&mut self, needed: &ExampleSet) -> Option<Term> {
        let exprs = self.exprs;
        let preds = self.preds;

        for (expr, satisfied) in exprs {
            if self.cancel.is_cancelled() {
                return None;
            }

            let uncovered = needed.difference(satisfied)
                .copied()
                .collect::<ExampleSet>();

            if uncovered.is_empty() {
                return Some(expr.clone());
            }
            // Nothing in common with what is needed here
            if uncovered.len() == needed.len() {
                continue;
            }

            // The guard has to select exactly the examples `expr` handles
            for (pred, _) in preds.iter().filter(|(_, selected)| selected == satisfied) {
                trace!("Trying {pred} => {expr}, remaining {uncovered:?}");

                if let Some(other) = self.unify(&uncovered) {
                    return Some(Term::op("Ite", vec![pred.clone(), expr.clone(), other]));
                }
            }
        }

        None
    }
}
