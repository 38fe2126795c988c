use std::collections::VecDeque;

use log::{debug, info, trace};
use z3::ast::{Ast, Bool, Int};

use crate::{
    cfg::{Grammar, Symbol},
    error::{Error, Result},
    example::Example,
    interp::{is_valid, ExprVal},
    term::{Program, Term},
};

use super::{enumerator::expand_bounded, CancelToken, Synthesizer};

/// Names the unknowns standing in for the holes of one partial term.
#[derive(Debug, Default)]
struct HoleNamer {
    ints: usize,
    bools: usize,
}

impl HoleNamer {
    fn next_int(&mut self) -> String {
        self.ints += 1;
        format!("E{}", self.ints - 1)
    }

    fn next_bool(&mut self) -> String {
        self.bools += 1;
        format!("B{}", self.bools - 1)
    }
}

/// Encodes partial terms into Z3 integer/boolean formulas. Every hole
/// becomes a fresh unconstrained constant.
struct Encoder<'ctx> {
    z3: &'ctx z3::Context,
    holes: HoleNamer,
}

impl<'ctx> Encoder<'ctx> {
    fn new(z3: &'ctx z3::Context) -> Self {
        Self {
            z3,
            holes: HoleNamer::default(),
        }
    }

    fn int(&mut self, term: &Term) -> Result<Int<'ctx>> {
        let op = match term.symbol() {
            Symbol::NonTerminal(_) => return Ok(Int::new_const(self.z3, self.holes.next_int())),
            Symbol::Terminal(op) => &**op,
        };

        match op {
            "Ite" => {
                let [cond, then, other] = term.args::<3>()?;
                let cond = self.bool(cond)?;
                Ok(cond.ite(&self.int(then)?, &self.int(other)?))
            },
            "Add" => {
                let [l, r] = term.args::<2>()?;
                Ok(Int::add(self.z3, &[&self.int(l)?, &self.int(r)?]))
            },
            "Multiply" => {
                let [l, r] = term.args::<2>()?;
                Ok(Int::mul(self.z3, &[&self.int(l)?, &self.int(r)?]))
            },
            "x" | "y" | "z" => Ok(Int::new_const(self.z3, op)),
            "1" | "2" | "3" => {
                let val = op.parse::<ExprVal>()
                    .map_err(|_| Error::UnknownOperator(op.to_string()))?;
                Ok(Int::from_i64(self.z3, val))
            },
            _ => Err(Error::UnknownOperator(op.to_string())),
        }
    }

    fn bool(&mut self, term: &Term) -> Result<Bool<'ctx>> {
        let op = match term.symbol() {
            Symbol::NonTerminal(_) => return Ok(Bool::new_const(self.z3, self.holes.next_bool())),
            Symbol::Terminal(op) => &**op,
        };

        match op {
            "Lt" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.int(l)?.lt(&self.int(r)?))
            },
            "Eq" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.int(l)?._eq(&self.int(r)?))
            },
            "And" => {
                let [l, r] = term.args::<2>()?;
                Ok(Bool::and(self.z3, &[&self.bool(l)?, &self.bool(r)?]))
            },
            "Or" => {
                let [l, r] = term.args::<2>()?;
                Ok(Bool::or(self.z3, &[&self.bool(l)?, &self.bool(r)?]))
            },
            "Not" => {
                let [x] = term.args::<1>()?;
                Ok(self.bool(x)?.not())
            },
            _ => Err(Error::UnknownOperator(op.to_string())),
        }
    }
}

/// Top-down enumeration that asks Z3, before expanding a partial term,
/// whether any filling of its holes could reproduce each example. Terms
/// that cannot are dropped together with everything they would expand to.
///
/// Pruning is per example: holes are free for every example separately,
/// which over-approximates the real search space. A term is only dropped
/// when Z3 proves it infeasible; an `unknown` answer keeps it. Accepted
/// programs are still checked by evaluation.
#[derive(Debug, Clone, Default)]
pub struct ConstraintBased {
    max_depth: Option<usize>,
    cancel: CancelToken,
}

impl ConstraintBased {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    fn feasible<'ctx>(
        z3: &'ctx z3::Context,
        solver: &z3::Solver<'ctx>,
        term: &Term,
        examples: &[Example],
    ) -> Result<bool> {
        let encoded = Encoder::new(z3).int(term)?;

        for example in examples {
            solver.push();

            for (name, val) in &example.input {
                solver.assert(&Int::new_const(z3, name.as_str())._eq(&Int::from_i64(z3, *val)));
            }
            solver.assert(&encoded._eq(&Int::from_i64(z3, example.output)));

            let verdict = solver.check();
            solver.pop(1);

            trace!("Z3 verdict for {term} on {example}: {verdict:?}");

            match verdict {
                z3::SatResult::Unsat => return Ok(false),
                z3::SatResult::Sat => {},
                // Only a proof of infeasibility prunes
                z3::SatResult::Unknown => debug!("Z3 gave up on {term} for {example}, keeping it"),
            }
        }

        Ok(true)
    }
}

impl Synthesizer for ConstraintBased {
    fn synthesize(
        &mut self,
        grammar: &Grammar,
        examples: &[Example],
    ) -> Result<Option<Program>> {
        let cfg = z3::Config::new();
        let z3 = z3::Context::new(&cfg);
        let solver = z3::Solver::new(&z3);

        let mut frontier = VecDeque::from([Term::leaf(grammar.start_symbol())]);
        let mut pruned = 0usize;

        while let Some(term) = frontier.pop_front() {
            if self.cancel.is_cancelled() {
                info!("Constraint-based search cancelled");
                return Ok(None);
            }

            if term.is_complete() {
                let program = Program::new(term);
                if is_valid(&program, examples)? {
                    debug!("Accepted {program}, pruned {pruned} partial terms");
                    return Ok(Some(program));
                }
                continue;
            }

            if Self::feasible(&z3, &solver, &term, examples)? {
                frontier.extend(expand_bounded(&term, grammar, self.max_depth)?);
            } else {
                pruned += 1;
                trace!("Pruned {term}");
            }
        }

        info!("Constraint-based search space exhausted, pruned {pruned} partial terms");

        Ok(None)
    }

    fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}
