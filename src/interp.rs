use crate::{
    cfg::Symbol,
    error::{Error, Result},
    example::{Env, Example},
    term::{Program, Term},
};

pub type ExprVal = i64;

/// Evaluates complete terms of the arithmetic grammar under a fixed
/// variable assignment. `Add` and `Multiply` wrap on overflow.
pub struct Interpreter<'a> {
    env: &'a Env,
}

impl<'a> Interpreter<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }

    pub fn evaluate(program: &Program, env: &Env) -> Result<ExprVal> {
        Interpreter::new(env).eval_expr(program.root())
    }

    pub fn eval_expr(&self, term: &Term) -> Result<ExprVal> {
        let op = Self::operator(term)?;

        match op {
            "Ite" => {
                let [cond, then, other] = term.args::<3>()?;
                if self.eval_pred(cond)? {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(other)
                }
            },
            "Add" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_expr(l)?.wrapping_add(self.eval_expr(r)?))
            },
            "Multiply" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_expr(l)?.wrapping_mul(self.eval_expr(r)?))
            },
            "x" | "y" | "z" => {
                term.args::<0>()?;
                self.env.get(op)
                    .copied()
                    .ok_or_else(|| Error::UndefinedVariable(op.to_string()))
            },
            "1" | "2" | "3" => {
                term.args::<0>()?;
                op.parse()
                    .map_err(|_| Error::UnknownOperator(op.to_string()))
            },
            _ => Err(Error::UnknownOperator(op.to_string())),
        }
    }

    pub fn eval_pred(&self, term: &Term) -> Result<bool> {
        let op = Self::operator(term)?;

        match op {
            "Lt" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_expr(l)? < self.eval_expr(r)?)
            },
            "Eq" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_expr(l)? == self.eval_expr(r)?)
            },
            "And" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_pred(l)? && self.eval_pred(r)?)
            },
            "Or" => {
                let [l, r] = term.args::<2>()?;
                Ok(self.eval_pred(l)? || self.eval_pred(r)?)
            },
            "Not" => {
                let [x] = term.args::<1>()?;
                Ok(!self.eval_pred(x)?)
            },
            _ => Err(Error::UnknownOperator(op.to_string())),
        }
    }

    fn operator(term: &Term) -> Result<&str> {
        match term.symbol() {
            Symbol::Terminal(name) => Ok(&**name),
            Symbol::NonTerminal(_) => Err(Error::IncompleteTerm(term.to_string())),
        }
    }
}

/// Whether the expression `term` reproduces the output of `example`.
pub fn produces(term: &Term, example: &Example) -> Result<bool> {
    Ok(Interpreter::new(&example.input).eval_expr(term)? == example.output)
}

/// Whether the predicate `pred` holds under the input of `example`.
pub fn holds(pred: &Term, example: &Example) -> Result<bool> {
    Interpreter::new(&example.input).eval_pred(pred)
}

/// Whether `program` produces the expected output on every example.
pub fn is_valid(program: &Program, examples: &[Example]) -> Result<bool> {
    for example in examples {
        if !produces(program.root(), example)? {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Env {
        Example::new([("x", 10), ("y", 15), ("z", 20)], 0).input
    }

    fn bin(op: &str, l: &str, r: &str) -> Term {
        Term::op(op, vec![Term::atom(l), Term::atom(r)])
    }

    #[test]
    fn add_vars() {
        let env = env();
        let program = Program::new(bin("Add", "x", "y"));

        assert_eq!(Interpreter::evaluate(&program, &env).unwrap(), 25);
    }

    #[test]
    fn multiply_by_const() {
        let env = env();
        let program = Program::new(bin("Multiply", "z", "2"));

        assert_eq!(Interpreter::evaluate(&program, &env).unwrap(), 40);
    }

    #[test]
    fn ite_picks_else_branch() {
        let env = env();
        let program = Program::new(Term::op("Ite", vec![
            bin("Lt", "x", "3"),
            bin("Add", "y", "z"),
            bin("Multiply", "y", "z"),
        ]));

        assert_eq!(Interpreter::evaluate(&program, &env).unwrap(), 300);
    }

    #[test]
    fn ite_does_not_evaluate_other_branch() {
        let env = env();
        // `w` is undefined, but sits in the branch that is not taken
        let program = Program::new(Term::op("Ite", vec![
            bin("Eq", "x", "x"),
            Term::atom("1"),
            Term::atom("w"),
        ]));

        assert_eq!(Interpreter::evaluate(&program, &env).unwrap(), 1);
    }

    #[test]
    fn predicates() {
        let env = env();
        let interp = Interpreter::new(&env);
        let lt = bin("Lt", "x", "y");
        let eq = bin("Eq", "x", "y");

        assert!(interp.eval_pred(&lt).unwrap());
        assert!(!interp.eval_pred(&eq).unwrap());
        assert!(!interp.eval_pred(&Term::op("And", vec![lt.clone(), eq.clone()])).unwrap());
        assert!(interp.eval_pred(&Term::op("Or", vec![eq.clone(), lt.clone()])).unwrap());
        assert!(interp.eval_pred(&Term::op("Not", vec![eq])).unwrap());
    }

    #[test]
    fn evaluation_is_repeatable() {
        let env = env();
        let interp = Interpreter::new(&env);
        let t = Term::op("Add", vec![bin("Multiply", "x", "y"), Term::atom("3")]);

        let first = interp.eval_expr(&t).unwrap();
        assert_eq!(first, 153);
        assert_eq!(interp.eval_expr(&t).unwrap(), first);
    }

    #[test]
    fn configuration_errors() {
        let env = Example::new([("x", 1)], 0).input;
        let interp = Interpreter::new(&env);

        assert!(matches!(
            interp.eval_expr(&Term::atom("y")),
            Err(Error::UndefinedVariable(v)) if v == "y"
        ));
        assert!(matches!(
            interp.eval_expr(&Term::hole("E")),
            Err(Error::IncompleteTerm(_))
        ));
        assert!(matches!(
            interp.eval_expr(&Term::op("Add", vec![Term::atom("x")])),
            Err(Error::Arity { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            interp.eval_pred(&Term::atom("x")),
            Err(Error::UnknownOperator(_))
        ));
    }

    #[test]
    fn validity_over_examples() {
        let program = Program::new(bin("Add", "x", "y"));
        let examples = vec![
            Example::new([("x", 1), ("y", 2), ("z", 3)], 3),
            Example::new([("x", 2), ("y", 2), ("z", 2)], 4),
        ];

        assert!(is_valid(&program, &examples).unwrap());
        assert!(!is_valid(&Program::new(Term::atom("z")), &examples).unwrap());
        assert!(produces(&Term::atom("z"), &examples[0]).unwrap());
        assert!(!produces(&Term::atom("z"), &examples[1]).unwrap());
        assert!(holds(&bin("Lt", "x", "3"), &examples[1]).unwrap());
        assert!(!holds(&bin("Eq", "x", "y"), &examples[0]).unwrap());
        assert!(holds(&bin("Eq", "x", "y"), &examples[1]).unwrap());
    }
}
