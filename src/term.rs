use std::{fmt, sync::Arc};

use crate::{cfg::{Grammar, Symbol}, error::{Error, Result}};

/// A (possibly partial) program tree. A node whose symbol is a non-terminal
/// is a hole that still has to be filled by expansion.
///
/// Terms are immutable. Children are shared, so replacing one subtree
/// copies only the path down to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    symbol: Symbol,
    children: Vec<Arc<Term>>,
    complete: bool,
}

impl Term {
    pub fn new(symbol: Symbol, children: Vec<Term>) -> Self {
        Self::from_shared(symbol, children.into_iter().map(Arc::new).collect())
    }

    fn from_shared(symbol: Symbol, children: Vec<Arc<Term>>) -> Self {
        let complete = symbol.is_terminal()
            && children.iter().all(|x| x.complete);

        Self {
            symbol,
            children,
            complete,
        }
    }

    pub fn leaf(symbol: Symbol) -> Self {
        Self::from_shared(symbol, Vec::new())
    }

    /// Shorthand for a node labelled with a terminal, e.g. `Term::op("Add", ...)`.
    pub fn op(name: &str, children: Vec<Term>) -> Self {
        Self::new(Symbol::terminal(name), children)
    }

    /// Shorthand for a terminal leaf like `x` or `3`.
    pub fn atom(name: &str) -> Self {
        Self::leaf(Symbol::terminal(name))
    }

    /// Shorthand for an unexpanded hole.
    pub fn hole(name: &str) -> Self {
        Self::leaf(Symbol::non_terminal(name))
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = &Term> {
        self.children.iter().map(|x| x.as_ref())
    }

    pub fn child(&self, idx: usize) -> Option<&Term> {
        self.children.get(idx).map(|x| x.as_ref())
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    /// The children as a fixed-size array, checking the operator's arity.
    pub fn args<const N: usize>(&self) -> Result<[&Term; N]> {
        let found = self.arity();

        self.children()
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| Error::Arity {
                op: self.symbol.to_string(),
                expected: N,
                found,
            })
    }

    /// A term is complete when no non-terminal occurs anywhere in it.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        1 + self.children.iter()
            .map(|x| x.depth())
            .max()
            .unwrap_or(0)
    }

    pub fn size(&self) -> usize {
        1 + self.children.iter()
            .map(|x| x.size())
            .sum::<usize>()
    }

    /// Every symbol occurring in the term, in pre-order.
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut res = Vec::new();
        self.collect_symbols(&mut res);
        res
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a Symbol>) {
        out.push(&self.symbol);
        for child in &self.children {
            child.collect_symbols(out);
        }
    }

    /// Performs one leftmost expansion step.
    ///
    /// Only the first incomplete child is expanded. When all children are
    /// complete and the node itself is a hole, it is replaced by every
    /// production of its non-terminal, in grammar order. Complete terms
    /// yield nothing.
    pub fn expand(&self, grammar: &Grammar) -> Result<Vec<Term>> {
        let incomplete = self.children.iter()
            .position(|x| !x.complete);

        if let Some(idx) = incomplete {
            let res = self.children[idx]
                .expand(grammar)?
                .into_iter()
                .map(|expanded| self.with_child(idx, expanded))
                .collect();

            return Ok(res);
        }

        match &self.symbol {
            Symbol::Terminal(_) => Ok(Vec::new()),
            Symbol::NonTerminal(nt) => {
                let res = grammar.productions(nt)?
                    .iter()
                    .map(|prod| Term::new(
                        prod.operator_symbol(),
                        prod.args.iter().cloned().map(Term::leaf).collect(),
                    ))
                    .collect();

                Ok(res)
            },
        }
    }

    fn with_child(&self, idx: usize, child: Term) -> Term {
        let mut children = self.children.clone();
        children[idx] = Arc::new(child);

        Term::from_shared(self.symbol.clone(), children)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;

        if self.children.is_empty() {
            return Ok(());
        }

        write!(f, "(")?;
        for (idx, child) in self.children.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")
    }
}

/// The result of a successful synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Program {
    root: Term,
}

impl Program {
    pub fn new(root: Term) -> Self {
        debug_assert!(root.is_complete(), "programs are built from complete terms");

        Self { root }
    }

    pub fn root(&self) -> &Term {
        &self.root
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::Production;

    fn add_x_hole() -> Term {
        Term::op("Add", vec![Term::atom("x"), Term::hole("E")])
    }

    #[test]
    fn completeness() {
        assert!(Term::atom("x").is_complete());
        assert!(!Term::hole("E").is_complete());
        assert!(!add_x_hole().is_complete());
        assert!(Term::op("Add", vec![Term::atom("x"), Term::atom("1")]).is_complete());

        // Deeply nested hole
        let t = Term::op("Not", vec![
            Term::op("Lt", vec![Term::atom("x"), Term::op("Add", vec![Term::atom("y"), Term::hole("E")])]),
        ]);
        assert!(!t.is_complete());
        assert!(t.symbols().iter().any(|s| s.is_non_terminal()));
    }

    #[test]
    fn expanding_bare_start_symbol_follows_production_order() {
        let grammar = Grammar::arithmetic();
        let res = Term::hole("E").expand(&grammar).unwrap();
        let printed = res.iter().map(|x| x.to_string()).collect::<Vec<_>>();

        assert_eq!(printed, [
            "Ite(B, E, E)", "Add(E, E)", "Multiply(E, E)",
            "x", "y", "z", "1", "2", "3",
        ]);
    }

    #[test]
    fn expansion_touches_only_first_incomplete_child() {
        let grammar = Grammar::arithmetic();
        let t = Term::op("Add", vec![Term::hole("E"), Term::hole("E")]);
        let res = t.expand(&grammar).unwrap();

        assert_eq!(res.len(), 9);
        for expanded in &res {
            assert_eq!(expanded.symbol(), t.symbol());
            assert_eq!(expanded.child(1), Some(&Term::hole("E")));
            assert_ne!(expanded.child(0), Some(&Term::hole("E")));
            assert_eq!(expanded.size(), t.size() + expanded.child(0).unwrap().size() - 1);
        }
        assert_eq!(res[3].to_string(), "Add(x, E)");
    }

    #[test]
    fn expansion_skips_complete_prefix() {
        let grammar = Grammar::arithmetic();
        let res = add_x_hole().expand(&grammar).unwrap();

        assert_eq!(res.len(), 9);
        assert!(res.iter().all(|x| x.child(0) == Some(&Term::atom("x"))));
        assert_eq!(res[8].to_string(), "Add(x, 3)");
    }

    #[test]
    fn complete_terms_do_not_expand() {
        let grammar = Grammar::arithmetic();
        let t = Term::op("Add", vec![Term::atom("x"), Term::atom("y")]);

        assert!(t.expand(&grammar).unwrap().is_empty());
    }

    #[test]
    fn undefined_non_terminal_is_an_error() {
        let grammar = Grammar::new("S", [
            Production::new("S", "f", vec![Symbol::non_terminal("T")]),
        ]);
        let first = Term::hole("S").expand(&grammar).unwrap();

        assert_eq!(first[0].to_string(), "f(T)");
        assert!(first[0].expand(&grammar).is_err());
    }

    #[test]
    fn structural_equality_and_depth() {
        let a = Term::op("Ite", vec![
            Term::op("Lt", vec![Term::atom("x"), Term::atom("3")]),
            Term::atom("y"),
            Term::atom("z"),
        ]);
        let b = a.clone();

        assert_eq!(a, b);
        assert_eq!(a.depth(), 3);
        assert_eq!(a.size(), 6);
        assert_eq!(a.to_string(), "Ite(Lt(x, 3), y, z)");
        assert_eq!(Program::new(a).to_string(), "Ite(Lt(x, 3), y, z)");
    }
}
