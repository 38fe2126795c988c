use std::{collections::HashMap, fmt, sync::Arc};

use crate::error::{Error, Result};

/// A grammar vocabulary element. Names are shared, since every term node
/// carries one and the search frontier copies terms a lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(Arc<str>),
    NonTerminal(Arc<str>),
}

impl Symbol {
    pub fn terminal(name: &str) -> Self {
        Symbol::Terminal(Arc::from(name))
    }

    pub fn non_terminal(name: &str) -> Self {
        Symbol::NonTerminal(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `ret ::= operator(args...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub ret: Arc<str>,
    pub operator: Arc<str>,
    pub args: Vec<Symbol>,
}

impl Production {
    pub fn new(ret: &str, operator: &str, args: Vec<Symbol>) -> Self {
        Self {
            ret: Arc::from(ret),
            operator: Arc::from(operator),
            args,
        }
    }

    /// A production without arguments, e.g. `E ::= x`.
    pub fn leaf(ret: &str, operator: &str) -> Self {
        Self::new(ret, operator, Vec::new())
    }

    pub fn ret_symbol(&self) -> Symbol {
        Symbol::NonTerminal(self.ret.clone())
    }

    pub fn operator_symbol(&self) -> Symbol {
        Symbol::Terminal(self.operator.clone())
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::= {}", self.ret, self.operator)?;

        if !self.args.is_empty() {
            let args = self.args.iter()
                .map(|x| x.name())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "({args})")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    start: Arc<str>,
    productions: HashMap<Arc<str>, Vec<Production>>,
    // Order in which non-terminals were first seen, for printing only
    order: Vec<Arc<str>>,
}

impl Grammar {
    /// Builds a grammar. The relative order of the productions of each
    /// non-terminal is kept and becomes the enumeration order.
    pub fn new(start: &str, productions: impl IntoIterator<Item = Production>) -> Self {
        let mut res = Self {
            start: Arc::from(start),
            productions: HashMap::new(),
            order: Vec::new(),
        };

        for prod in productions {
            if !res.productions.contains_key(&prod.ret) {
                res.order.push(prod.ret.clone());
            }

            res.productions.entry(prod.ret.clone())
                .or_default()
                .push(prod);
        }

        res
    }

    /// The grammar of arithmetic/conditional programs over `x`, `y`, `z`:
    ///
    /// ```text
    /// E ::= Ite(B, E, E) | Add(E, E) | Multiply(E, E) | x | y | z | 1 | 2 | 3
    /// B ::= Lt(E, E) | Eq(E, E) | And(B, B) | Or(B, B) | Not(B)
    /// ```
    pub fn arithmetic() -> Self {
        let e = || Symbol::non_terminal("E");
        let b = || Symbol::non_terminal("B");

        Self::new("E", [
            Production::new("E", "Ite", vec![b(), e(), e()]),
            Production::new("E", "Add", vec![e(), e()]),
            Production::new("E", "Multiply", vec![e(), e()]),
            Production::leaf("E", "x"),
            Production::leaf("E", "y"),
            Production::leaf("E", "z"),
            Production::leaf("E", "1"),
            Production::leaf("E", "2"),
            Production::leaf("E", "3"),
            Production::new("B", "Lt", vec![e(), e()]),
            Production::new("B", "Eq", vec![e(), e()]),
            Production::new("B", "And", vec![b(), b()]),
            Production::new("B", "Or", vec![b(), b()]),
            Production::new("B", "Not", vec![b()]),
        ])
    }

    pub fn start_symbol(&self) -> Symbol {
        Symbol::NonTerminal(self.start.clone())
    }

    /// Productions of `non_terminal`, in declaration order.
    pub fn productions(&self, non_terminal: &str) -> Result<&[Production]> {
        self.productions.get(non_terminal)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UndefinedNonTerminal(non_terminal.to_string()))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Start symbol: {}", self.start)?;
        writeln!(f, "Productions:")?;

        for nt in &self.order {
            for prod in &self.productions[nt] {
                writeln!(f, "  {prod}")?;
            }
        }

        Ok(())
    }
}
