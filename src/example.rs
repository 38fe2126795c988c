use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{error::{Error, Result}, interp::ExprVal};

pub type Env = BTreeMap<String, ExprVal>;

/// One input/output data point the synthesized program has to agree with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Example {
    pub input: Env,
    pub output: ExprVal,
}

impl Example {
    pub fn new<'a>(input: impl IntoIterator<Item = (&'a str, ExprVal)>, output: ExprVal) -> Self {
        Self {
            input: input.into_iter()
                .map(|(name, val)| (name.to_string(), val))
                .collect(),
            output,
        }
    }
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, val)) in self.input.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={val}")?;
        }

        write!(f, " -> {}", self.output)
    }
}

impl FromStr for Example {
    type Err = Error;

    /// Parses `x=1, y=2, z=3 -> 5`.
    fn from_str(line: &str) -> Result<Self> {
        let err = |reason: &str| Error::Parse {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (lhs, rhs) = line.split_once("->")
            .ok_or_else(|| err("missing `->`"))?;
        let output = rhs.trim()
            .parse::<ExprVal>()
            .map_err(|e| err(&format!("bad output: {e}")))?;

        let mut input = Env::new();
        for pair in lhs.split(',').map(str::trim).filter(|x| !x.is_empty()) {
            let (name, val) = pair.split_once('=')
                .ok_or_else(|| err(&format!("expected `var=value`, got `{pair}`")))?;
            let val = val.trim()
                .parse::<ExprVal>()
                .map_err(|e| err(&format!("bad value for `{}`: {e}", name.trim())))?;

            input.insert(name.trim().to_string(), val);
        }

        Ok(Self { input, output })
    }
}

/// Parses one example per non-empty line.
pub fn parse_examples(text: &str) -> Result<Vec<Example>> {
    text.lines()
        .filter(|x| !x.trim().is_empty())
        .map(|x| x.parse::<Example>())
        .collect()
}
