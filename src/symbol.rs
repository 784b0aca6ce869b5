use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// A grammar symbol: a named terminal, a named non-terminal, or the empty string.
///
/// Two symbols compare equal iff their variant and name match.
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
    Epsilon,
}

impl Symbol {
    pub fn terminal(name: &str) -> Self {
        Symbol::Terminal(name.to_string())
    }

    pub fn non_terminal(name: &str) -> Self {
        Symbol::NonTerminal(name.to_string())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => Some(name),
            Symbol::Epsilon => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "'{}'", name),
            Symbol::NonTerminal(name) => write!(f, "{}", name),
            Symbol::Epsilon => write!(f, "%empty"),
        }
    }
}
