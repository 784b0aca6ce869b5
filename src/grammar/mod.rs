//! Grammar definition structures: productions, EBNF elements, operators, reduce
//! handlers and the fluent [GrammarBuilder] assembling them from grammar text.

mod builder;
mod handler;
pub(crate) mod lowering;
pub(crate) mod notation;

#[cfg(test)]
mod __tests__;

use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub use builder::GrammarBuilder;
pub use handler::{AdapterOp, AdapterProgram, ReduceHandler, ReduceProgram};
pub(crate) use handler::AdapterOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Associativity of an [Operator] used to break shift/reduce ties of equal precedence.
pub enum Associativity {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry of the operator precedence table, keyed by terminal name.
pub struct Operator {
    pub name: String,
    pub assoc: Associativity,
    pub precedence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// One element of a production body before lowering.
///
/// A body containing anything but [Symbol](Element::Symbol) elements is an EBNF
/// production and is rewritten into plain productions when the grammar is built.
pub enum Element {
    Symbol(Symbol),
    /// Parenthesized alternatives `( X | Y | … )`, optionally repeated `* N`.
    Group {
        alternatives: Vec<Vec<Element>>,
        repeats: Option<usize>,
    },
    /// An optional part `[ X ]`, optionally bounded-repeated `* N`.
    Optional {
        inner: Vec<Element>,
        repeats: Option<usize>,
    },
    /// An unbounded repetition `{ X }`.
    Repeat { inner: Vec<Element> },
    /// A fixed multiplicity `X * N` applied to a single element.
    Multiple { inner: Box<Element>, count: usize },
}

impl Element {
    pub fn is_symbol(&self) -> bool {
        matches!(self, Element::Symbol(_))
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn sequence(f: &mut Formatter<'_>, elements: &[Element]) -> std::fmt::Result {
            for (index, element) in elements.iter().enumerate() {
                if index != 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", element)?;
            }
            Ok(())
        }
        match self {
            Element::Symbol(symbol) => write!(f, "{}", symbol),
            Element::Group {
                alternatives,
                repeats,
            } => {
                write!(f, "(")?;
                for (index, alternative) in alternatives.iter().enumerate() {
                    if index != 0 {
                        write!(f, " | ")?;
                    }
                    sequence(f, alternative)?;
                }
                write!(f, ")")?;
                if let Some(count) = repeats {
                    write!(f, " * {}", count)?;
                }
                Ok(())
            }
            Element::Optional { inner, repeats } => {
                write!(f, "[")?;
                sequence(f, inner)?;
                write!(f, "]")?;
                if let Some(count) = repeats {
                    write!(f, " * {}", count)?;
                }
                Ok(())
            }
            Element::Repeat { inner } => {
                write!(f, "{{")?;
                sequence(f, inner)?;
                write!(f, "}}")
            }
            Element::Multiple { inner, count } => write!(f, "{} * {}", inner, count),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Reference from a production to its reduction behaviour.
pub enum HandlerRef {
    /// No handler: the body values are folded with [ValueImpl::reduce](crate::ValueImpl::reduce).
    None,
    /// Index into the handler array collected by the builder.
    Index(usize),
    /// An argument adapter introduced by EBNF lowering.
    Modifier(Box<HandlerModifier>),
}

#[derive(Debug, Clone, PartialEq)]
/// A recipe reshaping the reduce argument vector before the user handler runs, used to
/// hide the synthesized productions introduced by EBNF lowering.
pub enum HandlerModifier {
    /// Insert a null placeholder at argument slot `at` (omitted optional part).
    Epsilon { at: usize, inner: ModifierInner },
    /// Group `count` consecutive arguments at slot `at` into one list argument.
    Merge {
        at: usize,
        count: usize,
        inner: ModifierInner,
    },
    /// Start an empty collection (the `pre -> %empty` production of a repetition).
    Collect,
    /// Extend the collection with the freshly parsed arguments (`pre -> pre X`).
    Append,
    /// Pass the finished collection at slot `at` through to the user handler.
    Apply { at: usize, inner: ModifierInner },
}

#[derive(Debug, Clone, PartialEq)]
/// What an adapter wraps: nothing, the user handler, or a further adapter.
pub enum ModifierInner {
    Identity,
    Handler(usize),
    Nested(Box<HandlerModifier>),
}

#[derive(Debug, Clone, PartialEq)]
/// A production as collected from grammar text, possibly containing EBNF elements.
pub struct ComplexProduction {
    pub head: String,
    pub body: Vec<Element>,
    pub handler: HandlerRef,
}

impl ComplexProduction {
    pub fn is_simple(&self) -> bool {
        self.body.iter().all(Element::is_symbol)
    }
}

impl Display for ComplexProduction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.head)?;
        if self.body.is_empty() {
            write!(f, " %empty")?;
        }
        for element in &self.body {
            write!(f, " {}", element)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A plain BNF production; the index in collection order is the production id.
pub struct SimpleProduction {
    pub head: String,
    pub body: Vec<Symbol>,
    pub handler: HandlerRef,
}

impl Display for SimpleProduction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.head)?;
        if self.body.is_empty() {
            write!(f, " %empty")?;
        }
        for symbol in &self.body {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// Derive a name not yet taken by appending or incrementing a `_k` suffix.
pub(crate) fn fresh_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = base.to_string();
    while taken(&candidate) {
        candidate = increment(&candidate);
    }
    candidate
}

fn increment(name: &str) -> String {
    if let Some(position) = name.rfind('_') {
        if let Ok(counter) = name[position + 1..].parse::<u64>() {
            return format!("{}_{}", &name[..position], counter + 1);
        }
    }
    format!("{}_0", name)
}
