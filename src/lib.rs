//! Language parser tool (lang_lr) is a library to compile BNF, EBNF and ABNF grammar text
//! into bottom-up SLR, LALR(1) or canonical LR(1) parse tables, and to drive those tables
//! with a regex based tokenizer and a shift-reduce parsing loop.
//!
//! # Overview
//! Bottom-up parsers are usually produced by an external generator tool which compiles the
//! grammar into parser code for the target runtime language.
//! This library instead keeps the whole pipeline inside the host program:
//! grammar text is parsed into productions, EBNF conveniences are rewritten into plain
//! productions, the LR automaton is constructed, and the resulting ACTION/GOTO tables are
//! driven directly by the [Parser].
//! Reduction callbacks are ordinary closures receiving the semantic values of the reduced
//! production body, so the parser can build numbers, syntax trees, or any other
//! [value](ValueImpl) without an intermediate code generation step.
//!
//! # Design
//!
//! A grammar is assembled with the fluent [GrammarBuilder] from any mix of
//! [BNF](GrammarBuilder::bnf), [EBNF](GrammarBuilder::ebnf) and [ABNF](GrammarBuilder::abnf)
//! text together with an operator precedence table for shift/reduce resolution.
//! Tokens are produced by a [Lexer] built from an ordered list of literal and regular
//! expression rules assembled with the [LexerBuilder].
//! Terminal names used in the grammar text must exactly match the token names produced by
//! the lexer; quoted strings in grammar text are decoded and treated as terminal names too.
//!
//! Calling [build](GrammarBuilder::build) lowers the collected productions, constructs the
//! item set automaton, resolves conflicts through the operator table and freezes the result
//! into a [ParsedGrammar] which the [Parser] consumes.
//! Compiled artifacts can be [serialized](ParsedGrammar::serialize) into plain structured
//! data and revived later against a [HandlerRegistry] of named callbacks.
//!
//! # Example
//!
//! ```
//! use lang_lr::{Associativity, GrammarBuilder, LexHandler, LexerBuilder, ReduceHandler};
//! use serde_json::{json, Value};
//!
//! let mut lexer = LexerBuilder::new()
//!     .skip(r"\s+")
//!     .unwrap()
//!     .token_with(
//!         "num",
//!         r"[0-9]+(?:\.[0-9]+)?",
//!         LexHandler::new(|lexeme, _| json!(lexeme.parse::<f64>().unwrap())),
//!     )
//!     .unwrap()
//!     .literal("+", "+")
//!     .literal("*", "*")
//!     .literal("(", "(")
//!     .literal(")", ")")
//!     .build();
//!
//! let parser = GrammarBuilder::new()
//!     .bnf(
//!         "E ::= E '+' T | T ;
//!          T ::= T '*' F | F ;
//!          F ::= '(' E ')' | num ;",
//!         vec![
//!             ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
//!                 Ok(json!(args[0].as_f64().unwrap() + args[2].as_f64().unwrap()))
//!             }),
//!             ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
//!             ReduceHandler::new(|args: Vec<Value>, _| {
//!                 Ok(json!(args[0].as_f64().unwrap() * args[2].as_f64().unwrap()))
//!             }),
//!             ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
//!             ReduceHandler::new(|mut args, _| Ok(args.remove(1))),
//!             ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
//!         ],
//!     )
//!     .unwrap()
//!     .opr(Associativity::Left, &["+"])
//!     .opr(Associativity::Left, &["*"])
//!     .build()
//!     .unwrap();
//!
//! let value = parser.parse_text(&mut lexer, "(2 + 3) * 4").unwrap();
//! assert_eq!(value, json!(20.0));
//! ```
//!
//! # License
//! [lang_lr](crate) is provided under the MIT license.

mod error;
pub mod examples;
pub mod generator;
pub mod grammar;
mod impl_default;
pub mod lexer;
mod parsing;
mod serial;
mod symbol;
mod tree;
pub mod util;

use std::fmt::Debug;

pub use generator::{Action, ConflictPolicy, ProductionStub, SymbolEntry, TableMode};
pub use grammar::{
    AdapterOp, AdapterProgram, Associativity, Element, GrammarBuilder, HandlerModifier,
    HandlerRef, ModifierInner, Operator, ReduceHandler, ReduceProgram, SimpleProduction,
};
pub use lexer::{LexHandler, Lexer, LexerBuilder, TokenSelector};
pub use parsing::{ParsedGrammar, Parser};
pub use serial::{HandlerRegistry, SerializedLexRule, SerializedLexer, SerializedParser};
pub use symbol::Symbol;
pub use tree::SynTree;
pub use util::{Code, Log, Position};

/// Default name of the end-of-input terminal shared by [LexerBuilder] and [GrammarBuilder].
pub const EOF_TOKEN: &str = "$EOF";

/// A trait implemented by the semantic values flowing through the lexer and the parser.
///
/// Terminal values are created from the matched lexeme (either by a lexeme rule handler or
/// by [from_lexeme](ValueImpl::from_lexeme)), and every reduction folds the values of the
/// production body into a single value.
/// The aggregation methods are also used by the argument adapters which hide the
/// synthesized non-terminals introduced while rewriting EBNF constructs, so a value type
/// needs a list-like representation it can be grouped into and recovered from.
///
/// Ready-made implementations exist for [serde_json::Value] and for the plain syntax tree
/// type [SynTree].
pub trait ValueImpl: Clone + Debug {
    /// Placeholder value inserted for omitted optional parts and used as the stack seed.
    fn null() -> Self;
    /// Default terminal value for lexeme rules without a handler.
    fn from_lexeme(lexeme: &str) -> Self;
    /// Group a list of values into a single value.
    fn aggregate(values: Vec<Self>) -> Self;
    /// Recover the grouped values, or return the value unchanged when it is not a group.
    fn into_aggregate(self) -> Result<Vec<Self>, Self>;
    /// Fold a reduced production body without a user handler.
    fn reduce(head: &str, values: Vec<Self>) -> Self {
        let _ = head;
        Self::aggregate(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Element of the token stream produced by the [Lexer].
pub struct Token<V> {
    pub name: String,
    pub lexeme: String,
    pub value: V,
    pub start: usize,
    pub end: usize,
}

impl<V> Token<V> {
    pub fn new(name: String, lexeme: String, value: V, start: usize, end: usize) -> Self {
        Self {
            name,
            lexeme,
            value,
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Discriminant of a [ParseError].
pub enum ParseErrorKind {
    /// No lexeme rule matched at the current position.
    UnknownToken,
    /// A lexeme rule matched without advancing the position.
    ZeroLengthMatch,
    /// The ACTION cell for the lookahead is empty or an explicit error.
    UnexpectedToken,
    /// The input ended while the parser expected more tokens.
    UnexpectedEof,
    /// The token stream pointer was moved to a negative offset.
    InvalidPointer,
    /// A reduction callback reported a failure.
    Handler,
}

#[derive(Debug, Clone)]
/// An error returned when the lexer or the parser failed to consume the input.
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub pointer: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The variety of a table construction [Conflict].
pub enum ConflictKind {
    ShiftShift,
    ReduceReduce,
    ShiftReduce,
}

#[derive(Debug, Clone)]
/// An unresolved collision of two actions on the same `(state, terminal)` table cell.
pub struct Conflict {
    pub kind: ConflictKind,
    pub mode: TableMode,
    pub state: usize,
    pub terminal: String,
    /// The two dotted items in dispute.
    pub items: [String; 2],
}

#[derive(Debug)]
/// An error returned while collecting grammar text or while building the parse tables.
pub enum GrammarError {
    /// Malformed grammar text; carries the byte offset into the offending source.
    Syntax { pointer: usize, message: String },
    /// A table cell received two irreconcilable actions.
    Conflict(Conflict),
    /// Auto mode diagnostics: the first conflict of every attempted table mode.
    Conflicts(Vec<Conflict>),
    /// Internal invariant violation while merging LALR(1) states.
    InvalidProductionIndex { index: usize, message: String },
    /// Invalid builder usage or an unsupported grammar construct.
    Definition { what: String, message: String },
}

#[derive(Debug)]
/// An error returned while serializing a compiled artifact or reviving one.
pub enum SerializationError {
    /// A handler name was not found in the [HandlerRegistry].
    MissingHandler { id: String },
    /// The artifact holds an anonymous callback which cannot cross the wire.
    UnserializableHandler { what: String },
    /// The serialized data is structurally inconsistent.
    Malformed { message: String },
}
