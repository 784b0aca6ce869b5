use super::notation::{self, NotationProduction};
use super::{
    lowering, ComplexProduction, Element, HandlerRef, Operator, ReduceHandler, ReduceProgram,
    SimpleProduction,
};
use crate::generator::{self, ConflictPolicy, GeneratorOptions, TableMode};
use crate::parsing::{ParsedGrammar, Parser};
use crate::symbol::Symbol;
use crate::util::Log;
use crate::{Associativity, GrammarError, ValueImpl, EOF_TOKEN};
use once_cell::unsync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Bnf,
    Ebnf,
    Abnf,
}

/// A fluent builder collecting productions, operators and reduction handlers, and
/// compiling them into a [Parser].
///
/// Productions accumulate from any mix of grammar text dialects and programmatic
/// [production](GrammarBuilder::production) calls; handler lists attach to the parsed
/// alternatives in source order.
/// Identifier symbols are provisionally non-terminals; after all text is collected,
/// names that never appear as a production head are reclassified as terminals and must
/// match the token names produced by the lexer at parse time.
///
/// # Example
/// ```
/// use lang_lr::{GrammarBuilder, LexerBuilder, SynTree};
///
/// let mut lexer = LexerBuilder::<SynTree>::new()
///     .skip(r"\s+")
///     .unwrap()
///     .token("a", r"a")
///     .unwrap()
///     .token("b", r"b")
///     .unwrap()
///     .build();
///
/// let parser = GrammarBuilder::<SynTree>::new()
///     .ebnf("S = a { b } ;", vec![])
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let tree = parser.parse_text(&mut lexer, "a b b").unwrap();
/// assert_eq!(tree.name, "S");
/// ```
pub struct GrammarBuilder<V: ValueImpl, C = ()> {
    productions: Vec<ComplexProduction>,
    handlers: Vec<ReduceHandler<V, C>>,
    operators: Vec<Operator>,
    tier: u32,
    start: Option<String>,
    eof_name: String,
    mode: Option<TableMode>,
    policy: ConflictPolicy,
    operator_filter: Option<Rc<dyn Fn(&SimpleProduction) -> Option<String>>>,
    abnf_heads: HashSet<String>,
    log: OnceCell<Log<&'static str>>,
}

impl<V: ValueImpl, C> fmt::Debug for GrammarBuilder<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarBuilder")
            .field("productions", &self.productions)
            .field("handlers", &self.handlers)
            .field("operators", &self.operators)
            .field("tier", &self.tier)
            .field("start", &self.start)
            .field("eof_name", &self.eof_name)
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("abnf_heads", &self.abnf_heads)
            .field("log", &self.log)
            .finish()
    }
}

impl<V: ValueImpl, C> GrammarBuilder<V, C> {
    pub fn new() -> Self {
        Self {
            productions: Vec::new(),
            handlers: Vec::new(),
            operators: Vec::new(),
            tier: 1,
            start: None,
            eof_name: EOF_TOKEN.to_string(),
            mode: None,
            policy: ConflictPolicy::Error,
            operator_filter: None,
            abnf_heads: HashSet::new(),
            log: OnceCell::new(),
        }
    }

    /// Collect productions from BNF grammar text; handlers attach to the alternatives in
    /// source order.
    pub fn bnf(
        mut self,
        source: &str,
        handlers: Vec<ReduceHandler<V, C>>,
    ) -> Result<Self, GrammarError> {
        let parsed = notation::bnf::parse(source)?;
        self.attach(parsed, handlers, Dialect::Bnf)?;
        Ok(self)
    }

    /// Collect productions from EBNF grammar text.
    ///
    /// Grouping, optional parts, repetitions and multiplicities are rewritten into plain
    /// productions when the grammar is built; the attached handlers keep seeing the
    /// argument shape of the written production.
    pub fn ebnf(
        mut self,
        source: &str,
        handlers: Vec<ReduceHandler<V, C>>,
    ) -> Result<Self, GrammarError> {
        let parsed = notation::ebnf::parse(source)?;
        self.attach(parsed, handlers, Dialect::Ebnf)?;
        Ok(self)
    }

    /// Collect productions from ABNF grammar text.
    ///
    /// A rule head may be defined once with `=`; further alternatives merge into the same
    /// head with `=/`.
    pub fn abnf(
        mut self,
        source: &str,
        handlers: Vec<ReduceHandler<V, C>>,
    ) -> Result<Self, GrammarError> {
        let parsed = notation::abnf::parse(source)?;
        self.attach(parsed, handlers, Dialect::Abnf)?;
        Ok(self)
    }

    /// Add one production programmatically.
    pub fn production(
        mut self,
        head: &str,
        body: Vec<Symbol>,
        handler: Option<ReduceHandler<V, C>>,
    ) -> Self {
        let handler = match handler {
            Some(handler) => {
                self.handlers.push(handler);
                HandlerRef::Index(self.handlers.len() - 1)
            }
            None => HandlerRef::None,
        };
        self.productions.push(ComplexProduction {
            head: head.to_string(),
            body: body
                .into_iter()
                .filter(|symbol| !symbol.is_epsilon())
                .map(Element::Symbol)
                .collect(),
            handler,
        });
        self
    }

    /// Declare one precedence tier of operators; later calls bind tighter.
    pub fn opr(mut self, assoc: Associativity, names: &[&str]) -> Self {
        for name in names {
            self.operators.push(Operator {
                name: (*name).to_string(),
                assoc,
                precedence: self.tier,
            });
        }
        self.tier += 1;
        self
    }

    /// Declare one operator with an explicit precedence.
    pub fn operator(mut self, name: &str, assoc: Associativity, precedence: u32) -> Self {
        self.operators.push(Operator {
            name: name.to_string(),
            assoc,
            precedence,
        });
        self.tier = self.tier.max(precedence + 1);
        self
    }

    /// Set the start symbol; defaults to the head of the first production.
    pub fn start(mut self, name: &str) -> Self {
        self.start = Some(name.to_string());
        self
    }

    /// Set the name of the end-of-input terminal; must match the lexer configuration.
    pub fn eof(mut self, name: &str) -> Self {
        self.eof_name = name.to_string();
        self
    }

    /// Request one table mode; without it SLR, LALR(1) and canonical LR(1) are tried in
    /// that order and the first conflict-free mode wins.
    pub fn mode(mut self, mode: TableMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Fallback policy for shift/reduce conflicts no operator pair can resolve.
    pub fn resolve_shift_reduce(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the default choice of a production's operator (the last body terminal
    /// present in the operator table).
    pub fn operator_filter<F: Fn(&SimpleProduction) -> Option<String> + 'static>(
        mut self,
        filter: F,
    ) -> Self {
        self.operator_filter = Some(Rc::new(filter));
        self
    }

    /// Append the productions, handlers and operators of another builder.
    pub fn merge(mut self, other: Self) -> Result<Self, GrammarError> {
        let offset = self.handlers.len();
        self.handlers.extend(other.handlers);
        for mut production in other.productions {
            if let HandlerRef::Index(index) = production.handler {
                production.handler = HandlerRef::Index(index + offset);
            }
            self.productions.push(production);
        }
        for operator in other.operators {
            self.operators.push(Operator {
                precedence: operator.precedence + self.tier - 1,
                ..operator
            });
        }
        self.tier += other.tier - 1;
        self.start = self.start.take().or(other.start);
        self.abnf_heads.extend(other.abnf_heads);
        Ok(self)
    }

    /// Set a log label to debug the table construction.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Render the collected productions as grammar text.
    pub fn grammar(&self) -> String {
        let mut rendered = String::new();
        for production in &self.productions {
            rendered.push_str(&format!("{}\n", production));
        }
        rendered
    }

    fn attach(
        &mut self,
        parsed: Vec<NotationProduction>,
        handlers: Vec<ReduceHandler<V, C>>,
        dialect: Dialect,
    ) -> Result<(), GrammarError> {
        let base = self.handlers.len();
        let provided = handlers.len();
        if provided > parsed.len() {
            return Err(GrammarError::definition(
                "GrammarBuilder",
                format!(
                    "{} handlers were provided for {} productions.",
                    provided,
                    parsed.len()
                ),
            ));
        }
        self.handlers.extend(handlers);
        for (index, production) in parsed.into_iter().enumerate() {
            if dialect == Dialect::Abnf {
                if production.incremental {
                    let defined = self
                        .productions
                        .iter()
                        .any(|existing| existing.head == production.head);
                    if !defined {
                        return Err(GrammarError::definition(
                            "GrammarBuilder",
                            format!(
                                "Incremental alternative '=/' for the undefined rule '{}'.",
                                production.head
                            ),
                        ));
                    }
                } else if !self.abnf_heads.insert(production.head.clone()) {
                    return Err(GrammarError::definition(
                        "GrammarBuilder",
                        format!(
                            "Rule '{}' is already defined; use '=/' to add alternatives.",
                            production.head
                        ),
                    ));
                }
            }
            let handler = if index < provided {
                HandlerRef::Index(base + index)
            } else {
                HandlerRef::None
            };
            self.productions.push(ComplexProduction {
                head: production.head,
                body: production.body,
                handler,
            });
        }
        Ok(())
    }

    /// Lower the collected productions, construct the LR automaton and freeze the
    /// ACTION/GOTO tables into a [Parser].
    pub fn build(self) -> Result<Parser<V, C>, GrammarError> {
        let GrammarBuilder {
            mut productions,
            handlers,
            operators,
            start,
            eof_name,
            mode,
            policy,
            operator_filter,
            log,
            ..
        } = self;
        if productions.is_empty() {
            return Err(GrammarError::definition(
                "GrammarBuilder",
                "At least one production is required.".to_string(),
            ));
        }

        // Identifiers that never appear as a head are terminals.
        let heads: HashSet<String> = productions
            .iter()
            .map(|production| production.head.clone())
            .collect();
        for production in &mut productions {
            for element in &mut production.body {
                reclassify(element, &heads);
            }
        }

        let mut reserved: HashSet<String> = heads;
        for production in &productions {
            for element in &production.body {
                collect_names(element, &mut reserved);
            }
        }
        reserved.insert(eof_name.clone());

        let simple = lowering::lower(productions, &mut reserved);

        let mut operator_table: HashMap<String, Operator> = HashMap::new();
        for operator in operators {
            let name = operator.name.clone();
            if operator_table.insert(name.clone(), operator).is_some() {
                return Err(GrammarError::definition(
                    "GrammarBuilder",
                    format!("Operator '{}' is declared twice.", name),
                ));
            }
        }

        let options = GeneratorOptions {
            start,
            eof_name,
            operators: operator_table,
            policy,
            mode,
            operator_filter,
            log: log.get().copied().unwrap_or(Log::None),
        };
        let tables = generator::compile(&simple, &options)?;

        let mut programs: Vec<ReduceProgram> = simple
            .iter()
            .map(|production| ReduceProgram::compile(&production.handler))
            .collect();
        while programs.len() < tables.stubs.len() {
            programs.push(ReduceProgram::Identity);
        }

        Ok(Parser::from_grammar(ParsedGrammar::assemble(
            tables, programs, handlers,
        )))
    }
}

impl<V: ValueImpl, C> Default for GrammarBuilder<V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ValueImpl, C> Clone for GrammarBuilder<V, C> {
    fn clone(&self) -> Self {
        Self {
            productions: self.productions.clone(),
            handlers: self.handlers.clone(),
            operators: self.operators.clone(),
            tier: self.tier,
            start: self.start.clone(),
            eof_name: self.eof_name.clone(),
            mode: self.mode,
            policy: self.policy,
            operator_filter: self.operator_filter.clone(),
            abnf_heads: self.abnf_heads.clone(),
            log: self.log.clone(),
        }
    }
}

fn reclassify(element: &mut Element, heads: &HashSet<String>) {
    match element {
        Element::Symbol(symbol) => {
            if let Symbol::NonTerminal(name) = symbol {
                if !heads.contains(name.as_str()) {
                    *symbol = Symbol::Terminal(std::mem::take(name));
                }
            }
        }
        Element::Group { alternatives, .. } => {
            for alternative in alternatives {
                for inner in alternative {
                    reclassify(inner, heads);
                }
            }
        }
        Element::Optional { inner, .. } | Element::Repeat { inner } => {
            for element in inner {
                reclassify(element, heads);
            }
        }
        Element::Multiple { inner, .. } => reclassify(inner, heads),
    }
}

fn collect_names(element: &Element, reserved: &mut HashSet<String>) {
    match element {
        Element::Symbol(symbol) => {
            if let Some(name) = symbol.name() {
                reserved.insert(name.to_string());
            }
        }
        Element::Group { alternatives, .. } => {
            for alternative in alternatives {
                for inner in alternative {
                    collect_names(inner, reserved);
                }
            }
        }
        Element::Optional { inner, .. } | Element::Repeat { inner } => {
            for element in inner {
                collect_names(element, reserved);
            }
        }
        Element::Multiple { inner, .. } => collect_names(inner, reserved),
    }
}
