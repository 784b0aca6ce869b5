//! Serialized forms of compiled artifacts: plain structured data compatible with JSON.
//!
//! Tables, symbol rows and reduce programs travel verbatim; callbacks travel by
//! *registered name* only and are resolved against a [HandlerRegistry] when the
//! artifact is revived. Anonymous callbacks make an artifact unserializable.

use crate::generator::{Action, ProductionStub, SymbolEntry, TableMode};
use crate::grammar::{ReduceHandler, ReduceProgram};
use crate::lexer::{LexHandler, LexPattern, LexRule, Lexer, TokenSelector};
use crate::parsing::{ParsedGrammar, Parser};
use crate::{SerializationError, ValueImpl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The wire form of a [ParsedGrammar].
pub struct SerializedParser {
    pub mode: TableMode,
    pub action: Vec<HashMap<usize, Action>>,
    pub goto: Vec<HashMap<usize, usize>>,
    pub start_state: usize,
    pub symbols: Vec<SymbolEntry>,
    pub symbols_table: HashMap<String, usize>,
    pub productions: Vec<ProductionStub>,
    /// Per-production reduce programs, indexed by production id.
    pub actions: Vec<ReduceProgram>,
    /// Names of the pooled user handlers, indexed by handler id.
    pub handlers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One record of a [SerializedLexer].
pub struct SerializedLexRule {
    pub name: Option<String>,
    pub pattern: String,
    pub is_regexp: bool,
    pub handler: Option<String>,
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The wire form of a [Lexer].
pub struct SerializedLexer<V> {
    pub records: Vec<SerializedLexRule>,
    pub eof_name: String,
    pub eof_value: V,
}

/// Named callbacks used to revive serialized artifacts.
pub struct HandlerRegistry<V: ValueImpl, C = ()> {
    reducers: HashMap<String, ReduceHandler<V, C>>,
    lex_handlers: HashMap<String, LexHandler<V>>,
    selectors: HashMap<String, TokenSelector<V>>,
}

impl<V: ValueImpl, C> HandlerRegistry<V, C> {
    pub fn new() -> Self {
        Self {
            reducers: HashMap::new(),
            lex_handlers: HashMap::new(),
            selectors: HashMap::new(),
        }
    }

    /// Register a reduction callback under a name.
    pub fn reducer<F: Fn(Vec<V>, &mut C) -> Result<V, String> + 'static>(
        mut self,
        name: &str,
        f: F,
    ) -> Self {
        self.reducers
            .insert(name.to_string(), ReduceHandler::named(name, f));
        self
    }

    /// Register a lexeme value callback under a name.
    pub fn lex_handler<F: Fn(&str, &[Option<&str>]) -> V + 'static>(
        mut self,
        name: &str,
        f: F,
    ) -> Self {
        self.lex_handlers
            .insert(name.to_string(), LexHandler::named(name, f));
        self
    }

    /// Register a token name selector under a name.
    pub fn selector<F: Fn(&V, &str) -> Option<String> + 'static>(
        mut self,
        name: &str,
        f: F,
    ) -> Self {
        self.selectors
            .insert(name.to_string(), TokenSelector::named(name, f));
        self
    }
}

impl<V: ValueImpl, C> Default for HandlerRegistry<V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ValueImpl, C> ParsedGrammar<V, C> {
    /// Serialize the compiled tables; every pooled handler must be named.
    pub fn serialize(&self) -> Result<SerializedParser, SerializationError> {
        let mut handlers = Vec::new();
        for (index, handler) in self.handlers.iter().enumerate() {
            match handler.name() {
                Some(name) => handlers.push(name.to_string()),
                None => {
                    return Err(SerializationError::UnserializableHandler {
                        what: format!("reduce handler #{} has no registered name", index),
                    });
                }
            }
        }
        Ok(SerializedParser {
            mode: self.mode,
            action: self.action.clone(),
            goto: self.goto_table.clone(),
            start_state: self.start_state,
            symbols: self.symbols.clone(),
            symbols_table: self.symbol_ids.clone(),
            productions: self.productions.clone(),
            actions: self.programs.clone(),
            handlers,
        })
    }
}

impl SerializedParser {
    /// Revive a parser, resolving handler names against the registry.
    pub fn into_parser<V: ValueImpl, C>(
        self,
        registry: &HandlerRegistry<V, C>,
    ) -> Result<Parser<V, C>, SerializationError> {
        if self.actions.len() != self.productions.len() {
            return Err(SerializationError::Malformed {
                message: format!(
                    "{} reduce programs for {} productions",
                    self.actions.len(),
                    self.productions.len()
                ),
            });
        }
        if self.start_state >= self.action.len() || self.goto.len() != self.action.len() {
            return Err(SerializationError::Malformed {
                message: "table shapes are inconsistent".to_string(),
            });
        }
        let mut handlers = Vec::new();
        for name in &self.handlers {
            let handler = registry
                .reducers
                .get(name)
                .cloned()
                .ok_or_else(|| SerializationError::MissingHandler { id: name.clone() })?;
            handlers.push(handler);
        }
        Ok(Parser::from_grammar(ParsedGrammar {
            mode: self.mode,
            action: self.action,
            goto_table: self.goto,
            start_state: self.start_state,
            symbols: self.symbols,
            symbol_ids: self.symbols_table,
            productions: self.productions,
            programs: self.actions,
            handlers,
        }))
    }
}

impl<V: ValueImpl + Serialize> Lexer<V> {
    /// Serialize the rule list; every handler and selector must be named.
    pub fn serialize(&self) -> Result<SerializedLexer<V>, SerializationError> {
        let mut records = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let handler = match &rule.handler {
                None => None,
                Some(handler) => match handler.name() {
                    Some(name) => Some(name.to_string()),
                    None => {
                        return Err(SerializationError::UnserializableHandler {
                            what: format!("lexeme handler of rule #{} has no registered name", index),
                        });
                    }
                },
            };
            let selector = match &rule.selector {
                None => None,
                Some(selector) => match &selector.name {
                    Some(name) => Some(name.clone()),
                    None => {
                        return Err(SerializationError::UnserializableHandler {
                            what: format!("selector of rule #{} has no registered name", index),
                        });
                    }
                },
            };
            let (pattern, is_regexp) = match &rule.pattern {
                LexPattern::Literal(value) => (value.clone(), false),
                LexPattern::Pattern { source, .. } => (source.clone(), true),
            };
            records.push(SerializedLexRule {
                name: rule.name.clone(),
                pattern,
                is_regexp,
                handler,
                selector,
            });
        }
        Ok(SerializedLexer {
            records,
            eof_name: self.eof_name.clone(),
            eof_value: self.eof_value.clone(),
        })
    }
}

impl<V: ValueImpl> SerializedLexer<V> {
    /// Revive a lexer, recompiling regex patterns and resolving callback names.
    pub fn into_lexer<C>(
        self,
        registry: &HandlerRegistry<V, C>,
    ) -> Result<Lexer<V>, SerializationError> {
        let mut rules = Vec::new();
        for record in self.records {
            let pattern = if record.is_regexp {
                LexPattern::regexp(&record.pattern).map_err(|err| {
                    SerializationError::Malformed {
                        message: format!("{}", err),
                    }
                })?
            } else {
                LexPattern::Literal(record.pattern)
            };
            let handler = match record.handler {
                None => None,
                Some(name) => Some(registry.lex_handlers.get(&name).cloned().ok_or(
                    SerializationError::MissingHandler { id: name.clone() },
                )?),
            };
            let selector = match record.selector {
                None => None,
                Some(name) => Some(registry.selectors.get(&name).cloned().ok_or(
                    SerializationError::MissingHandler { id: name.clone() },
                )?),
            };
            rules.push(LexRule {
                name: record.name,
                pattern,
                handler,
                selector,
            });
        }
        Ok(Lexer::new(rules, self.eof_name, self.eof_value))
    }
}
