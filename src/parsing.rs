use crate::generator::{Action, ProductionStub, SymbolEntry, TableMode, Tables, EOF};
use crate::grammar::{AdapterOutcome, ReduceHandler, ReduceProgram};
use crate::lexer::Lexer;
use crate::util::Log;
use crate::{ParseError, ParseErrorKind, Token, ValueImpl};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// The frozen result of building a grammar: ACTION/GOTO tables, the interned symbol
/// rows, per-production reduce programs and the user handler pool.
///
/// Everything mutable lives inside one [parse](Parser::parse) call, so a compiled
/// grammar can back any number of consecutive parses.
pub struct ParsedGrammar<V: ValueImpl, C = ()> {
    pub(crate) mode: TableMode,
    pub(crate) action: Vec<HashMap<usize, Action>>,
    pub(crate) goto_table: Vec<HashMap<usize, usize>>,
    pub(crate) start_state: usize,
    pub(crate) symbols: Vec<SymbolEntry>,
    pub(crate) symbol_ids: HashMap<String, usize>,
    pub(crate) productions: Vec<ProductionStub>,
    pub(crate) programs: Vec<ReduceProgram>,
    pub(crate) handlers: Vec<ReduceHandler<V, C>>,
}

impl<V: ValueImpl, C> fmt::Debug for ParsedGrammar<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedGrammar")
            .field("mode", &self.mode)
            .field("action", &self.action)
            .field("goto_table", &self.goto_table)
            .field("start_state", &self.start_state)
            .field("symbols", &self.symbols)
            .field("symbol_ids", &self.symbol_ids)
            .field("productions", &self.productions)
            .field("programs", &self.programs)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl<V: ValueImpl, C> ParsedGrammar<V, C> {
    pub(crate) fn assemble(
        tables: Tables,
        programs: Vec<ReduceProgram>,
        handlers: Vec<ReduceHandler<V, C>>,
    ) -> Self {
        Self {
            mode: tables.mode,
            action: tables.action,
            goto_table: tables.goto_table,
            start_state: tables.start_state,
            symbols: tables.symbols,
            symbol_ids: tables.symbol_ids,
            productions: tables.stubs,
            programs,
            handlers,
        }
    }

    /// The table mode the generator settled on.
    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn state_count(&self) -> usize {
        self.action.len()
    }

    pub fn symbols(&self) -> &[SymbolEntry] {
        &self.symbols
    }

    /// Render the compiled productions as grammar text.
    pub fn grammar(&self) -> String {
        let mut rendered = String::new();
        for stub in &self.productions {
            rendered.push_str(&stub.text);
            rendered.push('\n');
        }
        rendered
    }
}

/// The shift-reduce driver over a [ParsedGrammar].
///
/// One [parse](Parser::parse) call owns its whole runtime state (the frame stack and
/// the lookahead), reads tokens from the supplied [Lexer], invokes the reduction
/// callbacks bottom-up, and returns the semantic value of the start symbol.
pub struct Parser<V: ValueImpl, C = ()> {
    grammar: Rc<ParsedGrammar<V, C>>,
    log: OnceCell<Log<&'static str>>,
}

impl<V: ValueImpl, C> fmt::Debug for Parser<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("log", &self.log)
            .finish()
    }
}

impl<V: ValueImpl, C> Parser<V, C> {
    pub(crate) fn from_grammar(grammar: ParsedGrammar<V, C>) -> Self {
        Self {
            grammar: Rc::new(grammar),
            log: OnceCell::new(),
        }
    }

    pub fn grammar(&self) -> &ParsedGrammar<V, C> {
        &self.grammar
    }

    pub fn mode(&self) -> TableMode {
        self.grammar.mode
    }

    /// Set a log label to trace the shift/reduce loop.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Parse the lexer's current input with a default context.
    pub fn parse(&self, lexer: &mut Lexer<V>) -> Result<V, ParseError>
    where
        C: Default,
    {
        let mut context = C::default();
        self.parse_with(lexer, &mut context)
    }

    /// Reset the lexer onto `source` and parse it with a default context.
    pub fn parse_text(&self, lexer: &mut Lexer<V>, source: &str) -> Result<V, ParseError>
    where
        C: Default,
    {
        lexer.reset(source);
        self.parse(lexer)
    }

    /// Parse the lexer's current input; the context is handed to every reduction
    /// callback.
    pub fn parse_with(&self, lexer: &mut Lexer<V>, context: &mut C) -> Result<V, ParseError> {
        let grammar = &*self.grammar;
        let mut stack: Vec<(usize, V)> = vec![(grammar.start_state, V::null())];
        let mut token = lexer.next_token()?;
        loop {
            let state = match stack.last() {
                Some(&(state, _)) => state,
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.start,
                        "Parse stack underflow.".to_string(),
                    ));
                }
            };
            let terminal = self.lookahead_index(lexer, &token)?;
            match grammar.action[state].get(&terminal) {
                Some(Action::Shift(target)) => {
                    self.log_shift(lexer, &token, *target);
                    let value = std::mem::replace(&mut token, lexer.next_token()?);
                    stack.push((*target, value.value));
                }
                Some(Action::Reduce {
                    head,
                    count,
                    production,
                }) => {
                    if stack.len() <= *count {
                        return Err(ParseError::new(
                            ParseErrorKind::UnexpectedToken,
                            token.start,
                            format!(
                                "Reduction of '{}' popped past the stack bottom.",
                                grammar.productions[*production].text
                            ),
                        ));
                    }
                    let at = stack.len() - count;
                    let args: Vec<V> = stack.drain(at..).map(|(_, value)| value).collect();
                    let value = self.run_reduce(*production, args, context, token.start)?;
                    let origin = match stack.last() {
                        Some(&(state, _)) => state,
                        None => grammar.start_state,
                    };
                    let target = match grammar.goto_table[origin].get(head) {
                        Some(&target) => target,
                        None => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnexpectedToken,
                                token.start,
                                format!(
                                    "Missing goto for '{}' at state {}.",
                                    grammar.symbols[*head].name, origin
                                ),
                            ));
                        }
                    };
                    self.log_reduce(*production, target);
                    stack.push((target, value));
                }
                Some(Action::Accept) => {
                    return match stack.pop() {
                        Some((_, value)) => Ok(value),
                        None => Err(ParseError::new(
                            ParseErrorKind::UnexpectedToken,
                            token.start,
                            "Parse stack underflow on accept.".to_string(),
                        )),
                    };
                }
                Some(Action::Error(message)) => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.start,
                        format!(
                            "Unexpected token '{}' at {}: {}.",
                            token.name,
                            lexer.location(token.start),
                            message
                        ),
                    ));
                }
                None => {
                    return Err(if terminal == EOF {
                        ParseError::new(
                            ParseErrorKind::UnexpectedEof,
                            token.start,
                            format!(
                                "Unexpected end of input at {} (state {}).",
                                lexer.location(token.start),
                                state
                            ),
                        )
                    } else {
                        ParseError::new(
                            ParseErrorKind::UnexpectedToken,
                            token.start,
                            format!(
                                "Unexpected token '{}' ({:?}) at {} (state {}).",
                                token.name,
                                token.lexeme,
                                lexer.location(token.start),
                                state
                            ),
                        )
                    });
                }
            }
        }
    }

    /// The interned index of the lookahead; the end-of-input terminal is index 0.
    fn lookahead_index(&self, lexer: &Lexer<V>, token: &Token<V>) -> Result<usize, ParseError> {
        match self.grammar.symbol_ids.get(&token.name) {
            Some(&id) => Ok(id),
            None if token.name == lexer.eof_name() => Ok(EOF),
            None => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.start,
                format!(
                    "Unknown token name '{}' at {}.",
                    token.name,
                    lexer.location(token.start)
                ),
            )),
        }
    }

    fn run_reduce(
        &self,
        production: usize,
        args: Vec<V>,
        context: &mut C,
        pointer: usize,
    ) -> Result<V, ParseError> {
        let grammar = &*self.grammar;
        let head = &grammar.symbols[grammar.productions[production].head].name;
        let handler_error =
            |message: String| ParseError::new(ParseErrorKind::Handler, pointer, message);
        let call = |index: usize, args: Vec<V>, context: &mut C| -> Result<V, ParseError> {
            let handler = grammar
                .handlers
                .get(index)
                .ok_or_else(|| handler_error(format!("Missing reduce handler #{}.", index)))?;
            (handler.run)(args, context).map_err(&handler_error)
        };
        match &grammar.programs[production] {
            ReduceProgram::Identity => Ok(V::reduce(head, args)),
            ReduceProgram::Handler(index) => call(*index, args, context),
            ReduceProgram::Adapter(program) => {
                match program.apply_ops(args).map_err(&handler_error)? {
                    AdapterOutcome::Done(value) => Ok(value),
                    AdapterOutcome::Args(args) => match program.handler {
                        Some(index) => call(index, args, context),
                        None => Ok(V::reduce(head, args)),
                    },
                }
            }
        }
    }

    fn log_shift(&self, _lexer: &Lexer<V>, _token: &Token<V>, _target: usize) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log.get() {
            if label.order() >= Log::Verbose(()).order() {
                println!(
                    "[{}; Shift]: '{}' at {} -> state {}",
                    label,
                    _token.name,
                    _lexer.location(_token.start),
                    _target
                );
            }
        }
    }

    fn log_reduce(&self, _production: usize, _target: usize) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log.get() {
            if label.order() >= Log::Verbose(()).order() {
                println!(
                    "[{}; Reduce]: {} -> state {}",
                    label, self.grammar.productions[_production].text, _target
                );
            }
        }
    }
}
