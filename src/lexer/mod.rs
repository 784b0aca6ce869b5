//! The tokenization engine: an ordered list of literal and regular expression lexeme
//! rules dispatched at incremental positions of the input.
//!
//! Rules are tried in order and the first match wins; longest-match behaviour is obtained
//! by rule ordering rather than backtracking.
//! Regular expression patterns are start-anchored and matched against the remaining input
//! slice, so a successful match always begins exactly at the current position.
//!
//! # Example
//!
//! ```
//! use lang_lr::{LexerBuilder, SynTree};
//!
//! let mut lexer = LexerBuilder::<SynTree>::new()
//!     .skip(r"\s+")
//!     .unwrap()
//!     .token("id", r"[_a-zA-Z][_a-zA-Z0-9]*")
//!     .unwrap()
//!     .literal("=", "=")
//!     .build();
//!
//! lexer.reset("ab = cd");
//! let names: Vec<String> = std::iter::from_fn(|| {
//!     let token = lexer.next_token().unwrap();
//!     (token.name != lexer.eof_name()).then(|| token.name)
//! })
//! .collect();
//! assert_eq!(names, ["id", "=", "id"]);
//! ```

mod builder;

#[cfg(test)]
mod __tests__;

use crate::util::{Code, Log, Position};
use crate::{ParseError, ParseErrorKind, Token, ValueImpl};
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::io::SeekFrom;
use std::rc::Rc;

pub use builder::LexerBuilder;

pub(crate) type LexCallback<V> = Rc<dyn Fn(&str, &[Option<&str>]) -> V>;
pub(crate) type SelectCallback<V> = Rc<dyn Fn(&V, &str) -> Option<String>>;

/// A callback turning a matched lexeme (and its regex capture groups) into a token value.
///
/// Handlers created with [named](LexHandler::named) can cross a serialization boundary;
/// anonymous handlers cannot.
pub struct LexHandler<V> {
    pub(crate) name: Option<String>,
    pub(crate) run: LexCallback<V>,
}

impl<V> LexHandler<V> {
    pub fn new<F: Fn(&str, &[Option<&str>]) -> V + 'static>(f: F) -> Self {
        Self {
            name: None,
            run: Rc::new(f),
        }
    }

    pub fn named<F: Fn(&str, &[Option<&str>]) -> V + 'static>(name: &str, f: F) -> Self {
        Self {
            name: Some(name.to_string()),
            run: Rc::new(f),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<V> Clone for LexHandler<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: Rc::clone(&self.run),
        }
    }
}

/// A callback choosing the token name per match.
///
/// Returning [Some] names (or renames) the token; returning [None] discards the match and
/// resumes scanning after it.
pub struct TokenSelector<V> {
    pub(crate) name: Option<String>,
    pub(crate) run: SelectCallback<V>,
}

impl<V> TokenSelector<V> {
    pub fn new<F: Fn(&V, &str) -> Option<String> + 'static>(f: F) -> Self {
        Self {
            name: None,
            run: Rc::new(f),
        }
    }

    pub fn named<F: Fn(&V, &str) -> Option<String> + 'static>(name: &str, f: F) -> Self {
        Self {
            name: Some(name.to_string()),
            run: Rc::new(f),
        }
    }
}

impl<V> Clone for TokenSelector<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: Rc::clone(&self.run),
        }
    }
}

#[derive(Clone)]
pub(crate) enum LexPattern {
    Literal(String),
    Pattern { source: String, regexp: Regex },
}

impl LexPattern {
    /// Compile a start-anchored regex pattern, anchoring it when the source is not.
    pub(crate) fn regexp(source: &str) -> Result<Self, crate::GrammarError> {
        let anchored = if source.starts_with('^') {
            source.to_string()
        } else {
            format!("^(?:{})", source)
        };
        let regexp = Regex::new(&anchored).map_err(|err| {
            crate::GrammarError::definition(
                "LexPattern",
                format!("'{}' is not a valid regex expression: {}", source, err),
            )
        })?;
        Ok(Self::Pattern {
            source: source.to_string(),
            regexp,
        })
    }

    pub(crate) fn describe(&self) -> &str {
        match self {
            LexPattern::Literal(value) => value,
            LexPattern::Pattern { source, .. } => source,
        }
    }
}

/// One record of the ordered rule list held by a [Lexer].
pub struct LexRule<V> {
    pub(crate) name: Option<String>,
    pub(crate) pattern: LexPattern,
    pub(crate) handler: Option<LexHandler<V>>,
    pub(crate) selector: Option<TokenSelector<V>>,
}

impl<V> Clone for LexRule<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            handler: self.handler.clone(),
            selector: self.selector.clone(),
        }
    }
}

impl<V> LexRule<V> {
    fn describe(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.pattern.describe(),
        }
    }
}

/// The tokenization engine holding the ordered rule list and the current scan position.
///
/// A lexer is restarted on new input with [reset](Lexer::reset); tokens are read one at a
/// time with [next_token](Lexer::next_token) or inspected without committing the position
/// with [peek_token](Lexer::peek_token).
/// Once the position reaches the end of the input every further call returns the
/// end-of-input token.
pub struct Lexer<V: ValueImpl> {
    pub(crate) rules: Vec<LexRule<V>>,
    pub(crate) eof_name: String,
    pub(crate) eof_value: V,
    code: Code,
    pointer: i64,
    log: OnceCell<Log<&'static str>>,
}

impl<V: ValueImpl> Lexer<V> {
    pub(crate) fn new(rules: Vec<LexRule<V>>, eof_name: String, eof_value: V) -> Self {
        Self {
            rules,
            eof_name,
            eof_value,
            code: Code::new(""),
            pointer: 0,
            log: OnceCell::new(),
        }
    }

    /// Replace the input and rewind the scan position to the beginning.
    pub fn reset(&mut self, source: &str) {
        self.code = Code::new(source);
        self.pointer = 0;
    }

    pub fn source(&self) -> &str {
        self.code.value()
    }

    pub fn eof_name(&self) -> &str {
        &self.eof_name
    }

    pub fn pointer(&self) -> i64 {
        self.pointer
    }

    /// Obtain line and column information for a byte offset of the current input.
    pub fn location(&self, pointer: usize) -> Position {
        self.code.obtain_position(pointer)
    }

    /// Set a log label to debug the lexeme dispatch.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Move the scan position absolutely, from the end, or relative to the current
    /// position. A position that ends up negative is a fatal error on the next read.
    pub fn seek(&mut self, from: SeekFrom) -> i64 {
        self.pointer = match from {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.code.len() as i64 + offset,
            SeekFrom::Current(offset) => self.pointer + offset,
        };
        self.pointer
    }

    /// Read the next token and commit the position past it.
    pub fn next_token(&mut self) -> Result<Token<V>, ParseError> {
        self.scan(true)
    }

    /// Report the next token without committing the position.
    pub fn peek_token(&mut self) -> Result<Token<V>, ParseError> {
        self.scan(false)
    }

    fn scan(&mut self, advance: bool) -> Result<Token<V>, ParseError> {
        let pointer = usize::try_from(self.pointer).map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidPointer,
                0,
                format!("Token stream pointer moved to negative offset {}.", self.pointer),
            )
        })?;
        let result = self.match_at(pointer);
        if let Ok(token) = &result {
            if advance {
                self.pointer = token.end as i64;
            }
        }
        self.log_result(pointer, &result);
        result
    }

    fn match_at(&self, mut pointer: usize) -> Result<Token<V>, ParseError> {
        let text = self.code.value();
        'scan: loop {
            if pointer >= text.len() {
                return Ok(Token::new(
                    self.eof_name.clone(),
                    String::new(),
                    self.eof_value.clone(),
                    text.len(),
                    text.len(),
                ));
            }
            if !text.is_char_boundary(pointer) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidPointer,
                    pointer,
                    format!("Offset {} is not a character boundary.", pointer),
                ));
            }
            let rest = &text[pointer..];
            for rule in &self.rules {
                let (lexeme, groups): (&str, Vec<Option<&str>>) = match &rule.pattern {
                    LexPattern::Literal(value) => {
                        if !rest.starts_with(value.as_str()) {
                            continue;
                        }
                        (&rest[..value.len()], Vec::new())
                    }
                    LexPattern::Pattern { regexp, .. } => match regexp.captures(rest) {
                        Some(captures) => {
                            let whole = match captures.get(0) {
                                Some(found) => found,
                                None => continue,
                            };
                            let groups = captures
                                .iter()
                                .skip(1)
                                .map(|group| group.map(|found| found.as_str()))
                                .collect();
                            (whole.as_str(), groups)
                        }
                        None => continue,
                    },
                };
                if lexeme.is_empty() {
                    return Err(ParseError::new(
                        ParseErrorKind::ZeroLengthMatch,
                        pointer,
                        format!(
                            "Lexeme rule '{}' matched an empty string at {}.",
                            rule.describe(),
                            self.code.obtain_position(pointer)
                        ),
                    ));
                }
                let end = pointer + lexeme.len();
                let value = match &rule.handler {
                    Some(handler) => (handler.run)(lexeme, &groups),
                    None => V::from_lexeme(lexeme),
                };
                let name = match (&rule.name, &rule.selector) {
                    (_, Some(selector)) => match (selector.run)(&value, lexeme) {
                        Some(name) => name,
                        None => {
                            pointer = end;
                            continue 'scan;
                        }
                    },
                    (Some(name), None) => name.clone(),
                    (None, None) => {
                        pointer = end;
                        continue 'scan;
                    }
                };
                return Ok(Token::new(name, lexeme.to_string(), value, pointer, end));
            }
            return Err(ParseError::new(
                ParseErrorKind::UnknownToken,
                pointer,
                format!(
                    "No lexeme rule matched near {:?} at {}.",
                    self.code.snippet(pointer),
                    self.code.obtain_position(pointer)
                ),
            ));
        }
    }

    fn log_result(&self, _pointer: usize, _result: &Result<Token<V>, ParseError>) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log.get() {
            match _result {
                Ok(token) => {
                    if label.order() >= Log::Success(()).order() {
                        println!(
                            "[{}; LexemeSuccess]: token: {} at {}",
                            label,
                            token.name,
                            self.code.obtain_position(token.start)
                        );
                    }
                }
                Err(err) => {
                    if label.order() >= Log::Result(()).order() {
                        println!(
                            "[{}; LexemeError]: at {}",
                            label,
                            self.code.obtain_position(_pointer)
                        );
                        let _ = err;
                    }
                }
            }
        }
    }
}
