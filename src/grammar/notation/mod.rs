//! Notation front-ends turning BNF, EBNF and ABNF grammar text into the production IR.
//!
//! Each dialect owns a fixed ordered rule list tokenized with the crate's own
//! [lexer engine](crate::Lexer); the token stream is then linearized into a *shape
//! string* (one byte per token), validated against the dialect's production shape, and
//! the matched shape indices are walked back to the original tokens to materialize the
//! productions.

pub(crate) mod abnf;
pub(crate) mod bnf;
pub(crate) mod ebnf;

use crate::grammar::Element;
use crate::lexer::Lexer;
use crate::{GrammarError, ParseError, Token, ValueImpl};

#[derive(Debug, Clone, PartialEq)]
/// Semantic value used while tokenizing grammar text.
pub(crate) enum MetaValue {
    Null,
    Text(String),
    List(Vec<MetaValue>),
}

impl ValueImpl for MetaValue {
    fn null() -> Self {
        MetaValue::Null
    }

    fn from_lexeme(lexeme: &str) -> Self {
        MetaValue::Text(lexeme.to_string())
    }

    fn aggregate(values: Vec<Self>) -> Self {
        MetaValue::List(values)
    }

    fn into_aggregate(self) -> Result<Vec<Self>, Self> {
        match self {
            MetaValue::List(values) => Ok(values),
            other => Err(other),
        }
    }
}

impl MetaValue {
    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A production extracted from grammar text, before handler attachment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NotationProduction {
    pub head: String,
    pub body: Vec<Element>,
    pub incremental: bool,
}

pub(crate) fn syntax_error(err: ParseError) -> GrammarError {
    GrammarError::Syntax {
        pointer: err.pointer,
        message: err.message,
    }
}

/// Drain the lexer into a token list, stopping at the end-of-input token.
pub(crate) fn collect_tokens(
    lexer: &mut Lexer<MetaValue>,
    source: &str,
) -> Result<Vec<Token<MetaValue>>, GrammarError> {
    lexer.reset(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token().map_err(syntax_error)?;
        if token.name == lexer.eof_name() {
            break Ok(tokens);
        }
        tokens.push(token);
    }
}

/// Linearize tokens into the shape string; byte `i` of the shape describes token `i`.
pub(crate) fn shape_of(
    tokens: &[Token<MetaValue>],
    classify: impl Fn(&Token<MetaValue>) -> Option<char>,
) -> Result<String, GrammarError> {
    tokens
        .iter()
        .map(|token| {
            classify(token).ok_or_else(|| GrammarError::Syntax {
                pointer: token.start,
                message: format!("Unexpected token '{}' in grammar text.", token.name),
            })
        })
        .collect()
}

/// The name of an identifier token (angle-bracketed identifiers decode in the lexer).
pub(crate) fn identifier_name(token: &Token<MetaValue>) -> String {
    match token.value.as_text() {
        Some(text) => text.to_string(),
        None => token.lexeme.clone(),
    }
}

/// Decode a quoted terminal name.
///
/// Single-quoted strings are re-encoded to double-quoted form with `'` unescaped and
/// bare `"` escaped; the result goes through the JSON string decoder.
pub(crate) fn decode_string(raw: &str) -> Result<String, String> {
    if raw.len() < 2 {
        return Err("string literal is too short".to_string());
    }
    let quoted = if raw.starts_with('\'') {
        let inner = &raw[1..raw.len() - 1];
        let mut encoded = String::with_capacity(raw.len() + 2);
        encoded.push('"');
        let mut chars = inner.chars();
        while let Some(current) = chars.next() {
            match current {
                '\\' => match chars.next() {
                    Some('\'') => encoded.push('\''),
                    Some(escaped) => {
                        encoded.push('\\');
                        encoded.push(escaped);
                    }
                    None => return Err("string literal ends with a dangling escape".to_string()),
                },
                '"' => encoded.push_str("\\\""),
                other => encoded.push(other),
            }
        }
        encoded.push('"');
        encoded
    } else {
        raw.to_string()
    };
    serde_json::from_str::<String>(&quoted)
        .map_err(|err| format!("invalid string literal {}: {}", raw, err))
}

/// Strip the brackets of an `<identifier>` and unescape `>>` to a literal `>`.
pub(crate) fn decode_angle_identifier(raw: &str) -> String {
    raw[1..raw.len() - 1].replace(">>", ">")
}
