use super::{
    collect_tokens, decode_angle_identifier, decode_string, identifier_name, shape_of, MetaValue,
    NotationProduction,
};
use crate::grammar::Element;
use crate::lexer::{LexHandler, Lexer, LexerBuilder};
use crate::symbol::Symbol;
use crate::util::Code;
use crate::{GrammarError, Token};
use regex::Regex;

/// The fixed rule list tokenizing EBNF grammar text; a superset of the BNF rules.
pub(crate) fn meta_lexer() -> Result<Lexer<MetaValue>, GrammarError> {
    Ok(LexerBuilder::new()
        .skip(r"\s+")?
        .token("define", r"::=|:|=")?
        .token("or", r"\|")?
        .token("sep", r"[;,]")?
        .token("lparen", r"\(")?
        .token("rparen", r"\)")?
        .token("lbracket", r"\[")?
        .token("rbracket", r"\]")?
        .token("lbrace", r"\{")?
        .token("rbrace", r"\}")?
        .token("star", r"\*")?
        .token("qmark", r"\?")?
        .token("number", r"[0-9]+")?
        .token_with(
            "ident",
            r"<(?:>>|[^>])*>",
            LexHandler::new(|lexeme, _| MetaValue::Text(decode_angle_identifier(lexeme))),
        )?
        .token("ident", r"[A-Za-z_$][A-Za-z0-9_$]*")?
        .token("string", r#""(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'"#)?
        .build())
}

fn classify(token: &Token<MetaValue>) -> Option<char> {
    match token.name.as_str() {
        "ident" => Some('i'),
        "string" => Some('s'),
        "define" => Some('='),
        "or" => Some('|'),
        "sep" => Some(' '),
        "lparen" => Some('('),
        "rparen" => Some(')'),
        "lbracket" => Some('['),
        "rbracket" => Some(']'),
        "lbrace" => Some('{'),
        "rbrace" => Some('}'),
        "star" => Some('*'),
        "number" => Some('n'),
        "qmark" => Some('?'),
        _ => None,
    }
}

/// Parse EBNF grammar text into productions whose bodies may carry grouping,
/// optional, repetition and multiplicity elements.
pub(crate) fn parse(source: &str) -> Result<Vec<NotationProduction>, GrammarError> {
    let mut lexer = meta_lexer()?;
    let tokens = collect_tokens(&mut lexer, source)?;
    let shape = shape_of(&tokens, classify)?;
    materialize(source, &tokens, &shape)
}

fn materialize(
    source: &str,
    tokens: &[Token<MetaValue>],
    shape: &str,
) -> Result<Vec<NotationProduction>, GrammarError> {
    let code = Code::new(source);
    let production_shape = Regex::new(r"^i=[is()\[\]{}*n?|]*$").map_err(|err| {
        GrammarError::definition("EbnfNotation", format!("internal shape regex: {}", err))
    })?;
    let bytes = shape.as_bytes();
    let mut productions = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b' ' {
            index += 1;
            continue;
        }
        let end = shape[index..]
            .find(' ')
            .map_or(shape.len(), |offset| index + offset);
        if !production_shape.is_match(&shape[index..end]) {
            let token = &tokens[index];
            return Err(GrammarError::Syntax {
                pointer: token.start,
                message: format!(
                    "Malformed production near '{}' at {}.",
                    token.lexeme,
                    code.obtain_position(token.start)
                ),
            });
        }
        let head = identifier_name(&tokens[index]);
        let mut body = BodyParser {
            shape: bytes,
            tokens,
            code: &code,
            position: index + 2,
            end,
        };
        for alternative in body.alternatives(None)? {
            productions.push(NotationProduction {
                head: head.clone(),
                body: alternative,
                incremental: false,
            });
        }
        index = end;
    }
    if productions.is_empty() {
        return Err(GrammarError::Syntax {
            pointer: 0,
            message: "No production found in the grammar text.".to_string(),
        });
    }
    Ok(productions)
}

/// Recursive element parser over one production body slice of the shape string.
struct BodyParser<'a> {
    shape: &'a [u8],
    tokens: &'a [Token<MetaValue>],
    code: &'a Code,
    position: usize,
    end: usize,
}

impl<'a> BodyParser<'a> {
    fn error(&self, at: usize, message: String) -> GrammarError {
        let pointer = if at < self.tokens.len() {
            self.tokens[at].start
        } else {
            self.tokens.last().map_or(0, |token| token.end)
        };
        GrammarError::Syntax {
            pointer,
            message: format!("{} at {}.", message, self.code.obtain_position(pointer)),
        }
    }

    fn peek(&self) -> Option<u8> {
        (self.position < self.end).then(|| self.shape[self.position])
    }

    fn expect(&mut self, byte: u8) -> Result<(), GrammarError> {
        if self.peek() == Some(byte) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.error(self.position, format!("Expected '{}'", byte as char)))
        }
    }

    fn alternatives(&mut self, closing: Option<u8>) -> Result<Vec<Vec<Element>>, GrammarError> {
        let mut alternatives = Vec::new();
        let mut sequence = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if closing.is_some() {
                        return Err(self.error(self.position, "Unbalanced group".to_string()));
                    }
                    alternatives.push(sequence);
                    return Ok(alternatives);
                }
                Some(byte) if Some(byte) == closing => {
                    alternatives.push(sequence);
                    return Ok(alternatives);
                }
                Some(b')') | Some(b']') | Some(b'}') => {
                    return Err(
                        self.error(self.position, "Unbalanced closing bracket".to_string())
                    );
                }
                Some(b'|') => {
                    self.position += 1;
                    alternatives.push(std::mem::take(&mut sequence));
                }
                Some(_) => sequence.push(self.element()?),
            }
        }
    }

    fn element(&mut self) -> Result<Element, GrammarError> {
        let at = self.position;
        let base = match self.shape[at] {
            b'i' => {
                self.position += 1;
                Element::Symbol(Symbol::NonTerminal(identifier_name(&self.tokens[at])))
            }
            b's' => {
                self.position += 1;
                let token = &self.tokens[at];
                let name = decode_string(&token.lexeme).map_err(|message| GrammarError::Syntax {
                    pointer: token.start,
                    message,
                })?;
                Element::Symbol(Symbol::Terminal(name))
            }
            b'?' => {
                return Err(self.error(
                    at,
                    "The '?' operator is recognised but not supported; use [ ] for optional parts"
                        .to_string(),
                ));
            }
            b'(' => {
                self.position += 1;
                let alternatives = self.alternatives(Some(b')'))?;
                self.expect(b')')?;
                Element::Group {
                    alternatives,
                    repeats: None,
                }
            }
            b'[' => {
                self.position += 1;
                let alternatives = self.alternatives(Some(b']'))?;
                self.expect(b']')?;
                Element::Optional {
                    inner: into_sequence(alternatives),
                    repeats: None,
                }
            }
            b'{' => {
                self.position += 1;
                let alternatives = self.alternatives(Some(b'}'))?;
                self.expect(b'}')?;
                Element::Repeat {
                    inner: into_sequence(alternatives),
                }
            }
            other => {
                return Err(self.error(
                    at,
                    format!("Unexpected '{}' in production body", other as char),
                ));
            }
        };
        self.multiplicity(base)
    }

    fn multiplicity(&mut self, base: Element) -> Result<Element, GrammarError> {
        if self.peek() != Some(b'*') {
            return Ok(base);
        }
        let star_at = self.position;
        self.position += 1;
        if self.peek() != Some(b'n') {
            return Err(self.error(self.position, "Multiplicity must be a number".to_string()));
        }
        let token = &self.tokens[self.position];
        let count: usize = token.lexeme.parse().map_err(|_| {
            self.error(
                self.position,
                format!("Invalid multiplicity '{}'", token.lexeme),
            )
        })?;
        self.position += 1;
        if count == 0 {
            return Err(self.error(star_at, "Multiplicity must be positive".to_string()));
        }
        match base {
            Element::Group { alternatives, .. } => Ok(Element::Group {
                alternatives,
                repeats: Some(count),
            }),
            Element::Optional { inner, .. } => Ok(Element::Optional {
                inner,
                repeats: Some(count),
            }),
            Element::Repeat { .. } => Err(self.error(
                star_at,
                "A repetition group cannot take a multiplicity".to_string(),
            )),
            symbol @ Element::Symbol(_) => Ok(Element::Multiple {
                inner: Box::new(symbol),
                count,
            }),
            nested @ Element::Multiple { .. } => Ok(nested),
        }
    }
}

/// A bracketed body with one alternative stays a flat sequence; alternation inside the
/// brackets is kept as a nested group element.
fn into_sequence(mut alternatives: Vec<Vec<Element>>) -> Vec<Element> {
    if alternatives.len() == 1 {
        alternatives.remove(0)
    } else {
        vec![Element::Group {
            alternatives,
            repeats: None,
        }]
    }
}
