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

/// The fixed rule list tokenizing BNF grammar text.
pub(crate) fn meta_lexer() -> Result<Lexer<MetaValue>, GrammarError> {
    Ok(LexerBuilder::new()
        .skip(r"\s+")?
        .token("define", r"::=|:|=")?
        .token("or", r"\|")?
        .token("sep", r"[;,]")?
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
        _ => None,
    }
}

/// Parse BNF grammar text into plain productions, one per alternative in source order.
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
    let production_shape = Regex::new(r"^i=[is]*(?:\|[is]*)*$").map_err(|err| {
        GrammarError::definition("BnfNotation", format!("internal shape regex: {}", err))
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
        let mut alternative: Vec<Element> = Vec::new();
        for offset in index + 2..end {
            match bytes[offset] {
                b'|' => productions.push(NotationProduction {
                    head: head.clone(),
                    body: std::mem::take(&mut alternative),
                    incremental: false,
                }),
                b'i' => alternative.push(Element::Symbol(Symbol::NonTerminal(identifier_name(
                    &tokens[offset],
                )))),
                b's' => {
                    let token = &tokens[offset];
                    let name = decode_string(&token.lexeme).map_err(|message| {
                        GrammarError::Syntax {
                            pointer: token.start,
                            message,
                        }
                    })?;
                    alternative.push(Element::Symbol(Symbol::Terminal(name)));
                }
                _ => {}
            }
        }
        productions.push(NotationProduction {
            head,
            body: alternative,
            incremental: false,
        });
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
