use super::{collect_tokens, MetaValue, NotationProduction};
use crate::grammar::Element;
use crate::lexer::{LexHandler, Lexer, LexerBuilder};
use crate::symbol::Symbol;
use crate::util::Code;
use crate::{GrammarError, Token};

/// The fixed rule list tokenizing ABNF grammar text.
///
/// Newlines are significant (rules are line oriented), comments run from `;` to the end
/// of the line, and numeric values keep their `%`-prefixed spelling as one token.
pub(crate) fn meta_lexer() -> Result<Lexer<MetaValue>, GrammarError> {
    Ok(LexerBuilder::new()
        .skip(r"[ \t]+")?
        .skip(r";[^\r\n]*")?
        .token("crlf", r"\r\n|\r|\n")?
        .token("incdefine", r"=/")?
        .token("define", r"=")?
        .token("alt", r"/")?
        .token("number", r"%[bdxBDX][0-9A-Fa-f]+(?:(?:\.[0-9A-Fa-f]+)+|-[0-9A-Fa-f]+)?")?
        .token("repeat", r"[0-9]*\*[0-9]*|[0-9]+")?
        .token("ident", r"[A-Za-z][A-Za-z0-9-]*")?
        .token_with(
            "prose",
            r"<[^>\r\n]*>",
            LexHandler::new(|lexeme, _| MetaValue::Text(lexeme[1..lexeme.len() - 1].to_string())),
        )?
        .token_with(
            "string",
            r#""[^"\r\n]*""#,
            LexHandler::new(|lexeme, _| MetaValue::Text(lexeme[1..lexeme.len() - 1].to_string())),
        )?
        .token("lparen", r"\(")?
        .token("rparen", r"\)")?
        .token("lbracket", r"\[")?
        .token("rbracket", r"\]")?
        .build())
}

/// Parse ABNF grammar text: one production per rule line.
///
/// Only identifiers, strings, prose, numeric values and repeat counts are extracted as
/// literal RHS elements; alternation and grouping are tokenized but not interpreted, so
/// grammars relying on `/` alternatives inside one rule or on `%x30-39` ranges will not
/// match the way full ABNF semantics would.
/// An `=/` definition marks the production incremental: the builder merges it as a new
/// alternative of an already defined head.
pub(crate) fn parse(source: &str) -> Result<Vec<NotationProduction>, GrammarError> {
    let mut lexer = meta_lexer()?;
    let tokens = collect_tokens(&mut lexer, source)?;
    let code = Code::new(source);
    let mut productions: Vec<NotationProduction> = Vec::new();
    let mut open = false;
    for line in tokens.split(|token| token.name == "crlf") {
        if line.is_empty() {
            continue;
        }
        let starts_rule = line.len() >= 2
            && line[0].name == "ident"
            && (line[1].name == "define" || line[1].name == "incdefine");
        if starts_rule {
            let head = match line[0].value.as_text() {
                Some(text) => text.to_string(),
                None => line[0].lexeme.clone(),
            };
            let incremental = line[1].name == "incdefine";
            let mut body = Vec::new();
            extend_body(&mut body, &line[2..]);
            productions.push(NotationProduction {
                head,
                body,
                incremental,
            });
            open = true;
        } else if open {
            // Continuation line: fold its elements into the previous rule.
            if let Some(last) = productions.last_mut() {
                extend_body(&mut last.body, line);
            }
        } else {
            let token = &line[0];
            return Err(GrammarError::Syntax {
                pointer: token.start,
                message: format!(
                    "Expected a rule definition near '{}' at {}.",
                    token.lexeme,
                    code.obtain_position(token.start)
                ),
            });
        }
    }
    if productions.is_empty() {
        return Err(GrammarError::Syntax {
            pointer: 0,
            message: "No production found in the grammar text.".to_string(),
        });
    }
    Ok(productions)
}

fn extend_body(body: &mut Vec<Element>, tokens: &[Token<MetaValue>]) {
    for token in tokens {
        let symbol = match token.name.as_str() {
            "ident" => Symbol::NonTerminal(token.lexeme.clone()),
            "string" | "prose" => match token.value.as_text() {
                Some(text) => Symbol::Terminal(text.to_string()),
                None => Symbol::Terminal(token.lexeme.clone()),
            },
            "number" | "repeat" => Symbol::Terminal(token.lexeme.clone()),
            _ => continue,
        };
        body.push(Element::Symbol(symbol));
    }
}
