//! Boolean expressions with three precedence tiers (`||` < `&&` < `!`).

use crate::{
    Associativity, GrammarBuilder, GrammarError, Lexer, LexerBuilder, Parser, ReduceHandler,
};
use serde_json::{json, Value};

fn truth(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

pub fn boolean_lexer() -> Result<Lexer<Value>, GrammarError> {
    Ok(LexerBuilder::new()
        .skip(r"\s+")?
        .literal("||", "||")
        .literal("&&", "&&")
        .literal("!", "!")
        .literal("(", "(")
        .literal(")", ")")
        .literal("true", "true")
        .literal("false", "false")
        .build())
}

pub fn booleans() -> Result<Parser<Value>, GrammarError> {
    GrammarBuilder::new()
        .bnf(
            "E ::= E '||' T | T ;
             T ::= T '&&' F | F ;
             F ::= '!' F | '(' E ')' | 'true' | 'false' ;",
            vec![
                ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
                    Ok(json!(truth(&args[0]) || truth(&args[2])))
                }),
                ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
                ReduceHandler::new(|args: Vec<Value>, _| {
                    Ok(json!(truth(&args[0]) && truth(&args[2])))
                }),
                ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
                ReduceHandler::new(|args: Vec<Value>, _| Ok(json!(!truth(&args[1])))),
                ReduceHandler::new(|mut args, _| Ok(args.remove(1))),
                ReduceHandler::new(|_, _| Ok(json!(true))),
                ReduceHandler::new(|_, _| Ok(json!(false))),
            ],
        )?
        .opr(Associativity::Left, &["||"])
        .opr(Associativity::Left, &["&&"])
        .opr(Associativity::Right, &["!"])
        .build()
}
