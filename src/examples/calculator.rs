//! A floating point calculator: stratified arithmetic grammar over a numeric lexer.
//!
//! All callbacks are named, so the compiled lexer and parser round-trip through their
//! serialized forms against [registry].

use crate::{
    Associativity, GrammarBuilder, GrammarError, HandlerRegistry, LexHandler, Lexer,
    LexerBuilder, Parser, ReduceHandler,
};
use serde_json::{json, Value};

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn literal(lexeme: &str, _: &[Option<&str>]) -> Value {
    json!(lexeme.parse::<f64>().unwrap_or(f64::NAN))
}

fn add(args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    Ok(json!(number(&args[0]) + number(&args[2])))
}

fn subtract(args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    Ok(json!(number(&args[0]) - number(&args[2])))
}

fn multiply(args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    Ok(json!(number(&args[0]) * number(&args[2])))
}

fn divide(args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    if number(&args[2]) == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(json!(number(&args[0]) / number(&args[2])))
}

fn first(mut args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    Ok(args.remove(0))
}

fn second(mut args: Vec<Value>, _: &mut ()) -> Result<Value, String> {
    Ok(args.remove(1))
}

pub fn calculator_lexer() -> Result<Lexer<Value>, GrammarError> {
    Ok(LexerBuilder::new()
        .skip(r"\s+")?
        .token_with(
            "num",
            r"[0-9]+(?:\.[0-9]+)?",
            LexHandler::named("calc_literal", literal),
        )?
        .literal("+", "+")
        .literal("-", "-")
        .literal("*", "*")
        .literal("/", "/")
        .literal("(", "(")
        .literal(")", ")")
        .build())
}

pub fn calculator() -> Result<Parser<Value>, GrammarError> {
    GrammarBuilder::new()
        .bnf(
            "E ::= E '+' T | E '-' T | T ;
             T ::= T '*' F | T '/' F | F ;
             F ::= '(' E ')' | num ;",
            vec![
                ReduceHandler::named("calc_add", add),
                ReduceHandler::named("calc_subtract", subtract),
                ReduceHandler::named("calc_first", first),
                ReduceHandler::named("calc_multiply", multiply),
                ReduceHandler::named("calc_divide", divide),
                ReduceHandler::named("calc_first", first),
                ReduceHandler::named("calc_second", second),
                ReduceHandler::named("calc_first", first),
            ],
        )?
        .opr(Associativity::Left, &["+", "-"])
        .opr(Associativity::Left, &["*", "/"])
        .build()
}

/// The named callbacks of the calculator, for reviving serialized artifacts.
pub fn registry() -> HandlerRegistry<Value> {
    HandlerRegistry::new()
        .lex_handler("calc_literal", literal)
        .reducer("calc_add", add)
        .reducer("calc_subtract", subtract)
        .reducer("calc_multiply", multiply)
        .reducer("calc_divide", divide)
        .reducer("calc_first", first)
        .reducer("calc_second", second)
}
