use crate::examples::booleans::{boolean_lexer, booleans};
use crate::examples::calculator::{calculator, calculator_lexer};
use crate::lexer::LexHandler;
use crate::{
    Associativity, GrammarBuilder, LexerBuilder, ParseErrorKind, ReduceHandler, SynTree,
};
use serde_json::{json, Value};

#[test]
fn arithmetic_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    for (source, expected) in [
        ("2 + 3", 5.0),
        ("10 - 3", 7.0),
        ("2 + 3 * 4", 14.0),
        ("(2+3)*4", 20.0),
        ("1.5 + 0.5", 2.0),
        ("2 - 3 - 1", -2.0),
        ("8 / 4 / 2", 1.0),
    ] {
        let value = parser.parse_text(&mut lexer, source).unwrap();
        assert_eq!(value, json!(expected), "source: {}", source);
    }
}

#[test]
fn unexpected_eof_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    let err = parser.parse_text(&mut lexer, "2 +").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    assert_eq!(err.pointer, 3);
}

#[test]
fn unexpected_token_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    let err = parser.parse_text(&mut lexer, "2 + + 3").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(err.pointer, 4);
    assert!(err.message.contains("state"), "{}", err.message);
}

#[test]
fn handler_failure_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    let err = parser.parse_text(&mut lexer, "4 / 0").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Handler);
    assert!(err.message.contains("division by zero"), "{}", err.message);
}

#[test]
fn determinism_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    let first = parser.parse_text(&mut lexer, "(1 + 2) * 3 - 4 / 2").unwrap();
    let second = parser.parse_text(&mut lexer, "(1 + 2) * 3 - 4 / 2").unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn boolean_test() {
    let parser = booleans().unwrap();
    let mut lexer = boolean_lexer().unwrap();
    for (source, expected) in [
        ("true && false", false),
        ("true || false && false", true),
        ("!false && (true||false)", true),
        ("!!true", true),
        ("false || !false", true),
    ] {
        let value = parser.parse_text(&mut lexer, source).unwrap();
        assert_eq!(value, json!(expected), "source: {}", source);
    }
}

#[test]
fn precedence_flip_test() {
    // Swapping the operator tiers flips the parse of "2 + 3 * 4" predictably.
    let build = |tiers: [&str; 2]| {
        GrammarBuilder::new()
            .bnf(
                "E ::= E '+' E | E '*' E | num ;",
                vec![
                    ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
                        Ok(json!(
                            args[0].as_f64().unwrap_or(f64::NAN)
                                + args[2].as_f64().unwrap_or(f64::NAN)
                        ))
                    }),
                    ReduceHandler::new(|args: Vec<Value>, _| {
                        Ok(json!(
                            args[0].as_f64().unwrap_or(f64::NAN)
                                * args[2].as_f64().unwrap_or(f64::NAN)
                        ))
                    }),
                    ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
                ],
            )
            .unwrap()
            .opr(Associativity::Left, &[tiers[0]])
            .opr(Associativity::Left, &[tiers[1]])
            .build()
            .unwrap()
    };
    let mut lexer = calculator_lexer().unwrap();
    let standard = build(["+", "*"]);
    assert_eq!(
        standard.parse_text(&mut lexer, "2 + 3 * 4").unwrap(),
        json!(14.0)
    );
    let flipped = build(["*", "+"]);
    assert_eq!(
        flipped.parse_text(&mut lexer, "2 + 3 * 4").unwrap(),
        json!(20.0)
    );
}

#[test]
fn associativity_flip_test() {
    let build = |assoc: Associativity| {
        GrammarBuilder::new()
            .bnf(
                "E ::= E '-' E | num ;",
                vec![
                    ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
                        Ok(json!(
                            args[0].as_f64().unwrap_or(f64::NAN)
                                - args[2].as_f64().unwrap_or(f64::NAN)
                        ))
                    }),
                    ReduceHandler::new(|mut args, _| Ok(args.remove(0))),
                ],
            )
            .unwrap()
            .opr(assoc, &["-"])
            .build()
            .unwrap()
    };
    let mut lexer = calculator_lexer().unwrap();
    assert_eq!(
        build(Associativity::Left)
            .parse_text(&mut lexer, "8 - 4 - 2")
            .unwrap(),
        json!(2.0)
    );
    assert_eq!(
        build(Associativity::Right)
            .parse_text(&mut lexer, "8 - 4 - 2")
            .unwrap(),
        json!(6.0)
    );
}

#[test]
fn optional_trailing_terminator_test() {
    let mut lexer = LexerBuilder::new()
        .skip(r"\s+")
        .unwrap()
        .token("id", r"[a-z]+")
        .unwrap()
        .token_with(
            "num",
            r"[0-9]+",
            LexHandler::new(|lexeme, _| json!(lexeme.parse::<i64>().unwrap_or(0))),
        )
        .unwrap()
        .literal("=", "=")
        .literal(";", ";")
        .build();
    let parser = GrammarBuilder::new()
        .ebnf(
            "S = id '=' num [ ';' ] ;",
            vec![ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
                Ok(json!({
                    "name": args[0],
                    "value": args[2],
                    "terminated": !args[3].is_null(),
                }))
            })],
        )
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(
        parser.parse_text(&mut lexer, "x = 42;").unwrap(),
        json!({"name": "x", "value": 42, "terminated": true})
    );
    assert_eq!(
        parser.parse_text(&mut lexer, "x = 42").unwrap(),
        json!({"name": "x", "value": 42, "terminated": false})
    );
}

#[test]
fn repetition_argument_shape_test() {
    let mut lexer = LexerBuilder::new()
        .skip(r"\s+")
        .unwrap()
        .literal("a", "a")
        .literal("b", "b")
        .build();
    let parser = GrammarBuilder::new()
        .ebnf(
            "S = a { b } ;",
            vec![ReduceHandler::new(|args: Vec<Value>, _: &mut ()| {
                Ok(json!({"first": args[0], "rest": args[1]}))
            })],
        )
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(
        parser.parse_text(&mut lexer, "a b b b").unwrap(),
        json!({"first": "a", "rest": ["b", "b", "b"]})
    );
    assert_eq!(
        parser.parse_text(&mut lexer, "a").unwrap(),
        json!({"first": "a", "rest": []})
    );
}

#[test]
fn abnf_incremental_language_test() {
    let mut lexer = LexerBuilder::new()
        .literal("a", "a")
        .literal("b", "b")
        .literal("c", "c")
        .literal("d", "d")
        .build();
    let concat = |args: Vec<Value>, _: &mut ()| -> Result<Value, String> {
        Ok(json!(args
            .iter()
            .map(|value| value.as_str().unwrap_or(""))
            .collect::<String>()))
    };
    let parser = GrammarBuilder::new()
        .abnf("S = a b\n", vec![ReduceHandler::new(concat)])
        .unwrap()
        .abnf("S =/ c d\n", vec![ReduceHandler::new(concat)])
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(parser.parse_text(&mut lexer, "ab").unwrap(), json!("ab"));
    assert_eq!(parser.parse_text(&mut lexer, "cd").unwrap(), json!("cd"));
    let err = parser.parse_text(&mut lexer, "ac").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
}

#[test]
fn grouped_alternatives_language_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .literal("X", "X")
        .literal("A", "A")
        .literal("B", "B")
        .literal("C", "C")
        .literal("Y", "Y")
        .build();
    let parser = GrammarBuilder::<Value>::new()
        .ebnf("S = X (A | B) Y ;", vec![])
        .unwrap()
        .build()
        .unwrap();
    assert!(parser.parse_text(&mut lexer, "X A Y").is_ok());
    assert!(parser.parse_text(&mut lexer, "X B Y").is_ok());
    assert!(parser.parse_text(&mut lexer, "X C Y").is_err());
}

#[test]
fn syntree_default_value_test() {
    let mut lexer = LexerBuilder::<SynTree>::new()
        .skip(r"\s+")
        .unwrap()
        .token("word", r"[a-z]+")
        .unwrap()
        .literal(",", ",")
        .build();
    let parser = GrammarBuilder::<SynTree>::new()
        .bnf("List ::= List ',' word | word ;", vec![])
        .unwrap()
        .build()
        .unwrap();
    let tree = parser.parse_text(&mut lexer, "ab, cd, ef").unwrap();
    assert_eq!(tree.name, "List");
    assert_eq!(tree.leaves(), ["ab", ",", "cd", ",", "ef"]);
    assert!(tree.contains("List"));
}

#[test]
fn reduce_order_and_context_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .literal("a", "a")
        .literal("b", "b")
        .build();
    let trace = |label: &'static str| {
        ReduceHandler::new(move |_args: Vec<Value>, context: &mut Vec<String>| {
            context.push(label.to_string());
            Ok(Value::Null)
        })
    };
    let parser = GrammarBuilder::<Value, Vec<String>>::new()
        .bnf(
            "S ::= A B ; A ::= a ; B ::= b ;",
            vec![trace("S"), trace("A"), trace("B")],
        )
        .unwrap()
        .build()
        .unwrap();
    let mut context = Vec::new();
    lexer.reset("a b");
    parser.parse_with(&mut lexer, &mut context).unwrap();
    // Reductions run bottom-up, leftmost first.
    assert_eq!(context, ["A", "B", "S"]);
}

#[test]
fn parser_reuse_is_stateless_test() {
    let parser = calculator().unwrap();
    let mut lexer = calculator_lexer().unwrap();
    assert!(parser.parse_text(&mut lexer, "2 +").is_err());
    // A failed parse leaves no residue behind.
    assert_eq!(parser.parse_text(&mut lexer, "2 + 2").unwrap(), json!(4.0));
}

#[test]
fn chosen_mode_is_reported_test() {
    let parser = calculator().unwrap();
    assert_eq!(parser.mode(), crate::TableMode::Slr);
    assert!(parser.grammar().state_count() > 0);
    assert!(parser.grammar().grammar().contains("E -> E '+' T"));
}
