use crate::lexer::{LexHandler, LexerBuilder, TokenSelector};
use crate::{ParseErrorKind, Token, ValueImpl};
use serde_json::{json, Value};
use std::io::SeekFrom;

fn drain(lexer: &mut crate::Lexer<Value>) -> Vec<Token<Value>> {
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        if token.name == lexer.eof_name() {
            break tokens;
        }
        tokens.push(token);
    }
}

#[test]
fn token_coverage_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .token("id", r"[a-z]+")
        .unwrap()
        .build();
    lexer.reset("ab cd  ef");
    let tokens = drain(&mut lexer);
    assert_eq!(
        tokens.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>(),
        ["ab", "cd", "ef"]
    );
    // Once the end is reached every further read stays at the end-of-input token.
    for _ in 0..3 {
        let eof = lexer.next_token().unwrap();
        assert_eq!(eof.name, lexer.eof_name());
        assert_eq!(eof.start, 9);
    }
}

#[test]
fn rule_order_test() {
    // The earlier rule wins even though both match at the position.
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .literal("if", "if")
        .token("id", r"[a-z]+")
        .unwrap()
        .build();
    lexer.reset("if iffy");
    let tokens = drain(&mut lexer);
    assert_eq!(tokens[0].name, "if");
    // The literal also matches the prefix of "iffy"; ordering is first match wins.
    assert_eq!(tokens[1].name, "if");
    assert_eq!(tokens[2].lexeme, "fy");
}

#[test]
fn handler_value_test() {
    let mut lexer = LexerBuilder::new()
        .skip(r"\s+")
        .unwrap()
        .token_with(
            "num",
            r"([0-9]+)(?:\.([0-9]+))?",
            LexHandler::new(|lexeme, groups: &[Option<&str>]| {
                assert!(groups[0].is_some());
                json!(lexeme.parse::<f64>().unwrap())
            }),
        )
        .unwrap()
        .build();
    lexer.reset("3.25 7");
    let tokens = drain(&mut lexer);
    assert_eq!(tokens[0].value, json!(3.25));
    assert_eq!(tokens[1].value, json!(7.0));
}

#[test]
fn selector_rename_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .select(
            r"[a-z]+",
            TokenSelector::new(|_, lexeme| match lexeme {
                "for" | "while" => Some("keyword".to_string()),
                _ => Some("id".to_string()),
            }),
        )
        .unwrap()
        .build();
    lexer.reset("for x while y");
    let names: Vec<String> = drain(&mut lexer).into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["keyword", "id", "keyword", "id"]);
}

#[test]
fn selector_discard_test() {
    // Returning None discards the match and dispatch resumes after it.
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .select(
            r"[a-z]+",
            TokenSelector::new(|_, lexeme| {
                (!lexeme.starts_with('x')).then(|| "id".to_string())
            }),
        )
        .unwrap()
        .build();
    lexer.reset("ab xx cd");
    let names: Vec<String> = drain(&mut lexer).into_iter().map(|t| t.lexeme).collect();
    assert_eq!(names, ["ab", "cd"]);
}

#[test]
fn zero_length_test() {
    let mut lexer = LexerBuilder::<Value>::new().token("a", r"a*").unwrap().build();
    lexer.reset("bbb");
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ZeroLengthMatch);
    assert_eq!(err.pointer, 0);
}

#[test]
fn unknown_token_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .token("id", r"[a-z]+")
        .unwrap()
        .build();
    lexer.reset("ab\ncd %rest");
    let err = loop {
        match lexer.next_token() {
            Ok(_) => continue,
            Err(err) => break err,
        }
    };
    assert_eq!(err.kind, ParseErrorKind::UnknownToken);
    assert_eq!(err.pointer, 6);
    assert!(err.message.contains("%rest"), "snippet missing: {}", err.message);
    assert!(err.message.contains("2:4"), "position missing: {}", err.message);
}

#[test]
fn peek_does_not_advance_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .token("id", r"[a-z]+")
        .unwrap()
        .build();
    lexer.reset("ab cd");
    let peeked = lexer.peek_token().unwrap();
    let read = lexer.next_token().unwrap();
    assert_eq!(peeked, read);
    assert_eq!(lexer.next_token().unwrap().lexeme, "cd");
}

#[test]
fn seek_test() {
    let mut lexer = LexerBuilder::<Value>::new()
        .skip(r"\s+")
        .unwrap()
        .token("id", r"[a-z]+")
        .unwrap()
        .build();
    lexer.reset("ab cd");
    assert_eq!(lexer.next_token().unwrap().lexeme, "ab");
    lexer.seek(SeekFrom::Start(0));
    assert_eq!(lexer.next_token().unwrap().lexeme, "ab");
    lexer.seek(SeekFrom::End(-2));
    assert_eq!(lexer.next_token().unwrap().lexeme, "cd");
    lexer.seek(SeekFrom::Current(-20));
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidPointer);
}

#[test]
fn eof_configuration_test() {
    let mut lexer = LexerBuilder::new()
        .token("id", r"[a-z]+")
        .unwrap()
        .eof("end", json!("done"))
        .build();
    lexer.reset("ab");
    lexer.next_token().unwrap();
    let eof = lexer.next_token().unwrap();
    assert_eq!(eof.name, "end");
    assert_eq!(eof.value, json!("done"));
}

#[test]
fn merge_and_clone_test() {
    let words = LexerBuilder::<Value>::new().token("id", r"[a-z]+").unwrap();
    let spaces = LexerBuilder::<Value>::new().skip(r"\s+").unwrap();
    let mut lexer = words.clone().merge(spaces).build();
    lexer.reset("ab cd");
    assert_eq!(drain(&mut lexer).len(), 2);
    // The original builder is untouched by the merge.
    let mut bare = words.build();
    bare.reset("ab cd");
    assert_eq!(bare.next_token().unwrap().lexeme, "ab");
    assert_eq!(
        bare.next_token().unwrap_err().kind,
        ParseErrorKind::UnknownToken
    );
}

#[test]
fn value_impl_defaults_test() {
    assert_eq!(Value::from_lexeme("xy"), json!("xy"));
    assert_eq!(Value::aggregate(vec![json!(1), json!(2)]), json!([1, 2]));
    assert_eq!(Value::null(), Value::Null);
    assert_eq!(json!([1]).into_aggregate().unwrap(), vec![json!(1)]);
    assert!(json!("x").into_aggregate().is_err());
}
