use crate::grammar::notation::{abnf, bnf, ebnf};
use crate::grammar::Element;
use crate::symbol::Symbol;
use crate::GrammarError;

fn symbols(body: &[Element]) -> Vec<&Symbol> {
    body.iter()
        .map(|element| match element {
            Element::Symbol(symbol) => symbol,
            other => panic!("expected a plain symbol, found {}", other),
        })
        .collect()
}

#[test]
fn bnf_alternatives_test() {
    let productions = bnf::parse("A ::= B 'x' | C ; D = A").unwrap();
    assert_eq!(productions.len(), 3);
    assert_eq!(productions[0].head, "A");
    assert_eq!(
        symbols(&productions[0].body),
        [&Symbol::non_terminal("B"), &Symbol::terminal("x")]
    );
    assert_eq!(symbols(&productions[1].body), [&Symbol::non_terminal("C")]);
    assert_eq!(productions[2].head, "D");
}

#[test]
fn bnf_empty_alternative_test() {
    let productions = bnf::parse("A ::= | x ;").unwrap();
    assert_eq!(productions.len(), 2);
    assert!(productions[0].body.is_empty());
}

#[test]
fn bnf_angle_identifier_test() {
    let productions = bnf::parse("<my rule> ::= <a>>b> ;").unwrap();
    assert_eq!(productions[0].head, "my rule");
    assert_eq!(symbols(&productions[0].body), [&Symbol::non_terminal("a>b")]);
}

#[test]
fn bnf_string_decoding_test() {
    // Single quoted strings re-encode to double quoted form before JSON decoding.
    let productions = bnf::parse(r#"A ::= 'it\'s "x"' "a\nb" ;"#).unwrap();
    assert_eq!(
        symbols(&productions[0].body),
        [
            &Symbol::terminal("it's \"x\""),
            &Symbol::terminal("a\nb")
        ]
    );
}

#[test]
fn bnf_malformed_production_test() {
    let err = bnf::parse("A B ::= x ;").unwrap_err();
    match err {
        GrammarError::Syntax { pointer, message } => {
            assert_eq!(pointer, 0);
            assert!(message.contains("Malformed"), "{}", message);
        }
        other => panic!("expected a syntax error, found {:?}", other),
    }
}

#[test]
fn bnf_unknown_character_test() {
    let err = bnf::parse("A ::= x @ y ;").unwrap_err();
    match err {
        GrammarError::Syntax { pointer, .. } => assert_eq!(pointer, 8),
        other => panic!("expected a syntax error, found {:?}", other),
    }
}

#[test]
fn ebnf_elements_test() {
    let productions = ebnf::parse("S = a (b | c) [d] {e} f * 2 ;").unwrap();
    assert_eq!(productions.len(), 1);
    let body = &productions[0].body;
    assert_eq!(body.len(), 5);
    assert!(matches!(&body[0], Element::Symbol(_)));
    match &body[1] {
        Element::Group {
            alternatives,
            repeats: None,
        } => assert_eq!(alternatives.len(), 2),
        other => panic!("expected a group, found {}", other),
    }
    assert!(matches!(&body[2], Element::Optional { repeats: None, .. }));
    assert!(matches!(&body[3], Element::Repeat { .. }));
    assert!(matches!(&body[4], Element::Multiple { count: 2, .. }));
}

#[test]
fn ebnf_group_multiplicity_test() {
    let productions = ebnf::parse("S = (a | b) * 2 ;").unwrap();
    match &productions[0].body[0] {
        Element::Group {
            repeats: Some(2), ..
        } => {}
        other => panic!("expected a repeated group, found {}", other),
    }
}

#[test]
fn ebnf_question_mark_rejected_test() {
    let err = ebnf::parse("S = a ? ;").unwrap_err();
    match err {
        GrammarError::Syntax { message, .. } => {
            assert!(message.contains("not supported"), "{}", message)
        }
        other => panic!("expected a syntax error, found {:?}", other),
    }
}

#[test]
fn ebnf_unbalanced_group_test() {
    assert!(ebnf::parse("S = ( a ;").is_err());
    assert!(ebnf::parse("S = a ) ;").is_err());
}

#[test]
fn abnf_rules_test() {
    let productions = abnf::parse("S = a b\nT = \"lit\" %x30-39 <some prose>\n").unwrap();
    assert_eq!(productions.len(), 2);
    assert!(!productions[0].incremental);
    assert_eq!(
        symbols(&productions[1].body),
        [
            &Symbol::terminal("lit"),
            &Symbol::terminal("%x30-39"),
            &Symbol::terminal("some prose")
        ]
    );
}

#[test]
fn abnf_incremental_test() {
    let productions = abnf::parse("S = a b\nS =/ c d\n").unwrap();
    assert_eq!(productions.len(), 2);
    assert!(productions[1].incremental);
    assert_eq!(productions[1].head, "S");
}

#[test]
fn abnf_comment_and_continuation_test() {
    let productions = abnf::parse("S = a ; trailing words\n    b c\n").unwrap();
    assert_eq!(productions.len(), 1);
    assert_eq!(
        symbols(&productions[0].body),
        [
            &Symbol::non_terminal("a"),
            &Symbol::non_terminal("b"),
            &Symbol::non_terminal("c")
        ]
    );
}

#[test]
fn abnf_repeat_token_is_literal_test() {
    // Repetition counts are recognized but kept as literal elements.
    let productions = abnf::parse("S = 1*2 a\n").unwrap();
    assert_eq!(
        symbols(&productions[0].body),
        [&Symbol::terminal("1*2"), &Symbol::non_terminal("a")]
    );
}
