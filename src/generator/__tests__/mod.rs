use crate::generator::{
    compile, Action, ConflictPolicy, Generator, GeneratorOptions, TableMode, EOF,
};
use crate::grammar::{HandlerRef, Operator, SimpleProduction};
use crate::symbol::Symbol;
use crate::util::Log;
use crate::{Associativity, ConflictKind, GrammarError};
use std::collections::HashMap;

fn production(head: &str, body: &[Symbol]) -> SimpleProduction {
    SimpleProduction {
        head: head.to_string(),
        body: body.to_vec(),
        handler: HandlerRef::None,
    }
}

fn arithmetic() -> Vec<SimpleProduction> {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    vec![
        production("E", &[nt("E"), t("+"), nt("T")]),
        production("E", &[nt("T")]),
        production("T", &[nt("T"), t("*"), nt("F")]),
        production("T", &[nt("F")]),
        production("F", &[t("("), nt("E"), t(")")]),
        production("F", &[t("num")]),
    ]
}

fn options() -> GeneratorOptions {
    GeneratorOptions {
        start: None,
        eof_name: "$EOF".to_string(),
        operators: HashMap::new(),
        policy: ConflictPolicy::Error,
        mode: None,
        operator_filter: None,
        log: Log::None,
    }
}

fn operator_table(entries: &[(&str, Associativity, u32)]) -> HashMap<String, Operator> {
    entries
        .iter()
        .map(|(name, assoc, precedence)| {
            (
                name.to_string(),
                Operator {
                    name: name.to_string(),
                    assoc: *assoc,
                    precedence: *precedence,
                },
            )
        })
        .collect()
}

#[test]
fn first_follow_test() {
    let productions = arithmetic();
    let generator = Generator::prepare(&productions, &options()).unwrap();
    let id = |name: &str| generator.ids[name];
    let names = |set: &std::collections::BTreeSet<usize>| -> Vec<String> {
        set.iter()
            .map(|&symbol| generator.symbols[symbol].name.clone())
            .collect()
    };
    assert_eq!(names(&generator.first[id("E")]), ["(", "num"]);
    assert_eq!(names(&generator.first[id("T")]), ["(", "num"]);
    assert!(!generator.nullable[id("E")]);
    assert_eq!(names(&generator.follow[id("E")]), ["$EOF", "+", ")"]);
    assert_eq!(names(&generator.follow[id("T")]), ["$EOF", "+", "*", ")"]);
    assert_eq!(names(&generator.follow[id("F")]), ["$EOF", "+", "*", ")"]);
}

#[test]
fn nullable_first_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("S", &[nt("A"), t("x")]),
        production("A", &[t("a")]),
        production("A", &[]),
    ];
    let generator = Generator::prepare(&productions, &options()).unwrap();
    assert!(generator.nullable[generator.ids["A"]]);
    let first_s: Vec<&str> = generator.first[generator.ids["S"]]
        .iter()
        .map(|&symbol| generator.symbols[symbol].name.as_str())
        .collect();
    assert_eq!(first_s, ["x", "a"]);
}

#[test]
fn eof_is_index_zero_test() {
    let productions = arithmetic();
    let generator = Generator::prepare(&productions, &options()).unwrap();
    assert_eq!(generator.ids["$EOF"], EOF);
    assert!(!generator.symbols[EOF].is_nt);
    // The augmented start stays out of the user symbol namespace.
    assert!(generator.ids.contains_key("__GLOBAL"));
}

#[test]
fn slr_tables_test() {
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    let productions = arithmetic();
    let tables = compile(&productions, &opts).unwrap();
    assert_eq!(tables.mode, TableMode::Slr);
    assert_eq!(tables.start_state, 0);
    // The start state shifts on '(' and 'num' and has a goto for every non-terminal.
    let lparen = tables.symbol_ids["("];
    let num = tables.symbol_ids["num"];
    assert!(matches!(tables.action[0][&lparen], Action::Shift(_)));
    assert!(matches!(tables.action[0][&num], Action::Shift(_)));
    assert!(tables.goto_table[0].contains_key(&tables.symbol_ids["E"]));
    // Exactly one state accepts at EOF.
    let accepting = tables
        .action
        .iter()
        .filter(|row| matches!(row.get(&EOF), Some(Action::Accept)))
        .count();
    assert_eq!(accepting, 1);
}

#[test]
fn table_soundness_test() {
    // Every reachable (state, terminal) holds at most one action by construction;
    // reduce cells never reference the augmented production.
    let mut opts = options();
    opts.mode = Some(TableMode::Lalr1);
    let productions = arithmetic();
    let tables = compile(&productions, &opts).unwrap();
    for row in &tables.action {
        for action in row.values() {
            if let Action::Reduce { production, .. } = action {
                assert!(*production < productions.len());
            }
        }
    }
}

#[test]
fn conflict_detection_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    match compile(&productions, &opts).unwrap_err() {
        GrammarError::Conflict(conflict) => {
            assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
            assert_eq!(conflict.terminal, "+");
            assert!(
                conflict.items.iter().any(|item| item.contains('.')),
                "items should render dotted positions: {:?}",
                conflict.items
            );
        }
        other => panic!("expected a conflict, found {:?}", other),
    }
}

#[test]
fn operator_resolves_conflict_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    opts.operators = operator_table(&[("+", Associativity::Left, 1)]);
    let tables = compile(&productions, &opts).unwrap();
    // Left associativity prefers the reduction on an equal-precedence lookahead.
    let plus = tables.symbol_ids["+"];
    let resolved = tables
        .action
        .iter()
        .filter_map(|row| row.get(&plus))
        .any(|action| matches!(action, Action::Reduce { .. }));
    assert!(resolved);
}

#[test]
fn nonassoc_emits_error_cell_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("=="), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    opts.operators = operator_table(&[("==", Associativity::None, 1)]);
    let tables = compile(&productions, &opts).unwrap();
    let eq = tables.symbol_ids["=="];
    let error_cell = tables
        .action
        .iter()
        .filter_map(|row| row.get(&eq))
        .any(|action| matches!(action, Action::Error(message) if message.contains("non-associative")));
    assert!(error_cell);
}

#[test]
fn precedence_decides_direction_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[nt("E"), t("*"), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    opts.operators = operator_table(&[
        ("+", Associativity::Left, 1),
        ("*", Associativity::Left, 2),
    ]);
    let tables = compile(&productions, &opts).unwrap();
    // After E + E the higher precedence '*' shifts while '+' reduces.
    let plus = tables.symbol_ids["+"];
    let star = tables.symbol_ids["*"];
    let mixed = tables.action.iter().any(|row| {
        matches!(row.get(&plus), Some(Action::Reduce { production: 0, .. }))
            && matches!(row.get(&star), Some(Action::Shift(_)))
    });
    assert!(mixed);
}

#[test]
fn shift_policy_fallback_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    opts.policy = ConflictPolicy::Shift;
    let tables = compile(&productions, &opts).unwrap();
    let plus = tables.symbol_ids["+"];
    // Without operators the fallback policy keeps the shift on every disputed cell,
    // so the binary production never reduces on '+'.
    let binary_reduces = tables
        .action
        .iter()
        .filter_map(|row| row.get(&plus))
        .any(|action| matches!(action, Action::Reduce { production: 0, .. }));
    assert!(!binary_reduces);
}

#[test]
fn operator_filter_overrides_default_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[t("num")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    opts.operators = operator_table(&[("+", Associativity::Left, 1)]);
    // The filter claims no production has an operator, so resolution falls back to
    // the error policy and the conflict surfaces again.
    opts.operator_filter = Some(std::rc::Rc::new(|_: &SimpleProduction| None));
    assert!(matches!(
        compile(&productions, &opts),
        Err(GrammarError::Conflict(_))
    ));
}

#[test]
fn auto_mode_reports_all_conflicts_test() {
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("E", &[nt("E"), t("+"), nt("E")]),
        production("E", &[t("num")]),
    ];
    match compile(&productions, &options()).unwrap_err() {
        GrammarError::Conflicts(conflicts) => {
            assert_eq!(conflicts.len(), 3);
            assert_eq!(conflicts[0].mode, TableMode::Slr);
            assert_eq!(conflicts[1].mode, TableMode::Lalr1);
            assert_eq!(conflicts[2].mode, TableMode::Lr1);
        }
        other => panic!("expected combined diagnostics, found {:?}", other),
    }
}

#[test]
fn auto_mode_falls_back_to_lalr_test() {
    // The classic SLR-inadequate grammar: S -> L = R | R; L -> * R | id; R -> L.
    let t = Symbol::terminal;
    let nt = Symbol::non_terminal;
    let productions = vec![
        production("S", &[nt("L"), t("="), nt("R")]),
        production("S", &[nt("R")]),
        production("L", &[t("*"), nt("R")]),
        production("L", &[t("id")]),
        production("R", &[nt("L")]),
    ];
    let tables = compile(&productions, &options()).unwrap();
    assert_eq!(tables.mode, TableMode::Lalr1);
}

#[test]
fn lalr_merges_states_test() {
    let productions = arithmetic();
    let mut lalr = options();
    lalr.mode = Some(TableMode::Lalr1);
    let mut lr1 = options();
    lr1.mode = Some(TableMode::Lr1);
    let lalr_tables = compile(&productions, &lalr).unwrap();
    let lr1_tables = compile(&productions, &lr1).unwrap();
    assert!(lalr_tables.action.len() <= lr1_tables.action.len());
    // Both settle on the same symbol universe.
    assert_eq!(lalr_tables.symbols, lr1_tables.symbols);
}

#[test]
fn lr0_reduces_on_every_terminal_test() {
    let t = Symbol::terminal;
    let productions = vec![production("S", &[t("a")])];
    let mut opts = options();
    opts.mode = Some(TableMode::Lr0);
    let tables = compile(&productions, &opts).unwrap();
    // The state after shifting 'a' reduces regardless of the lookahead.
    let reduce_row = tables
        .action
        .iter()
        .find(|row| row.values().any(|action| matches!(action, Action::Reduce { .. })))
        .expect("a reducing state must exist");
    assert_eq!(reduce_row.len(), tables.symbols.iter().filter(|s| !s.is_nt).count());
}

#[test]
fn explicit_start_symbol_test() {
    let t = Symbol::terminal;
    let productions = vec![
        production("A", &[t("a")]),
        production("B", &[t("b")]),
    ];
    let mut opts = options();
    opts.start = Some("B".to_string());
    opts.mode = Some(TableMode::Slr);
    let tables = compile(&productions, &opts).unwrap();
    let b = tables.symbol_ids["b"];
    assert!(matches!(tables.action[0].get(&b), Some(Action::Shift(_))));
    assert!(tables.action[0].get(&tables.symbol_ids["a"]).is_none());
}

#[test]
fn mixed_symbol_use_is_rejected_test() {
    let productions = vec![
        production("A", &[Symbol::terminal("B"), Symbol::terminal("x")]),
        production("B", &[Symbol::terminal("y")]),
    ];
    let mut opts = options();
    opts.mode = Some(TableMode::Slr);
    match compile(&productions, &opts).unwrap_err() {
        GrammarError::Definition { message, .. } => {
            assert!(message.contains("both"), "{}", message)
        }
        other => panic!("expected a definition error, found {:?}", other),
    }
}
