//! Rewriting of EBNF grouping, optional, repetition and multiplicity elements into
//! plain productions with synthesized non-terminals and argument adapters.
//!
//! A worklist holds productions still carrying EBNF elements; each pass rewrites the
//! leftmost such element and pushes the results back, so nested constructs unravel one
//! layer at a time. A global deduplication set keyed by `(head, body)` prevents cycles
//! and redundant productions.

use super::{
    fresh_name, ComplexProduction, Element, HandlerModifier, HandlerRef, ModifierInner,
    SimpleProduction,
};
use crate::symbol::Symbol;
use std::collections::{HashSet, VecDeque};

pub(crate) fn lower(
    productions: Vec<ComplexProduction>,
    reserved: &mut HashSet<String>,
) -> Vec<SimpleProduction> {
    let mut queue = VecDeque::new();
    let mut seen: HashSet<(String, Vec<Element>)> = HashSet::new();
    for production in productions {
        enqueue(&mut queue, &mut seen, production);
    }
    let mut lowered = Vec::new();
    while let Some(production) = queue.pop_front() {
        match production.body.iter().position(|element| !element.is_symbol()) {
            None => lowered.push(into_simple(production)),
            Some(at) => {
                for next in rewrite(production, at, reserved) {
                    enqueue(&mut queue, &mut seen, next);
                }
            }
        }
    }
    lowered
}

fn enqueue(
    queue: &mut VecDeque<ComplexProduction>,
    seen: &mut HashSet<(String, Vec<Element>)>,
    production: ComplexProduction,
) {
    let key = (production.head.clone(), production.body.clone());
    if seen.insert(key) {
        queue.push_back(production);
    }
}

fn into_simple(production: ComplexProduction) -> SimpleProduction {
    let body = production
        .body
        .into_iter()
        .filter_map(|element| match element {
            Element::Symbol(Symbol::Epsilon) => None,
            Element::Symbol(symbol) => Some(symbol),
            _ => None,
        })
        .collect();
    SimpleProduction {
        head: production.head,
        body,
        handler: production.handler,
    }
}

/// Apply the rewrite rule of the element at body position `at`; since all elements left
/// of it are plain symbols, `at` is also the argument slot the adapters operate on.
fn rewrite(
    production: ComplexProduction,
    at: usize,
    reserved: &mut HashSet<String>,
) -> Vec<ComplexProduction> {
    let ComplexProduction {
        head,
        body,
        handler,
    } = production;
    let element = body[at].clone();
    let splice = |middle: Vec<Element>| -> Vec<Element> {
        body[..at]
            .iter()
            .cloned()
            .chain(middle)
            .chain(body[at + 1..].iter().cloned())
            .collect()
    };
    let mut rewritten = Vec::new();
    match element {
        Element::Optional {
            inner,
            repeats: None,
        } => {
            rewritten.push(ComplexProduction {
                head: head.clone(),
                body: splice(Vec::new()),
                handler: wrap(&handler, |inner_ref| HandlerModifier::Epsilon {
                    at,
                    inner: inner_ref,
                }),
            });
            rewritten.push(ComplexProduction {
                head,
                body: splice(inner),
                handler,
            });
        }
        Element::Optional {
            inner,
            repeats: Some(bound),
        } => {
            for copies in 0..=bound {
                let mut middle = Vec::new();
                for _ in 0..copies {
                    middle.extend(inner.iter().cloned());
                }
                let count = copies * inner.len();
                rewritten.push(ComplexProduction {
                    head: head.clone(),
                    body: splice(middle),
                    handler: wrap(&handler, |inner_ref| HandlerModifier::Merge {
                        at,
                        count,
                        inner: inner_ref,
                    }),
                });
            }
        }
        Element::Repeat { inner } => {
            let pre = fresh_name(&format!("{}_RPT_PRE", head), |name| {
                reserved.contains(name)
            });
            reserved.insert(pre.clone());
            rewritten.push(ComplexProduction {
                head: pre.clone(),
                body: Vec::new(),
                handler: HandlerRef::Modifier(Box::new(HandlerModifier::Collect)),
            });
            let mut recursive = vec![Element::Symbol(Symbol::NonTerminal(pre.clone()))];
            recursive.extend(inner);
            rewritten.push(ComplexProduction {
                head: pre.clone(),
                body: recursive,
                handler: HandlerRef::Modifier(Box::new(HandlerModifier::Append)),
            });
            rewritten.push(ComplexProduction {
                head,
                body: splice(vec![Element::Symbol(Symbol::NonTerminal(pre))]),
                handler: wrap(&handler, |inner_ref| HandlerModifier::Apply {
                    at,
                    inner: inner_ref,
                }),
            });
        }
        Element::Group {
            alternatives,
            repeats: None,
        } => {
            for alternative in alternatives {
                rewritten.push(ComplexProduction {
                    head: head.clone(),
                    body: splice(alternative),
                    handler: handler.clone(),
                });
            }
        }
        Element::Group {
            alternatives,
            repeats: Some(power),
        } => {
            // Cartesian product of `power` consecutive picks from the alternatives.
            let mut picks: Vec<(Vec<Element>, usize)> = vec![(Vec::new(), 0)];
            for _ in 0..power {
                let mut extended = Vec::new();
                for (sequence, count) in &picks {
                    for alternative in &alternatives {
                        let mut next = sequence.clone();
                        next.extend(alternative.iter().cloned());
                        extended.push((next, count + alternative.len()));
                    }
                }
                picks = extended;
            }
            for (middle, count) in picks {
                rewritten.push(ComplexProduction {
                    head: head.clone(),
                    body: splice(middle),
                    handler: wrap(&handler, |inner_ref| HandlerModifier::Merge {
                        at,
                        count,
                        inner: inner_ref,
                    }),
                });
            }
        }
        Element::Multiple { inner, count } => {
            let middle = (0..count).map(|_| (*inner).clone()).collect();
            rewritten.push(ComplexProduction {
                head,
                body: splice(middle),
                handler: wrap(&handler, |inner_ref| HandlerModifier::Merge {
                    at,
                    count,
                    inner: inner_ref,
                }),
            });
        }
        Element::Symbol(_) => {}
    }
    rewritten
}

fn wrap(
    handler: &HandlerRef,
    make: impl FnOnce(ModifierInner) -> HandlerModifier,
) -> HandlerRef {
    let inner = match handler {
        HandlerRef::None => ModifierInner::Identity,
        HandlerRef::Index(index) => ModifierInner::Handler(*index),
        HandlerRef::Modifier(modifier) => ModifierInner::Nested(modifier.clone()),
    };
    HandlerRef::Modifier(Box::new(make(inner)))
}
