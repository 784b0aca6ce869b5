use super::{HandlerModifier, HandlerRef, ModifierInner};
use crate::ValueImpl;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

pub(crate) type ReduceCallback<V, C> = Rc<dyn Fn(Vec<V>, &mut C) -> Result<V, String>>;

/// A user callback invoked when the parser folds a production body.
///
/// The callback receives the semantic values of the body in grammar order (leftmost
/// first) and a mutable reference to the caller supplied parse context.
/// A returned `Err` aborts the parse and surfaces as a
/// [ParseError](crate::ParseError) of kind [Handler](crate::ParseErrorKind::Handler).
///
/// Handlers created with [named](ReduceHandler::named) can cross a serialization
/// boundary; anonymous handlers cannot.
pub struct ReduceHandler<V, C = ()> {
    pub(crate) name: Option<String>,
    pub(crate) run: ReduceCallback<V, C>,
}

impl<V, C> fmt::Debug for ReduceHandler<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReduceHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl<V, C> ReduceHandler<V, C> {
    pub fn new<F: Fn(Vec<V>, &mut C) -> Result<V, String> + 'static>(f: F) -> Self {
        Self {
            name: None,
            run: Rc::new(f),
        }
    }

    pub fn named<F: Fn(Vec<V>, &mut C) -> Result<V, String> + 'static>(name: &str, f: F) -> Self {
        Self {
            name: Some(name.to_string()),
            run: Rc::new(f),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<V, C> Clone for ReduceHandler<V, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: Rc::clone(&self.run),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One step of a compiled [AdapterProgram], operating on the reduce argument vector.
pub enum AdapterOp {
    /// Insert a null placeholder at the given slot.
    InsertNull { at: usize },
    /// Replace `count` arguments starting at `at` with one aggregated list argument.
    Group { at: usize, count: usize },
    /// Start a collection from the current arguments.
    Collect,
    /// Flatten the leading collection and extend it with the remaining arguments.
    Append,
    /// Hand the finished collection at the given slot through unchanged.
    Apply { at: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A [HandlerModifier] tree flattened into a sequence of argument transformations
/// executed before the (optional) user handler; nothing recurses at parse time.
pub struct AdapterProgram {
    pub ops: Vec<AdapterOp>,
    pub handler: Option<usize>,
}

pub(crate) enum AdapterOutcome<V> {
    Args(Vec<V>),
    Done(V),
}

impl AdapterProgram {
    /// Flatten a nested modifier chain, outermost first.
    pub(crate) fn compile(modifier: &HandlerModifier) -> Self {
        let mut ops = Vec::new();
        let mut handler = None;
        let mut current = Some(modifier);
        while let Some(modifier) = current {
            let inner = match modifier {
                HandlerModifier::Epsilon { at, inner } => {
                    ops.push(AdapterOp::InsertNull { at: *at });
                    Some(inner)
                }
                HandlerModifier::Merge { at, count, inner } => {
                    ops.push(AdapterOp::Group {
                        at: *at,
                        count: *count,
                    });
                    Some(inner)
                }
                HandlerModifier::Apply { at, inner } => {
                    ops.push(AdapterOp::Apply { at: *at });
                    Some(inner)
                }
                HandlerModifier::Collect => {
                    ops.push(AdapterOp::Collect);
                    None
                }
                HandlerModifier::Append => {
                    ops.push(AdapterOp::Append);
                    None
                }
            };
            current = match inner {
                Some(ModifierInner::Nested(next)) => Some(next),
                Some(ModifierInner::Handler(index)) => {
                    handler = Some(*index);
                    None
                }
                Some(ModifierInner::Identity) | None => None,
            };
        }
        Self { ops, handler }
    }

    pub(crate) fn apply_ops<V: ValueImpl>(
        &self,
        mut args: Vec<V>,
    ) -> Result<AdapterOutcome<V>, String> {
        for op in &self.ops {
            match op {
                AdapterOp::InsertNull { at } => {
                    if *at > args.len() {
                        return Err(format!(
                            "argument adapter slot {} is out of range for {} arguments",
                            at,
                            args.len()
                        ));
                    }
                    args.insert(*at, V::null());
                }
                AdapterOp::Group { at, count } => {
                    if at + count > args.len() {
                        return Err(format!(
                            "argument adapter group {}..{} is out of range for {} arguments",
                            at,
                            at + count,
                            args.len()
                        ));
                    }
                    let grouped: Vec<V> =
                        args.splice(*at..*at + *count, std::iter::empty()).collect();
                    args.insert(*at, V::aggregate(grouped));
                }
                AdapterOp::Collect => {
                    return Ok(AdapterOutcome::Done(V::aggregate(args)));
                }
                AdapterOp::Append => {
                    if args.is_empty() {
                        return Err("append adapter applied to an empty argument vector".into());
                    }
                    let head = args.remove(0);
                    let mut collected = match head.into_aggregate() {
                        Ok(list) => list,
                        Err(value) => vec![value],
                    };
                    collected.extend(args);
                    return Ok(AdapterOutcome::Done(V::aggregate(collected)));
                }
                AdapterOp::Apply { at } => {
                    if *at >= args.len() {
                        return Err(format!(
                            "argument adapter slot {} is out of range for {} arguments",
                            at,
                            args.len()
                        ));
                    }
                }
            }
        }
        Ok(AdapterOutcome::Args(args))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The reduction behaviour of one production in a compiled grammar.
pub enum ReduceProgram {
    Identity,
    Handler(usize),
    Adapter(AdapterProgram),
}

impl ReduceProgram {
    pub(crate) fn compile(handler: &HandlerRef) -> Self {
        match handler {
            HandlerRef::None => ReduceProgram::Identity,
            HandlerRef::Index(index) => ReduceProgram::Handler(*index),
            HandlerRef::Modifier(modifier) => {
                ReduceProgram::Adapter(AdapterProgram::compile(modifier))
            }
        }
    }
}
