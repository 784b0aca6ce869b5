//! The LR table generator: symbol interning, FIRST/FOLLOW computation, item set
//! construction for LR(0), SLR, LALR(1) and canonical LR(1), and ACTION/GOTO emission
//! with operator precedence conflict resolution.

mod items;
mod sets;
mod table;

#[cfg(test)]
mod __tests__;

use crate::grammar::{fresh_name, Operator, SimpleProduction};
use crate::symbol::Symbol;
use crate::util::Log;
use crate::GrammarError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;

pub(crate) use items::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The item set discipline used to construct the parse tables.
pub enum TableMode {
    /// LR(0) tables: reductions on every terminal.
    Lr0,
    /// LR(0) item sets with reductions restricted by FOLLOW sets.
    Slr,
    /// LR(1) items with states of equal LR(0) kernel merged and lookaheads unioned.
    Lalr1,
    /// Canonical LR(1): no state merging.
    Lr1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fallback for shift/reduce conflicts the operator table cannot resolve.
pub enum ConflictPolicy {
    Shift,
    Reduce,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One cell of the ACTION table.
pub enum Action {
    Shift(usize),
    Reduce {
        head: usize,
        count: usize,
        production: usize,
    },
    Accept,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One row of the interned symbol table; index 0 is the end-of-input terminal.
pub struct SymbolEntry {
    pub name: String,
    pub is_nt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Reduction geometry and rendered text of one production, kept for the driver and for
/// diagnostics after the generator intermediates are discarded.
pub struct ProductionStub {
    pub head: usize,
    pub count: usize,
    pub text: String,
}

pub(crate) const EOF: usize = 0;

pub(crate) struct GeneratorOptions {
    pub start: Option<String>,
    pub eof_name: String,
    pub operators: HashMap<String, Operator>,
    pub policy: ConflictPolicy,
    pub mode: Option<TableMode>,
    pub operator_filter: Option<Rc<dyn Fn(&SimpleProduction) -> Option<String>>>,
    pub log: Log<&'static str>,
}

#[derive(Debug)]
pub(crate) struct Tables {
    pub mode: TableMode,
    pub action: Vec<HashMap<usize, Action>>,
    pub goto_table: Vec<HashMap<usize, usize>>,
    pub start_state: usize,
    pub symbols: Vec<SymbolEntry>,
    pub symbol_ids: HashMap<String, usize>,
    pub stubs: Vec<ProductionStub>,
}

/// Compile plain productions into parse tables.
///
/// With an explicit mode the tables are built once; without one SLR, LALR(1) and
/// canonical LR(1) are tried in that order, and if every mode conflicts the first
/// conflict of each is returned as one combined diagnostic.
pub(crate) fn compile(
    productions: &[SimpleProduction],
    options: &GeneratorOptions,
) -> Result<Tables, GrammarError> {
    let generator = Generator::prepare(productions, options)?;
    match options.mode {
        Some(mode) => generator.tables(mode, options),
        None => {
            let mut conflicts = Vec::new();
            for mode in [TableMode::Slr, TableMode::Lalr1, TableMode::Lr1] {
                match generator.tables(mode, options) {
                    Ok(tables) => {
                        #[cfg(debug_assertions)]
                        if options.log.order() >= Log::Verbose(()).order() {
                            println!("[{}; Generator]: {:?} tables selected", options.log, mode);
                        }
                        return Ok(tables);
                    }
                    Err(GrammarError::Conflict(conflict)) => conflicts.push(conflict),
                    Err(other) => return Err(other),
                }
            }
            Err(GrammarError::Conflicts(conflicts))
        }
    }
}

/// Working state of one table construction run; discarded once the tables are emitted.
pub(crate) struct Generator<'g> {
    source: &'g [SimpleProduction],
    symbols: Vec<SymbolEntry>,
    ids: HashMap<String, usize>,
    heads: Vec<usize>,
    bodies: Vec<Vec<usize>>,
    prods_of: Vec<Vec<usize>>,
    nullable: Vec<bool>,
    first: Vec<BTreeSet<usize>>,
    follow: Vec<BTreeSet<usize>>,
    augment: usize,
    start_symbol: usize,
    terminals: Vec<usize>,
}

impl<'g> Generator<'g> {
    fn prepare(
        productions: &'g [SimpleProduction],
        options: &GeneratorOptions,
    ) -> Result<Self, GrammarError> {
        let mut generator = Generator {
            source: productions,
            symbols: Vec::new(),
            ids: HashMap::new(),
            heads: Vec::new(),
            bodies: Vec::new(),
            prods_of: Vec::new(),
            nullable: Vec::new(),
            first: Vec::new(),
            follow: Vec::new(),
            augment: 0,
            start_symbol: 0,
            terminals: Vec::new(),
        };
        generator.intern(&options.eof_name, false)?;
        for production in productions {
            generator.intern(&production.head, true)?;
        }
        for production in productions {
            let head = generator.intern(&production.head, true)?;
            let mut body = Vec::new();
            for symbol in &production.body {
                let id = match symbol {
                    Symbol::Terminal(name) => generator.intern(name, false)?,
                    Symbol::NonTerminal(name) => generator.intern(name, true)?,
                    Symbol::Epsilon => continue,
                };
                body.push(id);
            }
            generator.heads.push(head);
            generator.bodies.push(body);
        }

        let start_symbol = match &options.start {
            Some(name) => match generator.ids.get(name) {
                Some(&id) if generator.symbols[id].is_nt => id,
                Some(_) => {
                    return Err(GrammarError::definition(
                        "Generator",
                        format!("Start symbol '{}' is a terminal.", name),
                    ));
                }
                None => {
                    return Err(GrammarError::definition(
                        "Generator",
                        format!("Start symbol '{}' is not defined.", name),
                    ));
                }
            },
            None => generator.heads[0],
        };
        generator.start_symbol = start_symbol;

        let augment_name = fresh_name("__GLOBAL", |name| generator.ids.contains_key(name));
        let augment_symbol = generator.intern(&augment_name, true)?;
        generator.heads.push(augment_symbol);
        generator.bodies.push(vec![start_symbol]);
        generator.augment = generator.bodies.len() - 1;

        generator.prods_of = vec![Vec::new(); generator.symbols.len()];
        for (production, &head) in generator.heads.iter().enumerate() {
            generator.prods_of[head].push(production);
        }
        for (id, entry) in generator.symbols.iter().enumerate() {
            if entry.is_nt && generator.prods_of[id].is_empty() {
                return Err(GrammarError::definition(
                    "Generator",
                    format!("Non-terminal '{}' has no production.", entry.name),
                ));
            }
        }
        generator.terminals = generator
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_nt)
            .map(|(id, _)| id)
            .collect();

        generator.compute_first();
        generator.compute_follow();
        Ok(generator)
    }

    fn intern(&mut self, name: &str, is_nt: bool) -> Result<usize, GrammarError> {
        if let Some(&id) = self.ids.get(name) {
            if self.symbols[id].is_nt != is_nt {
                return Err(GrammarError::definition(
                    "Generator",
                    format!(
                        "Symbol '{}' is used as both a terminal and a non-terminal.",
                        name
                    ),
                ));
            }
            return Ok(id);
        }
        let id = self.symbols.len();
        self.symbols.push(SymbolEntry {
            name: name.to_string(),
            is_nt,
        });
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub(crate) fn symbol_ahead(&self, item: Item) -> Option<usize> {
        self.bodies[item.production].get(item.dot).copied()
    }

    fn stub(&self, production: usize) -> ProductionStub {
        let text = match self.source.get(production) {
            Some(source) => format!("{}", source),
            None => format!(
                "{} -> {}",
                self.symbols[self.heads[production]].name,
                self.symbols[self.start_symbol].name
            ),
        };
        ProductionStub {
            head: self.heads[production],
            count: self.bodies[production].len(),
            text,
        }
    }

    fn stubs(&self) -> Vec<ProductionStub> {
        (0..self.bodies.len())
            .map(|production| self.stub(production))
            .collect()
    }

    /// Render a dotted item for diagnostics.
    pub(crate) fn item_text(&self, item: Item) -> String {
        let mut rendered = format!("{} ->", self.symbols[self.heads[item.production]].name);
        let body = &self.bodies[item.production];
        for (index, &symbol) in body.iter().enumerate() {
            if index == item.dot {
                rendered.push_str(" .");
            }
            let _ = write!(rendered, " {}", self.symbols[symbol].name);
        }
        if item.dot == body.len() {
            rendered.push_str(" .");
        }
        rendered
    }
}
