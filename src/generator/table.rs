use super::items::LaItems;
use super::{
    Action, ConflictPolicy, Generator, GeneratorOptions, Item, TableMode, Tables, EOF,
};
use crate::grammar::Operator;
use crate::{Associativity, Conflict, ConflictKind, GrammarError};
use std::collections::{BTreeSet, HashMap, VecDeque};

struct Automaton0 {
    states: Vec<BTreeSet<Item>>,
    transitions: Vec<((usize, usize), usize)>,
}

struct Automaton1 {
    states: Vec<LaItems>,
    transitions: Vec<((usize, usize), usize)>,
}

type LaKey = Vec<(Item, Vec<usize>)>;

impl<'g> Generator<'g> {
    pub(crate) fn tables(
        &self,
        mode: TableMode,
        options: &GeneratorOptions,
    ) -> Result<Tables, GrammarError> {
        match mode {
            TableMode::Lr0 | TableMode::Slr => self.emit0(self.build_lr0(), mode, options),
            TableMode::Lalr1 => self.emit1(self.build_la(true)?, mode, options),
            TableMode::Lr1 => self.emit1(self.build_la(false)?, mode, options),
        }
    }

    /// Worklist construction of the LR(0) item set collection.
    fn build_lr0(&self) -> Automaton0 {
        let mut seed = BTreeSet::new();
        seed.insert(Item {
            production: self.augment,
            dot: 0,
        });
        let start = self.closure0(seed);
        let mut key_of: HashMap<Vec<Item>, usize> = HashMap::new();
        key_of.insert(start.iter().copied().collect(), 0);
        let mut states = vec![start];
        let mut transitions = HashMap::new();
        let mut queue = VecDeque::from([0usize]);
        while let Some(state) = queue.pop_front() {
            let outgoing: BTreeSet<usize> = states[state]
                .iter()
                .filter_map(|&item| self.symbol_ahead(item))
                .collect();
            for symbol in outgoing {
                let next = self.goto0(&states[state], symbol);
                let key: Vec<Item> = next.iter().copied().collect();
                let target = match key_of.get(&key) {
                    Some(&target) => target,
                    None => {
                        let target = states.len();
                        states.push(next);
                        key_of.insert(key, target);
                        queue.push_back(target);
                        target
                    }
                };
                transitions.insert((state, symbol), target);
            }
        }
        Automaton0 {
            states,
            transitions: sorted(transitions),
        }
    }

    /// Worklist construction of the LR(1) collection.
    ///
    /// With `merge_kernels` two states sharing the same LR(0) item skeleton are one
    /// state whose reducible lookaheads are the union of every contributor; a state
    /// whose lookaheads grew is queued again so the growth propagates through its
    /// gotos and re-emits any new reduce actions.
    fn build_la(&self, merge_kernels: bool) -> Result<Automaton1, GrammarError> {
        let mut seed: LaItems = LaItems::new();
        seed.insert(
            Item {
                production: self.augment,
                dot: 0,
            },
            BTreeSet::from([EOF]),
        );
        let start = self.closure1(seed);
        let key = |items: &LaItems| -> LaKey {
            items
                .iter()
                .map(|(&item, lookaheads)| {
                    let lookaheads = if merge_kernels {
                        Vec::new()
                    } else {
                        lookaheads.iter().copied().collect()
                    };
                    (item, lookaheads)
                })
                .collect()
        };
        let mut key_of: HashMap<LaKey, usize> = HashMap::new();
        key_of.insert(key(&start), 0);
        let mut states = vec![start];
        let mut transitions = HashMap::new();
        let mut queue = VecDeque::from([0usize]);
        while let Some(state) = queue.pop_front() {
            let items = states[state].clone();
            let outgoing: BTreeSet<usize> = items
                .keys()
                .filter_map(|&item| self.symbol_ahead(item))
                .collect();
            for symbol in outgoing {
                let next = self.goto1(&items, symbol);
                let next_key = key(&next);
                match key_of.get(&next_key) {
                    Some(&target) => {
                        transitions.insert((state, symbol), target);
                        if merge_kernels {
                            let mut grew = false;
                            for (item, lookaheads) in next {
                                let entry = states[target].get_mut(&item).ok_or_else(|| {
                                    GrammarError::InvalidProductionIndex {
                                        index: item.production,
                                        message: format!(
                                            "item '{}' is missing from the kernel-equal state {}",
                                            self.item_text(item),
                                            target
                                        ),
                                    }
                                })?;
                                for lookahead in lookaheads {
                                    grew |= entry.insert(lookahead);
                                }
                            }
                            if grew {
                                queue.push_back(target);
                            }
                        }
                    }
                    None => {
                        let target = states.len();
                        states.push(next);
                        key_of.insert(next_key, target);
                        transitions.insert((state, symbol), target);
                        queue.push_back(target);
                    }
                }
            }
        }
        Ok(Automaton1 {
            states,
            transitions: sorted(transitions),
        })
    }

    fn emit0(
        &self,
        automaton: Automaton0,
        mode: TableMode,
        options: &GeneratorOptions,
    ) -> Result<Tables, GrammarError> {
        let mut emitter = Emitter::new(self, options, mode, automaton.states.len());
        for &((state, symbol), target) in &automaton.transitions {
            let origin = || self.shift_origin0(&automaton.states[state], symbol);
            emitter.edge(state, symbol, target, origin)?;
        }
        for (state, items) in automaton.states.iter().enumerate() {
            for &item in items {
                if self.symbol_ahead(item).is_some() {
                    continue;
                }
                let lookaheads: Vec<usize> = match mode {
                    TableMode::Slr => self.follow[self.heads[item.production]]
                        .iter()
                        .copied()
                        .collect(),
                    _ => self.terminals.clone(),
                };
                emitter.reduce(state, item, &lookaheads)?;
            }
        }
        Ok(emitter.finish())
    }

    fn emit1(
        &self,
        automaton: Automaton1,
        mode: TableMode,
        options: &GeneratorOptions,
    ) -> Result<Tables, GrammarError> {
        let mut emitter = Emitter::new(self, options, mode, automaton.states.len());
        for &((state, symbol), target) in &automaton.transitions {
            let origin = || self.shift_origin1(&automaton.states[state], symbol);
            emitter.edge(state, symbol, target, origin)?;
        }
        for (state, items) in automaton.states.iter().enumerate() {
            for (&item, lookaheads) in items {
                if self.symbol_ahead(item).is_some() {
                    continue;
                }
                let lookaheads: Vec<usize> = lookaheads.iter().copied().collect();
                emitter.reduce(state, item, &lookaheads)?;
            }
        }
        Ok(emitter.finish())
    }

    fn shift_origin0(&self, items: &BTreeSet<Item>, symbol: usize) -> String {
        items
            .iter()
            .find(|&&item| self.symbol_ahead(item) == Some(symbol))
            .map(|&item| self.item_text(item))
            .unwrap_or_else(|| format!("shift on '{}'", self.symbols[symbol].name))
    }

    fn shift_origin1(&self, items: &LaItems, symbol: usize) -> String {
        items
            .keys()
            .find(|&&item| self.symbol_ahead(item) == Some(symbol))
            .map(|&item| self.item_text(item))
            .unwrap_or_else(|| format!("shift on '{}'", self.symbols[symbol].name))
    }
}

fn sorted(transitions: HashMap<(usize, usize), usize>) -> Vec<((usize, usize), usize)> {
    let mut edges: Vec<_> = transitions.into_iter().collect();
    edges.sort();
    edges
}

/// Fills the ACTION and GOTO tables, resolving collisions through the operator table.
struct Emitter<'e, 'g> {
    generator: &'e Generator<'g>,
    options: &'e GeneratorOptions,
    mode: TableMode,
    action: Vec<HashMap<usize, Action>>,
    origins: Vec<HashMap<usize, String>>,
    goto_table: Vec<HashMap<usize, usize>>,
}

impl<'e, 'g> Emitter<'e, 'g> {
    fn new(
        generator: &'e Generator<'g>,
        options: &'e GeneratorOptions,
        mode: TableMode,
        states: usize,
    ) -> Self {
        Self {
            generator,
            options,
            mode,
            action: vec![HashMap::new(); states],
            origins: vec![HashMap::new(); states],
            goto_table: vec![HashMap::new(); states],
        }
    }

    fn edge(
        &mut self,
        state: usize,
        symbol: usize,
        target: usize,
        origin: impl FnOnce() -> String,
    ) -> Result<(), GrammarError> {
        if self.generator.symbols[symbol].is_nt {
            self.goto_table[state].insert(symbol, target);
            Ok(())
        } else {
            self.place(state, symbol, Action::Shift(target), origin())
        }
    }

    fn reduce(
        &mut self,
        state: usize,
        item: Item,
        lookaheads: &[usize],
    ) -> Result<(), GrammarError> {
        if item.production >= self.generator.bodies.len() {
            return Err(GrammarError::InvalidProductionIndex {
                index: item.production,
                message: "a reducible item references a production outside the grammar"
                    .to_string(),
            });
        }
        let text = self.generator.item_text(item);
        if item.production == self.generator.augment {
            if lookaheads.contains(&EOF) {
                self.place(state, EOF, Action::Accept, text)?;
            }
            return Ok(());
        }
        let action = Action::Reduce {
            head: self.generator.heads[item.production],
            count: self.generator.bodies[item.production].len(),
            production: item.production,
        };
        for &lookahead in lookaheads {
            self.place(state, lookahead, action.clone(), text.clone())?;
        }
        Ok(())
    }

    fn place(
        &mut self,
        state: usize,
        terminal: usize,
        incoming: Action,
        origin: String,
    ) -> Result<(), GrammarError> {
        let existing = match self.action[state].get(&terminal) {
            None => {
                self.action[state].insert(terminal, incoming);
                self.origins[state].insert(terminal, origin);
                return Ok(());
            }
            Some(existing) if *existing == incoming => return Ok(()),
            Some(existing) => existing.clone(),
        };
        let held_origin = self.origins[state]
            .get(&terminal)
            .cloned()
            .unwrap_or_default();
        let resolved = self.resolve(state, terminal, &existing, &incoming, &held_origin, &origin)?;
        if resolved != existing {
            self.action[state].insert(terminal, resolved);
            self.origins[state].insert(terminal, origin);
        }
        Ok(())
    }

    fn conflict(
        &self,
        kind: ConflictKind,
        state: usize,
        terminal: usize,
        items: [String; 2],
    ) -> GrammarError {
        GrammarError::Conflict(Conflict {
            kind,
            mode: self.mode,
            state,
            terminal: self.generator.symbols[terminal].name.clone(),
            items,
        })
    }

    fn resolve(
        &self,
        state: usize,
        terminal: usize,
        existing: &Action,
        incoming: &Action,
        existing_origin: &str,
        incoming_origin: &str,
    ) -> Result<Action, GrammarError> {
        let items = [existing_origin.to_string(), incoming_origin.to_string()];
        match (existing, incoming) {
            (Action::Shift(_), Action::Shift(_)) => {
                Err(self.conflict(ConflictKind::ShiftShift, state, terminal, items))
            }
            (Action::Reduce { .. }, Action::Reduce { .. })
            | (Action::Accept, _)
            | (_, Action::Accept)
            | (Action::Error(_), _)
            | (_, Action::Error(_)) => {
                Err(self.conflict(ConflictKind::ReduceReduce, state, terminal, items))
            }
            (Action::Shift(_), Action::Reduce { production, .. }) => self.shift_reduce(
                state,
                terminal,
                existing.clone(),
                incoming.clone(),
                *production,
                items,
            ),
            (Action::Reduce { production, .. }, Action::Shift(_)) => self.shift_reduce(
                state,
                terminal,
                incoming.clone(),
                existing.clone(),
                *production,
                [items[1].clone(), items[0].clone()],
            ),
        }
    }

    /// Operator precedence resolution of a shift/reduce collision.
    ///
    /// `items` holds the shift origin first, the reduce origin second.
    fn shift_reduce(
        &self,
        state: usize,
        terminal: usize,
        shift: Action,
        reduce: Action,
        production: usize,
        items: [String; 2],
    ) -> Result<Action, GrammarError> {
        let terminal_name = &self.generator.symbols[terminal].name;
        let shift_operator = self.options.operators.get(terminal_name);
        let reduce_operator = self.production_operator(production);
        if let (Some(shift_operator), Some(reduce_operator)) = (shift_operator, reduce_operator) {
            if shift_operator.precedence > reduce_operator.precedence {
                return Ok(shift);
            }
            if shift_operator.precedence < reduce_operator.precedence {
                return Ok(reduce);
            }
            return Ok(match reduce_operator.assoc {
                Associativity::Left => reduce,
                Associativity::Right => shift,
                Associativity::None => {
                    Action::Error(format!("non-associative operator '{}'", terminal_name))
                }
            });
        }
        match self.options.policy {
            ConflictPolicy::Shift => Ok(shift),
            ConflictPolicy::Reduce => Ok(reduce),
            ConflictPolicy::Error => {
                Err(self.conflict(ConflictKind::ShiftReduce, state, terminal, items))
            }
        }
    }

    /// The operator of a production: a user filter when present, else the last body
    /// terminal found in the operator table.
    fn production_operator(&self, production: usize) -> Option<&Operator> {
        if let Some(filter) = &self.options.operator_filter {
            let source = self.generator.source.get(production)?;
            let name = filter(source)?;
            return self.options.operators.get(&name);
        }
        for &symbol in self.generator.bodies[production].iter().rev() {
            let entry = &self.generator.symbols[symbol];
            if !entry.is_nt {
                if let Some(operator) = self.options.operators.get(&entry.name) {
                    return Some(operator);
                }
            }
        }
        None
    }

    fn finish(self) -> Tables {
        Tables {
            mode: self.mode,
            action: self.action,
            goto_table: self.goto_table,
            start_state: 0,
            symbols: self.generator.symbols.clone(),
            symbol_ids: self.generator.ids.clone(),
            stubs: self.generator.stubs(),
        }
    }
}
