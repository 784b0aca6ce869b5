use super::Generator;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// An LR(0) item: a production with a parse position.
///
/// `dot == 0` means "at start"; `dot == |body|` means "reducible".
pub(crate) struct Item {
    pub production: usize,
    pub dot: usize,
}

impl Item {
    pub(crate) fn next(self) -> Self {
        Item {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

/// An LR(1) state: items ordered canonically, each carrying its lookahead set.
pub(crate) type LaItems = BTreeMap<Item, BTreeSet<usize>>;

impl Generator<'_> {
    /// Least fixpoint of expanding non-terminals appearing after the dot.
    pub(crate) fn closure0(&self, mut items: BTreeSet<Item>) -> BTreeSet<Item> {
        let mut queue: VecDeque<Item> = items.iter().copied().collect();
        while let Some(item) = queue.pop_front() {
            if let Some(symbol) = self.symbol_ahead(item) {
                if self.symbols[symbol].is_nt {
                    for &production in &self.prods_of[symbol] {
                        let added = Item { production, dot: 0 };
                        if items.insert(added) {
                            queue.push_back(added);
                        }
                    }
                }
            }
        }
        items
    }

    /// LR(1) closure: expanding `[A -> α.Bβ, a]` seeds `B` items with FIRST(βa).
    pub(crate) fn closure1(&self, kernel: LaItems) -> LaItems {
        let mut queue: VecDeque<(Item, usize)> = kernel
            .iter()
            .flat_map(|(item, lookaheads)| lookaheads.iter().map(move |&la| (*item, la)))
            .collect();
        let mut items = kernel;
        while let Some((item, lookahead)) = queue.pop_front() {
            let symbol = match self.symbol_ahead(item) {
                Some(symbol) if self.symbols[symbol].is_nt => symbol,
                _ => continue,
            };
            let beta = &self.bodies[item.production][item.dot + 1..];
            let mut tail = BTreeSet::new();
            tail.insert(lookahead);
            let lookaheads = self.first_of(beta, &tail);
            for &production in &self.prods_of[symbol] {
                let added = Item { production, dot: 0 };
                let entry = items.entry(added).or_default();
                for &la in &lookaheads {
                    if entry.insert(la) {
                        queue.push_back((added, la));
                    }
                }
            }
        }
        items
    }

    /// Advance the dot past `symbol` for every item expecting it, then close.
    pub(crate) fn goto0(&self, items: &BTreeSet<Item>, symbol: usize) -> BTreeSet<Item> {
        let kernel = items
            .iter()
            .filter(|&&item| self.symbol_ahead(item) == Some(symbol))
            .map(|&item| item.next())
            .collect();
        self.closure0(kernel)
    }

    pub(crate) fn goto1(&self, items: &LaItems, symbol: usize) -> LaItems {
        let kernel = items
            .iter()
            .filter(|(&item, _)| self.symbol_ahead(item) == Some(symbol))
            .map(|(&item, lookaheads)| (item.next(), lookaheads.clone()))
            .collect();
        self.closure1(kernel)
    }
}
