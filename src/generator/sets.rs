use super::{Generator, EOF};
use std::collections::BTreeSet;

impl Generator<'_> {
    /// FIRST by fixpoint iteration: FIRST(terminal) = {terminal}; a production seeds its
    /// head by scanning body symbols until one does not derive epsilon.
    /// Epsilon membership is tracked through the `nullable` flags.
    pub(crate) fn compute_first(&mut self) {
        self.nullable = vec![false; self.symbols.len()];
        self.first = vec![BTreeSet::new(); self.symbols.len()];
        for (id, entry) in self.symbols.iter().enumerate() {
            if !entry.is_nt {
                self.first[id].insert(id);
            }
        }
        loop {
            let mut changed = false;
            for production in 0..self.bodies.len() {
                let head = self.heads[production];
                let mut all_nullable = true;
                for index in 0..self.bodies[production].len() {
                    let symbol = self.bodies[production][index];
                    let additions: Vec<usize> = self.first[symbol].iter().copied().collect();
                    for terminal in additions {
                        changed |= self.first[head].insert(terminal);
                    }
                    if !self.nullable[symbol] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !self.nullable[head] {
                    self.nullable[head] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// FOLLOW by fixpoint: FOLLOW(start) ⊇ {EOF}; for `A -> αBβ`, FOLLOW(B) ⊇ FIRST(β),
    /// and FOLLOW(B) ⊇ FOLLOW(A) when β derives epsilon.
    pub(crate) fn compute_follow(&mut self) {
        self.follow = vec![BTreeSet::new(); self.symbols.len()];
        self.follow[self.heads[self.augment]].insert(EOF);
        loop {
            let mut changed = false;
            for production in 0..self.bodies.len() {
                let head = self.heads[production];
                for index in 0..self.bodies[production].len() {
                    let symbol = self.bodies[production][index];
                    if !self.symbols[symbol].is_nt {
                        continue;
                    }
                    let mut beta_nullable = true;
                    for offset in index + 1..self.bodies[production].len() {
                        let beta = self.bodies[production][offset];
                        let additions: Vec<usize> = self.first[beta].iter().copied().collect();
                        for terminal in additions {
                            changed |= self.follow[symbol].insert(terminal);
                        }
                        if !self.nullable[beta] {
                            beta_nullable = false;
                            break;
                        }
                    }
                    if beta_nullable {
                        let additions: Vec<usize> = self.follow[head].iter().copied().collect();
                        for terminal in additions {
                            changed |= self.follow[symbol].insert(terminal);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// FIRST of a symbol sequence followed by a lookahead set.
    pub(crate) fn first_of(&self, sequence: &[usize], tail: &BTreeSet<usize>) -> BTreeSet<usize> {
        let mut collected = BTreeSet::new();
        for &symbol in sequence {
            collected.extend(self.first[symbol].iter().copied());
            if !self.nullable[symbol] {
                return collected;
            }
        }
        collected.extend(tail.iter().copied());
        collected
    }
}
