//! The plain DFA: no counted ranges, no interleave.
//!
//! States are the expression positions themselves; state 0 is the start
//! state and is never the target of any edge, so 0 doubles as the
//! no-transition sentinel inside the rows.

use rustc_hash::FxHashMap;

use crate::posset::PosSet;

const NO_TRANSITION: u32 = 0;

/// Symbol-indexed transition table plus the set of final states.
#[derive(Clone, Debug, Default)]
pub(crate) struct PlainMachine {
    /// Symbol -> row of `states` entries; `row[from]` is the target state
    /// or `NO_TRANSITION`.
    table: FxHashMap<Box<str>, Box<[u32]>>,
    finals: PosSet,
    states: usize,
}

impl PlainMachine {
    pub(crate) fn new(states: usize, finals: PosSet) -> Self {
        PlainMachine {
            table: FxHashMap::default(),
            finals,
            states,
        }
    }

    /// Add an edge. False when the `(symbol, from)` slot already holds a
    /// different target; the expression is 1-ambiguous.
    pub(crate) fn add_transition(&mut self, symbol: &str, from: u32, to: u32) -> bool {
        debug_assert!(to != NO_TRANSITION, "state 0 is never an edge target");
        let states = self.states;
        let row = self
            .table
            .entry(symbol.into())
            .or_insert_with(|| vec![NO_TRANSITION; states].into_boxed_slice());
        let slot = &mut row[from as usize];
        if *slot != NO_TRANSITION && *slot != to {
            return false;
        }
        *slot = to;
        true
    }

    fn transition(&self, symbol: &str, from: u32) -> Option<u32> {
        let to = *self.table.get(symbol)?.get(from as usize)?;
        (to != NO_TRANSITION).then_some(to)
    }

    pub(crate) fn start(&self) -> PlainCursor<'_> {
        PlainCursor {
            machine: self,
            state: 0,
        }
    }

    pub(crate) fn dump_into(&self, out: &mut String) {
        use std::fmt::Write;

        let _ = writeln!(out, "plain dfa, {} states", self.states);
        let mut symbols: Vec<&Box<str>> = self.table.keys().collect();
        symbols.sort_unstable();
        for symbol in symbols {
            let _ = write!(out, "  \"{symbol}\":");
            for (from, &to) in self.table[symbol].iter().enumerate() {
                if to != NO_TRANSITION {
                    let _ = write!(out, " {from} -> {to}");
                }
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "finals: {:?}", self.finals);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PlainCursor<'m> {
    machine: &'m PlainMachine,
    state: u32,
}

impl<'m> PlainCursor<'m> {
    pub(crate) fn step(&mut self, symbol: &str) -> bool {
        match self.machine.transition(symbol, self.state) {
            Some(to) => {
                self.state = to;
                true
            }
            None => false,
        }
    }

    pub(crate) fn valid(&self, symbol: &str) -> bool {
        self.machine.transition(symbol, self.state).is_some()
    }

    pub(crate) fn valid_next_symbols(&self) -> impl Iterator<Item = &'m str> + '_ {
        self.machine
            .table
            .iter()
            .filter(|(_, row)| row[self.state as usize] != NO_TRANSITION)
            .map(|(symbol, _)| &**symbol)
    }

    pub(crate) fn accepting(&self) -> bool {
        self.machine.finals.contains(self.state)
    }
}
