//! The interleave ("all" content model) machine.
//!
//! All children of the `&` operator must appear, in any order, each at
//! most once; a `?`-wrapped child may be absent. No transition table is
//! needed: the validation state is the set of symbols already consumed.

use rustc_hash::FxHashMap;

use crate::posset::PosSet;

#[derive(Clone, Copy, Debug)]
struct Entry {
    index: u32,
    optional: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct InterleaveMachine {
    entries: FxHashMap<Box<str>, Entry>,
    /// Symbols in declaration order, for dumps.
    order: Vec<Box<str>>,
}

impl InterleaveMachine {
    pub(crate) fn new() -> Self {
        InterleaveMachine::default()
    }

    /// Register a child symbol. False on a duplicate, which makes the
    /// content model ambiguous.
    pub(crate) fn add_symbol(&mut self, symbol: &str, optional: bool) -> bool {
        let index = self.order.len() as u32;
        if self.entries.contains_key(symbol) {
            return false;
        }
        self.entries.insert(symbol.into(), Entry { index, optional });
        self.order.push(symbol.into());
        true
    }

    pub(crate) fn start(&self) -> InterleaveCursor<'_> {
        InterleaveCursor {
            machine: self,
            consumed: PosSet::new(),
        }
    }

    pub(crate) fn dump_into(&self, out: &mut String) {
        use std::fmt::Write;

        let _ = writeln!(out, "interleave, {} symbols", self.order.len());
        let _ = write!(out, " ");
        for symbol in &self.order {
            let entry = self.entries[symbol];
            let mark = if entry.optional { "?" } else { "" };
            let _ = write!(out, " \"{symbol}\"{mark}");
        }
        let _ = writeln!(out);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct InterleaveCursor<'m> {
    machine: &'m InterleaveMachine,
    consumed: PosSet,
}

impl<'m> InterleaveCursor<'m> {
    pub(crate) fn step(&mut self, symbol: &str) -> bool {
        match self.machine.entries.get(symbol) {
            Some(entry) if !self.consumed.contains(entry.index) => {
                self.consumed.insert(entry.index);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn valid(&self, symbol: &str) -> bool {
        self.machine
            .entries
            .get(symbol)
            .is_some_and(|entry| !self.consumed.contains(entry.index))
    }

    pub(crate) fn valid_next_symbols(&self) -> impl Iterator<Item = &'m str> + '_ {
        self.machine
            .entries
            .iter()
            .filter(|(_, entry)| !self.consumed.contains(entry.index))
            .map(|(symbol, _)| &**symbol)
    }

    pub(crate) fn accepting(&self) -> bool {
        self.machine
            .entries
            .values()
            .all(|entry| entry.optional || self.consumed.contains(entry.index))
    }
}
