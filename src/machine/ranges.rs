//! The counting DFA for expressions with ranged repetition.
//!
//! Shape and state numbering are the same as the plain DFA, but each edge
//! is one of five transition kinds that additionally drive the per-range
//! counters held in the cursor:
//!
//! - `Valid`: plain state change
//! - `ToStart`: the edge enters ranges, initializing their counters to 1
//! - `FromEnd`: the edge leaves ranges whose counters must be in bounds
//! - `FromEndToStartNoInc`: leaves some ranges and enters others
//! - `FromEndToStartInc`: the edge closes and reopens one specific range;
//!   increment its counter (failing on overflow), then check the leaving
//!   ranges and initialize the entering ones
//!
//! Every counter action list has already been filtered for relevance at
//! build time, so the executor applies them unconditionally. A failed
//! check or increment rejects the step before any state is written.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::limits::{Counter, Limits};

/// Indices of ranges touched by one transition. Almost always 0–2 long.
pub(crate) type RangeList = SmallVec<[u32; 2]>;

#[derive(Clone, Debug)]
pub(crate) enum Transition {
    Valid {
        to: u32,
    },
    ToStart {
        to: u32,
        inits: RangeList,
    },
    FromEnd {
        to: u32,
        checks: RangeList,
    },
    FromEndToStartNoInc {
        to: u32,
        checks: RangeList,
        inits: RangeList,
    },
    FromEndToStartInc {
        to: u32,
        checks: RangeList,
        inits: RangeList,
        range: u32,
    },
}

impl Transition {
    fn target(&self) -> u32 {
        match self {
            Transition::Valid { to }
            | Transition::ToStart { to, .. }
            | Transition::FromEnd { to, .. }
            | Transition::FromEndToStartNoInc { to, .. }
            | Transition::FromEndToStartInc { to, .. } => *to,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RangeMachine {
    table: FxHashMap<Box<str>, Box<[Option<Transition>]>>,
    /// Final state -> ranges to check when accepting there.
    finals: FxHashMap<u32, RangeList>,
    /// Range index -> limits, shared by every cursor's counters.
    limits: Box<[Limits]>,
    states: usize,
}

impl RangeMachine {
    pub(crate) fn new(states: usize, finals: FxHashMap<u32, RangeList>, limits: Box<[Limits]>) -> Self {
        RangeMachine {
            table: FxHashMap::default(),
            finals,
            limits,
            states,
        }
    }

    /// Add an edge. False when the `(symbol, from)` slot is occupied:
    /// only the empty slot may be written, anything else means the
    /// expression is 1-ambiguous.
    pub(crate) fn add_transition(&mut self, symbol: &str, from: u32, transition: Transition) -> bool {
        let states = self.states;
        let row = self
            .table
            .entry(symbol.into())
            .or_insert_with(|| vec![None; states].into_boxed_slice());
        let slot = &mut row[from as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(transition);
        true
    }

    fn transition(&self, symbol: &str, from: u32) -> Option<&Transition> {
        self.table.get(symbol)?.get(from as usize)?.as_ref()
    }

    pub(crate) fn start(&self) -> RangeCursor<'_> {
        RangeCursor {
            machine: self,
            state: 0,
            counters: vec![Counter::default(); self.limits.len()],
        }
    }

    pub(crate) fn dump_into(&self, out: &mut String) {
        use std::fmt::Write;

        let _ = writeln!(out, "range dfa, {} states", self.states);
        let _ = write!(out, "ranges:");
        for (index, limits) in self.limits.iter().enumerate() {
            let _ = write!(out, " {index}:{limits}");
        }
        let _ = writeln!(out);

        let mut symbols: Vec<&Box<str>> = self.table.keys().collect();
        symbols.sort_unstable();
        for symbol in symbols {
            let _ = write!(out, "  \"{symbol}\":");
            for (from, slot) in self.table[symbol].iter().enumerate() {
                let Some(transition) = slot else { continue };
                let _ = write!(out, " {from} -> {}", transition.target());
                match transition {
                    Transition::Valid { .. } => {}
                    Transition::ToStart { inits, .. } => {
                        let _ = write!(out, " init{inits:?}");
                    }
                    Transition::FromEnd { checks, .. } => {
                        let _ = write!(out, " check{checks:?}");
                    }
                    Transition::FromEndToStartNoInc { checks, inits, .. } => {
                        let _ = write!(out, " check{checks:?} init{inits:?}");
                    }
                    Transition::FromEndToStartInc {
                        checks,
                        inits,
                        range,
                        ..
                    } => {
                        let _ = write!(out, " inc {range} check{checks:?} init{inits:?}");
                    }
                }
                let _ = write!(out, ";");
            }
            let _ = writeln!(out);
        }

        let mut finals: Vec<(&u32, &RangeList)> = self.finals.iter().collect();
        finals.sort_unstable_by_key(|(state, _)| **state);
        let _ = write!(out, "finals:");
        for (state, checks) in finals {
            let _ = write!(out, " {state} check{checks:?}");
        }
        let _ = writeln!(out);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RangeCursor<'m> {
    machine: &'m RangeMachine,
    state: u32,
    counters: Vec<Counter>,
}

impl<'m> RangeCursor<'m> {
    /// Would this transition's increment and checks pass against the
    /// current counters? Read-only; `step` commits separately.
    fn admissible(&self, transition: &Transition) -> bool {
        let limits = &self.machine.limits;
        match transition {
            Transition::Valid { .. } | Transition::ToStart { .. } => true,
            Transition::FromEnd { checks, .. }
            | Transition::FromEndToStartNoInc { checks, .. } => self.checks_pass(checks),
            Transition::FromEndToStartInc { checks, range, .. } => {
                let mut counter = self.counters[*range as usize];
                counter.increment(&limits[*range as usize]) && self.checks_pass(checks)
            }
        }
    }

    fn checks_pass(&self, checks: &RangeList) -> bool {
        checks
            .iter()
            .all(|&r| self.counters[r as usize].check(&self.machine.limits[r as usize]))
    }

    fn commit(&mut self, transition: &Transition) {
        match transition {
            Transition::Valid { .. } | Transition::FromEnd { .. } => {}
            Transition::ToStart { inits, .. }
            | Transition::FromEndToStartNoInc { inits, .. } => self.init_all(inits),
            Transition::FromEndToStartInc { inits, range, .. } => {
                // overflow was ruled out by admissible()
                self.counters[*range as usize].increment(&self.machine.limits[*range as usize]);
                self.init_all(inits);
            }
        }
        self.state = transition.target();
    }

    fn init_all(&mut self, inits: &RangeList) {
        for &r in inits {
            self.counters[r as usize].init();
        }
    }

    pub(crate) fn step(&mut self, symbol: &str) -> bool {
        let Some(transition) = self.machine.transition(symbol, self.state) else {
            return false;
        };
        if !self.admissible(transition) {
            return false;
        }
        let transition = transition.clone();
        self.commit(&transition);
        true
    }

    pub(crate) fn valid(&self, symbol: &str) -> bool {
        self.machine
            .transition(symbol, self.state)
            .is_some_and(|t| self.admissible(t))
    }

    pub(crate) fn valid_next_symbols(&self) -> impl Iterator<Item = &'m str> + '_ {
        self.machine
            .table
            .iter()
            .filter(|(_, row)| {
                row[self.state as usize]
                    .as_ref()
                    .is_some_and(|t| self.admissible(t))
            })
            .map(|(symbol, _)| &**symbol)
    }

    pub(crate) fn accepting(&self) -> bool {
        self.machine
            .finals
            .get(&self.state)
            .is_some_and(|checks| self.checks_pass(checks))
    }
}
