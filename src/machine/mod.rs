//! Compiled automata and their validation cursors.
//!
//! Three machine variants share one outer contract:
//!
//! - `plain`: symbol-indexed integer transition table, for expressions with
//!   no counted ranges and no interleave
//! - `ranges`: transitions carry counter actions (init / check / increment)
//!   for the counted-range operators
//! - `interleave`: a single-state machine over a set of required and
//!   optional symbols (the "all" content model)
//!
//! `build` turns the position-function analysis (or, for interleave, the
//! tree itself) into a machine and performs determinism checking: a second
//! transition wanting an occupied `(symbol, state)` slot means the
//! expression is not 1-unambiguous. A machine is immutable once built;
//! cursors hold all mutable validation state.

mod build;
mod interleave;
mod plain;
mod ranges;


pub(crate) use build::compile;

use interleave::InterleaveCursor;
use plain::PlainCursor;
use ranges::RangeCursor;

#[derive(Clone, Debug)]
pub(crate) enum Machine {
    Plain(plain::PlainMachine),
    Ranges(ranges::RangeMachine),
    Interleave(interleave::InterleaveMachine),
}

impl Machine {
    pub(crate) fn start(&self) -> Cursor<'_> {
        Cursor(match self {
            Machine::Plain(m) => Inner::Plain(m.start()),
            Machine::Ranges(m) => Inner::Ranges(m.start()),
            Machine::Interleave(m) => Inner::Interleave(m.start()),
        })
    }

    pub(crate) fn dump_into(&self, out: &mut String) {
        match self {
            Machine::Plain(m) => m.dump_into(out),
            Machine::Ranges(m) => m.dump_into(out),
            Machine::Interleave(m) => m.dump_into(out),
        }
    }
}

/// Validation cursor over a compiled model.
///
/// A cursor is created by [`CompiledModel::initial_state`] and consumes one
/// symbol per [`step`] call. `step` returns false when the symbol is not
/// acceptable in the current state; the cursor is then left in its
/// pre-step state, but resuming a failed validation is not supported.
/// [`valid`] and [`valid_next_symbols`] never mutate the cursor.
///
/// [`CompiledModel::initial_state`]: crate::CompiledModel::initial_state
/// [`step`]: Cursor::step
/// [`valid`]: Cursor::valid
/// [`valid_next_symbols`]: Cursor::valid_next_symbols
#[derive(Clone, Debug)]
pub struct Cursor<'m>(Inner<'m>);

#[derive(Clone, Debug)]
enum Inner<'m> {
    Plain(PlainCursor<'m>),
    Ranges(RangeCursor<'m>),
    Interleave(InterleaveCursor<'m>),
}

impl<'m> Cursor<'m> {
    /// Consume one symbol. True on success.
    pub fn step(&mut self, symbol: &str) -> bool {
        match &mut self.0 {
            Inner::Plain(c) => c.step(symbol),
            Inner::Ranges(c) => c.step(symbol),
            Inner::Interleave(c) => c.step(symbol),
        }
    }

    /// Would `step(symbol)` succeed right now? Never mutates the cursor.
    pub fn valid(&self, symbol: &str) -> bool {
        match &self.0 {
            Inner::Plain(c) => c.valid(symbol),
            Inner::Ranges(c) => c.valid(symbol),
            Inner::Interleave(c) => c.valid(symbol),
        }
    }

    /// Every symbol on which `valid` currently holds, in no particular
    /// order.
    pub fn valid_next_symbols(&self) -> impl Iterator<Item = &str> + '_ {
        let inner: Box<dyn Iterator<Item = &str> + '_> = match &self.0 {
            Inner::Plain(c) => Box::new(c.valid_next_symbols()),
            Inner::Ranges(c) => Box::new(c.valid_next_symbols()),
            Inner::Interleave(c) => Box::new(c.valid_next_symbols()),
        };
        inner
    }

    /// May the input end here? For the counting machine this includes the
    /// accept-time counter checks of the current state.
    pub fn accepting(&self) -> bool {
        match &self.0 {
            Inner::Plain(c) => c.accepting(),
            Inner::Ranges(c) => c.accepting(),
            Inner::Interleave(c) => c.accepting(),
        }
    }
}
