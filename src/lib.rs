//! contentmodel: deterministic validation of XML-style content models
//!
//! Compiles a restricted class of regular expressions over string symbols
//! (concatenation `,`, alternation `|`, interleave `&`, postfix `? * +`,
//! counted ranges `[m,n]` and an explicit empty symbol) into a
//! deterministic automaton, then validates comma/whitespace-separated
//! symbol sequences against it. The expression must be 1-unambiguous
//! (parsable left to right without lookahead); if it is not, compilation
//! fails with a diagnostic instead of producing a machine that guesses.
//!
//! ```
//! use contentmodel::Compiler;
//!
//! let mut compiler = Compiler::new("section");
//! compiler.parse("heading,(para|list)*,note?").unwrap();
//! let model = compiler.compile().unwrap();
//!
//! assert!(model.validate("heading, para, para, note"));
//! assert!(model.validate("heading"));
//! assert!(!model.validate("note, heading"));
//! ```
//!
//! Counted ranges compile into a DFA whose edges drive per-range counters,
//! so `a[2,3]` costs one counter, not three states. Ambiguous expressions
//! are rejected at compile time:
//!
//! ```
//! use contentmodel::Compiler;
//!
//! let mut compiler = Compiler::new("bad");
//! compiler.parse("a*|(a,b)").unwrap();
//! assert!(compiler.compile().is_err());
//! ```
//!
//! A [`CompiledModel`] is immutable and may be shared freely across
//! threads; each validation runs on its own [`Cursor`].

mod analysis;
mod builder;
mod limits;
mod machine;
mod parser;
mod posset;
mod tokenizer;
mod tree;

pub use builder::{Compiler, ExpressionOps, RpnCompiler};
pub use machine::Cursor;
pub use tokenizer::tokenize;

use machine::Machine;

/// Errors raised while building or compiling a content model. Validation
/// itself never errors; cursor methods return plain booleans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModelError {
    /// A `[min,max]` pair that is not well-formed. `max` of `None` is the
    /// unbounded maximum.
    BadLimits { min: i64, max: Option<i64> },
    /// The expression is not deterministic: two transitions compete for
    /// one `(symbol, state)` slot, two ranges share a boundary pair, or an
    /// interleave lists one symbol twice.
    AmbiguousContentModel {
        symbol: String,
        detail: &'static str,
    },
    /// A structural defect in the expression tree: operators with missing
    /// operands, unbalanced grouping, a misplaced interleave.
    MalformedTree(String),
}

impl std::fmt::Display for ContentModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentModelError::BadLimits { min, max } => {
                write!(f, "bad limits: min = {min}, max = ")?;
                match max {
                    Some(max) => write!(f, "{max}"),
                    None => write!(f, "*"),
                }
            }
            ContentModelError::AmbiguousContentModel { symbol, detail } => {
                write!(f, "ambiguous content model ({detail}): \"{symbol}\"")
            }
            ContentModelError::MalformedTree(message) => {
                write!(f, "malformed content model: {message}")
            }
        }
    }
}

impl std::error::Error for ContentModelError {}

/// A compiled, immutable content model.
///
/// Produced by [`Compiler::compile`] or [`RpnCompiler::compile`]. The
/// model is read-only; all validation state lives in cursors created by
/// [`initial_state`](CompiledModel::initial_state), so one model can
/// serve any number of concurrent validations.
#[derive(Clone, Debug)]
pub struct CompiledModel {
    pub(crate) name: Box<str>,
    pub(crate) expression: Box<str>,
    pub(crate) symbols: Box<[Box<str>]>,
    pub(crate) machine: Machine,
}

impl CompiledModel {
    /// The name given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The expression in canonical textual form.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The unique symbol strings of the alphabet, in first-appearance
    /// order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(|s| &**s)
    }

    /// A fresh validation cursor positioned at the start state.
    pub fn initial_state(&self) -> Cursor<'_> {
        self.machine.start()
    }

    /// Tokenize `input` (comma/whitespace separated), feed every token to
    /// a fresh cursor and return whether the cursor accepts at the end.
    /// Empty input is valid exactly when the model is nullable.
    pub fn validate(&self, input: &str) -> bool {
        let mut cursor = self.initial_state();
        for token in tokenize(input) {
            if !cursor.step(token) {
                return false;
            }
        }
        cursor.accepting()
    }

    /// Render the compiled automaton (transition table, counter actions,
    /// final states) for debugging.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "model \"{}\": {}", self.name, self.expression);
        self.machine.dump_into(&mut out);
        out
    }
}

impl std::fmt::Display for CompiledModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}
