//! Machine synthesis: syntax tree -> compiled automaton.
//!
//! Variant selection: an interleave root gets the interleave machine; an
//! expression with at least one counted range gets the counting DFA;
//! everything else gets the plain DFA. Both DFAs derive their edges the
//! same way (state 0 over `firstpos(root)`, every other state over its
//! position's `followpos`) and differ only in what an edge carries.
//!
//! 1-ambiguity is detected here: each `(symbol, state)` slot may be
//! written once. Range ambiguity was already detected by the analysis
//! pass when it built the boundary-pair map.

use rustc_hash::FxHashMap;

use super::interleave::InterleaveMachine;
use super::plain::PlainMachine;
use super::ranges::{RangeList, RangeMachine, Transition};
use super::Machine;
use crate::analysis::{analyze, Analysis};
use crate::builder::Workspace;
use crate::posset::PosSet;
use crate::tree::{self, NaryOp, Node, UnaryOp};
use crate::{CompiledModel, ContentModelError};

pub(crate) fn compile(
    ws: Workspace,
    root: Option<Node>,
) -> Result<CompiledModel, ContentModelError> {
    let machine = match &root {
        // an empty expression accepts exactly the empty input
        None => Machine::Plain(PlainMachine::new(1, PosSet::singleton(0))),
        Some(root) => {
            tree::check(root)?;
            match root {
                Node::Nary {
                    op: NaryOp::Interleave,
                    children,
                } => Machine::Interleave(build_interleave(children)?),
                _ => {
                    let analysis = analyze(root, &ws)?;
                    if ws.ranges.is_empty() {
                        Machine::Plain(build_plain(&analysis, &ws)?)
                    } else {
                        Machine::Ranges(build_ranges(&analysis, &ws)?)
                    }
                }
            }
        }
    };

    let expression = root
        .as_ref()
        .map(|r| tree::render(r, &ws.ranges))
        .unwrap_or_default();
    Ok(CompiledModel {
        name: ws.name.into(),
        expression: expression.into(),
        symbols: ws.unique.into_boxed_slice(),
        machine,
    })
}

fn ambiguous(symbol: &str) -> ContentModelError {
    ContentModelError::AmbiguousContentModel {
        symbol: symbol.to_string(),
        detail: "two transitions on one symbol from one state",
    }
}

/// Edge targets for a source state: `firstpos(root)` for the start state,
/// the position's `followpos` otherwise.
fn targets(analysis: &Analysis, from: u32) -> &PosSet {
    if from == 0 {
        &analysis.firstpos
    } else {
        &analysis.followpos[from as usize]
    }
}

fn build_plain(analysis: &Analysis, ws: &Workspace) -> Result<PlainMachine, ContentModelError> {
    let states = ws.alphabet.len();
    let mut finals = analysis.lastpos.clone();
    if analysis.nullable {
        finals.insert(0);
    }

    let mut machine = PlainMachine::new(states, finals);
    for from in 0..states as u32 {
        for to in targets(analysis, from).iter() {
            let symbol = &ws.alphabet[to as usize];
            if !machine.add_transition(symbol, from, to) {
                return Err(ambiguous(symbol));
            }
        }
    }
    Ok(machine)
}

fn build_ranges(analysis: &Analysis, ws: &Workspace) -> Result<RangeMachine, ContentModelError> {
    let states = ws.alphabet.len();

    // final states carry the ranges ending there, to be checked at accept
    // time; state 0 (reachable as a final only via nullability) has none,
    // since no edge ever enters it
    let mut finals: FxHashMap<u32, RangeList> = FxHashMap::default();
    for state in analysis.lastpos.iter() {
        finals.insert(state, analysis.end_ranges[state as usize].iter().collect());
    }
    if analysis.nullable {
        finals.insert(0, RangeList::new());
    }

    let mut machine = RangeMachine::new(states, finals, ws.ranges.clone().into_boxed_slice());
    for from in 0..states as u32 {
        for to in targets(analysis, from).iter() {
            let symbol = &ws.alphabet[to as usize];
            let transition = classify(analysis, from, to);
            if !machine.add_transition(symbol, from, transition) {
                return Err(ambiguous(symbol));
            }
        }
    }
    Ok(machine)
}

/// Decide the transition kind of the edge `from -> to` by inspecting the
/// range annotations of both endpoints. The start state has no end
/// ranges: nothing can have been counted yet.
fn classify(analysis: &Analysis, from: u32, to: u32) -> Transition {
    let start_ranges = &analysis.start_ranges[to as usize];
    let end_ranges = if from == 0 {
        None
    } else {
        Some(&analysis.end_ranges[from as usize]).filter(|s| !s.is_empty())
    };

    match (!start_ranges.is_empty(), end_ranges) {
        (false, None) => Transition::Valid { to },
        (true, None) => {
            let inits = relevant(analysis, start_ranges, from, None);
            if inits.is_empty() {
                Transition::Valid { to }
            } else {
                Transition::ToStart { to, inits }
            }
        }
        (false, Some(end_ranges)) => {
            let checks = relevant(analysis, end_ranges, to, None);
            if checks.is_empty() {
                Transition::Valid { to }
            } else {
                Transition::FromEnd { to, checks }
            }
        }
        (true, Some(end_ranges)) => {
            if let Some(&range) = analysis.boundary_pairs.get(&(from, to)) {
                // this edge closes and reopens `range` itself: count it,
                // and exclude it from the boundary bookkeeping
                let inits = relevant(analysis, start_ranges, from, Some(range));
                let checks = relevant(analysis, end_ranges, to, Some(range));
                return Transition::FromEndToStartInc {
                    to,
                    checks,
                    inits,
                    range,
                };
            }
            let inits = relevant(analysis, start_ranges, from, None);
            let checks = relevant(analysis, end_ranges, to, None);
            match (checks.is_empty(), inits.is_empty()) {
                (true, true) => Transition::Valid { to },
                (true, false) => Transition::ToStart { to, inits },
                (false, true) => Transition::FromEnd { to, checks },
                (false, false) => Transition::FromEndToStartNoInc { to, checks, inits },
            }
        }
    }
}

/// Relevance filter: from the annotated ranges, keep only those whose
/// boundary this edge actually crosses. A range that contains the far
/// endpoint internally is being looped inside of, not entered or left;
/// its counter must not be touched.
fn relevant(analysis: &Analysis, ranges: &PosSet, node: u32, skip: Option<u32>) -> RangeList {
    ranges
        .iter()
        .filter(|&r| Some(r) != skip && !analysis.range_internal[r as usize].contains(node))
        .collect()
}

fn build_interleave(children: &[Node]) -> Result<InterleaveMachine, ContentModelError> {
    let mut machine = InterleaveMachine::new();
    for child in children {
        // the tree check has already pinned children to these two shapes
        let (value, optional) = match child {
            Node::Symbol { value, .. } => (value, false),
            Node::Unary {
                op: UnaryOp::ZeroOrOne,
                child,
            } => match &**child {
                Node::Symbol { value, .. } => (value, true),
                _ => unreachable!("checked interleave child"),
            },
            _ => unreachable!("checked interleave child"),
        };
        if !machine.add_symbol(value, optional) {
            return Err(ContentModelError::AmbiguousContentModel {
                symbol: value.to_string(),
                detail: "duplicate symbol in interleave",
            });
        }
    }
    Ok(machine)
}
