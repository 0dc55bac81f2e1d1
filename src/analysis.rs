//! The position-function pass.
//!
//! One post-order traversal computes, for every node, `nullable`,
//! `firstpos`, `lastpos` and `internalpos`, and fills the position-indexed
//! side tables the automaton builders consume: `followpos` per position,
//! the per-position start/end range annotations, the per-range internal
//! position sets, and the boundary-pair map `(lastpos, firstpos) -> range`.
//!
//! The boundary-pair map must be filled here and not in a later pass: it
//! needs both `firstpos` and `lastpos` of every range node, which exist
//! exactly when that node is visited. Two distinct ranges claiming the
//! same pair make their counters indistinguishable at validation time, so
//! that is reported as an ambiguous content model right away.

use rustc_hash::FxHashMap;

use crate::builder::Workspace;
use crate::posset::PosSet;
use crate::tree::{post_order, NaryOp, Node, UnaryOp};
use crate::ContentModelError;

/// Side tables produced by the pass, all keyed by position or range index.
#[derive(Debug)]
pub(crate) struct Analysis {
    pub(crate) nullable: bool,
    pub(crate) firstpos: PosSet,
    pub(crate) lastpos: PosSet,
    /// Position -> positions that may immediately follow it.
    pub(crate) followpos: Vec<PosSet>,
    /// Position -> indices of ranges whose `firstpos` contains it.
    pub(crate) start_ranges: Vec<PosSet>,
    /// Position -> indices of ranges whose `lastpos` contains it.
    pub(crate) end_ranges: Vec<PosSet>,
    /// Range index -> every position inside that range's subtree.
    pub(crate) range_internal: Vec<PosSet>,
    /// `(from, to)` boundary pair -> the unique range it belongs to.
    pub(crate) boundary_pairs: FxHashMap<(u32, u32), u32>,
}

/// Attributes computed per node and consumed by its parent.
struct Attrs {
    nullable: bool,
    firstpos: PosSet,
    lastpos: PosSet,
    internalpos: PosSet,
}

pub(crate) fn analyze(root: &Node, ws: &Workspace) -> Result<Analysis, ContentModelError> {
    let positions = ws.alphabet.len();
    let mut analysis = Analysis {
        nullable: false,
        firstpos: PosSet::new(),
        lastpos: PosSet::new(),
        followpos: vec![PosSet::new(); positions],
        start_ranges: vec![PosSet::new(); positions],
        end_ranges: vec![PosSet::new(); positions],
        range_internal: vec![PosSet::new(); ws.ranges.len()],
        boundary_pairs: FxHashMap::default(),
    };

    // Post-order with a value stack: each node pops its children's
    // attributes and pushes its own.
    let mut stack: Vec<Attrs> = Vec::new();
    for node in post_order(root) {
        let attrs = match node {
            Node::Symbol { pos, .. } => Attrs {
                nullable: false,
                firstpos: PosSet::singleton(*pos),
                lastpos: PosSet::singleton(*pos),
                internalpos: PosSet::singleton(*pos),
            },
            Node::Epsilon => Attrs {
                nullable: true,
                firstpos: PosSet::new(),
                lastpos: PosSet::new(),
                internalpos: PosSet::new(),
            },
            Node::Unary { op, .. } => {
                let child = stack.pop().expect("post-order yields children first");
                apply_unary(&mut analysis, *op, child, ws)?
            }
            Node::Nary { op, children } => {
                let kids = stack.split_off(stack.len() - children.len());
                match op {
                    NaryOp::Choice => choice(kids),
                    NaryOp::Sequence => sequence(&mut analysis, kids),
                    // the interleave machine is built straight from the
                    // tree; this pass is never run over it
                    NaryOp::Interleave => unreachable!("interleave has no position functions"),
                }
            }
        };
        stack.push(attrs);
    }

    let root_attrs = stack.pop().expect("traversal yields the root last");
    analysis.nullable = root_attrs.nullable;
    analysis.firstpos = root_attrs.firstpos;
    analysis.lastpos = root_attrs.lastpos;
    Ok(analysis)
}

/// `followpos` contribution of a looping operator (`*`, `+`, ranges): the
/// body may restart, so everything in `firstpos` follows everything in
/// `lastpos`.
fn loop_followpos(analysis: &mut Analysis, attrs: &Attrs) {
    for p in attrs.lastpos.iter() {
        analysis.followpos[p as usize].union_with(&attrs.firstpos);
    }
}

fn apply_unary(
    analysis: &mut Analysis,
    op: UnaryOp,
    child: Attrs,
    ws: &Workspace,
) -> Result<Attrs, ContentModelError> {
    match op {
        UnaryOp::Neutral => Ok(child),
        UnaryOp::ZeroOrOne => Ok(Attrs {
            nullable: true,
            ..child
        }),
        UnaryOp::ZeroOrMore => {
            loop_followpos(analysis, &child);
            Ok(Attrs {
                nullable: true,
                ..child
            })
        }
        UnaryOp::OneOrMore => {
            loop_followpos(analysis, &child);
            Ok(child)
        }
        UnaryOp::Range { index } => {
            loop_followpos(analysis, &child);
            for p in child.firstpos.iter() {
                analysis.start_ranges[p as usize].insert(index);
            }
            for p in child.lastpos.iter() {
                analysis.end_ranges[p as usize].insert(index);
            }
            for from in child.lastpos.iter() {
                for to in child.firstpos.iter() {
                    if analysis.boundary_pairs.insert((from, to), index).is_some() {
                        return Err(ContentModelError::AmbiguousContentModel {
                            symbol: ws.alphabet[from as usize].to_string(),
                            detail: "ambiguous ranges",
                        });
                    }
                }
            }
            analysis.range_internal[index as usize] = child.internalpos.clone();
            Ok(Attrs {
                nullable: ws.ranges[index as usize].min() == 0 || child.nullable,
                ..child
            })
        }
    }
}

fn choice(kids: Vec<Attrs>) -> Attrs {
    let mut nullable = false;
    let mut firstpos = PosSet::new();
    let mut lastpos = PosSet::new();
    let mut internalpos = PosSet::new();
    for kid in &kids {
        nullable |= kid.nullable;
        firstpos.union_with(&kid.firstpos);
        lastpos.union_with(&kid.lastpos);
        internalpos.union_with(&kid.internalpos);
    }
    Attrs {
        nullable,
        firstpos,
        lastpos,
        internalpos,
    }
}

fn sequence(analysis: &mut Analysis, kids: Vec<Attrs>) -> Attrs {
    // followpos between adjacent children: everything that can end the
    // nullable-extended prefix is followed by the next child's firstpos.
    // The running prefix lastpos ends up being the node's own lastpos.
    let mut lastpos = kids[0].lastpos.clone();
    for kid in &kids[1..] {
        for p in lastpos.iter() {
            analysis.followpos[p as usize].union_with(&kid.firstpos);
        }
        if kid.nullable {
            lastpos.union_with(&kid.lastpos);
        } else {
            lastpos = kid.lastpos.clone();
        }
    }

    // firstpos accumulates children's firstpos while the prefix is nullable
    let mut firstpos = kids[0].firstpos.clone();
    for window in kids.windows(2) {
        if !window[0].nullable {
            break;
        }
        firstpos.union_with(&window[1].firstpos);
    }

    let mut internalpos = PosSet::new();
    for kid in &kids {
        internalpos.union_with(&kid.internalpos);
    }
    Attrs {
        nullable: kids.iter().all(|k| k.nullable),
        firstpos,
        lastpos,
        internalpos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Compiler, ExpressionOps};

    fn analyzed(expression: &str) -> (Analysis, Workspace) {
        let mut compiler = Compiler::new("t");
        compiler.parse(expression).unwrap();
        let (ws, root) = compiler.finish().unwrap();
        let analysis = analyze(root.as_ref().unwrap(), &ws).unwrap();
        (analysis, ws)
    }

    fn set(values: &[u32]) -> PosSet {
        values.iter().copied().collect()
    }

    #[test]
    fn test_textbook_example() {
        // (a|b)*,a,b,b with positions a=1 b=2 a=3 b=4 b=5
        let (a, _) = analyzed("(a|b)*,a,b,b");
        assert!(!a.nullable);
        assert_eq!(a.firstpos, set(&[1, 2, 3]));
        assert_eq!(a.lastpos, set(&[5]));
        assert_eq!(a.followpos[1], set(&[1, 2, 3]));
        assert_eq!(a.followpos[2], set(&[1, 2, 3]));
        assert_eq!(a.followpos[3], set(&[4]));
        assert_eq!(a.followpos[4], set(&[5]));
        assert!(a.followpos[5].is_empty());
    }

    #[test]
    fn test_all_optional_sequence() {
        let (a, _) = analyzed("a?,b?,c?");
        assert!(a.nullable);
        assert_eq!(a.firstpos, set(&[1, 2, 3]));
        assert_eq!(a.lastpos, set(&[1, 2, 3]));
        assert_eq!(a.followpos[1], set(&[2, 3]));
        assert_eq!(a.followpos[2], set(&[3]));
        assert!(a.followpos[3].is_empty());
    }

    #[test]
    fn test_epsilon_alternative_is_nullable() {
        let mut compiler = Compiler::new("t");
        compiler.push();
        compiler.symbol("a");
        compiler.or();
        compiler.epsilon();
        compiler.pop();
        let (ws, root) = compiler.finish().unwrap();
        let a = analyze(root.as_ref().unwrap(), &ws).unwrap();
        assert!(a.nullable);
        assert_eq!(a.firstpos, set(&[1]));
        assert_eq!(a.lastpos, set(&[1]));
    }

    #[test]
    fn test_range_annotations() {
        // positions a=1 b=2; ranges 0=a[2,3], 1=b[2,3], 2=outer[5,6]
        let (a, _) = analyzed("(a[2,3],b[2,3])[5,6]");
        assert_eq!(a.start_ranges[1], set(&[0, 2]));
        assert_eq!(a.start_ranges[2], set(&[1]));
        assert_eq!(a.end_ranges[1], set(&[0]));
        assert_eq!(a.end_ranges[2], set(&[1, 2]));
        assert_eq!(a.range_internal[0], set(&[1]));
        assert_eq!(a.range_internal[1], set(&[2]));
        assert_eq!(a.range_internal[2], set(&[1, 2]));
        assert_eq!(a.boundary_pairs.get(&(1, 1)), Some(&0));
        assert_eq!(a.boundary_pairs.get(&(2, 2)), Some(&1));
        assert_eq!(a.boundary_pairs.get(&(2, 1)), Some(&2));
        assert_eq!(a.boundary_pairs.len(), 3);
        assert_eq!(a.followpos[1], set(&[1, 2]));
        assert_eq!(a.followpos[2], set(&[1, 2]));
    }

    #[test]
    fn test_directly_nested_ranges_share_a_boundary_pair() {
        let mut compiler = Compiler::new("t");
        compiler.parse("(a[2,3])[4,5]").unwrap();
        let (ws, root) = compiler.finish().unwrap();
        let err = analyze(root.as_ref().unwrap(), &ws).unwrap_err();
        assert!(matches!(
            err,
            ContentModelError::AmbiguousContentModel { ref symbol, .. } if symbol == "a"
        ));
    }

    #[test]
    fn test_position_closure() {
        let (a, ws) = analyzed("((a?,b?,h,i)|(c*,d?,k)+|e|(f,g))");
        let highest = ws.alphabet.len() as u32 - 1;
        for p in a.firstpos.iter().chain(a.lastpos.iter()) {
            assert!((1..=highest).contains(&p));
        }
        for follow in &a.followpos {
            for p in follow.iter() {
                assert!((1..=highest).contains(&p));
            }
        }
    }
}
