//! Link and reverse operators on control-triple sequences.

use crate::types::ControlTriple;

/// Reverse a triple sequence so it is traversed from the other end.
///
/// Triple order is reversed and each triple's handles are swapped; anchors
/// are unchanged.
#[must_use]
pub fn reverse_triples(triples: &[ControlTriple]) -> Vec<ControlTriple> {
    triples.iter().rev().map(|t| t.reversed()).collect()
}

/// Joins triple sequences end to start and counts the joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linker {
    snap_ends: bool,
    link_count: usize,
}

impl Linker {
    /// Create a linker. With `snap_ends` the adjoining anchors are fused.
    #[must_use]
    pub const fn new(snap_ends: bool) -> Self {
        Self {
            snap_ends,
            link_count: 0,
        }
    }

    /// Number of links performed so far.
    #[must_use]
    pub const fn link_count(&self) -> usize {
        self.link_count
    }

    /// Concatenate `a` followed by `b`.
    ///
    /// With snapping, `a`'s trailing triple and `b`'s leading triple become
    /// one triple: `a`'s incoming handle, the mean of the two anchors, and
    /// `b`'s outgoing handle. Without snapping both sequences are kept
    /// whole. Either way the link is counted.
    pub fn link(&mut self, a: Vec<ControlTriple>, b: Vec<ControlTriple>) -> Vec<ControlTriple> {
        self.link_count += 1;

        if self.snap_ends
            && let Some((tail, a_rest)) = a.split_last()
            && let Some((head, b_rest)) = b.split_first()
        {
            let mut joined = Vec::with_capacity(a.len() + b.len() - 1);
            joined.extend_from_slice(a_rest);
            joined.push(ControlTriple::new(
                tail.handle_in,
                tail.anchor.midpoint(head.anchor),
                head.handle_out,
            ));
            joined.extend_from_slice(b_rest);
            return joined;
        }

        let mut joined = a;
        joined.extend(b);
        joined
    }
}
