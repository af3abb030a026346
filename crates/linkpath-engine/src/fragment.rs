//! Fragments and the fragment pool.
//!
//! All fragments of a run live in one [`FragmentPool`] and are addressed by
//! their position in it. Each fragment carries its own `done` flag, so the
//! "consumed exactly once" partition is visible on the pool itself.

use crate::link::reverse_triples;
use crate::types::{ControlTriple, Point};

/// One open path piece in the chaining pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    owner: usize,
    index: usize,
    triples: Vec<ControlTriple>,
    start: Point,
    end: Point,
    done: bool,
}

impl Fragment {
    /// Create a fragment, or `None` if `triples` is empty.
    ///
    /// `owner` is the owner's slot in first-seen order; `index` is the
    /// fragment's position among that owner's fragments.
    #[must_use]
    pub fn new(owner: usize, index: usize, triples: Vec<ControlTriple>) -> Option<Self> {
        let start = triples.first()?.anchor;
        let end = triples.last()?.anchor;
        Some(Self {
            owner,
            index,
            triples,
            start,
            end,
            done: false,
        })
    }

    /// Owner slot.
    #[must_use]
    pub const fn owner(&self) -> usize {
        self.owner
    }

    /// Position among the owner's fragments.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Anchor of the first triple.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Anchor of the last triple.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// The fragment's triples. Empty once the fragment has been consumed.
    #[must_use]
    pub fn triples(&self) -> &[ControlTriple] {
        &self.triples
    }

    /// Returns `true` once the fragment belongs to an output chain.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Flip the fragment in place, keeping the cached ends consistent.
    pub fn reverse(&mut self) {
        debug_assert!(!self.done, "reversing a consumed fragment");
        self.triples = reverse_triples(&self.triples);
        std::mem::swap(&mut self.start, &mut self.end);
    }

    /// Mark the fragment consumed and hand its triples to the caller.
    pub fn take(&mut self) -> Vec<ControlTriple> {
        debug_assert!(!self.done, "fragment consumed twice");
        self.done = true;
        std::mem::take(&mut self.triples)
    }
}

/// Every fragment of one run, in pool order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentPool {
    fragments: Vec<Fragment>,
    owner_count: usize,
}

impl FragmentPool {
    /// Create an empty pool for `owner_count` owners.
    #[must_use]
    pub const fn new(owner_count: usize) -> Self {
        Self {
            fragments: Vec::new(),
            owner_count,
        }
    }

    /// Append a fragment at the end of the pool.
    pub fn push(&mut self, fragment: Fragment) {
        debug_assert!(fragment.owner < self.owner_count, "unknown owner slot");
        self.fragments.push(fragment);
    }

    /// Number of owners the pool was built for.
    #[must_use]
    pub const fn owner_count(&self) -> usize {
        self.owner_count
    }

    /// Returns the number of fragments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns `true` if the pool holds no fragments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns a slice of all fragments in pool order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub(crate) fn fragments_mut(&mut self) -> &mut [Fragment] {
        &mut self.fragments
    }

    /// Number of fragments not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.fragments.iter().filter(|f| !f.done).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(from: Point, to: Point) -> Vec<ControlTriple> {
        vec![ControlTriple::corner(from), ControlTriple::corner(to)]
    }

    #[test]
    fn new_rejects_empty() {
        assert!(Fragment::new(0, 0, vec![]).is_none());
    }

    #[test]
    fn new_caches_ends() {
        let frag = Fragment::new(0, 3, line(Point::new(1.0, 2.0), Point::new(3.0, 4.0))).unwrap();
        assert_eq!(frag.start(), Point::new(1.0, 2.0));
        assert_eq!(frag.end(), Point::new(3.0, 4.0));
        assert_eq!(frag.index(), 3);
        assert!(!frag.is_done());
    }

    #[test]
    fn reverse_keeps_ends_consistent() {
        let mut frag =
            Fragment::new(0, 0, line(Point::new(1.0, 2.0), Point::new(3.0, 4.0))).unwrap();
        frag.reverse();
        assert_eq!(frag.start(), Point::new(3.0, 4.0));
        assert_eq!(frag.end(), Point::new(1.0, 2.0));
        assert_eq!(frag.triples()[0].anchor, frag.start());
        assert_eq!(frag.triples()[1].anchor, frag.end());
    }

    #[test]
    fn take_marks_done() {
        let mut pool = FragmentPool::new(1);
        pool.push(Fragment::new(0, 0, line(Point::new(0.0, 0.0), Point::new(1.0, 0.0))).unwrap());
        assert_eq!(pool.pending(), 1);

        let triples = pool.fragments_mut()[0].take();
        assert_eq!(triples.len(), 2);
        assert!(pool.fragments()[0].is_done());
        assert!(pool.fragments()[0].triples().is_empty());
        assert_eq!(pool.pending(), 0);
    }
}
