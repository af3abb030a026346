//! Chaining engine: greedy endpoint matching over the fragment pool.
//!
//! For each owner, every fragment not yet consumed seeds a chain. The seed
//! is marked done first, so it can never match itself. The whole pool is
//! then scanned from the start for a fragment with an end near one of the
//! chain's two ends:
//!
//! 1. Consumed fragments are skipped.
//! 2. If the candidate's start is near the chain's start, or its end near
//!    the chain's end, the candidate is reversed in place first.
//! 3. If the candidate's end is near the chain's start, it is prepended.
//! 4. Otherwise, if its start is near the chain's end, it is appended.
//!
//! Every successful link restarts the scan at the beginning of the pool,
//! because the fragment continuing the grown chain may sit before the
//! cursor. The scan ends when a full pass finds nothing. The first
//! matching candidate in pool order always wins; there is no search for a
//! closest match, which keeps the output reproducible.
//!
//! Each link consumes one fragment, so the number of pending fragments
//! strictly decreases and the process terminates.

use crate::fragment::FragmentPool;
use crate::link::Linker;
use crate::proximity::Proximity;
use crate::types::Chain;

/// Chain every fragment in `pool`.
///
/// Returns one vector of chains per owner slot, indexed by slot. Owners are
/// visited in slot order and each owner's seeds in pool order. On return
/// every fragment in the pool is done.
pub fn chain_pool(
    pool: &mut FragmentPool,
    prox: &mut Proximity,
    linker: &mut Linker,
) -> Vec<Vec<Chain>> {
    let mut output = vec![Vec::new(); pool.owner_count()];

    for (slot, chains) in output.iter_mut().enumerate() {
        for seed in 0..pool.len() {
            let fragments = pool.fragments_mut();
            let fragment = &mut fragments[seed];
            if fragment.owner() != slot || fragment.is_done() {
                continue;
            }

            let seed_index = fragment.index();
            let mut cur = fragment.take();
            let mut start = fragment.start();
            let mut end = fragment.end();

            let mut cursor = 0;
            while cursor < fragments.len() {
                let seg = &mut fragments[cursor];
                if seg.is_done() {
                    cursor += 1;
                    continue;
                }

                if prox.near(start, seg.start()) || prox.near(end, seg.end()) {
                    seg.reverse();
                    tracing::trace!(
                        owner = seg.owner(),
                        index = seg.index(),
                        "reversed candidate"
                    );
                }

                if prox.near(start, seg.end()) {
                    tracing::debug!(
                        owner = slot,
                        seed = seed_index,
                        from_owner = seg.owner(),
                        from_index = seg.index(),
                        "prepending fragment"
                    );
                    cur = linker.link(seg.take(), cur);
                    if let Some(first) = cur.first() {
                        start = first.anchor;
                    }
                    cursor = 0;
                    continue;
                }

                if prox.near(end, seg.start()) {
                    tracing::debug!(
                        owner = slot,
                        seed = seed_index,
                        from_owner = seg.owner(),
                        from_index = seg.index(),
                        "appending fragment"
                    );
                    cur = linker.link(cur, seg.take());
                    if let Some(last) = cur.last() {
                        end = last.anchor;
                    }
                    cursor = 0;
                    continue;
                }

                cursor += 1;
            }

            chains.push(Chain::new(cur));
        }
    }

    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::types::{ControlTriple, Point};

    fn corners(points: &[(f64, f64)]) -> Vec<ControlTriple> {
        points
            .iter()
            .map(|&(x, y)| ControlTriple::corner(Point::new(x, y)))
            .collect()
    }

    /// Pool of one fragment per entry, each entry `(owner_slot, points)`.
    fn pool_of(owner_count: usize, entries: &[(usize, &[(f64, f64)])]) -> FragmentPool {
        let mut pool = FragmentPool::new(owner_count);
        let mut next = vec![0; owner_count];
        for &(owner, points) in entries {
            pool.push(Fragment::new(owner, next[owner], corners(points)).unwrap());
            next[owner] += 1;
        }
        pool
    }

    fn run(pool: &mut FragmentPool, epsilon: f64, snap: bool) -> (Vec<Vec<Chain>>, Linker) {
        let mut prox = Proximity::new(epsilon * epsilon);
        let mut linker = Linker::new(snap);
        let out = chain_pool(pool, &mut prox, &mut linker);
        (out, linker)
    }

    fn anchors(chain: &Chain) -> Vec<Point> {
        chain.triples().iter().map(|t| t.anchor).collect()
    }

    #[test]
    fn appends_head_to_tail_match() {
        let mut pool = pool_of(1, &[(0, &[(0.0, 0.0), (1.0, 0.0)]), (0, &[(1.0, 0.0), (2.0, 0.0)])]);
        let (out, linker) = run(&mut pool, 0.01, true);

        assert_eq!(linker.link_count(), 1);
        assert_eq!(out[0].len(), 1);
        assert_eq!(
            anchors(&out[0][0]),
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]
        );
    }

    #[test]
    fn prepends_tail_to_head_match() {
        let mut pool = pool_of(1, &[(0, &[(1.0, 0.0), (2.0, 0.0)]), (0, &[(0.0, 0.0), (1.0, 0.0)])]);
        let (out, _) = run(&mut pool, 0.01, true);

        assert_eq!(out[0].len(), 1);
        assert_eq!(
            anchors(&out[0][0]),
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]
        );
    }

    #[test]
    fn reverses_same_orientation_candidate() {
        // Both fragments end at (1,0): the second must be reversed, which
        // flips its triple order and swaps every triple's handles.
        let mut pool = FragmentPool::new(1);
        pool.push(Fragment::new(0, 0, corners(&[(0.0, 0.0), (1.0, 0.0)])).unwrap());
        let curved = vec![
            ControlTriple::new(Point::new(2.5, 1.0), Point::new(2.0, 0.0), Point::new(1.5, 1.0)),
            ControlTriple::new(Point::new(1.2, -1.0), Point::new(1.0, 0.0), Point::new(0.8, -1.0)),
        ];
        pool.push(Fragment::new(0, 1, curved).unwrap());
        let (out, linker) = run(&mut pool, 0.01, false);

        assert_eq!(linker.link_count(), 1);
        let triples = out[0][0].triples();
        assert_eq!(
            anchors(&out[0][0]),
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
            ]
        );
        assert_eq!(triples[2].handle_in, Point::new(0.8, -1.0));
        assert_eq!(triples[2].handle_out, Point::new(1.2, -1.0));
        assert_eq!(triples[3].handle_in, Point::new(1.5, 1.0));
        assert_eq!(triples[3].handle_out, Point::new(2.5, 1.0));
    }

    #[test]
    fn restart_finds_earlier_continuation() {
        // Seed is the middle piece; the piece before it in the pool only
        // becomes reachable after the later piece has been appended.
        let mut pool = pool_of(
            2,
            &[
                (1, &[(2.0, 0.0), (3.0, 0.0)]),
                (0, &[(0.0, 0.0), (1.0, 0.0)]),
                (1, &[(1.0, 0.0), (2.0, 0.0)]),
            ],
        );
        let (out, linker) = run(&mut pool, 0.01, true);

        assert_eq!(linker.link_count(), 2);
        assert_eq!(out[0].len(), 1);
        assert!(out[1].is_empty());
        assert_eq!(out[0][0].start(), Some(Point::new(0.0, 0.0)));
        assert_eq!(out[0][0].end(), Some(Point::new(3.0, 0.0)));
    }

    #[test]
    fn first_candidate_in_pool_order_wins() {
        // Two candidates continue (1,0); the earlier one is taken even
        // though the later one is an exact match.
        let mut pool = pool_of(
            1,
            &[
                (0, &[(0.0, 0.0), (1.0, 0.0)]),
                (0, &[(1.005, 0.0), (1.0, 5.0)]),
                (0, &[(1.0, 0.0), (1.0, -5.0)]),
            ],
        );
        let (out, _) = run(&mut pool, 0.01, false);

        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][0].end(), Some(Point::new(1.0, 5.0)));
        assert_eq!(anchors(&out[0][1]), vec![Point::new(1.0, 0.0), Point::new(1.0, -5.0)]);
    }

    #[test]
    fn every_fragment_done_and_no_triple_lost() {
        let entries: Vec<(usize, Vec<(f64, f64)>)> = (0..6)
            .map(|i| {
                let x = f64::from(i);
                (usize::from(i % 2 == 1), vec![(x, 0.0), (x + 1.0, 0.0)])
            })
            .collect();
        let borrowed: Vec<(usize, &[(f64, f64)])> =
            entries.iter().map(|(o, p)| (*o, p.as_slice())).collect();
        let mut pool = pool_of(2, &borrowed);
        let (out, linker) = run(&mut pool, 0.01, false);

        assert_eq!(pool.pending(), 0);
        assert!(pool.fragments().iter().all(|f| f.is_done()));
        let total: usize = out.iter().flatten().map(Chain::len).sum();
        assert_eq!(total, 12);
        assert_eq!(linker.link_count(), 5);
    }

    #[test]
    fn unmatched_fragments_stay_separate() {
        let mut pool = pool_of(1, &[(0, &[(0.0, 0.0), (1.0, 0.0)]), (0, &[(5.0, 5.0), (6.0, 5.0)])]);
        let (out, linker) = run(&mut pool, 0.01, true);
        assert_eq!(linker.link_count(), 0);
        assert_eq!(out[0].len(), 2);
    }

    #[test]
    fn shared_start_candidate_is_reversed_then_prepended() {
        // Identical fragments from two owners: the candidate shares the
        // seed's start, is flipped, and then its end meets the seed's start.
        let mut pool = pool_of(
            2,
            &[(0, &[(0.0, 0.0), (10.0, 0.0)]), (1, &[(0.0, 0.0), (10.0, 0.0)])],
        );
        let (out, linker) = run(&mut pool, 0.01, false);

        assert_eq!(linker.link_count(), 1);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][0].start(), Some(Point::new(10.0, 0.0)));
        assert_eq!(out[0][0].end(), Some(Point::new(10.0, 0.0)));
        assert!(out[1].is_empty());
    }
}
