//! Fragment splitter: builds the chaining pool from source paths.
//!
//! A subpath whose two ends already lie within tolerance of each other
//! would be immediately linkable to itself. Before any cross-fragment
//! matching, such a subpath has its last two triples peeled off as a
//! separate two-triple fragment, repeatedly, until it is down to a single
//! triple or its ends are no longer near.

use crate::fragment::{Fragment, FragmentPool};
use crate::proximity::Proximity;
use crate::types::{ChainError, SourcePath};

/// Pool built from the input, together with the owner table.
#[derive(Debug, Clone)]
pub struct SplitOutput<K> {
    /// Distinct owners in first-seen order; a fragment's owner slot
    /// indexes into this table.
    pub owners: Vec<K>,
    /// All fragments, in pool order.
    pub pool: FragmentPool,
    /// Number of pieces peeled off self-closing subpaths.
    pub split_count: usize,
}

/// Build the fragment pool, splitting self-closing subpaths.
///
/// Sources sharing an owner are merged into one owner slot. Fragment
/// indices are allocated once here, sequentially per owner in pool order,
/// and are never re-derived.
///
/// # Errors
///
/// Returns [`ChainError::MalformedFragment`] for a subpath with no triples
/// and [`ChainError::NothingToChain`] if there are no subpaths at all.
pub fn build_pool<K: PartialEq>(
    sources: Vec<SourcePath<K>>,
    prox: &mut Proximity,
) -> Result<SplitOutput<K>, ChainError> {
    if sources.iter().all(|s| s.subpaths.is_empty()) {
        return Err(ChainError::NothingToChain);
    }

    for (owner_position, source) in sources.iter().enumerate() {
        if let Some(subpath) = source.subpaths.iter().position(Vec::is_empty) {
            return Err(ChainError::MalformedFragment {
                owner_position,
                subpath,
            });
        }
    }

    let mut owners: Vec<K> = Vec::new();
    let mut slots = Vec::with_capacity(sources.len());
    let mut all_subpaths = Vec::with_capacity(sources.len());
    for source in sources {
        let slot = if let Some(slot) = owners.iter().position(|o| *o == source.owner) {
            slot
        } else {
            owners.push(source.owner);
            owners.len() - 1
        };
        slots.push(slot);
        all_subpaths.push(source.subpaths);
    }

    let mut pool = FragmentPool::new(owners.len());
    let mut next_index = vec![0_usize; owners.len()];
    let mut split_count = 0;

    for (slot, subpaths) in slots.into_iter().zip(all_subpaths) {
        for mut triples in subpaths {
            let mut alloc = || {
                let index = next_index[slot];
                next_index[slot] += 1;
                index
            };

            let (Some(first), Some(last)) = (triples.first(), triples.last()) else {
                continue;
            };
            let start = first.anchor;
            let mut end = last.anchor;

            while triples.len() > 1 && prox.near(start, end) {
                let (Some(tail), Some(&before)) = (triples.pop(), triples.last()) else {
                    break;
                };
                let index = alloc();
                tracing::debug!(
                    owner = slot,
                    index,
                    remaining = triples.len(),
                    "splitting self-closing fragment"
                );
                if let Some(piece) = Fragment::new(slot, index, vec![before, tail]) {
                    pool.push(piece);
                    split_count += 1;
                }
                end = before.anchor;
            }

            if let Some(remainder) = Fragment::new(slot, alloc(), triples) {
                pool.push(remainder);
            }
        }
    }

    Ok(SplitOutput {
        owners,
        pool,
        split_count,
    })
}
