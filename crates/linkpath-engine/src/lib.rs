//! linkpath-engine: Pure path-fragment chaining engine (sans-IO).
//!
//! Merges disjoint open path fragments, each a sequence of cubic Bézier
//! control triples, into longer continuous chains by linking fragments
//! whose endpoints coincide within a tolerance:
//!
//! split self-closing fragments -> greedy endpoint chaining -> per-owner
//! output chains plus diagnostics.
//!
//! Fragments from different source paths may be spliced together. This
//! crate has **no I/O dependencies**: reading and writing path formats
//! lives in `linkpath-svg`.

pub mod chain;
pub mod diagnostics;
pub mod fragment;
pub mod link;
pub mod proximity;
pub mod split;
pub mod types;

pub use diagnostics::ChainDiagnostics;
pub use types::{
    Chain, ChainConfig, ChainError, ChainResult, ControlTriple, OwnerChains, Point, SourcePath,
    Unit,
};

use link::Linker;
use proximity::Proximity;

/// Chain the fragments of `sources` into continuous paths.
///
/// Every subpath of every source becomes a fragment (after splitting
/// self-closing ones). Fragments are linked greedily across all sources;
/// the chains are returned grouped by the owner whose fragment seeded
/// them, in first-seen owner order. An owner whose fragments were all
/// absorbed elsewhere is returned with no chains.
///
/// The run is deterministic: identical input gives identical output.
///
/// # Errors
///
/// Returns [`ChainError::InvalidConfig`] if the configuration is unusable,
/// [`ChainError::NothingToChain`] if there are no subpaths, and
/// [`ChainError::MalformedFragment`] if any subpath is empty.
pub fn chain_paths<K: PartialEq>(
    sources: Vec<SourcePath<K>>,
    config: &ChainConfig,
) -> Result<ChainResult<K>, ChainError> {
    config.validate()?;

    let mut prox = Proximity::from_config(config);
    let mut linker = Linker::new(config.snap_ends);

    let split = split::build_pool(sources, &mut prox)?;
    let mut pool = split.pool;
    debug_assert!(!pool.is_empty(), "pool built from non-empty input");
    let fragment_count = pool.len();

    let per_owner = chain::chain_pool(&mut pool, &mut prox, &mut linker);
    debug_assert_eq!(pool.pending(), 0, "fragments left unconsumed");

    let owners: Vec<OwnerChains<K>> = split
        .owners
        .into_iter()
        .zip(per_owner)
        .map(|(owner, chains)| OwnerChains { owner, chains })
        .collect();

    let owners_obsoleted = owners.iter().filter(|o| o.chains.is_empty()).count();
    let diagnostics = ChainDiagnostics {
        epsilon: config.effective_epsilon(),
        unit_scale: config.unit_scale,
        unit: config.unit,
        snap_ends: config.snap_ends,
        owner_count: owners.len(),
        fragment_count,
        split_count: split.split_count,
        link_count: linker.link_count(),
        chain_count: owners.iter().map(|o| o.chains.len()).sum(),
        owners_obsoleted,
        owners_remaining: owners.len() - owners_obsoleted,
        min_near_miss_sq: prox.min_near_miss_sq(),
    };

    tracing::info!(
        fragments = diagnostics.fragment_count,
        links = diagnostics.link_count,
        chains = diagnostics.chain_count,
        obsoleted = diagnostics.owners_obsoleted,
        "chaining complete"
    );

    Ok(ChainResult {
        owners,
        diagnostics,
    })
}
