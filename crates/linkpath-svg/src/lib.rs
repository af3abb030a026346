//! linkpath-svg: SVG front end for the chaining engine (sans-IO)
//!
//! Reads `<path>` geometry out of an SVG document as cubic super-paths,
//! hands it to `linkpath-engine`, and writes the chained geometry back.
//! Operates on strings only; file handling belongs to the caller.

pub mod document;
pub mod path_data;

pub use document::{SvgPaths, chain_svg, read_paths, write_document};
pub use path_data::{PathDataError, build_path_data, parse_path_data};

use linkpath_engine::ChainError;

/// Errors raised while processing an SVG document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SvgError {
    /// The markup could not be parsed.
    #[error("invalid SVG document: {0}")]
    Document(String),

    /// The document has no `<path>` elements.
    #[error("document contains no <path> elements")]
    NoPaths,

    /// A path's `d` attribute could not be converted.
    #[error("path {id}: {source}")]
    PathData {
        /// Key of the offending path.
        id: String,
        /// Underlying conversion error.
        source: PathDataError,
    },

    /// A selected id is carried by no element.
    #[error("no element has id {0:?}")]
    UnknownId(String),

    /// A selected id belongs to an element that is not a `<path>`.
    #[error("object {id} is not a path but a <{element}>")]
    NotAPath {
        /// The selected id.
        id: String,
        /// Local name of the element carrying it.
        element: String,
    },

    /// The chaining engine rejected the input.
    #[error(transparent)]
    Chain(#[from] ChainError),
}
