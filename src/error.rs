//! Error types for the grid conversion pipeline.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type GlueResult<T> = Result<T, GlueError>;

/// Errors raised while converting a multi-block grid.
///
/// Every variant carries a context string naming the file, block or entry
/// that triggered it. All errors are fatal to the running conversion.
#[derive(Debug, Error)]
pub enum GlueError {
    /// Failure reading or writing a file.
    #[error("io error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The block-count header or a structural line could not be parsed.
    #[error("malformed header: {context}")]
    MalformedHeader { context: String },

    /// An entry names a boundary-condition keyword outside the known set.
    #[error("unknown boundary condition: {context}")]
    UnknownBc { context: String },

    /// Declared block ids do not form the set 1..=N.
    #[error("block count mismatch: {context}")]
    BlockCountMismatch { context: String },

    /// A block dimension is below the minimum of 2 nodes.
    #[error("dimension too small: {context}")]
    DimensionTooSmall { context: String },

    /// A surface range leaves the host block's surface.
    #[error("range out of bounds: {context}")]
    RangeOutOfBounds { context: String },

    /// The two sides of an interface describe different quad counts.
    #[error("area mismatch: {context}")]
    AreaMismatch { context: String },

    /// A surface is claimed by more than one interface entry.
    #[error("duplicate interface: {context}")]
    DuplicateInterface { context: String },

    /// Interface entries induce contradictory edge or corner relations.
    #[error("orientation inconsistent: {context}")]
    OrientationInconsistent { context: String },

    /// A lattice point has no image on the declared counterpart surface.
    #[error("counterpart not found: {context}")]
    CounterpartNotFound { context: String },

    /// NMF and PLOT3D disagree on block dimensions.
    #[error("dimension inconsistent: {context}")]
    DimensionInconsistent { context: String },

    /// A face accumulated more than two cell references.
    #[error("non-manifold topology: {context}")]
    NonManifold { context: String },

    /// Global numbering produced colliding ids. Internal bug detector.
    #[error("index collision: {context}")]
    IndexCollision { context: String },
}

impl GlueError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
