//! Error types for animation evaluation

use thiserror::Error;

/// Error types for skeleton validation, track sampling and pose computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// A track index outside `[0, track_count)` was requested
    #[error("Track {track} out of range (track count {track_count})")]
    TrackOutOfRange {
        /// Requested track index
        track: usize,
        /// Number of tracks held by the storage
        track_count: usize,
    },

    /// A bone index outside the skeleton was referenced
    #[error("Bone {bone} out of range (bone count {bone_count})")]
    BoneOutOfRange {
        /// Referenced bone index
        bone: usize,
        /// Number of bones in the skeleton
        bone_count: usize,
    },

    /// A bone names a parent that does not exist
    #[error("Bone {bone} has invalid parent index {parent}")]
    InvalidParent {
        /// Offending bone
        bone: usize,
        /// Parent index as decoded
        parent: i16,
    },

    /// A bone lists a child that does not exist
    #[error("Bone {bone} lists invalid child index {child}")]
    InvalidChild {
        /// Offending bone
        bone: usize,
        /// Child index as decoded
        child: usize,
    },

    /// The bone graph contains a cycle through the given bone
    #[error("Cyclic bone hierarchy through bone {bone}")]
    CyclicHierarchy {
        /// A bone that is its own ancestor
        bone: usize,
    },

    /// The tree walk exceeded the configured depth ceiling
    #[error("Hierarchy deeper than {max_depth} at bone {bone}")]
    HierarchyTooDeep {
        /// Bone at which the ceiling was hit
        bone: usize,
        /// Configured ceiling
        max_depth: usize,
    },

    /// Malformed spline channel data
    #[error("Invalid spline: {0}")]
    InvalidSpline(String),

    /// Track storage dimensions do not match its payload
    #[error("Invalid track layout: {0}")]
    InvalidLayout(String),

    /// Non-positive or non-finite clip timing
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;
