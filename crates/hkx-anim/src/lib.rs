//! # hkx_anim - Skeletal Animation Evaluation
//!
//! Evaluates decoded Havok-style animation clips against a bone hierarchy,
//! producing one composed model-space transform per bone for any point in
//! time.
//!
//! ## Features
//!
//! - Spline-compressed (block-partitioned B-spline) and interleaved
//!   uncompressed track storage behind one sampling contract
//! - Looping playback, clamped scrubbing and seeking
//! - Additive clips and reference-pose fallback for untracked bones
//! - Root-motion extraction with external rotation layering
//! - Pose cache readable from other threads while the owner recomputes it
//!
//! Parsing of animation files is out of scope: clips and skeletons arrive as
//! decoded in-memory structures.
//!
//! ## Examples
//!
//! ```
//! use glam::Vec3;
//! use hkx_anim::{
//!     AnimationData, AnimationInstance, BlendableTransform, Bone, InterleavedUncompressed,
//!     Skeleton,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), hkx_anim::AnimError> {
//! let skeleton = Skeleton::from_parents(vec![
//!     Bone::new("root", -1, BlendableTransform::IDENTITY),
//!     Bone::new("spine", 0, BlendableTransform::from_translation(Vec3::Y)),
//! ])?;
//!
//! // One track driving the root, two frames at 30 FPS
//! let storage = InterleavedUncompressed::from_frames(vec![
//!     vec![BlendableTransform::IDENTITY],
//!     vec![BlendableTransform::from_translation(Vec3::X)],
//! ])?;
//! let clip = AnimationData::new("slide", storage, 1.0 / 30.0, 1.0 / 30.0)?;
//!
//! let mut instance = AnimationInstance::new(Arc::new(clip), Arc::new(skeleton))?;
//! instance.scrub_relative(1.0 / 60.0);
//! instance.compute_pose()?;
//!
//! let pose = instance.pose_cache().read();
//! let spine = pose.entries()[1].position();
//! assert!((spine - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-4);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod data;
pub mod error;
pub mod instance;
pub mod pose;
pub mod root_motion;
pub mod skeleton;
pub mod storage;
pub mod track_map;
pub mod transform;

// Re-export commonly used types
pub use data::{AnimationData, BlendHint};
pub use error::{AnimError, Result};
pub use instance::AnimationInstance;
#[cfg(feature = "parallel")]
pub use pose::compute_all;
pub use pose::{
    DEFAULT_MAX_DEPTH, EvaluatorOptions, PoseCache, PoseEntry, PoseReadGuard, PoseStats,
    UntrackedBones,
};
pub use root_motion::{
    ReferenceFrameCurve, ReferenceFrameSamples, RootMotionPlayer, RootMotionState,
};
pub use skeleton::{Bone, Skeleton};
pub use storage::{
    BSpline, FrameCursor, InterleavedUncompressed, SplineBlock, SplineChannel, SplineCompressed,
    SplineTrack, TrackStorage,
};
pub use track_map::TrackMap;
pub use transform::{BlendableTransform, Lerp};

// Re-export glam so callers use the same math types
pub use glam;
