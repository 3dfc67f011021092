//! Pose evaluation
//!
//! The evaluator walks the bone hierarchy from every root, samples each
//! bone's track once, and chains local transforms into model space. Results
//! land in a [`PoseCache`], the one piece of mutable state shared between the
//! writer (pose computation) and readers (rendering, export, physics).
//!
//! # Locking
//!
//! A pass holds the cache's write lock from the moment it clears its visited
//! set until the finished pose is committed. Readers take the read lock, so
//! they always observe one complete pass: either the previous pose or the new
//! one. A pass that fails leaves the committed pose as it was.

use crate::error::{AnimError, Result};
use crate::skeleton::Skeleton;
use crate::storage::TrackStorage;
use crate::track_map::TrackMap;
use crate::transform::BlendableTransform;
use glam::{Mat4, Vec3};
use parking_lot::{RwLock, RwLockReadGuard};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default ceiling on hierarchy depth during a walk
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What untracked bones contribute to the pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UntrackedBones {
    /// The bone's reference (bind) transform
    #[default]
    ReferencePose,
    /// The identity transform
    Identity,
}

/// Options for controlling pose evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluatorOptions {
    /// Walks deeper than this fail with [`AnimError::HierarchyTooDeep`]
    pub max_depth: usize,
    /// Fallback for bones without a track; additive clips always use identity
    pub untracked: UntrackedBones,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            untracked: UntrackedBones::ReferencePose,
        }
    }
}

/// Computed data for one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEntry {
    /// Sampled local transform
    pub local: BlendableTransform,
    /// Rotation and translation chained from the root, scale excluded
    pub matrix: Mat4,
    /// Scale accumulated from the root
    pub scale: Vec3,
}

impl PoseEntry {
    /// Model-space matrix with accumulated scale applied
    pub fn world_matrix(&self) -> Mat4 {
        self.matrix * Mat4::from_scale(self.scale)
    }

    /// Model-space position of the bone
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

impl Default for PoseEntry {
    fn default() -> Self {
        Self {
            local: BlendableTransform::IDENTITY,
            matrix: Mat4::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Counters from one evaluation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoseStats {
    /// Bones sampled (each at most once)
    pub sampled: usize,
    /// Arrivals at a bone already sampled this pass
    pub revisited: usize,
    /// Deepest level reached, roots being 0
    pub max_depth_reached: usize,
}

#[derive(Debug, Default)]
struct PoseBuffer {
    generation: u64,
    entries: Vec<PoseEntry>,
    scratch: Vec<PoseEntry>,
    visited: Vec<bool>,
}

/// Lock-guarded per-bone pose of one animation instance
///
/// Cloning the handle shares the same cache; pass a clone to reader threads.
#[derive(Debug, Clone, Default)]
pub struct PoseCache {
    inner: Arc<RwLock<PoseBuffer>>,
}

impl PoseCache {
    /// Cache for `bone_count` bones, initialised to identity
    pub fn new(bone_count: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PoseBuffer {
                generation: 0,
                entries: vec![PoseEntry::default(); bone_count],
                scratch: vec![PoseEntry::default(); bone_count],
                visited: vec![false; bone_count],
            })),
        }
    }

    /// Lock the cache for reading
    ///
    /// Holding the guard blocks pose computation for this instance.
    pub fn read(&self) -> PoseReadGuard<'_> {
        PoseReadGuard {
            guard: self.inner.read(),
        }
    }

    /// Copy of the committed pose with its generation
    pub fn snapshot(&self) -> (u64, Vec<PoseEntry>) {
        let guard = self.inner.read();
        (guard.generation, guard.entries.clone())
    }

    /// Number of committed passes
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Whether two handles refer to the same cache
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run one evaluation pass and commit it
    pub(crate) fn compute(&self, source: &PoseSource<'_>) -> Result<PoseStats> {
        let mut buffer = self.inner.write();
        let buffer = &mut *buffer;

        let stats = walk(source, &mut buffer.scratch, &mut buffer.visited)?;

        std::mem::swap(&mut buffer.entries, &mut buffer.scratch);
        buffer.generation += 1;
        Ok(stats)
    }
}

/// Read access to a committed pose
#[derive(Debug)]
pub struct PoseReadGuard<'a> {
    guard: RwLockReadGuard<'a, PoseBuffer>,
}

impl PoseReadGuard<'_> {
    /// Entries indexed by bone
    pub fn entries(&self) -> &[PoseEntry] {
        &self.guard.entries
    }

    /// Entry for one bone
    pub fn get(&self, bone: usize) -> Option<&PoseEntry> {
        self.guard.entries.get(bone)
    }

    /// Number of committed passes when the lock was taken
    pub fn generation(&self) -> u64 {
        self.guard.generation
    }
}

/// Everything one pass reads
pub(crate) struct PoseSource<'a> {
    pub(crate) skeleton: &'a Skeleton,
    pub(crate) track_map: &'a TrackMap,
    pub(crate) storage: &'a TrackStorage,
    pub(crate) frame: f32,
    pub(crate) looping: bool,
    pub(crate) additive: bool,
    pub(crate) options: EvaluatorOptions,
}

impl PoseSource<'_> {
    pub(crate) fn sample(&self, bone: usize) -> Result<BlendableTransform> {
        if let Some(track) = self.track_map.track_for_bone(bone) {
            return self.storage.sample(track, self.frame, self.looping);
        }
        if self.additive || self.options.untracked == UntrackedBones::Identity {
            return Ok(BlendableTransform::IDENTITY);
        }
        Ok(self
            .skeleton
            .bone(bone)
            .map_or(BlendableTransform::IDENTITY, |b| b.reference))
    }
}

struct WalkFrame {
    bone: usize,
    parent_matrix: Mat4,
    parent_scale: Vec3,
    depth: usize,
}

/// Depth-first walk from every root
///
/// Each bone is sampled the first time it is reached. Later arrivals reuse
/// that result and still descend, so a subtree listed under several parents
/// is reached from each of them.
fn walk(
    source: &PoseSource<'_>,
    scratch: &mut Vec<PoseEntry>,
    visited: &mut Vec<bool>,
) -> Result<PoseStats> {
    let bone_count = source.skeleton.bone_count();
    scratch.clear();
    scratch.resize(bone_count, PoseEntry::default());
    visited.clear();
    visited.resize(bone_count, false);

    let max_depth = source.options.max_depth;
    let mut stats = PoseStats::default();
    let mut stack: Vec<WalkFrame> = source
        .skeleton
        .roots()
        .iter()
        .rev()
        .map(|&bone| WalkFrame {
            bone,
            parent_matrix: Mat4::IDENTITY,
            parent_scale: Vec3::ONE,
            depth: 0,
        })
        .collect();

    while let Some(frame) = stack.pop() {
        let bone = frame.bone;
        if frame.depth > max_depth {
            return Err(AnimError::HierarchyTooDeep { bone, max_depth });
        }
        if bone >= bone_count {
            return Err(AnimError::BoneOutOfRange { bone, bone_count });
        }
        stats.max_depth_reached = stats.max_depth_reached.max(frame.depth);

        let (matrix, scale) = if visited[bone] {
            stats.revisited += 1;
            (scratch[bone].matrix, scratch[bone].scale)
        } else {
            let local = source.sample(bone)?;
            let entry = PoseEntry {
                local,
                matrix: frame.parent_matrix * local.matrix(),
                scale: frame.parent_scale * local.scale,
            };
            scratch[bone] = entry;
            visited[bone] = true;
            stats.sampled += 1;
            (entry.matrix, entry.scale)
        };

        for &child in source.skeleton.children(bone).iter().rev() {
            stack.push(WalkFrame {
                bone: child,
                parent_matrix: matrix,
                parent_scale: scale,
                depth: frame.depth + 1,
            });
        }
    }

    if stats.sampled < bone_count {
        log::warn!(
            "{} of {} bones unreachable from any root",
            bone_count - stats.sampled,
            bone_count
        );
    }
    log::trace!(
        "Pose pass at frame {:.3}: {} sampled, {} revisited",
        source.frame,
        stats.sampled,
        stats.revisited
    );

    Ok(stats)
}

/// Compute poses for many instances in parallel
///
/// Instances own independent caches, so passes do not contend.
#[cfg(feature = "parallel")]
pub fn compute_all(instances: &[crate::instance::AnimationInstance]) -> Vec<Result<PoseStats>> {
    use rayon::prelude::*;

    instances
        .par_iter()
        .map(crate::instance::AnimationInstance::compute_pose)
        .collect()
}
