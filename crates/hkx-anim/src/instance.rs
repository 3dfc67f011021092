//! Playback of one clip on one skeleton

use crate::data::{AnimationData, BlendHint};
use crate::error::{AnimError, Result};
use crate::pose::{EvaluatorOptions, PoseCache, PoseSource, PoseStats};
use crate::root_motion::{RootMotionPlayer, RootMotionState};
use crate::skeleton::Skeleton;
use crate::track_map::TrackMap;
use crate::transform::BlendableTransform;
use glam::{Vec3, Vec4};
use std::fmt;
use std::sync::Arc;

/// An animation clip bound to a skeleton, with its own playback state
///
/// The clip, skeleton and track map are shared; time, weights, root motion
/// and the pose cache belong to this instance.
#[derive(Debug)]
pub struct AnimationInstance {
    data: Arc<AnimationData>,
    skeleton: Arc<Skeleton>,
    track_map: Arc<TrackMap>,
    current_time: f32,
    weight: f32,
    reference_weight: f32,
    looping: bool,
    root_motion: RootMotionPlayer,
    pose: PoseCache,
    options: EvaluatorOptions,
}

impl AnimationInstance {
    /// Bind a clip to a skeleton
    ///
    /// The clip's binding table maps tracks to bones; without one, track `i`
    /// drives bone `i`.
    pub fn new(data: Arc<AnimationData>, skeleton: Arc<Skeleton>) -> Result<Self> {
        let bone_count = skeleton.bone_count();
        let track_map = match data.binding() {
            Some(binding) => TrackMap::from_track_to_bone(binding, bone_count)?,
            None => TrackMap::identity(data.storage().track_count(), bone_count),
        };

        log::debug!(
            "Instance '{}': {} of {} bones tracked",
            data.name(),
            track_map.bound_bone_count(),
            bone_count
        );

        Ok(Self::with_parts(
            data,
            skeleton,
            Arc::new(track_map),
            false,
            EvaluatorOptions::default(),
        ))
    }

    fn with_parts(
        data: Arc<AnimationData>,
        skeleton: Arc<Skeleton>,
        track_map: Arc<TrackMap>,
        looping: bool,
        options: EvaluatorOptions,
    ) -> Self {
        let root_motion = RootMotionPlayer::new(data.root_motion().cloned());
        let pose = PoseCache::new(skeleton.bone_count());
        Self {
            data,
            skeleton,
            track_map,
            current_time: 0.0,
            weight: 1.0,
            reference_weight: 1.0,
            looping,
            root_motion,
            pose,
            options,
        }
    }

    /// Set evaluator options
    pub fn with_options(mut self, options: EvaluatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the looping flag
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Clip name
    pub fn name(&self) -> &str {
        self.data.name()
    }

    /// Shared clip data
    pub fn data(&self) -> &Arc<AnimationData> {
        &self.data
    }

    /// Shared skeleton
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    /// Shared bone/track map
    pub fn track_map(&self) -> &Arc<TrackMap> {
        &self.track_map
    }

    /// Evaluator options
    pub fn options(&self) -> EvaluatorOptions {
        self.options
    }

    /// Clip length in seconds
    pub fn duration(&self) -> f32 {
        self.data.duration()
    }

    /// Seconds per frame
    pub fn frame_duration(&self) -> f32 {
        self.data.frame_duration()
    }

    /// Number of frames in the clip
    pub fn frame_count(&self) -> usize {
        self.data.frame_count()
    }

    /// Blend hint of the clip
    pub fn blend_hint(&self) -> BlendHint {
        self.data.blend_hint()
    }

    /// Check if the clip is additive
    pub fn is_additive(&self) -> bool {
        self.data.is_additive()
    }

    /// Playback time in seconds
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Playback position as a fractional frame
    pub fn current_frame(&self) -> f32 {
        self.current_time / self.data.frame_duration()
    }

    /// A non-looping instance has ended once it reaches its duration
    pub fn is_ended(&self) -> bool {
        !self.looping && self.current_time >= self.data.duration()
    }

    /// Blend weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the blend weight
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Weight of the reference pose when blending
    pub fn reference_weight(&self) -> f32 {
        self.reference_weight
    }

    /// Set the reference pose weight
    pub fn set_reference_weight(&mut self, weight: f32) {
        self.reference_weight = weight;
    }

    /// Whether playback wraps at the end of the clip
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Set whether playback wraps at the end of the clip
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance (or rewind) playback by `dt` seconds
    ///
    /// Non-looping instances clamp to `[0, duration]`. Root motion follows the
    /// new time.
    pub fn scrub_relative(&mut self, dt: f32) {
        self.set_time(self.current_time + dt);
    }

    /// Jump to absolute time `time`, clamped like [`scrub_relative`](Self::scrub_relative)
    pub fn seek(&mut self, time: f32) {
        self.set_time(time);
    }

    fn set_time(&mut self, time: f32) {
        let time = if time.is_nan() { 0.0 } else { time };
        self.current_time = if self.looping {
            time
        } else {
            time.clamp(0.0, self.data.duration())
        };
        self.root_motion.set_time(self.current_time);
    }

    /// Return to time 0 with root motion starting from `origin`
    ///
    /// `origin` carries position in `xyz` and heading in `w`.
    pub fn reset(&mut self, origin: Vec4) {
        self.current_time = 0.0;
        self.root_motion.reset_to_start(origin);
    }

    /// Turn the root by `rotation` radians about the curve's up axis
    pub fn apply_external_rotation(&mut self, rotation: f32) {
        self.root_motion.apply_external_transform(rotation, Vec3::ZERO);
    }

    /// Root-motion player
    pub fn root_motion(&self) -> &RootMotionPlayer {
        &self.root_motion
    }

    /// Mutable root-motion player, for controllers layering transforms
    pub fn root_motion_mut(&mut self) -> &mut RootMotionPlayer {
        &mut self.root_motion
    }

    /// Root-motion state snapshot
    pub fn root_motion_state(&self) -> RootMotionState {
        self.root_motion.state()
    }

    /// Root motion accumulated by the last time change
    pub fn root_motion_delta(&self) -> Vec4 {
        self.root_motion.delta()
    }

    /// Local transform of one bone at the current time
    ///
    /// Does not touch the pose cache.
    pub fn sample_bone(&self, bone: usize) -> Result<BlendableTransform> {
        let bone_count = self.skeleton.bone_count();
        if bone >= bone_count {
            return Err(AnimError::BoneOutOfRange { bone, bone_count });
        }
        self.pose_source().sample(bone)
    }

    /// Evaluate the whole skeleton at the current time into the pose cache
    ///
    /// On error the cache keeps its previous pose.
    pub fn compute_pose(&self) -> Result<PoseStats> {
        let stats = self.pose.compute(&self.pose_source())?;
        log::debug!(
            "Pose '{}' at {:.3}s: {} bones, depth {}",
            self.data.name(),
            self.current_time,
            stats.sampled,
            stats.max_depth_reached
        );
        Ok(stats)
    }

    /// Handle to this instance's pose cache
    pub fn pose_cache(&self) -> &PoseCache {
        &self.pose
    }

    fn pose_source(&self) -> PoseSource<'_> {
        PoseSource {
            skeleton: &self.skeleton,
            track_map: &self.track_map,
            storage: self.data.storage(),
            frame: self.current_frame(),
            looping: self.looping,
            additive: self.data.is_additive(),
            options: self.options,
        }
    }
}

impl Clone for AnimationInstance {
    /// Share the clip, skeleton and track map; start playback state fresh
    fn clone(&self) -> Self {
        Self::with_parts(
            Arc::clone(&self.data),
            Arc::clone(&self.skeleton),
            Arc::clone(&self.track_map),
            self.looping,
            self.options,
        )
    }
}

impl fmt::Display for AnimationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} FPS]",
            self.data.name(),
            1.0 / self.data.frame_duration()
        )
    }
}
