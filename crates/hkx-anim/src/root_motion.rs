//! Root motion playback
//!
//! A clip's reference-frame curve describes how the character root travels
//! over time: `xyz` is translation and `w` is heading (radians about the up
//! axis). The curve itself is a pure function of time supplied by the decoder;
//! [`RootMotionPlayer`] owns the state around it: where the root is now, where
//! it was one step ago, and any rotation layered on by a controller.

use glam::{Quat, Vec3, Vec4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Root displacement as a function of clip time
pub trait ReferenceFrameCurve: Send + Sync + Debug {
    /// Length of the curve in seconds
    fn duration(&self) -> f32;

    /// Displacement at `time`, clamped to `[0, duration]`
    fn sample(&self, time: f32) -> Vec4;

    /// Axis the heading component rotates about
    fn up_axis(&self) -> Vec3 {
        Vec3::Y
    }
}

/// Evenly spaced reference-frame samples, linearly interpolated
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceFrameSamples {
    /// Axis the heading component rotates about
    pub up: Vec3,
    /// Curve duration in seconds
    pub duration: f32,
    /// Samples spread from time 0 to `duration`
    pub samples: Vec<Vec4>,
}

impl ReferenceFrameSamples {
    /// Samples with a Y-up reference frame
    pub fn new(duration: f32, samples: Vec<Vec4>) -> Self {
        Self {
            up: Vec3::Y,
            duration,
            samples,
        }
    }
}

impl ReferenceFrameCurve for ReferenceFrameSamples {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn sample(&self, time: f32) -> Vec4 {
        match self.samples.len() {
            0 => Vec4::ZERO,
            1 => self.samples[0],
            count => {
                if self.duration <= 0.0 || !time.is_finite() {
                    return self.samples[0];
                }
                let last = count - 1;
                let position = (time / self.duration).clamp(0.0, 1.0) * last as f32;
                let index = (position.floor() as usize).min(last);
                let next = (index + 1).min(last);
                self.samples[index].lerp(self.samples[next], position - index as f32)
            }
        }
    }

    fn up_axis(&self) -> Vec3 {
        self.up.try_normalize().unwrap_or(Vec3::Y)
    }
}

/// Mutable root-motion state for one animation instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMotionState {
    /// Curve displacement at the last time set
    pub last_sampled_displacement: Vec4,
    /// Accumulated root transform (`xyz` position, `w` heading)
    pub cumulative: Vec4,
    /// Accumulated root transform before the last step
    pub previous_cumulative: Vec4,
    /// Heading the instance started from
    pub start_heading: f32,
    /// Rotation layered on by controllers since the last reset
    pub external_rotation: f32,
}

impl Default for RootMotionState {
    fn default() -> Self {
        Self {
            last_sampled_displacement: Vec4::ZERO,
            cumulative: Vec4::ZERO,
            previous_cumulative: Vec4::ZERO,
            start_heading: 0.0,
            external_rotation: 0.0,
        }
    }
}

/// Drives the root-motion state from clip time
#[derive(Debug, Clone)]
pub struct RootMotionPlayer {
    curve: Option<Arc<dyn ReferenceFrameCurve>>,
    state: RootMotionState,
    time: f32,
}

impl RootMotionPlayer {
    /// Create a player at the origin
    pub fn new(curve: Option<Arc<dyn ReferenceFrameCurve>>) -> Self {
        let mut player = Self {
            curve,
            state: RootMotionState::default(),
            time: 0.0,
        };
        player.reset_to_start(Vec4::ZERO);
        player
    }

    /// Restart from `origin` (`xyz` position, `w` heading)
    pub fn reset_to_start(&mut self, origin: Vec4) {
        self.time = 0.0;
        self.state = RootMotionState {
            last_sampled_displacement: self.displacement(0.0),
            cumulative: origin,
            previous_cumulative: origin,
            start_heading: origin.w,
            external_rotation: 0.0,
        };
    }

    /// Move to absolute clip time `time`
    ///
    /// The curve step since the previous call is rotated into the instance's
    /// heading and added to the cumulative transform. The value before the
    /// step is kept for [`delta`](Self::delta).
    pub fn set_time(&mut self, time: f32) {
        let sampled = self.displacement(time);
        let step = sampled - self.state.last_sampled_displacement;

        let heading = self.state.start_heading + self.state.external_rotation;
        let translation = if heading == 0.0 {
            step.truncate()
        } else {
            Quat::from_axis_angle(self.up_axis(), heading) * step.truncate()
        };

        self.state.previous_cumulative = self.state.cumulative;
        self.state.cumulative += translation.extend(step.w);
        self.state.last_sampled_displacement = sampled;
        self.time = time;
    }

    /// Layer an extra rotation and translation onto the running state
    ///
    /// The curve is untouched; later steps are rotated by the accumulated
    /// external rotation. The offset moves both the current and the
    /// previous transform, so [`delta`](Self::delta) keeps reporting clip
    /// motion only.
    pub fn apply_external_transform(&mut self, rotation: f32, translation: Vec3) {
        let offset = translation.extend(rotation);
        self.state.external_rotation += rotation;
        self.state.cumulative += offset;
        self.state.previous_cumulative += offset;
    }

    /// Clip root motion accumulated by the last [`set_time`](Self::set_time)
    pub fn delta(&self) -> Vec4 {
        self.state.cumulative - self.state.previous_cumulative
    }

    /// Current accumulated root transform
    pub fn current(&self) -> Vec4 {
        self.state.cumulative
    }

    /// Full state snapshot
    pub fn state(&self) -> RootMotionState {
        self.state
    }

    /// Last time passed to [`set_time`](Self::set_time)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether a curve is attached
    pub fn has_curve(&self) -> bool {
        self.curve.is_some()
    }

    /// Curve displacement at an unbounded time
    ///
    /// Whole loops past the curve's end add the displacement of one full
    /// cycle each, so a looping walk keeps moving forward.
    pub fn displacement(&self, time: f32) -> Vec4 {
        let Some(curve) = &self.curve else {
            return Vec4::ZERO;
        };
        let duration = curve.duration();
        if duration <= 0.0 || !time.is_finite() {
            return curve.sample(0.0);
        }

        let loops = (time / duration).floor();
        let local = time - loops * duration;
        if loops == 0.0 {
            return curve.sample(local);
        }
        let per_loop = curve.sample(duration) - curve.sample(0.0);
        curve.sample(local) + per_loop * loops
    }

    fn up_axis(&self) -> Vec3 {
        self.curve.as_ref().map_or(Vec3::Y, |curve| curve.up_axis())
    }
}
