//! Blendable bone transforms
//!
//! A [`BlendableTransform`] is one sampled pose fragment: translation,
//! rotation and scale in the parent bone's space. Samples are produced fresh by
//! every storage lookup and are never mutated afterwards.

use glam::{Mat4, Quat, Vec3, Vec4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Values that can be combined affinely, used by keyframe and spline evaluation
pub trait Lerp: Copy {
    /// Component-wise `self * (1 - t) + other * t`
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::lerp(*self, *other, t)
    }
}

impl Lerp for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::lerp(*self, *other, t)
    }
}

/// Raw component blend, no sign flip and no normalisation.
///
/// Spline control points are blended this way and normalised once at the end.
impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::from_vec4(Vec4::from(*self).lerp(Vec4::from(*other), t))
    }
}

/// Translation, rotation and scale of one bone relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlendableTransform {
    /// Translation in parent space
    pub translation: Vec3,
    /// Rotation in parent space
    pub rotation: Quat,
    /// Scale, accumulated separately down the hierarchy
    pub scale: Vec3,
}

impl BlendableTransform {
    /// Identity transform (no translation, no rotation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Transform with only a translation
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Interpolate towards `other`
    ///
    /// Translation and scale are blended linearly, rotation with shortest-path
    /// spherical interpolation. `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 {
            return *self;
        }
        if t == 1.0 {
            return *other;
        }
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t).normalize(),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Express `self` (a child-local transform) in the space of `parent`
    pub fn compose(&self, parent: &Self) -> Self {
        Self {
            translation: parent.translation + parent.rotation * (parent.scale * self.translation),
            rotation: (parent.rotation * self.rotation).normalize(),
            scale: parent.scale * self.scale,
        }
    }

    /// Layer an additive sample on top of this base pose
    ///
    /// `weight` scales the additive contribution: 0 leaves the base untouched,
    /// 1 applies it fully.
    pub fn apply_additive(&self, additive: &Self, weight: f32) -> Self {
        let weighted = Self::IDENTITY.lerp(additive, weight);
        Self {
            translation: self.translation + weighted.translation,
            rotation: (weighted.rotation * self.rotation).normalize(),
            scale: self.scale * weighted.scale,
        }
    }

    /// Normalised weighted blend of several samples
    ///
    /// Returns `None` when the weights sum to zero or the input is empty.
    pub fn blend_weighted(samples: &[(Self, f32)]) -> Option<Self> {
        let mut accumulated: Option<(Self, f32)> = None;
        for (sample, weight) in samples {
            if *weight <= 0.0 {
                continue;
            }
            accumulated = Some(match accumulated {
                None => (*sample, *weight),
                Some((current, total)) => {
                    let total = total + weight;
                    (current.lerp(sample, weight / total), total)
                }
            });
        }
        accumulated.map(|(blended, _)| blended)
    }

    /// Rotation and translation as a matrix, scale excluded
    ///
    /// Scale is carried separately through the hierarchy walk.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Full local matrix including scale
    pub fn scaled_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for BlendableTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
