//! Decoded clip payload and metadata

use crate::error::{AnimError, Result};
use crate::root_motion::ReferenceFrameCurve;
use crate::storage::TrackStorage;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a clip is meant to be combined with others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlendHint {
    /// Samples replace the pose
    #[default]
    Normal,
    /// Legacy additive encoding
    AdditiveDeprecated,
    /// Samples are layered on top of a base pose
    Additive,
}

impl BlendHint {
    /// Map the decoded enumeration value; unknown values are treated as normal
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::AdditiveDeprecated,
            2 => Self::Additive,
            _ => Self::Normal,
        }
    }

    /// Check if samples are additive deltas
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Additive | Self::AdditiveDeprecated)
    }
}

/// Immutable animation clip shared by every instance that plays it
#[derive(Debug, Clone)]
pub struct AnimationData {
    name: String,
    storage: TrackStorage,
    duration: f32,
    frame_duration: f32,
    blend_hint: BlendHint,
    binding: Option<Vec<i16>>,
    root_motion: Option<Arc<dyn ReferenceFrameCurve>>,
}

impl AnimationData {
    /// Wrap decoded track storage with its timing
    ///
    /// `duration` is the clip length in seconds and `frame_duration` the time
    /// between two frames; both must be positive and finite.
    pub fn new(
        name: impl Into<String>,
        storage: impl Into<TrackStorage>,
        duration: f32,
        frame_duration: f32,
    ) -> Result<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(AnimError::InvalidTiming(format!(
                "clip duration {duration} must be positive"
            )));
        }
        if !(frame_duration.is_finite() && frame_duration > 0.0) {
            return Err(AnimError::InvalidTiming(format!(
                "frame duration {frame_duration} must be positive"
            )));
        }

        let name = name.into();
        let storage = storage.into();
        log::debug!(
            "Clip '{}': {} storage, {} tracks, {} frames, {:.3}s",
            name,
            storage.kind(),
            storage.track_count(),
            storage.frame_count(),
            duration
        );

        Ok(Self {
            name,
            storage,
            duration,
            frame_duration,
            blend_hint: BlendHint::Normal,
            binding: None,
            root_motion: None,
        })
    }

    /// Set the blend hint
    pub fn with_blend_hint(mut self, blend_hint: BlendHint) -> Self {
        self.blend_hint = blend_hint;
        self
    }

    /// Set the `track → bone` binding table (-1 = unbound)
    ///
    /// Without a binding, track `i` drives bone `i`.
    pub fn with_binding(mut self, track_to_bone: Vec<i16>) -> Self {
        self.binding = Some(track_to_bone);
        self
    }

    /// Attach a root-motion curve
    pub fn with_root_motion(mut self, curve: Arc<dyn ReferenceFrameCurve>) -> Self {
        self.root_motion = Some(curve);
        self
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Track storage
    pub fn storage(&self) -> &TrackStorage {
        &self.storage
    }

    /// Clip length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds per frame
    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.storage.frame_count()
    }

    /// Blend hint
    pub fn blend_hint(&self) -> BlendHint {
        self.blend_hint
    }

    /// Check if the clip is additive
    pub fn is_additive(&self) -> bool {
        self.blend_hint.is_additive()
    }

    /// Binding table, if one was supplied
    pub fn binding(&self) -> Option<&[i16]> {
        self.binding.as_deref()
    }

    /// Root-motion curve, if any
    pub fn root_motion(&self) -> Option<&Arc<dyn ReferenceFrameCurve>> {
        self.root_motion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InterleavedUncompressed;
    use crate::transform::BlendableTransform;

    fn storage() -> InterleavedUncompressed {
        InterleavedUncompressed::new(1, vec![BlendableTransform::IDENTITY; 4]).unwrap()
    }

    #[test]
    fn test_blend_hint_from_raw() {
        assert_eq!(BlendHint::from_raw(0), BlendHint::Normal);
        assert_eq!(BlendHint::from_raw(1), BlendHint::AdditiveDeprecated);
        assert_eq!(BlendHint::from_raw(2), BlendHint::Additive);
        assert_eq!(BlendHint::from_raw(9), BlendHint::Normal);
        assert!(BlendHint::AdditiveDeprecated.is_additive());
        assert!(!BlendHint::Normal.is_additive());
    }

    #[test]
    fn test_timing_validated() {
        assert!(AnimationData::new("a", storage(), 0.0, 0.1).is_err());
        assert!(AnimationData::new("a", storage(), 1.0, f32::NAN).is_err());
        assert!(AnimationData::new("a", storage(), -1.0, 0.1).is_err());
    }

    #[test]
    fn test_builder() {
        let data = AnimationData::new("idle", storage(), 0.1, 1.0 / 30.0)
            .unwrap()
            .with_blend_hint(BlendHint::Additive)
            .with_binding(vec![0]);
        assert_eq!(data.name(), "idle");
        assert_eq!(data.frame_count(), 4);
        assert!(data.is_additive());
        assert_eq!(data.binding(), Some(&[0i16][..]));
        assert!(data.root_motion().is_none());
    }
}
