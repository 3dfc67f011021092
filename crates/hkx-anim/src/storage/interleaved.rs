//! Interleaved uncompressed tracks: every track's transform for every frame

use super::FrameCursor;
use crate::error::{AnimError, Result};
use crate::transform::BlendableTransform;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Flat transform array indexed by `frame * track_count + track`
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "InterleavedParts"))]
pub struct InterleavedUncompressed {
    track_count: usize,
    frame_count: usize,
    transforms: Vec<BlendableTransform>,
}

/// Unvalidated fields, checked by [`InterleavedUncompressed::new`] on deserialize
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct InterleavedParts {
    track_count: usize,
    frame_count: usize,
    transforms: Vec<BlendableTransform>,
}

#[cfg(feature = "serde")]
impl TryFrom<InterleavedParts> for InterleavedUncompressed {
    type Error = AnimError;

    fn try_from(parts: InterleavedParts) -> Result<Self> {
        let storage = Self::new(parts.track_count, parts.transforms)?;
        if storage.frame_count != parts.frame_count {
            return Err(AnimError::InvalidLayout(format!(
                "{} frames declared, {} stored",
                parts.frame_count, storage.frame_count
            )));
        }
        Ok(storage)
    }
}

impl InterleavedUncompressed {
    /// Wrap a decoded transform array
    ///
    /// `transforms.len()` must be a non-zero multiple of `track_count`.
    pub fn new(track_count: usize, transforms: Vec<BlendableTransform>) -> Result<Self> {
        if track_count == 0 {
            return Err(AnimError::InvalidLayout("interleaved clip has no tracks".to_string()));
        }
        if transforms.is_empty() || transforms.len() % track_count != 0 {
            return Err(AnimError::InvalidLayout(format!(
                "{} transforms is not a whole number of frames of {} tracks",
                transforms.len(),
                track_count
            )));
        }
        let frame_count = transforms.len() / track_count;

        log::debug!("Interleaved clip: {track_count} tracks x {frame_count} frames");

        Ok(Self {
            track_count,
            frame_count,
            transforms,
        })
    }

    /// Build from per-frame rows of track transforms
    pub fn from_frames(frames: Vec<Vec<BlendableTransform>>) -> Result<Self> {
        let track_count = frames.first().map_or(0, Vec::len);
        if let Some(row) = frames.iter().position(|row| row.len() != track_count) {
            return Err(AnimError::InvalidLayout(format!(
                "frame {row} has {} tracks, expected {track_count}",
                frames[row].len()
            )));
        }
        Self::new(track_count, frames.into_iter().flatten().collect())
    }

    /// Transform of `track` at a fractional frame
    ///
    /// Neighbouring frames are blended with [`BlendableTransform::lerp`].
    pub fn sample(
        &self,
        track: usize,
        fractional_frame: f32,
        looping: bool,
    ) -> Result<BlendableTransform> {
        let cursor = FrameCursor::resolve(fractional_frame, self.frame_count, looping);
        let a = self.sample_frame(track, cursor.frame_a)?;
        if cursor.t == 0.0 || cursor.frame_a == cursor.frame_b {
            return Ok(a);
        }
        let b = self.sample_frame(track, cursor.frame_b)?;
        Ok(a.lerp(&b, cursor.t))
    }

    /// Transform of `track` at integer `frame`
    pub fn sample_frame(&self, track: usize, frame: usize) -> Result<BlendableTransform> {
        if track >= self.track_count {
            return Err(AnimError::TrackOutOfRange {
                track,
                track_count: self.track_count,
            });
        }
        let frame = frame.min(self.frame_count.saturating_sub(1));
        self.transforms
            .get(frame * self.track_count + track)
            .copied()
            .ok_or_else(|| AnimError::InvalidLayout(format!("frame {frame} missing")))
    }

    /// Number of tracks per frame
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Raw transform array
    pub fn transforms(&self) -> &[BlendableTransform] {
        &self.transforms
    }
}
