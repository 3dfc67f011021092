//! Track storage strategies
//!
//! Both strategies answer the same question: what is track `n` at fractional
//! frame `f`? Both resolve `f` with [`FrameCursor`] and agree at every integer
//! frame. Between frames, interleaved storage blends the two neighbouring
//! samples with [`BlendableTransform::lerp`]; spline storage evaluates its
//! curves at the fractional offset inside the owning block and only blends
//! across block boundaries and the loop wrap.

mod interleaved;
mod spline;

pub use interleaved::InterleavedUncompressed;
pub use spline::{BSpline, SplineBlock, SplineChannel, SplineCompressed, SplineTrack};

use crate::error::Result;
use crate::transform::BlendableTransform;

/// Integer frames bracketing a fractional frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCursor {
    /// Frame at or before the sample point
    pub frame_a: usize,
    /// Frame after the sample point (wraps to 0 when looping)
    pub frame_b: usize,
    /// Blend factor between the two, in `[0, 1)`
    pub t: f32,
}

impl FrameCursor {
    /// Resolve a fractional frame against a clip of `frame_count` frames
    ///
    /// Looping clips wrap modulo `frame_count` and blend the last frame back
    /// into frame 0. Other clips clamp to `[0, frame_count - 1]`. Non-finite
    /// input resolves to frame 0.
    pub fn resolve(fractional_frame: f32, frame_count: usize, looping: bool) -> Self {
        if frame_count <= 1 || !fractional_frame.is_finite() {
            return Self {
                frame_a: 0,
                frame_b: 0,
                t: 0.0,
            };
        }

        let last = frame_count - 1;
        let frame = if looping {
            fractional_frame.rem_euclid(frame_count as f32)
        } else {
            fractional_frame.clamp(0.0, last as f32)
        };

        let frame_a = (frame.floor() as usize).min(last);
        let t = (frame - frame_a as f32).clamp(0.0, 1.0);
        let frame_b = if frame_a < last {
            frame_a + 1
        } else if looping {
            0
        } else {
            last
        };

        Self { frame_a, frame_b, t }
    }
}

/// Decoded animation track data, one variant per storage strategy
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackStorage {
    /// Block-partitioned spline channels
    SplineCompressed(SplineCompressed),
    /// Flat per-frame, per-track samples
    InterleavedUncompressed(InterleavedUncompressed),
}

impl TrackStorage {
    /// Sample a track at a fractional frame
    pub fn sample(
        &self,
        track: usize,
        fractional_frame: f32,
        looping: bool,
    ) -> Result<BlendableTransform> {
        match self {
            Self::SplineCompressed(storage) => storage.sample(track, fractional_frame, looping),
            Self::InterleavedUncompressed(storage) => {
                storage.sample(track, fractional_frame, looping)
            }
        }
    }

    /// Sample a track at an integer frame, without interpolation
    pub fn sample_frame(&self, track: usize, frame: usize) -> Result<BlendableTransform> {
        match self {
            Self::SplineCompressed(storage) => storage.sample_frame(track, frame),
            Self::InterleavedUncompressed(storage) => storage.sample_frame(track, frame),
        }
    }

    /// Number of frames in the clip
    pub fn frame_count(&self) -> usize {
        match self {
            Self::SplineCompressed(storage) => storage.frame_count(),
            Self::InterleavedUncompressed(storage) => storage.frame_count(),
        }
    }

    /// Number of transform tracks
    pub fn track_count(&self) -> usize {
        match self {
            Self::SplineCompressed(storage) => storage.track_count(),
            Self::InterleavedUncompressed(storage) => storage.track_count(),
        }
    }

    /// Short strategy name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SplineCompressed(_) => "spline-compressed",
            Self::InterleavedUncompressed(_) => "interleaved-uncompressed",
        }
    }
}

impl From<SplineCompressed> for TrackStorage {
    fn from(storage: SplineCompressed) -> Self {
        Self::SplineCompressed(storage)
    }
}

impl From<InterleavedUncompressed> for TrackStorage {
    fn from(storage: InterleavedUncompressed) -> Self {
        Self::InterleavedUncompressed(storage)
    }
}
