//! Spline-compressed tracks
//!
//! The clip is cut into blocks of `frames_per_block` frames. Each block holds,
//! for every track, one channel per component (translation, rotation, scale).
//! A channel is either a constant or a clamped B-spline over the block's local
//! frame range. Rotation splines are blended component-wise and normalised
//! once evaluated.

use super::FrameCursor;
use crate::error::{AnimError, Result};
use crate::transform::{BlendableTransform, Lerp};
use glam::{Quat, Vec3, Vec4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest spline degree accepted
pub const MAX_SPLINE_DEGREE: usize = 7;

/// Clamped B-spline over local frame time
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "BSplineParts<T>",
        bound(deserialize = "T: Lerp + Deserialize<'de>")
    )
)]
pub struct BSpline<T> {
    degree: usize,
    knots: Vec<f32>,
    control_points: Vec<T>,
}

/// Unvalidated spline fields, checked by [`BSpline::new`] on deserialize
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct BSplineParts<T> {
    degree: usize,
    knots: Vec<f32>,
    control_points: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T: Lerp> TryFrom<BSplineParts<T>> for BSpline<T> {
    type Error = AnimError;

    fn try_from(parts: BSplineParts<T>) -> Result<Self> {
        Self::new(parts.degree, parts.knots, parts.control_points)
    }
}

impl<T: Lerp> BSpline<T> {
    /// Create a spline, validating the knot vector against the control points
    pub fn new(degree: usize, knots: Vec<f32>, control_points: Vec<T>) -> Result<Self> {
        if degree == 0 || degree > MAX_SPLINE_DEGREE {
            return Err(AnimError::InvalidSpline(format!(
                "degree {degree} outside 1..={MAX_SPLINE_DEGREE}"
            )));
        }
        let n = control_points.len();
        if n <= degree {
            return Err(AnimError::InvalidSpline(format!(
                "{n} control points cannot form a degree {degree} spline"
            )));
        }
        if knots.len() != n + degree + 1 {
            return Err(AnimError::InvalidSpline(format!(
                "expected {} knots for {n} control points of degree {degree}, got {}",
                n + degree + 1,
                knots.len()
            )));
        }
        if knots.iter().any(|k| !k.is_finite()) || knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(AnimError::InvalidSpline(
                "knot vector must be finite and non-decreasing".to_string(),
            ));
        }
        if knots[degree] >= knots[n] {
            return Err(AnimError::InvalidSpline(
                "spline has an empty parameter domain".to_string(),
            ));
        }
        Ok(Self {
            degree,
            knots,
            control_points,
        })
    }

    /// Degree-1 spline passing through `points` at local frames 0, 1, 2, …
    ///
    /// A single point is held constant over `[0, 1]`.
    pub fn linear_through(points: Vec<T>) -> Result<Self> {
        let mut points = points;
        match points.len() {
            0 => {
                return Err(AnimError::InvalidSpline(
                    "cannot fit a spline through no points".to_string(),
                ));
            }
            1 => points.push(points[0]),
            _ => {}
        }
        let last = (points.len() - 1) as f32;
        let knots = std::iter::once(0.0)
            .chain((0..points.len()).map(|i| i as f32))
            .chain(std::iter::once(last))
            .collect();
        Self::new(1, knots, points)
    }

    /// Evaluate at local frame `u`, clamped to the spline's domain
    pub fn evaluate(&self, u: f32) -> T {
        let p = self.degree;
        let n = self.control_points.len();
        let low = self.knots[p];
        let high = self.knots[n];
        let u = if u.is_nan() { low } else { u.clamp(low, high) };

        // Knot span: largest k in [p, n) with knots[k] <= u
        let mut k = p + self.knots[p..n].partition_point(|&knot| knot <= u) - 1;
        while k > p && self.knots[k] == self.knots[k + 1] {
            k -= 1;
        }

        // de Boor
        let mut d = [self.control_points[k - p]; MAX_SPLINE_DEGREE + 1];
        for (j, slot) in d.iter_mut().enumerate().take(p + 1) {
            *slot = self.control_points[j + k - p];
        }
        for r in 1..=p {
            for j in (r..=p).rev() {
                let left = self.knots[j + k - p];
                let right = self.knots[j + 1 + k - r];
                let span = right - left;
                let alpha = if span > 0.0 { (u - left) / span } else { 0.0 };
                d[j] = d[j - 1].lerp(&d[j], alpha);
            }
        }
        d[p]
    }

    /// Spline degree
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Knot vector
    pub fn knots(&self) -> &[f32] {
        &self.knots
    }

    /// Control points
    pub fn control_points(&self) -> &[T] {
        &self.control_points
    }
}

/// One component channel of a spline track
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "T: Lerp + Deserialize<'de>"))
)]
pub enum SplineChannel<T> {
    /// Constant over the whole block
    Static(T),
    /// Animated over the block's local frames
    Spline(BSpline<T>),
}

impl<T: Lerp> SplineChannel<T> {
    /// Evaluate at local frame `u`
    pub fn evaluate(&self, u: f32) -> T {
        match self {
            Self::Static(value) => *value,
            Self::Spline(spline) => spline.evaluate(u),
        }
    }
}

/// Translation, rotation and scale channels for one track in one block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplineTrack {
    /// Translation channel
    pub translation: SplineChannel<Vec3>,
    /// Rotation channel, normalised after evaluation
    pub rotation: SplineChannel<Quat>,
    /// Scale channel
    pub scale: SplineChannel<Vec3>,
}

impl SplineTrack {
    /// Track holding a constant transform
    pub fn constant(transform: BlendableTransform) -> Self {
        Self {
            translation: SplineChannel::Static(transform.translation),
            rotation: SplineChannel::Static(transform.rotation),
            scale: SplineChannel::Static(transform.scale),
        }
    }

    /// Degree-1 track interpolating one transform per local frame
    ///
    /// Components that never change are stored as constants.
    pub fn linear_through(samples: &[BlendableTransform]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AnimError::InvalidSpline(
                "cannot fit a track through no samples".to_string(),
            ));
        }

        fn channel<T: Lerp + PartialEq>(values: Vec<T>) -> Result<SplineChannel<T>> {
            if values.windows(2).all(|w| w[0] == w[1]) {
                Ok(SplineChannel::Static(values[0]))
            } else {
                BSpline::linear_through(values).map(SplineChannel::Spline)
            }
        }

        Ok(Self {
            translation: channel(samples.iter().map(|s| s.translation).collect())?,
            rotation: channel(samples.iter().map(|s| s.rotation).collect())?,
            scale: channel(samples.iter().map(|s| s.scale).collect())?,
        })
    }

    /// Evaluate at local frame `u`
    pub fn evaluate(&self, u: f32) -> BlendableTransform {
        let rotation = self.rotation.evaluate(u);
        BlendableTransform {
            translation: self.translation.evaluate(u),
            rotation: Vec4::from(rotation)
                .try_normalize()
                .map_or(Quat::IDENTITY, Quat::from_vec4),
            scale: self.scale.evaluate(u),
        }
    }
}

/// All tracks of one block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplineBlock {
    /// One entry per transform track
    pub tracks: Vec<SplineTrack>,
}

/// Block-partitioned spline animation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SplineCompressedParts"))]
pub struct SplineCompressed {
    frame_count: usize,
    frames_per_block: usize,
    track_count: usize,
    blocks: Vec<SplineBlock>,
}

/// Unvalidated fields, checked by [`SplineCompressed::new`] on deserialize
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct SplineCompressedParts {
    frame_count: usize,
    frames_per_block: usize,
    track_count: usize,
    blocks: Vec<SplineBlock>,
}

#[cfg(feature = "serde")]
impl TryFrom<SplineCompressedParts> for SplineCompressed {
    type Error = AnimError;

    fn try_from(parts: SplineCompressedParts) -> Result<Self> {
        let storage = Self::new(parts.frame_count, parts.frames_per_block, parts.blocks)?;
        if storage.track_count != parts.track_count {
            return Err(AnimError::InvalidLayout(format!(
                "{} tracks declared, {} stored",
                parts.track_count, storage.track_count
            )));
        }
        Ok(storage)
    }
}

impl SplineCompressed {
    /// Wrap decoded blocks
    ///
    /// Requires `ceil(frame_count / frames_per_block)` blocks, each with the
    /// same number of tracks.
    pub fn new(
        frame_count: usize,
        frames_per_block: usize,
        blocks: Vec<SplineBlock>,
    ) -> Result<Self> {
        if frame_count == 0 || frames_per_block == 0 {
            return Err(AnimError::InvalidLayout(format!(
                "{frame_count} frames in blocks of {frames_per_block}"
            )));
        }
        let expected_blocks = frame_count.div_ceil(frames_per_block);
        if blocks.len() != expected_blocks {
            return Err(AnimError::InvalidLayout(format!(
                "{frame_count} frames in blocks of {frames_per_block} need {expected_blocks} blocks, got {}",
                blocks.len()
            )));
        }
        let track_count = blocks[0].tracks.len();
        if track_count == 0 {
            return Err(AnimError::InvalidLayout("spline clip has no tracks".to_string()));
        }
        if let Some(block) = blocks.iter().position(|b| b.tracks.len() != track_count) {
            return Err(AnimError::InvalidLayout(format!(
                "block {block} has {} tracks, expected {track_count}",
                blocks[block].tracks.len()
            )));
        }

        log::debug!(
            "Spline clip: {track_count} tracks x {frame_count} frames in {} blocks of {frames_per_block}",
            blocks.len()
        );

        Ok(Self {
            frame_count,
            frames_per_block,
            track_count,
            blocks,
        })
    }

    /// Fit degree-1 blocks through per-frame rows of track transforms
    pub fn encode_linear(
        frames_per_block: usize,
        frames: &[Vec<BlendableTransform>],
    ) -> Result<Self> {
        if frames_per_block == 0 || frames.is_empty() {
            return Err(AnimError::InvalidLayout("nothing to encode".to_string()));
        }
        let track_count = frames[0].len();
        if frames.iter().any(|row| row.len() != track_count) {
            return Err(AnimError::InvalidLayout("frames disagree on track count".to_string()));
        }

        let blocks = frames
            .chunks(frames_per_block)
            .map(|rows| {
                let tracks = (0..track_count)
                    .map(|track| {
                        let samples: Vec<_> = rows.iter().map(|row| row[track]).collect();
                        SplineTrack::linear_through(&samples)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SplineBlock { tracks })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(frames.len(), frames_per_block, blocks)
    }

    /// Block owning an integer frame, and the frame's offset inside it
    ///
    /// Frames past the end clamp to the last frame.
    pub fn frame_to_block(&self, frame: usize) -> (usize, usize) {
        let frame = frame.min(self.frame_count - 1);
        let block = (frame / self.frames_per_block).min(self.blocks.len() - 1);
        (block, frame - block * self.frames_per_block)
    }

    /// Transform of `track` at a fractional frame
    ///
    /// Within a block the track's curves are evaluated at the fractional
    /// offset into the block. Between the last frame of one block and the
    /// first of the next, and when a looping clip wraps from its last frame
    /// back to frame 0, the two integer-frame samples are blended with
    /// [`BlendableTransform::lerp`].
    pub fn sample(
        &self,
        track: usize,
        fractional_frame: f32,
        looping: bool,
    ) -> Result<BlendableTransform> {
        let track = self.track(track)?;
        let cursor = FrameCursor::resolve(fractional_frame, self.frame_count, looping);
        let (block, local) = self.frame_to_block(cursor.frame_a);
        let a_track = &self.blocks[block].tracks[track];

        if cursor.t == 0.0 || cursor.frame_a == cursor.frame_b {
            return Ok(a_track.evaluate(local as f32));
        }
        if cursor.frame_b == cursor.frame_a + 1 && self.frame_to_block(cursor.frame_b).0 == block {
            return Ok(a_track.evaluate(local as f32 + cursor.t));
        }

        let a = a_track.evaluate(local as f32);
        let b = self.sample_frame(track, cursor.frame_b)?;
        Ok(a.lerp(&b, cursor.t))
    }

    /// Transform of `track` at integer `frame`
    pub fn sample_frame(&self, track: usize, frame: usize) -> Result<BlendableTransform> {
        let track = self.track(track)?;
        let (block, local) = self.frame_to_block(frame);
        Ok(self.blocks[block].tracks[track].evaluate(local as f32))
    }

    fn track(&self, track: usize) -> Result<usize> {
        if track >= self.track_count {
            return Err(AnimError::TrackOutOfRange {
                track,
                track_count: self.track_count,
            });
        }
        Ok(track)
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Frames per block
    pub fn frames_per_block(&self) -> usize {
        self.frames_per_block
    }

    /// Number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of tracks per block
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Decoded blocks
    pub fn blocks(&self) -> &[SplineBlock] {
        &self.blocks
    }
}
