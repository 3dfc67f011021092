//! Bone ↔ transform track correspondence
//!
//! Decoded bindings list, for every transform track, the bone it animates
//! (-1 when the track drives nothing). Not every bone has a track and the
//! mapping need not be bijective.

use crate::error::{AnimError, Result};

/// Bidirectional mapping between bone indices and track indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMap {
    bone_to_track: Vec<Option<usize>>,
    track_to_bone: Vec<Option<usize>>,
}

impl TrackMap {
    /// Build from a `track → bone` binding table
    ///
    /// Negative entries leave the track unbound. A bone bound by more than one
    /// track keeps the first binding.
    pub fn from_track_to_bone(track_to_bone: &[i16], bone_count: usize) -> Result<Self> {
        let mut bone_to_track = vec![None; bone_count];
        let mut tracks = Vec::with_capacity(track_to_bone.len());

        for (track, &bone) in track_to_bone.iter().enumerate() {
            if bone < 0 {
                tracks.push(None);
                continue;
            }
            let bone = bone as usize;
            if bone >= bone_count {
                return Err(AnimError::BoneOutOfRange { bone, bone_count });
            }
            match bone_to_track[bone] {
                Some(existing) => {
                    log::warn!(
                        "Track {track} binds bone {bone}, already bound to track {existing}; ignoring"
                    );
                }
                None => bone_to_track[bone] = Some(track),
            }
            tracks.push(Some(bone));
        }

        Ok(Self {
            bone_to_track,
            track_to_bone: tracks,
        })
    }

    /// Track `i` drives bone `i` for the first `min(track_count, bone_count)` bones
    pub fn identity(track_count: usize, bone_count: usize) -> Self {
        Self {
            bone_to_track: (0..bone_count)
                .map(|bone| (bone < track_count).then_some(bone))
                .collect(),
            track_to_bone: (0..track_count)
                .map(|track| (track < bone_count).then_some(track))
                .collect(),
        }
    }

    /// Track driving the given bone, if any
    pub fn track_for_bone(&self, bone: usize) -> Option<usize> {
        self.bone_to_track.get(bone).copied().flatten()
    }

    /// Bone driven by the given track, if any
    pub fn bone_for_track(&self, track: usize) -> Option<usize> {
        self.track_to_bone.get(track).copied().flatten()
    }

    /// Number of bones covered by the map
    pub fn bone_count(&self) -> usize {
        self.bone_to_track.len()
    }

    /// Number of tracks in the binding
    pub fn track_count(&self) -> usize {
        self.track_to_bone.len()
    }

    /// Number of bones with a track
    pub fn bound_bone_count(&self) -> usize {
        self.bone_to_track.iter().filter(|t| t.is_some()).count()
    }
}
