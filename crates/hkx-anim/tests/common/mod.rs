//! Common test fixtures

#![allow(dead_code)]

use hkx_anim::glam::{Quat, Vec3};
use hkx_anim::{
    AnimationData, AnimationInstance, BlendableTransform, Bone, InterleavedUncompressed,
    Skeleton, SplineCompressed, TrackStorage,
};
use std::sync::Arc;

/// Frame duration used by the fixtures (30 FPS)
pub const FRAME_DURATION: f32 = 1.0 / 30.0;

/// Initialise logging once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Transform of `track` at `frame` in the generated clips
///
/// Translation moves along X with the frame, rotation turns about Y, and
/// scale is constant per track so accumulated scale is easy to predict.
pub fn keyframe(track: usize, frame: usize) -> BlendableTransform {
    let f = frame as f32;
    BlendableTransform::new(
        Vec3::new(f, track as f32, 0.0),
        Quat::from_rotation_y(0.05 * f),
        Vec3::splat(1.0 + 0.1 * track as f32),
    )
}

/// Per-frame rows of `track_count` tracks
pub fn keyframes(frame_count: usize, track_count: usize) -> Vec<Vec<BlendableTransform>> {
    (0..frame_count)
        .map(|frame| (0..track_count).map(|track| keyframe(track, frame)).collect())
        .collect()
}

/// Uncompressed storage of the generated clip
pub fn interleaved(frame_count: usize, track_count: usize) -> TrackStorage {
    InterleavedUncompressed::from_frames(keyframes(frame_count, track_count))
        .unwrap()
        .into()
}

/// Spline storage of the generated clip
pub fn spline(frame_count: usize, track_count: usize, frames_per_block: usize) -> TrackStorage {
    SplineCompressed::encode_linear(frames_per_block, &keyframes(frame_count, track_count))
        .unwrap()
        .into()
}

/// Linear chain of `count` bones, each offset one unit up from its parent
pub fn chain(count: usize) -> Skeleton {
    let bones = (0..count)
        .map(|i| {
            Bone::new(
                format!("bone_{i:02}"),
                i as i16 - 1,
                BlendableTransform::from_translation(Vec3::Y),
            )
        })
        .collect();
    Skeleton::from_parents(bones).unwrap()
}

/// Small humanoid-ish tree
///
/// ```text
/// 0 pelvis
/// ├─ 1 spine ─ 2 head
/// ├─ 3 thigh_l ─ 4 shin_l
/// └─ 5 thigh_r ─ 6 shin_r
/// ```
pub fn humanoid() -> Skeleton {
    let parents: [(&str, i16); 7] = [
        ("pelvis", -1),
        ("spine", 0),
        ("head", 1),
        ("thigh_l", 0),
        ("shin_l", 3),
        ("thigh_r", 0),
        ("shin_r", 5),
    ];
    let bones = parents
        .iter()
        .map(|&(name, parent)| {
            Bone::new(name, parent, BlendableTransform::from_translation(Vec3::Y))
        })
        .collect();
    Skeleton::from_parents(bones).unwrap()
}

/// Instance playing `storage` on `skeleton` with the fixture frame rate
pub fn instance(storage: TrackStorage, skeleton: Skeleton) -> AnimationInstance {
    let frame_count = storage.frame_count();
    let duration = (frame_count.max(2) - 1) as f32 * FRAME_DURATION;
    let data = AnimationData::new("test_clip", storage, duration, FRAME_DURATION).unwrap();
    AnimationInstance::new(Arc::new(data), Arc::new(skeleton)).unwrap()
}

/// Whether two transforms agree within `eps`
pub fn transforms_close(a: &BlendableTransform, b: &BlendableTransform, eps: f32) -> bool {
    (a.translation - b.translation).length() < eps
        && a.rotation.dot(b.rotation).abs() > 1.0 - eps
        && (a.scale - b.scale).length() < eps
}
