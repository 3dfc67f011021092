//! Pose evaluation tests
//!
//! Exercise the hierarchy walk through the public instance API.

mod common;

use common::{chain, humanoid, init_logging, instance, interleaved, keyframe};
use hkx_anim::glam::{Mat4, Vec3};
use hkx_anim::{
    AnimError, AnimationData, AnimationInstance, BlendHint, BlendableTransform, Bone,
    EvaluatorOptions, InterleavedUncompressed, Skeleton, UntrackedBones,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_compute_pose_is_deterministic() {
    init_logging();
    let mut anim = instance(interleaved(30, 7), humanoid());
    anim.seek(0.37);

    anim.compute_pose().unwrap();
    let (first_generation, first) = anim.pose_cache().snapshot();
    anim.compute_pose().unwrap();
    let (second_generation, second) = anim.pose_cache().snapshot();

    assert_eq!(second_generation, first_generation + 1);
    assert_eq!(first, second);
}

#[test]
fn test_pose_matches_manual_chain() {
    init_logging();
    let mut anim = instance(interleaved(10, 4), chain(4));
    anim.seek(3.0 * common::FRAME_DURATION);
    anim.compute_pose().unwrap();

    let mut matrix = Mat4::IDENTITY;
    let mut scale = Vec3::ONE;
    let pose = anim.pose_cache().read();
    for bone in 0..4 {
        let local = keyframe(bone, 3);
        matrix *= local.matrix();
        scale *= local.scale;

        let entry = pose.entries()[bone];
        assert!(entry.matrix.abs_diff_eq(matrix, 1e-4), "bone {bone}");
        assert!(entry.scale.abs_diff_eq(scale, 1e-5), "bone {bone}");
    }
}

#[test]
fn test_shared_child_sampled_once() {
    init_logging();
    let mut pelvis = Bone::new("pelvis", -1, BlendableTransform::IDENTITY);
    let mut spine = Bone::new("spine", 0, BlendableTransform::IDENTITY);
    let chest = Bone::new("chest", 1, BlendableTransform::IDENTITY);
    // chest is listed under both pelvis and spine
    pelvis.children = vec![1, 2];
    spine.children = vec![2];
    let skeleton = Skeleton::new(vec![pelvis, spine, chest]).unwrap();

    let anim = instance(interleaved(4, 3), skeleton);
    let stats = anim.compute_pose().unwrap();
    assert_eq!(stats.sampled, 3);
    assert_eq!(stats.revisited, 1);
    assert_eq!(stats.max_depth_reached, 2);

    // The first arrival (through spine) decides the chest's transform
    let pose = anim.pose_cache().read();
    let expected = keyframe(0, 0).matrix() * keyframe(1, 0).matrix() * keyframe(2, 0).matrix();
    assert!(pose.entries()[2].matrix.abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_revisited_bone_passes_its_own_transform_down() {
    init_logging();
    let mut root = Bone::new("root", -1, BlendableTransform::IDENTITY);
    let mut arm = Bone::new("arm", 0, BlendableTransform::IDENTITY);
    let hand = Bone::new("hand", 1, BlendableTransform::IDENTITY);
    let mut side = Bone::new("side", 0, BlendableTransform::IDENTITY);
    root.children = vec![1, 3];
    arm.children = vec![2];
    side.children = vec![1];
    let skeleton = Skeleton::new(vec![root, arm, hand, side]).unwrap();

    let anim = instance(interleaved(2, 4), skeleton);
    let stats = anim.compute_pose().unwrap();
    assert_eq!(stats.sampled, 4);
    // arm reached again through side, and hand again below it
    assert_eq!(stats.revisited, 2);

    let pose = anim.pose_cache().read();
    let arm_matrix = pose.entries()[1].matrix;
    let hand_expected = arm_matrix * keyframe(2, 0).matrix();
    assert!(pose.entries()[2].matrix.abs_diff_eq(hand_expected, 1e-5));
}

#[test]
fn test_depth_ceiling_aborts_and_keeps_cache() {
    init_logging();
    let mut anim = instance(interleaved(5, 12), chain(12));
    anim.compute_pose().unwrap();
    let (generation, before) = anim.pose_cache().snapshot();

    anim = anim.with_options(EvaluatorOptions {
        max_depth: 8,
        ..EvaluatorOptions::default()
    });
    anim.seek(2.0 * common::FRAME_DURATION);
    let err = anim.compute_pose().unwrap_err();
    assert_eq!(err, AnimError::HierarchyTooDeep { bone: 9, max_depth: 8 });

    let (generation_after, after) = anim.pose_cache().snapshot();
    assert_eq!(generation_after, generation);
    assert_eq!(after, before);
}

#[test]
fn test_track_out_of_range_aborts_pass() {
    init_logging();
    // Binding points track 5 at bone 1, but storage only has 2 tracks
    let storage = InterleavedUncompressed::from_frames(common::keyframes(3, 2)).unwrap();
    let data = AnimationData::new("broken", storage, 0.1, common::FRAME_DURATION)
        .unwrap()
        .with_binding(vec![0, -1, -1, -1, -1, 1]);
    let anim = AnimationInstance::new(Arc::new(data), Arc::new(chain(2))).unwrap();

    let err = anim.compute_pose().unwrap_err();
    assert_eq!(
        err,
        AnimError::TrackOutOfRange {
            track: 5,
            track_count: 2
        }
    );
    assert_eq!(anim.pose_cache().generation(), 0);
    assert!(
        anim.pose_cache()
            .read()
            .entries()
            .iter()
            .all(|entry| entry.matrix == Mat4::IDENTITY)
    );
}

#[test]
fn test_cyclic_skeleton_rejected_at_load() {
    let bones = vec![
        Bone::new("a", -1, BlendableTransform::IDENTITY),
        Bone::new("b", 2, BlendableTransform::IDENTITY),
        Bone::new("c", 1, BlendableTransform::IDENTITY),
    ];
    let err = Skeleton::from_parents(bones).unwrap_err();
    assert!(matches!(err, AnimError::CyclicHierarchy { .. }));
}

#[test]
fn test_untracked_bones_use_reference_pose() {
    init_logging();
    let reference = BlendableTransform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let bones = vec![
        Bone::new("root", -1, BlendableTransform::IDENTITY),
        Bone::new("tip", 0, reference),
    ];
    // One track, bound to the root only
    let storage = InterleavedUncompressed::new(1, vec![BlendableTransform::IDENTITY; 2]).unwrap();
    let data = Arc::new(AnimationData::new("root_only", storage, 0.1, 0.1).unwrap());
    let skeleton = Arc::new(Skeleton::from_parents(bones).unwrap());

    let anim = AnimationInstance::new(Arc::clone(&data), Arc::clone(&skeleton)).unwrap();
    anim.compute_pose().unwrap();
    assert_eq!(
        anim.pose_cache().read().entries()[1].position(),
        Vec3::new(0.0, 2.0, 0.0)
    );

    let anim = AnimationInstance::new(data, skeleton)
        .unwrap()
        .with_options(EvaluatorOptions {
            untracked: UntrackedBones::Identity,
            ..EvaluatorOptions::default()
        });
    anim.compute_pose().unwrap();
    assert_eq!(anim.pose_cache().read().entries()[1].position(), Vec3::ZERO);
}

#[test]
fn test_additive_clip_uses_identity_for_untracked() {
    init_logging();
    let reference = BlendableTransform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let bones = vec![
        Bone::new("root", -1, BlendableTransform::IDENTITY),
        Bone::new("tip", 0, reference),
    ];
    let storage = InterleavedUncompressed::new(1, vec![BlendableTransform::IDENTITY; 2]).unwrap();
    let data = AnimationData::new("additive", storage, 0.1, 0.1)
        .unwrap()
        .with_blend_hint(BlendHint::Additive);
    let anim =
        AnimationInstance::new(Arc::new(data), Arc::new(Skeleton::from_parents(bones).unwrap()))
            .unwrap();

    assert!(anim.is_additive());
    anim.compute_pose().unwrap();
    assert_eq!(anim.pose_cache().read().entries()[1].local, BlendableTransform::IDENTITY);
}

#[test]
fn test_clone_has_independent_cache_and_time() {
    init_logging();
    let mut original = instance(interleaved(30, 7), humanoid());
    original.seek(0.5);
    original.set_weight(0.3);
    original.compute_pose().unwrap();

    let mut copy = original.clone();
    assert_eq!(copy.current_time(), 0.0);
    assert_eq!(copy.weight(), 1.0);
    assert_eq!(copy.pose_cache().generation(), 0);

    copy.seek(0.1);
    copy.compute_pose().unwrap();
    assert_eq!(original.current_time(), 0.5);
    assert_eq!(original.pose_cache().generation(), 1);
    assert_ne!(
        original.pose_cache().snapshot().1,
        copy.pose_cache().snapshot().1
    );
}

#[test]
fn test_multiple_roots_all_evaluated() {
    init_logging();
    let bones = vec![
        Bone::new("a", -1, BlendableTransform::IDENTITY),
        Bone::new("b", -1, BlendableTransform::IDENTITY),
        Bone::new("c", 1, BlendableTransform::IDENTITY),
    ];
    let anim = instance(interleaved(3, 3), Skeleton::from_parents(bones).unwrap());
    let stats = anim.compute_pose().unwrap();
    assert_eq!(stats.sampled, 3);
    assert_eq!(stats.max_depth_reached, 1);
}
