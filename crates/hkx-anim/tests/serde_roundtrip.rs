//! Serialization of decoded clip data
#![cfg(feature = "serde")]

mod common;

use common::{interleaved, keyframes, spline};
use hkx_anim::{
    BSpline, Bone, EvaluatorOptions, ReferenceFrameSamples, Skeleton, TrackStorage,
    UntrackedBones,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_spline_storage_survives_json() {
    let storage = spline(12, 3, 5);
    let json = serde_json::to_string(&storage).unwrap();
    let restored: TrackStorage = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.kind(), "spline-compressed");
    for track in 0..3 {
        for frame in [0.0, 4.5, 5.0, 11.0] {
            assert_eq!(
                restored.sample(track, frame, false).unwrap(),
                storage.sample(track, frame, false).unwrap()
            );
        }
    }
}

#[test]
fn test_invalid_spline_rejected_on_load() {
    let json = r#"{"degree":1,"knots":[0.0,1.0,0.5,1.0],"control_points":[1.0,2.0]}"#;
    assert!(serde_json::from_str::<BSpline<f32>>(json).is_err());

    let json = r#"{"degree":1,"knots":[0.0,0.0,1.0,1.0],"control_points":[1.0,2.0]}"#;
    let spline: BSpline<f32> = serde_json::from_str(json).unwrap();
    assert_eq!(spline.evaluate(0.5), 1.5);
}

#[test]
fn test_inconsistent_storage_rejected_on_load() {
    let empty_interleaved = json!({
        "InterleavedUncompressed": {"track_count": 2, "frame_count": 3, "transforms": []}
    });
    assert!(serde_json::from_value::<TrackStorage>(empty_interleaved).is_err());

    let empty_spline = json!({
        "SplineCompressed": {
            "frame_count": 4,
            "frames_per_block": 2,
            "track_count": 1,
            "blocks": []
        }
    });
    assert!(serde_json::from_value::<TrackStorage>(empty_spline).is_err());

    // Declared counts must match what is stored
    let mut value = serde_json::to_value(interleaved(3, 2)).unwrap();
    value["InterleavedUncompressed"]["frame_count"] = 5.into();
    assert!(serde_json::from_value::<TrackStorage>(value).is_err());

    let mut value = serde_json::to_value(spline(6, 2, 3)).unwrap();
    value["SplineCompressed"]["track_count"] = 4.into();
    assert!(serde_json::from_value::<TrackStorage>(value).is_err());

    let valid = serde_json::to_value(interleaved(3, 2)).unwrap();
    let restored: TrackStorage = serde_json::from_value(valid).unwrap();
    assert_eq!(restored.frame_count(), 3);
    assert_eq!(restored.track_count(), 2);
}

#[test]
fn test_bones_and_options() {
    let bones: Vec<Bone> = serde_json::from_str(
        &serde_json::to_string(&vec![
            Bone::new("root", -1, keyframes(1, 1)[0][0]),
            Bone::new("child", 0, keyframes(2, 2)[1][1]),
        ])
        .unwrap(),
    )
    .unwrap();
    let skeleton = Skeleton::from_parents(bones).unwrap();
    assert_eq!(skeleton.find_bone("child"), Some(1));

    let options = EvaluatorOptions {
        max_depth: 12,
        untracked: UntrackedBones::Identity,
    };
    let json = serde_json::to_string(&options).unwrap();
    assert_eq!(serde_json::from_str::<EvaluatorOptions>(&json).unwrap(), options);

    let curve = ReferenceFrameSamples::new(1.0, vec![hkx_anim::glam::Vec4::ZERO]);
    let json = serde_json::to_string(&curve).unwrap();
    assert_eq!(serde_json::from_str::<ReferenceFrameSamples>(&json).unwrap(), curve);
}
