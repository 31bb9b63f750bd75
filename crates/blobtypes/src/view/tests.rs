// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::layout::LayoutConfig;
use crate::types::{EnumBuilder, RecordBuilder, ScalarKind, TypeDescriptor};
use std::sync::Arc;

fn vec3() -> Arc<TypeDescriptor> {
    Arc::new(
        RecordBuilder::new("Vec3")
            .scalar("x", ScalarKind::Float32)
            .scalar("y", ScalarKind::Float32)
            .scalar("z", ScalarKind::Float32)
            .build()
            .expect("vec3"),
    )
}

fn unit() -> TypeDescriptor {
    RecordBuilder::new("Unit")
        .field("position", vec3())
        .scalar("health", ScalarKind::Int32)
        .build()
        .expect("unit")
}

fn state() -> Arc<TypeDescriptor> {
    let desc = EnumBuilder::new("State")
        .label("idle")
        .label("moving")
        .build()
        .expect("state");
    Arc::new(TypeDescriptor::enumeration(desc))
}

fn scene() -> TypeDescriptor {
    let particle = Arc::new(
        RecordBuilder::new("Particle")
            .index_field()
            .vector("velocity", ScalarKind::Float32, 3)
            .field("state", state())
            .build()
            .expect("particle"),
    );
    let particles = Arc::new(TypeDescriptor::array("Particles", particle).expect("particles"));
    RecordBuilder::new("Scene")
        .scalar("frame", ScalarKind::Int32)
        .field("particles", particles)
        .build()
        .expect("scene")
}

fn unit_tree() -> Value {
    Value::map()
        .with(
            "position",
            Value::map().with("x", 1.0).with("y", 2.0).with("z", 3.0),
        )
        .with("health", 100)
}

fn particle(vx: f64, state: &str) -> Value {
    Value::map()
        .with(
            "velocity",
            Value::map().with("x", vx).with("y", 0.0).with("z", -vx),
        )
        .with("state", state)
}

#[test]
fn test_end_to_end_unit() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let blob = BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();

    assert_eq!(blob.bytes().len(), 20);
    assert_eq!(blob.get("health").unwrap(), Value::Int(100));
    assert_eq!(blob.get("position_y").unwrap(), Value::Float(2.0));
    assert_eq!(blob.get_f32("position_z").unwrap(), 3.0);
    // Padding reads back as zero.
    assert_eq!(blob.get("position_padding").unwrap(), Value::Float(0.0));
}

#[test]
fn test_set_and_padding_writes_ignored() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let mut blob =
        BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();

    blob.set("health", 42).unwrap();
    blob.set("position_x", 0.5f32).unwrap();
    blob.set("position_padding", 9.0).unwrap();

    assert_eq!(blob.get_i32("health").unwrap(), 42);
    assert_eq!(blob.get_f32("position_x").unwrap(), 0.5);
    assert_eq!(blob.get_f32("position_padding").unwrap(), 0.0);
    assert!(matches!(
        blob.set("health", 1.5),
        Err(BlobError::TypeMismatch { .. })
    ));
    assert!(matches!(
        blob.set("mana", 1),
        Err(BlobError::UnknownField { .. })
    ));
}

#[test]
fn test_uninitialized_and_unknown_fields() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());

    let missing = Value::map().with("position", Value::map().with("x", 1.0).with("y", 2.0));
    let err = BlobView::from_value_tree(&compiler, &unit(), &missing, &Params::new()).unwrap_err();
    assert!(matches!(err, BlobError::UninitializedField { ref field, .. } if field == "position_z"));

    let extra = unit_tree().with("mana", 5);
    let err = BlobView::from_value_tree(&compiler, &unit(), &extra, &Params::new()).unwrap_err();
    assert!(matches!(err, BlobError::UnknownField { ref field, .. } if field == "mana"));
}

#[test]
fn test_plain_round_trip_random_values() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let ty = RecordBuilder::new("Sample")
        .scalar("a", ScalarKind::Int8)
        .scalar("b", ScalarKind::UInt16)
        .scalar("c", ScalarKind::Int32)
        .scalar("d", ScalarKind::Int64)
        .scalar("e", ScalarKind::Float64)
        .scalar("alive", ScalarKind::Bool)
        .vector("pos", ScalarKind::Float32, 3)
        .build()
        .unwrap();

    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..100 {
        let tree = Value::map()
            .with("a", rng.i8(..))
            .with("b", rng.u16(..))
            .with("c", rng.i32(..))
            .with("d", rng.i64(..))
            .with("e", rng.f64() * 1e6 - 5e5)
            .with("alive", rng.bool())
            .with("pos_x", f64::from(rng.f32()))
            .with("pos_y", f64::from(rng.f32()))
            .with("pos_z", f64::from(rng.f32()));

        let blob = BlobView::from_value_tree(&compiler, &ty, &tree, &Params::new()).unwrap();
        assert_eq!(blob.to_value_tree(), tree);
    }
}

#[test]
fn test_enum_fields() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let ty = RecordBuilder::new("Agent")
        .field("state", state())
        .build()
        .unwrap();

    let tree = Value::map().with("state", "moving");
    let mut blob = BlobView::from_value_tree(&compiler, &ty, &tree, &Params::new()).unwrap();
    assert_eq!(blob.get_label("state").unwrap(), "moving");
    assert_eq!(blob.bytes(), &2i32.to_le_bytes());

    blob.set("state", 1).unwrap();
    assert_eq!(blob.get_label("state").unwrap(), "idle");
    blob.set("state", 0).unwrap();
    assert_eq!(blob.get_label("state").unwrap(), "undefined");

    assert!(matches!(
        blob.set("state", "flying"),
        Err(BlobError::UnknownEnumLabel { .. })
    ));
    assert!(matches!(
        blob.set("state", 9),
        Err(BlobError::UnknownEnumOrdinal { .. })
    ));
}

#[test]
fn test_nan_fields_compare_equal() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = unit_tree().with(
        "position",
        Value::map().with("x", f64::NAN).with("y", 2.0).with("z", 3.0),
    );
    let left = BlobView::from_value_tree(&compiler, &unit(), &tree, &Params::new()).unwrap();
    let right = BlobView::from_value_tree(&compiler, &unit(), &tree, &Params::new()).unwrap();

    assert!(left.structural_eq(&right));
    assert!(left == right);
    assert!(left.diff(&right).is_empty());
}

#[test]
fn test_diff_reports_changed_fields() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let left = BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();
    let mut right = left.clone();
    right.set("health", 7).unwrap();
    right.set("position_padding", 1.0).unwrap();

    let diffs = left.diff(&right);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].field, "health");
    assert_eq!(diffs[0].to_string(), "health: 100 != 7");
    assert!(left != right);
}

#[test]
fn test_padding_bytes_do_not_affect_equality() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let left = BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();
    let mut bytes = left.bytes().to_vec();
    bytes[12..16].copy_from_slice(&[0xff; 4]);
    let right = BlobView::new(Arc::clone(left.layout()), bytes.as_slice()).unwrap();
    assert_eq!(left, right);
}

#[test]
fn test_record_sub_view_shares_bytes() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let mut blob =
        BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();

    {
        let position = blob.record("position").unwrap();
        assert_eq!(position.type_name(), "Vec3");
        assert_eq!(position.bytes().len(), 16);
        assert_eq!(position.get_f32("y").unwrap(), 2.0);
    }
    blob.record_mut("position").unwrap().set("y", 8.0).unwrap();
    assert_eq!(blob.get_f32("position_y").unwrap(), 8.0);
    assert!(matches!(
        blob.record("health"),
        Err(BlobError::UnknownField { .. })
    ));
}

#[test]
fn test_array_fields_from_value_tree() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = Value::map().with("frame", 3).with(
        "particles",
        vec![particle(1.0, "idle"), particle(2.0, "moving")],
    );

    let blob = BlobView::from_value_tree(&compiler, &scene(), &tree, &Params::new()).unwrap();
    assert_eq!(blob.layout().params().get("particles_capacity"), Some(2));

    let particles = blob.array("particles").unwrap();
    assert_eq!(particles.capacity(), 2);
    assert_eq!(particles.len(), 2);
    let second = particles.get(1).unwrap();
    assert_eq!(second.get_i32("index").unwrap(), 1);
    assert_eq!(second.get_f32("velocity_z").unwrap(), -2.0);
    assert_eq!(second.get_label("state").unwrap(), "moving");

    assert!(matches!(
        blob.get("particles"),
        Err(BlobError::TypeMismatch { .. })
    ));
}

#[test]
fn test_array_occupancy_below_capacity() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = Value::map().with("frame", 0).with(
        "particles",
        vec![particle(1.0, "idle"), particle(2.0, "idle"), particle(3.0, "idle")],
    );
    let params = Params::new().with("particles_capacity", 5);
    let blob = BlobView::from_value_tree(&compiler, &scene(), &tree, &params).unwrap();

    let particles = blob.array("particles").unwrap();
    assert_eq!(particles.len(), 3);
    assert_eq!(particles.present_slots(), vec![0, 1, 2]);
    assert_eq!(particles.slot_index(3), Some(-1));
    assert_eq!(particles.slot_index(4), Some(-1));
    assert!(particles.get(4).is_none());
    assert!(particles.get(5).is_none());
    assert_eq!(particles.iter().count(), 3);
}

#[test]
fn test_array_slot_beyond_capacity() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = Value::map().with("frame", 0).with(
        "particles",
        vec![particle(1.0, "idle"), particle(2.0, "idle")],
    );
    let params = Params::new().with("particles_capacity", 1);
    let err = BlobView::from_value_tree(&compiler, &scene(), &tree, &params).unwrap_err();
    assert!(matches!(err, BlobError::SlotOutOfRange { index: 1, capacity: 1 }));
}

#[test]
fn test_from_buffer_infers_capacities() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = Value::map().with("frame", 9).with(
        "particles",
        vec![particle(1.0, "idle"), particle(2.0, "moving")],
    );
    let params = Params::new().with("particles_capacity", 4);
    let source = BlobView::from_value_tree(&compiler, &scene(), &tree, &params).unwrap();
    let bytes = source.into_bytes();

    let view = BlobView::from_buffer(&compiler, &scene(), bytes.as_slice(), None).unwrap();
    assert_eq!(view.layout().params().get("particles_capacity"), Some(4));
    assert_eq!(view.get_i32("frame").unwrap(), 9);
    assert_eq!(view.to_value_tree(), {
        let again = BlobView::from_value_tree(&compiler, &scene(), &tree, &params).unwrap();
        again.to_value_tree()
    });
}

#[test]
fn test_from_buffer_rejects_bad_capacity() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let mut bytes = vec![0u8; 64];
    bytes[4..8].copy_from_slice(&0i32.to_le_bytes());
    let err = BlobView::from_buffer(&compiler, &scene(), bytes.as_slice(), None).unwrap_err();
    assert!(matches!(err, BlobError::InvalidCapacity { offset: 4, value: 0, .. }));

    bytes[4..8].copy_from_slice(&1000i32.to_le_bytes());
    let err = BlobView::from_buffer(&compiler, &scene(), bytes.as_slice(), None).unwrap_err();
    assert!(matches!(err, BlobError::LayoutMismatch { .. }));
}

#[test]
fn test_from_buffer_with_params_checks_shape() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let tree = Value::map()
        .with("frame", 1)
        .with("particles", vec![particle(1.0, "idle")]);
    let source = BlobView::from_value_tree(&compiler, &scene(), &tree, &Params::new()).unwrap();
    let bytes = source.into_bytes();

    let params = Params::new().with("particles_capacity", 1);
    assert!(BlobView::from_buffer(&compiler, &scene(), bytes.as_slice(), Some(&params)).is_ok());

    let mut longer = bytes.clone();
    longer.resize(bytes.len() * 4, 0);
    let params = Params::new().with("particles_capacity", 3);
    let err =
        BlobView::from_buffer(&compiler, &scene(), longer.as_slice(), Some(&params)).unwrap_err();
    assert!(matches!(err, BlobError::LayoutMismatch { .. }));
}

#[test]
fn test_nested_value_tree() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let blob = BlobView::from_value_tree(&compiler, &unit(), &unit_tree(), &Params::new()).unwrap();

    assert_eq!(blob.to_nested_value_tree(), unit_tree());
    let flat = blob.to_value_tree();
    assert_eq!(
        flat.as_map().and_then(|m| m.get("position_x")),
        Some(&Value::Float(1.0))
    );
}

#[test]
fn test_scalar_root() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let ty = TypeDescriptor::scalar(ScalarKind::Float64);
    let blob = BlobView::from_value_tree(&compiler, &ty, &Value::Float(0.25), &Params::new())
        .unwrap();
    assert_eq!(blob.bytes().len(), 8);
    assert_eq!(blob.get("value").unwrap(), Value::Float(0.25));
}

#[test]
fn test_view_over_caller_memory() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let layout = compiler.compute_layout(&unit(), &Params::new()).unwrap();
    let mut memory = [0u8; 32];
    {
        let mut view = BlobView::new(Arc::clone(&layout), &mut memory[..]).unwrap();
        view.set("health", 250).unwrap();
    }
    assert_eq!(&memory[16..20], &250i32.to_le_bytes());
    assert!(matches!(
        BlobView::new(layout, &memory[..8]),
        Err(BlobError::LayoutMismatch { .. })
    ));
}

#[test]
fn test_set_value_tree_over_borrowed_views() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let ty = RecordBuilder::new("Flag")
        .scalar("alive", ScalarKind::Bool)
        .scalar("score", ScalarKind::Int16)
        .build()
        .unwrap();
    let tree = Value::map().with("alive", true).with("score", 12);
    let mut blob = BlobView::from_value_tree(&compiler, &ty, &tree, &Params::new()).unwrap();
    assert!(blob.get_bool("alive").unwrap());

    blob.as_view_mut()
        .set_value_tree(&Value::map().with("alive", false).with("score", -3))
        .unwrap();
    let view = blob.as_view();
    assert!(!view.get_bool("alive").unwrap());
    assert_eq!(view.get_i32("score").unwrap(), -3);
    assert!(!view.get_bool("score").unwrap());

    let partial = Value::map().with("alive", true);
    assert!(matches!(
        blob.set_value_tree(&partial),
        Err(BlobError::UninitializedField { ref field, .. }) if field == "score"
    ));
    // A rejected tree writes nothing.
    assert!(!blob.get_bool("alive").unwrap());
    assert_eq!(blob.get_i32("score").unwrap(), -3);

    let mut memory = blob.bytes().to_vec();
    let before = memory.clone();
    let mut view = BlobView::new(Arc::clone(blob.layout()), memory.as_mut_slice()).unwrap();
    let bad = Value::map().with("alive", true).with("score", 1 << 20);
    assert!(matches!(
        view.set_value_tree(&bad),
        Err(BlobError::TypeMismatch { ref field, .. }) if field == "score"
    ));
    drop(view);
    assert_eq!(memory, before);
}
