// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::types::{EnumBuilder, RecordBuilder, TypeDescriptor};
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

fn particles() -> Arc<TypeDescriptor> {
    let particle = Arc::new(
        RecordBuilder::new("Particle")
            .index_field()
            .vector("velocity", ScalarKind::Float32, 3)
            .scalar("alive", ScalarKind::Bool)
            .build()
            .expect("particle"),
    );
    Arc::new(TypeDescriptor::array("Particles", particle).expect("particles"))
}

fn scene() -> TypeDescriptor {
    RecordBuilder::new("Scene")
        .scalar("frame", ScalarKind::Int32)
        .field("particles", particles())
        .scalar("time", ScalarKind::Float64)
        .build()
        .expect("scene")
}

#[test]
fn test_aligned_unit_layout() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let layout = compiler.compute_layout(&unit(), &Params::new()).unwrap();

    assert_eq!(layout.size(), 20);
    let names: Vec<&str> = layout.accessors().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["position_x", "position_y", "position_z", "position_padding", "health"]
    );
    let padding = layout.accessor("position_padding").unwrap();
    assert!(padding.is_padding());
    assert_eq!(padding.offset, 12);
    assert_eq!(padding.kind.width(), 4);
    assert_eq!(layout.accessor("health").unwrap().offset, 16);
    assert_eq!(layout.field("position").unwrap().size, 16);
}

#[test]
fn test_unaligned_unit_layout() {
    let compiler = LayoutCompiler::new(LayoutConfig::unaligned());
    let layout = compiler.compute_layout(&unit(), &Params::new()).unwrap();

    assert_eq!(layout.size(), 16);
    assert!(layout.accessors().iter().all(|a| !a.is_padding()));
    assert_eq!(layout.field("position").unwrap().size, 12);
    assert_eq!(layout.accessor("health").unwrap().offset, 12);
}

#[test]
fn test_scalar_and_enum_roots() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let scalar = TypeDescriptor::scalar(ScalarKind::Float64);
    let layout = compiler.compute_layout(&scalar, &Params::new()).unwrap();
    assert_eq!(layout.size(), 8);
    assert_eq!(layout.accessors()[0].name, VALUE_FIELD);

    let state = TypeDescriptor::enumeration(
        EnumBuilder::new("State").label("idle").build().expect("enum"),
    );
    let layout = compiler.compute_layout(&state, &Params::new()).unwrap();
    assert_eq!(layout.size(), 4);
    assert!(matches!(layout.accessors()[0].kind, AccessorKind::Enum(_)));
}

#[test]
fn test_array_layout() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let params = Params::new().with("capacity", 10);
    let layout = compiler.compute_layout(&particles(), &params).unwrap();

    let shape = layout.array().expect("array shape");
    // index + velocity xyz + padding + alive
    assert_eq!(shape.element.size(), 4 + 16 + 1);
    assert_eq!(shape.capacity, 10);
    assert_eq!(layout.size(), ARRAY_HEADER_SIZE + 10 * 21);
    assert_eq!(shape.element_offset(3), 8 + 3 * 21);
    assert_eq!(layout.accessor(CAPACITY_FIELD).unwrap().offset, 0);
    assert_eq!(layout.accessor(COUNT_FIELD).unwrap().offset, 4);
}

#[test]
fn test_parametric_record_layout() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let params = Params::new().with("particles_capacity", 4);
    let layout = compiler.compute_layout(&scene(), &params).unwrap();

    let particles = layout.accessor("particles").unwrap();
    assert_eq!(particles.offset, 4);
    assert_eq!(particles.kind.width(), 8 + 4 * 21);
    assert_eq!(layout.accessor("time").unwrap().offset, 4 + 8 + 4 * 21);
    assert_eq!(layout.size(), 4 + 8 + 4 * 21 + 8);
}

#[test]
fn test_missing_and_invalid_parameters() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let err = compiler.compute_layout(&scene(), &Params::new()).unwrap_err();
    assert!(matches!(
        err,
        BlobError::MissingParameter { ref parameter, .. } if parameter == "particles_capacity"
    ));

    for bad in [0, -3, 5001] {
        let params = Params::new().with("particles_capacity", bad);
        let err = compiler.compute_layout(&scene(), &params).unwrap_err();
        assert!(matches!(err, BlobError::InvalidParameter { value, max: 5000, .. } if value == bad));
    }

    let small = LayoutCompiler::new(LayoutConfig::default().with_max_parameter(8));
    let params = Params::new().with("particles_capacity", 9);
    assert!(small.compute_layout(&scene(), &params).is_err());
    let params = Params::new().with("particles_capacity", 8);
    assert!(small.compute_layout(&scene(), &params).is_ok());
}

#[test]
fn test_extra_parameters_share_cache_entry() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let base = Params::new().with("particles_capacity", 4);
    let noisy = base.clone().with("unrelated", 99);

    let a = compiler.compute_layout(&scene(), &base).unwrap();
    let b = compiler.compute_layout(&scene(), &noisy).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(b.params(), &base);
    assert!(compiler.cache().stats().hits >= 1);
}

#[test]
fn test_layout_determinism() {
    for capacity in [1, 2, 17, 300] {
        let params = Params::new().with("particles_capacity", capacity);
        let first = LayoutCompiler::new(LayoutConfig::default())
            .compute_layout(&scene(), &params)
            .unwrap();
        let second = LayoutCompiler::new(LayoutConfig::default())
            .compute_layout(&scene(), &params)
            .unwrap();
        assert_eq!(*first, *second);
    }
}

#[test]
fn test_modes_are_cached_separately() {
    let cache = Arc::new(LayoutCache::new());
    let aligned = LayoutCompiler::with_cache(LayoutConfig::default(), Arc::clone(&cache));
    let packed = LayoutCompiler::with_cache(LayoutConfig::unaligned(), Arc::clone(&cache));

    assert_eq!(aligned.compute_layout(&unit(), &Params::new()).unwrap().size(), 20);
    assert_eq!(packed.compute_layout(&unit(), &Params::new()).unwrap().size(), 16);
    // Unit and Vec3 per mode
    assert_eq!(cache.len(), 4);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), LookupStats::default());
}

#[test]
fn test_concurrent_compilation() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let scene = Arc::new(scene());
    let expected = LayoutCompiler::new(LayoutConfig::default())
        .compute_layout(&scene, &Params::new().with("particles_capacity", 64))
        .unwrap();

    std::thread::scope(|s| {
        for _ in 0..8 {
            let compiler = compiler.clone();
            let scene = Arc::clone(&scene);
            let expected = Arc::clone(&expected);
            s.spawn(move || {
                for _ in 0..50 {
                    let params = Params::new().with("particles_capacity", 64);
                    let layout = compiler.compute_layout(&scene, &params).unwrap();
                    assert_eq!(*layout, *expected);
                }
            });
        }
    });
    let stats = compiler.cache().stats();
    assert!(stats.hits + stats.misses >= 8 * 50);
    assert!(stats.hits > 0);
}

#[test]
fn test_nested_array_parameters() {
    let leaf = Arc::new(
        RecordBuilder::new("Leaf")
            .index_field()
            .scalar("value", ScalarKind::Int16)
            .build()
            .expect("leaf"),
    );
    let leaves = Arc::new(TypeDescriptor::array("Leaves", leaf).expect("leaves"));
    let bucket = Arc::new(
        RecordBuilder::new("Bucket")
            .index_field()
            .field("leaves", leaves)
            .build()
            .expect("bucket"),
    );
    let buckets = TypeDescriptor::array("Buckets", bucket).expect("buckets");

    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let params = Params::new().with("capacity", 3).with("item_leaves_capacity", 5);
    let layout = compiler.compute_layout(&buckets, &params).unwrap();

    let leaf_size = 4 + 2;
    let bucket_size = 4 + 8 + 5 * leaf_size;
    assert_eq!(layout.array().unwrap().element.size(), bucket_size);
    assert_eq!(layout.size(), 8 + 3 * bucket_size);
}

#[test]
fn test_flatten_collision_is_rejected() {
    let inner = Arc::new(
        RecordBuilder::new("Inner")
            .scalar("b", ScalarKind::Int32)
            .build()
            .expect("inner"),
    );
    let outer = RecordBuilder::new("Outer")
        .scalar("a_b", ScalarKind::Int32)
        .field("a", inner)
        .build()
        .expect("outer");
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    assert!(matches!(
        compiler.compute_layout(&outer, &Params::new()),
        Err(BlobError::InvalidSchema(_))
    ));
}

#[test]
fn test_plain_layout_rejects_parametric() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    assert!(compiler.plain_layout(&unit()).is_ok());
    assert!(matches!(
        compiler.plain_layout(&scene()),
        Err(BlobError::UnsupportedNesting { .. })
    ));
}

#[test]
fn test_params_scoping_and_parsing() {
    let params: Params = "particles_capacity=4, particles_item_x_capacity=2,other=1"
        .parse()
        .unwrap();
    let scoped = params.scoped("particles");
    assert_eq!(scoped.get("capacity"), Some(4));
    assert_eq!(scoped.get("item_x_capacity"), Some(2));
    assert_eq!(scoped.len(), 2);
    assert_eq!(scoped.prefixed("particles").get("particles_capacity"), Some(4));
    assert!("nope".parse::<Params>().is_err());
    assert!("a=b".parse::<Params>().is_err());
    assert_eq!(validate_parameter("a", 5000, 5000).unwrap(), 5000);
}

#[test]
fn test_display_lists_fields() {
    let compiler = LayoutCompiler::new(LayoutConfig::default());
    let text = compiler
        .compute_layout(&unit(), &Params::new())
        .unwrap()
        .to_string();
    assert!(text.starts_with("Unit (20 bytes, aligned)"));
    assert!(text.contains("padding float32"));
    assert!(text.contains("health"));
}
