// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::layout::LayoutConfig;
use crate::types::{RecordBuilder, ScalarKind};

fn particles() -> TypeDescriptor {
    let particle = Arc::new(
        RecordBuilder::new("Particle")
            .index_field()
            .scalar("mass", ScalarKind::Float32)
            .build()
            .expect("particle"),
    );
    TypeDescriptor::array("Particles", particle).expect("particles")
}

fn nodes() -> TypeDescriptor {
    let node = Arc::new(
        RecordBuilder::new("Node")
            .index_field()
            .next_field()
            .scalar("weight", ScalarKind::Int32)
            .build()
            .expect("node"),
    );
    TypeDescriptor::array("Nodes", node).expect("nodes")
}

fn mass(value: f64) -> Value {
    Value::map().with("mass", value)
}

fn compiler() -> LayoutCompiler {
    LayoutCompiler::new(LayoutConfig::default())
}

#[test]
fn test_allocate_writes_header_and_sentinels() {
    let array = ArrayView::allocate(&compiler(), &particles(), 4, &Params::new()).unwrap();

    assert_eq!(array.capacity(), 4);
    assert_eq!(array.len(), 0);
    assert!(array.is_empty());
    let bytes = array.bytes();
    assert_eq!(bytes.len(), 8 + 4 * 8);
    assert_eq!(&bytes[0..4], &4i32.to_le_bytes());
    assert_eq!(&bytes[4..8], &0i32.to_le_bytes());
    for slot in 0..4 {
        assert_eq!(array.slot_index(slot), Some(EMPTY_SLOT));
        assert!(array.get(slot).is_none());
    }
    assert_eq!(array.iter().count(), 0);
}

#[test]
fn test_insert_remove_and_count() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 4, &Params::new()).unwrap();

    array.insert(2, &mass(2.5)).unwrap();
    array.insert(0, &mass(0.5)).unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.present_slots(), vec![0, 2]);
    assert_eq!(array.get(2).unwrap().get_f32("mass").unwrap(), 2.5);
    assert_eq!(array.get(2).unwrap().get_i32("index").unwrap(), 2);

    assert!(array.remove(2).unwrap());
    assert!(!array.remove(2).unwrap());
    assert_eq!(array.len(), 1);
    assert!(matches!(
        array.remove(9),
        Err(BlobError::SlotOutOfRange { index: 9, capacity: 4 })
    ));
    assert!(matches!(
        array.insert(4, &mass(1.0)),
        Err(BlobError::SlotOutOfRange { .. })
    ));
}

#[test]
fn test_insert_rejects_foreign_index() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 2, &Params::new()).unwrap();
    let tree = mass(1.0).with("index", 1);
    assert!(matches!(
        array.insert(0, &tree),
        Err(BlobError::TypeMismatch { .. })
    ));
    array.insert(1, &tree).unwrap();
    assert!(array.is_present(1));
}

#[test]
fn test_next_slot_until_full() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 3, &Params::new()).unwrap();

    assert_eq!(array.next_slot().unwrap(), 0);
    assert_eq!(array.push(&mass(1.0)).unwrap(), 1);
    assert_eq!(array.next_slot().unwrap(), 2);
    assert_eq!(array.len(), 3);
    assert!(matches!(
        array.next_slot(),
        Err(BlobError::CapacityExceeded { capacity: 3, .. })
    ));

    array.remove(1).unwrap();
    assert_eq!(array.next_slot().unwrap(), 1);
}

#[test]
fn test_clear_and_init() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 3, &Params::new()).unwrap();
    array.push(&mass(1.0)).unwrap();
    array.push(&mass(2.0)).unwrap();

    array.clear();
    assert_eq!(array.len(), 0);
    assert!(array.present_slots().is_empty());

    array.push(&mass(3.0)).unwrap();
    array.init();
    assert_eq!(array.len(), 0);
    assert!(array.bytes()[8..].chunks(8).all(|slot| slot[4..] == [0; 4]));
}

#[test]
fn test_from_buffer_reconciles_count() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 4, &Params::new()).unwrap();
    array.push(&mass(1.0)).unwrap();
    array.push(&mass(2.0)).unwrap();
    let mut bytes = array.into_bytes();
    bytes[4..8].copy_from_slice(&7i32.to_le_bytes());

    let array = ArrayView::from_buffer(&compiler(), &particles(), bytes.as_mut_slice(), None)
        .unwrap();
    assert_eq!(
        array.reconciliation(),
        Some(CountReconciliation {
            header: 7,
            observed: 2
        })
    );
    assert_eq!(array.len(), 2);
    drop(array);
    assert_eq!(&bytes[4..8], &2i32.to_le_bytes());

    let array = ArrayView::from_buffer(&compiler(), &particles(), bytes.as_mut_slice(), None)
        .unwrap();
    assert_eq!(array.reconciliation(), None);
}

#[test]
fn test_cursor_sees_insertions_ahead() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 5, &Params::new()).unwrap();
    array.insert(0, &mass(0.0)).unwrap();
    array.insert(2, &mass(2.0)).unwrap();

    let mut cursor = array.cursor();
    let mut visited = Vec::new();
    while let Some(slot) = cursor.advance(&array) {
        visited.push(slot);
        if slot == 0 {
            array.insert(4, &mass(4.0)).unwrap();
            array.remove(0).unwrap();
        }
    }
    assert_eq!(visited, vec![0, 2, 4]);
    assert_eq!(cursor.position(), 5);
}

#[test]
fn test_array_to_value_tree() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 3, &Params::new()).unwrap();
    array.insert(1, &mass(1.5)).unwrap();

    let tree = array.to_value_tree();
    let items = tree.as_list().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].as_map().unwrap().get("mass"),
        Some(&Value::Float(1.5))
    );
}

#[test]
fn test_linked_list_ordering() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 8, &Params::new()).unwrap();
    assert_eq!(list.len().unwrap(), 0);
    assert!(list.is_empty().unwrap());

    for weight in 0..5 {
        list.push(&Value::map().with("weight", weight * 10)).unwrap();
    }

    assert_eq!(list.len().unwrap(), 5);
    assert_eq!(list.first().unwrap(), Some(0));
    assert_eq!(list.last().unwrap(), Some(4));
    assert_eq!(list.slots().unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(list.head().unwrap().count, 5);

    let last = list.items().get(4).unwrap();
    assert_eq!(last.get_i32("next").unwrap(), EMPTY_SLOT);

    let weights: Vec<i64> = list
        .to_value_tree()
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .filter_map(|item| item.as_map()?.get("weight")?.as_i64())
        .collect();
    assert_eq!(weights, vec![0, 10, 20, 30, 40]);
}

#[test]
fn test_linked_list_manual_append() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 4, &Params::new()).unwrap();

    let a = list.next_slot().unwrap();
    let b = list.next_slot().unwrap();
    // `a` is no longer the most recently claimed slot.
    assert!(matches!(
        list.append(a),
        Err(BlobError::OutOfOrderAppend {
            expected: 1,
            found: 0
        })
    ));
    list.append(b).unwrap();
    assert_eq!(list.slots().unwrap(), vec![b]);

    let c = list.next_slot().unwrap();
    list.append(c).unwrap();
    assert_eq!(list.slots().unwrap(), vec![b, c]);
}

#[test]
fn test_linked_list_cycle_detected() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 4, &Params::new())
        .unwrap()
        .with_max_links(10);
    for _ in 0..3 {
        list.push(&Value::map().with("weight", 1)).unwrap();
    }
    let (mut items, head) = list.into_bytes();
    // Point the tail back at the head.
    let tail = 8 + 2 * 12;
    items[tail + 4..tail + 8].copy_from_slice(&0i32.to_le_bytes());

    let compiler = compiler();
    let array = ArrayView::from_buffer(&compiler, &nodes(), items.as_mut_slice(), None).unwrap();
    let head_layout = compiler.plain_layout(&head_type().unwrap()).unwrap();
    let head = BlobView::new(head_layout, head.as_slice()).unwrap();
    let list = LinkedList::new(array, head).unwrap().with_max_links(10);

    assert!(matches!(
        list.len(),
        Err(BlobError::CycleDetected { limit: 10 })
    ));
}

#[test]
fn test_linked_list_requires_next_field() {
    let compiler = compiler();
    let items = ArrayView::allocate(&compiler, &particles(), 2, &Params::new()).unwrap();
    let head = BlobView::allocate(compiler.plain_layout(&head_type().unwrap()).unwrap());
    assert!(matches!(
        LinkedList::new(items, head),
        Err(BlobError::UnknownField { ref field, .. }) if field == "next"
    ));
}

#[test]
fn test_linked_list_init_resets() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 3, &Params::new()).unwrap();
    list.push(&Value::map().with("weight", 1)).unwrap();
    list.init().unwrap();

    assert_eq!(list.head().unwrap(), ListHead::EMPTY);
    assert_eq!(list.items().len(), 0);
    assert_eq!(list.len().unwrap(), 0);
}

#[test]
fn test_get_mut_writes_present_slots_only() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 3, &Params::new()).unwrap();
    array.insert(1, &mass(1.0)).unwrap();

    array.get_mut(1).unwrap().set("mass", 4.0).unwrap();
    assert!(array.get_mut(0).is_none());
    assert!(array.get_mut(7).is_none());
    assert_eq!(array.get(1).unwrap().get_f32("mass").unwrap(), 4.0);
}

fn assert_count_matches(array: &ArrayView<Vec<u8>>) {
    assert_eq!(array.len(), array.present_slots().len());
}

#[test]
fn test_rejected_insert_leaves_slot_untouched() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 4, &Params::new()).unwrap();
    array.insert(0, &mass(1.5)).unwrap();

    assert!(matches!(
        array.insert(2, &Value::map()),
        Err(BlobError::UninitializedField { ref field, .. }) if field == "mass"
    ));
    assert_eq!(array.slot_index(2), Some(EMPTY_SLOT));
    assert!(!array.is_present(2));
    assert_eq!(array.len(), 1);
    assert_count_matches(&array);

    // Overwriting an occupied slot with a bad tree keeps the old element.
    assert!(array.insert(0, &Value::map().with("mass", "heavy")).is_err());
    assert_eq!(array.get(0).unwrap().get_f32("mass").unwrap(), 1.5);
    assert_count_matches(&array);
}

#[test]
fn test_rejected_push_releases_slot() {
    let mut array = ArrayView::allocate(&compiler(), &particles(), 2, &Params::new()).unwrap();

    assert!(array.push(&Value::map()).is_err());
    assert_eq!(array.len(), 0);
    assert!(array.present_slots().is_empty());
    assert_count_matches(&array);

    assert_eq!(array.push(&mass(2.0)).unwrap(), 0);
    assert!(array.push(&Value::map().with("weight", 1)).is_err());
    assert_eq!(array.present_slots(), vec![0]);
    assert_count_matches(&array);
}

#[test]
fn test_rejected_list_push_releases_slot() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 3, &Params::new()).unwrap();
    list.push(&Value::map().with("weight", 1)).unwrap();

    assert!(matches!(
        list.push(&Value::map()),
        Err(BlobError::UninitializedField { ref field, .. }) if field == "weight"
    ));
    assert_eq!(list.len().unwrap(), 1);
    assert_eq!(list.items().len(), 1);
    assert_eq!(list.items().present_slots(), vec![0]);
    assert_eq!(list.head().unwrap().count, 1);

    assert_eq!(list.push(&Value::map().with("weight", 2)).unwrap(), 1);
    assert_eq!(list.slots().unwrap(), vec![0, 1]);
}

#[test]
fn test_linked_list_rejects_double_append() {
    let mut list = LinkedList::allocate(&compiler(), &nodes(), 4, &Params::new())
        .unwrap()
        .with_max_links(10);

    let a = list.next_slot().unwrap();
    list.append(a).unwrap();
    assert!(matches!(
        list.append(a),
        Err(BlobError::OutOfOrderAppend { found: 0, .. })
    ));
    assert_eq!(list.slots().unwrap(), vec![a]);
    assert_eq!(list.head().unwrap().count, 1);

    let b = list.next_slot().unwrap();
    list.append(b).unwrap();
    assert!(list.append(b).is_err());
    assert_eq!(list.len().unwrap(), 2);
}

#[test]
fn test_linked_list_walk_bound_follows_config() {
    let bounded = LayoutCompiler::new(LayoutConfig::default().with_max_parameter(6));
    let list = LinkedList::allocate(&bounded, &nodes(), 4, &Params::new()).unwrap();
    assert_eq!(list.max_links(), 6);

    let default = LinkedList::allocate(&compiler(), &nodes(), 4, &Params::new()).unwrap();
    assert_eq!(default.max_links(), crate::layout::DEFAULT_MAX_PARAMETER);
}
