// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sparse arrays and intrusive linked lists over blob buffers.
//!
//! An array region starts with an 8-byte header (`capacity`, `count`)
//! followed by `capacity` element slots. Every element starts with an int32
//! `index` field; `-1` marks an empty slot. The header count caches the
//! number of present slots and is reconciled against a slot scan when a
//! buffer is opened.

mod list;

pub use list::{head_type, LinkedList, ListHead, HEAD_COUNT, HEAD_FIRST, HEAD_LAST};

use crate::error::{BlobError, Result};
use crate::layout::{
    AccessorKind, Layout, LayoutCompiler, Params, ARRAY_HEADER_SIZE, CAPACITY_FIELD, COUNT_FIELD,
};
use crate::types::{TypeDescriptor, CAPACITY_PARAM, EMPTY_SLOT, INDEX_FIELD, ITEM_PREFIX};
use crate::value::{FlatValues, Value};
use crate::view::{read_flat, read_i32, write_count, write_i32, write_values, BlobView};
use std::ops::Range;
use std::sync::Arc;

/// Offset of the sentinel index field inside an element.
fn index_offset(element: &Layout) -> usize {
    element.accessor(INDEX_FIELD).map_or(0, |a| a.offset)
}

/// Sentinel index stored in `slot` of an array region.
pub(crate) fn slot_index(layout: &Layout, bytes: &[u8], slot: usize) -> Option<i32> {
    let shape = layout.array()?;
    if slot >= shape.capacity {
        return None;
    }
    Some(read_i32(
        bytes,
        shape.element_offset(slot) + index_offset(&shape.element),
    ))
}

/// Occupied slots of an array region, in index order.
pub(crate) fn present_slots(layout: &Layout, bytes: &[u8]) -> Vec<usize> {
    let capacity = layout.array().map_or(0, |shape| shape.capacity);
    (0..capacity)
        .filter(|&slot| slot_index(layout, bytes, slot).is_some_and(|index| index > EMPTY_SLOT))
        .collect()
}

pub(crate) fn present_count(layout: &Layout, bytes: &[u8]) -> usize {
    present_slots(layout, bytes).len()
}

/// Write array headers and empty-slot sentinels for every array reachable
/// from `layout`.
pub(crate) fn init_region(layout: &Layout, bytes: &mut [u8]) {
    if let Some(shape) = layout.array() {
        if let Some(capacity) = layout.accessor(CAPACITY_FIELD) {
            write_i32(bytes, capacity.offset, shape.capacity as i32);
        }
        write_count(layout, bytes, 0);
        let index = index_offset(&shape.element);
        for slot in 0..shape.capacity {
            let offset = shape.element_offset(slot);
            init_region(
                &shape.element,
                &mut bytes[offset..offset + shape.element.size()],
            );
            write_i32(bytes, offset + index, EMPTY_SLOT);
        }
        return;
    }

    for accessor in layout.accessors() {
        if let AccessorKind::Array(sub) = &accessor.kind {
            init_region(sub, &mut bytes[accessor.offset..accessor.offset + sub.size()]);
        }
    }
}

/// Header count that disagreed with the slot scan of an opened buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountReconciliation {
    /// Count stored in the header before correction.
    pub header: i32,
    /// Number of present slots found by the scan.
    pub observed: usize,
}

/// View of one array region.
#[derive(Debug)]
pub struct ArrayView<B> {
    layout: Arc<Layout>,
    element: Arc<Layout>,
    capacity: usize,
    bytes: B,
    reconciliation: Option<CountReconciliation>,
}

impl<B: AsRef<[u8]>> ArrayView<B> {
    /// Bind an array layout to `bytes`.
    pub fn new(layout: Arc<Layout>, bytes: B) -> Result<Self> {
        let shape = layout.array().ok_or_else(|| BlobError::LayoutMismatch {
            type_name: layout.type_name().to_string(),
            reason: "not an array layout".into(),
        })?;
        let (element, capacity) = (Arc::clone(&shape.element), shape.capacity);
        let len = bytes.as_ref().len();
        if len < layout.size() {
            return Err(BlobError::LayoutMismatch {
                type_name: layout.type_name().to_string(),
                reason: format!("needs {} bytes, buffer has {len}", layout.size()),
            });
        }
        Ok(Self {
            layout,
            element,
            capacity,
            bytes,
            reconciliation: None,
        })
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Element layout shared by every slot.
    pub fn element_layout(&self) -> &Arc<Layout> {
        &self.element
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes.as_ref()[..self.layout.size()]
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied count from the header.
    pub fn len(&self) -> usize {
        self.header_count().max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn header_count(&self) -> i32 {
        self.layout
            .accessor(COUNT_FIELD)
            .map_or(0, |a| read_i32(self.bytes(), a.offset))
    }

    /// Correction applied when the buffer was opened, if any.
    pub fn reconciliation(&self) -> Option<CountReconciliation> {
        self.reconciliation
    }

    fn slot_range(&self, slot: usize) -> Range<usize> {
        let offset = ARRAY_HEADER_SIZE + slot * self.element.size();
        offset..offset + self.element.size()
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot < self.capacity {
            Ok(())
        } else {
            Err(BlobError::SlotOutOfRange {
                index: slot,
                capacity: self.capacity,
            })
        }
    }

    /// Sentinel index of `slot` (`None` beyond capacity).
    pub fn slot_index(&self, slot: usize) -> Option<i32> {
        slot_index(&self.layout, self.bytes(), slot)
    }

    pub fn is_present(&self, slot: usize) -> bool {
        self.slot_index(slot).is_some_and(|index| index > EMPTY_SLOT)
    }

    /// Element in `slot`; `None` beyond capacity or for an empty slot.
    pub fn get(&self, slot: usize) -> Option<BlobView<&[u8]>> {
        if !self.is_present(slot) {
            return None;
        }
        BlobView::new(Arc::clone(&self.element), &self.bytes()[self.slot_range(slot)]).ok()
    }

    /// Present slot numbers in index order.
    pub fn present_slots(&self) -> Vec<usize> {
        present_slots(&self.layout, self.bytes())
    }

    /// Present elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = BlobView<&[u8]>> + '_ {
        self.present_slots()
            .into_iter()
            .filter_map(move |slot| self.get(slot))
    }

    /// Cursor over present slots, see [`SlotCursor`].
    pub fn cursor(&self) -> SlotCursor {
        SlotCursor::default()
    }

    /// List of the present element trees.
    pub fn to_value_tree(&self) -> Value {
        read_flat(&self.layout, self.bytes())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ArrayView<B> {
    /// Open an array buffer, inferring the capacity from its header when
    /// `params` is `None`, and reconcile the header count.
    pub fn from_buffer(
        compiler: &LayoutCompiler,
        ty: &TypeDescriptor,
        bytes: B,
        params: Option<&Params>,
    ) -> Result<Self> {
        let (layout, bytes) = BlobView::from_buffer(compiler, ty, bytes, params)?.into_parts();
        let mut array = Self::new(layout, bytes)?;
        array.reconcile();
        Ok(array)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.layout.size();
        &mut self.bytes.as_mut()[..size]
    }

    /// Rewrite the header count to the number of present slots.
    ///
    /// Returns the correction when the header disagreed.
    pub fn reconcile(&mut self) -> Option<CountReconciliation> {
        let header = self.header_count();
        let observed = self.present_slots().len();
        if i64::from(header) == observed as i64 {
            return None;
        }
        log::warn!(
            "{}: header count {} disagrees with {} present slots, rewriting",
            self.layout.type_name(),
            header,
            observed
        );
        let layout = Arc::clone(&self.layout);
        write_count(&layout, self.bytes_mut(), observed);
        let fix = CountReconciliation { header, observed };
        self.reconciliation = Some(fix);
        Some(fix)
    }

    fn refresh_count(&mut self) {
        let layout = Arc::clone(&self.layout);
        let count = present_count(&layout, self.bytes());
        write_count(&layout, self.bytes_mut(), count);
    }

    /// Mutable element in a present `slot`.
    pub fn get_mut(&mut self, slot: usize) -> Option<BlobView<&mut [u8]>> {
        if !self.is_present(slot) {
            return None;
        }
        self.slot_mut(slot).ok()
    }

    /// Mutable view of `slot` whether or not it is occupied.
    pub fn slot_mut(&mut self, slot: usize) -> Result<BlobView<&mut [u8]>> {
        self.check_slot(slot)?;
        let range = self.slot_range(slot);
        let element = Arc::clone(&self.element);
        BlobView::new(element, &mut self.bytes_mut()[range])
    }

    /// Write the header and mark every slot empty; element bytes are
    /// zeroed.
    pub fn init(&mut self) {
        let layout = Arc::clone(&self.layout);
        let bytes = self.bytes_mut();
        bytes.fill(0);
        init_region(&layout, bytes);
        self.reconciliation = None;
    }

    /// Mark every slot empty and reset the count. Element bytes are kept.
    pub fn clear(&mut self) {
        let index = index_offset(&self.element);
        for slot in 0..self.capacity {
            let offset = self.slot_range(slot).start;
            write_i32(self.bytes_mut(), offset + index, EMPTY_SLOT);
        }
        let layout = Arc::clone(&self.layout);
        write_count(&layout, self.bytes_mut(), 0);
    }

    /// Write an element tree into `slot`, replacing its previous content.
    ///
    /// The tree may omit `index`; a supplied index must equal `slot`.
    pub fn insert(&mut self, slot: usize, tree: &Value) -> Result<()> {
        self.write_slot(slot, tree.flatten())
    }

    pub(crate) fn write_slot(&mut self, slot: usize, mut flat: FlatValues) -> Result<()> {
        self.check_slot(slot)?;
        match flat.get(INDEX_FIELD).map(Value::as_i64) {
            None => {
                flat.insert(INDEX_FIELD.to_string(), Value::Int(slot as i64));
            }
            Some(Some(index)) if index == slot as i64 => {}
            Some(_) => {
                return Err(BlobError::TypeMismatch {
                    field: INDEX_FIELD.to_string(),
                    expected: format!("slot number {slot}"),
                    found: flat
                        .get(INDEX_FIELD)
                        .map_or_else(String::new, ToString::to_string),
                })
            }
        }

        // Staged so a rejected tree leaves the slot untouched.
        let element = Arc::clone(&self.element);
        let mut staged = vec![0u8; element.size()];
        init_region(&element, &mut staged);
        write_values(&element, &mut staged, &flat)?;

        let range = self.slot_range(slot);
        self.bytes_mut()[range].copy_from_slice(&staged);
        self.refresh_count();
        Ok(())
    }

    /// Empty `slot`. Returns whether it was occupied.
    pub fn remove(&mut self, slot: usize) -> Result<bool> {
        self.check_slot(slot)?;
        if !self.is_present(slot) {
            return Ok(false);
        }
        let offset = self.slot_range(slot).start + index_offset(&self.element);
        write_i32(self.bytes_mut(), offset, EMPTY_SLOT);
        self.refresh_count();
        Ok(true)
    }

    /// Claim the next free slot, mark it present and bump the count.
    ///
    /// The slot is `len()` for densely filled arrays, otherwise the lowest
    /// empty slot. Only the index field is written.
    pub fn next_slot(&mut self) -> Result<usize> {
        let len = self.len();
        let slot = if len < self.capacity && !self.is_present(len) {
            Some(len)
        } else {
            (0..self.capacity).find(|&slot| !self.is_present(slot))
        };
        let slot = slot.ok_or_else(|| BlobError::CapacityExceeded {
            array: self.layout.type_name().to_string(),
            capacity: self.capacity,
        })?;
        let offset = self.slot_range(slot).start + index_offset(&self.element);
        write_i32(self.bytes_mut(), offset, slot as i32);
        self.refresh_count();
        Ok(slot)
    }

    /// Claim the next free slot and write `tree` into it. The slot is
    /// released again when the tree is rejected.
    pub fn push(&mut self, tree: &Value) -> Result<usize> {
        let slot = self.next_slot()?;
        if let Err(err) = self.insert(slot, tree) {
            self.remove(slot)?;
            return Err(err);
        }
        Ok(slot)
    }
}

impl ArrayView<Vec<u8>> {
    /// Allocate an initialized array buffer.
    ///
    /// `element_params` are the element type's own parameters, without the
    /// `item_` prefix.
    pub fn allocate(
        compiler: &LayoutCompiler,
        array_ty: &TypeDescriptor,
        capacity: usize,
        element_params: &Params,
    ) -> Result<Self> {
        let mut params = element_params.prefixed(ITEM_PREFIX);
        params.insert(CAPACITY_PARAM, capacity as i64);
        let layout = compiler.compute_layout(array_ty, &params)?;
        let blob = BlobView::allocate(layout);
        log::info!(
            "allocated {} with capacity {} ({} bytes)",
            array_ty.name(),
            capacity,
            blob.bytes().len()
        );
        let (layout, bytes) = blob.into_parts();
        Self::new(layout, bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Iteration cursor over present slots.
///
/// Each step scans forward from the cursor position at the time of the
/// call, so slots filled ahead of the cursor are visited and slots emptied
/// behind it are not revisited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCursor {
    next: usize,
}

impl SlotCursor {
    /// Next present slot, or `None` once the end of the array is reached.
    pub fn advance<B: AsRef<[u8]>>(&mut self, array: &ArrayView<B>) -> Option<usize> {
        while self.next < array.capacity() {
            let slot = self.next;
            self.next += 1;
            if array.is_present(slot) {
                return Some(slot);
            }
        }
        None
    }

    /// Position of the next slot to scan.
    pub fn position(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests;
