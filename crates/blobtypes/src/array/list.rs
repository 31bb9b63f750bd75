// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Intrusive linked list threaded through an array's `next` fields.

use super::ArrayView;
use crate::error::{BlobError, Result};
use crate::layout::{Accessor, AccessorKind, LayoutCompiler, Params, DEFAULT_MAX_PARAMETER};
use crate::types::{ScalarKind, TypeDescriptor, EMPTY_SLOT, NEXT_FIELD};
use crate::value::{FlatValues, Value};
use crate::view::BlobView;

/// Head field holding the first linked slot.
pub const HEAD_FIRST: &str = "first";
/// Head field holding the last linked slot.
pub const HEAD_LAST: &str = "last";
/// Head field holding the number of linked items.
pub const HEAD_COUNT: &str = "count";

/// Decoded list head record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHead {
    pub first: i32,
    pub last: i32,
    pub count: i32,
}

impl ListHead {
    pub const EMPTY: Self = Self {
        first: EMPTY_SLOT,
        last: EMPTY_SLOT,
        count: 0,
    };
}

/// Plain `ListHead` record type (three int32 fields).
pub fn head_type() -> Result<TypeDescriptor> {
    crate::types::RecordBuilder::new("ListHead")
        .scalar(HEAD_FIRST, ScalarKind::Int32)
        .scalar(HEAD_LAST, ScalarKind::Int32)
        .scalar(HEAD_COUNT, ScalarKind::Int32)
        .build()
}

/// Linked list over an item array `A` and a separate head record `H`.
///
/// The length is always walked from `first`; the stored head count is only
/// informative.
#[derive(Debug)]
pub struct LinkedList<A, H> {
    items: ArrayView<A>,
    head: BlobView<H>,
    max_links: usize,
}

impl<A: AsRef<[u8]>, H: AsRef<[u8]>> LinkedList<A, H> {
    /// Bind an item array and a head record.
    ///
    /// The element type must carry an int32 `next` field and the head must
    /// expose int32 `first`, `last` and `count` fields.
    pub fn new(items: ArrayView<A>, head: BlobView<H>) -> Result<Self> {
        let element = items.element_layout();
        require_int32(element.accessor(NEXT_FIELD), element.type_name(), NEXT_FIELD)?;
        for field in [HEAD_FIRST, HEAD_LAST, HEAD_COUNT] {
            require_int32(head.layout().accessor(field), head.type_name(), field)?;
        }
        Ok(Self {
            items,
            head,
            max_links: DEFAULT_MAX_PARAMETER,
        })
    }

    /// Bound on the number of links followed before a walk fails with
    /// `CycleDetected`.
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    pub fn max_links(&self) -> usize {
        self.max_links
    }

    pub fn items(&self) -> &ArrayView<A> {
        &self.items
    }

    pub fn head(&self) -> Result<ListHead> {
        Ok(ListHead {
            first: self.head.get_i32(HEAD_FIRST)?,
            last: self.head.get_i32(HEAD_LAST)?,
            count: self.head.get_i32(HEAD_COUNT)?,
        })
    }

    pub fn first(&self) -> Result<Option<usize>> {
        Ok(link(self.head.get_i32(HEAD_FIRST)?))
    }

    pub fn last(&self) -> Result<Option<usize>> {
        Ok(link(self.head.get_i32(HEAD_LAST)?))
    }

    /// Slots in link order, walked from `first`.
    pub fn slots(&self) -> Result<Vec<usize>> {
        let mut slots = Vec::new();
        let mut current = self.first()?;
        while let Some(slot) = current {
            if slots.len() >= self.max_links {
                return Err(BlobError::CycleDetected {
                    limit: self.max_links,
                });
            }
            let item = self.items.get(slot).ok_or_else(|| BlobError::LayoutMismatch {
                type_name: self.items.layout().type_name().to_string(),
                reason: format!("link to empty or out of range slot {slot}"),
            })?;
            slots.push(slot);
            current = link(item.get_i32(NEXT_FIELD)?);
        }
        Ok(slots)
    }

    /// Number of linked items.
    pub fn len(&self) -> Result<usize> {
        self.slots().map(|slots| slots.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.first()?.is_none())
    }

    /// Element trees in link order.
    pub fn to_value_tree(&self) -> Result<Value> {
        let mut items = Vec::new();
        for slot in self.slots()? {
            if let Some(item) = self.items.get(slot) {
                items.push(item.to_value_tree());
            }
        }
        Ok(Value::List(items))
    }
}

impl<A, H> LinkedList<A, H>
where
    A: AsRef<[u8]> + AsMut<[u8]>,
    H: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Reset the head and empty every item slot.
    pub fn init(&mut self) -> Result<()> {
        self.items.clear();
        self.write_head(ListHead::EMPTY)
    }

    fn write_head(&mut self, head: ListHead) -> Result<()> {
        self.head.set(HEAD_FIRST, head.first)?;
        self.head.set(HEAD_LAST, head.last)?;
        self.head.set(HEAD_COUNT, head.count)
    }

    /// Claim the next array slot for a new item, with its link cleared.
    pub fn next_slot(&mut self) -> Result<usize> {
        let slot = self.items.next_slot()?;
        self.items.slot_mut(slot)?.set(NEXT_FIELD, EMPTY_SLOT)?;
        Ok(slot)
    }

    /// Link the item in `slot` after the current tail.
    ///
    /// The item must be the most recently claimed one: its index equals
    /// its slot and the array's occupied count minus one.
    ///
    /// A slot that is already linked (the current tail, or any item whose
    /// `next` is set) is rejected.
    pub fn append(&mut self, slot: usize) -> Result<()> {
        let expected = self.items.len() as i64 - 1;
        let found = self.items.slot_index(slot).map_or(i64::from(EMPTY_SLOT), i64::from);
        if found != expected || found != slot as i64 {
            return Err(BlobError::OutOfOrderAppend { expected, found });
        }

        let mut head = self.head()?;
        let linked = match self.items.get(slot) {
            Some(item) => link(item.get_i32(NEXT_FIELD)?).is_some(),
            None => false,
        };
        if linked || link(head.last) == Some(slot) {
            return Err(BlobError::OutOfOrderAppend {
                expected: expected + 1,
                found,
            });
        }

        match link(head.last) {
            Some(tail) => self.items.slot_mut(tail)?.set(NEXT_FIELD, slot as i32)?,
            None => head.first = slot as i32,
        }
        head.last = slot as i32;
        head.count += 1;
        self.write_head(head)
    }

    /// Write `tree` into a new slot and link it. The tree may omit `index`
    /// and `next`.
    pub fn push(&mut self, tree: &Value) -> Result<usize> {
        let slot = self.next_slot()?;
        let mut flat: FlatValues = tree.flatten();
        flat.entry(NEXT_FIELD.to_string())
            .or_insert(Value::Int(i64::from(EMPTY_SLOT)));
        let linked = self
            .items
            .write_slot(slot, flat)
            .and_then(|()| self.append(slot));
        if let Err(err) = linked {
            self.items.remove(slot)?;
            return Err(err);
        }
        Ok(slot)
    }
}

impl LinkedList<Vec<u8>, Vec<u8>> {
    /// Allocate an empty list with owned item and head buffers.
    pub fn allocate(
        compiler: &LayoutCompiler,
        array_ty: &TypeDescriptor,
        capacity: usize,
        element_params: &Params,
    ) -> Result<Self> {
        let items = ArrayView::allocate(compiler, array_ty, capacity, element_params)?;
        let head = BlobView::allocate(compiler.plain_layout(&head_type()?)?);
        let mut list = Self::new(items, head)?.with_max_links(compiler.config().max_parameter);
        list.init()?;
        Ok(list)
    }

    /// Hand over the item and head buffers.
    pub fn into_bytes(self) -> (Vec<u8>, Vec<u8>) {
        (self.items.into_bytes(), self.head.into_bytes())
    }
}

fn link(value: i32) -> Option<usize> {
    usize::try_from(value).ok()
}

fn require_int32(accessor: Option<&Accessor>, type_name: &str, field: &str) -> Result<()> {
    match accessor.map(|a| &a.kind) {
        Some(AccessorKind::Scalar(ScalarKind::Int32)) => Ok(()),
        Some(other) => Err(BlobError::TypeMismatch {
            field: field.to_string(),
            expected: ScalarKind::Int32.to_string(),
            found: other
                .storage()
                .map_or_else(|| "array".to_string(), |kind| kind.to_string()),
        }),
        None => Err(BlobError::UnknownField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }),
    }
}
