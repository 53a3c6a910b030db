/// ActiveSet - keeps drawn instances packed at the front of the slot range.
///
/// Every instance owns exactly one slot in `[0, capacity)`. Slots
/// `[0, active_count)` are drawn, the rest are not. Activating or
/// deactivating an instance moves it across that boundary by swapping
/// slots, and every swap is mirrored in each attribute buffer so the GPU
/// arrays stay packed.
///
/// Both directions of the mapping are kept: `slot_to_instance` for the
/// swaps and `instance_to_slot` for lookups by id.

use std::ops::Range;
use rdst::{RadixKey, RadixSort};
use rustc_hash::FxHashSet;
use super::attribute_buffer::AttributeBuffer;
use super::instance::InstanceId;
use crate::error::Result;
use crate::{engine_err, engine_precondition, engine_trace};

/// One slot exchange performed by a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotSwap {
    pub a: u32,
    pub b: u32,
}

/// Sort key for the radix sort: entries ordered by current slot.
#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    slot: u32,
    id: InstanceId,
}

impl RadixKey for SlotEntry {
    const LEVELS: usize = 4;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.slot >> (level * 8)) as u8
    }
}

#[derive(Debug, Clone)]
pub struct ActiveSet {
    slot_to_instance: Vec<InstanceId>,
    instance_to_slot: Vec<u32>,
    active_count: u32,
    attributes: Vec<AttributeBuffer>,
    dirty: Option<Range<u32>>,
}

impl ActiveSet {
    /// Identity assignment (instance `i` in slot `i`), the first
    /// `active_count` instances active.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `active_count > capacity` or `capacity`
    /// does not fit 32-bit ids.
    pub fn new(capacity: usize, active_count: usize) -> Result<Self> {
        if capacity > u32::MAX as usize {
            return Err(engine_err!(
                "galaxy3d::ActiveSet",
                "Capacity {} exceeds 32-bit slot range",
                capacity
            ));
        }
        if active_count > capacity {
            return Err(engine_err!(
                "galaxy3d::ActiveSet",
                "Active count {} exceeds capacity {}",
                active_count,
                capacity
            ));
        }

        Ok(Self {
            slot_to_instance: (0..capacity as u32).map(InstanceId).collect(),
            instance_to_slot: (0..capacity as u32).collect(),
            active_count: active_count as u32,
            attributes: Vec::new(),
            dirty: None,
        })
    }

    // ===== ATTRIBUTES =====

    /// Add a per-slot attribute of `item_size` floats, zero-initialized.
    ///
    /// Returns the attribute index.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero item size or a name already in use.
    pub fn add_attribute(&mut self, name: &str, item_size: usize) -> Result<usize> {
        if item_size == 0 {
            return Err(engine_err!(
                "galaxy3d::ActiveSet",
                "Attribute '{}' must have a non-zero item size",
                name
            ));
        }
        if self.attribute_index(name).is_some() {
            return Err(engine_err!(
                "galaxy3d::ActiveSet",
                "Attribute '{}' already exists",
                name
            ));
        }
        self.attributes.push(AttributeBuffer::new(name, item_size, self.capacity()));
        Ok(self.attributes.len() - 1)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeBuffer> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn attributes(&self) -> &[AttributeBuffer] {
        &self.attributes
    }

    /// Write `values` at the current slot of `id` in attribute `attribute`
    /// and mark that slot dirty.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` for an unknown attribute index or id, or
    /// `values` not matching the attribute item size.
    pub fn write_item(&mut self, attribute: usize, id: InstanceId, values: &[f32]) -> Result<()> {
        let slot = self.checked_slot(id)?;
        let Some(buffer) = self.attributes.get_mut(attribute) else {
            return Err(engine_precondition!(
                "galaxy3d::ActiveSet",
                "Unknown attribute index {}",
                attribute
            ));
        };
        if values.len() != buffer.item_size() {
            return Err(engine_precondition!(
                "galaxy3d::ActiveSet",
                "Attribute '{}' expects {} values, got {}",
                buffer.name(),
                buffer.item_size(),
                values.len()
            ));
        }
        buffer.set_item(slot as usize, values);
        self.touch(slot);
        Ok(())
    }

    /// `write_item` addressed by attribute name.
    pub fn write_attribute(&mut self, name: &str, id: InstanceId, values: &[f32]) -> Result<()> {
        let Some(index) = self.attribute_index(name) else {
            return Err(engine_precondition!(
                "galaxy3d::ActiveSet",
                "Unknown attribute '{}'",
                name
            ));
        };
        self.write_item(index, id, values)
    }

    /// Values of attribute `attribute` at the current slot of `id`.
    pub fn read_item(&self, attribute: usize, id: InstanceId) -> Option<&[f32]> {
        let slot = self.slot_of(id)?;
        self.attributes.get(attribute).map(|buffer| buffer.item(slot as usize))
    }

    // ===== QUERIES =====

    pub fn capacity(&self) -> usize {
        self.slot_to_instance.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count as usize
    }

    pub fn slot_of(&self, id: InstanceId) -> Option<u32> {
        self.instance_to_slot.get(id.index()).copied()
    }

    pub fn instance_at(&self, slot: u32) -> Option<InstanceId> {
        self.slot_to_instance.get(slot as usize).copied()
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.slot_of(id).is_some_and(|slot| slot < self.active_count)
    }

    /// Instances in the drawn range, in slot order.
    pub fn active_instances(&self) -> &[InstanceId] {
        &self.slot_to_instance[..self.active_count as usize]
    }

    // ===== DIRTY RANGE =====

    /// Slots written since the last `take_dirty_range`, as one covering range.
    pub fn dirty_range(&self) -> Option<Range<u32>> {
        self.dirty.clone()
    }

    /// Return and clear the dirty range (the renderer calls this before upload).
    pub fn take_dirty_range(&mut self) -> Option<Range<u32>> {
        self.dirty.take()
    }

    pub fn mark_all_dirty(&mut self) {
        if self.capacity() > 0 {
            self.dirty = Some(0..self.capacity() as u32);
        }
    }

    fn touch(&mut self, slot: u32) {
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(slot)..range.end.max(slot + 1),
            None => slot..slot + 1,
        });
    }

    // ===== SINGLE INSTANCE =====

    /// Move an inactive instance into the drawn range.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if `id` is unknown or already active.
    pub fn activate(&mut self, id: InstanceId) -> Result<()> {
        let slot = self.checked_slot(id)?;
        if slot < self.active_count {
            return Err(engine_precondition!(
                "galaxy3d::ActiveSet",
                "Instance {} is already active",
                id
            ));
        }
        self.swap_slots(slot, self.active_count, None);
        self.active_count += 1;
        Ok(())
    }

    /// Move an active instance out of the drawn range.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if `id` is unknown or not active.
    pub fn deactivate(&mut self, id: InstanceId) -> Result<()> {
        let slot = self.checked_slot(id)?;
        if slot >= self.active_count {
            return Err(engine_precondition!(
                "galaxy3d::ActiveSet",
                "Instance {} is not active",
                id
            ));
        }
        self.swap_slots(slot, self.active_count - 1, None);
        self.active_count -= 1;
        Ok(())
    }

    // ===== RECONCILIATION =====

    /// Activate every id of `show` and deactivate every id of `hide` in
    /// one batch, returning the slot swaps performed.
    ///
    /// Both lists are first sorted by current slot. Entries are then paired
    /// (lowest-slot show with highest-slot hide) and exchanged directly;
    /// the unpaired remainder grows or shrinks the drawn range, reusing any
    /// entry that already sits on the boundary.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` (nothing modified) when an id is out of
    /// range or duplicated, appears in both lists, a `show` id is already
    /// active, or a `hide` id is not active.
    pub fn reconcile(&mut self, show: &[InstanceId], hide: &[InstanceId]) -> Result<Vec<SlotSwap>> {
        if show.is_empty() && hide.is_empty() {
            return Ok(Vec::new());
        }
        self.validate_batch(show, hide)?;

        let show = self.sorted_by_slot(show);
        let hide = self.sorted_by_slot(hide);
        let mut swaps = Vec::new();

        let paired = show.len().min(hide.len());
        for i in 0..paired {
            let a = self.instance_to_slot[show[i].index()];
            let b = self.instance_to_slot[hide[hide.len() - 1 - i].index()];
            self.swap_slots(a, b, Some(&mut swaps));
        }

        if show.len() > paired {
            self.grow(&show[paired..], &mut swaps);
        } else if hide.len() > paired {
            self.shrink(&hide[..hide.len() - paired], &mut swaps);
        }

        engine_trace!(
            "galaxy3d::ActiveSet",
            "Reconciled +{} -{}: {} swaps, {} active",
            show.len(),
            hide.len(),
            swaps.len(),
            self.active_count
        );

        Ok(swaps)
    }

    /// Activate the (inactive, slot-sorted) `entries`.
    ///
    /// An entry already on the boundary slot is kept; otherwise the
    /// farthest entry is swapped onto the boundary.
    fn grow(&mut self, entries: &[InstanceId], swaps: &mut Vec<SlotSwap>) {
        let mut lo = 0;
        let mut hi = entries.len();
        while lo < hi {
            let boundary = self.active_count;
            if self.instance_to_slot[entries[lo].index()] == boundary {
                lo += 1;
            } else {
                hi -= 1;
                let from = self.instance_to_slot[entries[hi].index()];
                self.swap_slots(from, boundary, Some(&mut *swaps));
            }
            self.active_count += 1;
        }
    }

    /// Deactivate the (active, slot-sorted) `entries`.
    ///
    /// An entry already on the last active slot is kept; otherwise the
    /// lowest entry is swapped onto it.
    fn shrink(&mut self, entries: &[InstanceId], swaps: &mut Vec<SlotSwap>) {
        let mut lo = 0;
        let mut hi = entries.len();
        while lo < hi {
            let boundary = self.active_count - 1;
            if self.instance_to_slot[entries[hi - 1].index()] == boundary {
                hi -= 1;
            } else {
                let from = self.instance_to_slot[entries[lo].index()];
                self.swap_slots(from, boundary, Some(&mut *swaps));
                lo += 1;
            }
            self.active_count -= 1;
        }
    }

    fn validate_batch(&self, show: &[InstanceId], hide: &[InstanceId]) -> Result<()> {
        let mut seen: FxHashSet<InstanceId> = FxHashSet::default();
        seen.reserve(show.len() + hide.len());

        for &id in show {
            let slot = self.checked_slot(id)?;
            if !seen.insert(id) {
                return Err(engine_precondition!(
                    "galaxy3d::ActiveSet",
                    "Instance {} listed twice in show",
                    id
                ));
            }
            if slot < self.active_count {
                return Err(engine_precondition!(
                    "galaxy3d::ActiveSet",
                    "Cannot show instance {}: already active",
                    id
                ));
            }
        }

        for &id in hide {
            let slot = self.checked_slot(id)?;
            if !seen.insert(id) {
                return Err(engine_precondition!(
                    "galaxy3d::ActiveSet",
                    "Instance {} listed twice (in both show and hide, or twice in hide)",
                    id
                ));
            }
            if slot >= self.active_count {
                return Err(engine_precondition!(
                    "galaxy3d::ActiveSet",
                    "Cannot hide instance {}: not active",
                    id
                ));
            }
        }

        Ok(())
    }

    fn sorted_by_slot(&self, ids: &[InstanceId]) -> Vec<InstanceId> {
        let mut entries: Vec<SlotEntry> = ids
            .iter()
            .map(|&id| SlotEntry { slot: self.instance_to_slot[id.index()], id })
            .collect();
        entries.radix_sort_unstable();
        entries.into_iter().map(|entry| entry.id).collect()
    }

    fn checked_slot(&self, id: InstanceId) -> Result<u32> {
        self.slot_of(id).ok_or_else(|| {
            engine_precondition!(
                "galaxy3d::ActiveSet",
                "Instance {} out of range (capacity {})",
                id,
                self.capacity()
            )
        })
    }

    /// Exchange the occupants of two slots in every table and attribute.
    fn swap_slots(&mut self, a: u32, b: u32, swaps: Option<&mut Vec<SlotSwap>>) {
        if a == b {
            return;
        }
        let (ia, ib) = (a as usize, b as usize);
        self.slot_to_instance.swap(ia, ib);
        self.instance_to_slot[self.slot_to_instance[ia].index()] = a;
        self.instance_to_slot[self.slot_to_instance[ib].index()] = b;
        for attribute in &mut self.attributes {
            attribute.swap_items(ia, ib);
        }
        self.touch(a);
        self.touch(b);
        if let Some(swaps) = swaps {
            swaps.push(SlotSwap { a, b });
        }
    }
}

#[cfg(test)]
#[path = "active_set_tests.rs"]
mod tests;
