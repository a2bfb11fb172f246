// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Owns every slot for a node, addressed by integer index.

use wavelink_core::error::{Result, WavelinkError};

use super::slot::Slot;

#[derive(Default)]
pub struct SlotOrchestrator {
    slots: Vec<Option<Slot>>,
}

impl SlotOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `slot` at the first free index, or appends a new one.
    pub fn add_slot(&mut self, slot: Slot) -> usize {
        if let Some(free) = self.slots.iter().position(Option::is_none) {
            self.slots[free] = Some(slot);
            free
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Slot> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or_else(|| WavelinkError::Malformed(format!("slot {index} does not exist")))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Removes and tears down the slot at `index`, if present.
    ///
    /// # Errors
    /// Propagates the slot's own `unlink` failure.
    pub fn remove_slot(&mut self, index: usize) -> Result<()> {
        let slot = self.get_mut(index)?;
        slot.unlink()?;
        self.slots[index] = None;
        Ok(())
    }

    /// True if any slot has latched `broken`; the node rebuilds those.
    #[must_use]
    pub fn has_broken_slots(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|slot| slot.is_broken())
    }
}
