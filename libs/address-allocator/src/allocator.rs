// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! An IP address allocator over a single address range.

use std::{collections::BTreeSet, net::IpAddr};

use serde::{Deserialize, Serialize};

use crate::{allocator::free_set::FreeSet, range::AddressRange};

pub mod dto;
mod free_set;

/// State of a single address of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressState {
    /// Eligible for allocation.
    Free,
    /// Handed out by [AddressAllocator::allocate] and not yet released.
    Allocated,
    /// Permanently withheld from allocation.
    Reserved,
}

/// An allocator of the addresses of one [AddressRange].
///
/// Addresses are handed out lowest first. Exhaustion and misuse are not
/// errors: [Self::allocate] returns `None` when no address is free, and
/// [Self::reserve] and [Self::release] return `false` when they leave the
/// state unchanged.
// Impl Note:
// State is tracked by ordinal. `free` holds the Free ordinals, `reserved` the
// Reserved ones, every other ordinal of the range is Allocated.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct AddressAllocator {
    range: AddressRange,
    free: FreeSet,
    reserved: BTreeSet<u128>,
    /// Always equal to `free.len()`, kept separately for O(1) reads.
    remaining: u128,
}

impl AddressAllocator {
    /// Creates an allocator where every address of the range is free.
    pub fn new(range: AddressRange) -> Self {
        tracing::debug!(%range, size = range.len(), "Created address allocator");
        Self {
            range,
            free: FreeSet::full(range.len()),
            reserved: BTreeSet::new(),
            remaining: range.len(),
        }
    }

    /// Allocates the lowest free address.
    ///
    /// Returns `None` if every address is allocated or reserved.
    pub fn allocate(&mut self) -> Option<IpAddr> {
        let Some(ordinal) = self.free.pop_first() else {
            tracing::debug!(range = %self.range, "No addresses available");
            return None;
        };
        self.remaining -= 1;
        debug_assert_eq!(self.remaining, self.free.len());

        let address = self.range.address_at(ordinal);
        tracing::trace!(%address, remaining = self.remaining, "Allocated address");
        Some(address)
    }

    /// Permanently withholds a free address from allocation.
    ///
    /// Returns `true` if the address was free. Addresses that are allocated,
    /// already reserved or outside the range are left untouched.
    pub fn reserve(&mut self, address: IpAddr) -> bool {
        let Some(ordinal) = self.range.position(address) else {
            tracing::debug!(%address, range = %self.range, "Not reserving address outside range");
            return false;
        };
        if let Err(e) = self.free.remove(ordinal) {
            tracing::debug!(%address, state = ?self.state_of(ordinal), "Not reserving address: {e}");
            return false;
        }
        self.reserved.insert(ordinal);
        self.remaining -= 1;
        debug_assert_eq!(self.remaining, self.free.len());

        tracing::trace!(%address, remaining = self.remaining, "Reserved address");
        true
    }

    /// Returns an allocated address to the pool.
    ///
    /// Returns `true` if the address was allocated. Free and reserved
    /// addresses, and addresses outside the range, are left untouched.
    pub fn release(&mut self, address: IpAddr) -> bool {
        let Some(ordinal) = self.range.position(address) else {
            tracing::debug!(%address, range = %self.range, "Not releasing address outside range");
            return false;
        };
        if self.reserved.contains(&ordinal) {
            tracing::debug!(%address, "Not releasing reserved address");
            return false;
        }
        if let Err(e) = self.free.insert(ordinal) {
            tracing::debug!(%address, "Not releasing address: {e}");
            return false;
        }
        self.remaining += 1;
        debug_assert_eq!(self.remaining, self.free.len());

        tracing::trace!(%address, remaining = self.remaining, "Released address");
        true
    }

    /// Number of free addresses.
    pub fn remaining(&self) -> u128 {
        self.remaining
    }

    /// Number of addresses in the range.
    pub fn size(&self) -> u128 {
        self.range.len()
    }

    /// Number of allocated addresses.
    pub fn allocated(&self) -> u128 {
        // Reserved ordinals are distinct range members, so no underflow.
        self.size() - self.remaining - self.reserved.len() as u128
    }

    /// The range addresses are allocated from.
    pub fn range(&self) -> &AddressRange {
        &self.range
    }

    /// The address the next call to [Self::allocate] returns.
    pub fn next_free(&self) -> Option<IpAddr> {
        self.free
            .first()
            .map(|ordinal| self.range.address_at(ordinal))
    }

    /// State of the address, `None` if it is outside the range.
    pub fn state(&self, address: IpAddr) -> Option<AddressState> {
        self.range
            .position(address)
            .map(|ordinal| self.state_of(ordinal))
    }

    /// Check if an address is free
    pub fn is_free(&self, address: IpAddr) -> bool {
        self.state(address) == Some(AddressState::Free)
    }

    /// Reserved addresses in ascending order.
    pub fn reserved(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.reserved
            .iter()
            .map(|ordinal| self.range.address_at(*ordinal))
    }

    fn state_of(&self, ordinal: u128) -> AddressState {
        if self.reserved.contains(&ordinal) {
            AddressState::Reserved
        } else if self.free.contains(ordinal) {
            AddressState::Free
        } else {
            AddressState::Allocated
        }
    }
}
