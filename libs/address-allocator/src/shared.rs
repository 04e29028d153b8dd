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
//! Address allocator shared between threads.

use std::{
    net::IpAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    allocator::{AddressAllocator, AddressState, dto::AllocatorStateDto},
    range::AddressRange,
};

/// A cloneable handle to one [AddressAllocator].
///
/// Every operation runs under a single lock, so concurrent callers never get
/// the same address and always see a consistent `remaining` count.
#[derive(Debug, Clone)]
pub struct SharedAddressAllocator {
    inner: Arc<Mutex<AddressAllocator>>,
}

impl SharedAddressAllocator {
    /// Creates a shared allocator where every address of the range is free.
    pub fn new(range: AddressRange) -> Self {
        AddressAllocator::new(range).into()
    }

    /// See [AddressAllocator::allocate].
    pub fn allocate(&self) -> Option<IpAddr> {
        self.lock().allocate()
    }

    /// See [AddressAllocator::reserve].
    pub fn reserve(&self, address: IpAddr) -> bool {
        self.lock().reserve(address)
    }

    /// See [AddressAllocator::release].
    pub fn release(&self, address: IpAddr) -> bool {
        self.lock().release(address)
    }

    /// See [AddressAllocator::remaining].
    pub fn remaining(&self) -> u128 {
        self.lock().remaining()
    }

    /// See [AddressAllocator::state].
    pub fn state(&self, address: IpAddr) -> Option<AddressState> {
        self.lock().state(address)
    }

    /// Consistent snapshot of the allocator state.
    pub fn snapshot(&self) -> AllocatorStateDto {
        (&*self.lock()).into()
    }

    // Every operation either completes its update or changes nothing, so a
    // poisoned lock still guards a consistent allocator.
    fn lock(&self) -> MutexGuard<'_, AddressAllocator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<AddressAllocator> for SharedAddressAllocator {
    fn from(allocator: AddressAllocator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(allocator)),
        }
    }
}
