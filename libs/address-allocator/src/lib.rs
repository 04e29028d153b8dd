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
//! # Address Allocator
//!
//! Hand out unique addresses from a bounded, contiguous address range.
//!
//! An [range::AddressRange] describes the addresses. The
//! [allocator::AddressAllocator] tracks for each of them whether it is free,
//! allocated or reserved, always allocates the lowest free address and keeps an
//! O(1) count of the remaining capacity.
//!
//! [shared::SharedAddressAllocator] puts an allocator behind a lock for use by
//! concurrent callers, [config::AllocatorConfig] builds one from configuration.

pub mod allocator;
pub mod config;
pub mod range;
pub mod shared;
