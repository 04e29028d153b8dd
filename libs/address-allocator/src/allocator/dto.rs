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
//! Snapshots of the allocator state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::allocator::AddressAllocator;

/// A point-in-time view of an address allocator.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct AllocatorStateDto {
    /// The address range.
    pub range: String,
    /// Number of addresses in the range.
    pub size: u128,
    /// Number of free addresses.
    pub remaining: u128,
    /// Reserved addresses, ascending.
    pub reserved: Vec<String>,
    /// Free addresses as inclusive spans, ascending.
    pub free: Vec<AddrSpanDto>,
}

impl From<&AddressAllocator> for AllocatorStateDto {
    fn from(allocator: &AddressAllocator) -> Self {
        let range = allocator.range();
        AllocatorStateDto {
            range: range.to_string(),
            size: allocator.size(),
            remaining: allocator.remaining(),
            reserved: allocator.reserved().map(|addr| addr.to_string()).collect(),
            free: allocator
                .free
                .spans()
                .iter()
                .map(|span| {
                    AddrSpanDto {
                        first: range.address_at(span.start).to_string(),
                        last: range.address_at(span.end - 1).to_string(),
                    }
                })
                .collect(),
        }
    }
}

/// A span of consecutive addresses.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct AddrSpanDto {
    /// The first address of the span.
    pub first: String,
    /// The last address of the span.
    pub last: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn should_describe_free_spans_and_reservations() {
        let mut allocator = AddressAllocator::new("192.168.1.10-20".parse().unwrap());
        allocator.reserve("192.168.1.11".parse().unwrap());
        allocator.reserve("192.168.1.15".parse().unwrap());
        allocator.allocate();

        let dto = AllocatorStateDto::from(&allocator);
        assert_eq!(dto.range, "192.168.1.10-192.168.1.20");
        assert_eq!(dto.size, 10);
        assert_eq!(dto.remaining, 7);
        assert_eq!(dto.reserved, vec!["192.168.1.11", "192.168.1.15"]);
        assert_eq!(
            dto.free,
            vec![
                AddrSpanDto {
                    first: "192.168.1.12".to_string(),
                    last: "192.168.1.14".to_string(),
                },
                AddrSpanDto {
                    first: "192.168.1.16".to_string(),
                    last: "192.168.1.19".to_string(),
                },
            ]
        );
    }

    #[test_log::test]
    fn should_serialize_to_json() {
        let allocator = AddressAllocator::new("10.0.0.0+2".parse().unwrap());
        let json = serde_json::to_value(AllocatorStateDto::from(&allocator)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "range": "10.0.0.0-10.0.0.2",
                "size": 2,
                "remaining": 2,
                "reserved": [],
                "free": [{ "first": "10.0.0.0", "last": "10.0.0.1" }],
            })
        );
    }
}
