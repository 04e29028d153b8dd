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
//! Allocator configuration.

use std::net::IpAddr;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::{allocator::AddressAllocator, range::AddressRange};

/// Configuration of an address allocator.
///
/// ```json
/// { "range": "192.168.1.10-20", "reserved": ["192.168.1.11"] }
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// The range to allocate from.
    pub range: AddressRange,
    /// Addresses withheld from allocation.
    #[serde(default)]
    pub reserved: Vec<IpAddr>,
}

impl AllocatorConfig {
    /// Parses the JSON form of the configuration.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid allocator configuration")
    }
}

impl TryFrom<AllocatorConfig> for AddressAllocator {
    type Error = anyhow::Error;

    fn try_from(config: AllocatorConfig) -> Result<Self, Self::Error> {
        let mut allocator = AddressAllocator::new(config.range);
        for address in config.reserved {
            if !config.range.contains(address) {
                bail!("reserved address {address} not in range {}", config.range);
            }
            if !allocator.reserve(address) {
                bail!("reserved address {address} listed more than once");
            }
        }
        tracing::debug!(
            range = %config.range,
            remaining = allocator.remaining(),
            "Built allocator from configuration"
        );
        Ok(allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn should_build_allocator_with_reservations() {
        let config = AllocatorConfig::from_json(
            r#"{ "range": "192.168.1.10-20", "reserved": ["192.168.1.11", "192.168.1.10"] }"#,
        )
        .unwrap();
        let mut allocator = AddressAllocator::try_from(config).unwrap();

        assert_eq!(allocator.remaining(), 8);
        assert_eq!(allocator.allocate(), Some("192.168.1.12".parse().unwrap()));
    }

    #[test_log::test]
    fn should_default_to_no_reservations() {
        let config = AllocatorConfig::from_json(r#"{ "range": "10.0.0.0/30" }"#).unwrap();
        assert!(config.reserved.is_empty());
        assert_eq!(AddressAllocator::try_from(config).unwrap().remaining(), 4);
    }

    #[test_log::test]
    fn should_reject_invalid_configurations() {
        let err = AllocatorConfig::from_json(r#"{ "range": "10.0.0.9-1" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("before range start"), "{err:#}");

        let config = AllocatorConfig::from_json(
            r#"{ "range": "10.0.0.0/30", "reserved": ["10.0.0.4"] }"#,
        )
        .unwrap();
        let err = AddressAllocator::try_from(config).unwrap_err();
        assert!(err.to_string().contains("not in range"), "{err}");

        let config = AllocatorConfig::from_json(
            r#"{ "range": "10.0.0.0/30", "reserved": ["10.0.0.1", "10.0.0.1"] }"#,
        )
        .unwrap();
        let err = AddressAllocator::try_from(config).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }
}
