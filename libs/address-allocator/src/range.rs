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
//! Contiguous IP address ranges.
//!
//! An [AddressRange] is an ascending sequence of addresses of a single IP
//! family. Every address in the range has an ordinal, its offset from the first
//! address. The textual form accepted by [AddressRange::from_str] is one of:
//!
//! * `192.168.1.10` - a single address.
//! * `192.168.1.10-192.168.1.20` - `.10` up to, but excluding, `.20`.
//! * `192.168.1.10-20` - the same, IPv4 only, the end replaces the last octet.
//! * `192.168.1.0/24` - every address of a prefix, network and broadcast included.
//! * `192.168.1.10+10` - a start address and an address count, which may be zero.

use std::{
    fmt::{self, Display},
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Address range creation and parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// Text is not an IP address.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    /// Text is not an IP prefix.
    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),
    /// Text is not an address count.
    #[error("invalid address count {0:?}")]
    InvalidCount(String),
    /// Range bounds are of different IP versions.
    #[error("range bounds {0} and {1} belong to different address families")]
    MixedFamilies(IpAddr, IpAddr),
    /// Range end is lower than the range start.
    #[error("range end {1} is before range start {0}")]
    EndBeforeStart(IpAddr, IpAddr),
    /// Range covers the entire IPv6 address space.
    #[error("ranges containing 2^128 addresses are not supported")]
    TooLarge,
    /// Range runs past the last address of its family.
    #[error("{len} addresses starting at {start} exceed the address space")]
    OutOfBounds {
        /// First address of the range.
        start: IpAddr,
        /// Requested number of addresses.
        len: u128,
    },
}

/// An ascending range of consecutive IP addresses of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: IpAddr,
    len: u128,
}

impl AddressRange {
    /// Creates a range of `len` consecutive addresses beginning at `start`.
    ///
    /// A `len` of zero yields an empty range.
    pub fn new(start: IpAddr, len: u128) -> Result<Self, RangeError> {
        if len > 0 {
            to_bits(start)
                .checked_add(len - 1)
                .filter(|last| *last <= max_bits(start))
                .ok_or(RangeError::OutOfBounds { start, len })?;
        }
        Ok(Self { start, len })
    }

    /// Creates a range from its first and last address, both inclusive.
    pub fn from_bounds(first: IpAddr, last: IpAddr) -> Result<Self, RangeError> {
        if first.is_ipv4() != last.is_ipv4() {
            return Err(RangeError::MixedFamilies(first, last));
        }
        let (first_bits, last_bits) = (to_bits(first), to_bits(last));
        if last_bits < first_bits {
            return Err(RangeError::EndBeforeStart(first, last));
        }
        let len = (last_bits - first_bits)
            .checked_add(1)
            .ok_or(RangeError::TooLarge)?;
        Ok(Self { start: first, len })
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u128 {
        self.len
    }

    /// Returns true if the range holds no address.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The lowest address of the range.
    pub fn first(&self) -> Option<IpAddr> {
        self.nth(0)
    }

    /// The highest address of the range.
    pub fn last(&self) -> Option<IpAddr> {
        self.nth(self.len.checked_sub(1)?)
    }

    /// Returns true if the address is part of the range.
    pub fn contains(&self, address: IpAddr) -> bool {
        self.position(address).is_some()
    }

    /// Returns the ordinal of the address within the range.
    pub fn position(&self, address: IpAddr) -> Option<u128> {
        if address.is_ipv4() != self.start.is_ipv4() {
            return None;
        }
        let offset = to_bits(address).checked_sub(to_bits(self.start))?;
        (offset < self.len).then_some(offset)
    }

    /// Returns the address with the given ordinal.
    pub fn nth(&self, ordinal: u128) -> Option<IpAddr> {
        (ordinal < self.len).then(|| self.address_at(ordinal))
    }

    /// Iterates over all addresses in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = IpAddr> + use<> {
        let range = *self;
        (0..range.len).map(move |ordinal| range.address_at(ordinal))
    }

    /// Address at `ordinal`, which must be lower than `len`.
    pub(crate) fn address_at(&self, ordinal: u128) -> IpAddr {
        from_bits(self.start, to_bits(self.start) + ordinal)
    }

    /// The first address after the range, `None` past the end of the address space.
    fn end(&self) -> Option<IpAddr> {
        to_bits(self.start)
            .checked_add(self.len)
            .filter(|end| *end <= max_bits(self.start))
            .map(|end| from_bits(self.start, end))
    }
}

/// Builds an address of the same family as `family`; `bits` must fit that family.
fn from_bits(family: IpAddr, bits: u128) -> IpAddr {
    match family {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from_bits(bits as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from_bits(bits)),
    }
}

fn to_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(addr) => addr.to_bits().into(),
        IpAddr::V6(addr) => addr.to_bits(),
    }
}

fn max_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(_) => u32::MAX.into(),
        IpAddr::V6(_) => u128::MAX,
    }
}

impl Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.len, self.end()) {
            (1, _) => write!(f, "{}", self.start),
            (2.., Some(end)) => write!(f, "{}-{}", self.start, end),
            (len, _) => write!(f, "{}+{}", self.start, len),
        }
    }
}

impl FromStr for AddressRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some((start, count)) = s.split_once('+') {
            let start = parse_address(start)?;
            let count = count.trim();
            let len = count
                .parse::<u128>()
                .map_err(|_| RangeError::InvalidCount(count.to_string()))?;
            return Self::new(start, len);
        }

        if s.contains('/') {
            let prefix: IpNet = s
                .parse()
                .map_err(|_| RangeError::InvalidPrefix(s.to_string()))?;
            return Self::try_from(prefix);
        }

        match s.split_once('-') {
            Some((start, end)) => {
                let start = parse_address(start)?;
                let end = parse_range_end(start, end.trim())?;
                if start.is_ipv4() != end.is_ipv4() {
                    return Err(RangeError::MixedFamilies(start, end));
                }
                let len = to_bits(end)
                    .checked_sub(to_bits(start))
                    .ok_or(RangeError::EndBeforeStart(start, end))?;
                Self::new(start, len)
            }
            None => Self::new(parse_address(s)?, 1),
        }
    }
}

fn parse_address(s: &str) -> Result<IpAddr, RangeError> {
    let s = s.trim();
    s.parse()
        .map_err(|_| RangeError::InvalidAddress(s.to_string()))
}

// The exclusive end of an IPv4 range may be abbreviated to its last octet.
fn parse_range_end(first: IpAddr, s: &str) -> Result<IpAddr, RangeError> {
    if let Ok(address) = s.parse::<IpAddr>() {
        return Ok(address);
    }
    match (first, s.parse::<u8>()) {
        (IpAddr::V4(first), Ok(octet)) => {
            let [a, b, c, _] = first.octets();
            Ok(IpAddr::V4(Ipv4Addr::new(a, b, c, octet)))
        }
        _ => Err(RangeError::InvalidAddress(s.to_string())),
    }
}

impl TryFrom<IpNet> for AddressRange {
    type Error = RangeError;

    fn try_from(prefix: IpNet) -> Result<Self, Self::Error> {
        Self::from_bounds(prefix.network(), prefix.broadcast())
    }
}

impl Serialize for AddressRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
