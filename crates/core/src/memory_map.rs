//! Target memory map.
//!
//! A `MemoryMap` is an immutable, ordered table of non-overlapping regions.
//! The built-in RP2040 map lives in [`rp2040`]; other targets can be loaded
//! from a target description (see [`crate::config`]).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// RP2040 address constants.
pub mod rp2040 {
    pub const FLASH_START: u64 = 0x1000_0000;
    pub const FLASH_END: u64 = 0x1020_0000;

    /// Main SRAM, word-striped across four banks.
    pub const RAM_START: u64 = 0x2000_0000;
    pub const RAM_END: u64 = 0x2004_0000;

    pub const SCRATCH_X_START: u64 = 0x2004_0000;
    pub const SCRATCH_X_END: u64 = 0x2004_1000;
    pub const SCRATCH_Y_START: u64 = 0x2004_1000;
    pub const SCRATCH_Y_END: u64 = 0x2004_2000;
}

/// Access attribute of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionAccess {
    ReadOnly,
    ReadWrite,
    /// Read-write, but reserved for per-core/inter-core structures.
    MulticoreScratch,
}

impl RegionAccess {
    /// Short verdict used by reports for a volatile variable living here.
    pub fn assessment(self) -> &'static str {
        match self {
            RegionAccess::ReadOnly => "PROBLEM for volatile",
            RegionAccess::ReadWrite => "OK for volatile",
            RegionAccess::MulticoreScratch => "review multicore access",
        }
    }
}

/// A named half-open address range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub name: String,
    #[serde(deserialize_with = "deserialize_address")]
    pub start: u64,
    #[serde(deserialize_with = "deserialize_address")]
    pub end: u64,
    pub access: RegionAccess,
}

impl MemoryRegion {
    pub fn new(name: impl Into<String>, start: u64, end: u64, access: RegionAccess) -> Self {
        Self { name: name.into(), start, end, access }
    }

    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.end
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    fn overlaps(&self, other: &MemoryRegion) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08x}-0x{:08x})", self.name, self.start, self.end)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("Memory map '{0}' has no regions")]
    Empty(String),
    #[error("Region '{name}' is empty or inverted (0x{start:08x}..0x{end:08x})")]
    InvalidRange { name: String, start: u64, end: u64 },
    #[error("Regions '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },
}

/// Immutable table of regions for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryMap {
    name: String,
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    /// Build a map, rejecting empty, inverted and overlapping regions.
    pub fn new(name: impl Into<String>, regions: Vec<MemoryRegion>) -> Result<Self, MapError> {
        let name = name.into();
        if regions.is_empty() {
            return Err(MapError::Empty(name));
        }
        for region in &regions {
            if region.start >= region.end {
                return Err(MapError::InvalidRange {
                    name: region.name.clone(),
                    start: region.start,
                    end: region.end,
                });
            }
        }
        for (i, a) in regions.iter().enumerate() {
            if let Some(b) = regions[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(MapError::Overlap { first: a.name.clone(), second: b.name.clone() });
            }
        }
        Ok(Self { name, regions })
    }

    /// The RP2040 map: flash, striped RAM, and the two scratch banks.
    pub fn rp2040() -> Self {
        use self::rp2040::*;
        Self {
            name: "rp2040".to_string(),
            regions: vec![
                MemoryRegion::new("flash", FLASH_START, FLASH_END, RegionAccess::ReadOnly),
                MemoryRegion::new("ram", RAM_START, RAM_END, RegionAccess::ReadWrite),
                MemoryRegion::new(
                    "scratch_x",
                    SCRATCH_X_START,
                    SCRATCH_X_END,
                    RegionAccess::MulticoreScratch,
                ),
                MemoryRegion::new(
                    "scratch_y",
                    SCRATCH_Y_START,
                    SCRATCH_Y_END,
                    RegionAccess::MulticoreScratch,
                ),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// The region containing `address`, if any.
    pub fn region_for(&self, address: u64) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.contains(address))
    }

    /// Regions with the given access attribute, in table order.
    pub fn regions_with(&self, access: RegionAccess) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter().filter(move |r| r.access == access)
    }

    /// Combined `[lowest start, highest end)` of all scratch regions.
    pub fn scratch_span(&self) -> Option<(u64, u64)> {
        self.regions_with(RegionAccess::MulticoreScratch).fold(None, |span, r| match span {
            None => Some((r.start, r.end)),
            Some((lo, hi)) => Some((lo.min(r.start), hi.max(r.end))),
        })
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::rp2040()
    }
}

/// Accept addresses as integers or as `"0x..."` strings (JSON has no hex).
pub(crate) fn deserialize_address<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Text(text) => parse_address(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid address '{text}'"))
        }),
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal address.
pub fn parse_address(text: &str) -> Option<u64> {
    let text = text.trim().replace('_', "");
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
