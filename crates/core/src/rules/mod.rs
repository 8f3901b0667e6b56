//! Placement rule engine.
//!
//! Each check is a pure function over the symbol, the resolved boundaries,
//! the memory map and the rule settings. [`RuleEngine::evaluate`] runs them in
//! a fixed order and concatenates their findings. A check whose boundary
//! markers are missing produces nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory_map::{MemoryMap, RegionAccess};
use crate::model::{BoundarySet, Finding, FindingKind, ResolvedSymbol, Severity};

/// Distance to the heap start below which a variable is reported as close.
pub const HEAP_PROXIMITY_BYTES: u64 = 256;

/// Distance to the stack limit below which a variable is reported as close.
pub const STACK_PROXIMITY_BYTES: u64 = 1024;

/// Assumed FreeRTOS heap arena size (`configTOTAL_HEAP_SIZE` is not visible
/// in the image).
pub const RTOS_HEAP_ARENA_BYTES: u64 = 0x10000;

/// Alignment required for single-instruction atomic load/store.
pub const ATOMIC_ALIGNMENT: u64 = 4;

/// Section cleared by startup code.
pub const ZERO_INIT_SECTION: &str = ".bss";

/// Case-insensitive name fragment marking an intentionally volatile variable.
pub const VOLATILE_NAME_MARKER: &str = "volatile";

/// Tunable thresholds. Every field may be overridden from a target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub heap_proximity: u64,
    pub stack_proximity: u64,
    #[serde(deserialize_with = "crate::memory_map::deserialize_address")]
    pub rtos_heap_arena: u64,
    pub alignment: u64,
    pub zero_init_section: String,
    pub volatile_marker: String,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            heap_proximity: HEAP_PROXIMITY_BYTES,
            stack_proximity: STACK_PROXIMITY_BYTES,
            rtos_heap_arena: RTOS_HEAP_ARENA_BYTES,
            alignment: ATOMIC_ALIGNMENT,
            zero_init_section: ZERO_INIT_SECTION.to_string(),
            volatile_marker: VOLATILE_NAME_MARKER.to_string(),
        }
    }
}

/// Signature shared by every check.
pub type Check = fn(&ResolvedSymbol, &BoundarySet, &MemoryMap, &RuleSettings) -> Vec<Finding>;

/// The battery, in report order.
pub const CHECKS: &[(&str, Check)] = &[
    ("read_only_placement", check_read_only_placement),
    ("alignment", check_alignment),
    ("scratch_placement", check_scratch_placement),
    ("heap_overlap", check_heap_overlap),
    ("stack_overlap", check_stack_overlap),
    ("rtos_heap_arena", check_rtos_heap_arena),
    ("zero_init_volatile", check_zero_init_volatile),
];

/// Rule engine bound to one memory map.
#[derive(Debug, Clone)]
pub struct RuleEngine<'a> {
    map: &'a MemoryMap,
    settings: RuleSettings,
}

impl<'a> RuleEngine<'a> {
    pub fn new(map: &'a MemoryMap) -> Self {
        Self { map, settings: RuleSettings::default() }
    }

    pub fn with_settings(map: &'a MemoryMap, settings: RuleSettings) -> Self {
        Self { map, settings }
    }

    pub fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    /// Run every check in order. Never fails.
    pub fn evaluate(&self, symbol: &ResolvedSymbol, boundaries: &BoundarySet) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, check) in CHECKS {
            let hits = check(symbol, boundaries, self.map, &self.settings);
            if !hits.is_empty() {
                debug!(check = name, hits = hits.len(), symbol = %symbol.name, "check fired");
            }
            findings.extend(hits);
        }
        findings
    }
}

/// Evaluate with default settings.
pub fn evaluate(
    symbol: &ResolvedSymbol,
    boundaries: &BoundarySet,
    map: &MemoryMap,
) -> Vec<Finding> {
    RuleEngine::new(map).evaluate(symbol, boundaries)
}

pub fn check_read_only_placement(
    symbol: &ResolvedSymbol,
    _boundaries: &BoundarySet,
    map: &MemoryMap,
    _settings: &RuleSettings,
) -> Vec<Finding> {
    let Some(region) = map.regions_with(RegionAccess::ReadOnly).find(|r| r.contains(symbol.address))
    else {
        return Vec::new();
    };
    vec![Finding::new(
        FindingKind::ReadOnlyPlacement,
        Severity::Critical,
        format!(
            "Volatile variable '{}' placed in read-only {} (0x{:08x})",
            symbol.name, region.name, symbol.address
        ),
    )
    .detail("Read-only memory cannot be written at runtime; volatile accesses have no effect")
    .detail("Fix: force placement in a RAM section such as .data")]
}

pub fn check_alignment(
    symbol: &ResolvedSymbol,
    _boundaries: &BoundarySet,
    _map: &MemoryMap,
    settings: &RuleSettings,
) -> Vec<Finding> {
    let align = settings.alignment.max(1);
    if symbol.address % align == 0 {
        return Vec::new();
    }
    vec![Finding::new(
        FindingKind::Misaligned,
        Severity::Error,
        format!(
            "Variable '{}' is not {align}-byte aligned (0x{:08x})",
            symbol.name, symbol.address
        ),
    )
    .detail("Unaligned words cannot be loaded or stored atomically across cores")
    .detail(format!("Fix: add __attribute__((aligned({align})))"))]
}

pub fn check_scratch_placement(
    symbol: &ResolvedSymbol,
    _boundaries: &BoundarySet,
    map: &MemoryMap,
    _settings: &RuleSettings,
) -> Vec<Finding> {
    match map.scratch_span() {
        Some((start, end)) if start <= symbol.address && symbol.address < end => {
            vec![Finding::new(
                FindingKind::ScratchPlacement,
                Severity::Warning,
                format!(
                    "Variable '{}' lives in scratch RAM (0x{:08x})",
                    symbol.name, symbol.address
                ),
            )
            .detail("Scratch banks are reserved for per-core and inter-core structures")
            .detail("Concurrent access from both cores may see coherency surprises; review manually")]
        }
        _ => Vec::new(),
    }
}

pub fn check_heap_overlap(
    symbol: &ResolvedSymbol,
    boundaries: &BoundarySet,
    _map: &MemoryMap,
    settings: &RuleSettings,
) -> Vec<Finding> {
    let Some((start, end)) = boundaries.heap() else {
        return Vec::new();
    };
    let address = symbol.address;
    if start <= address && address < end {
        return vec![Finding::new(
            FindingKind::HeapOverlap,
            Severity::Critical,
            format!("Variable '{}' overlaps the heap", symbol.name),
        )
        .detail(format!("Variable at 0x{address:08x}, heap 0x{start:08x}-0x{end:08x}"))
        .detail("malloc may hand this memory out and overwrite it")];
    }
    let distance = address.abs_diff(start);
    if distance < settings.heap_proximity {
        return vec![Finding::new(
            FindingKind::HeapProximity,
            Severity::Warning,
            format!("Variable '{}' is {distance} bytes from the heap start", symbol.name),
        )
        .detail("Heap growth or an off-by-one allocation could reach it")];
    }
    Vec::new()
}

pub fn check_stack_overlap(
    symbol: &ResolvedSymbol,
    boundaries: &BoundarySet,
    _map: &MemoryMap,
    settings: &RuleSettings,
) -> Vec<Finding> {
    let Some((start, end)) = boundaries.stack() else {
        return Vec::new();
    };
    let address = symbol.address;
    if start <= address && address < end {
        return vec![Finding::new(
            FindingKind::StackOverlap,
            Severity::Critical,
            format!("Variable '{}' overlaps the stack", symbol.name),
        )
        .detail(format!("Variable at 0x{address:08x}, stack 0x{start:08x}-0x{end:08x}"))];
    }
    let distance = address.abs_diff(start);
    if distance < settings.stack_proximity {
        return vec![Finding::new(
            FindingKind::StackProximity,
            Severity::Warning,
            format!("Variable '{}' is {distance} bytes from the stack limit", symbol.name),
        )
        .detail("A deep call chain or stack overflow could corrupt it")];
    }
    Vec::new()
}

pub fn check_rtos_heap_arena(
    symbol: &ResolvedSymbol,
    boundaries: &BoundarySet,
    _map: &MemoryMap,
    settings: &RuleSettings,
) -> Vec<Finding> {
    let Some(base) = boundaries.rtos_heap_base else {
        return Vec::new();
    };
    let end = base.saturating_add(settings.rtos_heap_arena);
    if !(base <= symbol.address && symbol.address < end) {
        return Vec::new();
    }
    vec![Finding::new(
        FindingKind::RtosHeapOverlap,
        Severity::Error,
        format!("Variable '{}' is inside the FreeRTOS heap arena", symbol.name),
    )
    .detail("pvPortMalloc may claim and overwrite this memory")
    .detail(format!(
        "Arena assumed to be 0x{base:08x}-0x{end:08x} ({} bytes); the configured size is not read from the image",
        settings.rtos_heap_arena
    ))]
}

pub fn check_zero_init_volatile(
    symbol: &ResolvedSymbol,
    _boundaries: &BoundarySet,
    _map: &MemoryMap,
    settings: &RuleSettings,
) -> Vec<Finding> {
    let marked =
        symbol.name.to_lowercase().contains(&settings.volatile_marker.to_lowercase());
    if symbol.section != settings.zero_init_section || !marked {
        return Vec::new();
    }
    vec![Finding::new(
        FindingKind::ZeroInitVolatile,
        Severity::Warning,
        format!("Volatile variable '{}' is in {}", symbol.name, symbol.section),
    )
    .detail("Startup code clears this section; early hardware or RTOS hooks may read it first")
    .detail("Fix: move it to .data with an explicit initial value")]
}
