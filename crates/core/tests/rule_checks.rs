use placement_core::memory_map::{MemoryMap, MemoryRegion, RegionAccess};
use placement_core::model::{BoundarySet, FindingKind, ResolvedSymbol, Severity};
use placement_core::rules::{
    check_heap_overlap, check_read_only_placement, check_rtos_heap_arena, check_scratch_placement,
    check_stack_overlap, RuleEngine, RuleSettings, CHECKS, HEAP_PROXIMITY_BYTES,
    RTOS_HEAP_ARENA_BYTES, STACK_PROXIMITY_BYTES,
};

fn custom_map() -> MemoryMap {
    MemoryMap::new(
        "custom",
        vec![
            MemoryRegion::new("rom", 0x0000_0000, 0x0000_4000, RegionAccess::ReadOnly),
            MemoryRegion::new("boot2", 0x0000_4000, 0x0000_4100, RegionAccess::ReadOnly),
            MemoryRegion::new("sram", 0x2000_0000, 0x2001_0000, RegionAccess::ReadWrite),
            MemoryRegion::new("core_local", 0x3000_0000, 0x3000_1000, RegionAccess::MulticoreScratch),
        ],
    )
    .expect("valid map")
}

#[test]
fn default_settings_use_named_constants() {
    let settings = RuleSettings::default();
    assert_eq!(settings.heap_proximity, HEAP_PROXIMITY_BYTES);
    assert_eq!(settings.stack_proximity, STACK_PROXIMITY_BYTES);
    assert_eq!(settings.rtos_heap_arena, RTOS_HEAP_ARENA_BYTES);
    assert_eq!(settings.alignment, 4);
    assert_eq!(settings.zero_init_section, ".bss");
}

#[test]
fn battery_runs_in_documented_order() {
    let names: Vec<&str> = CHECKS.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        [
            "read_only_placement",
            "alignment",
            "scratch_placement",
            "heap_overlap",
            "stack_overlap",
            "rtos_heap_arena",
            "zero_init_volatile",
        ]
    );
}

#[test]
fn read_only_check_uses_the_map_it_is_given() {
    let map = custom_map();
    let settings = RuleSettings::default();
    let none = BoundarySet::default();

    let in_boot2 = ResolvedSymbol::new("gFlag", 0x0000_4010);
    let hits = check_read_only_placement(&in_boot2, &none, &map, &settings);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].message.contains("boot2"));

    // Flash on the RP2040 is just another address on this map.
    let rp2040_flash = ResolvedSymbol::new("gFlag", 0x1000_0000);
    assert!(check_read_only_placement(&rp2040_flash, &none, &map, &settings).is_empty());
    assert!(check_scratch_placement(&ResolvedSymbol::new("g", 0x3000_0800), &none, &map, &settings)
        .len()
        == 1);
}

#[test]
fn overridden_thresholds_change_proximity_and_arena() {
    let map = MemoryMap::rp2040();
    let settings = RuleSettings {
        heap_proximity: 1024,
        stack_proximity: 16,
        rtos_heap_arena: 0x200,
        ..RuleSettings::default()
    };
    let boundaries = BoundarySet {
        heap_start: Some(0x2001_0000),
        heap_end: Some(0x2001_1000),
        stack_start: Some(0x2003_0000),
        stack_end: Some(0x2003_1000),
        rtos_heap_base: Some(0x2002_0000),
    };

    let near_heap = ResolvedSymbol::new("g", 0x2000_FE00);
    let hits = check_heap_overlap(&near_heap, &boundaries, &map, &settings);
    assert_eq!(hits[0].kind, FindingKind::HeapProximity);

    let near_stack = ResolvedSymbol::new("g", 0x2002_FF00);
    assert!(check_stack_overlap(&near_stack, &boundaries, &map, &settings).is_empty());

    let past_small_arena = ResolvedSymbol::new("g", 0x2002_0200);
    assert!(check_rtos_heap_arena(&past_small_arena, &boundaries, &map, &settings).is_empty());
}

#[test]
fn proximity_is_symmetric_around_heap_start() {
    let map = MemoryMap::rp2040();
    let settings = RuleSettings::default();
    // Heap of zero length: addresses on either side are measured against heap_start.
    let boundaries = BoundarySet {
        heap_start: Some(0x2001_0000),
        heap_end: Some(0x2001_0000),
        ..Default::default()
    };
    for address in [0x2000_FFF0, 0x2001_0010] {
        let hits = check_heap_overlap(&ResolvedSymbol::new("g", address), &boundaries, &map, &settings);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Warning);
    }
}

#[test]
fn engine_with_custom_marker_and_section() {
    let map = MemoryMap::rp2040();
    let settings = RuleSettings {
        zero_init_section: ".noinit".into(),
        volatile_marker: "shared".into(),
        ..RuleSettings::default()
    };
    let engine = RuleEngine::with_settings(&map, settings);
    let symbol = ResolvedSymbol::new("core1SharedMailbox", 0x2000_0200).with_section(".noinit");
    let findings = engine.evaluate(&symbol, &BoundarySet::default());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::ZeroInitVolatile);
    assert_eq!(engine.settings().volatile_marker, "shared");
}
