#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};

pub const HEAP_START: u64 = 0x2001_0000;
pub const HEAP_END: u64 = 0x2001_1000;
pub const STACK_LIMIT: u64 = 0x2004_0000;
pub const STACK_TOP: u64 = 0x2004_1000;
pub const RTOS_HEAP: u64 = 0x2002_0000;

fn data_symbol(name: &str, value: u64, size: u64, section: SymbolSection, scope: SymbolScope) -> Symbol {
    Symbol {
        name: name.as_bytes().to_vec(),
        value,
        size,
        kind: SymbolKind::Data,
        scope,
        weak: false,
        section,
        flags: SymbolFlags::None,
    }
}

/// Absolute symbols stand in for linked addresses; .data/.bss symbols carry
/// real section membership.
pub fn write_firmware_fixture(dir: &Path) -> PathBuf {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::Arm, Endianness::Little);

    let data_id = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    let counter_off = obj.section_mut(data_id).append_data(&[0u8; 4], 4);
    let local_off = obj.section_mut(data_id).append_data(&[0u8; 4], 4);

    let bss_id = obj.add_section(Vec::new(), b".bss".to_vec(), SectionKind::UninitializedData);
    let flag_off = obj.section_mut(bss_id).append_bss(4, 4);

    // Size 0 exercises the 4-byte default.
    obj.add_symbol(data_symbol(
        "gCounter",
        counter_off,
        0,
        SymbolSection::Section(data_id),
        SymbolScope::Linkage,
    ));
    obj.add_symbol(data_symbol(
        "sLocalState",
        local_off,
        4,
        SymbolSection::Section(data_id),
        SymbolScope::Compilation,
    ));
    obj.add_symbol(data_symbol(
        "gVolatileFlag",
        flag_off,
        4,
        SymbolSection::Section(bss_id),
        SymbolScope::Linkage,
    ));

    let absolute = [
        ("gFlashTable", 0x1000_5001, 16),
        ("gScratchVolatile", 0x2004_0100, 4),
        ("gNearHeap", 0x2000_FF50, 4),
        ("gInHeap", 0x2001_0500, 4),
        ("gNearStack", 0x2003_FC01, 4),
        ("gInRtosHeap", RTOS_HEAP + 0x100, 4),
        ("gSafe", 0x2000_1000, 4),
        ("_heap_start", HEAP_START, 0),
        ("__HeapLimit", HEAP_END, 0),
        ("__StackLimit", STACK_LIMIT, 0),
        ("__StackTop", STACK_TOP, 0),
        ("ucHeap", RTOS_HEAP, 0x10000),
    ];
    for (name, value, size) in absolute {
        obj.add_symbol(data_symbol(name, value, size, SymbolSection::Absolute, SymbolScope::Linkage));
    }

    let path = dir.join("firmware.elf");
    std::fs::write(&path, obj.write().expect("write ELF fixture")).expect("save ELF fixture");
    path
}

/// Fixture with data symbols only: no heap, stack or RTOS markers.
pub fn write_stripped_fixture(dir: &Path) -> PathBuf {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::Arm, Endianness::Little);
    obj.add_symbol(data_symbol(
        "gInHeap",
        0x2001_0500,
        4,
        SymbolSection::Absolute,
        SymbolScope::Linkage,
    ));
    let path = dir.join("stripped.elf");
    std::fs::write(&path, obj.write().expect("write ELF fixture")).expect("save ELF fixture");
    path
}
