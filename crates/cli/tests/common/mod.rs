#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};

fn symbol(name: &str, value: u64, size: u64, section: SymbolSection) -> Symbol {
    Symbol {
        name: name.as_bytes().to_vec(),
        value,
        size,
        kind: SymbolKind::Data,
        scope: SymbolScope::Linkage,
        weak: false,
        section,
        flags: SymbolFlags::None,
    }
}

/// Small ARM ELF with one volatile flag in .bss, a few absolute variables and
/// heap/stack markers.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::Arm, Endianness::Little);
    let bss_id = obj.add_section(Vec::new(), b".bss".to_vec(), SectionKind::UninitializedData);
    let flag_off = obj.section_mut(bss_id).append_bss(4, 4);
    obj.add_symbol(symbol("gVolatileFlag", flag_off, 4, SymbolSection::Section(bss_id)));

    for (name, value, size) in [
        ("gFlashVolatile", 0x1000_5001, 4),
        ("gSafe", 0x2000_1000, 4),
        ("_heap_start", 0x2001_0000, 0),
        ("__HeapLimit", 0x2001_1000, 0),
        ("__StackLimit", 0x2004_0000, 0),
        ("__StackTop", 0x2004_1000, 0),
    ] {
        obj.add_symbol(symbol(name, value, size, SymbolSection::Absolute));
    }

    let path = dir.join("firmware.elf");
    std::fs::write(&path, obj.write().expect("write ELF fixture")).expect("save ELF fixture");
    path
}
