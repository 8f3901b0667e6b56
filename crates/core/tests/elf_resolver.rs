#![cfg(feature = "elf-resolver")]

mod common;

use placement_core::services::backends::ElfResolver;
use placement_core::services::symbols::{ResolveError, SymbolResolver};

#[test]
fn elf_resolver_reads_sections_sizes_and_types() {
    let temp = tempfile::tempdir().unwrap();
    let image = common::write_firmware_fixture(temp.path());
    let table = ElfResolver.load(&image).expect("load fixture");

    let flag = table.resolve_symbol("gVolatileFlag").expect("gVolatileFlag");
    assert_eq!(flag.section, ".bss");
    assert_eq!(flag.size, 4);
    assert_eq!(flag.type_tag, "B");

    let counter = table.resolve_symbol("gCounter").expect("gCounter");
    assert_eq!(counter.section, ".data");
    assert_eq!(counter.size, 4, "zero-sized symbols default to 4 bytes");
    assert_eq!(counter.type_tag, "D");

    let local = table.resolve_symbol("sLocalState").expect("sLocalState");
    assert_eq!(local.type_tag, "d");

    let table_sym = table.resolve_symbol("gFlashTable").expect("gFlashTable");
    assert_eq!(table_sym.address, 0x1000_5001);
    assert_eq!(table_sym.size, 16);
    assert_eq!(table_sym.section, "*ABS*");
    assert_eq!(table_sym.type_tag, "A");
}

#[test]
fn elf_resolver_resolves_boundary_markers() {
    let temp = tempfile::tempdir().unwrap();
    let image = common::write_firmware_fixture(temp.path());
    let boundaries = ElfResolver.load(&image).unwrap().boundaries();
    assert_eq!(boundaries.heap(), Some((common::HEAP_START, common::HEAP_END)));
    assert_eq!(boundaries.stack(), Some((common::STACK_LIMIT, common::STACK_TOP)));
    assert_eq!(boundaries.rtos_heap_base, Some(common::RTOS_HEAP));
}

#[test]
fn elf_resolver_rejects_missing_and_non_elf_images() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope.elf");
    assert!(matches!(ElfResolver.load(&missing), Err(ResolveError::MissingImage(_))));

    let junk = temp.path().join("junk.bin");
    std::fs::write(&junk, b"definitely not an object file").unwrap();
    assert!(matches!(ElfResolver.load(&junk), Err(ResolveError::Malformed(_))));
}
