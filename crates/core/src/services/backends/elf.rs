use std::fs;
use std::path::Path;

use goblin::elf::section_header::{SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHN_ABS, SHN_COMMON, SHN_UNDEF, SHT_NOBITS};
use goblin::elf::sym::{STB_LOCAL, STB_WEAK, STT_FILE, STT_OBJECT, STT_SECTION};
use goblin::elf::{Elf, Sym};
use goblin::Object;
use tracing::debug;

use crate::services::symbols::{ResolveError, SymbolEntry, SymbolResolver, SymbolTable};

/// In-process resolver that reads the ELF symbol table with goblin.
pub struct ElfResolver;

impl SymbolResolver for ElfResolver {
    fn load(&self, image: &Path) -> Result<SymbolTable, ResolveError> {
        if !image.is_file() {
            return Err(ResolveError::MissingImage(image.to_path_buf()));
        }
        let bytes = fs::read(image)
            .map_err(|source| ResolveError::Io { path: image.to_path_buf(), source })?;
        let elf = match Object::parse(&bytes) {
            Ok(Object::Elf(elf)) => elf,
            Ok(_) => {
                return Err(ResolveError::Malformed(format!(
                    "{} is not an ELF image",
                    image.display()
                )))
            }
            Err(e) => return Err(ResolveError::Malformed(format!("{}: {e}", image.display()))),
        };
        let entries = elf_symbols(&elf);
        debug!(image = %image.display(), symbols = entries.len(), "loaded ELF symbol table");
        Ok(SymbolTable::new(entries))
    }

    fn name(&self) -> &'static str {
        "elf"
    }
}

fn elf_symbols(elf: &Elf) -> Vec<SymbolEntry> {
    let mut symbols = Vec::new();
    for sym in elf.syms.iter() {
        if sym.st_shndx == SHN_UNDEF as usize
            || sym.st_type() == STT_SECTION
            || sym.st_type() == STT_FILE
        {
            continue;
        }
        let name = elf.strtab.get_at(sym.st_name).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        symbols.push(SymbolEntry {
            name: name.to_string(),
            address: sym.st_value,
            size: if sym.st_size > 0 { Some(sym.st_size) } else { None },
            section: section_name(elf, &sym),
            type_tag: nm_type(elf, &sym).to_string(),
        });
    }
    symbols
}

fn section_name(elf: &Elf, sym: &Sym) -> Option<String> {
    match sym.st_shndx {
        idx if idx == SHN_ABS as usize => Some("*ABS*".to_string()),
        idx if idx == SHN_COMMON as usize => Some("*COM*".to_string()),
        idx => elf
            .section_headers
            .get(idx)
            .and_then(|sh| elf.shdr_strtab.get_at(sh.sh_name))
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    }
}

/// nm(1)-style classifier letter: upper case for global, lower case for local.
fn nm_type(elf: &Elf, sym: &Sym) -> char {
    if sym.st_bind() == STB_WEAK {
        return if sym.st_type() == STT_OBJECT { 'V' } else { 'W' };
    }
    let letter = match sym.st_shndx {
        idx if idx == SHN_ABS as usize => 'A',
        idx if idx == SHN_COMMON as usize => 'C',
        idx => match elf.section_headers.get(idx) {
            Some(sh) if sh.sh_type == SHT_NOBITS => 'B',
            Some(sh) if sh.sh_flags & u64::from(SHF_EXECINSTR) != 0 => 'T',
            Some(sh) if sh.sh_flags & u64::from(SHF_WRITE) != 0 => 'D',
            Some(sh) if sh.sh_flags & u64::from(SHF_ALLOC) != 0 => 'R',
            _ => 'N',
        },
    };
    if sym.st_bind() == STB_LOCAL {
        letter.to_ascii_lowercase()
    } else {
        letter
    }
}
