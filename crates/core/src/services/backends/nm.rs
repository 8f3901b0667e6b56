use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::services::symbols::{ResolveError, SymbolEntry, SymbolResolver, SymbolTable};

/// Resolver that shells out to GNU binutils (`nm -S` for symbols, `objdump -t`
/// for their sections).
#[derive(Debug, Clone, Default)]
pub struct NmResolver {
    /// Explicit nm path; falls back to `PLACEMENT_NM_BIN`, then `arm-none-eabi-nm`.
    pub nm_path: Option<PathBuf>,
    /// Explicit objdump path; falls back to `PLACEMENT_OBJDUMP_BIN`, then `arm-none-eabi-objdump`.
    pub objdump_path: Option<PathBuf>,
}

impl SymbolResolver for NmResolver {
    fn load(&self, image: &Path) -> Result<SymbolTable, ResolveError> {
        if !image.is_file() {
            return Err(ResolveError::MissingImage(image.to_path_buf()));
        }

        // Allow tests to feed canned tool output via env to avoid needing binutils installed.
        let nm_output = match std::env::var_os("PLACEMENT_NM_FAKE_OUTPUT") {
            Some(fake) => fs::read_to_string(&fake).map_err(|e| {
                ResolveError::Tool(format!("failed to read PLACEMENT_NM_FAKE_OUTPUT: {e}"))
            })?,
            None => {
                let nm = self.nm_path.clone().unwrap_or_else(|| {
                    tool_path("PLACEMENT_NM_BIN", "arm-none-eabi-nm")
                });
                run_tool(&nm, &["-S"], image)?
            }
        };

        // Sections are best effort: without objdump every symbol is "unknown".
        let objdump_output = match std::env::var_os("PLACEMENT_OBJDUMP_FAKE_OUTPUT") {
            Some(fake) => fs::read_to_string(&fake).ok(),
            None => {
                let objdump = self.objdump_path.clone().unwrap_or_else(|| {
                    tool_path("PLACEMENT_OBJDUMP_BIN", "arm-none-eabi-objdump")
                });
                run_tool(&objdump, &["-t"], image)
                    .map_err(|e| warn!("section lookup unavailable: {e}"))
                    .ok()
            }
        };
        let sections = objdump_output.as_deref().map(parse_objdump_sections).unwrap_or_default();

        let entries: Vec<SymbolEntry> = parse_nm(&nm_output)
            .into_iter()
            .map(|mut entry| {
                entry.section = sections.get(&entry.name).cloned();
                entry
            })
            .collect();
        debug!(image = %image.display(), symbols = entries.len(), "loaded nm symbol table");
        Ok(SymbolTable::new(entries))
    }

    fn name(&self) -> &'static str {
        "nm"
    }
}

fn tool_path(env_key: &str, default: &str) -> PathBuf {
    std::env::var_os(env_key).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
}

fn run_tool(tool: &Path, args: &[&str], image: &Path) -> Result<String, ResolveError> {
    let output = Command::new(tool)
        .args(args)
        .arg(image)
        .output()
        .map_err(|e| ResolveError::Tool(format!("failed to spawn {}: {e}", tool.display())))?;
    if !output.status.success() {
        return Err(ResolveError::Tool(format!(
            "{} exited with {}: {}",
            tool.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `nm -S` output. Lines are `ADDR [SIZE] TYPE NAME`; undefined symbols
/// (no address) and anything unparsable are skipped.
pub fn parse_nm(body: &str) -> Vec<SymbolEntry> {
    let mut entries = Vec::new();
    for line in body.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (addr, size, type_tag, name) = match parts.as_slice() {
            [addr, size, type_tag, name] => (*addr, Some(*size), *type_tag, *name),
            [addr, type_tag, name] => (*addr, None, *type_tag, *name),
            _ => continue,
        };
        let Ok(address) = u64::from_str_radix(addr, 16) else {
            debug!(line, "skipping unparsable nm line");
            continue;
        };
        let size = size.and_then(|s| u64::from_str_radix(s, 16).ok()).filter(|s| *s > 0);
        entries.push(SymbolEntry {
            name: name.to_string(),
            address,
            size,
            section: None,
            type_tag: type_tag.to_string(),
        });
    }
    entries
}

/// Parse `objdump -t` output into symbol name -> section. Lines look like
/// `20000100 g     O .bss\t00000004 gFlag`; the first line per name wins.
pub fn parse_objdump_sections(body: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    for line in body.lines() {
        let Some((left, right)) = line.split_once('\t') else {
            continue;
        };
        let mut head = left.split_whitespace();
        let is_symbol_line =
            head.next().is_some_and(|addr| u64::from_str_radix(addr, 16).is_ok());
        let (Some(section), Some(name)) = (head.last(), right.split_whitespace().last()) else {
            continue;
        };
        if is_symbol_line {
            sections.entry(name.to_string()).or_insert_with(|| section.to_string());
        }
    }
    sections
}
