use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{BoundaryKind, BoundarySet, ResolvedSymbol, UNKNOWN_SECTION};

/// One defined symbol as reported by a resolver backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub address: u64,
    pub size: Option<u64>,
    pub section: Option<String>,
    pub type_tag: String,
}

/// Symbol table of one image, loaded once and queried in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    pub fn new(entries: Vec<SymbolEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// First entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Resolve a variable by name. Missing sizes default to 4 bytes and a
    /// missing section becomes `"unknown"`.
    pub fn resolve_symbol(&self, name: &str) -> Option<ResolvedSymbol> {
        let entry = self.find(name)?;
        Some(
            ResolvedSymbol::new(&entry.name, entry.address)
                .with_size(entry.size.unwrap_or(0))
                .with_section(entry.section.as_deref().unwrap_or(UNKNOWN_SECTION))
                .with_type_tag(&entry.type_tag),
        )
    }

    /// Address of the first alias (in list order) present in the table.
    pub fn resolve_boundary(&self, aliases: &[&str]) -> Option<u64> {
        aliases.iter().find_map(|alias| self.find(alias)).map(|e| e.address)
    }

    /// Resolve every boundary marker; unresolved markers stay `None`.
    pub fn boundaries(&self) -> BoundarySet {
        let mut set = BoundarySet::default();
        for kind in BoundaryKind::ALL {
            let address = self.resolve_boundary(kind.aliases());
            match address {
                Some(addr) => debug!(marker = kind.as_str(), "resolved at 0x{addr:08x}"),
                None => warn!(
                    marker = kind.as_str(),
                    aliases = ?kind.aliases(),
                    "boundary marker not found; dependent checks are skipped"
                ),
            }
            set.set(kind, address);
        }
        set
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Image not found at {0}")]
    MissingImage(PathBuf),
    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported or malformed image: {0}")]
    Malformed(String),
    #[error("Resolver tool error: {0}")]
    Tool(String),
}

/// Source of symbol tables (in-process ELF parsing, binutils, ...).
pub trait SymbolResolver: Send + Sync {
    fn load(&self, image: &Path) -> Result<SymbolTable, ResolveError>;
    fn name(&self) -> &'static str;
}

/// Registry for resolver backends; callers select by name.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Box<dyn SymbolResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self { resolvers: HashMap::new() }
    }

    pub fn register<R: SymbolResolver + 'static>(&mut self, resolver: R) -> &mut Self {
        self.resolvers.insert(resolver.name().to_string(), Box::new(resolver));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn SymbolResolver> {
        self.resolvers.get(name).map(|r| &**r)
    }

    /// Return a sorted list of registered resolver names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resolvers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with every resolver compiled into this build.
pub fn default_resolver_registry() -> ResolverRegistry {
    #[allow(unused_mut)]
    let mut registry = ResolverRegistry::new();
    #[cfg(feature = "elf-resolver")]
    {
        registry.register(crate::services::backends::ElfResolver);
    }
    #[cfg(feature = "nm-resolver")]
    {
        registry.register(crate::services::backends::NmResolver::default());
    }
    registry
}

/// Name of the resolver used when none is requested.
pub fn default_resolver_name() -> &'static str {
    if cfg!(feature = "elf-resolver") {
        "elf"
    } else {
        "nm"
    }
}
