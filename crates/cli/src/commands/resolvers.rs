use anyhow::Result;
use serde::Serialize;

use placement_core::services::symbols::{default_resolver_name, default_resolver_registry};

#[derive(Debug, Serialize)]
pub struct ResolverInfo {
    pub name: String,
    pub description: String,
    pub default: bool,
}

/// Describe the resolver backends compiled into this binary.
pub fn resolver_infos() -> Vec<ResolverInfo> {
    let registry = default_resolver_registry();
    registry
        .names()
        .into_iter()
        .map(|name| {
            let description = match name.as_str() {
                "elf" => "In-process ELF symbol table reader".to_string(),
                "nm" => "GNU binutils nm/objdump (set PLACEMENT_NM_BIN / PLACEMENT_OBJDUMP_BIN)"
                    .to_string(),
                other => format!("Resolver '{}'", other),
            };
            let default = name == default_resolver_name();
            ResolverInfo { name, description, default }
        })
        .collect()
}

/// List available symbol resolvers.
pub fn list_resolvers_command(json: bool) -> Result<()> {
    let entries = resolver_infos();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Resolvers: (none)");
        return Ok(());
    }

    println!("Resolvers:");
    for entry in entries {
        let marker = if entry.default { " (default)" } else { "" };
        println!("- {}{}: {}", entry.name, marker, entry.description);
    }

    Ok(())
}
