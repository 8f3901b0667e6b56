use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::memory_map::{MemoryMap, MemoryRegion};
use crate::model::{BoundarySet, Finding, FindingBuckets, ResolvedSymbol};
use crate::rules::{RuleEngine, RuleSettings};
use crate::services::symbols::{ResolveError, SymbolResolver};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image not found at {0}")]
    MissingImage(PathBuf),
    #[error("Variable '{0}' not found in image")]
    SymbolNotFound(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A remediation snippet shown when a variable has findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub snippet: Vec<String>,
}

/// Everything a renderer needs for one analyzed variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub image: String,
    pub target: String,
    pub resolver: String,
    pub symbol: ResolvedSymbol,
    /// Region containing the symbol's address, if any.
    pub region: Option<MemoryRegion>,
    pub boundaries: BoundarySet,
    pub problems: Vec<Finding>,
    pub warnings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
}

impl PlacementReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty() && self.warnings.is_empty()
    }

    /// Human-readable region verdict, e.g. `ram (OK for volatile)`.
    pub fn region_summary(&self) -> String {
        match &self.region {
            Some(region) => format!("{} ({})", region.name, region.access.assessment()),
            None => "unknown".to_string(),
        }
    }
}

/// Coordinator tying a resolver, a memory map and rule settings together.
pub struct PlacementAnalyzer<'a> {
    pub resolver: &'a dyn SymbolResolver,
    pub map: &'a MemoryMap,
    pub settings: RuleSettings,
}

impl<'a> PlacementAnalyzer<'a> {
    pub fn new(resolver: &'a dyn SymbolResolver, map: &'a MemoryMap) -> Self {
        Self { resolver, map, settings: RuleSettings::default() }
    }

    pub fn with_settings(mut self, settings: RuleSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Resolve `variable` in `image` and run the rule engine over it.
    pub fn analyze(&self, image: &Path, variable: &str) -> Result<PlacementReport, AnalysisError> {
        if !image.is_file() {
            return Err(AnalysisError::MissingImage(image.to_path_buf()));
        }

        let table = self.resolver.load(image)?;
        let symbol = table
            .resolve_symbol(variable)
            .ok_or_else(|| AnalysisError::SymbolNotFound(variable.to_string()))?;
        debug!(
            symbol = %symbol.name,
            section = %symbol.section,
            "resolved at 0x{:08x} ({} bytes)",
            symbol.address,
            symbol.size
        );
        let boundaries = table.boundaries();

        let engine = RuleEngine::with_settings(self.map, self.settings.clone());
        let buckets = FindingBuckets::partition(engine.evaluate(&symbol, &boundaries));
        info!(
            symbol = %symbol.name,
            problems = buckets.problems.len(),
            warnings = buckets.warnings.len(),
            "placement analysis complete"
        );

        let recommendations =
            if buckets.is_clean() { Vec::new() } else { recommendations_for(&symbol.name) };

        Ok(PlacementReport {
            image: image.display().to_string(),
            target: self.map.name().to_string(),
            resolver: self.resolver.name().to_string(),
            region: self.map.region_for(symbol.address).cloned(),
            symbol,
            boundaries,
            problems: buckets.problems,
            warnings: buckets.warnings,
            recommendations,
        })
    }
}

/// Standard remediation snippets for a variable named `name`.
pub fn recommendations_for(name: &str) -> Vec<Recommendation> {
    vec![
        Recommendation {
            title: "Force RAM placement in your source".into(),
            snippet: vec![format!(
                "__attribute__((section(\".data\"))) volatile uint32_t {name} = 0;"
            )],
        },
        Recommendation {
            title: "Or create a dedicated section in the linker script".into(),
            snippet: vec![
                ".volatile_data : {".into(),
                "    . = ALIGN(4);".into(),
                "    *(.volatile_data)".into(),
                "} > RAM".into(),
                format!(
                    "Then: __attribute__((section(\".volatile_data\"))) volatile uint32_t {name};"
                ),
            ],
        },
        Recommendation {
            title: "For SMP/multicore safety".into(),
            snippet: vec![
                format!("volatile uint32_t {name} __attribute__((aligned(4)));"),
                "// Access with atomic operations:".into(),
                format!("uint32_t val = __atomic_load_n(&{name}, __ATOMIC_SEQ_CST);"),
            ],
        },
    ]
}
