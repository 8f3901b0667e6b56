//! Core data model: the symbol under analysis, the boundary markers resolved
//! from the same image, and the findings produced by the rule engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Size assumed for a symbol whose symbol-table entry carries no size.
pub const DEFAULT_SYMBOL_SIZE: u64 = 4;

/// Section name used when a symbol's section could not be determined.
pub const UNKNOWN_SECTION: &str = "unknown";

/// A variable resolved from a firmware image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub section: String,
    /// Raw classifier from the resolver (nm-style letter). Display only.
    pub type_tag: String,
}

impl ResolvedSymbol {
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            address,
            size: DEFAULT_SYMBOL_SIZE,
            section: UNKNOWN_SECTION.to_string(),
            type_tag: "?".to_string(),
        }
    }

    /// Set the size, falling back to [`DEFAULT_SYMBOL_SIZE`] for zero.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = if size == 0 { DEFAULT_SYMBOL_SIZE } else { size };
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = type_tag.into();
        self
    }
}

/// Well-known linker/RTOS markers that bound the heap, stack and RTOS arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    HeapStart,
    HeapEnd,
    StackStart,
    StackEnd,
    RtosHeapBase,
}

impl BoundaryKind {
    pub const ALL: [BoundaryKind; 5] = [
        BoundaryKind::HeapStart,
        BoundaryKind::HeapEnd,
        BoundaryKind::StackStart,
        BoundaryKind::StackEnd,
        BoundaryKind::RtosHeapBase,
    ];

    /// Symbol names accepted for this marker, in lookup order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            BoundaryKind::HeapStart => &["_heap_start", "__end__"],
            BoundaryKind::HeapEnd => &["_heap_end", "__HeapLimit"],
            BoundaryKind::StackStart => &["__StackLimit", "_stack_bottom"],
            BoundaryKind::StackEnd => &["__StackTop", "_stack_top"],
            BoundaryKind::RtosHeapBase => &["ucHeap", "xHeap"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryKind::HeapStart => "heap_start",
            BoundaryKind::HeapEnd => "heap_end",
            BoundaryKind::StackStart => "stack_start",
            BoundaryKind::StackEnd => "stack_end",
            BoundaryKind::RtosHeapBase => "rtos_heap_base",
        }
    }
}

/// Snapshot of resolved boundary markers. Any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySet {
    pub heap_start: Option<u64>,
    pub heap_end: Option<u64>,
    /// Stack limit (lowest address).
    pub stack_start: Option<u64>,
    /// Stack top (highest address).
    pub stack_end: Option<u64>,
    pub rtos_heap_base: Option<u64>,
}

impl BoundarySet {
    pub fn get(&self, kind: BoundaryKind) -> Option<u64> {
        match kind {
            BoundaryKind::HeapStart => self.heap_start,
            BoundaryKind::HeapEnd => self.heap_end,
            BoundaryKind::StackStart => self.stack_start,
            BoundaryKind::StackEnd => self.stack_end,
            BoundaryKind::RtosHeapBase => self.rtos_heap_base,
        }
    }

    pub fn set(&mut self, kind: BoundaryKind, address: Option<u64>) {
        let slot = match kind {
            BoundaryKind::HeapStart => &mut self.heap_start,
            BoundaryKind::HeapEnd => &mut self.heap_end,
            BoundaryKind::StackStart => &mut self.stack_start,
            BoundaryKind::StackEnd => &mut self.stack_end,
            BoundaryKind::RtosHeapBase => &mut self.rtos_heap_base,
        };
        *slot = address;
    }

    /// Both heap markers, when resolved.
    pub fn heap(&self) -> Option<(u64, u64)> {
        Some((self.heap_start?, self.heap_end?))
    }

    /// Both stack markers, when resolved.
    pub fn stack(&self) -> Option<(u64, u64)> {
        Some((self.stack_start?, self.stack_end?))
    }

    /// Markers that could not be resolved.
    pub fn missing(&self) -> Vec<BoundaryKind> {
        BoundaryKind::ALL.into_iter().filter(|k| self.get(*k).is_none()).collect()
    }
}

/// Severity of a finding. `Critical` and `Error` are problems; `Warning` is
/// for manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Error,
    Warning,
}

impl Severity {
    pub fn is_problem(self) -> bool {
        matches!(self, Severity::Critical | Severity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    ReadOnlyPlacement,
    Misaligned,
    ScratchPlacement,
    HeapOverlap,
    HeapProximity,
    StackOverlap,
    StackProximity,
    RtosHeapOverlap,
    ZeroInitVolatile,
}

/// One diagnostic produced by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    /// Cause and suggested fix, one line each.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Finding {
    pub fn new(kind: FindingKind, severity: Severity, message: impl Into<String>) -> Self {
        Self { kind, severity, message: message.into(), details: Vec::new() }
    }

    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }
}

/// Findings split by severity into problems (critical/error) and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingBuckets {
    pub problems: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl FindingBuckets {
    /// Partition findings, preserving their relative order within each bucket.
    pub fn partition(findings: impl IntoIterator<Item = Finding>) -> Self {
        let (problems, warnings) = findings.into_iter().partition(|f| f.severity.is_problem());
        Self { problems, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty() && self.warnings.is_empty()
    }
}
