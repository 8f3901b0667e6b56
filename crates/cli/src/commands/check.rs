use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;

use placement_core::config::{load_target_config, TargetConfig};
use placement_core::model::Finding;
use placement_core::services::analysis::{PlacementAnalyzer, PlacementReport};
use placement_core::services::symbols::{default_resolver_name, default_resolver_registry};

use crate::sha256_file;

const RULE: &str = "============================================================";

/// Options shared by every `check` invocation.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Resolver backend name; defaults to the build's default resolver.
    pub resolver: Option<String>,
    /// Optional target description file (YAML or JSON).
    pub target: Option<PathBuf>,
    /// Emit JSON instead of human-readable text.
    pub json: bool,
}

/// JSON envelope: the report plus run metadata.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub image_sha256: Option<String>,
    #[serde(flatten)]
    pub report: &'a PlacementReport,
}

/// Load the target from `--target`, or fall back to the built-in RP2040.
pub fn load_target(path: Option<&Path>) -> Result<TargetConfig> {
    match path {
        Some(path) => load_target_config(path)
            .with_context(|| format!("Failed to load target description {}", path.display())),
        None => Ok(TargetConfig::rp2040()),
    }
}

/// Resolve `variable` in `image` and evaluate its placement.
pub fn build_report(image: &Path, variable: &str, opts: &CheckOptions) -> Result<PlacementReport> {
    let registry = default_resolver_registry();
    let resolver_name = opts.resolver.as_deref().unwrap_or(default_resolver_name());
    let resolver = registry.get(resolver_name).ok_or_else(|| {
        anyhow!(
            "Unknown resolver '{}'. Available: {}",
            resolver_name,
            registry.names().join(", ")
        )
    })?;

    let target = load_target(opts.target.as_deref())?;
    let analyzer = PlacementAnalyzer::new(resolver, &target.map).with_settings(target.rules.clone());
    let report = analyzer
        .analyze(image, variable)
        .with_context(|| format!("Failed to analyze '{}' in {}", variable, image.display()))?;
    Ok(report)
}

/// Analyze one variable and print the report.
pub fn check_command(image: &str, variable: &str, opts: &CheckOptions) -> Result<()> {
    let image_path = Path::new(image);
    let report = build_report(image_path, variable, opts)?;

    if opts.json {
        let envelope = JsonReport {
            generated_at: Utc::now().to_rfc3339(),
            image_sha256: sha256_file(image_path).ok(),
            report: &report,
        };
        let serialized = serde_json::to_string_pretty(&envelope)
            .context("Failed to serialize report to JSON")?;
        println!("{}", serialized);
    } else {
        print!("{}", render_text(&report));
    }

    Ok(())
}

/// Render a report as sectioned console text.
pub fn render_text(report: &PlacementReport) -> String {
    let mut out = String::new();
    let symbol = &report.symbol;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "Memory Placement Analysis: {}", symbol.name);
    let _ = writeln!(out, "{RULE}\n");

    let _ = writeln!(out, "Variable Information:");
    let _ = writeln!(out, "  Name:     {}", symbol.name);
    let _ = writeln!(out, "  Address:  0x{:08x}", symbol.address);
    let _ = writeln!(out, "  Size:     {} bytes", symbol.size);
    let _ = writeln!(out, "  Section:  {}", symbol.section);
    let _ = writeln!(out, "  Type:     {}", symbol.type_tag);
    let _ = writeln!(out, "  Region:   {}", report.region_summary());
    let _ = writeln!(out, "  Target:   {} (resolver: {})", report.target, report.resolver);

    let missing = report.boundaries.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        let _ = writeln!(out, "  Skipped:  markers not found: {}", names.join(", "));
    }

    if !report.problems.is_empty() {
        let _ = writeln!(out, "\nPROBLEMS FOUND ({}):", report.problems.len());
        write_findings(&mut out, &report.problems);
    }
    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\nWARNINGS ({}):", report.warnings.len());
        write_findings(&mut out, &report.warnings);
    }
    if report.is_clean() {
        let _ = writeln!(out, "\nNo problems detected!");
        return out;
    }

    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "RECOMMENDATIONS:");
    let _ = writeln!(out, "{RULE}");
    for (i, rec) in report.recommendations.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}:", i + 1, rec.title);
        for line in &rec.snippet {
            let _ = writeln!(out, "   {line}");
        }
    }
    out
}

fn write_findings(out: &mut String, findings: &[Finding]) {
    for finding in findings {
        let _ = writeln!(out, "  {}: {}", finding.severity, finding.message);
        for detail in &finding.details {
            let _ = writeln!(out, "    -> {detail}");
        }
    }
}
