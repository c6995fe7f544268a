//! permscan: permission-callback auditor for REST route registries.
//!
//! Offline and heuristic. Reads a snapshot of a host's registered routes,
//! infers the access level each permission callback enforces, and rates
//! the risk of every route.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use permscan::{inspect, InspectOptions};
//!
//! let options = InspectOptions {
//!     namespaces: vec!["acme".into()],
//!     ..Default::default()
//! };
//! let report = inspect(Path::new("./routes.json"), &options).unwrap();
//! println!("Pass: {}, Routes: {}", report.verdict.pass, report.routes.len());
//! ```

pub mod analysis;
pub mod capability;
pub mod config;
pub mod error;
pub mod output;
pub mod registry;

use std::path::{Path, PathBuf};

use analysis::{
    AnalysisStats, Diagnostic, EvidenceExtractor, NamespaceGroup, PolicyVerdict, RiskTier,
    RouteAnalysis, RouteAnalyzer, RouteFilter,
};
use capability::SourceFileScanner;
use config::Config;
use error::Result;
use output::OutputFormat;
use registry::{RouteRegistry, SnapshotRegistry};

/// Options for an inspect invocation.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Path to config file (defaults to `.permscan.toml` next to the snapshot).
    pub config_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// CLI override for fail_on threshold.
    pub fail_on_override: Option<RiskTier>,
    /// Namespaces to analyze.
    pub namespaces: Vec<String>,
    /// Analyze every discovered namespace instead of `namespaces`.
    pub all_namespaces: bool,
    /// Narrow the reported routes.
    pub filter: RouteFilter,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            format: OutputFormat::Console,
            fail_on_override: None,
            namespaces: Vec::new(),
            all_namespaces: false,
            filter: RouteFilter::default(),
        }
    }
}

/// Complete inspection report.
#[derive(Debug)]
pub struct InspectReport {
    pub target_name: String,
    pub routes: Vec<RouteAnalysis>,
    pub stats: AnalysisStats,
    pub verdict: PolicyVerdict,
    pub diagnostics: Vec<Diagnostic>,
}

/// List plugin namespaces registered in a snapshot.
pub fn discover_plugins(snapshot: &Path, config_path: Option<&Path>) -> Result<Vec<NamespaceGroup>> {
    let config = load_config(snapshot, config_path)?;
    let analyzer = analyzer_for(&config)?;
    analyzer.discover(&SnapshotRegistry::new(snapshot))
}

/// Run a complete inspection: load config, analyze selected namespaces,
/// apply policy and filters.
pub fn inspect(snapshot: &Path, options: &InspectOptions) -> Result<InspectReport> {
    let mut config = load_config(snapshot, options.config_path.as_deref())?;

    // Apply CLI override
    if let Some(fail_on) = options.fail_on_override {
        config.policy.fail_on = fail_on;
    }

    let analyzer = analyzer_for(&config)?;
    let registry = SnapshotRegistry::new(snapshot);

    let selection = if options.all_namespaces {
        all_namespaces(&analyzer, &registry)?
    } else {
        options.namespaces.clone()
    };

    let outcome = analyzer.analyze(&registry, &selection)?;

    let enforced = config.policy.enforce(outcome.routes);
    let verdict = enforced.verdict;
    let routes = options.filter.apply(enforced.routes);
    let stats = AnalysisStats::from_routes(&routes);

    Ok(InspectReport {
        target_name: target_name(snapshot),
        routes,
        stats,
        verdict,
        diagnostics: outcome.diagnostics,
    })
}

/// Render an inspection report in the specified format.
pub fn render_report(report: &InspectReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}

fn load_config(snapshot: &Path, config_path: Option<&Path>) -> Result<Config> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| snapshot_dir(snapshot).join(".permscan.toml"));
    Config::load(&path)
}

// Snapshot source paths arrive already resolved against the snapshot's
// directory, so the scanner takes them as they are.
fn analyzer_for(config: &Config) -> Result<RouteAnalyzer> {
    Ok(RouteAnalyzer::new(
        config.capability_hierarchy()?,
        config.namespace_catalog(),
        EvidenceExtractor::new(Box::new(SourceFileScanner::new())),
    ))
}

fn all_namespaces(analyzer: &RouteAnalyzer, registry: &dyn RouteRegistry) -> Result<Vec<String>> {
    Ok(analyzer
        .discover(registry)?
        .into_iter()
        .map(|g| g.namespace)
        .collect())
}

fn snapshot_dir(snapshot: &Path) -> PathBuf {
    snapshot
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn target_name(snapshot: &Path) -> String {
    snapshot
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".into())
}
