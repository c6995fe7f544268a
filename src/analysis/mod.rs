//! Route discovery and permission analysis.
//!
//! [`RouteAnalyzer`] drives one pass: enumerate the registry, extract
//! evidence from each handler's permission reference, classify it, and
//! score the risk. Every call starts from a fresh enumeration.

pub mod classifier;
pub mod extractor;
pub mod filter;
pub mod namespace;
pub mod policy;
pub mod risk;
pub mod stats;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::capability::{AccessLevel, CapabilityHierarchy};
use crate::error::{Result, ScanError};
use crate::registry::{Handler, RouteRegistry};

pub use classifier::{AccessClassifier, PermissionEvidence};
pub use extractor::{EvidenceExtractor, ExtractedEvidence};
pub use filter::RouteFilter;
pub use namespace::{NamespaceCatalog, NamespaceGroup};
pub use policy::{Enforced, Policy, PolicyVerdict};
pub use risk::{RiskFactor, RiskTier};
pub use stats::AnalysisStats;

/// Analysis result for one route handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAnalysis {
    pub route: String,
    pub namespace: String,
    pub display_name: String,
    pub methods: Vec<String>,
    pub access_level: AccessLevel,
    pub capabilities: Vec<String>,
    pub custom_roles: Vec<String>,
    pub callback_description: String,
    pub risk_level: RiskTier,
}

impl RouteAnalysis {
    pub fn risk_factor(&self) -> RiskFactor {
        RiskFactor::assess(self.access_level, &self.methods)
    }
}

/// A problem the analyzer recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub route: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Capability scan failed; the route was still classified.
    SourceScan,
    /// The handler could not be analyzed and is missing from the output.
    SkippedHandler,
}

/// Routes analyzed in one pass, plus what went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub routes: Vec<RouteAnalysis>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs discovery and analysis against a route registry.
pub struct RouteAnalyzer {
    hierarchy: CapabilityHierarchy,
    catalog: NamespaceCatalog,
    extractor: EvidenceExtractor,
}

impl RouteAnalyzer {
    pub fn new(
        hierarchy: CapabilityHierarchy,
        catalog: NamespaceCatalog,
        extractor: EvidenceExtractor,
    ) -> Self {
        Self {
            hierarchy,
            catalog,
            extractor,
        }
    }

    pub fn hierarchy(&self) -> &CapabilityHierarchy {
        &self.hierarchy
    }

    /// Plugin namespaces currently registered, with route counts.
    pub fn discover(&self, registry: &dyn RouteRegistry) -> Result<Vec<NamespaceGroup>> {
        let routes = registry.routes()?;
        let groups = self.catalog.group(&routes);
        tracing::debug!(
            routes = routes.len(),
            namespaces = groups.len(),
            "discovered plugin namespaces"
        );
        Ok(groups)
    }

    /// Analyze every handler of every route in the selected namespaces.
    ///
    /// The selection is validated before the registry is touched. Handlers
    /// that fail are skipped and reported as diagnostics.
    pub fn analyze<S: AsRef<str>>(
        &self,
        registry: &dyn RouteRegistry,
        selected: &[S],
    ) -> Result<AnalysisOutcome> {
        let selected = validate_selection(selected)?;

        let routes = registry.routes()?;
        let roles = registry.roles()?;
        let classifier = AccessClassifier::new(&self.hierarchy, &roles);

        let display_names: HashMap<String, String> = self
            .catalog
            .group(&routes)
            .into_iter()
            .map(|g| (g.namespace, g.display_name))
            .collect();

        let mut outcome = AnalysisOutcome::default();

        for route in &routes {
            let Some(namespace) = self.catalog.plugin_namespace(&route.path) else {
                continue;
            };
            if !selected.contains(namespace) {
                continue;
            }
            let display_name = display_names
                .get(namespace)
                .cloned()
                .unwrap_or_else(|| namespace::format_display_name(namespace));

            for handler in &route.handlers {
                let target = RouteTarget {
                    path: &route.path,
                    namespace,
                    display_name: &display_name,
                };
                match self.analyze_handler(&classifier, &target, handler) {
                    Ok((analysis, issues)) => {
                        for issue in issues {
                            tracing::debug!(
                                route = %route.path,
                                error = %issue,
                                "capability scan failed, classifying without capabilities"
                            );
                            outcome.diagnostics.push(Diagnostic {
                                route: route.path.clone(),
                                kind: DiagnosticKind::SourceScan,
                                message: issue.to_string(),
                            });
                        }
                        outcome.routes.push(analysis);
                    }
                    Err(e) => {
                        tracing::warn!(
                            route = %route.path,
                            error = %e,
                            "route handler analysis failed, skipping"
                        );
                        outcome.diagnostics.push(Diagnostic {
                            route: route.path.clone(),
                            kind: DiagnosticKind::SkippedHandler,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        outcome.routes.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.route.cmp(&b.route))
        });

        tracing::debug!(
            analyzed = outcome.routes.len(),
            diagnostics = outcome.diagnostics.len(),
            "route analysis complete"
        );

        Ok(outcome)
    }

    fn analyze_handler(
        &self,
        classifier: &AccessClassifier<'_>,
        target: &RouteTarget<'_>,
        handler: &Handler,
    ) -> Result<(RouteAnalysis, Vec<ScanError>)> {
        let methods = handler.enabled_methods();
        if let Some(bad) = methods.iter().find(|m| !is_method_token(m)) {
            return Err(ScanError::Route {
                route: target.path.to_string(),
                message: format!("invalid HTTP method '{bad}'"),
            });
        }

        let mut extracted = self.extractor.extract(&handler.permission);
        let issues = std::mem::take(&mut extracted.issues);
        let evidence = classifier.evaluate(extracted);
        let risk_level = risk::score(evidence.access_level, &methods);

        let analysis = RouteAnalysis {
            route: target.path.to_string(),
            namespace: target.namespace.to_string(),
            display_name: target.display_name.to_string(),
            methods,
            access_level: evidence.access_level,
            capabilities: evidence.capabilities,
            custom_roles: evidence.custom_roles,
            callback_description: evidence.description,
            risk_level,
        };

        Ok((analysis, issues))
    }
}

impl Default for RouteAnalyzer {
    fn default() -> Self {
        Self::new(
            CapabilityHierarchy::default(),
            NamespaceCatalog::default(),
            EvidenceExtractor::default(),
        )
    }
}

struct RouteTarget<'a> {
    path: &'a str,
    namespace: &'a str,
    display_name: &'a str,
}

/// Trim entries and drop empty ones; an empty selection is rejected.
pub fn validate_selection<S: AsRef<str>>(selected: &[S]) -> Result<HashSet<String>> {
    let namespaces: HashSet<String> = selected
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if namespaces.is_empty() {
        return Err(ScanError::InvalidSelection(
            "no namespaces selected for analysis".into(),
        ));
    }
    Ok(namespaces)
}

fn is_method_token(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_alphabetic())
}
